//! Uniform worker-pool surface over serial, thread, and (nominally) process
//! execution, plus a bounded-futures helper used by `classify` to scan a
//! file's detector tiers concurrently.
//!
//! Every strategy's `run()` calls `Pool::map`, not threads directly, so
//! swapping `--pool-type` never touches strategy code.
use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool as RayonPool;

/// Requested pool backend, mirroring `--pool-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Serial,
    ThreadPool,
    /// See SPEC_FULL.md §4.6 "Process-pool resolution": this implementation
    /// never shells out, so there is no subprocess work to isolate. Runs on
    /// the same native-thread backend as `ThreadPool`.
    ProcessPool,
    /// Reserved for a future async/green-thread backend; currently an alias
    /// for `ThreadPool` since no strategy step here is `.await`-shaped.
    Green,
}

/// A pool of workers exposing `map`. `serially` short-circuits to the serial
/// backend regardless of the requested `PoolKind`, matching `--serially`.
pub struct Pool {
    kind: PoolKind,
    rayon_pool: Option<RayonPool>,
}

impl Pool {
    pub fn new(kind: PoolKind, workers: usize, serially: bool) -> Self {
        let effective = if serially { PoolKind::Serial } else { kind };
        let rayon_pool = match effective {
            PoolKind::Serial => None,
            _ => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers.max(1))
                    .build()
                    .expect("failed to build worker thread pool"),
            ),
        };
        debug!("pool initialized: kind={effective:?} workers={workers}");
        Self {
            kind: effective,
            rayon_pool,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Apply `f` to every item, in parallel unless the pool is `Serial`.
    /// Order of the returned results matches the order of `items`.
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        match &self.rayon_pool {
            None => items.into_iter().map(f).collect(),
            Some(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
        }
    }
}

/// Always-threaded pool for coordination tasks that must not be skipped by
/// `--serially` (temp-folder setup/teardown, invoking sub-strategies'
/// `pre_all`/`post_all`).
pub struct ManagementPool;

impl ManagementPool {
    /// Run `f` on a dedicated OS thread and block for its result.
    pub fn run<R: Send>(f: impl FnOnce() -> R + Send) -> R {
        std::thread::scope(|s| s.spawn(f).join().expect("management task panicked"))
    }
}

/// Submit `key -> fn` pairs and collect `(key, result)` pairs, bounded to
/// `workers` concurrent jobs. Used inside `classify` to scan a file's
/// detector tiers in parallel without spawning one thread per detector.
pub fn bounded_futures<K, R, F>(jobs: Vec<(K, F)>, workers: usize) -> Vec<(K, R)>
where
    K: Send,
    R: Send,
    F: FnOnce() -> R + Send,
{
    let workers = workers.max(1);
    let (job_tx, job_rx) = crossbeam_channel::bounded::<(K, F)>(workers);
    let (res_tx, res_rx) = crossbeam_channel::bounded::<(K, R)>(workers);

    std::thread::scope(|s| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move || {
                while let Ok((key, f)) = job_rx.recv() {
                    let result = f();
                    if res_tx.send((key, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(res_tx);
        s.spawn(move || {
            for job in jobs {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
        });
        res_rx.iter().collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_pool_preserves_order() {
        let pool = Pool::new(PoolKind::Serial, 4, false);
        let results = pool.map(vec![1, 2, 3, 4], |x| x * 2);
        assert_eq!(results, vec![2, 4, 6, 8]);
    }

    #[test]
    fn thread_pool_preserves_order() {
        let pool = Pool::new(PoolKind::ThreadPool, 4, false);
        let results = pool.map(vec![1, 2, 3, 4, 5], |x| x * x);
        assert_eq!(results, vec![1, 4, 9, 16, 25]);
    }

    #[test]
    fn serially_flag_overrides_pool_kind() {
        let pool = Pool::new(PoolKind::ThreadPool, 4, true);
        assert_eq!(pool.kind(), PoolKind::Serial);
    }

    #[test]
    fn bounded_futures_collects_all_results() {
        let jobs: Vec<(u32, Box<dyn FnOnce() -> u32 + Send>)> = (0..8)
            .map(|i| (i, Box::new(move || i * 10) as Box<dyn FnOnce() -> u32 + Send>))
            .collect();
        let mut results = bounded_futures(jobs, 3);
        results.sort_by_key(|(k, _)| *k);
        assert_eq!(results, (0..8).map(|i| (i, i * 10)).collect::<Vec<_>>());
    }
}
