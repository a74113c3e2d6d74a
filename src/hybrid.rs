//! Hybrid pipeline (§4.5): classify each file against the catalog threshold,
//! decide whether it is cheap enough to rewrite in memory or must fall back
//! to a streaming/split strategy, then execute that decision — as three
//! bounded stages running concurrently rather than one `pre_all`/`process_one`
//! pass per file.
//!
//! SPEC_FULL.md calls for explicit poison-pill shutdown between stages; this
//! implementation gets the same bounded-backpressure behavior from
//! `crossbeam_channel`'s disconnect-on-last-sender-drop instead of hand-rolled
//! poison values — the channel closes itself once every producer thread for a
//! stage has exited, and a consumer's `recv()` loop ends on the resulting
//! `Err`. Grounded in the bounded producer/consumer channel pattern used for
//! indexing pipelines elsewhere in the corpus.
use std::path::PathBuf;

use crossbeam_channel::bounded;

use crate::catalog::{self, Classification};
use crate::context::Context;
use crate::discovery::FileRecord;
use crate::error::ScrubError;
use crate::io::{atomic_write, read_to_string_auto};
use crate::scrubber::scrub_stream;
use crate::splitter::TempRoot;
use crate::stats::FileOutcome;
use crate::strategy::{self, RunOptions};

#[derive(Debug, Clone, Copy)]
pub struct StageWidths {
    pub classify: usize,
    pub decide: usize,
    pub execute: usize,
}

/// `--strategy hybrid` stage widths.
pub const HYBRID_WIDTHS: StageWidths = StageWidths {
    classify: 5,
    decide: 2,
    execute: 8,
};

/// `--strategy hybrid_split` stage widths: classification and decision are
/// kept serial since the interesting concurrency is in the split fallback's
/// own part-level fan-out, not at the file level.
pub const HYBRID_SPLIT_WIDTHS: StageWidths = StageWidths {
    classify: 1,
    decide: 1,
    execute: 10,
};

/// Classify one file in memory, accepting it for a direct catalog rewrite,
/// skipping it if nothing matched, or falling back (streaming in place, or
/// splitting first when `split_fallback` is set) once it crosses `threshold`.
pub fn run_single(
    context: &Context,
    file: &FileRecord,
    opts: &RunOptions,
    split_fallback: bool,
    temp_root: Option<&TempRoot>,
) -> Result<(), ScrubError> {
    let content = read_to_string_auto(&file.path, opts.mmap_threshold)?;
    match catalog::classify(context, &content, opts.threshold, true) {
        Classification::Empty => Ok(()),
        Classification::Accept(cat) => {
            let out = catalog::rewrite(context, &content, &cat);
            atomic_write(&file.path, &out)
        }
        Classification::Reject if split_fallback => {
            let temp_root = temp_root.ok_or_else(|| ScrubError::Internal("hybrid_split requires a temp root".into()))?;
            strategy::split_in_place(context, file, opts, temp_root)
        }
        Classification::Reject => scrub_stream(context, &file.path, opts.mmap_threshold).map(|_| ()),
    }
}

enum Decision {
    Skip,
    Rewrite(String),
    Fallback,
}

/// Run the full file list through the three bounded stages. Returns
/// `(path, outcome)` pairs in the order results complete, not input order —
/// callers fold them into a `RunSummary` where order doesn't matter.
pub fn run_batch(
    context: &Context,
    files: Vec<FileRecord>,
    opts: &RunOptions,
    split_fallback: bool,
    temp_root: Option<&TempRoot>,
    widths: StageWidths,
) -> Vec<(PathBuf, FileOutcome)> {
    let (file_tx, file_rx) = bounded::<FileRecord>(widths.classify.max(1));
    let (classified_tx, classified_rx) = bounded::<(FileRecord, Classification)>(widths.decide.max(1));
    let (decided_tx, decided_rx) = bounded::<(FileRecord, Decision)>(widths.execute.max(1));
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(PathBuf, FileOutcome)>();

    std::thread::scope(|scope| {
        for _ in 0..widths.classify.max(1) {
            let file_rx = file_rx.clone();
            let classified_tx = classified_tx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(file) = file_rx.recv() {
                    match read_to_string_auto(&file.path, opts.mmap_threshold) {
                        Ok(content) => {
                            let classification = catalog::classify(context, &content, opts.threshold, true);
                            if classified_tx.send((file, classification)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = result_tx.send((file.path.clone(), FileOutcome::Failed(e.to_string())));
                        }
                    }
                }
            });
        }
        drop(classified_tx);
        drop(file_rx);

        for _ in 0..widths.decide.max(1) {
            let classified_rx = classified_rx.clone();
            let decided_tx = decided_tx.clone();
            scope.spawn(move || {
                while let Ok((file, classification)) = classified_rx.recv() {
                    let decision = match classification {
                        Classification::Empty => Decision::Skip,
                        Classification::Accept(cat) => {
                            let content =
                                read_to_string_auto(&file.path, opts.mmap_threshold).unwrap_or_default();
                            Decision::Rewrite(catalog::rewrite(context, &content, &cat))
                        }
                        Classification::Reject => Decision::Fallback,
                    };
                    if decided_tx.send((file, decision)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(decided_tx);
        drop(classified_rx);

        for _ in 0..widths.execute.max(1) {
            let decided_rx = decided_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((file, decision)) = decided_rx.recv() {
                    let outcome = match decision {
                        Decision::Skip => Ok(FileOutcome::Skipped),
                        Decision::Rewrite(out) => atomic_write(&file.path, &out).map(|_| FileOutcome::Processed),
                        Decision::Fallback => {
                            let fallback_result = if split_fallback {
                                match temp_root {
                                    Some(root) => strategy::split_in_place(context, &file, opts, root),
                                    None => Err(ScrubError::Internal("hybrid_split requires a temp root".into())),
                                }
                            } else {
                                scrub_stream(context, &file.path, opts.mmap_threshold).map(|_| ())
                            };
                            fallback_result.map(|_| FileOutcome::Processed)
                        }
                    };
                    let outcome = outcome.unwrap_or_else(|e| FileOutcome::Failed(e.to_string()));
                    if result_tx.send((file.path.clone(), outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);
        drop(decided_rx);

        scope.spawn(move || {
            for file in files {
                if file.size_bytes == 0 {
                    continue;
                }
                if file_tx.send(file).is_err() {
                    break;
                }
            }
        });

        result_rx.iter().collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn run_batch_processes_small_and_large_literal_counts() {
        let dir = tempdir().unwrap();
        let small = dir.path().join("small.log");
        fs::write(&small, "connect from 10.0.0.1 ok\n").unwrap();
        let large = dir.path().join("large.log");
        let content: String = (0..300).map(|i| format!("10.0.{}.{}\n", i / 250, i % 250)).collect();
        fs::write(&large, &content).unwrap();

        let ctx = Context::new("1234");
        let opts = RunOptions {
            workers: 2,
            mmap_threshold: 0,
            min_split_size_in_bytes: 1,
            threshold: 50,
            remove_original: false,
        };
        let temp_root = TempRoot::new(dir.path(), "stamp").unwrap();
        let files = vec![
            FileRecord { path: small.clone(), size_bytes: fs::metadata(&small).unwrap().len() },
            FileRecord { path: large.clone(), size_bytes: content.len() as u64 },
        ];
        let results = run_batch(&ctx, files, &opts, true, Some(&temp_root), HYBRID_SPLIT_WIDTHS);
        assert_eq!(results.len(), 2);
        for (_, outcome) in &results {
            assert!(matches!(outcome, FileOutcome::Processed));
        }
        assert!(!fs::read_to_string(&small).unwrap().contains("10.0.0.1"));
        assert!(!fs::read_to_string(&large).unwrap().contains("10.0."));
    }

    #[test]
    fn run_single_falls_back_above_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let content: String = (0..20).map(|i| format!("10.0.0.{i}\n")).collect();
        fs::write(&path, &content).unwrap();
        let ctx = Context::new("1234");
        let opts = RunOptions {
            workers: 2,
            mmap_threshold: 0,
            min_split_size_in_bytes: u64::MAX,
            threshold: 5,
            remove_original: false,
        };
        let rec = FileRecord { path: path.clone(), size_bytes: content.len() as u64 };
        run_single(&ctx, &rec, &opts, false, None).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("10.0.0."));
    }
}
