//! Top-level orchestrator: validates a [`Config`], discovers files, runs the
//! selected strategy over them with the configured worker pool, and folds
//! the per-file outcomes into a [`RunSummary`].
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::context::Context;
use crate::discovery;
use crate::error::ScrubError;
use crate::hybrid;
use crate::io::DEFAULT_MMAP_THRESHOLD_BYTES;
use crate::pool::{Pool, PoolKind};
use crate::stats::RunSummary;
use crate::strategy::{RunOptions, Strategy, StrategyName};

pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub salt: String,
    pub workers: usize,
    pub strategy: StrategyName,
    pub min_split_size_in_bytes: u64,
    pub remove_original: bool,
    pub log_folder: Option<PathBuf>,
    pub ignore_hint: Option<String>,
    pub measure_time: bool,
    pub pool_kind: PoolKind,
    pub threshold: usize,
    pub serially: bool,
}

impl Config {
    /// Mirrors the teacher's `verify_inputs`: fail fast on a configuration
    /// that could never produce a valid run, before any I/O happens.
    pub fn validate(&self) -> Result<(), ScrubError> {
        if !self.input.exists() {
            return Err(ScrubError::Config(format!("input path does not exist: {}", self.input.display())));
        }
        if self.workers == 0 {
            return Err(ScrubError::Config("workers must be at least 1".into()));
        }
        if self.threshold == 0 {
            return Err(ScrubError::Config("threshold must be at least 1".into()));
        }
        if self.salt.is_empty() {
            return Err(ScrubError::Config("salt must not be empty".into()));
        }
        Ok(())
    }
}

/// Run one full pass: discover, scrub, summarize. The returned `RunSummary`
/// carries everything `report`/`export` need; its `exit_class()` is the
/// process exit code.
pub fn run(config: &Config) -> Result<RunSummary, ScrubError> {
    config.validate()?;
    let start = Instant::now();

    let working_root = match &config.output {
        Some(output) if output != &config.input => {
            copy_tree(&config.input, output)?;
            output.clone()
        }
        _ => config.input.clone(),
    };

    let ignore_hint = match &config.ignore_hint {
        Some(pattern) => Some(Regex::new(pattern).map_err(|e| ScrubError::Config(format!("invalid --ignore-hint regex: {e}")))?),
        None => None,
    };
    let files = discovery::discover(&working_root, ignore_hint.as_ref())?;
    info!("discovered {} eligible file(s) under {}", files.len(), working_root.display());

    let mut summary = RunSummary::new(files.len());
    if files.is_empty() {
        if config.measure_time {
            summary.elapsed = Some(start.elapsed());
        }
        return Ok(summary);
    }

    let context = Context::new(config.salt.clone());
    let opts = RunOptions {
        workers: config.workers,
        mmap_threshold: DEFAULT_MMAP_THRESHOLD_BYTES,
        min_split_size_in_bytes: config.min_split_size_in_bytes,
        threshold: config.threshold,
        remove_original: config.remove_original,
    };
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let strategy = Strategy::pre_all(config.strategy, &working_root, &stamp)?;

    let results: Vec<(PathBuf, crate::stats::FileOutcome)> = match config.strategy {
        StrategyName::Hybrid | StrategyName::HybridSplit => {
            let widths = if config.strategy == StrategyName::HybridSplit {
                hybrid::HYBRID_SPLIT_WIDTHS
            } else {
                hybrid::HYBRID_WIDTHS
            };
            hybrid::run_batch(
                &context,
                files,
                &opts,
                config.strategy == StrategyName::HybridSplit,
                strategy.temp_root_ref(),
                widths,
            )
        }
        _ => {
            let pool = Pool::new(config.pool_kind, config.workers, config.serially);
            pool.map(files, |file| {
                let outcome = strategy.run_one(&context, &file, &opts);
                (file.path, outcome)
            })
        }
    };

    for (path, outcome) in results {
        summary.record(&path, outcome);
    }

    if config.remove_original
        && let Some(output) = &config.output
        && output != &config.input
    {
        remove_input(&config.input)?;
    }

    if config.measure_time {
        summary.elapsed = Some(start.elapsed());
    }
    Ok(summary)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), ScrubError> {
    if src.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| ScrubError::io(parent, e))?;
        }
        return fs::copy(src, dst).map(|_| ()).map_err(|e| ScrubError::io(dst, e));
    }
    fs::create_dir_all(dst).map_err(|e| ScrubError::io(dst, e))?;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| ScrubError::Internal(e.to_string()))?;
        let rel = entry.path().strip_prefix(src).map_err(|e| ScrubError::Internal(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ScrubError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ScrubError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| ScrubError::io(&target, e))?;
        }
    }
    Ok(())
}

fn remove_input(input: &Path) -> Result<(), ScrubError> {
    if input.is_file() {
        fs::remove_file(input).map_err(|e| ScrubError::io(input, e))
    } else {
        match fs::remove_dir_all(input) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("failed to remove original input {}: {e}", input.display());
                Err(ScrubError::io(input, e))
            }
        }
    }
}
