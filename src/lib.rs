//! logveil
//!
//! Deterministic scrubber that walks a file or directory tree and replaces
//! IP addresses, MAC addresses, absolute file paths, and credential-keyed
//! values with stable `{{TAG-HASH8}}` placeholders, so two runs over the
//! same content with the same salt always produce byte-identical output.
//!
//! High-level components:
//! - `detectors` defines the regex detector set and the placeholder digest
//! - `discovery` walks the input tree and applies ignore hints
//! - `io` offers streaming and mmap-backed line iteration plus atomic writes
//! - `context` holds the run-wide salt and a memoized placeholder cache
//! - `catalog` implements the `low_level`/`ripgrep` whole-file rewrite
//! - `scrubber` implements the line-streaming rewrite
//! - `splitter` implements the split-and-merge strategy's part lifecycle
//! - `pool` provides a uniform serial/thread worker-pool surface
//! - `strategy` dispatches a run onto one of the above by `--strategy` name
//! - `hybrid` implements the three-stage classify/decide/execute pipeline
//! - `manager` validates a `Config`, discovers files, and runs a strategy
//! - `stats` folds per-file outcomes into a `RunSummary`
//! - `report` renders a colored terminal summary
//! - `export` writes the summary and failed-file list to `--log-folder`
//!
//! A minimal example (error handling elided):
//!
//! ```no_run
//! use logveil::manager::{self, Config};
//! use logveil::pool::PoolKind;
//! use logveil::strategy::StrategyName;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     input: "/path/to/logs".into(),
//!     output: None,
//!     salt: "my-salt".into(),
//!     workers: 4,
//!     strategy: StrategyName::InPlace,
//!     min_split_size_in_bytes: 64 * 1024 * 1024,
//!     remove_original: false,
//!     log_folder: None,
//!     ignore_hint: None,
//!     measure_time: false,
//!     pool_kind: PoolKind::ThreadPool,
//!     threshold: 5000,
//!     serially: false,
//! };
//! let summary = manager::run(&config)?;
//! println!("{}", logveil::report::render_summary(&summary));
//! # Ok(())
//! # }
//! ```
pub mod catalog;
pub mod context;
pub mod detectors;
pub mod discovery;
pub mod error;
pub mod export;
pub mod hybrid;
pub mod io;
pub mod manager;
pub mod pool;
pub mod report;
pub mod scrubber;
pub mod splitter;
pub mod stats;
pub mod strategy;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{ExitClass, ScrubError};
    pub use crate::strategy::StrategyName;
}
