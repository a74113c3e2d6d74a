//! CLI entrypoint for `logveil`.
//!
//! Parses arguments, validates the run configuration, executes the selected
//! strategy, prints a terminal summary, and optionally writes it to a
//! `--log-folder`. Exit code follows `ExitClass`: 0 success, 1 ignored (no
//! eligible files), 2 failure.
use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, error, warn};
use logveil::manager::{self, Config};
use logveil::pool::PoolKind;
use logveil::report::render_summary;
use logveil::strategy::StrategyName;
use logveil::export::write_log_folder;

#[derive(Parser, Debug)]
#[command(name = "logveil", version, about = "Deterministic log scrubber for IPs, MACs, paths, and credentials")]
struct Args {
    /// File or directory to scrub
    #[arg(short = 'i', long = "input", required = true)]
    input: PathBuf,

    /// Write scrubbed output under a separate root instead of in place
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Salt mixed into every placeholder digest
    #[arg(short = 's', long = "salt", required = true)]
    salt: String,

    /// Worker count for the selected pool
    #[arg(short = 'w', long = "workers", default_value_t = 4)]
    workers: usize,

    /// in_place | split_in_place | split_merge | low_level | ripgrep | hybrid | hybrid_split
    #[arg(long = "strategy", default_value = "in_place")]
    strategy: String,

    /// Files at or above this size (bytes) are split across workers
    #[arg(short = 'm', long = "min-split-size-in-bytes", default_value_t = 64 * 1024 * 1024)]
    min_split_size_in_bytes: u64,

    /// Remove the original input after a successful run that wrote to --output
    #[arg(long = "remove-original", visible_alias = "rm")]
    remove_original: bool,

    /// Directory to write a plain-text run summary and failed-file list into
    #[arg(long = "log-folder", visible_alias = "log")]
    log_folder: Option<PathBuf>,

    /// Extra regex; a file whose first line matches it is skipped, alongside
    /// the built-in NoObfuscation4Me hint
    #[arg(long = "ignore-hint")]
    ignore_hint: Option<String>,

    /// Print elapsed wall-clock time in the summary
    #[arg(short = 't', long = "measure-time")]
    measure_time: bool,

    /// serial | thread_pool | process_pool | green
    #[arg(long = "pool-type", default_value = "thread_pool")]
    pool_type: String,

    /// Distinct-literal ceiling for the catalog/hybrid strategies
    #[arg(long = "threshold", default_value_t = 5000)]
    threshold: usize,

    /// Force the serial pool regardless of --pool-type
    #[arg(long = "serially")]
    serially: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long = "debug")]
    debug: bool,

    /// Reserved for the catalog strategy's external-tool contract (unused:
    /// the catalog rewrite is native, see SPEC_FULL.md §9)
    #[arg(long = "replacer")]
    replacer: Option<String>,
    #[arg(long = "searcher")]
    searcher: Option<String>,
    #[arg(long = "sorter")]
    sorter: Option<String>,
    #[arg(long = "ripgrep-path")]
    ripgrep_path: Option<String>,
}

fn init_logger(verbosity: u8, debug: bool) {
    let level = match (debug, verbosity) {
        (true, _) => LevelFilter::Debug,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env().filter_level(level).try_init();
}

fn warn_on_unused_external_tool_flags(args: &Args) {
    for (flag, value) in [
        ("--replacer", &args.replacer),
        ("--searcher", &args.searcher),
        ("--sorter", &args.sorter),
        ("--ripgrep-path", &args.ripgrep_path),
    ] {
        if value.is_some() {
            warn!("{flag} has no effect: the catalog strategy rewrites literals natively and never shells out");
        }
    }
}

fn pool_kind(name: &str) -> Result<PoolKind, String> {
    match name.to_ascii_lowercase().as_str() {
        "serial" => Ok(PoolKind::Serial),
        "thread_pool" | "threadpool" => Ok(PoolKind::ThreadPool),
        "process_pool" | "processpool" => Ok(PoolKind::ProcessPool),
        "green" => Ok(PoolKind::Green),
        other => Err(format!("unknown pool type '{other}'")),
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose, args.debug);
    warn_on_unused_external_tool_flags(&args);

    let strategy = match StrategyName::parse(&args.strategy) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    let pool_kind = match pool_kind(&args.pool_type) {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    let config = Config {
        input: args.input,
        output: args.output,
        salt: args.salt,
        workers: args.workers,
        strategy,
        min_split_size_in_bytes: args.min_split_size_in_bytes,
        remove_original: args.remove_original,
        log_folder: args.log_folder.clone(),
        ignore_hint: args.ignore_hint,
        measure_time: args.measure_time,
        pool_kind,
        threshold: args.threshold,
        serially: args.serially,
    };

    let summary = match manager::run(&config) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    println!("{}", render_summary(&summary));

    if let Some(log_folder) = &args.log_folder {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        if let Err(e) = write_log_folder(&summary, log_folder, &stamp) {
            error!("failed to write --log-folder output: {e}");
            std::process::exit(2);
        }
    }

    std::process::exit(summary.exit_class().code());
}
