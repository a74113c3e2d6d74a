//! `--log-folder` export: writes a plain-text run summary and a
//! newline-delimited list of failed files, timestamped the same way the CLI
//! timestamps split-strategy temp directories.
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ScrubError;
use crate::report::render_summary;
use crate::stats::RunSummary;

pub fn write_log_folder(summary: &RunSummary, log_folder: &Path, stamp: &str) -> Result<(), ScrubError> {
    std::fs::create_dir_all(log_folder).map_err(|e| ScrubError::io(log_folder, e))?;

    let summary_path = log_folder.join(format!("logveil_summary_{stamp}.txt"));
    let mut f = File::create(&summary_path).map_err(|e| ScrubError::io(&summary_path, e))?;
    write!(f, "{}", strip_ansi(&render_summary(summary))).map_err(|e| ScrubError::io(&summary_path, e))?;

    if !summary.failed_files.is_empty() {
        let failed_path = log_folder.join(format!("logveil_failed_{stamp}.txt"));
        let mut f = File::create(&failed_path).map_err(|e| ScrubError::io(&failed_path, e))?;
        for (path, message) in &summary.failed_files {
            writeln!(f, "{}\t{}", path.display(), message).map_err(|e| ScrubError::io(&failed_path, e))?;
        }
    }
    Ok(())
}

/// Strip ANSI color codes before writing to a plain-text log file.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(ch);
        }
    }
    out
}
