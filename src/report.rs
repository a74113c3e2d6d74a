//! Human-readable report rendering for terminal output.
//!
//! Produces a colored run summary: counts, elapsed time if measured, and the
//! list of per-file failures (if any).
use colored::*;

use crate::stats::RunSummary;

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
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
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "logveil: Scrub Run Results".bold().cyan()));

    out.push_str(&section_header(&"Files".bold().yellow().to_string()));
    out.push_str(&format!("Discovered: {}\n", summary.discovered));
    out.push_str(&format!("Processed: {}\n", summary.processed.to_string().green()));
    out.push_str(&format!("Skipped (empty): {}\n", summary.skipped));
    let failed_line = if summary.failed() > 0 {
        summary.failed().to_string().red().to_string()
    } else {
        summary.failed().to_string()
    };
    out.push_str(&format!("Failed: {failed_line}\n"));

    if let Some(elapsed) = summary.elapsed {
        out.push_str(&format!("Elapsed: {:.3}s\n", elapsed.as_secs_f64()));
    }

    out.push_str(&section_header(&"Failures".bold().red().to_string()));
    if summary.failed_files.is_empty() {
        out.push_str("(none)\n");
    } else {
        for (path, message) in &summary.failed_files {
            out.push_str(&format!("  {}: {}\n", path.display(), message.dimmed()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::stats::FileOutcome;

    #[test]
    fn summary_reports_counts_and_failures() {
        let mut summary = RunSummary::new(3);
        summary.record(Path::new("a.log"), FileOutcome::Processed);
        summary.record(Path::new("b.log"), FileOutcome::Skipped);
        summary.record(Path::new("c.log"), FileOutcome::Failed("broken pipe".into()));
        let rendered = render_summary(&summary);
        assert!(rendered.contains("Discovered: 3"));
        assert!(rendered.contains("c.log"));
        assert!(rendered.contains("broken pipe"));
    }

    #[test]
    fn summary_with_no_failures_says_none() {
        let mut summary = RunSummary::new(1);
        summary.record(Path::new("a.log"), FileOutcome::Processed);
        let rendered = render_summary(&summary);
        assert!(rendered.contains("(none)"));
    }
}
