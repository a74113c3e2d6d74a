//! Streaming scrubber: the line-oriented `scrub_stream` operation backing
//! the `InPlace` and `SplitInPlace` strategies.
use std::path::Path;

use crate::context::Context;
use crate::detectors::scrub_line;
use crate::error::ScrubError;
use crate::io::{atomic_write, iter_lines_auto};

/// Read `path` line by line, scrub every line through the detector set, and
/// atomically replace the file with the scrubbed content. A read failure
/// partway through leaves the original untouched (`atomic_write` only
/// renames once the full scrubbed buffer has been written successfully).
pub fn scrub_stream(context: &Context, path: &Path, mmap_threshold: u64) -> Result<usize, ScrubError> {
    let mut out = String::new();
    let mut lines_scrubbed = 0usize;
    for line in iter_lines_auto(path, mmap_threshold)?.flatten() {
        out.push_str(&scrub_line(&context.detectors, &line));
        out.push('\n');
        lines_scrubbed += 1;
    }
    atomic_write(path, &out)?;
    Ok(lines_scrubbed)
}

/// Scrub a part's content already held in memory (used by split-and-merge,
/// which streams a part through the same line-level detector pass).
pub fn scrub_content(context: &Context, content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        out.push_str(&scrub_line(&context.detectors, line));
        out.push('\n');
    }
    out
}
