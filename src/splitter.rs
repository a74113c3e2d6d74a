//! Split-and-merge: partition a large file into line-range parts, scrub each
//! part independently (so a worker pool can fan out across them), then
//! concatenate the scrubbed parts back in ascending index order.
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, warn};

use crate::context::Context;
use crate::discovery::count_lines;
use crate::error::ScrubError;
use crate::io::{atomic_write, iter_lines_auto};
use crate::scrubber::scrub_content;

/// Temp root directory owned by one strategy invocation. Created on
/// construction, recursively removed on `Drop` so cleanup happens on every
/// exit path (success, per-file failure, or an uncaught error further up),
/// matching the "guaranteed release" rule in SPEC_FULL.md §7.
pub struct TempRoot {
    pub path: PathBuf,
}

impl TempRoot {
    /// `output_dir` is the directory under which `obf_tmp_<timestamp>/` is
    /// created; `stamp` is a caller-supplied `YYYYmmdd_HHMMSS` string so the
    /// name is deterministic and testable (timestamps come from `chrono` at
    /// the call site, never generated inside library code during a script).
    pub fn new(output_dir: &Path, stamp: &str) -> Result<Self, ScrubError> {
        let path = output_dir.join(format!("obf_tmp_{stamp}"));
        fs::create_dir_all(&path).map_err(|e| ScrubError::io(&path, e))?;
        Ok(Self { path })
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove temp directory {}: {e}", self.path.display());
            }
    }
}

/// A contiguous line-range slice of an input file, on disk under a
/// [`TempRoot`].
#[derive(Debug, Clone)]
pub struct FilePart {
    pub path: PathBuf,
    pub index: usize,
}

/// Split `file` into `workers` line-balanced parts under `temp_root`, or
/// return it untouched as the sole "part" when it is smaller than
/// `min_split_size_in_bytes` or `workers <= 1`.
pub fn pre_one(
    file: &Path,
    size_bytes: u64,
    workers: usize,
    min_split_size_in_bytes: u64,
    temp_root: &Path,
) -> Result<Vec<FilePart>, ScrubError> {
    if size_bytes < min_split_size_in_bytes || workers <= 1 {
        return Ok(vec![FilePart {
            path: file.to_path_buf(),
            index: 0,
        }]);
    }

    let total_lines = count_lines(file)?;
    let lines_per_part = (total_lines / workers).max(1) + if total_lines % workers != 0 { 1 } else { 0 };
    let lines_per_part = lines_per_part.max(1);

    let basename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "part".to_string());

    let mut parts = Vec::new();
    let mut current_lines: Vec<String> = Vec::new();
    let mut index = 0usize;
    for line in iter_lines_auto(file, 0)?.flatten() {
        current_lines.push(line);
        if current_lines.len() >= lines_per_part {
            parts.push(flush_part(temp_root, &basename, index, &current_lines)?);
            current_lines.clear();
            index += 1;
        }
    }
    if !current_lines.is_empty() {
        parts.push(flush_part(temp_root, &basename, index, &current_lines)?);
    }
    if parts.is_empty() {
        // Degenerate case: an empty file with workers > 1 still needs one part.
        parts.push(flush_part(temp_root, &basename, 0, &[])?);
    }
    Ok(parts)
}

fn flush_part(
    temp_root: &Path,
    basename: &str,
    index: usize,
    lines: &[String],
) -> Result<FilePart, ScrubError> {
    let name = format!("{basename}___pt___{index:04}");
    let path = temp_root.join(&name);
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    fs::write(&path, content).map_err(|e| ScrubError::io(&path, e))?;
    Ok(FilePart { path, index })
}

/// Scrub one part in place: writes a sibling `___new` file with the scrubbed
/// content. On I/O failure, removes any partial output and writes a
/// `.err.tmp` sidecar describing the failure, then returns the error so the
/// caller can log it and continue with the remaining parts.
pub fn obfuscate_one(context: &Context, part: &FilePart) -> Result<PathBuf, ScrubError> {
    let new_path = PathBuf::from(format!("{}___new", part.path.display()));
    match fs::read_to_string(&part.path) {
        Ok(content) => {
            let scrubbed = scrub_content(context, &content);
            match fs::write(&new_path, scrubbed) {
                Ok(()) => Ok(new_path),
                Err(e) => {
                    let _ = fs::remove_file(&new_path);
                    write_err_sidecar(&part.path, 0, &e.to_string());
                    Err(ScrubError::io(&part.path, e))
                }
            }
        }
        Err(e) => {
            write_err_sidecar(&part.path, 0, &e.to_string());
            Err(ScrubError::io(&part.path, e))
        }
    }
}

fn write_err_sidecar(part_path: &Path, line_index: usize, message: &str) {
    let sidecar = PathBuf::from(format!("{}.err.tmp", part_path.display()));
    let body = format!("line {line_index}: {message}\n");
    if let Err(e) = fs::write(&sidecar, body) {
        error!("failed to write error sidecar {}: {e}", sidecar.display());
    }
}

/// Merge obfuscated parts, sorted by the numeric index embedded in their
/// basename, into `target` (the original file's path). A single-part input
/// is moved directly rather than "concatenated".
pub fn post_one(mut obfuscated_parts: Vec<FilePart>, target: &Path) -> Result<(), ScrubError> {
    obfuscated_parts.sort_by_key(|p| p.index);
    if obfuscated_parts.len() == 1 {
        let content = fs::read_to_string(&obfuscated_parts[0].path).map_err(|e| ScrubError::io(target, e))?;
        return atomic_write(target, &content);
    }
    let mut merged = String::new();
    for part in &obfuscated_parts {
        let content = fs::read_to_string(&part.path).map_err(|e| ScrubError::io(&part.path, e))?;
        merged.push_str(&content);
    }
    atomic_write(target, &merged)
}
