//! Line iteration and atomic-write helpers shared by every strategy.
//!
//! Large files are read via mmap to avoid double-buffering; small files use a
//! plain buffered reader. Writers always go to a sibling temp file and are
//! atomically renamed over the target so a crash mid-write leaves the
//! original intact.
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::ScrubError;

/// Threshold in bytes above which we attempt to use mmap for reading.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB

pub type LineIter = Box<dyn Iterator<Item = io::Result<String>> + Send + 'static>;

pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

pub fn iter_lines_bufread<P: AsRef<Path>>(path: P) -> Result<LineIter, ScrubError> {
    let file = File::open(&path).map_err(|e| ScrubError::io(path.as_ref(), e))?;
    let reader = BufReader::new(file);
    Ok(Box::new(reader.lines()))
}

pub fn iter_lines_mmap<P: AsRef<Path>>(path: P) -> Result<LineIter, ScrubError> {
    let file = File::open(&path).map_err(|e| ScrubError::io(path.as_ref(), e))?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ScrubError::io(path.as_ref(), e))?;
    Ok(Box::new(MmapLines { mmap, pos: 0 }))
}

struct MmapLines {
    mmap: memmap2::Mmap,
    pos: usize,
}

impl Iterator for MmapLines {
    type Item = io::Result<String>;
    fn next(&mut self) -> Option<Self::Item> {
        let data: &[u8] = &self.mmap;
        if self.pos >= data.len() {
            return None;
        }
        let start = self.pos;
        if let Some(off) = memchr::memchr(b'\n', &data[self.pos..]) {
            let end = self.pos + off;
            self.pos = end + 1;
            Some(line_from_bytes(&data[start..end]))
        } else {
            self.pos = data.len();
            Some(line_from_bytes(&data[start..]))
        }
    }
}

fn line_from_bytes(bytes: &[u8]) -> io::Result<String> {
    let slice = if bytes.ends_with(b"\r") {
        &bytes[..bytes.len() - 1]
    } else {
        bytes
    };
    match std::str::from_utf8(slice) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Ok(String::from_utf8_lossy(slice).to_string()),
    }
}

/// Choose mmap or bufread and return an iterator over lines.
pub fn iter_lines_auto<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<LineIter, ScrubError> {
    let meta = fs::metadata(&path).map_err(|e| ScrubError::io(path.as_ref(), e))?;
    if meta.is_file() && should_use_mmap(meta.len(), threshold_bytes) {
        iter_lines_mmap(path)
    } else {
        iter_lines_bufread(path)
    }
}

/// Read an entire file into one `String`, choosing mmap or bufread the same
/// way `iter_lines_auto` does. Used by the catalog strategy, which operates
/// on a whole-file buffer rather than line-by-line.
pub fn read_to_string_auto<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<String, ScrubError> {
    let meta = fs::metadata(&path).map_err(|e| ScrubError::io(path.as_ref(), e))?;
    if meta.is_file() && should_use_mmap(meta.len(), threshold_bytes) {
        let file = File::open(&path).map_err(|e| ScrubError::io(path.as_ref(), e))?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ScrubError::io(path.as_ref(), e))?;
        Ok(String::from_utf8_lossy(&mmap).into_owned())
    } else {
        fs::read_to_string(&path).map_err(|e| ScrubError::io(path.as_ref(), e))
    }
}

/// Write `contents` to a sibling temp file and atomically rename it over
/// `path`, preserving the discipline that a failed write never touches the
/// original. Permissions are copied from the source when present.
pub fn atomic_write<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), ScrubError> {
    let path = path.as_ref();
    let tmp = sibling_temp_path(path);
    {
        let mut f = File::create(&tmp).map_err(|e| ScrubError::io(path, e))?;
        f.write_all(contents.as_bytes())
            .map_err(|e| ScrubError::io(path, e))?;
        f.flush().map_err(|e| ScrubError::io(path, e))?;
    }
    if let Ok(meta) = fs::metadata(path) {
        let _ = fs::set_permissions(&tmp, meta.permissions());
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ScrubError::io(path, e)
    })
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn iter_lines_auto_reads_small_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "a\nb\nc").unwrap();
        let lines: Vec<String> = iter_lines_auto(&path, DEFAULT_MMAP_THRESHOLD_BYTES)
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn iter_lines_auto_uses_mmap_path_above_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "a\nb\nc").unwrap();
        let lines: Vec<String> = iter_lines_auto(&path, 0).unwrap().flatten().collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }
}
