//! File discovery: walks the input tree, applies the built-in and
//! user-supplied ignore hints, and skips the filenames/directories the
//! split-and-merge strategy itself produces so a run is never re-scrubbing
//! its own scratch output.
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::ScrubError;

/// Built-in ignore hint, pinned per SPEC_FULL.md §4.1/§6.
pub const BUILTIN_IGNORE_HINT: &str = "NoObfuscation4Me";

/// A discovered input file, eligible for scrubbing per the invariants in §3:
/// exists, non-empty, opens as UTF-8 for its first line, and that first line
/// does not match either ignore hint.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
}

fn is_scratch_name(name: &str) -> bool {
    name.contains("___pt___") || name.contains("___new") || name.ends_with(".dat")
}

fn is_scratch_dir(name: &str) -> bool {
    name.ends_with("obf_tmp_") || name.starts_with("obf_tmp_")
}

fn first_line(path: &Path) -> Option<String> {
    use std::io::BufRead;
    let file = fs::File::open(path).ok()?;
    let mut reader = std::io::BufReader::new(file);
    let mut buf = String::new();
    reader.read_line(&mut buf).ok()?;
    Some(buf.trim_end_matches(['\n', '\r']).to_string())
}

/// Discover eligible text files under `root` (a file or a directory).
/// Directories named `obf_tmp_*` are not recursed; scratch filenames and the
/// built-in/user ignore hints are filtered out.
pub fn discover(root: &Path, user_ignore_hint: Option<&Regex>) -> Result<Vec<FileRecord>, ScrubError> {
    let builtin = Regex::new(BUILTIN_IGNORE_HINT).expect("builtin ignore hint compiles");

    if root.is_file() {
        return Ok(eligible(root, &builtin, user_ignore_hint).into_iter().collect());
    }

    let mut out = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            if entry.depth() > 0 && is_scratch_dir(&name) {
                return false;
            }
        }
        true
    });
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(rec) = eligible(entry.path(), &builtin, user_ignore_hint) {
            out.push(rec);
        }
    }
    Ok(out)
}

fn eligible(path: &Path, builtin: &Regex, user_ignore_hint: Option<&Regex>) -> Option<FileRecord> {
    let name = path.file_name()?.to_string_lossy();
    if is_scratch_name(&name) {
        return None;
    }
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    if meta.len() == 0 {
        return Some(FileRecord {
            path: path.to_path_buf(),
            size_bytes: 0,
        });
    }
    let line = first_line(path)?;
    if builtin.is_match(&line) {
        return None;
    }
    if let Some(hint) = user_ignore_hint
        && hint.is_match(&line) {
            return None;
        }
    Some(FileRecord {
        path: path.to_path_buf(),
        size_bytes: meta.len(),
    })
}

/// Count lines in a file via the same mmap/bufread threshold the rest of
/// the pipeline uses, avoiding a full UTF-8 decode for the count alone.
pub fn count_lines(path: &Path) -> Result<usize, ScrubError> {
    let file = fs::File::open(path).map_err(|e| ScrubError::io(path, e))?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ScrubError::io(path, e))?;
    let mut count = memchr::memchr_iter(b'\n', &mmap).count();
    if !mmap.is_empty() && mmap[mmap.len() - 1] != b'\n' {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discovers_plain_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "hello\n").unwrap();
        fs::write(dir.path().join("b.log"), "world\n").unwrap();
        let found = discover(dir.path(), None).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn skips_builtin_ignore_hint() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "# NoObfuscation4Me\nsecret\n").unwrap();
        let found = discover(dir.path(), None).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skips_user_ignore_hint() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "SKIPME\nsecret\n").unwrap();
        let hint = Regex::new("SKIPME").unwrap();
        let found = discover(dir.path(), Some(&hint)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skips_scratch_names_and_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a___new"), "x\n").unwrap();
        fs::write(dir.path().join("b.dat"), "x\n").unwrap();
        fs::create_dir(dir.path().join("obf_tmp_20250101")).unwrap();
        fs::write(dir.path().join("obf_tmp_20250101/c.log"), "x\n").unwrap();
        let found = discover(dir.path(), None).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_file_is_eligible_not_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("empty.log"), "").unwrap();
        let found = discover(dir.path(), None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size_bytes, 0);
    }

    #[test]
    fn counts_lines_with_and_without_trailing_newline() {
        let dir = tempdir().unwrap();
        let p1 = dir.path().join("a.log");
        fs::write(&p1, "a\nb\nc\n").unwrap();
        assert_eq!(count_lines(&p1).unwrap(), 3);
        let p2 = dir.path().join("b.log");
        fs::write(&p2, "a\nb\nc").unwrap();
        assert_eq!(count_lines(&p2).unwrap(), 3);
    }
}
