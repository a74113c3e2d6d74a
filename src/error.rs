//! Typed error kinds for the scrubber, matching the layered propagation
//! rules: file-scoped errors abort one file, `NoFilesFound` exits `IGNORED`,
//! anything else exits `FAILURE` (still running `post_all` cleanup).
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    #[error("no eligible text files found under {0}")]
    NoFilesFound(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("external tool failed for {path}: {message}")]
    Tool { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScrubError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrubError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Process exit classification (§7): `0` success, `1` ignored, `2` failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    Ignored,
    Failure,
}

impl ExitClass {
    pub fn code(self) -> i32 {
        match self {
            ExitClass::Success => 0,
            ExitClass::Ignored => 1,
            ExitClass::Failure => 2,
        }
    }
}
