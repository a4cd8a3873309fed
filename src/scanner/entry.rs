use serde::Serialize;
use std::path::PathBuf;

use crate::classifier::{classify, Classification};

/// A classified file or directory that met the size threshold.
/// This is the core data structure produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Absolute path to the file or directory
    pub path: PathBuf,

    /// Byte length for files, recursive sum of contained files for directories
    pub size_bytes: u64,

    /// True for files, false for directories
    pub is_file: bool,

    /// Whether the classifier presumes deletion is safe
    pub is_safe_to_delete: bool,

    /// Classification rationale
    pub reason: &'static str,
}

impl Entry {
    /// Create a file entry, classifying its path.
    pub fn file(path: PathBuf, size_bytes: u64) -> Self {
        Self::classified(path, size_bytes, true)
    }

    /// Create a directory entry, classifying its path.
    pub fn dir(path: PathBuf, size_bytes: u64) -> Self {
        Self::classified(path, size_bytes, false)
    }

    fn classified(path: PathBuf, size_bytes: u64, is_file: bool) -> Self {
        let Classification { is_safe, reason } = classify(&path);
        Self {
            path,
            size_bytes,
            is_file,
            is_safe_to_delete: is_safe,
            reason,
        }
    }

    /// "File" or "Directory"
    pub fn kind(&self) -> &'static str {
        if self.is_file {
            "File"
        } else {
            "Directory"
        }
    }
}
