//! Platform-specific helpers: hidden-file detection, long-path handling and
//! privilege checks.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Paths this long need the `\\?\` prefix for Win32 file APIs.
pub const MAX_PATH: usize = 260;

const LONG_PATH_PREFIX: &str = r"\\?\";

/// Check whether a file or directory is hidden.
///
/// Windows uses the hidden file attribute; everywhere else a leading dot in
/// the name marks the entry as hidden.
#[cfg(windows)]
pub fn is_hidden(_path: &Path, metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

/// Check whether a file or directory is hidden.
///
/// Windows uses the hidden file attribute; everywhere else a leading dot in
/// the name marks the entry as hidden.
#[cfg(not(windows))]
pub fn is_hidden(path: &Path, _metadata: &Metadata) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Resolve the representation of `path` that the filesystem APIs accept.
///
/// On Windows absolute paths of [`MAX_PATH`] characters or more get the
/// extended-length prefix. Other platforms have no such limit and the path
/// is returned unchanged.
pub fn long_path(path: &Path) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(with_long_path_prefix(&path.to_string_lossy()))
    } else {
        path.to_path_buf()
    }
}

/// Prefix an absolute Windows path with `\\?\` when it reaches [`MAX_PATH`].
pub fn with_long_path_prefix(path: &str) -> String {
    if path.starts_with(LONG_PATH_PREFIX) || path.chars().count() < MAX_PATH {
        path.to_string()
    } else {
        format!("{LONG_PATH_PREFIX}{path}")
    }
}

/// Whether the process already runs with administrator/root privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Whether the process already runs with administrator/root privileges.
///
/// Without a platform check we assume not, so callers keep suggesting a
/// privileged retry.
#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}
