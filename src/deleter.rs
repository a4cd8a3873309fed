//! Removal of a single file or directory tree.

use std::fs;
use std::path::Path;

use crate::error::DeleteError;
use crate::platform::long_path;

/// Delete a file, symlink, or directory tree.
///
/// Symlinks are removed themselves, never their targets. A directory removal
/// that fails partway is reported as an error and left as is.
pub fn delete(path: &Path) -> Result<(), DeleteError> {
    let resolved = long_path(path);

    let metadata = fs::symlink_metadata(&resolved).map_err(|e| DeleteError::from_io(path, e))?;

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&resolved)
    } else {
        fs::remove_file(&resolved)
    };

    match removed {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Deleted");
            Ok(())
        }
        Err(e) => {
            let err = DeleteError::from_io(path, e);
            tracing::warn!(error = %err, "Delete failed");
            Err(err)
        }
    }
}
