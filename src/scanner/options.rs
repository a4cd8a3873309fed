use std::path::Path;

/// What a scan descends into and which entries it emits.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only consider hidden files/directories; non-hidden ones are pruned
    pub hidden_only: bool,

    /// Minimum size in bytes for an entry to be emitted
    pub threshold: u64,

    /// Follow symbolic links; a link back to an ancestor directory is skipped
    pub follow_symlinks: bool,

    /// Skip Linux virtual filesystems encountered below the root
    pub skip_virtual_fs: bool,
}

/// Pseudo filesystems whose reported sizes are meaningless for disk usage.
pub const LINUX_VIRTUAL_FS_PATHS: &[&str] = &["/proc", "/dev", "/sys", "/run"];

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            hidden_only: false,
            threshold: 0,
            follow_symlinks: true,
            skip_virtual_fs: true,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_only(mut self, hidden_only: bool) -> Self {
        self.hidden_only = hidden_only;
        self
    }

    /// Emit only entries of at least `bytes`. Totals still count everything.
    pub fn with_threshold(mut self, bytes: u64) -> Self {
        self.threshold = bytes;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_skip_virtual_fs(mut self, skip: bool) -> Self {
        self.skip_virtual_fs = skip;
        self
    }

    /// True for `/proc`, `/dev`, `/sys`, `/run` and anything below them.
    pub fn is_linux_virtual_fs(path: &Path) -> bool {
        LINUX_VIRTUAL_FS_PATHS.iter().any(|vfs| path.starts_with(vfs))
    }
}
