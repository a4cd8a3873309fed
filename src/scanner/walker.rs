use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{CleanerError, Result};
use crate::platform::{is_hidden, long_path};

use super::entry::Entry;
use super::options::ScanOptions;
use super::progress::ScanProgress;

/// Kind of non-fatal problem met during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    /// Permission was denied; the entry was skipped.
    AccessDenied,
    /// The entry vanished between enumeration and stat; it was skipped.
    NotFound,
    /// An unexpected error cut a directory's enumeration short.
    SubtreeFailure,
    /// A followed symlink pointed back at one of its own ancestors.
    SymlinkCycle,
}

impl WarningKind {
    fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::SubtreeFailure,
        }
    }

    /// Whether the scan skips the entry and carries on with its siblings.
    fn is_skippable(self) -> bool {
        matches!(self, Self::AccessDenied | Self::NotFound)
    }
}

/// Non-fatal warning encountered during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: WarningKind,
    pub message: String,
}

/// Output of a complete scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Entries meeting the threshold, in depth-first discovery order
    pub entries: Vec<Entry>,
    /// Filesystem objects visited
    pub visited: u64,
    /// Bytes counted under the root, threshold notwithstanding
    pub total_size: u64,
    /// Wall time spent scanning
    pub elapsed: Duration,
    /// Entries and subtrees that were skipped
    pub warnings: Vec<ScanWarning>,
}

impl ScanResult {
    /// Entries that could not be read. Symlink cycles are not counted.
    pub fn inaccessible(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.kind != WarningKind::SymlinkCycle)
            .count()
    }
}

/// Depth-first, single-threaded size-aggregating scanner.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
    progress: Option<Arc<ScanProgress>>,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    /// Report visited objects through a shared counter.
    pub fn with_progress(mut self, progress: Arc<ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root`, which may be a file or a directory.
    ///
    /// The root is canonicalized first so every emitted path is absolute and
    /// normalized. Only a root that cannot be resolved is an error; problems
    /// below the root end up in [`ScanResult::warnings`].
    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let started = Instant::now();

        let root = root.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CleanerError::PathNotFound(root.to_path_buf()),
            _ => CleanerError::Io {
                path: root.to_path_buf(),
                source: e,
            },
        })?;

        let metadata = fs::metadata(long_path(&root)).map_err(|e| CleanerError::Io {
            path: root.clone(),
            source: e,
        })?;

        let mut walk = Walk::new(&self.options, self.progress.as_deref());

        let subtree = if metadata.is_dir() {
            walk.dir(&root).unwrap_or_default()
        } else {
            walk.visit();
            walk.root_file(&root, &metadata)
        };

        let result = ScanResult {
            entries: subtree.entries,
            visited: walk.visited,
            total_size: subtree.total,
            elapsed: started.elapsed(),
            warnings: walk.warnings,
        };

        tracing::info!(
            root = %root.display(),
            entries = result.entries.len(),
            visited = result.visited,
            total = result.total_size,
            warnings = result.warnings.len(),
            "Scan complete"
        );

        Ok(result)
    }
}

/// Scan `root` and return the classified entries that meet `threshold`.
pub fn scan(root: &Path, hidden_only: bool, threshold: u64) -> Result<Vec<Entry>> {
    let options = ScanOptions::new()
        .with_hidden_only(hidden_only)
        .with_threshold(threshold);
    Scanner::new(options).scan(root).map(|r| r.entries)
}

/// Entries and byte total of one scanned subtree.
#[derive(Debug, Default)]
struct Subtree {
    entries: Vec<Entry>,
    total: u64,
}

struct Walk<'a> {
    options: &'a ScanOptions,
    progress: Option<&'a ScanProgress>,
    visited: u64,
    warnings: Vec<ScanWarning>,
    /// Canonical paths of the directories currently being scanned, root first.
    /// Only tracked when following symlinks.
    ancestors: Vec<PathBuf>,
}

impl<'a> Walk<'a> {
    fn new(options: &'a ScanOptions, progress: Option<&'a ScanProgress>) -> Self {
        Self {
            options,
            progress,
            visited: 0,
            warnings: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    fn visit(&mut self) {
        self.visited += 1;
        if let Some(progress) = self.progress {
            progress.increment();
        }
    }

    fn root_file(&mut self, path: &Path, metadata: &Metadata) -> Subtree {
        if self.options.hidden_only && !is_hidden(path, metadata) {
            return Subtree::default();
        }

        let size = metadata.len();
        let mut subtree = Subtree {
            entries: Vec::new(),
            total: size,
        };
        if size >= self.options.threshold {
            subtree.entries.push(Entry::file(path.to_path_buf(), size));
        }
        subtree
    }

    /// Scan a directory, or return `None` if following symlinks led back to
    /// one of its ancestors.
    fn dir(&mut self, dir: &Path) -> Option<Subtree> {
        if !self.options.follow_symlinks {
            return Some(self.children(dir));
        }

        let canonical = fs::canonicalize(long_path(dir)).unwrap_or_else(|_| dir.to_path_buf());
        if self.ancestors.contains(&canonical) {
            self.warnings.push(ScanWarning {
                path: dir.to_path_buf(),
                kind: WarningKind::SymlinkCycle,
                message: format!("links back to ancestor {}", canonical.display()),
            });
            tracing::warn!(path = %dir.display(), "Symlink cycle, skipping");
            return None;
        }

        self.ancestors.push(canonical);
        let subtree = self.children(dir);
        self.ancestors.pop();
        Some(subtree)
    }

    fn children(&mut self, dir: &Path) -> Subtree {
        let mut subtree = Subtree::default();

        let read_dir = match fs::read_dir(long_path(dir)) {
            Ok(rd) => rd,
            Err(err) => {
                self.warn(dir, &err);
                return subtree;
            }
        };

        for child in read_dir {
            let child = match child {
                Ok(c) => c,
                Err(err) if self.warn(dir, &err).is_skippable() => continue,
                Err(_) => break,
            };
            self.visit();

            let path = dir.join(child.file_name());
            let metadata = match self.stat(&path) {
                Ok(Some(m)) => m,
                Ok(None) => continue,
                Err(err) if self.warn(&path, &err).is_skippable() => continue,
                Err(_) => break,
            };

            if self.options.hidden_only && !is_hidden(&path, &metadata) {
                continue;
            }

            if self.options.skip_virtual_fs && ScanOptions::is_linux_virtual_fs(&path) {
                tracing::debug!(path = %path.display(), "Skipping virtual filesystem");
                continue;
            }

            if metadata.is_file() {
                let size = metadata.len();
                subtree.total += size;
                if size >= self.options.threshold {
                    subtree.entries.push(Entry::file(path, size));
                }
            } else if metadata.is_dir() {
                let Some(sub) = self.dir(&path) else {
                    continue;
                };
                subtree.entries.extend(sub.entries);
                if sub.total >= self.options.threshold {
                    subtree.entries.push(Entry::dir(path, sub.total));
                }
                subtree.total += sub.total;
            }
        }

        tracing::debug!(path = %dir.display(), total = subtree.total, "Scanned directory");
        subtree
    }

    /// Stat a child. `Ok(None)` means a symlink that is not followed.
    fn stat(&self, path: &Path) -> io::Result<Option<Metadata>> {
        let resolved = long_path(path);
        let symlink_meta = fs::symlink_metadata(&resolved)?;

        if !symlink_meta.file_type().is_symlink() {
            return Ok(Some(symlink_meta));
        }
        if !self.options.follow_symlinks {
            return Ok(None);
        }
        fs::metadata(&resolved).map(Some)
    }

    fn warn(&mut self, path: &Path, err: &io::Error) -> WarningKind {
        let kind = WarningKind::from_io(err);
        if kind.is_skippable() {
            tracing::debug!(path = %path.display(), error = %err, "Skipping entry");
        } else {
            tracing::warn!(path = %path.display(), error = %err, "Error scanning subtree");
        }
        self.warnings.push(ScanWarning {
            path: path.to_path_buf(),
            kind,
            message: err.to_string(),
        });
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    const MB: u64 = 1024 * 1024;

    fn write_file(path: &Path, len: u64) {
        File::create(path)
            .unwrap()
            .write_all(&vec![b'x'; len as usize])
            .unwrap();
    }

    fn find<'a>(entries: &'a [Entry], path: &Path) -> Option<&'a Entry> {
        entries.iter().find(|e| e.path == path)
    }

    /// Canonical root of a temp dir, matching the paths the scanner emits.
    fn canonical(dir: &TempDir) -> PathBuf {
        dir.path().canonicalize().unwrap()
    }

    fn create_test_structure() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_file(&root.join("file1.txt"), 100);
        write_file(&root.join("file2.txt"), 200);

        fs::create_dir(root.join("subdir")).unwrap();
        write_file(&root.join("subdir/nested.txt"), 300);

        fs::create_dir(root.join(".hidden_dir")).unwrap();
        write_file(&root.join(".hidden_dir/inner.txt"), 400);
        write_file(&root.join(".hidden"), 50);

        dir
    }

    #[test]
    fn test_scan_all_entries_without_threshold() {
        let dir = create_test_structure();
        let result = Scanner::default().scan(dir.path()).unwrap();

        // 5 files + 2 directories; the root itself is not emitted
        assert_eq!(result.entries.len(), 7);
        assert_eq!(result.total_size, 1050);
        assert_eq!(result.visited, 7);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_directory_sizes_are_accumulated() {
        let dir = create_test_structure();
        let root = canonical(&dir);
        let result = Scanner::default().scan(&root).unwrap();

        let subdir = find(&result.entries, &root.join("subdir")).unwrap();
        assert!(!subdir.is_file);
        assert_eq!(subdir.size_bytes, 300);
    }

    #[test]
    fn test_threshold_gates_emission_not_totals() {
        let dir = TempDir::new().unwrap();
        let root = canonical(&dir);
        fs::create_dir(root.join("data")).unwrap();
        write_file(&root.join("data/big.bin"), 600);
        write_file(&root.join("data/small1.bin"), 300);
        write_file(&root.join("data/small2.bin"), 300);

        let options = ScanOptions::new().with_threshold(500);
        let result = Scanner::new(options).scan(&root).unwrap();

        let data = find(&result.entries, &root.join("data")).unwrap();
        assert_eq!(data.size_bytes, 1200);
        assert!(find(&result.entries, &root.join("data/big.bin")).is_some());
        assert!(find(&result.entries, &root.join("data/small1.bin")).is_none());
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.total_size, 1200);
    }

    #[test]
    fn test_directory_below_threshold_still_counts_upward() {
        let dir = TempDir::new().unwrap();
        let root = canonical(&dir);
        fs::create_dir_all(root.join("outer/a")).unwrap();
        fs::create_dir_all(root.join("outer/b")).unwrap();
        write_file(&root.join("outer/a/f"), 400);
        write_file(&root.join("outer/b/f"), 400);

        let options = ScanOptions::new().with_threshold(500);
        let result = Scanner::new(options).scan(&root).unwrap();

        assert!(find(&result.entries, &root.join("outer/a")).is_none());
        assert!(find(&result.entries, &root.join("outer/b")).is_none());
        assert_eq!(
            find(&result.entries, &root.join("outer")).unwrap().size_bytes,
            800
        );
    }

    #[test]
    fn test_children_precede_their_directory() {
        let dir = create_test_structure();
        let root = canonical(&dir);
        let result = Scanner::default().scan(&root).unwrap();

        let pos = |p: &Path| result.entries.iter().position(|e| e.path == p).unwrap();
        assert!(pos(&root.join("subdir/nested.txt")) < pos(&root.join("subdir")));
    }

    #[test]
    fn test_node_modules_scenario() {
        let dir = TempDir::new().unwrap();
        let root = canonical(&dir);
        write_file(&root.join("a.txt"), 2 * MB);
        fs::create_dir(root.join("node_modules")).unwrap();
        write_file(&root.join("node_modules/pkg.tgz"), 3 * MB);

        let entries = scan(&root, false, MB).unwrap();
        assert_eq!(entries.len(), 3);

        let a = find(&entries, &root.join("a.txt")).unwrap();
        assert_eq!(a.size_bytes, 2 * MB);
        assert!(a.is_file);
        assert!(!a.is_safe_to_delete);

        let nm = find(&entries, &root.join("node_modules")).unwrap();
        assert_eq!(nm.size_bytes, 3 * MB);
        assert!(!nm.is_file);
        assert!(nm.is_safe_to_delete);
        assert!(nm.reason.starts_with("NPM packages"));

        let inner = find(&entries, &root.join("node_modules/pkg.tgz")).unwrap();
        assert_eq!(inner.size_bytes, 3 * MB);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_hidden_only_prunes_visible_entries() {
        let dir = create_test_structure();
        let root = canonical(&dir);
        let options = ScanOptions::new().with_hidden_only(true);
        let result = Scanner::new(options).scan(&root).unwrap();

        let paths: Vec<_> = result.entries.iter().map(|e| e.path.clone()).collect();
        assert!(paths.contains(&root.join(".hidden")));
        assert!(paths.contains(&root.join(".hidden_dir")));
        // Children of a hidden directory must be hidden themselves to count
        assert!(!paths.contains(&root.join(".hidden_dir/inner.txt")));
        assert!(!paths.contains(&root.join("subdir")));
        assert!(!paths.contains(&root.join("file1.txt")));

        let hidden_dir = find(&result.entries, &root.join(".hidden_dir")).unwrap();
        assert_eq!(hidden_dir.size_bytes, 0);
        assert_eq!(result.total_size, 50);
    }

    #[test]
    fn test_scan_single_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("movie.mkv");
        write_file(&file, 2048);

        let result = Scanner::default().scan(&file).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert!(result.entries[0].is_file);
        assert_eq!(result.entries[0].size_bytes, 2048);
        assert_eq!(result.visited, 1);

        let above = scan(&file, false, 4096).unwrap();
        assert!(above.is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_single_file_root_hidden_only() {
        let dir = TempDir::new().unwrap();
        let visible = dir.path().join("visible.bin");
        let hidden = dir.path().join(".hidden.bin");
        write_file(&visible, 10);
        write_file(&hidden, 10);

        assert!(scan(&visible, true, 0).unwrap().is_empty());
        assert_eq!(scan(&hidden, true, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_warning_kind_from_io() {
        let kind = |k| WarningKind::from_io(&io::Error::new(k, "x"));

        assert_eq!(kind(io::ErrorKind::PermissionDenied), WarningKind::AccessDenied);
        assert_eq!(kind(io::ErrorKind::NotFound), WarningKind::NotFound);
        assert_eq!(kind(io::ErrorKind::Other), WarningKind::SubtreeFailure);

        assert!(WarningKind::AccessDenied.is_skippable());
        assert!(WarningKind::NotFound.is_skippable());
        assert!(!WarningKind::SubtreeFailure.is_skippable());
    }

    #[test]
    fn test_inaccessible_ignores_symlink_cycles() {
        let warning = |kind| ScanWarning {
            path: PathBuf::from("/x"),
            kind,
            message: String::new(),
        };
        let result = ScanResult {
            entries: Vec::new(),
            visited: 0,
            total_size: 0,
            elapsed: Duration::ZERO,
            warnings: vec![
                warning(WarningKind::AccessDenied),
                warning(WarningKind::SymlinkCycle),
                warning(WarningKind::SubtreeFailure),
            ],
        };
        assert_eq!(result.inaccessible(), 2);
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let result = Scanner::default().scan(Path::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(CleanerError::PathNotFound(_))));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = create_test_structure();

        let mut first = scan(dir.path(), false, 150).unwrap();
        let mut second = scan(dir.path(), false, 150).unwrap();
        first.sort_by(|a, b| a.path.cmp(&b.path));
        second.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(first, second);
    }

    #[test]
    fn test_progress_counts_visited_objects() {
        let dir = create_test_structure();
        let progress = Arc::new(ScanProgress::new());

        let result = Scanner::default()
            .with_progress(Arc::clone(&progress))
            .scan(dir.path())
            .unwrap();

        assert_eq!(progress.visited(), result.visited);
    }

    #[test]
    fn test_emitted_paths_are_normalized() {
        let dir = create_test_structure();
        let root = canonical(&dir);

        let entries = scan(&root.join("subdir").join(".."), false, 0).unwrap();
        assert!(entries.iter().all(|e| e.path.is_absolute()));
        assert!(find(&entries, &root.join("subdir")).is_some());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::{symlink, PermissionsExt};

        #[test]
        fn test_symlinks_followed_by_default() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            fs::create_dir(root.join("real")).unwrap();
            write_file(&root.join("real/data.bin"), 100);
            symlink(root.join("real"), root.join("link")).unwrap();
            symlink(root.join("real/data.bin"), root.join("file_link")).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            // real/data.bin, link/data.bin and file_link each count once
            assert_eq!(result.total_size, 300);
            assert_eq!(find(&result.entries, &root.join("link")).unwrap().size_bytes, 100);
            assert!(find(&result.entries, &root.join("file_link")).unwrap().is_file);
            assert!(result.warnings.is_empty());
        }

        #[test]
        fn test_symlinks_skipped_when_not_following() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            fs::create_dir(root.join("real")).unwrap();
            write_file(&root.join("real/data.bin"), 100);
            symlink(root.join("real"), root.join("link")).unwrap();
            symlink(root.join("real/data.bin"), root.join("file_link")).unwrap();

            let options = ScanOptions::new().with_follow_symlinks(false);
            let result = Scanner::new(options).scan(&root).unwrap();

            assert_eq!(result.total_size, 100);
            assert!(find(&result.entries, &root.join("link")).is_none());
            assert!(find(&result.entries, &root.join("file_link")).is_none());
        }

        #[test]
        fn test_symlink_cycle_is_broken() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            fs::create_dir(root.join("a")).unwrap();
            write_file(&root.join("a/data.bin"), 100);
            symlink(&root, root.join("a/back")).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            assert_eq!(result.total_size, 100);
            assert!(find(&result.entries, &root.join("a/back")).is_none());
            assert!(result
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::SymlinkCycle && w.path == root.join("a/back")));
            assert_eq!(result.inaccessible(), 0);
        }

        #[test]
        fn test_links_to_same_directory_are_not_a_cycle() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            fs::create_dir(root.join("real")).unwrap();
            write_file(&root.join("real/data.bin"), 100);
            // Enough siblings that some links are enumerated before `real`
            for i in 0..8 {
                symlink(root.join("real"), root.join(format!("link{i}"))).unwrap();
            }

            let result = Scanner::default().scan(&root).unwrap();

            assert!(result.warnings.is_empty());
            assert_eq!(find(&result.entries, &root.join("real")).unwrap().size_bytes, 100);
            for i in 0..8 {
                let link = find(&result.entries, &root.join(format!("link{i}"))).unwrap();
                assert_eq!(link.size_bytes, 100);
            }
            assert_eq!(result.total_size, 900);
        }

        #[test]
        fn test_nested_link_to_sibling_subtree_is_scanned() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            fs::create_dir_all(root.join("a/inner")).unwrap();
            fs::create_dir(root.join("b")).unwrap();
            write_file(&root.join("a/inner/data.bin"), 100);
            // Same target reached twice, at different depths, without looping
            symlink(root.join("a/inner"), root.join("b/shortcut")).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            assert!(result.warnings.is_empty());
            assert_eq!(find(&result.entries, &root.join("a/inner")).unwrap().size_bytes, 100);
            assert_eq!(find(&result.entries, &root.join("b/shortcut")).unwrap().size_bytes, 100);
        }

        #[test]
        fn test_followed_symlink_counts_target() {
            let target = TempDir::new().unwrap();
            write_file(&target.path().join("data.bin"), 100);

            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            symlink(target.path(), root.join("ext")).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            assert_eq!(result.total_size, 100);
            let ext = find(&result.entries, &root.join("ext")).unwrap();
            assert_eq!(ext.size_bytes, 100);
        }

        #[test]
        fn test_dangling_symlink_is_skipped_with_warning() {
            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            write_file(&root.join("ok.bin"), 100);
            symlink(root.join("missing"), root.join("dangling")).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            assert_eq!(result.total_size, 100);
            assert!(find(&result.entries, &root.join("dangling")).is_none());
            assert_eq!(result.warnings.len(), 1);
            assert_eq!(result.warnings[0].kind, WarningKind::NotFound);
            assert_eq!(result.inaccessible(), 1);
        }

        #[test]
        fn test_unreadable_directory_is_skipped_unless_root() {
            if crate::platform::is_elevated() {
                eprintln!("skipped: permission bits are not enforced for root");
                return;
            }

            let dir = TempDir::new().unwrap();
            let root = canonical(&dir);
            write_file(&root.join("ok.bin"), 100);
            fs::create_dir(root.join("locked")).unwrap();
            write_file(&root.join("locked/secret.bin"), 100);
            fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

            let result = Scanner::default().scan(&root).unwrap();

            fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

            assert_eq!(result.total_size, 100);
            assert!(result
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::AccessDenied));
            // The locked directory itself is still listed, with nothing counted
            let locked = find(&result.entries, &root.join("locked")).unwrap();
            assert_eq!(locked.size_bytes, 0);
        }
    }
}
