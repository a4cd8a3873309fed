//! Static deletion-safety heuristics.
//!
//! Classification looks only at path names: a protected segment anywhere in
//! the path wins, then the final segment is matched against a table of known
//! space hogs. Anything else is treated as unknown and never safe.

use std::path::Path;

/// Reason reported for paths inside a protected system folder.
pub const PROTECTED_REASON: &str = "System protected";

/// Reason reported when no heuristic matches.
pub const UNKNOWN_REASON: &str = "Unknown";

/// OS-critical names that must never be classified as deletable.
pub const PROTECTED_FOLDERS: &[&str] = &[
    "Windows",
    "Program Files",
    "Program Files (x86)",
    "ProgramData",
    "System32",
    "System Volume Information",
    "$Recycle.Bin",
    "$WINDOWS.~BT",
    "pagefile.sys",
    "hiberfil.sys",
    "swapfile.sys",
    "bootmgr",
];

/// Directory names that commonly hold large, regenerable content.
pub const SPACE_HOGS: &[(&str, &str)] = &[
    (
        "node_modules",
        "NPM packages (usually safe to delete if not actively developing)",
    ),
    (".conda", "Conda environments (safe if not needed)"),
    (".venv", "Python virtual environments (safe if not needed)"),
    (".cache", "Cache files (usually safe to delete)"),
    (".npm", "NPM cache (safe to delete)"),
    ("temp", "Temporary files (safe to delete)"),
    ("tmp", "Temporary files (safe to delete)"),
    (".git", "Git repositories (contains version history, be careful)"),
    (
        "build",
        "Build artifacts (usually safe if not actively building)",
    ),
    ("dist", "Distribution files (usually safe if not needed)"),
    ("logs", "Log files (usually safe to delete old logs)"),
    (
        ".nuget",
        "NuGet package cache (safe if not actively developing)",
    ),
    (
        ".gradle",
        "Gradle build system cache (safe if not actively developing)",
    ),
    (".m2", "Maven repository (safe if not actively developing)"),
    ("AppData", "Application data (may contain important settings)"),
];

/// Outcome of classifying a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_safe: bool,
    pub reason: &'static str,
}

impl Classification {
    const PROTECTED: Self = Self {
        is_safe: false,
        reason: PROTECTED_REASON,
    };

    const UNKNOWN: Self = Self {
        is_safe: false,
        reason: UNKNOWN_REASON,
    };
}

/// Classify a path by deletion safety.
pub fn classify(path: &Path) -> Classification {
    let path_str = path.to_string_lossy();

    if segments(&path_str).any(is_protected_name) {
        return Classification::PROTECTED;
    }

    let Some(name) = segments(&path_str).last() else {
        return Classification::UNKNOWN;
    };

    match space_hog(name) {
        Some(description) => Classification {
            is_safe: description.to_ascii_lowercase().contains("safe"),
            reason: description,
        },
        None => Classification::UNKNOWN,
    }
}

/// Check whether a protected folder name appears as a whole segment of the path.
///
/// This is a separator-bounded substring test over the full path string and is
/// evaluated independently of [`classify`], e.g. right before deleting.
pub fn is_protected(path: &Path) -> bool {
    let path_lower = path.to_string_lossy().to_lowercase();

    PROTECTED_FOLDERS.iter().any(|protected| {
        let protected = protected.to_lowercase();
        ['/', '\\'].iter().any(|sep| {
            let bounded = format!("{sep}{protected}");
            path_lower.contains(&format!("{bounded}{sep}")) || path_lower.ends_with(&bounded)
        })
    })
}

/// Look up the description for a known space hog name.
pub fn space_hog(name: &str) -> Option<&'static str> {
    SPACE_HOGS
        .iter()
        .find(|(hog, _)| hog.eq_ignore_ascii_case(name))
        .map(|(_, description)| *description)
}

fn is_protected_name(segment: &str) -> bool {
    PROTECTED_FOLDERS
        .iter()
        .any(|protected| protected.eq_ignore_ascii_case(segment))
}

// Both separators are honored so Windows-style paths classify the same on
// every platform.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}
