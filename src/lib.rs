//! Disk Cleaner - A fast disk usage analyzer and cleanup tool
//!
//! This crate provides functionality for:
//! - Scanning a directory tree and aggregating sizes per file and directory
//! - Classifying entries by deletion safety with static name heuristics
//! - Reconciling and ranking the results, and writing CSV reports
//! - Deleting single files or directory trees

pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deleter;
pub mod error;
pub mod platform;
pub mod reconciler;
pub mod report;
pub mod scanner;

// Re-export commonly used types
pub use classifier::{classify, is_protected, Classification};
pub use config::Config;
pub use deleter::delete;
pub use error::{CleanerError, DeleteError, Result};
pub use reconciler::{rank, reconcile};
pub use scanner::{scan, Entry, ScanOptions, ScanResult, Scanner};
