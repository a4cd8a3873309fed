mod entry;
mod options;
mod progress;
mod size;
mod walker;

pub use entry::Entry;
pub use options::ScanOptions;
pub use progress::ScanProgress;
pub use size::{format_size, parse_size};
pub use walker::{scan, ScanResult, ScanWarning, Scanner, WarningKind};
