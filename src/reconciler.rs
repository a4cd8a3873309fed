//! Deduplication and ranking of scan entries.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::Entry;

/// Collapse entries sharing a path, keeping the larger size.
///
/// On equal sizes the later entry wins. The surviving entries keep the
/// position at which their path was first seen.
pub fn reconcile(entries: Vec<Entry>) -> Vec<Entry> {
    let mut index: HashMap<PathBuf, usize> = HashMap::with_capacity(entries.len());
    let mut reconciled: Vec<Entry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.path) {
            Some(&i) => {
                if entry.size_bytes >= reconciled[i].size_bytes {
                    reconciled[i] = entry;
                }
            }
            None => {
                index.insert(entry.path.clone(), reconciled.len());
                reconciled.push(entry);
            }
        }
    }

    reconciled
}

/// Sort largest first (stable) and keep the top `n`.
///
/// `n <= 0` yields an empty view; `n` past the end yields everything.
pub fn rank(mut entries: Vec<Entry>, n: i64) -> Vec<Entry> {
    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    let keep = usize::try_from(n).unwrap_or(0);
    entries.truncate(keep);
    entries
}

/// Sum of the sizes of `entries`.
pub fn total_size(entries: &[Entry]) -> u64 {
    entries.iter().map(|e| e.size_bytes).sum()
}
