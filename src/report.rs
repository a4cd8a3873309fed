//! CSV report of reconciled scan entries.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::error::{CleanerError, Result};
use crate::scanner::Entry;

pub const REPORT_TITLE: &str = "Disk Cleaner Scan Report";
pub const CSV_HEADER: &str = "Path,Size,Type,Safe To Delete,Reason";

/// Write a report for `entries` to `path`, stamped with the current local time.
pub fn write_report(entries: &[Entry], path: &Path) -> Result<()> {
    let to_report_err = |source| CleanerError::Report {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_report_err)?;
    let mut writer = BufWriter::new(file);
    render(entries, Local::now().naive_local(), &mut writer).map_err(to_report_err)?;
    writer.flush().map_err(to_report_err)?;

    tracing::info!(path = %path.display(), rows = entries.len(), "Report written");
    Ok(())
}

/// Render the report body.
pub fn render<W: Write>(
    entries: &[Entry],
    generated: NaiveDateTime,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{REPORT_TITLE}")?;
    writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;
    writeln!(out, "{CSV_HEADER}")?;

    for entry in entries {
        writeln!(
            out,
            "{},{},{},{},{}",
            quote(&entry.path.to_string_lossy()),
            entry.size_bytes,
            entry.kind(),
            if entry.is_safe_to_delete { "True" } else { "False" },
            quote(entry.reason),
        )?;
    }
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
