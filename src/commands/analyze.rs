//! Analyze command implementation

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::classifier::is_protected;
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::deleter;
use crate::error::{CleanerError, DeleteError};
use crate::platform::is_elevated;
use crate::reconciler::{rank, reconcile, total_size};
use crate::report::write_report;
use crate::scanner::{
    format_size, parse_size, Entry, ScanOptions, ScanProgress, ScanResult, Scanner,
};

const MAX_DISPLAY_PATH: usize = 50;

/// Effective settings after merging command-line flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub root: PathBuf,
    pub threshold: u64,
    pub top: i64,
    pub only_hidden: bool,
    pub follow_symlinks: bool,
    pub skip_virtual_fs: bool,
}

impl Settings {
    pub fn resolve(args: &AnalyzeArgs, config: &Config) -> Result<Self> {
        let root = match &args.path {
            Some(p) => p.clone(),
            None => {
                dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?
            }
        };

        let threshold_str = args
            .threshold
            .as_deref()
            .unwrap_or(&config.analyze.threshold);
        let threshold = parse_size(threshold_str)
            .ok_or_else(|| CleanerError::InvalidSize(threshold_str.to_string()))?;

        Ok(Self {
            root,
            threshold,
            top: args.top.unwrap_or(config.analyze.top),
            only_hidden: args.only_hidden || config.analyze.only_hidden,
            follow_symlinks: config.analyze.follow_symlinks && !args.no_follow_symlinks,
            skip_virtual_fs: config.analyze.skip_virtual_fs,
        })
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions::new()
            .with_hidden_only(self.only_hidden)
            .with_threshold(self.threshold)
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_virtual_fs(self.skip_virtual_fs)
    }
}

/// JSON shape of `--json` output
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    root: &'a Path,
    elapsed_secs: f64,
    visited: u64,
    found: usize,
    total_size: u64,
    items: &'a [Entry],
}

/// Run the analyze command
pub fn run(args: AnalyzeArgs, config: &Config, quiet: bool) -> Result<()> {
    let settings = Settings::resolve(&args, config)?;

    if !settings.root.exists() {
        bail!("Path '{}' does not exist", settings.root.display());
    }
    let root = settings
        .root
        .canonicalize()
        .with_context(|| format!("cannot resolve '{}'", settings.root.display()))?;

    let show_chrome = !quiet && !args.json;
    let colors = io::stdout().is_terminal();

    if show_chrome {
        print_header(&root, &settings);
    }

    tracing::info!(path = %root.display(), threshold = settings.threshold, "Scanning");
    let mut scan = run_scan(&root, &settings, show_chrome)?;

    for warning in &scan.warnings {
        tracing::debug!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
    }

    let reconciled = reconcile(std::mem::take(&mut scan.entries));
    let found_size = total_size(&reconciled);
    let mut view = rank(reconciled.clone(), settings.top);

    if args.json {
        let report = JsonReport {
            root: &root,
            elapsed_secs: scan.elapsed.as_secs_f64(),
            visited: scan.visited,
            found: reconciled.len(),
            total_size: found_size,
            items: &view,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&root, &view, &scan, colors);
        print_summary(&scan, &reconciled, &view);
    }

    if let Some(report_path) = &args.report {
        write_report(&reconciled, report_path)?;
        if !quiet {
            println!("Report saved to: {}", report_path.display());
        }
    }

    if args.delete {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        deletion_loop(&mut view, &mut input, &mut output, colors)?;
    }

    Ok(())
}

fn run_scan(root: &Path, settings: &Settings, show_spinner: bool) -> Result<ScanResult> {
    let progress = Arc::new(ScanProgress::new());
    let scanner = Scanner::new(settings.scan_options()).with_progress(Arc::clone(&progress));

    let spinner = if show_spinner {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    // The scan stays single-threaded; the worker only frees this thread to
    // animate the spinner.
    let result = thread::scope(|s| {
        let handle = s.spawn(|| scanner.scan(root));
        while !handle.is_finished() {
            spinner.set_message(format!("Scanning... {} items scanned", progress.visited()));
            thread::sleep(Duration::from_millis(100));
        }
        handle.join()
    })
    .map_err(|_| anyhow!("scanner thread panicked"))??;

    spinner.finish_and_clear();
    Ok(result)
}

fn print_header(root: &Path, settings: &Settings) {
    println!("Disk Cleaner Scan");
    println!("  Path:      {}", root.display());
    println!("  Threshold: {}", format_size(settings.threshold));
    println!(
        "  Mode:      {}",
        if settings.only_hidden {
            "Hidden Only"
        } else {
            "All Items"
        }
    );
    println!();
}

fn print_table(root: &Path, view: &[Entry], scan: &ScanResult, colors: bool) {
    println!(
        "Largest Items in {} (scan time: {:.2}s)",
        root.display(),
        scan.elapsed.as_secs_f64()
    );
    println!(
        "\n  {:>3}  {:<50}  {:>12}  {:<9}  {:<9}  {}",
        "#", "PATH", "SIZE", "TYPE", "SAFE", "NOTES"
    );
    println!("  {}", "─".repeat(110));

    for (i, entry) in view.iter().enumerate() {
        let (safe_text, color) = safety_label(entry);
        println!(
            "  {:>3}  {:<50}  {:>12}  {:<9}  {}  {}",
            i + 1,
            display_path(root, &entry.path),
            format_size(entry.size_bytes),
            entry.kind(),
            paint(&format!("{:<9}", safe_text), color, colors),
            entry.reason,
        );
    }
}

fn print_summary(scan: &ScanResult, reconciled: &[Entry], view: &[Entry]) {
    let found_size = total_size(reconciled);
    let shown_size = total_size(view);

    println!(
        "\nSummary: Scanned {} items, found {} items above threshold, total size: {}",
        scan.visited,
        reconciled.len(),
        format_size(found_size)
    );

    if found_size > 0 {
        let percentage = shown_size as f64 / found_size as f64 * 100.0;
        println!(
            "Displaying top {} items, representing {} ({:.1}% of found space)",
            view.len(),
            format_size(shown_size),
            percentage
        );
    } else {
        println!(
            "Displaying top {} items, representing {}",
            view.len(),
            format_size(shown_size)
        );
    }

    let inaccessible = scan.inaccessible();
    if inaccessible > 0 {
        println!("Skipped {} inaccessible items", inaccessible);
    }
}

fn safety_label(entry: &Entry) -> (&'static str, Color) {
    if entry.is_safe_to_delete {
        ("Yes", Color::Green)
    } else if is_protected(&entry.path) {
        ("PROTECTED", Color::Red)
    } else {
        ("No", Color::DarkRed)
    }
}

fn paint(text: &str, color: Color, colors: bool) -> String {
    if colors {
        text.with(color).to_string()
    } else {
        text.to_string()
    }
}

/// Path relative to the scan root, truncated from the left to fit the table.
pub fn display_path(root: &Path, path: &Path) -> String {
    let shown = match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    };

    let len = shown.chars().count();
    if len > MAX_DISPLAY_PATH {
        let tail: String = shown.chars().skip(len - (MAX_DISPLAY_PATH - 3)).collect();
        format!("...{}", tail)
    } else {
        shown
    }
}

/// One line of user input in deletion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Quit,
    /// Zero-based index into the displayed view
    Item(usize),
    OutOfRange,
    Invalid,
}

/// Parse a 1-based item number or `q`.
pub fn parse_selection(input: &str, len: usize) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }
    match input.parse::<i64>() {
        Ok(n) if n >= 1 && (n as u64) <= len as u64 => Selection::Item(n as usize - 1),
        Ok(_) => Selection::OutOfRange,
        Err(_) => Selection::Invalid,
    }
}

/// Interactive deletion over the displayed view.
///
/// Successfully deleted items are removed from `view`; nothing is re-scanned.
pub fn deletion_loop<R: BufRead, W: Write>(
    view: &mut Vec<Entry>,
    input: &mut R,
    out: &mut W,
    colors: bool,
) -> io::Result<()> {
    writeln!(out, "\n{}", paint("Deletion Mode Enabled", Color::Yellow, colors))?;
    writeln!(out, "Enter the number of an item to delete it, or 'q' to quit")?;

    loop {
        write!(out, "\nItem to delete (or 'q' to quit): ")?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            break;
        };

        let index = match parse_selection(&line, view.len()) {
            Selection::Quit => break,
            Selection::Invalid => {
                writeln!(out, "Please enter a valid number or 'q'")?;
                continue;
            }
            Selection::OutOfRange => {
                writeln!(out, "Invalid item number")?;
                continue;
            }
            Selection::Item(i) => i,
        };

        let entry = &view[index];
        let confirmed = if is_protected(&entry.path) {
            writeln!(
                out,
                "{}",
                paint("WARNING: This is a protected system item!", Color::Red, colors)
            )?;
            confirm(
                input,
                out,
                "Are you ABSOLUTELY sure you want to delete this protected item?",
            )?
        } else if !entry.is_safe_to_delete {
            writeln!(
                out,
                "{}",
                paint(
                    "Warning: This item may not be safe to delete.",
                    Color::Yellow,
                    colors
                )
            )?;
            writeln!(out, "Reason: {}", entry.reason)?;
            confirm(input, out, "Are you sure you want to delete this item?")?
        } else {
            confirm(input, out, &format!("Delete {}?", entry.path.display()))?
        };

        if !confirmed {
            continue;
        }

        match deleter::delete(&entry.path) {
            Ok(()) => {
                writeln!(out, "Successfully deleted {}", entry.path.display())?;
                view.remove(index);
            }
            Err(DeleteError::NotFound { path }) => {
                writeln!(out, "{} no longer exists", path.display())?;
                view.remove(index);
            }
            Err(err @ DeleteError::PermissionDenied { .. }) => {
                writeln!(out, "{}", paint(&err.to_string(), Color::Red, colors))?;
                if !is_elevated() {
                    writeln!(
                        out,
                        "Retry with elevated privileges (e.g. sudo, or an Administrator prompt)."
                    )?;
                }
            }
            Err(err) => {
                writeln!(out, "{}", paint(&err.to_string(), Color::Red, colors))?;
            }
        }
    }

    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;
    Ok(read_line(input)?.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
}
