use humansize::BINARY;

const KB: u64 = 1024;

// Two-letter suffixes first so "kb" is not read as "k" + "b".
const UNITS: &[(&str, u64)] = &[
    ("tb", KB * KB * KB * KB),
    ("gb", KB * KB * KB),
    ("mb", KB * KB),
    ("kb", KB),
    ("t", KB * KB * KB * KB),
    ("g", KB * KB * KB),
    ("m", KB * KB),
    ("k", KB),
    ("b", 1),
];

/// Format size in human-readable binary units
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, BINARY)
}

/// Parse a size string like "10MB", "1.5g" or "2048" into bytes.
///
/// Units are binary and case-insensitive; a single letter (`k`, `m`, `g`,
/// `t`, `b`) is accepted as shorthand. A bare number is bytes. Fractional
/// results are truncated.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, m)| s.strip_suffix(*suffix).map(|n| (n, *m)))
        .unwrap_or((s.as_str(), 1));

    let value = num_str.trim().parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some((value * multiplier as f64) as u64)
}
