//! Human readable file sizes.

use std::path::Path;

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count with binary (1024) scaling, e.g. `1536 -> "1.5 KB"`.
///
/// At most two decimals are shown and trailing zeros are dropped. A value
/// that rounds up to 1024 moves to the next unit, so `1048575` is `"1 MB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if round_to_cents(value) >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[unit])
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Looks up the current size of a file.
pub trait SizeProbe: Send + Sync {
    /// Size in bytes, or `None` when it cannot be read.
    fn size_of(&self, path: &Path) -> Option<u64>;
}

/// Reads sizes from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSizeProbe;

impl SizeProbe for FsSizeProbe {
    fn size_of(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len())
    }
}
