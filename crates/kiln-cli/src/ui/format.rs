//! Sizes, durations and the bundle summary table.

use std::path::Path;
use std::time::Duration;

use kiln_bundler::BundleManifest;
use owo_colors::OwoColorize;

use super::colors_enabled;

/// Human-readable byte count.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Human-readable duration.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One line per written chunk with its size on disk.
pub fn print_bundle_summary(manifest: &BundleManifest, out_dir: &Path, elapsed: Duration) {
    let width = manifest
        .chunks
        .iter()
        .map(|chunk| chunk.file.len())
        .max()
        .unwrap_or(0);

    for chunk in &manifest.chunks {
        let size = std::fs::metadata(out_dir.join(&chunk.file))
            .map(|meta| format_size(meta.len()))
            .unwrap_or_else(|_| "?".to_string());
        let file = format!("{:width$}", chunk.file);
        if colors_enabled() {
            eprintln!(
                "  {}  {:>10}  {} module(s)",
                file.cyan(),
                size.dimmed(),
                chunk.modules.len()
            );
        } else {
            eprintln!("  {}  {:>10}  {} module(s)", file, size, chunk.modules.len());
        }
    }
    super::success(&format!(
        "wrote {} chunk(s) to {} in {}",
        manifest.chunks.len(),
        out_dir.display(),
        format_duration(elapsed)
    ));
}
