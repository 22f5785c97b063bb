// Progress bar management using indicatif.
// One byte-counting bar covers every named input file; stdin has no known size.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;

#[derive(Clone)]
pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    // Create a new manager. If enabled=false, no bars are created.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    // Create a bar sized to the sum of the input files. Returns None when
    // disabled, when reading stdin, or when no size is known.
    pub fn new_input_bar(&self, paths: &[String], label: &str) -> Option<ProgressBar> {
        if !self.enabled || paths.is_empty() || paths.iter().any(|p| p == "-") {
            return None;
        }
        let size: u64 = paths
            .iter()
            .map(|p| fs::metadata(p).map(|m| m.len()).unwrap_or(0))
            .sum();
        if size == 0 {
            return None;
        }
        let bar = ProgressBar::new(size);
        bar.set_style(progress_style());
        bar.set_prefix(label.to_string());
        Some(bar)
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:20} {bytes:>10}/{total_bytes:<10} [{bar:50}] {percent:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█ ")
}
