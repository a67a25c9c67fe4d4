//! Progress bar display for installer checkouts

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for the parallel checkout phase
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with the total package count
    pub fn new(total: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-");

        let bar = ProgressBar::new(total);
        bar.set_style(style);

        Self { bar }
    }

    /// Record one finished package
    pub fn advance(&self, name: &str) {
        self.bar.set_message(name.to_string());
        self.bar.inc(1);
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
