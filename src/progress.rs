//! Shared progress bar construction.
//!
//! Bars are passive: they are only advanced by the code doing the work
//! and are hidden entirely unless progress output was requested.

use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)";

/// Factory for progress bars
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    enabled: bool,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A bar that never draws
    pub fn hidden() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Create a bar of `len` steps labelled `message`.
    pub fn bar(&self, len: u64, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        ProgressBar::new(len).with_style(style).with_message(message)
    }
}
