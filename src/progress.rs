//! Terminal progress feedback.
//!
//! The orchestrator reports through [`ProgressObserver`] and never touches
//! the terminal itself. [`ProgressBar`] wraps an `indicatif` bar with a steady
//! tick so the spinner keeps moving while an article fetch or oracle call
//! blocks.

use indicatif::{ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

/// The last string is shown once the bar is finished.
const TICKS: &[&str] = &["|", "/", "-", "\\", "done"];

const BAR_TEMPLATE: &str = "[{bar:20}] {percent:>3}% ({pos}/{len}) (skipped: {msg})  {prefix}... {spinner}";
const SPINNER_TEMPLATE: &str = "{prefix}... {spinner}";

/// Receives per-article progress from the orchestrator.
pub trait ProgressObserver: Send + Sync {
    /// `index` articles of `total` have been handled, `skipped` of them
    /// dropped for lack of text.
    fn on_progress(&self, index: usize, total: usize, skipped: usize);
}

/// Observer that ignores every update.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

#[cfg(test)]
impl ProgressObserver for NoProgress {
    fn on_progress(&self, _index: usize, _total: usize, _skipped: usize) {}
}

#[cfg(test)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub count: usize,
    pub total: Option<usize>,
    pub skipped: usize,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .expect("static template")
        .progress_chars("## ")
        .tick_strings(TICKS)
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .expect("static template")
        .tick_strings(TICKS)
}

/// A progress bar, or a bare spinner until a total is known.
///
/// Draws to stderr, which `indicatif` leaves untouched when it is not a
/// terminal; updates are still recorded.
pub struct ProgressBar {
    bar: indicatif::ProgressBar,
}

impl ProgressBar {
    pub fn new(message: &str, total: Option<usize>) -> Self {
        Self::with_target(message, total, ProgressDrawTarget::stderr())
    }

    pub fn spinner(message: &str) -> Self {
        Self::new(message, None)
    }

    fn with_target(message: &str, total: Option<usize>, target: ProgressDrawTarget) -> Self {
        let bar = indicatif::ProgressBar::with_draw_target(total.map(|t| t as u64), target);
        bar.set_style(if total.is_some() { bar_style() } else { spinner_style() });
        bar.set_prefix(message.to_string());
        bar.set_message("0");
        bar.enable_steady_tick(REDRAW_INTERVAL);
        Self { bar }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.bar.position() as usize,
            total: self.bar.length().map(|l| l as usize),
            skipped: self.bar.message().parse().unwrap_or_default(),
        }
    }

    /// Stop ticking and leave the final line with `done` in place of the
    /// spinner.
    pub fn finish(self) {
        self.bar.finish();
    }
}

impl ProgressObserver for ProgressBar {
    fn on_progress(&self, index: usize, total: usize, skipped: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
            self.bar.set_style(bar_style());
        }
        self.bar.set_position(index as u64);
        // The skipped count is rendered through `{msg}`.
        self.bar.set_message(skipped.to_string());
    }
}
