//! Progress bars for the traversal.

use crate::event_loop::{RunSummary, TraversalObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Shows one bar per assignment while the event loop walks submissions.
pub struct ProgressObserver {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Bars are only drawn if `enabled` is set and the terminal is
    /// interactive (stderr is a TTY, neither `NO_COLOR` nor
    /// `CODEPOST_STATS_NO_PROGRESS` is set).
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: enabled && is_interactive(),
            bar: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl TraversalObserver for ProgressObserver {
    fn on_assignment_start(&mut self, name: &str, submissions: usize) {
        self.finish();
        if !self.enabled {
            return;
        }

        let pb = ProgressBar::new(submissions as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {msg:<16} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(name.to_string());
        self.bar = Some(pb);
    }

    fn on_submission_done(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_assignment_done(&mut self, _name: &str) {
        self.finish();
    }

    fn on_run_done(&mut self, _summary: &RunSummary) {
        self.finish();
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        self.finish();
    }
}

fn is_interactive() -> bool {
    if !std::io::stderr().is_terminal() {
        return false;
    }

    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    std::env::var_os("CODEPOST_STATS_NO_PROGRESS").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_observer_draws_nothing() {
        let mut progress = ProgressObserver::new(false);
        assert!(!progress.is_enabled());

        progress.on_assignment_start("Hello", 3);
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_hooks_without_bar_do_not_panic() {
        let mut progress = ProgressObserver::new(false);
        progress.on_submission_done();
        progress.on_assignment_done("Hello");
        progress.on_run_done(&RunSummary::default());
    }
}
