//! Progress bars and spinners for long-running commands.
//!
//! Bars draw to stderr and are hidden in JSON mode so stdout stays parseable.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::services::ReplaySummary;

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg} (ETA: {eta})";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";

const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bar with ETA for `total` items.
pub fn create_progress_bar(total: u64, hidden: bool) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), draw_target(hidden));
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner for operations without a known length.
pub fn create_spinner(message: impl Into<String>, hidden: bool) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, draw_target(hidden));
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS);
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn draw_target(hidden: bool) -> ProgressDrawTarget {
    if hidden {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stderr()
    }
}

/// Short running tally shown next to the replay bar.
pub fn replay_message(summary: &ReplaySummary) -> String {
    format!(
        "created {} updated {} skipped {} conflicts {} failed {}",
        summary.created, summary.updated, summary.skipped, summary.conflicts, summary.failed
    )
}
