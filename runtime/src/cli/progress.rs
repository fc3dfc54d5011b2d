//! Spinner display for a multi-month scrape.

use crate::aggregate::{MonthObserver, MonthOutcome, MonthReport};
use crate::cli::output::Styled;
use crate::model::MonthTarget;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICKS: &str = "\u{25b8}\u{25b9}\u{25b8}\u{25b9}\u{25b8}";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICKS)
}

/// Create a simple spinner for general operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(spinner_style());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// One spinner for the current month; finished months leave a line behind.
pub struct MonthProgress {
    bar: ProgressBar,
    styled: Styled,
}

impl MonthProgress {
    pub fn new() -> Self {
        Self {
            bar: create_spinner("starting browser"),
            styled: Styled::new(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for MonthProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl MonthObserver for MonthProgress {
    fn month_started(&self, index: usize, total: usize, target: &MonthTarget) {
        self.bar
            .set_message(format!("{} {}", target.period, self.styled.dim(&format!("({}/{total})", index + 1))));
    }

    fn month_finished(&self, report: &MonthReport) {
        let s = &self.styled;
        let line = match &report.outcome {
            MonthOutcome::Scraped { count, strategy } => format!(
                "  {} {}  {}",
                s.ok_sym(),
                report.period,
                s.green(&format!("{count} records via {strategy}"))
            ),
            MonthOutcome::Empty => format!("  {} {}  {}", s.warn_sym(), report.period, s.yellow("no data")),
            MonthOutcome::Failed { reason } => {
                format!("  {} {}  {}", s.fail_sym(), report.period, s.red(reason))
            }
        };
        self.bar.println(line);
    }
}
