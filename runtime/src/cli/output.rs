//! Shared CLI output: colors, check lines, record tables and mode flags.
//!
//! Human-readable output goes to stderr so stdout stays clean for `--json`.

use crate::model::SalesRecord;
use std::io::IsTerminal;

/// Set by `--quiet`.
pub const QUIET_ENV: &str = "SALESRANK_QUIET";
/// Set by `--json`.
pub const JSON_ENV: &str = "SALESRANK_JSON";

/// Check if color output is enabled.
pub fn color_enabled() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn fail_sym(&self) -> &str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    pub fn warn_sym(&self) -> &str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("salesrank"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// Print a check result line with symbol and label/value.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<16} {value}");
}

/// Print an indented detail/fix line under a check.
pub fn print_detail(msg: &str) {
    eprintln!("                        {msg}");
}

/// Format a duration in milliseconds (e.g. "850ms", "12.4s", "2m 5s").
pub fn format_elapsed(ms: u128) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Render records as aligned `date rank label value` lines.
pub fn record_lines(records: &[SalesRecord]) -> Vec<String> {
    let width = records
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);
    records
        .iter()
        .map(|r| {
            let pad = " ".repeat(width - r.label.chars().count());
            format!("{}  {:>3}  {}{pad}  {:>8}", r.period, r.rank, r.label, r.value)
        })
        .collect()
}

pub fn is_quiet() -> bool {
    std::env::var_os(QUIET_ENV).is_some()
}

pub fn is_json() -> bool {
    std::env::var_os(JSON_ENV).is_some()
}

/// Print JSON output to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}
