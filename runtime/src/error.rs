//! Error types for the scraping pipeline.
//!
//! Library code returns [`ScrapeError`]; the CLI and browser glue wrap it in
//! `anyhow` with context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by period parsing, extraction, aggregation and export.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid period {0:?}: expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("empty period range: {from} is after {to}")]
    EmptyRange { from: String, to: String },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("{raw:?} is not a sales figure")]
    Value { raw: String },

    #[error("rendering {url} failed: {reason}")]
    Render { url: String, reason: String },

    #[error("exporting to {} failed: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
