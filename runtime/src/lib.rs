//! salesrank: scrape monthly vehicle sales rankings from a JavaScript-rendered
//! site and aggregate them into one spreadsheet.
//!
//! The pipeline per month is render ([`renderer`]) -> extract ([`extraction`])
//! -> rank ([`ranking`]); [`aggregate`] runs it across months and re-ranks
//! the merged result, and [`export`] writes it out.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod model;
pub mod pool;
pub mod ranking;
pub mod renderer;
pub mod stealth;
