//! Measures that make the automated browser look like a desktop visitor.
//!
//! Ranking pages throttle obvious automation, so every context gets a real
//! Chrome user agent and a masked `navigator.webdriver`.

pub mod fingerprint;
