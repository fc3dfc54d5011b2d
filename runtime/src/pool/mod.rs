//! Browser context pool.
//!
//! Bounds how many browser contexts are alive at once and guarantees each
//! one is closed when the caller is done with it.

pub mod manager;

pub use manager::{ContextHandle, PoolManager};
