// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod persist;
pub mod pipeline;
pub mod seen;
pub mod timestamp;

// ---- Re-exports for stable public API ----
pub use crate::config::WatcherConfig;
pub use crate::error::{FetchError, WatchError};
pub use crate::fetch::{FixturePageSource, HttpPageSource, PageSource};
pub use crate::pipeline::{run_once, RunSummary};
