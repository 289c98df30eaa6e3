//! A single-threaded external sort over a fixed-width-record tape
//! abstraction that models the access pattern of a sequential storage
//! device: one page resident at a time, explicit seeks, and optional
//! per-operation latency.

pub mod config;
pub mod error;
pub mod latency;
pub mod sort;
pub mod tape;

pub use error::{Error, TapeResult};
pub use latency::LatencyPolicy;
pub use sort::sort_file;
pub use tape::{Mode, Tape};
