//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB file and in-process map for the KeyValueStore port
//! - System and fixed clocks for the Clock port
//! - Built-in demo catalog

pub mod clock;
pub mod demo;
pub mod duckdb;
pub mod flaky;
pub mod memory;

pub use clock::{FixedClock, SystemClock};
pub use duckdb::DuckDbStore;
pub use flaky::FlakyStore;
pub use memory::MemoryStore;
