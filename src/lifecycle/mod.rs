//! Process lifecycle.
//!
//! # Design Decisions
//! - One broadcast shutdown signal; every periodic task selects on it
//! - Teardown order in main: monitor stop, breaker destroy, then exit

pub mod shutdown;

pub use shutdown::Shutdown;
