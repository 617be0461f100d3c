//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the chain dependency:
//!     → circuit_breaker.rs can_proceed() gates the call
//!     → caller executes, then records success/failure into the breaker
//!     → On gate closed or failure: backoff.rs schedules the retry
//!
//! registry.rs keys one breaker per named dependency.
//! ```
//!
//! # Design Decisions
//! - The breaker classifies; callers own retry, fallback, and surfacing
//! - One breaker per dependency, enforced by the registry
//! - Open → Half-Open runs through a single generation-guarded timer path

pub mod backoff;
pub mod circuit_breaker;
pub mod registry;

pub use backoff::RetryPolicy;
pub use circuit_breaker::{
    BreakerEvent, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use registry::BreakerRegistry;
