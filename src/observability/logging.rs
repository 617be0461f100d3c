//! Structured logging.
//!
//! # Design Decisions
//! - tracing for structured logs throughout; no log crate
//! - Level configurable via RUST_LOG, sane default otherwise
//! - Security violations log under the `security_audit` target so they
//!   can be routed separately for incident review

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber. Call once, before any other setup.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stake_guard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
