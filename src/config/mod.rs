//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults + optional TOML file + STAKE_GUARD_* env vars
//!     → loader.rs (merge into one snapshot)
//!     → validation.rs (semantic checks, all violations collected)
//!     → ConfigManager (validated, shared via Arc)
//!
//! At runtime:
//!     manager.set() injects post-boot secrets
//!     manager.validate_security() re-checks the allow-list and secrets
//!     manager.all_redacted() is the only full dump, secrets masked
//! ```
//!
//! # Design Decisions
//! - Snapshot is taken exactly once; no hot reload
//! - Validation runs inside every constructor; no partially-valid manager
//!   is observable
//! - The network allow-list is a boot gate, not a warning

pub mod loader;
pub mod manager;
pub mod schema;
pub mod validation;

pub use manager::ConfigManager;
pub use validation::{ConfigError, SecurityReport};
