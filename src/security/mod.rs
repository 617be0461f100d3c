//! Input security subsystem.
//!
//! # Data Flow
//! ```text
//! incoming payload
//!     → requests.rs (typed shape via serde)
//!     → validator.rs (field checks in fixed order, first failure wins)
//!         → patterns.rs (SQL/XSS deny-lists on every free-text field)
//!     → ValidationResult {valid, error, severity}
//! ```
//!
//! # Design Decisions
//! - Validators are pure functions; no shared state, nothing throws for
//!   ordinary bad input
//! - Injection matches are CRITICAL (SQL) or HIGH (XSS) and logged under
//!   the `security_audit` target for incident review
//! - The gas ceiling is a constant; no caller-supplied maximum can widen it

pub mod patterns;
pub mod requests;
pub mod validator;

pub use requests::{CheckinRequest, CommitmentRequest};
pub use validator::{
    validate_checkin_request, validate_commitment_request, validate_gas_price,
    validate_stake_amount, validate_wallet_address, Severity, StakeTier, ValidationResult,
};
