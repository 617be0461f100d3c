//! Configuration key schema.
//!
//! Declares every key the process understands: which are required, which
//! are numeric with a legal range, which are boolean, and which must never
//! leave the process unredacted. Validation in `validation.rs` is driven
//! entirely by these tables.

/// Prefix for environment variables, e.g. `STAKE_GUARD_NETWORK`.
pub const ENV_PREFIX: &str = "STAKE_GUARD_";

/// Key naming the target network. Gated by [`ALLOWED_NETWORKS`].
pub const NETWORK_KEY: &str = "NETWORK";

/// Key holding the chain RPC endpoint.
pub const RPC_URL_KEY: &str = "RPC_URL";

/// Key holding the staking contract address.
pub const CONTRACT_ADDRESS_KEY: &str = "CONTRACT_ADDRESS";

/// Key holding the operator signing key. Sensitive.
pub const OPERATOR_KEY_KEY: &str = "OPERATOR_KEY";

/// Key holding the maximum gas price in gwei.
pub const MAX_GAS_GWEI_KEY: &str = "MAX_GAS_GWEI";

/// Networks this process is sanctioned to operate against.
///
/// This is an allow-list, not a preference: a value outside this list is a
/// boot failure, never a warning.
pub const ALLOWED_NETWORKS: &[&str] = &["base-sepolia"];

/// Keys that must be present and non-empty before the process may start.
pub const REQUIRED_KEYS: &[&str] = &[
    NETWORK_KEY,
    RPC_URL_KEY,
    CONTRACT_ADDRESS_KEY,
    OPERATOR_KEY_KEY,
];

/// Secrets that must be present for `validate_security` to pass.
pub const REQUIRED_SECRETS: &[&str] = &[OPERATOR_KEY_KEY];

/// Keys whose values are replaced by [`REDACTED`] in any full-config dump.
pub const SENSITIVE_KEYS: &[&str] = &["OPERATOR_KEY", "WEBHOOK_SECRET", "ADMIN_API_KEY"];

/// Marker substituted for sensitive values.
pub const REDACTED: &str = "***REDACTED***";

/// A numeric key with its inclusive legal range.
#[derive(Debug, Clone, Copy)]
pub struct NumericKey {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Numeric keys and the ranges they must fall within.
pub const NUMERIC_KEYS: &[NumericKey] = &[
    NumericKey { name: "FAILURE_THRESHOLD", min: 1.0, max: 100.0 },
    NumericKey { name: "BREAKER_TIMEOUT_MS", min: 1_000.0, max: 600_000.0 },
    NumericKey { name: "HALF_OPEN_MAX_RETRIES", min: 1.0, max: 10.0 },
    NumericKey { name: "CHECK_INTERVAL_MS", min: 1_000.0, max: 300_000.0 },
    NumericKey { name: MAX_GAS_GWEI_KEY, min: 1.0, max: 2_000.0 },
    NumericKey { name: "PORT", min: 1.0, max: 65_535.0 },
];

/// Boolean keys.
pub const BOOLEAN_KEYS: &[&str] = &["ENABLE_METRICS", "ENABLE_ALERTING"];

/// Built-in defaults for keys that may be omitted.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("FAILURE_THRESHOLD", "5"),
    ("BREAKER_TIMEOUT_MS", "60000"),
    ("HALF_OPEN_MAX_RETRIES", "3"),
    ("CHECK_INTERVAL_MS", "30000"),
    (MAX_GAS_GWEI_KEY, "500"),
    ("PORT", "8080"),
    ("ENABLE_METRICS", "true"),
    ("ENABLE_ALERTING", "true"),
];

/// Look up the declared range for a numeric key, if it is one.
pub fn numeric_range(key: &str) -> Option<NumericKey> {
    NUMERIC_KEYS.iter().find(|k| k.name == key).copied()
}

/// Whether a key's value must be redacted in full-config dumps.
pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS.contains(&key)
}
