//! Configuration validation.
//!
//! Semantic checks over the merged key/value snapshot. Runs before the
//! manager is handed to any other component; a failure here must abort
//! boot. All violations are collected and reported together, not just the
//! first.

use std::collections::HashMap;

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::{
    ALLOWED_NETWORKS, BOOLEAN_KEYS, CONTRACT_ADDRESS_KEY, MAX_GAS_GWEI_KEY, NETWORK_KEY,
    NUMERIC_KEYS, REQUIRED_KEYS, REQUIRED_SECRETS, RPC_URL_KEY,
};

/// Errors raised while loading, validating, or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Defaults file could not be read.
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    /// Defaults file is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more semantic violations. The process must not start.
    #[error("config validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// A lookup for a key with no configured value and no caller default.
    #[error("config key '{0}' is not set")]
    MissingKey(String),

    /// A typed getter found a value it cannot parse.
    #[error("config key '{key}' is not a valid {expected}: '{value}'")]
    WrongType {
        key: String,
        expected: &'static str,
        value: String,
    },
}

/// Outcome of the runtime security re-check. Never a hard error; the
/// health monitor consumes this on every tick.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SecurityReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Fail-fast validation of a merged snapshot.
///
/// Checks, in order: required keys present and non-empty, numeric keys
/// parse and sit inside their declared ranges, the network allow-list, the
/// RPC endpoint shape, and the contract address shape.
pub fn validate_settings(values: &HashMap<String, String>) -> Result<(), ConfigError> {
    let mut violations = Vec::new();

    for key in REQUIRED_KEYS {
        match values.get(*key) {
            None => violations.push(format!("required key '{key}' is missing")),
            Some(value) if value.trim().is_empty() => {
                violations.push(format!("required key '{key}' is empty"));
            }
            Some(_) => {}
        }
    }

    for spec in NUMERIC_KEYS {
        if let Some(value) = values.get(spec.name) {
            match value.parse::<f64>() {
                Ok(parsed) if parsed >= spec.min && parsed <= spec.max => {}
                Ok(parsed) => violations.push(format!(
                    "key '{}' = {parsed} outside allowed range [{}, {}]",
                    spec.name, spec.min, spec.max
                )),
                Err(_) => violations.push(format!(
                    "key '{}' = '{value}' is not numeric",
                    spec.name
                )),
            }
        }
    }

    for key in BOOLEAN_KEYS {
        if let Some(value) = values.get(*key) {
            if !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "false" | "1" | "0"
            ) {
                violations.push(format!("key '{key}' = '{value}' is not a boolean"));
            }
        }
    }

    if let Some(network) = values.get(NETWORK_KEY) {
        if !ALLOWED_NETWORKS.contains(&network.as_str()) {
            violations.push(format!(
                "network '{network}' is not sanctioned (allowed: {})",
                ALLOWED_NETWORKS.join(", ")
            ));
        }
    }

    if let Some(rpc_url) = values.get(RPC_URL_KEY) {
        if !rpc_url.trim().is_empty() && url::Url::parse(rpc_url).is_err() {
            violations.push(format!("'{RPC_URL_KEY}' = '{rpc_url}' is not a valid URL"));
        }
    }

    if let Some(address) = values.get(CONTRACT_ADDRESS_KEY) {
        if !address.trim().is_empty() && address.parse::<Address>().is_err() {
            violations.push(format!(
                "'{CONTRACT_ADDRESS_KEY}' = '{address}' is not a valid contract address"
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(violations))
    }
}

/// Non-throwing security posture re-check over a snapshot.
///
/// Covers the subset of boot validation that matters for incident
/// response: network allow-list, gas-price ceiling range, and secret
/// presence.
pub fn security_report(values: &HashMap<String, String>) -> SecurityReport {
    let mut errors = Vec::new();

    match values.get(NETWORK_KEY) {
        Some(network) if ALLOWED_NETWORKS.contains(&network.as_str()) => {}
        Some(network) => errors.push(format!("network '{network}' is not sanctioned")),
        None => errors.push(format!("'{NETWORK_KEY}' is not set")),
    }

    match values.get(MAX_GAS_GWEI_KEY).map(|v| v.parse::<f64>()) {
        Some(Ok(gwei)) => {
            let spec = crate::config::schema::numeric_range(MAX_GAS_GWEI_KEY)
                .unwrap_or(crate::config::schema::NumericKey {
                    name: MAX_GAS_GWEI_KEY,
                    min: 1.0,
                    max: 2_000.0,
                });
            if gwei < spec.min || gwei > spec.max {
                errors.push(format!("gas ceiling {gwei} gwei outside [{}, {}]", spec.min, spec.max));
            }
        }
        Some(Err(_)) => errors.push(format!("'{MAX_GAS_GWEI_KEY}' is not numeric")),
        None => errors.push(format!("'{MAX_GAS_GWEI_KEY}' is not set")),
    }

    for secret in REQUIRED_SECRETS {
        match values.get(*secret) {
            Some(value) if !value.trim().is_empty() => {}
            _ => errors.push(format!("required secret '{secret}' is missing")),
        }
    }

    SecurityReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULTS;

    fn valid_snapshot() -> HashMap<String, String> {
        let mut values: HashMap<String, String> = DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        values.insert("NETWORK".into(), "base-sepolia".into());
        values.insert("RPC_URL".into(), "https://sepolia.base.org".into());
        values.insert(
            "CONTRACT_ADDRESS".into(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
        );
        values.insert("OPERATOR_KEY".into(), "0xdeadbeef".into());
        values
    }

    #[test]
    fn test_valid_snapshot_passes() {
        assert!(validate_settings(&valid_snapshot()).is_ok());
    }

    #[test]
    fn test_missing_required_key_fails() {
        let mut values = valid_snapshot();
        values.remove("RPC_URL");
        let err = validate_settings(&values).unwrap_err();
        assert!(err.to_string().contains("RPC_URL"));
    }

    #[test]
    fn test_empty_required_key_fails() {
        let mut values = valid_snapshot();
        values.insert("OPERATOR_KEY".into(), "   ".into());
        assert!(validate_settings(&values).is_err());
    }

    #[test]
    fn test_numeric_out_of_range_fails() {
        let mut values = valid_snapshot();
        values.insert("FAILURE_THRESHOLD".into(), "0".into());
        let err = validate_settings(&values).unwrap_err();
        assert!(err.to_string().contains("FAILURE_THRESHOLD"));
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let mut values = valid_snapshot();
        values.insert("CHECK_INTERVAL_MS".into(), "soon".into());
        assert!(validate_settings(&values).is_err());
    }

    #[test]
    fn test_non_boolean_flag_fails() {
        let mut values = valid_snapshot();
        values.insert("ENABLE_ALERTING".into(), "maybe".into());
        assert!(validate_settings(&values).is_err());
    }

    #[test]
    fn test_disallowed_network_fails() {
        let mut values = valid_snapshot();
        values.insert("NETWORK".into(), "mainnet".into());
        let err = validate_settings(&values).unwrap_err();
        assert!(err.to_string().contains("not sanctioned"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut values = valid_snapshot();
        values.remove("OPERATOR_KEY");
        values.insert("NETWORK".into(), "mainnet".into());
        values.insert("PORT".into(), "99999".into());
        match validate_settings(&values) {
            Err(ConfigError::Invalid(violations)) => assert_eq!(violations.len(), 3),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_security_report_lists_exact_violations() {
        let mut values = valid_snapshot();
        values.remove("OPERATOR_KEY");
        values.insert("NETWORK".into(), "mainnet".into());

        let report = security_report(&values);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.contains("mainnet")));
        assert!(report.errors.iter().any(|e| e.contains("OPERATOR_KEY")));
    }

    #[test]
    fn test_security_report_clean_config() {
        let report = security_report(&valid_snapshot());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }
}
