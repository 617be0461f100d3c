//! Validated configuration access.
//!
//! A `ConfigManager` only exists in a validated state: every constructor
//! runs the full semantic validation and returns an error instead of a
//! partially-valid manager. Components receive it by `Arc` and never read
//! the environment themselves.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;

use crate::config::loader;
use crate::config::schema::{is_sensitive, REDACTED};
use crate::config::validation::{security_report, validate_settings, ConfigError, SecurityReport};

/// Process configuration, loaded and validated once.
#[derive(Debug)]
pub struct ConfigManager {
    // RwLock only for post-boot secret injection via `set`; the snapshot
    // itself is taken once and never re-merged.
    values: RwLock<HashMap<String, String>>,
}

impl ConfigManager {
    /// Build from built-in defaults plus `STAKE_GUARD_*` environment
    /// variables. Fails instead of producing a partially-valid manager.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_snapshot(loader::snapshot(None)?)
    }

    /// Build from a TOML defaults file, environment variables layered on top.
    pub fn from_file_and_env(defaults_file: &Path) -> Result<Self, ConfigError> {
        Self::from_snapshot(loader::snapshot(Some(defaults_file))?)
    }

    /// Build from explicit key/value pairs merged over built-in defaults.
    /// Intended for tests and embedding; validation is identical.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values: HashMap<String, String> = crate::config::schema::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        values.extend(vars);
        Self::from_snapshot(values)
    }

    fn from_snapshot(values: HashMap<String, String>) -> Result<Self, ConfigError> {
        validate_settings(&values)?;
        tracing::info!(keys = values.len(), "Configuration validated");
        Ok(Self {
            values: RwLock::new(values),
        })
    }

    /// Get a string value. Errors if the key is absent.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        self.values
            .read()
            .expect("config lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Get a string value, falling back to `default` when absent.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get a numeric value. Errors if absent or unparseable.
    pub fn get_number(&self, key: &str) -> Result<f64, ConfigError> {
        let value = self.get(key)?;
        value.parse::<f64>().map_err(|_| ConfigError::WrongType {
            key: key.to_string(),
            expected: "number",
            value,
        })
    }

    /// Get a numeric value, falling back to `default` when absent or invalid.
    pub fn get_number_or(&self, key: &str, default: f64) -> f64 {
        self.get_number(key).unwrap_or(default)
    }

    /// Get a boolean value. Accepts `true`/`false`/`1`/`0`.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "boolean",
                value,
            }),
        }
    }

    /// Get a boolean value, falling back to `default` when absent or invalid.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Runtime override. Reserved for values fetched from a secret store
    /// after boot; everything else should arrive through the loader.
    pub fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .expect("config lock poisoned")
            .insert(key.to_string(), value.to_string());
        tracing::debug!(key, "Configuration override applied");
    }

    /// Full configuration with sensitive values replaced by a redaction
    /// marker. There is no variant of this method that returns raw secrets.
    pub fn all_redacted(&self) -> BTreeMap<String, String> {
        self.values
            .read()
            .expect("config lock poisoned")
            .iter()
            .map(|(key, value)| {
                let shown = if is_sensitive(key) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect()
    }

    /// Re-check the security-relevant invariants without failing.
    pub fn validate_security(&self) -> SecurityReport {
        security_report(&self.values.read().expect("config lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        ConfigManager::from_vars([
            ("NETWORK".to_string(), "base-sepolia".to_string()),
            ("RPC_URL".to_string(), "https://sepolia.base.org".to_string()),
            (
                "CONTRACT_ADDRESS".to_string(),
                "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            ),
            ("OPERATOR_KEY".to_string(), "0xdeadbeef".to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_construction_fails_on_invalid_snapshot() {
        let result = ConfigManager::from_vars([
            ("NETWORK".to_string(), "mainnet".to_string()),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_missing_key_errors() {
        let cfg = manager();
        match cfg.get("NO_SUCH_KEY") {
            Err(ConfigError::MissingKey(key)) => assert_eq!(key, "NO_SUCH_KEY"),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_get_or_returns_default() {
        let cfg = manager();
        assert_eq!(cfg.get_or("NO_SUCH_KEY", "fallback"), "fallback");
    }

    #[test]
    fn test_typed_getters() {
        let cfg = manager();
        assert_eq!(cfg.get_number("FAILURE_THRESHOLD").unwrap(), 5.0);
        assert!(cfg.get_bool("ENABLE_METRICS").unwrap());
        assert_eq!(cfg.get_number_or("NO_SUCH_KEY", 7.5), 7.5);
        assert!(!cfg.get_bool_or("NO_SUCH_KEY", false));
    }

    #[test]
    fn test_get_number_rejects_non_numeric() {
        let cfg = manager();
        cfg.set("CUSTOM", "not-a-number");
        assert!(matches!(
            cfg.get_number("CUSTOM"),
            Err(ConfigError::WrongType { .. })
        ));
    }

    #[test]
    fn test_set_overrides_value() {
        let cfg = manager();
        cfg.set("WEBHOOK_SECRET", "s3cr3t");
        assert_eq!(cfg.get("WEBHOOK_SECRET").unwrap(), "s3cr3t");
    }

    #[test]
    fn test_all_redacted_never_leaks_secrets() {
        let cfg = manager();
        cfg.set("WEBHOOK_SECRET", "s3cr3t");

        let dump = cfg.all_redacted();
        assert_eq!(dump.get("OPERATOR_KEY").map(String::as_str), Some(REDACTED));
        assert_eq!(dump.get("WEBHOOK_SECRET").map(String::as_str), Some(REDACTED));
        assert_eq!(dump.get("NETWORK").map(String::as_str), Some("base-sepolia"));
        // Repeated calls behave identically.
        assert_eq!(
            cfg.all_redacted().get("OPERATOR_KEY").map(String::as_str),
            Some(REDACTED)
        );
    }

    #[test]
    fn test_validate_security_reflects_runtime_state() {
        let cfg = manager();
        assert!(cfg.validate_security().is_valid);

        cfg.set("OPERATOR_KEY", "");
        let report = cfg.validate_security();
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("OPERATOR_KEY")));
    }
}
