//! Configuration loading.
//!
//! Three layers, later layers winning: built-in defaults, an optional TOML
//! defaults file, then `STAKE_GUARD_`-prefixed environment variables. The
//! merged snapshot is taken exactly once per manager construction.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::schema::{DEFAULTS, ENV_PREFIX};
use crate::config::validation::ConfigError;

/// Collect `STAKE_GUARD_*` environment variables, prefix stripped.
pub fn env_overrides() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|name| (name.to_string(), value))
        })
        .collect()
}

/// Parse a TOML defaults file into a flat key/value map.
///
/// Only scalar values are accepted; tables and arrays are a load error so a
/// misshaped file fails boot instead of silently dropping settings.
pub fn load_defaults_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let table: toml::Table = content.parse()?;

    let mut values = HashMap::new();
    for (key, value) in table {
        let rendered = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            other => {
                return Err(ConfigError::Invalid(vec![format!(
                    "defaults file key '{key}' has unsupported type {}",
                    other.type_str()
                )]));
            }
        };
        values.insert(key.to_uppercase(), rendered);
    }
    Ok(values)
}

/// Merge the three layers into a single snapshot.
pub fn snapshot(defaults_file: Option<&Path>) -> Result<HashMap<String, String>, ConfigError> {
    let mut values: HashMap<String, String> = DEFAULTS
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    if let Some(path) = defaults_file {
        values.extend(load_defaults_file(path)?);
    }

    values.extend(env_overrides());
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_without_file_carries_builtin_defaults() {
        let values = snapshot(None).unwrap();
        assert_eq!(values.get("FAILURE_THRESHOLD").map(String::as_str), Some("5"));
        assert_eq!(values.get("MAX_GAS_GWEI").map(String::as_str), Some("500"));
    }

    #[test]
    fn test_defaults_file_scalars_are_stringified() {
        let dir = std::env::temp_dir().join("stake-guard-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("defaults.toml");
        std::fs::write(&path, "network = \"base-sepolia\"\nport = 9090\nenable_metrics = false\n")
            .unwrap();

        let values = load_defaults_file(&path).unwrap();
        assert_eq!(values.get("NETWORK").map(String::as_str), Some("base-sepolia"));
        assert_eq!(values.get("PORT").map(String::as_str), Some("9090"));
        assert_eq!(values.get("ENABLE_METRICS").map(String::as_str), Some("false"));
    }

    #[test]
    fn test_defaults_file_rejects_nested_tables() {
        let dir = std::env::temp_dir().join("stake-guard-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nested.toml");
        std::fs::write(&path, "[breaker]\nthreshold = 5\n").unwrap();

        assert!(load_defaults_file(&path).is_err());
    }
}
