//! Configuration types
//!
//! Runtime knobs for the journal. The on-disk names live in [`crate::schema`]
//! and are not configurable.

use crate::error::ConfigError;
use crate::schema::KEYSPACE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Call journal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Keyspace the store handle is bound to.
    pub keyspace: String,
    /// TTL (seconds) used by callers that do not pick one per fragment.
    pub default_ttl_secs: i32,
    /// gzip level (0-9) for compressed trace parameters.
    pub trace_compression_level: u32,
    /// Whether write-started events carry a compressed copy of the contents.
    pub trace_contents: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            keyspace: KEYSPACE.to_string(),
            default_ttl_secs: 7 * 24 * 3600, // one week
            trace_compression_level: 6,
            trace_contents: true,
        }
    }
}

impl JournalConfig {
    /// Create a JournalConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CALLJOURNAL_KEYSPACE`: keyspace name (default: "memento")
    /// - `CALLJOURNAL_DEFAULT_TTL_SECS`: default column TTL (default: 604800)
    /// - `CALLJOURNAL_TRACE_COMPRESSION_LEVEL`: 0-9 (default: 6)
    /// - `CALLJOURNAL_TRACE_CONTENTS`: "true" or "false" (default: true)
    ///
    /// Unparseable values are reported rather than silently replaced.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let keyspace = lookup("CALLJOURNAL_KEYSPACE")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.keyspace);

        let default_ttl_secs = match lookup("CALLJOURNAL_DEFAULT_TTL_SECS") {
            Some(raw) => parse_field("default_ttl_secs", &raw)?,
            None => defaults.default_ttl_secs,
        };

        let trace_compression_level = match lookup("CALLJOURNAL_TRACE_COMPRESSION_LEVEL") {
            Some(raw) => parse_field("trace_compression_level", &raw)?,
            None => defaults.trace_compression_level,
        };

        let trace_contents = match lookup("CALLJOURNAL_TRACE_CONTENTS") {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "trace_contents".to_string(),
                        value: raw,
                        reason: "expected true or false".to_string(),
                    })
                }
            },
            None => defaults.trace_contents,
        };

        let config = Self {
            keyspace,
            default_ttl_secs,
            trace_compression_level,
            trace_contents,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs.max(0) as u64)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - keyspace is non-empty
    /// - default_ttl_secs >= 0 (0 means no expiry)
    /// - trace_compression_level in [0, 9]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyspace.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "keyspace".to_string(),
            });
        }

        if self.default_ttl_secs < 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_ttl_secs".to_string(),
                value: self.default_ttl_secs.to_string(),
                reason: "default_ttl_secs must not be negative".to_string(),
            });
        }

        if self.trace_compression_level > 9 {
            return Err(ConfigError::InvalidValue {
                field: "trace_compression_level".to_string(),
                value: self.trace_compression_level.to_string(),
                reason: "trace_compression_level must be between 0 and 9".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "not a number".to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = JournalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keyspace, "memento");
        assert_eq!(config.default_ttl(), Duration::from_secs(604800));
    }

    #[test]
    fn test_from_lookup_uses_defaults_when_unset() {
        let config = JournalConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, JournalConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = JournalConfig::from_lookup(lookup_from(&[
            ("CALLJOURNAL_KEYSPACE", "calls_test"),
            ("CALLJOURNAL_DEFAULT_TTL_SECS", "3600"),
            ("CALLJOURNAL_TRACE_COMPRESSION_LEVEL", "9"),
            ("CALLJOURNAL_TRACE_CONTENTS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.keyspace, "calls_test");
        assert_eq!(config.default_ttl_secs, 3600);
        assert_eq!(config.trace_compression_level, 9);
        assert!(!config.trace_contents);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = JournalConfig::from_lookup(lookup_from(&[(
            "CALLJOURNAL_DEFAULT_TTL_SECS",
            "an hour",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "default_ttl_secs"));

        let err = JournalConfig::from_lookup(lookup_from(&[("CALLJOURNAL_TRACE_CONTENTS", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "trace_contents"));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = JournalConfig::default();
        config.trace_compression_level = 10;
        assert!(config.validate().is_err());

        let mut config = JournalConfig::default();
        config.default_ttl_secs = -1;
        assert!(config.validate().is_err());

        let mut config = JournalConfig::default();
        config.keyspace.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }
}
