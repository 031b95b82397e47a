//! # Bootstrap Configuration
//!
//! Runtime parameters for the bootstrap pipeline and its reference adapters.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GB_HOME_BASE` | `$HOME` or `.` | Base directory for default chain homes |
//! | `GB_MONIKER` | `moniker` | Validator moniker used for a default genesis |
//! | `GB_FETCH_TIMEOUT_SECS` | `60` | HTTP timeout when fetching a genesis |
//! | `GB_DEADLINE_SECS` | unset | Deadline for a whole bootstrap run |
//! | `GB_LOG_LEVEL` or `RUST_LOG` | `info` | Log filter |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Moniker used when none is configured.
///
/// Upstream still uses this placeholder for the default genesis validator.
pub const DEFAULT_MONIKER: &str = "moniker";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Moniker must not be empty")]
    EmptyMoniker,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Bootstrap configuration.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Base directory under which `.<chain_id>` homes are created.
    pub home_base: PathBuf,
    /// Validator moniker passed to `init` for a default genesis.
    pub moniker: String,
    /// HTTP timeout for genesis downloads.
    pub fetch_timeout: Duration,
    /// Optional deadline for the whole run.
    pub deadline: Option<Duration>,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            home_base: default_home_base(),
            moniker: DEFAULT_MONIKER.to_string(),
            fetch_timeout: Duration::from_secs(60),
            deadline: None,
            log_level: "info".to_string(),
        }
    }
}

fn default_home_base() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl BootstrapConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            home_base: lookup("GB_HOME_BASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.home_base),
            moniker: lookup("GB_MONIKER").unwrap_or(defaults.moniker),
            fetch_timeout: match lookup("GB_FETCH_TIMEOUT_SECS") {
                Some(value) => parse_secs("GB_FETCH_TIMEOUT_SECS", value)?,
                None => defaults.fetch_timeout,
            },
            deadline: match lookup("GB_DEADLINE_SECS") {
                Some(value) => Some(parse_secs("GB_DEADLINE_SECS", value)?),
                None => None,
            },
            log_level: lookup("GB_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.moniker.trim().is_empty() {
            return Err(ConfigError::EmptyMoniker);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("fetch timeout"));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration("deadline"));
        }
        Ok(())
    }
}

fn parse_secs(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_keep_placeholder_moniker() {
        let config = BootstrapConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.moniker, "moniker");
        assert_eq!(config.fetch_timeout, Duration::from_secs(60));
        assert!(config.deadline.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let config = BootstrapConfig::from_lookup(lookup(&[
            ("GB_HOME_BASE", "/var/chains"),
            ("GB_MONIKER", "validator-1"),
            ("GB_FETCH_TIMEOUT_SECS", "5"),
            ("GB_DEADLINE_SECS", "300"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.home_base, PathBuf::from("/var/chains"));
        assert_eq!(config.moniker, "validator-1");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.deadline, Some(Duration::from_secs(300)));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = BootstrapConfig::from_lookup(lookup(&[("GB_FETCH_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "GB_FETCH_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_moniker_is_rejected() {
        let err = BootstrapConfig::from_lookup(lookup(&[("GB_MONIKER", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMoniker));
    }

    #[test]
    fn test_zero_deadline_is_rejected() {
        let err = BootstrapConfig::from_lookup(lookup(&[("GB_DEADLINE_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDuration("deadline")));
    }
}
