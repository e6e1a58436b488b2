//! Environment-backed configuration helpers
//!
//! Configuration structs in this workspace are built per run. These helpers
//! read individual values from an environment source so the structs can be
//! tested without touching the process environment.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set or blank
    #[error("{0} environment variable not set")]
    Missing(String),

    /// A variable is set but does not parse
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Source of configuration values
pub trait EnvSource {
    /// Look up a variable; blank values count as unset
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// In-memory environment, handy in tests
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Read a required variable
pub fn required(env: &impl EnvSource, key: &str) -> Result<String, ConfigError> {
    env.var(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Read an optional variable and parse it
pub fn parsed<T>(env: &impl EnvSource, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env.var(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Load a `.env` file from the working directory if one exists
///
/// Returns the path that was loaded. Only binaries should call this.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    dotenvy::dotenv().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        let env = MapEnv::new().with("OPENAI_API_KEY", "sk-test");
        assert_eq!(required(&env, "OPENAI_API_KEY").unwrap(), "sk-test");
        assert_eq!(
            required(&env, "OTHER"),
            Err(ConfigError::Missing("OTHER".to_string()))
        );
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let env = MapEnv::new().with("OPENAI_API_KEY", "   ");
        assert!(required(&env, "OPENAI_API_KEY").is_err());
    }

    #[test]
    fn test_parsed() {
        let env = MapEnv::new().with("N", "15").with("BAD", "fifteen");

        assert_eq!(parsed::<usize>(&env, "N").unwrap(), Some(15));
        assert_eq!(parsed::<usize>(&env, "UNSET").unwrap(), None);

        let err = parsed::<usize>(&env, "BAD").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "BAD"));
    }

    #[test]
    fn test_load_dotenv_reexported() {
        let _loader: fn() -> Option<std::path::PathBuf> = crate::load_dotenv;
    }
}
