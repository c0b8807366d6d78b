//! Mock options
//!
//! Defaults applied by a [`MockFactory`](crate::MockFactory) to every
//! dependency it creates. Options can be built in code, loaded from YAML
//! and overridden from the environment.

use crate::interceptor::Behavior;
use crate::result::{MockError, MockResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`MockOptions::default_behavior`]
pub const BEHAVIOR_ENV: &str = "UNDERSTUDY_BEHAVIOR";

/// Factory-wide options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockOptions {
    /// Behavior used by `create_default` and `Mocked::new` overrides
    pub default_behavior: Behavior,
    /// Record calls in each dependency's journal
    pub record_calls: bool,
    /// Calls retained per journal
    pub max_recorded_calls: usize,
    /// Warn when an arrangement is registered behind an unconditional one
    pub warn_on_shadowed: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            default_behavior: Behavior::Permissive,
            record_calls: true,
            max_recorded_calls: 10_000,
            warn_on_shadowed: true,
        }
    }
}

impl MockOptions {
    /// Set the default behavior
    #[must_use]
    pub const fn with_default_behavior(mut self, behavior: Behavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Enable or disable call recording
    #[must_use]
    pub const fn with_record_calls(mut self, enabled: bool) -> Self {
        self.record_calls = enabled;
        self
    }

    /// Set the journal capacity
    #[must_use]
    pub const fn with_max_recorded_calls(mut self, max: usize) -> Self {
        self.max_recorded_calls = max;
        self
    }

    /// Enable or disable shadowed-arrangement warnings
    #[must_use]
    pub const fn with_warn_on_shadowed(mut self, enabled: bool) -> Self {
        self.warn_on_shadowed = enabled;
        self
    }

    /// Load options from a YAML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if YAML parsing fails
    pub fn from_yaml_str(yaml: &str) -> MockResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml).map_err(|e| MockError::Config {
            message: e.to_string(),
        })
    }

    /// Load options from a YAML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> MockResult<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> MockResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides from a variable lookup (the environment, in practice)
    ///
    /// # Errors
    /// Returns error if an override names an unknown behavior
    pub fn with_overrides_from<F>(mut self, lookup: F) -> MockResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(BEHAVIOR_ENV) {
            self.default_behavior = raw.parse()?;
        }
        Ok(self)
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// Returns error if `UNDERSTUDY_BEHAVIOR` names an unknown behavior
    pub fn with_env_overrides(self) -> MockResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = MockOptions::default();
        assert_eq!(options.default_behavior, Behavior::Permissive);
        assert!(options.record_calls);
        assert_eq!(options.max_recorded_calls, 10_000);
        assert!(options.warn_on_shadowed);
    }

    #[test]
    fn test_from_yaml_partial() {
        let options = MockOptions::from_yaml_str("default_behavior: partial\nrecord_calls: false\n")
            .unwrap();
        assert_eq!(options.default_behavior, Behavior::PassThrough);
        assert!(!options.record_calls);
        assert_eq!(options.max_recorded_calls, 10_000);
    }

    #[test]
    fn test_from_yaml_empty_is_default() {
        assert_eq!(MockOptions::from_yaml_str("  ").unwrap(), MockOptions::default());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = MockOptions::from_yaml_str("default_behavior: chaotic").unwrap_err();
        assert!(matches!(err, MockError::Config { .. }));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let options = MockOptions::default()
            .with_default_behavior(Behavior::Strict)
            .with_max_recorded_calls(5);
        let yaml = options.to_yaml().unwrap();
        assert!(yaml.contains("strict"));
        assert_eq!(MockOptions::from_yaml_str(&yaml).unwrap(), options);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_behavior: strict").unwrap();
        writeln!(file, "warn_on_shadowed: false").unwrap();
        let options = MockOptions::from_file(file.path()).unwrap();
        assert_eq!(options.default_behavior, Behavior::Strict);
        assert!(!options.warn_on_shadowed);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MockOptions::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, MockError::Io(_)));
    }

    #[test]
    fn test_overrides() {
        let options = MockOptions::default()
            .with_overrides_from(|key| (key == BEHAVIOR_ENV).then(|| "strict".to_string()))
            .unwrap();
        assert_eq!(options.default_behavior, Behavior::Strict);

        let untouched = MockOptions::default().with_overrides_from(|_| None).unwrap();
        assert_eq!(untouched, MockOptions::default());

        assert!(MockOptions::default()
            .with_overrides_from(|_| Some("bogus".to_string()))
            .is_err());
    }
}
