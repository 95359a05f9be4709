//! Configuration for aggregation passes.
//!
//! This configuration is designed to be easily serializable and loadable
//! from JSON, TOML, or other formats while keeping complexity minimal.

use serde::{Deserialize, Serialize};

/// Tunables for the merge state's skip-list accumulator.
///
/// # Example
///
/// ```rust
/// use tempora::Config;
///
/// // Create default config
/// let config = Config::default();
///
/// // Load from JSON
/// let json = r#"{
///     "skiplist_max_level": 16,
///     "rng_seed": 42
/// }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum tower height of the skip-list accumulator (2-32).
    /// Higher values suit larger states at a small memory cost per node.
    #[serde(default = "Config::default_skiplist_max_level")]
    pub skiplist_max_level: usize,

    /// Seed for the skip-list level generator. `None` uses a fixed
    /// default, keeping runs deterministic without any hidden global
    /// state.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Config {
    const fn default_skiplist_max_level() -> usize {
        32
    }

    const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn with_skiplist_max_level(mut self, max_level: usize) -> Self {
        assert!(
            (2..=32).contains(&max_level),
            "Skip-list max level must be between 2 and 32"
        );
        self.skiplist_max_level = max_level;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// The effective level-generator seed.
    pub fn seed(&self) -> u64 {
        self.rng_seed.unwrap_or(Self::DEFAULT_SEED)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.skiplist_max_level < 2 || self.skiplist_max_level > 32 {
            return Err("Skip-list max level must be between 2 and 32".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error;
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature).
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        use serde::de::Error;
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature).
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skiplist_max_level: Self::default_skiplist_max_level(),
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.skiplist_max_level, 32);
        assert!(config.rng_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_skiplist_max_level(8)
            .with_rng_seed(1234);
        assert_eq!(config.skiplist_max_level, 8);
        assert_eq!(config.seed(), 1234);
    }

    #[test]
    #[should_panic(expected = "Skip-list max level must be between 2 and 32")]
    fn test_config_invalid_level() {
        let _ = Config::default().with_skiplist_max_level(64);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_skiplist_max_level(16)
            .with_rng_seed(7);
        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized.skiplist_max_level, 16);
        assert_eq!(deserialized.rng_seed, Some(7));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.skiplist_max_level = 1;
        assert!(config.validate().is_err());

        config.skiplist_max_level = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let json = r#"{ "skiplist_max_level": 1 }"#;
        assert!(Config::from_json(json).is_err());
    }
}
