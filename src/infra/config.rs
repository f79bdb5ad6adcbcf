use anyhow::{Context, Result};
use grade_analytics::{AverageStrategy, ScoreField};
use serde::Deserialize;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "GRADE_ANALYTICS_CONFIG";

/// Defaults applied when a command does not name a strategy, field or scale.
///
/// Stored as a plain JSON object on disk, every key optional:
/// ```json
/// {
///   "strategy": "weighted-pool",
///   "field": "student",
///   "scale": 20
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub strategy: AverageStrategy,
    pub field: ScoreField,
    pub scale: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            strategy: AverageStrategy::SubjectMean,
            field: ScoreField::Student,
            scale: 20.0,
        }
    }
}

impl AnalyticsConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        Self::parse(&content).with_context(|| format!("invalid config {path}"))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(&path),
            Err(_) => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(AnalyticsConfig::parse("{}").unwrap(), AnalyticsConfig::default());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = AnalyticsConfig::parse(r#"{ "strategy": "median", "scale": 10 }"#).unwrap();
        assert_eq!(config.strategy, AverageStrategy::Median);
        assert_eq!(config.field, ScoreField::Student);
        assert_eq!(config.scale, 10.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(AnalyticsConfig::parse(r#"{ "algorithm": "median" }"#).is_err());
        assert!(AnalyticsConfig::parse(r#"{ "field": "teacher" }"#).is_err());
    }
}
