//! Complexity configuration.

use crate::directive::{default_cost_compare_key, CostCompareKey};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error loading a [`ComplexityConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid complexity config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of the cost estimation engine.
///
/// Loaded from JSON with camelCase keys:
///
/// ```
/// use gqlcost_complexity::ComplexityConfig;
///
/// let config = ComplexityConfig::from_json_str(r#"{"maxComplexity": 200, "reportComplexity": true}"#)
///     .unwrap();
/// assert_eq!(config.max_complexity, 200);
/// assert_eq!(config.default_cost, 0);
/// assert!(config.report_complexity);
/// ```
#[derive(Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComplexityConfig {
    /// The budget. A document costing more is rejected.
    pub max_complexity: i64,

    /// Cost of a field without a directive, or with an unset `complexity`.
    #[serde(default)]
    pub default_cost: i64,

    /// Whether the computed result is exposed in response extensions on success.
    #[serde(default)]
    pub report_complexity: bool,

    /// Ranks candidate directives when several could govern a field.
    #[serde(skip, default = "default_compare_key")]
    pub cost_compare_key: CostCompareKey,
}

fn default_compare_key() -> CostCompareKey {
    default_cost_compare_key
}

impl fmt::Debug for ComplexityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexityConfig")
            .field("max_complexity", &self.max_complexity)
            .field("default_cost", &self.default_cost)
            .field("report_complexity", &self.report_complexity)
            .finish_non_exhaustive()
    }
}

impl ComplexityConfig {
    /// Creates a new config with the given budget.
    #[must_use]
    pub fn new(max_complexity: i64) -> Self {
        Self {
            max_complexity,
            default_cost: 0,
            report_complexity: false,
            cost_compare_key: default_cost_compare_key,
        }
    }

    #[must_use]
    pub fn with_default_cost(mut self, default_cost: i64) -> Self {
        self.default_cost = default_cost;
        self
    }

    #[must_use]
    pub fn with_report_complexity(mut self, report: bool) -> Self {
        self.report_complexity = report;
        self
    }

    #[must_use]
    pub fn with_cost_compare_key(mut self, key: CostCompareKey) -> Self {
        self.cost_compare_key = key;
        self
    }

    /// Parses a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, a missing
    /// `maxComplexity` or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ComplexityConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::CostDirective;

    #[test]
    fn test_builder() {
        let config = ComplexityConfig::new(100)
            .with_default_cost(1)
            .with_report_complexity(true);
        assert_eq!(config.max_complexity, 100);
        assert_eq!(config.default_cost, 1);
        assert!(config.report_complexity);
        assert_eq!((config.cost_compare_key)(None), -1);
    }

    #[test]
    fn test_custom_compare_key() {
        fn flat(_: Option<&CostDirective>) -> i64 {
            0
        }
        let config = ComplexityConfig::new(1).with_cost_compare_key(flat);
        assert_eq!((config.cost_compare_key)(None), 0);
    }

    #[test]
    fn test_from_json_defaults() {
        let config = ComplexityConfig::from_json_str(r#"{"maxComplexity": 50}"#).unwrap();
        assert_eq!(config.max_complexity, 50);
        assert_eq!(config.default_cost, 0);
        assert!(!config.report_complexity);
        assert_eq!(
            (config.cost_compare_key)(Some(&CostDirective::fixed(7))),
            7
        );
    }

    #[test]
    fn test_from_json_requires_max() {
        let err = ComplexityConfig::from_json_str(r#"{"defaultCost": 1}"#).unwrap_err();
        assert!(err.to_string().contains("maxComplexity"));
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let err =
            ComplexityConfig::from_json_str(r#"{"maxComplexity": 1, "maxDepth": 3}"#).unwrap_err();
        assert!(err.to_string().contains("maxDepth"));
    }

    #[test]
    fn test_from_missing_path() {
        let err = ComplexityConfig::from_path("/nonexistent/gqlcost.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
