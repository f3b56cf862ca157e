//! Tuning knobs for batch resolution.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid resolution config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("parallel_threshold must be at least 1")]
    ZeroThreshold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Resolve independent requirements on the rayon pool.
    pub parallel: bool,
    /// Smallest batch worth the cost of going parallel.
    pub parallel_threshold: usize,
    /// Collapse structurally equal results for one requirement.
    pub deduplicate: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self { parallel: true, parallel_threshold: 64, deduplicate: true }
    }
}

impl ResolutionConfig {
    /// Reads a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{}", ResolutionConfig::default())]
    #[case(r#"{"parallel": false}"#, ResolutionConfig { parallel: false, ..Default::default() })]
    #[case(
        r#"{"parallel_threshold": 8, "deduplicate": false}"#,
        ResolutionConfig { parallel: true, parallel_threshold: 8, deduplicate: false }
    )]
    fn test_from_json(#[case] json: &str, #[case] expected: ResolutionConfig) {
        assert_eq!(ResolutionConfig::from_json(json).unwrap(), expected);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            ResolutionConfig::from_json(r#"{"parallel_threshold": 0}"#),
            Err(ConfigError::ZeroThreshold)
        ));
        assert!(matches!(ResolutionConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }
}
