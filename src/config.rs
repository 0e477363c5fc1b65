//! Pipeline configuration and validation.
//!
//! Configuration is the only place where the pipeline fails hard: an
//! invalid chunk geometry or threshold is rejected up front with a
//! `ConfigError` before any work starts. Everything downstream of a
//! valid configuration degrades instead of failing (see the adapter and
//! orchestrator modules).

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs for an anonymization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target chunk length in characters (default: 500)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters (default: 100).
    /// Must be strictly smaller than `chunk_size`.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum score a detected span needs to survive merging
    /// (default: 0.5)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Per-(chunk, detector) call timeout in seconds (default: 120)
    #[serde(default = "default_detector_timeout")]
    pub detector_timeout_seconds: u64,
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    100
}
fn default_confidence_threshold() -> f64 {
    0.5
}
fn default_detector_timeout() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            confidence_threshold: default_confidence_threshold(),
            detector_timeout_seconds: default_detector_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration invariants.
    ///
    /// An overlap at or above the chunk size would stall the chunker or
    /// produce pathological overlap, so it is rejected here rather than
    /// guarded against at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ChunkSizeZero);
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                chunk_size: self.chunk_size,
            });
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold: self.confidence_threshold,
            });
        }

        if self.detector_timeout_seconds == 0 {
            return Err(ConfigError::TimeoutZero);
        }

        Ok(())
    }

    /// Effective timeout for a single detector call
    pub fn detector_timeout(&self) -> Duration {
        Duration::from_secs(self.detector_timeout_seconds)
    }
}

/// Fatal configuration errors. The only error class that aborts a run.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ChunkSizeZero,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },

    #[error("confidence_threshold ({threshold}) must be within [0, 1]")]
    ThresholdOutOfRange { threshold: f64 },

    #[error("detector_timeout_seconds must be greater than zero")]
    TimeoutZero,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.confidence_threshold, 0.5);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let config = PipelineConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge { .. })
        ));

        let config = PipelineConfig {
            chunk_size: 100,
            chunk_overlap: 150,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = PipelineConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ChunkSizeZero)));
    }

    #[test]
    fn test_threshold_bounds() {
        let config = PipelineConfig {
            confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));

        let config = PipelineConfig {
            confidence_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing_with_partial_fields() {
        let config = PipelineConfig::from_yaml("chunk_size: 200\nchunk_overlap: 40\n").unwrap();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.chunk_overlap, 40);
        // Unspecified fields fall back to defaults
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.detector_timeout_seconds, 120);
    }

    #[test]
    fn test_yaml_parsing_rejects_invalid_geometry() {
        let result = PipelineConfig::from_yaml("chunk_size: 50\nchunk_overlap: 60\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("textscrub.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
chunk_size: 300
chunk_overlap: 50
confidence_threshold: 0.7
"#
        )
        .unwrap();

        let config = PipelineConfig::from_file(&config_path).unwrap();
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.confidence_threshold, 0.7);
    }
}
