use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{perimeter::PerimeterMethod, scoring::{MaskScorer, ScoreWeights}},
    error::{MaskError, Result},
    inventory::DEFAULT_COVERAGE_THRESHOLD,
};

/// Tunable parameters of a segmentation session
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Weights of the composite mask score
    pub weights: ScoreWeights,
    /// Generated masks covering at least this fraction of the image are dropped
    #[schemars(range(min = 0.0, max = 1.0))]
    pub coverage_threshold: f64,
    /// Boundary length estimator used for compactness
    pub perimeter: PerimeterMethod,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            perimeter: PerimeterMethod::default(),
        }
    }
}

impl SegmenterConfig {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SegmenterConfig)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.coverage_threshold > 0.0 && self.coverage_threshold <= 1.0) {
            return Err(MaskError::InvalidConfig(format!(
                "coverage_threshold must be in (0, 1], got {}",
                self.coverage_threshold
            )));
        }
        Ok(())
    }

    pub fn scorer(&self) -> MaskScorer {
        MaskScorer::from_boxed(self.weights, self.perimeter.estimator())
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SegmenterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: SegmenterConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Pick the format from the file extension and load
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(MaskError::InvalidConfig(format!(
                "unsupported config format for {}, use .toml or .json",
                path.display()
            ))),
        }
    }
}
