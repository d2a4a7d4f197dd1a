use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{metrics::MaskMetrics, perimeter::WeightedPerimeter},
    error::{MaskError, Result},
    traits::PerimeterEstimator,
    types::BinaryMask,
};

/// Weights of the composite mask quality score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the model confidence
    pub confidence: f64,
    /// Weight of the log-smoothed compactness
    pub compactness: f64,
    /// Weight of the size penalty (subtracted)
    pub size: f64,
}

impl ScoreWeights {
    pub const fn new(confidence: f64, compactness: f64, size: f64) -> Self {
        Self { confidence, compactness, size }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("confidence", self.confidence),
            ("compactness", self.compactness),
            ("size", self.size),
        ] {
            if !value.is_finite() {
                return Err(MaskError::InvalidConfig(format!("weight `{name}` must be finite, got {value}")));
            }
        }
        Ok(())
    }

    /// `w_score * confidence + w_compact * ln(1 + compactness) - w_size * size_penalty`
    pub fn combine(&self, confidence: f64, metrics: &MaskMetrics) -> f64 {
        self.confidence * confidence + self.compactness * metrics.compactness.ln_1p()
            - self.size * metrics.size_penalty
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new(1.0, 0.8, 1.4)
    }
}

/// Scores candidate masks against the image they were predicted for.
pub struct MaskScorer {
    weights: ScoreWeights,
    perimeter: Box<dyn PerimeterEstimator>,
}

impl MaskScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self::with_perimeter(weights, WeightedPerimeter)
    }

    pub fn with_perimeter<P>(weights: ScoreWeights, perimeter: P) -> Self
    where
        P: PerimeterEstimator + 'static,
    {
        Self {
            weights,
            perimeter: Box::new(perimeter),
        }
    }

    pub fn from_boxed(weights: ScoreWeights, perimeter: Box<dyn PerimeterEstimator>) -> Self {
        Self { weights, perimeter }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn metrics(&self, mask: &BinaryMask, image_height: u32, image_width: u32) -> MaskMetrics {
        MaskMetrics::compute(mask, self.perimeter.as_ref(), image_height, image_width)
    }

    /// Composite quality of `mask` given the model's `confidence` in it
    pub fn score(&self, mask: &BinaryMask, confidence: f64, image_height: u32, image_width: u32) -> f64 {
        let metrics = self.metrics(mask, image_height, image_width);
        self.weights.combine(confidence, &metrics)
    }
}

impl Default for MaskScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

impl std::fmt::Debug for MaskScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskScorer").field("weights", &self.weights).finish_non_exhaustive()
    }
}
