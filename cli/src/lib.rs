use std::fs;
use std::path::{Path, PathBuf};

use mask_select::{
    select_best, BinaryMask, Centroid, MaskError, MaskMetrics, MaskScorer, Pick, PointPredictor, PointPrompt,
    Segmenter,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegselError {
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{masks} masks but {confidences} confidences")]
    ConfidenceCount { masks: usize, confidences: usize },
}

/// One mask extracted by an automatic session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedMask {
    /// Inventory slot of the generated mask whose centroid seeded the prompt
    pub source_index: usize,
    pub source_area: u64,
    pub centroid: Centroid,
    pub refined_area: u64,
    pub output: PathBuf,
}

/// Summary written next to the extracted masks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReport {
    pub image: PathBuf,
    pub image_width: u32,
    pub image_height: u32,
    pub detected: usize,
    pub kept: usize,
    pub degenerate: usize,
    pub masks: Vec<ExtractedMask>,
}

impl SessionReport {
    pub fn to_json(&self) -> Result<String, SegselError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SegselError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SegselError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Walk the session's masks largest first, refining each centroid as a single
/// positive click, and save every refined mask as a PNG in `output_dir`.
pub fn run_session<P: PointPredictor>(
    session: &mut Segmenter<P>,
    output_dir: &Path,
    limit: Option<usize>,
) -> Result<SessionReport, SegselError> {
    fs::create_dir_all(output_dir)?;

    let mut masks = Vec::new();
    let mut degenerate = 0;
    while limit.is_none_or(|limit| masks.len() < limit) {
        let point = match session.pick() {
            Pick::Point(point) => point,
            Pick::Degenerate(id) => {
                tracing::warn!(mask = %id, "skipping mask without pixels");
                degenerate += 1;
                continue;
            }
            Pick::Exhausted => break,
        };

        let refined = session.propagate_points(&PointPrompt::positive_at(point.centroid))?;
        let output = output_dir.join(format!("mask_{:03}.png", masks.len()));
        refined.to_gray().save(&output)?;
        tracing::info!(
            source = %point.id,
            refined_area = refined.area(),
            output = %output.display(),
            "saved refined mask"
        );

        masks.push(ExtractedMask {
            source_index: point.id.index(),
            source_area: point.area,
            centroid: point.centroid,
            refined_area: refined.area(),
            output,
        });
    }

    let image = session.image();
    Ok(SessionReport {
        image: image.path.clone(),
        image_width: image.width,
        image_height: image.height,
        detected: session.inventory().detected(),
        kept: session.inventory().len(),
        degenerate,
        masks,
    })
}

/// Metrics and composite score of one mask file
#[derive(Debug, Clone, Serialize)]
pub struct ScoredFile {
    pub path: PathBuf,
    pub confidence: f32,
    pub area: u64,
    pub metrics: MaskMetrics,
    pub score: f64,
}

/// Offline scoring of mask images that share one image size
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub candidates: Vec<ScoredFile>,
    pub best: Option<usize>,
}

pub fn score_files(paths: &[PathBuf], confidences: &[f32], scorer: &MaskScorer) -> Result<ScoreReport, SegselError> {
    if paths.len() != confidences.len() {
        return Err(SegselError::ConfidenceCount {
            masks: paths.len(),
            confidences: confidences.len(),
        });
    }

    let masks = paths
        .iter()
        .map(|path| -> Result<BinaryMask, SegselError> {
            Ok(BinaryMask::from_gray(&image::open(path)?.to_luma8()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = masks.first() else {
        return Ok(ScoreReport { candidates: Vec::new(), best: None });
    };
    let (height, width) = (first.height(), first.width());
    if let Some(mask) = masks.iter().find(|mask| mask.height() != height || mask.width() != width) {
        return Err(MaskError::DimensionMismatch {
            expected_width: width,
            expected_height: height,
            actual_width: mask.width(),
            actual_height: mask.height(),
        }
        .into());
    }

    let candidates = masks
        .iter()
        .zip(paths.iter().zip(confidences))
        .map(|(mask, (path, &confidence))| {
            let metrics = scorer.metrics(mask, height, width);
            ScoredFile {
                path: path.clone(),
                confidence,
                area: mask.area(),
                metrics,
                score: scorer.weights().combine(confidence as f64, &metrics),
            }
        })
        .collect();

    Ok(ScoreReport {
        candidates,
        best: select_best(&masks, confidences, scorer, height, width),
    })
}
