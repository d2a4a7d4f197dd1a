use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};

/// Binary region mask stored row-major, `true` where the region is covered.
///
/// `data.len() == width * height` holds for every value, including
/// deserialized ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBinaryMask")]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

#[derive(Deserialize)]
struct RawBinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl TryFrom<RawBinaryMask> for BinaryMask {
    type Error = MaskError;

    fn try_from(raw: RawBinaryMask) -> Result<Self> {
        Self::new(raw.width, raw.height, raw.data)
    }
}

impl BinaryMask {
    /// Wrap row-major pixel data; `data.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(MaskError::InvalidConfig(format!(
                "mask data has {} pixels, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, data })
    }

    /// An all-false mask
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(row, col)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self { width, height, data }
    }

    /// Any non-zero pixel is treated as covered
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| p[0] > 0).collect(),
        }
    }

    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(y, x) { Luma([255u8]) } else { Luma([0u8]) }
        })
    }

    /// Pixel value at (row, col); out-of-bounds reads are `false`.
    pub fn get(&self, row: u32, col: u32) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        self.data[row as usize * self.width as usize + col as usize]
    }

    pub fn set(&mut self, row: u32, col: u32, value: bool) {
        if row < self.height && col < self.width {
            self.data[row as usize * self.width as usize + col as usize] = value;
        }
    }

    /// Number of covered pixels
    pub fn area(&self) -> u64 {
        self.data.iter().filter(|&&covered| covered).count() as u64
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// (row, col) coordinates of every covered pixel in storage order
    pub fn covered_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, covered)| **covered)
            .map(move |(i, _)| ((i / width) as u32, (i % width) as u32))
    }
}

/// One entry of the automatic generator's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMask {
    pub segmentation: BinaryMask,
    /// Pixel count reported by the generator
    pub area: u64,
}

impl GeneratedMask {
    /// Use the mask's own pixel count as its area
    pub fn from_segmentation(segmentation: BinaryMask) -> Self {
        let area = segmentation.area();
        Self { segmentation, area }
    }
}

/// Raw low-resolution mask representation fed back to the predictor as a prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskLogits {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// One multimask prediction: parallel masks, confidences and logits.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub masks: Vec<BinaryMask>,
    pub scores: Vec<f32>,
    pub logits: Vec<MaskLogits>,
}

impl Prediction {
    /// Reject empty or ragged candidate sets
    pub fn validate(&self) -> Result<()> {
        if self.masks.is_empty() {
            return Err(MaskError::PredictionFailure(
                "predictor returned no candidate masks".to_string(),
            ));
        }
        if self.masks.len() != self.scores.len() || self.masks.len() != self.logits.len() {
            return Err(MaskError::PredictionFailure(format!(
                "inconsistent candidate arrays: {} masks, {} scores, {} logits",
                self.masks.len(),
                self.scores.len(),
                self.logits.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PointLabel {
    Negative = 0,
    Positive = 1,
}

impl From<PointLabel> for u8 {
    fn from(label: PointLabel) -> Self {
        label as u8
    }
}

impl TryFrom<u8> for PointLabel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Negative),
            1 => Ok(Self::Positive),
            other => Err(format!("point label must be 0 or 1, got {other}")),
        }
    }
}

/// Point prompts for the predictor. Coordinates are (x, y) in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPrompt {
    pub points: Vec<[f32; 2]>,
    pub labels: Vec<PointLabel>,
}

impl PointPrompt {
    pub fn new(points: Vec<[f32; 2]>, labels: Vec<PointLabel>) -> Result<Self> {
        let prompt = Self { points, labels };
        prompt.validate()?;
        Ok(prompt)
    }

    /// At least one point, and exactly one label per point
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(MaskError::InvalidPrompt("at least one point is required".to_string()));
        }
        if self.points.len() != self.labels.len() {
            return Err(MaskError::InvalidPrompt(format!(
                "{} points but {} labels",
                self.points.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Single positive click at a (row, col) centroid
    pub fn positive_at(centroid: Centroid) -> Self {
        Self {
            points: vec![[centroid.col as f32, centroid.row as f32]],
            labels: vec![PointLabel::Positive],
        }
    }
}

/// Integer (row, col) location inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Centroid {
    pub row: u32,
    pub col: u32,
}

/// Source image handed to the segmentation collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageInput {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    /// Read only the image header to learn its dimensions
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (width, height) = image::image_dimensions(path.as_ref())?;
        Ok(Self::new(path.as_ref(), width, height))
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
