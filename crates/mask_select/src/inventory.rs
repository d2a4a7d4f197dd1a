use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    error::{MaskError, Result},
    types::{BinaryMask, Centroid, GeneratedMask},
};

/// Masks covering at least this fraction of the image are discarded
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.95;

/// Stable handle of a mask: its position in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MaskId(usize);

impl MaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for MaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Masks a session has already consumed. Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: BTreeSet<MaskId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: MaskId) -> bool {
        self.selected.contains(&id)
    }

    /// Returns `false` if `id` was already consumed
    pub fn mark(&mut self, id: MaskId) -> bool {
        self.selected.insert(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MaskId> + '_ {
        self.selected.iter().copied()
    }
}

/// A consumed mask and the point representing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedPoint {
    pub id: MaskId,
    pub centroid: Centroid,
    pub area: u64,
}

/// Outcome of a largest-unselected query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Point(SelectedPoint),
    /// Every offerable mask has been consumed
    Exhausted,
    /// The largest remaining mask had no covered pixels; it is now consumed
    Degenerate(MaskId),
}

impl Pick {
    pub fn into_point(self) -> Option<SelectedPoint> {
        match self {
            Self::Point(point) => Some(point),
            Self::Exhausted | Self::Degenerate(_) => None,
        }
    }
}

/// Mean (row, col) of the covered pixels, truncated to integers.
pub fn centroid(mask: &BinaryMask) -> Option<Centroid> {
    let mut count = 0u64;
    let (mut row_sum, mut col_sum) = (0u64, 0u64);
    for (row, col) in mask.covered_pixels() {
        count += 1;
        row_sum += row as u64;
        col_sum += col as u64;
    }

    if count == 0 {
        return None;
    }

    Some(Centroid {
        row: (row_sum as f64 / count as f64) as u32,
        col: (col_sum as f64 / count as f64) as u32,
    })
}

/// The automatically generated masks of one image, filtered once at build time.
#[derive(Debug, Clone)]
pub struct MaskInventory {
    masks: Vec<GeneratedMask>,
    image_height: u32,
    image_width: u32,
    detected: usize,
}

impl MaskInventory {
    /// Keep the masks covering less than `coverage_threshold` of the image.
    pub fn build(
        raw_masks: Vec<GeneratedMask>,
        image_height: u32,
        image_width: u32,
        coverage_threshold: f64,
    ) -> Result<Self> {
        if image_height == 0 || image_width == 0 {
            return Err(MaskError::InvalidConfig(format!(
                "image dimensions must be non-zero, got {image_width}x{image_height}"
            )));
        }
        if !(coverage_threshold > 0.0 && coverage_threshold <= 1.0) {
            return Err(MaskError::InvalidConfig(format!(
                "coverage threshold must be in (0, 1], got {coverage_threshold}"
            )));
        }

        for generated in &raw_masks {
            let mask = &generated.segmentation;
            if mask.width() != image_width || mask.height() != image_height {
                return Err(MaskError::DimensionMismatch {
                    expected_width: image_width,
                    expected_height: image_height,
                    actual_width: mask.width(),
                    actual_height: mask.height(),
                });
            }
        }

        let detected = raw_masks.len();
        let image_area = image_height as f64 * image_width as f64;
        let masks: Vec<GeneratedMask> = raw_masks
            .into_iter()
            .filter(|generated| (generated.area as f64 / image_area) < coverage_threshold)
            .collect();

        tracing::info!(detected, kept = masks.len(), "filtered generated masks by coverage");

        Ok(Self {
            masks,
            image_height,
            image_width,
            detected,
        })
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    /// Number of masks the generator produced before filtering
    pub fn detected(&self) -> usize {
        self.detected
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn get(&self, id: MaskId) -> Option<&GeneratedMask> {
        self.masks.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaskId, &GeneratedMask)> {
        self.masks.iter().enumerate().map(|(i, mask)| (MaskId(i), mask))
    }

    /// Masks that can still be offered: unconsumed, with a positive area
    pub fn remaining(&self, selection: &SelectionState) -> usize {
        self.iter()
            .filter(|(id, mask)| mask.area > 0 && !selection.contains(*id))
            .count()
    }

    /// Largest unconsumed mask by reported area; ties go to the earliest slot.
    /// The chosen mask is consumed whether or not it has a centroid.
    pub fn pick_largest(&self, selection: &mut SelectionState) -> Pick {
        let mut largest: Option<(MaskId, &GeneratedMask)> = None;
        for (id, mask) in self.iter() {
            if selection.contains(id) {
                continue;
            }
            let best_area = largest.map_or(0, |(_, best)| best.area);
            if mask.area > best_area {
                largest = Some((id, mask));
            }
        }

        let Some((id, mask)) = largest else {
            tracing::info!("no unselected masks available");
            return Pick::Exhausted;
        };

        selection.mark(id);

        match centroid(&mask.segmentation) {
            Some(centroid) => {
                tracing::info!(
                    mask = %id,
                    area = mask.area,
                    row = centroid.row,
                    col = centroid.col,
                    "selected centroid of largest mask"
                );
                Pick::Point(SelectedPoint {
                    id,
                    centroid,
                    area: mask.area,
                })
            }
            None => {
                tracing::warn!(mask = %id, area = mask.area, "largest mask has no covered pixels");
                Pick::Degenerate(id)
            }
        }
    }

    /// Centroid of the largest unconsumed mask, or `None` when nothing usable is left.
    pub fn largest_unselected(&self, selection: &mut SelectionState) -> Option<SelectedPoint> {
        self.pick_largest(selection).into_point()
    }
}
