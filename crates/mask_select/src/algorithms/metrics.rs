use std::f64::consts::PI;

use serde::Serialize;

use crate::{traits::PerimeterEstimator, types::BinaryMask};

/// Below this fraction of the image a mask gets the small-mask correction
pub const SMALL_MASK_FRACTION: f64 = 0.001;
/// Above this fraction of the image a mask gets the large-mask correction
pub const LARGE_MASK_FRACTION: f64 = 0.5;
/// Offset of the large-mask correction term
pub const LARGE_MASK_OFFSET: f64 = 0.4;

/// Shape and size metrics of one mask. Computed on demand, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaskMetrics {
    /// 1 for a disk, towards 0 for irregular or scattered regions
    pub compactness: f64,
    pub size_penalty: f64,
}

impl MaskMetrics {
    pub fn compute<P>(mask: &BinaryMask, perimeter: &P, image_height: u32, image_width: u32) -> Self
    where
        P: PerimeterEstimator + ?Sized,
    {
        let area = mask.area();
        let compactness = if area == 0 {
            0.0
        } else {
            compactness_from(area, perimeter.perimeter(mask))
        };

        Self {
            compactness,
            size_penalty: size_penalty(area, image_height, image_width),
        }
    }
}

/// Ratio of a same-area disk's perimeter to the measured perimeter, capped at 1.
pub fn compactness<P>(mask: &BinaryMask, perimeter: &P) -> f64
where
    P: PerimeterEstimator + ?Sized,
{
    let area = mask.area();
    if area == 0 {
        return 0.0;
    }
    compactness_from(area, perimeter.perimeter(mask))
}

/// Compactness from an already measured area and perimeter
pub fn compactness_from(area: u64, perimeter: f64) -> f64 {
    if area == 0 || perimeter <= 0.0 || !perimeter.is_finite() {
        return 0.0;
    }
    let ideal_perimeter = 2.0 * (PI * area as f64).sqrt();
    (ideal_perimeter / perimeter).min(1.0)
}

/// Size penalty of a mask covering `area` pixels of an image.
pub fn size_penalty(area: u64, image_height: u32, image_width: u32) -> f64 {
    let total = image_height as f64 * image_width as f64;
    if total == 0.0 {
        return 0.0;
    }
    normalized_size_penalty(area as f64 / total)
}

/// Size penalty of an area already normalized by the image area.
///
/// The base penalty is the normalized area itself. Tiny masks add a quartic
/// term that is negligible until the mask is extremely small; masks covering
/// more than half the image add `(a - 0.4)^4`.
pub fn normalized_size_penalty(normalized_area: f64) -> f64 {
    let small = if normalized_area < SMALL_MASK_FRACTION {
        normalized_area.powi(4)
    } else {
        0.0
    };
    let large = if normalized_area > LARGE_MASK_FRACTION {
        (normalized_area - LARGE_MASK_OFFSET).powi(4)
    } else {
        0.0
    };
    normalized_area + small + large
}
