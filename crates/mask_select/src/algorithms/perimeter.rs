use geo::EuclideanLength;
use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use crate::{traits::PerimeterEstimator, types::BinaryMask};

/// Weight of each 3x3 neighbourhood code produced by convolving the border
/// image with `[[10, 2, 10], [2, 1, 2], [10, 2, 10]]`.
fn code_weight(code: u8) -> f64 {
    match code {
        5 | 7 | 15 | 17 | 25 | 27 => 1.0,
        21 | 33 => std::f64::consts::SQRT_2,
        13 | 23 => (1.0 + std::f64::consts::SQRT_2) / 2.0,
        _ => 0.0,
    }
}

/// Neighbourhood-weighted boundary estimator over 4-connected border pixels.
///
/// Border pixels are covered pixels with at least one uncovered (or
/// out-of-image) 4-neighbour. Each pixel's 3x3 neighbourhood of border pixels
/// is encoded and weighted so straight runs count 1, diagonal runs count
/// sqrt(2) and corners count in between. An isolated pixel measures 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedPerimeter;

impl WeightedPerimeter {
    fn border(mask: &BinaryMask) -> Vec<bool> {
        let (width, height) = (mask.width() as i64, mask.height() as i64);
        let covered = |row: i64, col: i64| {
            row >= 0 && col >= 0 && row < height && col < width && mask.get(row as u32, col as u32)
        };

        let mut border = vec![false; (width * height) as usize];
        for row in 0..height {
            for col in 0..width {
                if !covered(row, col) {
                    continue;
                }
                let interior = covered(row - 1, col)
                    && covered(row + 1, col)
                    && covered(row, col - 1)
                    && covered(row, col + 1);
                border[(row * width + col) as usize] = !interior;
            }
        }
        border
    }
}

impl PerimeterEstimator for WeightedPerimeter {
    fn perimeter(&self, mask: &BinaryMask) -> f64 {
        const KERNEL: [[u8; 3]; 3] = [[10, 2, 10], [2, 1, 2], [10, 2, 10]];

        let (width, height) = (mask.width() as i64, mask.height() as i64);
        let border = Self::border(mask);
        let is_border = |row: i64, col: i64| {
            row >= 0 && col >= 0 && row < height && col < width && border[(row * width + col) as usize]
        };

        let mut total = 0.0;
        for row in 0..height {
            for col in 0..width {
                let mut code = 0u8;
                for (dr, kernel_row) in KERNEL.iter().enumerate() {
                    for (dc, weight) in kernel_row.iter().enumerate() {
                        if is_border(row + dr as i64 - 1, col + dc as i64 - 1) {
                            code += weight;
                        }
                    }
                }
                total += code_weight(code);
            }
        }
        total
    }
}

/// Traces region borders (outer and hole) and sums their closed polyline lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourPerimeter;

impl PerimeterEstimator for ContourPerimeter {
    fn perimeter(&self, mask: &BinaryMask) -> f64 {
        let contours = imageproc::contours::find_contours::<i32>(&mask.to_gray());

        contours
            .into_iter()
            .filter(|contour| contour.points.len() > 1)
            .map(|contour| {
                let mut coords: Vec<Coord<f64>> = contour
                    .points
                    .iter()
                    .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
                    .collect();
                coords.push(coords[0]);
                LineString::new(coords).euclidean_length()
            })
            .sum()
    }
}

/// Named perimeter estimators selectable from configuration
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PerimeterMethod {
    /// Neighbourhood-weighted border pixel count
    #[default]
    Weighted,
    /// Length of traced border polylines
    Contour,
}

impl PerimeterMethod {
    pub fn estimator(self) -> Box<dyn PerimeterEstimator> {
        match self {
            Self::Weighted => Box::new(WeightedPerimeter),
            Self::Contour => Box::new(ContourPerimeter),
        }
    }
}
