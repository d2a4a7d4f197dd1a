//! # Mask Selection Library
//!
//! Ranks, selects and tracks candidate region masks produced by an external
//! segmentation model, and drives point-prompted refinement over them.
//!
//! ## Core Features
//!
//! - **Composite scoring**: model confidence, log-smoothed compactness and a
//!   size penalty combined with tunable weights
//! - **Deterministic selection**: single pass, ties keep the earliest candidate
//! - **Mask inventory**: coverage-filtered generated masks with a grow-only
//!   record of the masks a session has consumed
//! - **Two-round refinement**: the coarse winner's logits seed a second prediction
//!
//! ## Quick Start
//!
//! ```rust
//! use mask_select::{select_best, BinaryMask, MaskScorer};
//!
//! let small = BinaryMask::from_fn(64, 64, |row, col| row < 4 && col < 4);
//! let large = BinaryMask::from_fn(64, 64, |row, col| row < 60 && col < 60);
//!
//! let scorer = MaskScorer::default();
//! let best = select_best(&[small, large], &[0.8, 0.8], &scorer, 64, 64);
//! assert_eq!(best, Some(0));
//! ```
//!
//! ## Sessions
//!
//! ```rust,no_run
//! use mask_select::{ImageInput, MaskGenerator, PointPredictor, PointPrompt, Segmenter, SegmenterConfig};
//!
//! fn run<G: MaskGenerator, P: PointPredictor>(generator: &mut G, predictor: P) -> mask_select::Result<()> {
//!     let image = ImageInput::open("photo.jpg")?;
//!     let mut session = Segmenter::new(image, generator, predictor, &SegmenterConfig::default())?;
//!
//!     while let Some(point) = session.best_point() {
//!         let mask = session.propagate_points(&PointPrompt::positive_at(point.centroid))?;
//!         println!("{} -> {} pixels", point.id, mask.area());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod inventory;
pub mod refine;
pub mod config;
pub mod session;

pub use error::{MaskError, Result};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use inventory::{centroid, MaskId, MaskInventory, Pick, SelectedPoint, SelectionState, DEFAULT_COVERAGE_THRESHOLD};
pub use refine::{RefinementOrchestrator, RefinementStage};
pub use config::SegmenterConfig;
pub use session::Segmenter;
