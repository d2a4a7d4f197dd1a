//! Bridge to an external SAM2 runner script.
//!
//! The script is invoked as `python <script> --input <request.json>` (or via
//! `uv run`) and answers on stdout:
//!
//! - `{"command": "generate", "image_path": ...}` →
//!   `{"masks": [{"segmentation": <mask>, "area": n}, ...]}`
//! - `{"command": "predict", "image_path": ..., "point_coords": [[x, y], ...],
//!   "point_labels": [1, 0, ...], "mask_input": <logits>|null, "multimask_output": true}` →
//!   `{"masks": [<mask>, ...], "scores": [...], "logits": [<logits>, ...]}`
//!
//! `<mask>` is `{"height", "width", "data": base64 of one 0/1 byte per pixel}`
//! and `<logits>` is `{"height", "width", "data": [f32, ...]}`. Any reply of
//! the form `{"error": "..."}` is reported as a prediction failure.
//!
//! Each request launches its own script process and nothing persists between
//! calls. The runner therefore loads the SAM2 checkpoint once per request: a
//! refinement costs two loads and a full session costs one per generate call
//! plus two per extracted mask. The image is likewise re-read from
//! `image_path` on every predict.

pub mod bridge;
pub mod error;
pub mod process;
pub mod wire;

pub use bridge::Sam2Bridge;
pub use error::Sam2Error;
pub use process::Sam2Process;
