use mask_select::MaskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Sam2Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Runner script failed ({status}): {stderr}")]
    ScriptFailed { status: String, stderr: String },

    #[error("Runner script reported an error: {0}")]
    Remote(String),

    #[error("Invalid mask encoding: {0}")]
    Decode(String),

    #[error("No image set on predictor")]
    NoImage,
}

impl From<Sam2Error> for MaskError {
    fn from(err: Sam2Error) -> Self {
        MaskError::PredictionFailure(err.to_string())
    }
}
