use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mask_select::{BinaryMask, GeneratedMask, MaskLogits, PointLabel, Prediction};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::Sam2Error;

/// Request document written to the runner script's `--input` file
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Sam2Request<'a> {
    Generate {
        image_path: &'a Path,
    },
    Predict {
        image_path: &'a Path,
        point_coords: &'a [[f32; 2]],
        point_labels: &'a [PointLabel],
        mask_input: Option<&'a MaskLogits>,
        multimask_output: bool,
    },
}

/// Parse a script reply: either the expected payload or `{"error": "..."}`.
///
/// An object carrying an `error` key is a remote failure. Anything else must
/// deserialize as `T`, so a malformed payload keeps serde's message about the
/// offending field.
pub fn parse_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Sam2Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        return Err(Sam2Error::Remote(message));
    }
    Ok(serde_json::from_value(value)?)
}

/// Binary mask as one base64-encoded 0/1 byte per pixel, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedMask {
    pub height: u32,
    pub width: u32,
    pub data: String,
}

impl EncodedMask {
    pub fn encode(mask: &BinaryMask) -> Self {
        let bytes: Vec<u8> = mask.as_slice().iter().map(|&covered| covered as u8).collect();
        Self {
            height: mask.height(),
            width: mask.width(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<BinaryMask, Sam2Error> {
        let bytes = STANDARD
            .decode(&self.data)
            .map_err(|e| Sam2Error::Decode(format!("invalid base64 mask data: {e}")))?;
        let data = bytes.into_iter().map(|byte| byte != 0).collect();
        BinaryMask::new(self.width, self.height, data).map_err(|e| Sam2Error::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneratedEntry {
    pub segmentation: EncodedMask,
    pub area: u64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub masks: Vec<GeneratedEntry>,
}

impl GenerateResponse {
    pub fn into_masks(self) -> Result<Vec<GeneratedMask>, Sam2Error> {
        self.masks
            .into_iter()
            .map(|entry| {
                Ok(GeneratedMask {
                    segmentation: entry.segmentation.decode()?,
                    area: entry.area,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub masks: Vec<EncodedMask>,
    pub scores: Vec<f32>,
    pub logits: Vec<MaskLogits>,
}

impl PredictResponse {
    pub fn into_prediction(self) -> Result<Prediction, Sam2Error> {
        let masks = self
            .masks
            .iter()
            .map(EncodedMask::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Prediction {
            masks,
            scores: self.scores,
            logits: self.logits,
        })
    }
}
