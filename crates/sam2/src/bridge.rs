use mask_select::{
    GeneratedMask, ImageInput, MaskGenerator, MaskLogits, PointPredictor, PointPrompt, Prediction,
};
use tokio::runtime::{Builder, Runtime};

use crate::{
    error::Sam2Error,
    process::Sam2Process,
    wire::{GenerateResponse, PredictResponse, Sam2Request},
};

/// Blocking adapter exposing [`Sam2Process`] through the mask generator and
/// point predictor traits.
///
/// Holds no model state: every `generate` and `predict` launches the runner
/// script anew, so one refinement costs two script launches.
pub struct Sam2Bridge {
    process: Sam2Process,
    runtime: Runtime,
    image: Option<ImageInput>,
}

impl Sam2Bridge {
    pub fn new(process: Sam2Process) -> Result<Self, Sam2Error> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            process,
            runtime,
            image: None,
        })
    }

    pub fn process(&self) -> &Sam2Process {
        &self.process
    }

    fn predict_inner(&self, prompt: &PointPrompt, mask_input: Option<&MaskLogits>) -> Result<Prediction, Sam2Error> {
        let image = self.image.as_ref().ok_or(Sam2Error::NoImage)?;
        let request = Sam2Request::Predict {
            image_path: &image.path,
            point_coords: &prompt.points,
            point_labels: &prompt.labels,
            mask_input,
            multimask_output: true,
        };

        let response: PredictResponse = self.runtime.block_on(self.process.run(&request))?;
        let prediction = response.into_prediction()?;

        if let Some(mask) = prediction
            .masks
            .iter()
            .find(|mask| mask.width() != image.width || mask.height() != image.height)
        {
            return Err(Sam2Error::Decode(format!(
                "predicted mask is {}x{}, image is {}x{}",
                mask.width(), mask.height(), image.width, image.height
            )));
        }
        Ok(prediction)
    }
}

impl MaskGenerator for Sam2Bridge {
    fn generate(&mut self, image: &ImageInput) -> mask_select::Result<Vec<GeneratedMask>> {
        let request = Sam2Request::Generate { image_path: &image.path };
        let response: GenerateResponse = self.runtime.block_on(self.process.run(&request))?;
        Ok(response.into_masks()?)
    }
}

impl PointPredictor for Sam2Bridge {
    fn set_image(&mut self, image: &ImageInput) -> mask_select::Result<()> {
        self.image = Some(image.clone());
        Ok(())
    }

    fn predict(&mut self, prompt: &PointPrompt, mask_input: Option<&MaskLogits>) -> mask_select::Result<Prediction> {
        let prediction = self.predict_inner(prompt, mask_input)?;
        tracing::debug!(candidates = prediction.len(), prior = mask_input.is_some(), "sam2 prediction");
        Ok(prediction)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use mask_select::{MaskError, MaskScorer, PointLabel, RefinementOrchestrator};
    use std::io::Write;

    fn shell_script(body: &str) -> tempfile::NamedTempFile {
        let mut script = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        writeln!(script, "{body}").unwrap();
        script.flush().unwrap();
        script
    }

    fn bridge(script: &tempfile::NamedTempFile) -> Sam2Bridge {
        Sam2Bridge::new(Sam2Process::new(script.path(), None).with_interpreter("sh")).unwrap()
    }

    fn prompt() -> PointPrompt {
        PointPrompt::new(vec![[0.0, 0.0]], vec![PointLabel::Positive]).unwrap()
    }

    #[test]
    fn test_generate_through_script() {
        // "AQAAAQ==" is base64 for [1, 0, 0, 1].
        let script = shell_script(
            r#"echo '{"masks": [{"segmentation": {"height": 2, "width": 2, "data": "AQAAAQ=="}, "area": 2}]}'"#,
        );
        let mut bridge = bridge(&script);
        let masks = bridge.generate(&ImageInput::new("img.png", 2, 2)).unwrap();
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].area, 2);
        assert!(masks[0].segmentation.get(1, 1));
    }

    #[test]
    fn test_script_receives_request_file() {
        // Echo the request back as the script's error message.
        let script = shell_script(r#"printf '{"error": "%s"}' "$(tr -d '"' < "$2")""#);
        let mut bridge = bridge(&script);
        bridge.set_image(&ImageInput::new("img.png", 2, 2)).unwrap();

        let err = bridge.predict(&prompt(), None).unwrap_err().to_string();
        assert!(err.contains("command:predict"), "{err}");
        assert!(err.contains("multimask_output:true"), "{err}");
    }

    #[test]
    fn test_predict_requires_image() {
        let script = shell_script("exit 0");
        let mut bridge = bridge(&script);
        assert!(matches!(bridge.predict(&prompt(), None), Err(MaskError::PredictionFailure(_))));
    }

    #[test]
    fn test_failing_script_is_prediction_failure() {
        let script = shell_script("echo boom >&2; exit 3");
        let mut bridge = bridge(&script);
        bridge.set_image(&ImageInput::new("img.png", 2, 2)).unwrap();

        let err = bridge.predict(&prompt(), None).unwrap_err();
        assert!(matches!(&err, MaskError::PredictionFailure(msg) if msg.contains("boom")));
    }

    #[test]
    fn test_rejects_masks_of_wrong_size() {
        let script = shell_script(
            r#"echo '{"masks": [{"height": 1, "width": 1, "data": "AQ=="}], "scores": [0.5], "logits": [{"height": 1, "width": 1, "data": [0.0]}]}'"#,
        );
        let mut bridge = bridge(&script);
        bridge.set_image(&ImageInput::new("img.png", 2, 2)).unwrap();
        assert!(bridge.predict(&prompt(), None).is_err());
    }

    #[test]
    fn test_refinement_launches_script_per_round() {
        let dir = tempfile::tempdir().unwrap();
        let launches = dir.path().join("launches");
        let script = shell_script(&format!(
            r#"echo run >> '{}'
echo '{{"masks": [{{"height": 2, "width": 2, "data": "AQAAAQ=="}}], "scores": [0.5], "logits": [{{"height": 1, "width": 1, "data": [0.0]}}]}}'"#,
            launches.display()
        ));
        let mut bridge = bridge(&script);
        bridge.set_image(&ImageInput::new("img.png", 2, 2)).unwrap();

        let mut orchestrator = RefinementOrchestrator::new(bridge, MaskScorer::default(), 2, 2);
        let mask = orchestrator.refine(&prompt()).unwrap();
        assert_eq!(mask.area(), 2);
        assert_eq!(std::fs::read_to_string(&launches).unwrap().lines().count(), 2);
    }
}
