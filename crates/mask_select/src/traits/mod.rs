use crate::{
    error::Result,
    types::{BinaryMask, GeneratedMask, ImageInput, MaskLogits, PointPrompt, Prediction},
};

/// Trait for boundary-length estimators of a binary region
pub trait PerimeterEstimator: Send + Sync {
    /// Boundary length of the covered region, in pixels
    fn perimeter(&self, mask: &BinaryMask) -> f64;
}

/// Trait for automatic whole-image mask generators
pub trait MaskGenerator {
    /// Produce every candidate region the model finds in `image`
    fn generate(&mut self, image: &ImageInput) -> Result<Vec<GeneratedMask>>;
}

/// Trait for point-prompted mask predictors
pub trait PointPredictor {
    /// Bind the predictor to the image subsequent predictions refer to
    fn set_image(&mut self, image: &ImageInput) -> Result<()>;

    /// Predict several candidate masks for `prompt`, optionally seeded with a
    /// prior from an earlier prediction.
    fn predict(&mut self, prompt: &PointPrompt, mask_input: Option<&MaskLogits>) -> Result<Prediction>;
}

impl<T: PerimeterEstimator + ?Sized> PerimeterEstimator for Box<T> {
    fn perimeter(&self, mask: &BinaryMask) -> f64 {
        (**self).perimeter(mask)
    }
}

impl<T: MaskGenerator + ?Sized> MaskGenerator for Box<T> {
    fn generate(&mut self, image: &ImageInput) -> Result<Vec<GeneratedMask>> {
        (**self).generate(image)
    }
}

impl<T: PointPredictor + ?Sized> PointPredictor for Box<T> {
    fn set_image(&mut self, image: &ImageInput) -> Result<()> {
        (**self).set_image(image)
    }

    fn predict(&mut self, prompt: &PointPrompt, mask_input: Option<&MaskLogits>) -> Result<Prediction> {
        (**self).predict(prompt, mask_input)
    }
}
