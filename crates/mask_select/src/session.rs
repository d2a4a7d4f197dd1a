use crate::{
    config::SegmenterConfig,
    error::Result,
    inventory::{MaskInventory, Pick, SelectedPoint, SelectionState},
    refine::RefinementOrchestrator,
    traits::{MaskGenerator, PointPredictor},
    types::{BinaryMask, ImageInput, PointPrompt},
};

/// Interactive segmentation session over a single image.
///
/// Masks are generated once when the session starts. The session then hands
/// out centroids of the largest masks not yet consumed and refines point
/// prompts into masks.
pub struct Segmenter<P> {
    image: ImageInput,
    inventory: MaskInventory,
    selection: SelectionState,
    orchestrator: RefinementOrchestrator<P>,
}

impl<P: PointPredictor> Segmenter<P> {
    pub fn new<G>(image: ImageInput, generator: &mut G, mut predictor: P, config: &SegmenterConfig) -> Result<Self>
    where
        G: MaskGenerator + ?Sized,
    {
        config.validate()?;

        tracing::info!(path = %image.path.display(), width = image.width, height = image.height, "generating masks");
        let raw_masks = generator.generate(&image)?;
        let inventory = MaskInventory::build(raw_masks, image.height, image.width, config.coverage_threshold)?;

        predictor.set_image(&image)?;
        let orchestrator = RefinementOrchestrator::new(predictor, config.scorer(), image.height, image.width);

        Ok(Self {
            image,
            inventory,
            selection: SelectionState::new(),
            orchestrator,
        })
    }

    pub fn image(&self) -> &ImageInput {
        &self.image
    }

    pub fn inventory(&self) -> &MaskInventory {
        &self.inventory
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Masks still available to `best_point`
    pub fn remaining(&self) -> usize {
        self.inventory.remaining(&self.selection)
    }

    /// Centroid of the largest mask not yet consumed
    pub fn best_point(&mut self) -> Option<SelectedPoint> {
        self.inventory.largest_unselected(&mut self.selection)
    }

    /// Like `best_point`, but tells an exhausted inventory apart from a degenerate mask
    pub fn pick(&mut self) -> Pick {
        self.inventory.pick_largest(&mut self.selection)
    }

    /// Refine point prompts into a single mask
    pub fn propagate_points(&mut self, prompt: &PointPrompt) -> Result<BinaryMask> {
        self.orchestrator.refine(prompt)
    }

    pub fn into_predictor(self) -> P {
        self.orchestrator.into_predictor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MaskError,
        types::{Centroid, GeneratedMask, MaskLogits, Prediction},
    };

    struct FixedGenerator(Vec<GeneratedMask>);

    impl MaskGenerator for FixedGenerator {
        fn generate(&mut self, _image: &ImageInput) -> Result<Vec<GeneratedMask>> {
            Ok(self.0.clone())
        }
    }

    /// Predicts a square around the first prompt point
    #[derive(Default)]
    struct SquarePredictor {
        image: Option<ImageInput>,
        calls: usize,
    }

    impl PointPredictor for SquarePredictor {
        fn set_image(&mut self, image: &ImageInput) -> Result<()> {
            self.image = Some(image.clone());
            Ok(())
        }

        fn predict(&mut self, prompt: &PointPrompt, _mask_input: Option<&MaskLogits>) -> Result<Prediction> {
            let image = self
                .image
                .as_ref()
                .ok_or_else(|| MaskError::PredictionFailure("image not set".to_string()))?;
            self.calls += 1;

            let [x, y] = prompt.points[0];
            let (x, y) = (x as u32, y as u32);
            let square = BinaryMask::from_fn(image.width, image.height, |row, col| {
                row.abs_diff(y) <= 3 && col.abs_diff(x) <= 3
            });
            Ok(Prediction {
                masks: vec![square.clone(), BinaryMask::empty(image.width, image.height)],
                scores: vec![0.9, 0.1],
                logits: vec![
                    MaskLogits { width: 1, height: 1, data: vec![1.0] },
                    MaskLogits { width: 1, height: 1, data: vec![0.0] },
                ],
            })
        }
    }

    fn region(rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) -> GeneratedMask {
        GeneratedMask::from_segmentation(BinaryMask::from_fn(40, 30, |row, col| {
            rows.contains(&row) && cols.contains(&col)
        }))
    }

    #[test]
    fn test_session_offers_points_and_refines() {
        let mut generator = FixedGenerator(vec![
            region(0..30, 0..40),
            region(2..6, 2..6),
            region(10..20, 20..30),
        ]);
        let image = ImageInput::new("synthetic.png", 40, 30);
        let mut session =
            Segmenter::new(image, &mut generator, SquarePredictor::default(), &SegmenterConfig::default()).unwrap();

        assert_eq!(session.inventory().detected(), 3);
        assert_eq!(session.remaining(), 2);

        let point = session.best_point().unwrap();
        assert_eq!(point.centroid, Centroid { row: 14, col: 24 });

        let mask = session.propagate_points(&PointPrompt::positive_at(point.centroid)).unwrap();
        assert!(mask.get(14, 24));
        assert_eq!(mask.area(), 49);

        assert_eq!(session.best_point().unwrap().area, 16);
        assert_eq!(session.best_point(), None);
        assert_eq!(session.pick(), Pick::Exhausted);
        assert_eq!(session.into_predictor().calls, 2);
    }

    #[test]
    fn test_session_rejects_invalid_config() {
        let mut generator = FixedGenerator(vec![]);
        let config = SegmenterConfig { coverage_threshold: 0.0, ..Default::default() };
        let image = ImageInput::new("synthetic.png", 40, 30);
        assert!(Segmenter::new(image, &mut generator, SquarePredictor::default(), &config).is_err());
    }
}
