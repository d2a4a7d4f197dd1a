use crate::{
    algorithms::{scoring::MaskScorer, selection::select_best},
    error::{MaskError, Result},
    traits::PointPredictor,
    types::{BinaryMask, MaskLogits, PointPrompt, Prediction},
};

/// Rounds of the two-pass refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementStage {
    /// Prediction from the raw point prompts
    Coarse,
    /// Prediction seeded with the coarse winner's logits
    Refined,
}

/// Runs coarse-then-refined prediction and keeps the best-scoring mask of each round.
pub struct RefinementOrchestrator<P> {
    predictor: P,
    scorer: MaskScorer,
    image_height: u32,
    image_width: u32,
}

impl<P: PointPredictor> RefinementOrchestrator<P> {
    pub fn new(predictor: P, scorer: MaskScorer, image_height: u32, image_width: u32) -> Self {
        Self {
            predictor,
            scorer,
            image_height,
            image_width,
        }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn predictor_mut(&mut self) -> &mut P {
        &mut self.predictor
    }

    pub fn into_predictor(self) -> P {
        self.predictor
    }

    pub fn scorer(&self) -> &MaskScorer {
        &self.scorer
    }

    /// Predict from `prompt`, feed the winner back as a prior, predict again and
    /// return the second round's winner.
    pub fn refine(&mut self, prompt: &PointPrompt) -> Result<BinaryMask> {
        prompt.validate()?;

        let mut stage = RefinementStage::Coarse;
        let mut prior: Option<MaskLogits> = None;

        loop {
            let prediction = self.predictor.predict(prompt, prior.as_ref())?;
            let winner = self.select(stage, &prediction)?;

            match stage {
                RefinementStage::Coarse => {
                    prior = Some(prediction.logits[winner].clone());
                    stage = RefinementStage::Refined;
                }
                RefinementStage::Refined => {
                    let Prediction { mut masks, .. } = prediction;
                    return Ok(masks.swap_remove(winner));
                }
            }
        }
    }

    fn select(&self, stage: RefinementStage, prediction: &Prediction) -> Result<usize> {
        prediction.validate()?;

        let winner = select_best(
            &prediction.masks,
            &prediction.scores,
            &self.scorer,
            self.image_height,
            self.image_width,
        )
        .ok_or_else(|| MaskError::PredictionFailure(format!("{stage:?} round produced no candidates")))?;

        tracing::debug!(
            ?stage,
            candidates = prediction.len(),
            winner,
            confidence = prediction.scores[winner],
            "selected candidate"
        );
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageInput, PointLabel};

    /// Predictor replaying canned rounds and recording the priors it receives
    struct StubPredictor {
        rounds: Vec<Prediction>,
        priors: Vec<Option<MaskLogits>>,
        fail: bool,
    }

    impl StubPredictor {
        fn new(rounds: Vec<Prediction>) -> Self {
            Self { rounds, priors: Vec::new(), fail: false }
        }
    }

    impl PointPredictor for StubPredictor {
        fn set_image(&mut self, _image: &ImageInput) -> Result<()> {
            Ok(())
        }

        fn predict(&mut self, _prompt: &PointPrompt, mask_input: Option<&MaskLogits>) -> Result<Prediction> {
            if self.fail {
                return Err(MaskError::PredictionFailure("model crashed".to_string()));
            }
            self.priors.push(mask_input.cloned());
            let round = self.priors.len() - 1;
            self.rounds
                .get(round)
                .cloned()
                .ok_or_else(|| MaskError::PredictionFailure("no more canned rounds".to_string()))
        }
    }

    fn block(offset: u32, side: u32) -> BinaryMask {
        BinaryMask::from_fn(32, 32, |row, col| {
            (offset..offset + side).contains(&row) && (offset..offset + side).contains(&col)
        })
    }

    fn logits(tag: f32) -> MaskLogits {
        MaskLogits { width: 2, height: 2, data: vec![tag; 4] }
    }

    fn prompt() -> PointPrompt {
        PointPrompt::new(vec![[10.0, 10.0]], vec![PointLabel::Positive]).unwrap()
    }

    #[test]
    fn test_refine_feeds_coarse_winner_into_second_round() {
        let coarse = Prediction {
            masks: vec![block(4, 8), block(6, 8)],
            scores: vec![0.2, 0.9],
            logits: vec![logits(1.0), logits(2.0)],
        };
        let refined = Prediction {
            masks: vec![block(5, 10), block(2, 10)],
            scores: vec![0.95, 0.3],
            logits: vec![logits(3.0), logits(4.0)],
        };
        let mut orchestrator =
            RefinementOrchestrator::new(StubPredictor::new(vec![coarse, refined]), MaskScorer::default(), 32, 32);

        let mask = orchestrator.refine(&prompt()).unwrap();
        assert_eq!(mask, block(5, 10));

        let stub = orchestrator.into_predictor();
        assert_eq!(stub.priors.len(), 2);
        assert_eq!(stub.priors[0], None);
        assert_eq!(stub.priors[1], Some(logits(2.0)));
    }

    #[test]
    fn test_refine_fails_on_empty_round() {
        let coarse = Prediction {
            masks: vec![block(4, 8)],
            scores: vec![0.5],
            logits: vec![logits(1.0)],
        };
        let empty = Prediction { masks: vec![], scores: vec![], logits: vec![] };
        let mut orchestrator =
            RefinementOrchestrator::new(StubPredictor::new(vec![coarse, empty]), MaskScorer::default(), 32, 32);

        assert!(matches!(orchestrator.refine(&prompt()), Err(MaskError::PredictionFailure(_))));
    }

    #[test]
    fn test_refine_fails_on_ragged_prediction() {
        let ragged = Prediction {
            masks: vec![block(4, 8), block(6, 8)],
            scores: vec![0.5],
            logits: vec![logits(1.0), logits(2.0)],
        };
        let mut orchestrator =
            RefinementOrchestrator::new(StubPredictor::new(vec![ragged]), MaskScorer::default(), 32, 32);

        assert!(matches!(orchestrator.refine(&prompt()), Err(MaskError::PredictionFailure(_))));
        assert_eq!(orchestrator.predictor().priors.len(), 1);
    }

    #[test]
    fn test_predictor_errors_propagate_without_retry() {
        let mut stub = StubPredictor::new(vec![]);
        stub.fail = true;
        let mut orchestrator = RefinementOrchestrator::new(stub, MaskScorer::default(), 32, 32);

        assert!(orchestrator.refine(&prompt()).is_err());
        assert!(orchestrator.predictor().priors.is_empty());
    }

    #[test]
    fn test_invalid_prompt_never_reaches_predictor() {
        let round = Prediction {
            masks: vec![block(4, 8)],
            scores: vec![0.5],
            logits: vec![logits(1.0)],
        };
        let mut orchestrator =
            RefinementOrchestrator::new(StubPredictor::new(vec![round.clone(), round]), MaskScorer::default(), 32, 32);

        let empty = PointPrompt { points: vec![], labels: vec![] };
        assert!(matches!(orchestrator.refine(&empty), Err(MaskError::InvalidPrompt(_))));

        let unlabeled = PointPrompt { points: vec![[1.0, 1.0], [2.0, 2.0]], labels: vec![PointLabel::Positive] };
        assert!(matches!(orchestrator.refine(&unlabeled), Err(MaskError::InvalidPrompt(_))));

        assert!(orchestrator.predictor().priors.is_empty());
    }
}
