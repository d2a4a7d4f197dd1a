use crate::{algorithms::scoring::MaskScorer, types::BinaryMask};

/// Pick the candidate with the highest composite score.
///
/// Returns `None` for an empty candidate set. Ties keep the earliest index and
/// a NaN score never beats a real one. Only the first `min(masks, confidences)`
/// pairs are considered.
pub fn select_best(
    masks: &[BinaryMask],
    confidences: &[f32],
    scorer: &MaskScorer,
    image_height: u32,
    image_width: u32,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, (mask, &confidence)) in masks.iter().zip(confidences).enumerate() {
        let score = scorer.score(mask, confidence as f64, image_height, image_width);
        let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
        tracing::debug!(index, confidence, score, "scored candidate mask");

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::scoring::ScoreWeights;

    fn block(rows: u32, cols: u32) -> BinaryMask {
        BinaryMask::from_fn(64, 64, |row, col| (8..8 + rows).contains(&row) && (8..8 + cols).contains(&col))
    }

    #[test]
    fn test_empty_candidates_select_nothing() {
        let scorer = MaskScorer::default();
        assert_eq!(select_best(&[], &[], &scorer, 64, 64), None);
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let scorer = MaskScorer::default();
        for confidence in [-5.0, 0.0, 1.0, f32::NAN] {
            assert_eq!(select_best(&[block(4, 4)], &[confidence], &scorer, 64, 64), Some(0));
        }
    }

    #[test]
    fn test_ties_keep_first_index() {
        let scorer = MaskScorer::default();
        let masks = vec![block(10, 10), block(10, 10), block(10, 10)];
        assert_eq!(select_best(&masks, &[0.5, 0.5, 0.5], &scorer, 64, 64), Some(0));
    }

    #[test]
    fn test_highest_confidence_wins_for_identical_shapes() {
        let scorer = MaskScorer::default();
        let masks = vec![block(10, 10), block(10, 10), block(10, 10)];
        assert_eq!(select_best(&masks, &[0.2, 0.9, 0.5], &scorer, 64, 64), Some(1));
    }

    #[test]
    fn test_size_penalty_can_override_confidence() {
        let scorer = MaskScorer::new(ScoreWeights::new(0.1, 0.0, 5.0));
        let masks = vec![block(56, 56), block(12, 12)];
        assert_eq!(select_best(&masks, &[0.99, 0.80], &scorer, 64, 64), Some(1));
    }

    #[test]
    fn test_nan_score_never_beats_real_score() {
        let scorer = MaskScorer::default();
        let masks = vec![block(10, 10), block(10, 10)];
        assert_eq!(select_best(&masks, &[f32::NAN, 0.1], &scorer, 64, 64), Some(1));
    }
}
