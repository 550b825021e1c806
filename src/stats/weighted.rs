use crate::stats::{f64_from_usize, ScoreInput, Scorer};

/// Weighted score of the gene's hits in `T`
///
/// Each hit term contributes its weight, direct hits count double:
/// `(2 * direct weight + indirect weight) / total weight of T`.
/// The score only ranks genes, it is not a probability.
///
/// # Examples
///
/// ```
/// use gosoi::aggregate::{Bucket, DirectionCounts};
/// use gosoi::stats::{AdvProductScore, BackgroundCounts, ScoreInput, Scorer};
///
/// let counts = DirectionCounts {
///     direct: Bucket { count: 1, weight: 0.5 },
///     indirect: Bucket { count: 2, weight: 1.0 },
/// };
/// let background = BackgroundCounts { target: 10, total: 40 };
/// let input = ScoreInput::new(counts, 4.0, 3, background);
///
/// assert_eq!(AdvProductScore.calculate(&input), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvProductScore;

impl Scorer for AdvProductScore {
    fn score(&self, input: &ScoreInput) -> f64 {
        if input.total_weight() <= 0.0 {
            return self.empty_value();
        }
        let counts = input.counts();
        (2.0 * counts.direct.weight + counts.indirect.weight) / input.total_weight()
    }

    fn empty_value(&self) -> f64 {
        0.0
    }
}

/// The number of distinct terms of `T` that the gene hits
#[derive(Debug, Clone, Copy, Default)]
pub struct NTerms;

impl Scorer for NTerms {
    fn score(&self, input: &ScoreInput) -> f64 {
        f64_from_usize(input.counts().total().count)
    }

    fn empty_value(&self) -> f64 {
        0.0
    }
}
