use statrs::distribution::{Binomial, DiscreteCDF};
use tracing::warn;

use crate::stats::{f64_from_u64, ScoreInput, Scorer};

/// Binomial test of the gene's hits in `T`
///
/// Each hit of the gene is a draw that lands in `T` with the
/// population base rate `bg(T) / bg(U)`. The p-value is the
/// probability to observe at least `a` hits in `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinomialTest;

impl Scorer for BinomialTest {
    fn score(&self, input: &ScoreInput) -> f64 {
        let background = input.background();
        if background.total == 0 {
            return self.empty_value();
        }
        let probability = f64_from_u64(background.target) / f64_from_u64(background.total);
        binomial_test(input.a(), input.a() + input.b(), probability)
    }

    fn empty_value(&self) -> f64 {
        1.0
    }
}

/// Returns `P(X >= successes)` for `X ~ Binomial(trials, probability)`
///
/// # Examples
///
/// ```
/// use gosoi::stats::binomial_test;
///
/// // 2 heads in 2 tosses of a fair coin
/// assert!((binomial_test(2, 2, 0.5) - 0.25).abs() < 1e-9);
/// assert_eq!(binomial_test(0, 5, 0.1), 1.0);
/// ```
pub fn binomial_test(successes: u64, trials: u64, probability: f64) -> f64 {
    if successes == 0 {
        return 1.0;
    }
    if successes > trials || probability <= 0.0 {
        return 0.0;
    }
    if probability >= 1.0 {
        return 1.0;
    }
    match Binomial::new(probability, trials) {
        // subtracting 1, because we want to test including `successes`
        Ok(binomial) => binomial.sf(successes - 1).clamp(0.0, 1.0),
        Err(err) => {
            warn!("Invalid binomial distribution p={probability} n={trials}: {err}");
            1.0
        }
    }
}
