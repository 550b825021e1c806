use statrs::distribution::{DiscreteCDF, Hypergeometric};
use tracing::{debug, warn};

use crate::stats::{ScoreInput, Scorer};

/// One-sided Fisher's exact test for over-representation in `T`
///
/// The gene's hits are treated as draws from all hits of the
/// population, the p-value is the probability to draw at least
/// `a` hits of `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FisherExact;

impl Scorer for FisherExact {
    fn score(&self, input: &ScoreInput) -> f64 {
        fisher_exact(input.a(), input.b(), input.c(), input.d())
    }

    fn empty_value(&self) -> f64 {
        1.0
    }
}

/// Calculates the one-sided (greater) p-value of a 2x2 contingency table
///
/// |         | in `T` | not in `T` |
/// |---------|--------|------------|
/// | gene    | a      | b          |
/// | others  | c      | d          |
///
/// The p-value is `P(X >= a)` with `X` following the hypergeometric
/// distribution of a population of `a + b + c + d`, with `a + c`
/// successes and `a + b` draws.
///
/// # Examples
///
/// ```
/// use gosoi::stats::fisher_exact;
///
/// let enriched = fisher_exact(8, 2, 1, 5);
/// let random = fisher_exact(1, 9, 10, 90);
/// assert!(enriched < 0.05);
/// assert!(random > 0.5);
/// assert_eq!(fisher_exact(0, 3, 2, 5), 1.0);
/// ```
pub fn fisher_exact(a: u64, b: u64, c: u64, d: u64) -> f64 {
    if a == 0 {
        return 1.0;
    }
    let population = a + b + c + d;
    let successes = a + c;
    let draws = a + b;

    match Hypergeometric::new(population, successes, draws) {
        Ok(hyper) => {
            debug!(
                "Population: {}, Successes: {}, Draws: {}, Observed: {}",
                population, successes, draws, a
            );
            // subtracting 1, because we want to test including a
            // e.g. "7 or more", but sf by default calculates "more than 7"
            hyper.sf(a - 1).clamp(0.0, 1.0)
        }
        Err(err) => {
            warn!("Invalid contingency table {a} {b} {c} {d}: {err}");
            1.0
        }
    }
}
