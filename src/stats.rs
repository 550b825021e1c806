//! Statistical scoring of a gene's hits for one SOI direction
//!
//! Every scorer receives the same [`ScoreInput`]: the direct and indirect
//! hits of the gene for the bucket term set `T` of one SOI direction, the
//! number of all eligible terms the gene hits and the background counts of
//! the whole population. From these the 2x2 contingency table is derived:
//!
//! |                   | in `T` | not in `T` |
//! |-------------------|--------|------------|
//! | gene              | a      | b          |
//! | rest of population| c      | d          |
//!
//! `gosoi` provides the following scorers, see [`StatTest`]:
//!
//! - [`FisherExact`]: one-sided Fisher's exact test for over-representation
//! - [`BinomialTest`]: probability of at least `a` hits in `T`, given the
//!   population base rate
//! - [`AdvProductScore`]: weighted score, direct hits count double
//! - [`NTerms`]: the number of hit terms
//!
//! The p-value tests return lower values for more significant results,
//! the two scores return higher values for stronger hits.

use serde::{Deserialize, Serialize};

use crate::aggregate::DirectionCounts;

pub mod background;
mod binomial;
mod hypergeom;
mod weighted;

pub use background::BackgroundCounts;
pub use binomial::{binomial_test, BinomialTest};
pub use hypergeom::{fisher_exact, FisherExact};
pub use weighted::{AdvProductScore, NTerms};

/// The input of all [`Scorer`]s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput {
    counts: DirectionCounts,
    total_weight: f64,
    gene_hits: u64,
    background: BackgroundCounts,
}

impl ScoreInput {
    /// Constructs a new [`ScoreInput`]
    ///
    /// - `counts`: the hits of the gene in the bucket term set `T`
    /// - `total_weight`: the summed weight of all terms of `T`
    /// - `gene_hits`: the number of eligible terms that the gene hits,
    ///   directly or through propagation
    /// - `background`: the population counts of `T` and of all eligible terms
    pub fn new(
        counts: DirectionCounts,
        total_weight: f64,
        gene_hits: u64,
        background: BackgroundCounts,
    ) -> Self {
        Self {
            counts,
            total_weight,
            gene_hits,
            background,
        }
    }

    /// The direct and indirect hits of the gene
    pub fn counts(&self) -> &DirectionCounts {
        &self.counts
    }

    /// The summed weight of all terms of `T`
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Hits of the gene in `T`
    pub fn a(&self) -> u64 {
        u64::try_from(self.counts.total().count).unwrap_or(u64::MAX)
    }

    /// Hits of the gene outside of `T`
    pub fn b(&self) -> u64 {
        self.gene_hits.saturating_sub(self.a())
    }

    /// Hits of the rest of the population in `T`
    pub fn c(&self) -> u64 {
        self.background.target.saturating_sub(self.a())
    }

    /// Hits of the rest of the population outside of `T`
    pub fn d(&self) -> u64 {
        self.background.other().saturating_sub(self.b())
    }

    /// The population counts
    pub fn background(&self) -> BackgroundCounts {
        self.background
    }

    /// Returns `true` if no gene of the population hits any term of `T`
    pub fn is_empty_background(&self) -> bool {
        self.background.is_empty()
    }
}

/// Trait for the statistical scoring of a [`ScoreInput`]
///
/// `gosoi` comes with several scorers, listed in [`StatTest`].
/// Custom scorers only have to implement [`Scorer::score`].
pub trait Scorer {
    /// Calculates the actual score of a valid input
    fn score(&self, input: &ScoreInput) -> f64;

    /// The value returned for an empty background population
    fn empty_value(&self) -> f64;

    /// Returns the score, or [`Scorer::empty_value`] for an empty background
    fn calculate(&self, input: &ScoreInput) -> f64 {
        if input.is_empty_background() {
            return self.empty_value();
        }
        self.score(input)
    }
}

/// The scorers provided by `gosoi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTest {
    /// [`FisherExact`]
    Fisher,
    /// [`BinomialTest`]
    Binomial,
    /// [`AdvProductScore`]
    AdvProductScore,
    /// [`NTerms`]
    #[serde(rename = "nterms")]
    NTerms,
}

impl StatTest {
    /// All scorers, in the order of the output
    pub const ALL: [StatTest; 4] = [
        StatTest::Fisher,
        StatTest::Binomial,
        StatTest::AdvProductScore,
        StatTest::NTerms,
    ];

    /// Returns `true` if the test returns a p-value
    pub fn is_pvalue(&self) -> bool {
        matches!(self, StatTest::Fisher | StatTest::Binomial)
    }
}

impl Scorer for StatTest {
    fn score(&self, input: &ScoreInput) -> f64 {
        match self {
            StatTest::Fisher => FisherExact.score(input),
            StatTest::Binomial => BinomialTest.score(input),
            StatTest::AdvProductScore => AdvProductScore.score(input),
            StatTest::NTerms => NTerms.score(input),
        }
    }

    fn empty_value(&self) -> f64 {
        if self.is_pvalue() {
            1.0
        } else {
            0.0
        }
    }
}

/// The p-value test that decides about significance
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PValueTest {
    /// [`FisherExact`]
    #[default]
    Fisher,
    /// [`BinomialTest`]
    Binomial,
}

impl From<PValueTest> for StatTest {
    fn from(test: PValueTest) -> Self {
        match test {
            PValueTest::Fisher => StatTest::Fisher,
            PValueTest::Binomial => StatTest::Binomial,
        }
    }
}

/// Converts to f64 without panicking
///
/// Values above `u32::MAX` are split into their high and low half,
/// the result is exact up to the precision of f64.
fn f64_from_u64(n: u64) -> f64 {
    match u32::try_from(n) {
        Ok(small) => small.into(),
        Err(_) => {
            let high = u32::try_from(n >> 32).unwrap_or(u32::MAX);
            let low = u32::try_from(n & u64::from(u32::MAX)).unwrap_or(u32::MAX);
            f64::from(high) * 4_294_967_296.0 + f64::from(low)
        }
    }
}

fn f64_from_usize(n: usize) -> f64 {
    f64_from_u64(u64::try_from(n).unwrap_or(u64::MAX))
}
