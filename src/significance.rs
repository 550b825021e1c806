//! Combines the per-SOI scores of a gene into a single verdict

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::Serialize;
use tracing::trace;

use crate::aggregate::DirectionCounts;
use crate::annotations::GeneId;
use crate::engine::GeneResult;
use crate::soi::{Direction, SoiTarget};
use crate::stats::{PValueTest, StatTest};
use crate::{GoSoiError, GoSoiResult};

/// All scores of a gene for one SOI direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionScore {
    counts: DirectionCounts,
    values: BTreeMap<StatTest, f64>,
    empty_background: bool,
}

impl DirectionScore {
    /// Constructs a new [`DirectionScore`] without any values
    pub fn new(counts: DirectionCounts, empty_background: bool) -> Self {
        Self {
            counts,
            values: BTreeMap::new(),
            empty_background,
        }
    }

    /// Adds the result of a scorer
    pub fn insert(&mut self, test: StatTest, value: f64) {
        self.values.insert(test, value);
    }

    /// The direct and indirect hits of the gene
    pub fn counts(&self) -> &DirectionCounts {
        &self.counts
    }

    /// Returns the result of `test`, if it was calculated
    pub fn get(&self, test: StatTest) -> Option<f64> {
        self.values.get(&test).copied()
    }

    /// Returns the p-value of `test`
    ///
    /// A missing value is treated as not significant (`1.0`).
    pub fn pvalue(&self, test: PValueTest) -> f64 {
        self.get(test.into()).unwrap_or(1.0)
    }

    /// `true` if no gene of the population hits a term of this direction
    pub fn empty_background(&self) -> bool {
        self.empty_background
    }
}

/// The scores of a gene for both directions of one SOI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoiScore {
    soi: String,
    target: Direction,
    #[serde(rename = "+")]
    up: DirectionScore,
    #[serde(rename = "-")]
    down: DirectionScore,
}

impl SoiScore {
    /// Constructs a new [`SoiScore`] for the target `soi`
    pub fn new(soi: &SoiTarget, up: DirectionScore, down: DirectionScore) -> Self {
        Self {
            soi: soi.name().to_string(),
            target: soi.direction(),
            up,
            down,
        }
    }

    /// The name of the SOI
    pub fn soi(&self) -> &str {
        &self.soi
    }

    /// The desired direction of regulation
    pub fn target(&self) -> Direction {
        self.target
    }

    /// The scores of `direction`
    pub fn get(&self, direction: Direction) -> &DirectionScore {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// The final verdict about a gene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The gene passes the criterion for every target SOI
    Significant,
    /// The gene fails the criterion for at least one target SOI
    NotSignificant,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Significant`]
    pub fn is_significant(&self) -> bool {
        matches!(self, Verdict::Significant)
    }
}

/// The rule that decides whether a gene is significant for a SOI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// Significance threshold, p-values below are significant
    pub threshold: f64,
    /// The test whose p-values are compared
    pub test: PValueTest,
    /// Ignore the p-value of the opposite direction
    pub exclude_opposite: bool,
}

impl DecisionPolicy {
    /// Returns `true` if the gene passes the criterion for the SOI
    ///
    /// The p-value of the target direction must be below the threshold.
    /// Unless `exclude_opposite` is set, the p-value of the opposite
    /// direction must not be below the threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::significance::DecisionPolicy;
    /// use gosoi::stats::PValueTest;
    ///
    /// let policy = DecisionPolicy { threshold: 0.05, test: PValueTest::Fisher, exclude_opposite: false };
    /// assert!(policy.passes(0.01, 0.5));
    /// assert!(!policy.passes(0.01, 0.01));
    /// assert!(!policy.passes(0.05, 0.5));
    /// ```
    pub fn passes(&self, target: f64, opposite: f64) -> bool {
        target < self.threshold && (self.exclude_opposite || opposite >= self.threshold)
    }

    fn passes_soi(&self, score: &SoiScore) -> bool {
        let target = score.get(score.target()).pvalue(self.test);
        let opposite = score.get(score.target().opposite()).pvalue(self.test);
        self.passes(target, opposite)
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            test: PValueTest::Fisher,
            exclude_opposite: false,
        }
    }
}

/// The gene still receives scores
pub struct Candidate;
/// All target SOIs are scored
pub struct Evaluated;

fn transition_state<TX, TY>(evaluation: Evaluation<TX>) -> Evaluation<TY> {
    Evaluation::<TY> {
        gene: evaluation.gene,
        scores: evaluation.scores,
        missing_annotation_data: evaluation.missing_annotation_data,
        state: PhantomData,
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// The significance evaluation of a single gene
///
/// The evaluation moves through the following states, each only once:
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Candidate
///     Candidate --> Candidate: add_score
///     Candidate --> Evaluated: evaluate
///     Evaluated --> Significant: decide
///     Evaluated --> NotSignificant: decide
///     Significant --> [*]
///     NotSignificant --> [*]
/// ```
///
/// A gene is [`Verdict::Significant`] only if it passes the
/// [`DecisionPolicy`] for every target SOI.
pub struct Evaluation<S> {
    gene: GeneId,
    scores: Vec<SoiScore>,
    missing_annotation_data: bool,
    state: PhantomData<S>,
}

impl Evaluation<Candidate> {
    /// Starts the evaluation of `gene`
    ///
    /// `missing_annotation_data` marks genes without any hit, they are
    /// scored with sentinel values and kept in the output.
    pub fn new(gene: GeneId, missing_annotation_data: bool) -> Self {
        Self {
            gene,
            scores: Vec::new(),
            missing_annotation_data,
            state: PhantomData,
        }
    }

    /// Adds the scores of one SOI
    pub fn add_score(&mut self, score: SoiScore) {
        self.scores.push(score);
    }

    /// Finishes the scoring
    ///
    /// # Errors
    ///
    /// [`GoSoiError::InvalidInput`] if any of the target `sois` was not scored
    pub fn evaluate(self, sois: &[SoiTarget]) -> GoSoiResult<Evaluation<Evaluated>> {
        if let Some(missing) = sois
            .iter()
            .find(|soi| !self.scores.iter().any(|score| score.soi() == soi.name()))
        {
            return Err(GoSoiError::InvalidInput(format!(
                "{} was not scored for SOI {}",
                self.gene,
                missing.name()
            )));
        }
        Ok(transition_state(self))
    }
}

impl Evaluation<Evaluated> {
    /// Skips the [`Candidate`] state for a complete set of scores
    ///
    /// `scores` must hold one entry for every target SOI, which is the
    /// case when they are built by mapping over the SOIs of the model.
    pub(crate) fn scored(gene: GeneId, scores: Vec<SoiScore>, missing_annotation_data: bool) -> Self {
        Self {
            gene,
            scores,
            missing_annotation_data,
            state: PhantomData,
        }
    }

    /// Applies the decision rule
    pub fn decide(self, policy: &DecisionPolicy) -> GeneResult {
        let verdict = if self.scores.iter().all(|score| policy.passes_soi(score)) {
            Verdict::Significant
        } else {
            Verdict::NotSignificant
        };
        trace!("{}: {:?}", self.gene, verdict);
        GeneResult::new(
            self.gene,
            self.scores,
            verdict,
            self.missing_annotation_data,
        )
    }
}
