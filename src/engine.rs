//! Scoring of genes against the SOI model
//!
//! The [`Engine`] ties all parts together: it aggregates the hits of a
//! gene, runs every [`StatTest`] for both directions of every SOI and
//! decides about significance. The engine only reads the shared
//! [`Ontology`] and [`AnnotationIndex`], so genes can be scored from
//! several threads at the same time.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, GeneRecord, Propagation};
use crate::annotations::{AnnotationIndex, Gene, GeneId};
use crate::config::Settings;
use crate::significance::{DecisionPolicy, DirectionScore, Evaluation, SoiScore, Verdict};
use crate::soi::{Direction, SoiModel, SoiModelInput, SoiTarget};
use crate::stats::background::{BackgroundSource, PropagatedBackground};
use crate::stats::{BackgroundCounts, ScoreInput, Scorer, StatTest};
use crate::{GoSoiError, GoSoiResult, Ontology};

/// The result of a single gene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneResult {
    gene: GeneId,
    scores: Vec<SoiScore>,
    verdict: Verdict,
    missing_annotation_data: bool,
}

impl GeneResult {
    pub(crate) fn new(
        gene: GeneId,
        scores: Vec<SoiScore>,
        verdict: Verdict,
        missing_annotation_data: bool,
    ) -> Self {
        Self {
            gene,
            scores,
            verdict,
            missing_annotation_data,
        }
    }

    /// The gene
    pub fn gene(&self) -> &GeneId {
        &self.gene
    }

    /// The scores of all SOIs, in the order of the model
    pub fn scores(&self) -> &[SoiScore] {
        &self.scores
    }

    /// The scores of the named SOI
    pub fn score(&self, soi: &str) -> Option<&SoiScore> {
        self.scores.iter().find(|score| score.soi() == soi)
    }

    /// The significance verdict
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// `true` if the gene does not hit any term of any SOI
    ///
    /// Such genes are kept in the output with sentinel scores.
    pub fn missing_annotation_data(&self) -> bool {
        self.missing_annotation_data
    }
}

/// The results of all scored genes, ordered by gene id
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ScoreTable {
    results: Vec<GeneResult>,
}

impl ScoreTable {
    fn new(mut results: Vec<GeneResult>) -> Self {
        results.sort_by(|a, b| a.gene.cmp(&b.gene));
        Self { results }
    }

    /// Returns the number of genes
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the table does not contain any genes
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the result of `gene`
    pub fn get(&self, gene: &GeneId) -> Option<&GeneResult> {
        self.results
            .binary_search_by(|result| result.gene.cmp(gene))
            .ok()
            .and_then(|idx| self.results.get(idx))
    }

    /// Iterates all results
    pub fn iter(&self) -> std::slice::Iter<'_, GeneResult> {
        self.results.iter()
    }

    /// Iterates the results of all significant genes
    pub fn significant(&self) -> impl Iterator<Item = &GeneResult> {
        self.results
            .iter()
            .filter(|result| result.verdict.is_significant())
    }

    /// Serializes the table to JSON
    ///
    /// # Errors
    ///
    /// [`GoSoiError::InvalidInput`] if the table cannot be serialized,
    /// e.g. because of non-finite scores
    pub fn to_json(&self) -> GoSoiResult<String> {
        serde_json::to_string(self).map_err(|err| GoSoiError::InvalidInput(err.to_string()))
    }
}

impl<'a> IntoIterator for &'a ScoreTable {
    type Item = &'a GeneResult;
    type IntoIter = std::slice::Iter<'a, GeneResult>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Background counts of both directions of a SOI
#[derive(Debug, Clone, Copy, Default)]
struct SoiBackground {
    up: BackgroundCounts,
    down: BackgroundCounts,
}

impl SoiBackground {
    fn get(&self, direction: Direction) -> BackgroundCounts {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Scores genes against the SOI model
///
/// The engine is built once per run. Building validates the settings and
/// the SOI model and calculates the background counts of every SOI
/// direction. Afterwards it is read-only and can be shared between threads.
///
/// ```mermaid
/// flowchart LR
///     G[Gene] --> A[Aggregator]
///     O[Ontology] --> A
///     M[SoiModel] --> A
///     A --> S[Scorers]
///     B[Background] --> S
///     S --> D[DecisionPolicy]
///     D --> R[GeneResult]
/// ```
///
/// # Examples
///
/// ```
/// use gosoi::{Category, Engine, GoTermRecord, Ontology, Settings};
/// use gosoi::annotations::{Annotation, AnnotationIndex};
/// use gosoi::soi::{AnnotationDirection, Direction, Soi, SoiAnnotation, SoiModelInput};
///
/// let ontology = Ontology::from_records(vec![
///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess),
///     GoTermRecord::new(2u32, "B", Category::BiologicalProcess).with_parent(1u32),
///     GoTermRecord::new(3u32, "C", Category::BiologicalProcess).with_parent(1u32),
/// ]).unwrap();
///
/// let settings = Settings::default();
/// let index = AnnotationIndex::from_annotations(
///     vec![
///         Annotation::new("g1", 2u32, "IDA"),
///         Annotation::new("g2", 3u32, "IMP"),
///     ],
///     &settings.evidence_filter().unwrap(),
/// );
///
/// let input = SoiModelInput {
///     sois: vec![Soi::new("X", Direction::Up)],
///     annotations: vec![
///         SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 1.0),
///         SoiAnnotation::new(3u32, "X", AnnotationDirection::Down, 1.0),
///     ],
///     ..Default::default()
/// };
///
/// let engine = Engine::new(&ontology, &index, input, &settings).unwrap();
/// let table = engine.score_all();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug)]
pub struct Engine<'a> {
    ontology: &'a Ontology,
    index: &'a AnnotationIndex,
    model: SoiModel,
    propagation: Propagation,
    policy: DecisionPolicy,
    backgrounds: Vec<SoiBackground>,
}

impl<'a> Engine<'a> {
    /// Builds the engine with a background derived from the `index`
    ///
    /// # Errors
    ///
    /// Any configuration error of [`Settings::validate`] or [`SoiModel::new`]
    pub fn new(
        ontology: &'a Ontology,
        index: &'a AnnotationIndex,
        input: SoiModelInput,
        settings: &Settings,
    ) -> GoSoiResult<Self> {
        let model = Self::build_model(ontology, input, settings)?;
        let propagation = settings.propagation();
        let background =
            PropagatedBackground::new(index, &Aggregator::new(ontology, &model, propagation));
        Ok(Self::from_parts(
            ontology,
            index,
            model,
            settings,
            &background,
        ))
    }

    /// Builds the engine with an external background source
    ///
    /// # Errors
    ///
    /// Any configuration error of [`Settings::validate`] or [`SoiModel::new`]
    pub fn with_background<B: BackgroundSource>(
        ontology: &'a Ontology,
        index: &'a AnnotationIndex,
        input: SoiModelInput,
        settings: &Settings,
        background: &B,
    ) -> GoSoiResult<Self> {
        let model = Self::build_model(ontology, input, settings)?;
        Ok(Self::from_parts(ontology, index, model, settings, background))
    }

    fn build_model(
        ontology: &Ontology,
        input: SoiModelInput,
        settings: &Settings,
    ) -> GoSoiResult<SoiModel> {
        settings.validate()?;
        SoiModel::new(
            input,
            ontology,
            settings.duplicate_annotation_policy,
            settings.general_direction_policy,
        )
    }

    fn from_parts<B: BackgroundSource>(
        ontology: &'a Ontology,
        index: &'a AnnotationIndex,
        model: SoiModel,
        settings: &Settings,
        background: &B,
    ) -> Self {
        let backgrounds = model
            .sois()
            .iter()
            .map(|soi| {
                let [up, down] = Direction::BOTH.map(|direction| {
                    let counts = background.population_background(soi.bucket(direction).terms());
                    if counts.is_empty() {
                        warn!(
                            "Empty background for SOI {} ({}), all genes get sentinel scores",
                            soi.name(),
                            direction
                        );
                    }
                    counts
                });
                SoiBackground { up, down }
            })
            .collect();

        info!(
            "Engine ready for {} SOIs and {} genes",
            model.sois().len(),
            index.len()
        );

        Self {
            ontology,
            index,
            model,
            propagation: settings.propagation(),
            policy: settings.decision_policy(),
            backgrounds,
        }
    }

    /// The validated SOI model
    pub fn model(&self) -> &SoiModel {
        &self.model
    }

    /// The aggregator used for all genes
    pub fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(self.ontology, &self.model, self.propagation)
    }

    /// Aggregates the hits of `gene` for every SOI
    pub fn gene_record(&self, gene: &Gene) -> GeneRecord {
        self.aggregator().gene_record(gene)
    }

    /// Scores a single gene
    pub fn score_gene(&self, gene: &Gene) -> GeneResult {
        let record = self.gene_record(gene);
        let missing = record.is_empty();
        if missing {
            debug!("{} has no annotation for any SOI", gene.id());
        }
        let gene_hits = u64::try_from(record.hits().len()).unwrap_or(u64::MAX);

        let scores = self
            .model
            .sois()
            .iter()
            .zip(&self.backgrounds)
            .map(|(soi, backgrounds)| {
                let [up, down] = Direction::BOTH.map(|direction| {
                    let background = backgrounds.get(direction);
                    self.direction_score(&record, soi, direction, gene_hits, background)
                });
                SoiScore::new(soi, up, down)
            })
            .collect();

        Evaluation::scored(gene.id().clone(), scores, missing).decide(&self.policy)
    }

    fn direction_score(
        &self,
        record: &GeneRecord,
        soi: &SoiTarget,
        direction: Direction,
        gene_hits: u64,
        background: BackgroundCounts,
    ) -> DirectionScore {
        let counts = record
            .counts(soi.name())
            .map(|counts| *counts.get(direction))
            .unwrap_or_default();
        let input = ScoreInput::new(
            counts,
            soi.bucket(direction).total_weight(),
            gene_hits,
            background,
        );
        let mut score = DirectionScore::new(counts, input.is_empty_background());
        for test in StatTest::ALL {
            score.insert(test, test.calculate(&input));
        }
        score
    }

    /// Scores every gene of the annotation index
    pub fn score_all(&self) -> ScoreTable {
        let table = ScoreTable::new(self.index.genes().map(|gene| self.score_gene(gene)).collect());
        info!(
            "Scored {} genes, {} significant",
            table.len(),
            table.significant().count()
        );
        table
    }

    /// Scores the given genes
    ///
    /// Genes that are not part of the annotation index are kept in the
    /// table with sentinel scores.
    pub fn score_genes<'g, I: IntoIterator<Item = &'g GeneId>>(&self, genes: I) -> ScoreTable {
        let results = genes
            .into_iter()
            .map(|id| match self.index.gene(id) {
                Some(gene) => self.score_gene(gene),
                None => {
                    debug!("{} is not annotated", id);
                    self.score_gene(&Gene::new(id.clone()))
                }
            })
            .collect();
        ScoreTable::new(results)
    }
}
