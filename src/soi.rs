//! States of interest (SOIs) and their curated GO term annotations
//!
//! A researcher declares a set of [`Soi`]s, each with the desired
//! [`Direction`] of regulation, and annotates GO terms to them with a
//! direction and a weight. The validated [`SoiModel`] splits these
//! annotations into one weighted term set per SOI and direction.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::term::{Category, GoGroup, GoTerm, GoTermId};
use crate::{GoSoiError, GoSoiResult, Ontology};

/// The direction of regulation of a SOI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// `+`, the SOI is promoted
    #[serde(rename = "+")]
    Up,
    /// `-`, the SOI is suppressed
    #[serde(rename = "-")]
    Down,
}

impl Direction {
    /// Both directions, `+` first
    pub const BOTH: [Direction; 2] = [Direction::Up, Direction::Down];

    /// Returns the other direction
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl FromStr for Direction {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        match s.trim() {
            "+" => Ok(Direction::Up),
            "-" => Ok(Direction::Down),
            other => Err(GoSoiError::InvalidInput(format!(
                "invalid SOI direction `{other}`"
            ))),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("+"),
            Direction::Down => f.write_str("-"),
        }
    }
}

/// The direction of a curated SOI annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationDirection {
    /// `+`, the term promotes the SOI
    #[serde(rename = "+")]
    Up,
    /// `-`, the term suppresses the SOI
    #[serde(rename = "-")]
    Down,
    /// `0`, the term contributes to the SOI without a direction
    #[serde(rename = "0")]
    General,
}

impl From<Direction> for AnnotationDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => AnnotationDirection::Up,
            Direction::Down => AnnotationDirection::Down,
        }
    }
}

impl FromStr for AnnotationDirection {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        match s.trim() {
            "+" => Ok(AnnotationDirection::Up),
            "-" => Ok(AnnotationDirection::Down),
            "0" => Ok(AnnotationDirection::General),
            other => Err(GoSoiError::InvalidInput(format!(
                "invalid annotation direction `{other}`"
            ))),
        }
    }
}

/// A state of interest and its target direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soi {
    /// The unique name of the SOI
    pub name: String,
    /// The desired direction of regulation
    pub direction: Direction,
}

impl Soi {
    /// Constructs a new SOI
    pub fn new(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            direction,
        }
    }
}

/// A curated claim that a GO term regulates a SOI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoiAnnotation {
    /// The GO term
    pub term: GoTermId,
    /// The name of the SOI
    pub soi: String,
    /// The direction of regulation
    pub direction: AnnotationDirection,
    /// The weight of the annotation, must be in `[0, 1]`
    pub weight: f64,
}

impl SoiAnnotation {
    /// Constructs a new SOI annotation
    pub fn new<T: Into<GoTermId>>(
        term: T,
        soi: &str,
        direction: AnnotationDirection,
        weight: f64,
    ) -> Self {
        Self {
            term: term.into(),
            soi: soi.to_string(),
            direction,
            weight,
        }
    }
}

/// The GO namespaces that are eligible for aggregation
///
/// Terms of a disabled category are excluded entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Categories {
    /// `biological_process`, enabled by default
    pub biological_process: bool,
    /// `molecular_activity`, enabled by default
    #[serde(alias = "molecular_function")]
    pub molecular_activity: bool,
    /// `cellular_component`, disabled by default
    pub cellular_component: bool,
}

impl Categories {
    /// All categories enabled
    pub fn all() -> Self {
        Self {
            biological_process: true,
            molecular_activity: true,
            cellular_component: true,
        }
    }

    /// Returns `true` if terms of the category are eligible
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::BiologicalProcess => self.biological_process,
            Category::MolecularActivity => self.molecular_activity,
            Category::CellularComponent => self.cellular_component,
        }
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            biological_process: true,
            molecular_activity: true,
            cellular_component: false,
        }
    }
}

/// Resolution of duplicate annotations of the same term, SOI and direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the highest weight
    #[default]
    Max,
    /// Add all weights, capped at `1.0`
    Sum,
    /// Keep the weight of the last annotation
    LastWins,
}

impl DuplicatePolicy {
    fn merge(&self, current: f64, new: f64) -> f64 {
        match self {
            DuplicatePolicy::Max => current.max(new),
            DuplicatePolicy::Sum => (current + new).min(1.0),
            DuplicatePolicy::LastWins => new,
        }
    }
}

/// Handling of SOI annotations with direction `0`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralDirectionPolicy {
    /// General annotations contribute to neither direction
    #[default]
    Exclude,
    /// General annotations contribute to both directions
    ///
    /// An annotation with an explicit direction for the same term and
    /// SOI takes precedence over the general one.
    Both,
}

/// The parsed, not yet validated SOI input of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoiModelInput {
    /// The target SOIs
    pub sois: Vec<Soi>,
    /// The curated annotations
    pub annotations: Vec<SoiAnnotation>,
    /// The eligible GO namespaces
    #[serde(default)]
    pub categories: Categories,
}

/// A set of GO terms, each with a weight
#[derive(Debug, Clone, Default)]
pub struct WeightedTerms {
    terms: GoGroup,
    weights: HashMap<GoTermId, f64>,
}

impl WeightedTerms {
    fn from_weights(weights: HashMap<GoTermId, f64>) -> Self {
        Self {
            terms: weights.keys().copied().collect(),
            weights,
        }
    }

    /// The GO terms of the set
    pub fn terms(&self) -> &GoGroup {
        &self.terms
    }

    /// The weight of `term`, `0.0` if it is not part of the set
    pub fn weight(&self, term: GoTermId) -> f64 {
        self.weights.get(&term).copied().unwrap_or_default()
    }

    /// The sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.terms.iter().map(|term| self.weight(term)).sum()
    }

    /// Returns the number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the set does not contain any terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A target SOI with its two weighted term buckets
#[derive(Debug, Clone)]
pub struct SoiTarget {
    soi: Soi,
    up: WeightedTerms,
    down: WeightedTerms,
}

impl SoiTarget {
    /// The SOI name
    pub fn name(&self) -> &str {
        &self.soi.name
    }

    /// The desired direction of regulation
    pub fn direction(&self) -> Direction {
        self.soi.direction
    }

    /// The SOI
    pub fn soi(&self) -> &Soi {
        &self.soi
    }

    /// The weighted terms that regulate the SOI in `direction`
    pub fn bucket(&self, direction: Direction) -> &WeightedTerms {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// The validated SOI model of a run
///
/// # Examples
///
/// ```
/// use gosoi::{Category, GoTermRecord, Ontology};
/// use gosoi::soi::{
///     AnnotationDirection, Direction, DuplicatePolicy, GeneralDirectionPolicy, Soi,
///     SoiAnnotation, SoiModel, SoiModelInput,
/// };
///
/// let ontology = Ontology::from_records(vec![
///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess),
///     GoTermRecord::new(2u32, "B", Category::BiologicalProcess).with_parent(1u32),
/// ]).unwrap();
///
/// let input = SoiModelInput {
///     sois: vec![Soi::new("angiogenesis", Direction::Up)],
///     annotations: vec![
///         SoiAnnotation::new(1u32, "angiogenesis", AnnotationDirection::Up, 0.5),
///         SoiAnnotation::new(2u32, "angiogenesis", AnnotationDirection::Down, 1.0),
///     ],
///     ..Default::default()
/// };
///
/// let model = SoiModel::new(
///     input,
///     &ontology,
///     DuplicatePolicy::Max,
///     GeneralDirectionPolicy::Exclude,
/// ).unwrap();
///
/// let soi = model.soi("angiogenesis").unwrap();
/// assert_eq!(soi.bucket(Direction::Up).len(), 1);
/// assert_eq!(soi.bucket(Direction::Down).total_weight(), 1.0);
/// assert_eq!(model.universe().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SoiModel {
    targets: Vec<SoiTarget>,
    universe: GoGroup,
    categories: Categories,
}

type MergeKey = (GoTermId, usize, AnnotationDirection);

impl SoiModel {
    /// Validates the input and builds the weighted term buckets
    ///
    /// # Errors
    ///
    /// - [`GoSoiError::NoTargetSoi`] if no SOI is declared
    /// - [`GoSoiError::DuplicateSoi`] if a SOI is declared twice
    /// - [`GoSoiError::UnknownSoi`] if an annotation names an undeclared SOI
    /// - [`GoSoiError::WeightOutOfRange`] if a weight is not within `[0, 1]`
    /// - [`GoSoiError::UnknownTerm`] if an annotated term is not part of the ontology
    pub fn new(
        input: SoiModelInput,
        ontology: &Ontology,
        duplicates: DuplicatePolicy,
        general: GeneralDirectionPolicy,
    ) -> GoSoiResult<Self> {
        let SoiModelInput {
            sois,
            annotations,
            categories,
        } = input;

        if sois.is_empty() {
            return Err(GoSoiError::NoTargetSoi);
        }
        let mut names: HashSet<&str> = HashSet::with_capacity(sois.len());
        for soi in &sois {
            if !names.insert(soi.name.as_str()) {
                return Err(GoSoiError::DuplicateSoi(soi.name.clone()));
            }
        }

        let soi_index = |name: &str| sois.iter().position(|soi| soi.name == name);

        let mut merged: HashMap<MergeKey, f64> = HashMap::new();
        let mut skipped: usize = 0;
        for annotation in &annotations {
            let Some(idx) = soi_index(&annotation.soi) else {
                return Err(GoSoiError::UnknownSoi {
                    term: annotation.term.to_string(),
                    soi: annotation.soi.clone(),
                });
            };
            if !(0.0..=1.0).contains(&annotation.weight) {
                return Err(GoSoiError::WeightOutOfRange {
                    term: annotation.term.to_string(),
                    soi: annotation.soi.clone(),
                    weight: annotation.weight,
                });
            }
            let term = GoTerm::try_new(ontology, annotation.term)?;

            if term.is_obsolete() {
                warn!(
                    "Ignoring obsolete term {} annotated to {}",
                    term.id(),
                    annotation.soi
                );
                skipped += 1;
                continue;
            }
            if !categories.is_enabled(term.category()) {
                debug!("Ignoring {} of disabled category {}", term.id(), term.category());
                skipped += 1;
                continue;
            }

            merged
                .entry((annotation.term, idx, annotation.direction))
                .and_modify(|weight| *weight = duplicates.merge(*weight, annotation.weight))
                .or_insert(annotation.weight);
        }

        let universe: GoGroup = merged.keys().map(|(term, _, _)| *term).collect();

        let mut buckets: Vec<[HashMap<GoTermId, f64>; 2]> =
            vec![[HashMap::new(), HashMap::new()]; sois.len()];
        for ((term, idx, direction), weight) in &merged {
            match direction {
                AnnotationDirection::Up => {
                    buckets[*idx][0].insert(*term, *weight);
                }
                AnnotationDirection::Down => {
                    buckets[*idx][1].insert(*term, *weight);
                }
                AnnotationDirection::General => (),
            }
        }
        if general == GeneralDirectionPolicy::Both {
            for ((term, idx, direction), weight) in &merged {
                if *direction == AnnotationDirection::General {
                    for bucket in buckets[*idx].iter_mut() {
                        bucket.entry(*term).or_insert(*weight);
                    }
                }
            }
        }

        let targets: Vec<SoiTarget> = sois
            .into_iter()
            .zip(buckets)
            .map(|(soi, [up, down])| SoiTarget {
                soi,
                up: WeightedTerms::from_weights(up),
                down: WeightedTerms::from_weights(down),
            })
            .collect();

        for target in &targets {
            debug!(
                "SOI {} ({}): {} terms up, {} terms down",
                target.name(),
                target.direction(),
                target.up.len(),
                target.down.len()
            );
        }
        info!(
            "SOI model with {} SOIs and {} eligible terms, {} annotations ignored",
            targets.len(),
            universe.len(),
            skipped
        );

        Ok(Self {
            targets,
            universe,
            categories,
        })
    }

    /// The target SOIs, in the declared order
    pub fn sois(&self) -> &[SoiTarget] {
        &self.targets
    }

    /// Returns the target SOI with the given name
    pub fn soi(&self, name: &str) -> Option<&SoiTarget> {
        self.targets.iter().find(|target| target.name() == name)
    }

    /// All eligible terms of the model, of any SOI and direction
    pub fn universe(&self) -> &GoGroup {
        &self.universe
    }

    /// The enabled GO namespaces
    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Returns `true` if annotations to `term` can be credited at all
    pub fn is_eligible(&self, term: &GoTerm) -> bool {
        !term.is_obsolete() && self.categories.is_enabled(term.category())
    }
}
