//! Per-gene aggregation of direct and indirect SOI annotation hits
//!
//! A gene that is annotated to a GO term is implicitly annotated to every
//! ancestor of that term as well. The [`Aggregator`] expands the direct
//! annotations of a gene through the [`Ontology`] and intersects the
//! result with the SOI buckets of the [`SoiModel`]. The hits outside of
//! the buckets are kept as well, they form the rest of the gene's row
//! in the contingency table.
//!
//! Hits are kept as sets of GO terms, so a term that is reachable through
//! several paths (or both directly and indirectly) is credited only once.

use serde::Serialize;
use tracing::trace;

use crate::annotations::{Gene, GeneId};
use crate::soi::{Direction, SoiModel, SoiTarget, WeightedTerms};
use crate::term::{GoGroup, GoTerm, GoTermId};
use crate::Ontology;

/// Whether and how far annotations are propagated to ancestor terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Only direct annotations are counted
    DirectOnly,
    /// Annotations are propagated to ancestors
    Ancestors {
        /// Maximum distance of the credited ancestors, `None` for unlimited
        max_depth: Option<usize>,
    },
}

impl Propagation {
    /// Converts the run settings into a [`Propagation`]
    ///
    /// A negative `max_depth` means unlimited.
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::aggregate::Propagation;
    ///
    /// assert_eq!(Propagation::new(false, 3), Propagation::DirectOnly);
    /// assert_eq!(Propagation::new(true, -1), Propagation::Ancestors { max_depth: None });
    /// assert_eq!(Propagation::new(true, 2), Propagation::Ancestors { max_depth: Some(2) });
    /// ```
    pub fn new(include_indirect: bool, max_depth: i64) -> Self {
        if include_indirect {
            Propagation::Ancestors {
                max_depth: usize::try_from(max_depth).ok(),
            }
        } else {
            Propagation::DirectOnly
        }
    }

    /// Returns the ancestors of `term` that receive its annotations
    pub fn expand(&self, term: &GoTerm) -> GoGroup {
        match self {
            Propagation::DirectOnly => GoGroup::new(),
            Propagation::Ancestors { max_depth } => term.ancestors_within(*max_depth),
        }
    }
}

impl Default for Propagation {
    fn default() -> Self {
        Propagation::Ancestors { max_depth: None }
    }
}

/// The eligible terms that a gene hits
///
/// `direct` and `indirect` are disjoint: a term that is directly annotated
/// is never counted as indirect hit as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneHits {
    direct: GoGroup,
    indirect: GoGroup,
}

impl GeneHits {
    /// Directly annotated terms
    pub fn direct(&self) -> &GoGroup {
        &self.direct
    }

    /// Ancestors of the directly annotated terms
    pub fn indirect(&self) -> &GoGroup {
        &self.indirect
    }

    /// All hit terms
    pub fn all(&self) -> GoGroup {
        &self.direct | &self.indirect
    }

    /// The number of hit terms
    pub fn len(&self) -> usize {
        self.direct.len() + self.indirect.len()
    }

    /// Returns `true` if the gene does not hit any eligible term
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.indirect.is_empty()
    }
}

/// Number of hit terms and their summed weight
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    /// Number of distinct hit terms
    pub count: usize,
    /// Sum of the weights of the hit terms
    pub weight: f64,
}

impl Bucket {
    fn from_hits(hits: &GoGroup, terms: &WeightedTerms) -> Self {
        hits.iter()
            .filter(|term| terms.terms().contains(term))
            .fold(Bucket::default(), |bucket, term| Bucket {
                count: bucket.count + 1,
                weight: bucket.weight + terms.weight(term),
            })
    }
}

/// Direct and indirect hits of a gene for one SOI direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DirectionCounts {
    /// Hits of directly annotated terms
    pub direct: Bucket,
    /// Hits of propagated terms
    pub indirect: Bucket,
}

impl DirectionCounts {
    /// Combined direct and indirect hits
    pub fn total(&self) -> Bucket {
        Bucket {
            count: self.direct.count + self.indirect.count,
            weight: self.direct.weight + self.indirect.weight,
        }
    }
}

/// Hits of a gene for both directions of one SOI
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SoiCounts {
    /// `+` bucket
    #[serde(rename = "+")]
    pub up: DirectionCounts,
    /// `-` bucket
    #[serde(rename = "-")]
    pub down: DirectionCounts,
}

impl SoiCounts {
    /// Returns the counts of `direction`
    pub fn get(&self, direction: Direction) -> &DirectionCounts {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// The aggregated hits of one gene for all SOIs
#[derive(Debug, Clone)]
pub struct GeneRecord {
    gene: GeneId,
    hits: GeneHits,
    counts: Vec<(String, SoiCounts)>,
}

impl GeneRecord {
    /// The gene
    pub fn gene(&self) -> &GeneId {
        &self.gene
    }

    /// All eligible terms the gene hits
    pub fn hits(&self) -> &GeneHits {
        &self.hits
    }

    /// The counts of the named SOI
    pub fn counts(&self, soi: &str) -> Option<&SoiCounts> {
        self.counts
            .iter()
            .find(|(name, _)| name == soi)
            .map(|(_, counts)| counts)
    }

    /// Iterates the counts of all SOIs, in the order of the model
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SoiCounts)> {
        self.counts.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    /// Returns `true` if the gene hits no term of any SOI bucket
    pub fn is_empty(&self) -> bool {
        self.counts
            .iter()
            .all(|(_, counts)| counts.up.total().count == 0 && counts.down.total().count == 0)
    }
}

/// Expands gene annotations and counts the hits per SOI and direction
///
/// # Examples
///
/// ```
/// use gosoi::{Category, GoTermRecord, Ontology};
/// use gosoi::aggregate::{Aggregator, Propagation};
/// use gosoi::annotations::{Annotation, AnnotationIndex, GeneId};
/// use gosoi::evidence::EvidenceFilter;
/// use gosoi::soi::*;
///
/// let ontology = Ontology::from_records(vec![
///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess),
///     GoTermRecord::new(2u32, "B", Category::BiologicalProcess).with_parent(1u32),
///     GoTermRecord::new(3u32, "C", Category::BiologicalProcess).with_parent(2u32),
/// ]).unwrap();
///
/// let model = SoiModel::new(
///     SoiModelInput {
///         sois: vec![Soi::new("X", Direction::Up)],
///         annotations: vec![
///             SoiAnnotation::new(1u32, "X", AnnotationDirection::Up, 1.0),
///             SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 0.5),
///             SoiAnnotation::new(3u32, "X", AnnotationDirection::Up, 0.5),
///         ],
///         ..Default::default()
///     },
///     &ontology,
///     DuplicatePolicy::Max,
///     GeneralDirectionPolicy::Exclude,
/// ).unwrap();
///
/// let index = AnnotationIndex::from_annotations(
///     vec![Annotation::new("g1", 3u32, "IDA")],
///     &EvidenceFilter::accept_all(),
/// );
///
/// let aggregator = Aggregator::new(&ontology, &model, Propagation::default());
/// let gene = index.gene(&GeneId::from("g1")).unwrap();
/// let counts = aggregator.annotation_counts(gene, model.soi("X").unwrap());
///
/// assert_eq!(counts.up.direct.count, 1);
/// assert_eq!(counts.up.indirect.count, 2);
/// assert_eq!(counts.up.total().weight, 2.0);
/// assert_eq!(counts.down.total().count, 0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    ontology: &'a Ontology,
    model: &'a SoiModel,
    propagation: Propagation,
}

impl<'a> Aggregator<'a> {
    /// Constructs a new [`Aggregator`]
    pub fn new(ontology: &'a Ontology, model: &'a SoiModel, propagation: Propagation) -> Self {
        Self {
            ontology,
            model,
            propagation,
        }
    }

    /// The propagation rule
    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Returns the eligible terms that `gene` hits directly and indirectly
    ///
    /// All eligible terms are kept, not only the terms of the SOI model,
    /// since the hits outside of a bucket are part of the contingency table.
    /// Annotations to unknown, obsolete or disabled terms are ignored,
    /// they are neither credited nor propagated.
    pub fn gene_hits(&self, gene: &Gene) -> GeneHits {
        let mut direct = GoGroup::new();
        let mut expanded = GoGroup::new();

        for term_id in gene.go_terms() {
            let Some(term) = self.ontology.term(term_id) else {
                trace!("{} of {} is not part of the ontology", term_id, gene.id());
                continue;
            };
            if !self.model.is_eligible(&term) {
                continue;
            }
            direct.insert(term_id);
            for ancestor in &self.propagation.expand(&term) {
                if self.is_eligible(ancestor) {
                    expanded.insert(ancestor);
                }
            }
        }

        let indirect = &expanded - &direct;
        GeneHits { direct, indirect }
    }

    fn is_eligible(&self, term_id: GoTermId) -> bool {
        self.ontology
            .term(term_id)
            .map_or(false, |term| self.model.is_eligible(&term))
    }

    /// Returns the direct and indirect hits of `gene` for both directions of `soi`
    pub fn annotation_counts(&self, gene: &Gene, soi: &SoiTarget) -> SoiCounts {
        Self::counts_from_hits(&self.gene_hits(gene), soi)
    }

    /// Same as [`Aggregator::annotation_counts`] for already calculated hits
    pub fn counts_from_hits(hits: &GeneHits, soi: &SoiTarget) -> SoiCounts {
        let direction = |direction: Direction| {
            let terms = soi.bucket(direction);
            DirectionCounts {
                direct: Bucket::from_hits(hits.direct(), terms),
                indirect: Bucket::from_hits(hits.indirect(), terms),
            }
        };
        SoiCounts {
            up: direction(Direction::Up),
            down: direction(Direction::Down),
        }
    }

    /// Aggregates the hits of `gene` for every SOI of the model
    pub fn gene_record(&self, gene: &Gene) -> GeneRecord {
        let hits = self.gene_hits(gene);
        let counts = self
            .model
            .sois()
            .iter()
            .map(|soi| (soi.name().to_string(), Self::counts_from_hits(&hits, soi)))
            .collect();
        GeneRecord {
            gene: gene.id().clone(),
            hits,
            counts,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotations::{Annotation, AnnotationIndex};
    use crate::evidence::EvidenceFilter;
    use crate::soi::{
        AnnotationDirection, Categories, DuplicatePolicy, GeneralDirectionPolicy, Soi,
        SoiAnnotation, SoiModelInput,
    };
    use crate::{Category, GoTermRecord};

    /// ```text
    ///      1
    ///     / \
    ///    2   3
    ///     \ /
    ///      4      5 (cellular_component)
    /// ```
    fn ontology() -> Ontology {
        Ontology::from_records(vec![
            GoTermRecord::new(1u32, "root", Category::BiologicalProcess),
            GoTermRecord::new(2u32, "left", Category::BiologicalProcess).with_parent(1u32),
            GoTermRecord::new(3u32, "right", Category::BiologicalProcess).with_parent(1u32),
            GoTermRecord::new(4u32, "leaf", Category::BiologicalProcess)
                .with_parent(2u32)
                .with_parent(3u32),
            GoTermRecord::new(5u32, "cc", Category::CellularComponent),
        ])
        .unwrap()
    }

    fn model(ontology: &Ontology, categories: Categories) -> SoiModel {
        SoiModel::new(
            SoiModelInput {
                sois: vec![Soi::new("X", Direction::Up)],
                annotations: vec![
                    SoiAnnotation::new(1u32, "X", AnnotationDirection::Up, 1.0),
                    SoiAnnotation::new(2u32, "X", AnnotationDirection::Down, 0.5),
                    SoiAnnotation::new(4u32, "X", AnnotationDirection::Up, 0.25),
                    SoiAnnotation::new(5u32, "X", AnnotationDirection::Up, 1.0),
                ],
                categories,
            },
            ontology,
            DuplicatePolicy::Max,
            GeneralDirectionPolicy::Exclude,
        )
        .unwrap()
    }

    fn index(annotations: Vec<Annotation>) -> AnnotationIndex {
        AnnotationIndex::from_annotations(annotations, &EvidenceFilter::accept_all())
    }

    #[test]
    fn diamond_is_counted_once() {
        let ont = ontology();
        let model = model(&ont, Categories::default());
        let index = index(vec![Annotation::new("g", 4u32, "IDA")]);
        let gene = index.gene(&"g".into()).unwrap();

        let aggregator = Aggregator::new(&ont, &model, Propagation::default());
        let hits = aggregator.gene_hits(gene);
        let direct: Vec<u32> = hits.direct().iter().map(|id| id.as_u32()).collect();
        let indirect: Vec<u32> = hits.indirect().iter().map(|id| id.as_u32()).collect();
        assert_eq!(direct, vec![4]);
        // term 1 is reachable through 2 and 3 but counted once,
        // term 3 is not part of the model but still a hit
        assert_eq!(indirect, vec![1, 2, 3]);

        let counts = aggregator.annotation_counts(gene, model.soi("X").unwrap());
        assert_eq!(counts.up.direct, Bucket { count: 1, weight: 0.25 });
        assert_eq!(counts.up.indirect, Bucket { count: 1, weight: 1.0 });
        assert_eq!(counts.down.indirect, Bucket { count: 1, weight: 0.5 });
        assert_eq!(counts.down.direct.count, 0);
    }

    #[test]
    fn direct_and_indirect_are_disjoint() {
        let ont = ontology();
        let model = model(&ont, Categories::default());
        let index = index(vec![
            Annotation::new("g", 4u32, "IDA"),
            Annotation::new("g", 1u32, "IDA"),
        ]);
        let gene = index.gene(&"g".into()).unwrap();
        let hits = Aggregator::new(&ont, &model, Propagation::default()).gene_hits(gene);
        assert!(hits.direct().contains(&1u32.into()));
        assert!(!hits.indirect().contains(&1u32.into()));
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn depth_limit() {
        let ont = ontology();
        let model = model(&ont, Categories::default());
        let index = index(vec![Annotation::new("g", 4u32, "IDA")]);
        let gene = index.gene(&"g".into()).unwrap();

        let direct_only = Aggregator::new(&ont, &model, Propagation::new(false, -1));
        assert!(direct_only.gene_hits(gene).indirect().is_empty());

        let one_level = Aggregator::new(&ont, &model, Propagation::new(true, 1));
        let indirect: Vec<u32> = one_level
            .gene_hits(gene)
            .indirect()
            .iter()
            .map(|id| id.as_u32())
            .collect();
        assert_eq!(indirect, vec![2, 3]);
    }

    #[test]
    fn disabled_category_is_never_counted() {
        let ont = ontology();
        let index = index(vec![Annotation::new("g", 5u32, "IDA")]);
        let gene = index.gene(&"g".into()).unwrap();

        let without_cc = model(&ont, Categories::default());
        let record = Aggregator::new(&ont, &without_cc, Propagation::default()).gene_record(gene);
        assert!(record.hits().is_empty());
        assert!(record.is_empty());

        let with_cc = model(&ont, Categories::all());
        let record = Aggregator::new(&ont, &with_cc, Propagation::default()).gene_record(gene);
        assert_eq!(record.counts("X").unwrap().up.direct.count, 1);
    }
}
