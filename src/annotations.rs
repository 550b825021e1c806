//! Genes and their direct GO annotations
//!
//! The [`AnnotationIndex`] is the gene to GO term multimap that the
//! aggregation consults. It is built once from an external annotation
//! source (e.g. a parsed GAF file) and is read-only afterwards.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::evidence::{EvidenceCode, EvidenceFilter};
use crate::term::GoTermId;

mod gene;
pub use gene::{Gene, GeneId};

/// A single (gene, GO term, evidence code) annotation
///
/// The evidence code is kept as provided by the source, unknown codes
/// are rejected by the [`EvidenceFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// The annotated gene
    pub gene: GeneId,
    /// The GO term
    pub term: GoTermId,
    /// The evidence code, e.g. `IDA`
    pub evidence: String,
}

impl Annotation {
    /// Constructs a new annotation
    pub fn new<G: Into<GeneId>, T: Into<GoTermId>>(gene: G, term: T, evidence: &str) -> Self {
        Self {
            gene: gene.into(),
            term: term.into(),
            evidence: evidence.trim().to_string(),
        }
    }
}

/// Gene to GO term index of all accepted annotations
///
/// # Examples
///
/// ```
/// use gosoi::annotations::{Annotation, AnnotationIndex, GeneId};
/// use gosoi::evidence::EvidenceFilter;
///
/// let filter = EvidenceFilter::from_expression("!electronic(~)").unwrap();
/// let index = AnnotationIndex::from_annotations(
///     vec![
///         Annotation::new("TP53", 1u32, "IDA"),
///         Annotation::new("TP53", 2u32, "IEA"),
///         Annotation::new("MDM2", 2u32, "IEA"),
///     ],
///     &filter,
/// );
///
/// assert_eq!(index.len(), 2);
/// assert_eq!(index.gene(&GeneId::from("TP53")).unwrap().go_terms().len(), 1);
/// // all annotations of MDM2 are rejected, but the gene is kept
/// assert!(index.gene(&GeneId::from("MDM2")).unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    genes: BTreeMap<GeneId, Gene>,
}

impl AnnotationIndex {
    /// Builds the index from all annotations that pass the evidence filter
    ///
    /// Genes whose annotations are all rejected stay in the index without
    /// any GO terms.
    pub fn from_annotations<I: IntoIterator<Item = Annotation>>(
        annotations: I,
        filter: &EvidenceFilter,
    ) -> Self {
        let mut index = AnnotationIndex::default();
        let mut accepted: usize = 0;
        let mut rejected: usize = 0;

        for annotation in annotations {
            let gene = index
                .genes
                .entry(annotation.gene.clone())
                .or_insert_with(|| Gene::new(annotation.gene.clone()));

            match EvidenceCode::from_str(&annotation.evidence) {
                Ok(code) if filter.accepts(code) => {
                    gene.add_annotation(annotation.term, code);
                    accepted += 1;
                }
                Ok(_) => {
                    gene.add_rejected();
                    rejected += 1;
                }
                Err(_) => {
                    trace!(
                        "Unknown evidence code {} for {}",
                        annotation.evidence,
                        annotation.gene
                    );
                    gene.add_rejected();
                    rejected += 1;
                }
            }
        }

        info!(
            "Indexed {} genes with {} accepted annotations",
            index.genes.len(),
            accepted
        );
        debug!("Evidence filter rejected {} annotations", rejected);
        index
    }

    /// Returns the number of genes
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the index does not contain any genes
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Returns the [`Gene`] with the provided id
    pub fn gene(&self, gene_id: &GeneId) -> Option<&Gene> {
        self.genes.get(gene_id)
    }

    /// Returns an iterator of all [`Gene`]s, ordered by id
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }
}
