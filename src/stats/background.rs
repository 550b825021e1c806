//! Background population counts for the statistical tests

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::aggregate::Aggregator;
use crate::annotations::AnnotationIndex;
use crate::term::{GoGroup, GoTermId};

/// Annotation counts of the whole population for a set of GO terms `T`
///
/// Counts are (gene, term) hits: a gene that hits three terms of `T`
/// contributes three hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackgroundCounts {
    /// Hits of the population in `T`
    pub target: u64,
    /// Hits of the population in all eligible terms, including `T`
    pub total: u64,
}

impl BackgroundCounts {
    /// Hits of the population outside of `T`
    pub fn other(&self) -> u64 {
        self.total.saturating_sub(self.target)
    }

    /// Returns `true` if no gene of the population hits the term set
    pub fn is_empty(&self) -> bool {
        self.target == 0
    }
}

/// Provides the background population counts of a set of GO terms
///
/// The scorers do not care where the counts come from, e.g. from
/// scanning the full annotation source or from an online batch query.
pub trait BackgroundSource {
    /// Returns the number of population hits in `terms`
    fn term_hits(&self, terms: &GoGroup) -> u64;

    /// Returns the number of population hits in all eligible terms
    fn total_hits(&self) -> u64;

    /// Returns the background counts for `terms`
    fn population_background(&self, terms: &GoGroup) -> BackgroundCounts {
        BackgroundCounts {
            target: self.term_hits(terms),
            total: self.total_hits(),
        }
    }
}

/// Background counts derived from an [`AnnotationIndex`]
///
/// Every gene of the index is expanded with the same propagation rules
/// as the scored genes, so the background is comparable to the gene counts.
#[derive(Debug, Default)]
pub struct PropagatedBackground {
    term_genes: HashMap<GoTermId, u64>,
    total: u64,
    population: usize,
}

impl PropagatedBackground {
    /// Scans all genes of the `index`
    pub fn new(index: &AnnotationIndex, aggregator: &Aggregator) -> Self {
        let background: Self = index
            .genes()
            .map(|gene| aggregator.gene_hits(gene).all())
            .collect();
        info!(
            "Background population of {} genes with {} hits in {} terms",
            background.population(),
            background.total,
            background.term_genes.len()
        );
        background
    }

    /// The number of genes that hit at least one term
    pub fn population(&self) -> usize {
        self.population
    }

    /// The number of genes that hit `term`
    pub fn genes_of_term(&self, term: GoTermId) -> u64 {
        self.term_genes.get(&term).copied().unwrap_or_default()
    }
}

impl FromIterator<GoGroup> for PropagatedBackground {
    /// Builds the background from the hit terms of every gene
    fn from_iter<T: IntoIterator<Item = GoGroup>>(iter: T) -> Self {
        let mut background = PropagatedBackground::default();
        for hits in iter {
            if hits.is_empty() {
                continue;
            }
            for term in &hits {
                *background.term_genes.entry(term).or_default() += 1;
                background.total += 1;
            }
            background.population += 1;
        }
        background
    }
}

impl BackgroundSource for PropagatedBackground {
    fn term_hits(&self, terms: &GoGroup) -> u64 {
        terms.iter().map(|term| self.genes_of_term(term)).sum()
    }

    fn total_hits(&self) -> u64 {
        self.total
    }
}

/// Externally supplied per-term gene counts
///
/// # Examples
///
/// ```
/// use gosoi::{GoGroup, GoTermId};
/// use gosoi::stats::background::{BackgroundSource, PrecomputedBackground};
///
/// let background = PrecomputedBackground::new(500_000)
///     .with_term(1u32, 150)
///     .with_term(2u32, 30);
///
/// let terms: GoGroup = [1u32, 2, 3].into_iter().map(GoTermId::from).collect();
/// let counts = background.population_background(&terms);
/// assert_eq!(counts.target, 180);
/// assert_eq!(counts.other(), 499_820);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrecomputedBackground {
    term_genes: HashMap<GoTermId, u64>,
    total: u64,
}

impl PrecomputedBackground {
    /// Constructs an empty background with `total` (gene, term) hits
    pub fn new(total: u64) -> Self {
        Self {
            term_genes: HashMap::new(),
            total,
        }
    }

    /// Sets the number of genes annotated to `term`
    #[must_use]
    pub fn with_term<I: Into<GoTermId>>(mut self, term: I, genes: u64) -> Self {
        self.term_genes.insert(term.into(), genes);
        self
    }
}

impl BackgroundSource for PrecomputedBackground {
    fn term_hits(&self, terms: &GoGroup) -> u64 {
        terms
            .iter()
            .filter_map(|term| self.term_genes.get(&term))
            .fold(0u64, |sum, genes| sum.saturating_add(*genes))
    }

    fn total_hits(&self) -> u64 {
        self.total
    }
}
