use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceCode;
use crate::term::{GoGroup, GoTermId};

/// A unique identifier for a [`Gene`]
///
/// Depending on the annotation source this is e.g. a UniProtKB accession
/// or a gene symbol, so it is kept as a string.
#[derive(Clone, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneId {
    inner: String,
}

impl GeneId {
    /// Returns the id as `&str`
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for GeneId {
    fn from(value: &str) -> Self {
        GeneId {
            inner: value.trim().to_string(),
        }
    }
}

impl From<String> for GeneId {
    fn from(value: String) -> Self {
        GeneId::from(value.as_str())
    }
}

impl AsRef<str> for GeneId {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

/// A single gene with its accepted direct GO annotations
///
/// Only annotations that passed the evidence filter are part of
/// the gene. Genes are created through
/// [`AnnotationIndex::from_annotations`](`crate::annotations::AnnotationIndex::from_annotations`),
/// which ensures that each gene exists only once.
#[derive(Default, Debug, Clone)]
pub struct Gene {
    id: GeneId,
    terms: GoGroup,
    evidence: Vec<(GoTermId, EvidenceCode)>,
    rejected: usize,
}

impl Gene {
    /// Initializes a new Gene without annotations
    pub fn new(id: GeneId) -> Gene {
        Gene {
            id,
            ..Default::default()
        }
    }

    /// The unique [`GeneId`] of the gene
    pub fn id(&self) -> &GeneId {
        &self.id
    }

    /// The directly annotated GO terms
    pub fn go_terms(&self) -> &GoGroup {
        &self.terms
    }

    /// Returns `true` if the gene has no accepted annotation
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The evidence codes supporting the annotation to `term`
    pub fn evidence_for(&self, term: GoTermId) -> impl Iterator<Item = EvidenceCode> + '_ {
        self.evidence
            .iter()
            .filter(move |(id, _)| *id == term)
            .map(|(_, code)| *code)
    }

    /// The number of annotations that were rejected by the evidence filter
    pub fn rejected_annotations(&self) -> usize {
        self.rejected
    }

    pub(crate) fn add_annotation(&mut self, term: GoTermId, evidence: EvidenceCode) {
        self.terms.insert(term);
        if !self.evidence.contains(&(term, evidence)) {
            self.evidence.push((term, evidence));
        }
    }

    pub(crate) fn add_rejected(&mut self) {
        self.rejected += 1;
    }
}

impl PartialEq for Gene {
    fn eq(&self, other: &Gene) -> bool {
        self.id == other.id
    }
}

impl Eq for Gene {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gene_id_from_str() {
        let id = GeneId::from(" P04637 ");
        assert_eq!(id.as_str(), "P04637");
        assert_eq!(id.to_string(), "P04637");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"P04637\"");
    }

    #[test]
    fn duplicate_annotations() {
        let mut gene = Gene::new("TP53".into());
        gene.add_annotation(1u32.into(), EvidenceCode::Ida);
        gene.add_annotation(1u32.into(), EvidenceCode::Ida);
        gene.add_annotation(1u32.into(), EvidenceCode::Imp);
        assert_eq!(gene.go_terms().len(), 1);
        assert_eq!(gene.evidence_for(1u32.into()).count(), 2);
        assert_eq!(gene.evidence_for(2u32.into()).count(), 0);
    }
}
