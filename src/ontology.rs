use core::fmt::Debug;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use tracing::{debug, info};

use crate::parser;
use crate::term::internal::GoTermInternal;
use crate::term::{GoGroup, GoTerm, GoTermId, GoTermRecord};
use crate::{GoSoiError, GoSoiResult};

mod termarena;
use termarena::Arena;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// `Ontology` is the in-memory graph of all GO terms
///
/// The [`Ontology`] holds every [`GoTerm`] together with its parent and
/// child relations. It is built once per run and is read-only afterwards,
/// so it can be shared by reference between scoring threads.
///
/// All transitive relations (ancestors with their minimum distance and
/// descendants) are computed when the ontology is built, so lookups during
/// scoring never walk the graph again.
///
/// # Examples
///
/// ```
/// use gosoi::{Category, GoTermId, GoTermRecord, Ontology};
///
/// let ontology = Ontology::from_records(vec![
///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess),
///     GoTermRecord::new(2u32, "B", Category::BiologicalProcess).with_parent(1u32),
///     GoTermRecord::new(3u32, "C", Category::BiologicalProcess).with_parent(2u32),
/// ]).unwrap();
///
/// assert_eq!(ontology.len(), 3);
/// let ancestors = ontology.ancestors(3u32).unwrap();
/// assert!(ancestors.contains(&GoTermId::from(1u32)));
/// assert!(ancestors.contains(&GoTermId::from(2u32)));
/// assert!(!ancestors.contains(&GoTermId::from(3u32)));
///
/// assert_eq!(ontology.descendants(1u32).unwrap().len(), 2);
/// ```
///
/// # Layout
///
/// ```mermaid
/// erDiagram
///     ONTOLOGY ||--|{ GOTERM : contains
///     GOTERM ||--o{ GOTERM : is_a
///     GOTERM {
///         GoTermId id
///         str name
///         Category category
///         GoParents parents
///         GoGroup ancestors
///         GoGroup descendants
///     }
/// ```
#[derive(Default)]
pub struct Ontology {
    go_terms: Arena,
}

impl Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ontology with {} terms", self.go_terms.len())
    }
}

/// Public API of the Ontology
impl Ontology {
    /// Builds the ontology from individual term records
    ///
    /// # Errors
    ///
    /// - a term id occurs twice: [`GoSoiError::DuplicateTerm`]
    /// - a parent id is not part of the records: [`GoSoiError::MalformedOntology`]
    /// - the parent relations contain a cycle: [`GoSoiError::CyclicOntology`]
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::{Category, GoTermRecord, Ontology};
    ///
    /// let result = Ontology::from_records(vec![
    ///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess).with_parent(2u32),
    /// ]);
    /// assert!(result.unwrap_err().is_ontology_error());
    /// ```
    pub fn from_records<I: IntoIterator<Item = GoTermRecord>>(records: I) -> GoSoiResult<Self> {
        let mut ont = Ontology::default();
        for record in records {
            let id = record.id;
            if !ont.go_terms.insert(GoTermInternal::from_record(record)) {
                return Err(GoSoiError::DuplicateTerm(id.to_string()));
            }
        }
        ont.link_children()?;
        ont.check_acyclic()?;
        ont.create_cache();
        info!("Built ontology with {} terms", ont.len());
        Ok(ont)
    }

    /// Reads an OBO file and builds the ontology from its `[Term]` stanzas
    ///
    /// # Errors
    ///
    /// - the file cannot be opened: [`GoSoiError::CannotOpenFile`]
    /// - the file is not valid OBO: [`GoSoiError::InvalidInput`]
    /// - any error of [`Ontology::from_records`]
    pub fn from_obo<P: AsRef<Path>>(path: P) -> GoSoiResult<Self> {
        let records = parser::go_obo::read_obo_file(path)?;
        Ontology::from_records(records)
    }

    /// Returns the number of terms in the ontology
    pub fn len(&self) -> usize {
        self.go_terms.len()
    }

    /// Returns `true` if the ontology does not contain any terms
    pub fn is_empty(&self) -> bool {
        self.go_terms.len() == 0
    }

    /// Returns the [`GoTerm`] of the provided id
    ///
    /// If no such term is present, `None` is returned
    pub fn term<I: Into<GoTermId>>(&self, term_id: I) -> Option<GoTerm<'_>> {
        self.get(term_id.into()).map(|term| GoTerm::new(self, term))
    }

    /// Returns all terms reachable by following parent edges, excluding the term itself
    ///
    /// # Errors
    ///
    /// [`GoSoiError::UnknownTerm`] if the term is not part of the ontology
    pub fn ancestors<I: Into<GoTermId>>(&self, term_id: I) -> GoSoiResult<&GoGroup> {
        let id = term_id.into();
        self.get(id)
            .map(GoTermInternal::all_parents)
            .ok_or_else(|| GoSoiError::UnknownTerm(id.to_string()))
    }

    /// Returns all terms reachable by following child edges, excluding the term itself
    ///
    /// # Errors
    ///
    /// [`GoSoiError::UnknownTerm`] if the term is not part of the ontology
    pub fn descendants<I: Into<GoTermId>>(&self, term_id: I) -> GoSoiResult<&GoGroup> {
        let id = term_id.into();
        self.get(id)
            .map(GoTermInternal::all_children)
            .ok_or_else(|| GoSoiError::UnknownTerm(id.to_string()))
    }

    /// Returns an iterator of all [`GoTerm`]s, in no particular order
    pub fn terms(&self) -> impl Iterator<Item = GoTerm<'_>> {
        self.go_terms.values().map(move |term| GoTerm::new(self, term))
    }
}

/// Crate-only functions for building the Ontology
impl Ontology {
    pub(crate) fn get(&self, term_id: GoTermId) -> Option<&GoTermInternal> {
        self.go_terms.get(term_id)
    }

    /// Registers every term as child of its parents
    fn link_children(&mut self) -> GoSoiResult<()> {
        let mut links: Vec<(GoTermId, GoTermId)> = Vec::new();
        for term in self.go_terms.values() {
            for parent in term.parents() {
                if self.go_terms.get(*parent).is_none() {
                    return Err(GoSoiError::MalformedOntology {
                        term: term.id().to_string(),
                        parent: parent.to_string(),
                    });
                }
                links.push((*parent, *term.id()));
            }
        }
        for (parent, child) in links {
            if let Some(parent) = self.go_terms.get_mut(parent) {
                parent.add_child(child);
            }
        }
        Ok(())
    }

    /// Depth-first traversal along the parent edges with an on-stack marker
    ///
    /// Reaching a term that is still on the stack means the graph has a cycle.
    fn check_acyclic(&self) -> GoSoiResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            OnStack,
            Done,
        }

        let mut marks: HashMap<GoTermId, Mark> = HashMap::with_capacity(self.len());

        for root in self.go_terms.keys() {
            if marks.contains_key(&root) {
                continue;
            }
            // (term, index of the next parent to visit)
            let mut stack: Vec<(GoTermId, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::OnStack);

            while let Some((id, next_parent)) = stack.last_mut() {
                let parents = self.get(*id).map_or(&[][..], |term| term.parents().as_slice());
                if let Some(parent) = parents.get(*next_parent) {
                    *next_parent += 1;
                    match marks.get(parent) {
                        Some(Mark::OnStack) => {
                            return Err(GoSoiError::CyclicOntology {
                                term: parent.to_string(),
                            })
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(*parent, Mark::OnStack);
                            stack.push((*parent, 0));
                        }
                    }
                } else {
                    marks.insert(*id, Mark::Done);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Caches the ancestors (with their minimum distance) and descendants of every term
    ///
    /// Must only be called on an acyclic graph.
    fn create_cache(&mut self) {
        let term_ids = self.go_terms.keys();
        let mut descendants: HashMap<GoTermId, Vec<GoTermId>> = HashMap::new();

        for id in &term_ids {
            let ancestors = self.shortest_distances_to_ancestors(*id);
            for ancestor in ancestors.keys() {
                descendants.entry(*ancestor).or_default().push(*id);
            }
            if let Some(term) = self.go_terms.get_mut(*id) {
                term.set_all_parents(ancestors.into_iter().collect());
            }
        }

        for (id, children) in descendants {
            if let Some(term) = self.go_terms.get_mut(id) {
                term.set_all_children(GoGroup::from(children));
            }
        }
        debug!("Cached ancestors and descendants of {} terms", term_ids.len());
    }

    /// Breadth-first search along the parent edges
    fn shortest_distances_to_ancestors(&self, term_id: GoTermId) -> BTreeMap<GoTermId, u32> {
        let mut distances: BTreeMap<GoTermId, u32> = BTreeMap::new();
        let mut queue: VecDeque<(GoTermId, u32)> = VecDeque::new();
        queue.push_back((term_id, 0));

        while let Some((id, distance)) = queue.pop_front() {
            let Some(term) = self.get(id) else {
                continue;
            };
            for parent in term.parents() {
                if *parent != term_id && !distances.contains_key(parent) {
                    distances.insert(*parent, distance + 1);
                    queue.push_back((*parent, distance + 1));
                }
            }
        }
        distances
    }
}
