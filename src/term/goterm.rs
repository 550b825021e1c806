use crate::term::internal::GoTermInternal;
use crate::term::{Category, GoGroup, GoTermId};
use crate::{GoSoiError, GoSoiResult, Ontology};

/// The `GoTerm` represents a single term of the Gene Ontology
///
/// It is a cheap, borrowed view into the [`Ontology`] and provides
/// the (cached) ancestors and descendants of the term.
#[derive(Debug, Clone, Copy)]
pub struct GoTerm<'a> {
    term: &'a GoTermInternal,
    ontology: &'a Ontology,
}

impl<'a> GoTerm<'a> {
    /// Constructs a new [`GoTerm`]
    ///
    /// # Errors
    ///
    /// If the given [`GoTermId`] does not match an existing term
    /// it returns [`GoSoiError::UnknownTerm`]
    pub fn try_new(ontology: &'a Ontology, term: GoTermId) -> GoSoiResult<GoTerm<'a>> {
        let internal = ontology
            .get(term)
            .ok_or_else(|| GoSoiError::UnknownTerm(term.to_string()))?;
        Ok(GoTerm::new(ontology, internal))
    }

    pub(crate) fn new(ontology: &'a Ontology, term: &'a GoTermInternal) -> GoTerm<'a> {
        GoTerm { term, ontology }
    }

    /// Returns the [`GoTermId`] of the term
    ///
    /// e.g.: `GO:0001525`
    pub fn id(&self) -> GoTermId {
        *self.term.id()
    }

    /// Returns the name of the term
    ///
    /// e.g.: `angiogenesis`
    pub fn name(&self) -> &'a str {
        self.term.name()
    }

    /// Returns the definition of the term, if available
    pub fn description(&self) -> Option<&'a str> {
        self.term.description()
    }

    /// Returns the namespace of the term
    pub fn category(&self) -> Category {
        self.term.category()
    }

    /// Returns `true` if the term is marked as obsolete
    pub fn is_obsolete(&self) -> bool {
        self.term.obsolete()
    }

    /// Returns the ids of the direct parents
    pub fn parent_ids(&self) -> &'a [GoTermId] {
        self.term.parents()
    }

    /// Returns the ids of the direct children
    pub fn child_ids(&self) -> &'a GoGroup {
        self.term.children()
    }

    /// Returns the ids of all direct and indirect parents, excluding the term itself
    pub fn ancestor_ids(&self) -> &'a GoGroup {
        self.term.all_parents()
    }

    /// Returns the ids of all direct and indirect children, excluding the term itself
    pub fn descendant_ids(&self) -> &'a GoGroup {
        self.term.all_children()
    }

    /// Returns the ancestors that are at most `max_depth` edges away
    ///
    /// The distance to an ancestor is the length of the shortest path.
    /// `None` means unlimited and returns all ancestors.
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::{Category, GoTermRecord, Ontology};
    ///
    /// let ontology = Ontology::from_records(vec![
    ///     GoTermRecord::new(1u32, "A", Category::BiologicalProcess),
    ///     GoTermRecord::new(2u32, "B", Category::BiologicalProcess).with_parent(1u32),
    ///     GoTermRecord::new(3u32, "C", Category::BiologicalProcess).with_parent(2u32),
    /// ]).unwrap();
    ///
    /// let term = ontology.term(3u32).unwrap();
    /// assert_eq!(term.ancestors_within(Some(1)).len(), 1);
    /// assert_eq!(term.ancestors_within(None).len(), 2);
    /// ```
    pub fn ancestors_within(&self, max_depth: Option<usize>) -> GoGroup {
        match max_depth {
            None => self.term.all_parents().clone(),
            Some(depth) => self
                .term
                .all_parents()
                .iter()
                .zip(self.term.parent_distances())
                .filter(|(_, distance)| usize::try_from(**distance).map_or(false, |d| d <= depth))
                .map(|(id, _)| id)
                .collect(),
        }
    }

    /// Returns `true` if `other` is an ancestor of the term
    pub fn is_descendant_of(&self, other: &GoTermId) -> bool {
        self.term.all_parents().contains(other)
    }

    /// Returns `true` if `other` is a descendant of the term
    pub fn is_ancestor_of(&self, other: &GoTermId) -> bool {
        self.term.all_children().contains(other)
    }

    /// Returns an iterator of the direct parents as [`GoTerm`]s
    pub fn parents(&self) -> impl Iterator<Item = GoTerm<'a>> + 'a {
        let ontology = self.ontology;
        self.term
            .parents()
            .iter()
            .filter_map(move |id| ontology.term(*id))
    }
}

impl PartialEq for GoTerm<'_> {
    fn eq(&self, other: &GoTerm) -> bool {
        self.term.id() == other.term.id()
    }
}

impl Eq for GoTerm<'_> {}
