use crate::term::internal::GoTermInternal;
use crate::GoTermId;
use std::collections::hash_map::{Entry, Values};
use std::collections::HashMap;

pub(crate) struct Arena {
    terms: HashMap<GoTermId, GoTermInternal>,
}

impl Arena {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Inserts the term and returns `false` if the id was already present
    ///
    /// An already present term is not replaced.
    pub fn insert(&mut self, term: GoTermInternal) -> bool {
        match self.terms.entry(*term.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(term);
                true
            }
        }
    }

    pub fn get(&self, id: GoTermId) -> Option<&GoTermInternal> {
        self.terms.get(&id)
    }

    pub fn get_mut(&mut self, id: GoTermId) -> Option<&mut GoTermInternal> {
        self.terms.get_mut(&id)
    }

    pub fn values(&self) -> Values<'_, GoTermId, GoTermInternal> {
        self.terms.values()
    }

    /// Returns all term ids, sorted
    pub fn keys(&self) -> Vec<GoTermId> {
        let mut keys: Vec<GoTermId> = self.terms.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            terms: HashMap::with_capacity(crate::DEFAULT_NUM_TERMS),
        }
    }
}
