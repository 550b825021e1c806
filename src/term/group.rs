use std::collections::HashSet;
use std::ops::{BitAnd, BitOr, Sub};

use crate::term::GoTermId;

/// A set of [`GoTermId`] representing a group of GO terms
///
/// Each term can occur only once in the group. The ids are kept sorted,
/// so membership checks are binary searches.
///
/// This group is used e.g. for the parents, ancestors and descendants of a
/// term and for the term sets of the SOI buckets
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GoGroup {
    ids: Vec<GoTermId>,
}

impl GoGroup {
    /// Constructs a new, empty [`GoGroup`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`GoGroup`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Returns `true` if the group contains no [`GoTermId`]s
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the number of [`GoTermId`]s in the group
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Adds a new [`GoTermId`] to the group
    ///
    /// Returns whether the `GoTermId` was newly inserted. That is:
    ///
    /// - If the group did not previously contain this `GoTermId`, true is returned.
    /// - If the group already contained this `GoTermId`, false is returned.
    pub fn insert<I: Into<GoTermId>>(&mut self, id: I) -> bool {
        let id = id.into();
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                self.ids.insert(idx, id);
                true
            }
        }
    }

    /// Adds a new [`GoTermId`] to the end of the group
    ///
    /// # Note
    ///
    /// This method will not check if the `GoTermId` already exists
    /// and will not keep the sort order. Callers must only push ids
    /// in strictly increasing order.
    fn insert_unchecked(&mut self, id: GoTermId) {
        self.ids.push(id);
    }

    /// Returns `true` if the group contains the [`GoTermId`]
    pub fn contains(&self, id: &GoTermId) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    /// Returns an Iterator of the [`GoTermId`]s inside the group
    pub fn iter(&self) -> GoTermIds<'_> {
        GoTermIds::new(self.ids.iter())
    }

    /// Returns the ids as a sorted slice
    pub fn as_slice(&self) -> &[GoTermId] {
        &self.ids
    }
}

impl From<HashSet<GoTermId>> for GoGroup {
    fn from(s: HashSet<GoTermId>) -> Self {
        s.into_iter().collect()
    }
}

impl From<Vec<GoTermId>> for GoGroup {
    fn from(mut ids: Vec<GoTermId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

impl FromIterator<GoTermId> for GoGroup {
    fn from_iter<T: IntoIterator<Item = GoTermId>>(iter: T) -> Self {
        GoGroup::from(iter.into_iter().collect::<Vec<GoTermId>>())
    }
}

impl<'a> IntoIterator for &'a GoGroup {
    type Item = GoTermId;

    type IntoIter = GoTermIds<'a>;

    fn into_iter(self) -> GoTermIds<'a> {
        GoTermIds::new(self.ids.iter())
    }
}

/// An iterator over [`GoTermId`]s
pub struct GoTermIds<'a> {
    inner: std::slice::Iter<'a, GoTermId>,
}

impl<'a> GoTermIds<'a> {
    fn new(inner: std::slice::Iter<'a, GoTermId>) -> Self {
        Self { inner }
    }
}

impl Iterator for GoTermIds<'_> {
    type Item = GoTermId;
    fn next(&mut self) -> Option<GoTermId> {
        self.inner.next().copied()
    }
}

impl BitOr for &GoGroup {
    type Output = GoGroup;

    fn bitor(self, rhs: &GoGroup) -> GoGroup {
        let mut group = GoGroup::with_capacity(self.len() + rhs.len());
        let mut left = self.ids.iter().peekable();
        let mut right = rhs.ids.iter().peekable();
        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) if l < r => left.next(),
                (Some(l), Some(r)) if l > r => right.next(),
                (Some(_), Some(_)) => {
                    right.next();
                    left.next()
                }
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            if let Some(id) = next {
                group.insert_unchecked(*id);
            }
        }
        group
    }
}

impl BitAnd for &GoGroup {
    type Output = GoGroup;

    fn bitand(self, rhs: &GoGroup) -> GoGroup {
        let (large, small) = if self.len() > rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut group = GoGroup::with_capacity(small.len());

        for id in &small.ids {
            if large.contains(id) {
                group.insert_unchecked(*id);
            }
        }
        group
    }
}

impl Sub for &GoGroup {
    type Output = GoGroup;

    fn sub(self, rhs: &GoGroup) -> GoGroup {
        let mut group = GoGroup::with_capacity(self.len());
        for id in &self.ids {
            if !rhs.contains(id) {
                group.insert_unchecked(*id);
            }
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(ids: &[u32]) -> GoGroup {
        ids.iter().map(|id| GoTermId::from(*id)).collect()
    }

    #[test]
    fn test_gogroup_iter() {
        let mut group = GoGroup::new();
        group.insert(3u32);
        group.insert(1u32);
        group.insert(2u32);
        assert!(!group.insert(2u32));

        let ids: Vec<GoTermId> = group.iter().collect();
        assert_eq!(ids, vec![GoTermId::from(1u32), 2u32.into(), 3u32.into()]);
    }

    #[test]
    fn test_from_unsorted_vec() {
        let group = GoGroup::from(vec![5u32.into(), 1u32.into(), 5u32.into()]);
        assert_eq!(group.as_slice(), &[GoTermId::from(1u32), 5u32.into()]);
    }

    #[test]
    fn test_bitor() {
        let result = &group(&[1, 2, 3]) | &group(&[1, 2, 4, 5]);
        assert_eq!(result, group(&[1, 2, 3, 4, 5]));

        let result = &GoGroup::new() | &group(&[7]);
        assert_eq!(result, group(&[7]));
    }

    #[test]
    fn test_bitand() {
        let result = &group(&[1, 2, 3]) & &group(&[2, 4, 5, 1]);
        assert_eq!(result, group(&[1, 2]));
    }

    #[test]
    fn test_sub() {
        let result = &group(&[1, 2, 3]) - &group(&[2, 9]);
        assert_eq!(result, group(&[1, 3]));
    }
}
