use crate::term::{Category, GoGroup, GoParents, GoTermId, GoTermRecord};
use crate::DEFAULT_NUM_ALL_PARENTS;

#[derive(Debug)]
pub(crate) struct GoTermInternal {
    id: GoTermId,
    name: String,
    description: Option<String>,
    category: Category,
    obsolete: bool,
    parents: GoParents,
    children: GoGroup,
    all_parents: GoGroup,
    /// minimum number of edges to each entry of `all_parents`, same order
    parent_distances: Vec<u32>,
    all_children: GoGroup,
}

impl GoTermInternal {
    pub fn from_record(record: GoTermRecord) -> GoTermInternal {
        GoTermInternal {
            id: record.id,
            name: record.name,
            description: record.description,
            category: record.category,
            obsolete: record.obsolete,
            parents: record.parents,
            children: GoGroup::default(),
            all_parents: GoGroup::with_capacity(DEFAULT_NUM_ALL_PARENTS),
            parent_distances: Vec::with_capacity(DEFAULT_NUM_ALL_PARENTS),
            all_children: GoGroup::default(),
        }
    }

    pub fn id(&self) -> &GoTermId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn obsolete(&self) -> bool {
        self.obsolete
    }

    pub fn parents(&self) -> &GoParents {
        &self.parents
    }

    pub fn children(&self) -> &GoGroup {
        &self.children
    }

    pub fn all_parents(&self) -> &GoGroup {
        &self.all_parents
    }

    pub fn parent_distances(&self) -> &[u32] {
        &self.parent_distances
    }

    pub fn all_children(&self) -> &GoGroup {
        &self.all_children
    }

    pub fn add_child(&mut self, child_id: GoTermId) {
        self.children.insert(child_id);
    }

    /// Sets the cached ancestors, `ancestors` must be sorted by id
    pub fn set_all_parents(&mut self, ancestors: Vec<(GoTermId, u32)>) {
        let (ids, distances): (Vec<GoTermId>, Vec<u32>) = ancestors.into_iter().unzip();
        self.all_parents = GoGroup::from(ids);
        self.parent_distances = distances;
    }

    pub fn set_all_children(&mut self, descendants: GoGroup) {
        self.all_children = descendants;
    }
}

impl PartialEq for GoTermInternal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GoTermInternal {}
