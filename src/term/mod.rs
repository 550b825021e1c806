//! [`GoTerm`]s are the nodes of the Gene Ontology
//!
//! This module contains the [`GoTermId`] identifier, the [`GoGroup`] set of
//! term ids, the [`Category`] (GO namespace) of a term and [`GoTermRecord`],
//! the owned term data that loaders hand over to [`crate::Ontology::from_records`].

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GoSoiError, GoSoiResult};

mod goterm;
mod gotermid;
mod group;
pub(crate) mod internal;

pub use goterm::GoTerm;
pub use gotermid::GoTermId;
pub use group::{GoGroup, GoTermIds};

/// The direct parents of a term, most terms have less than 4
pub type GoParents = SmallVec<[GoTermId; crate::DEFAULT_NUM_PARENTS]>;

/// The GO namespace a term belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// `biological_process`
    BiologicalProcess,
    /// `molecular_function`, also known as `molecular_activity`
    #[serde(alias = "molecular_function")]
    MolecularActivity,
    /// `cellular_component`
    CellularComponent,
}

impl FromStr for Category {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        match s.trim() {
            "biological_process" => Ok(Category::BiologicalProcess),
            "molecular_function" | "molecular_activity" => Ok(Category::MolecularActivity),
            "cellular_component" => Ok(Category::CellularComponent),
            other => Err(GoSoiError::InvalidInput(format!(
                "unknown GO namespace `{other}`"
            ))),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::BiologicalProcess => "biological_process",
            Category::MolecularActivity => "molecular_activity",
            Category::CellularComponent => "cellular_component",
        };
        f.write_str(name)
    }
}

/// Owned data of a single GO term, as provided by an ontology source
///
/// Records are turned into the [`crate::Ontology`] graph, which checks
/// that every parent exists and that there are no cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct GoTermRecord {
    /// The unique id of the term
    pub id: GoTermId,
    /// The name (label) of the term
    pub name: String,
    /// The definition of the term
    pub description: Option<String>,
    /// The namespace of the term
    pub category: Category,
    /// The ids of the direct `is_a` parents
    pub parents: GoParents,
    /// Obsolete terms are kept in the graph but never credited
    pub obsolete: bool,
}

impl GoTermRecord {
    /// Constructs a new, non-obsolete record without parents or description
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::{Category, GoTermRecord};
    ///
    /// let record = GoTermRecord::new(1525u32, "angiogenesis", Category::BiologicalProcess)
    ///     .with_parent(1568u32);
    /// assert_eq!(record.parents.len(), 1);
    /// ```
    pub fn new<I: Into<GoTermId>>(id: I, name: &str, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            description: None,
            category,
            parents: GoParents::new(),
            obsolete: false,
        }
    }

    /// Adds a direct parent to the record
    #[must_use]
    pub fn with_parent<I: Into<GoTermId>>(mut self, parent: I) -> Self {
        let parent = parent.into();
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    /// Sets the definition of the term
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}
