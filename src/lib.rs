#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
use std::num::ParseIntError;
use thiserror::Error;

pub mod aggregate;
pub mod annotations;
pub mod config;
pub mod engine;
pub mod evidence;
pub mod parser;
pub mod significance;
pub mod soi;
pub mod stats;
pub mod term;
mod ontology;

pub use config::Settings;
pub use engine::{Engine, GeneResult, ScoreTable};
pub use ontology::Ontology;
pub use term::{Category, GoGroup, GoTerm, GoTermId, GoTermRecord};

const DEFAULT_NUM_PARENTS: usize = 4;
const DEFAULT_NUM_ALL_PARENTS: usize = 30;
const DEFAULT_NUM_TERMS: usize = 50_000;

/// Main Error type for this crate
#[derive(Error, Debug)]
pub enum GoSoiError {
    /// The evidence code expression could not be parsed
    #[error("invalid evidence code expression `{expression}`: {reason}")]
    InvalidEvidenceExpression {
        /// The offending fragment of the expression
        expression: String,
        /// What is wrong with it
        reason: String,
    },
    /// The evidence group is not known
    #[error("unknown evidence code group `{0}`")]
    UnknownEvidenceGroup(String),
    /// The evidence code is not known
    #[error("unknown evidence code `{0}`")]
    UnknownEvidenceCode(String),
    /// An evidence code was listed under a group it does not belong to
    #[error("evidence code `{code}` does not belong to group `{group}`")]
    EvidenceCodeNotInGroup {
        /// The evidence code
        code: String,
        /// The group it was listed under
        group: String,
    },
    /// The same evidence code was both included and excluded
    #[error("evidence code `{0}` is both included and excluded")]
    ConflictingEvidenceCode(String),
    /// The same evidence group received contradicting defaults
    #[error("evidence group `{0}` is both included and excluded as a whole")]
    ConflictingEvidenceGroup(String),
    /// A SOI annotation weight is outside of `[0, 1]`
    #[error("weight {weight} of {term} for SOI `{soi}` is outside of [0, 1]")]
    WeightOutOfRange {
        /// The annotated GO term
        term: String,
        /// The SOI of the annotation
        soi: String,
        /// The invalid weight
        weight: f64,
    },
    /// A SOI annotation references a SOI that was not declared
    #[error("{term} is annotated to the undeclared SOI `{soi}`")]
    UnknownSoi {
        /// The annotated GO term
        term: String,
        /// The unknown SOI name
        soi: String,
    },
    /// The same SOI was declared twice
    #[error("SOI `{0}` is declared more than once")]
    DuplicateSoi(String),
    /// No target SOI was declared
    #[error("at least one target SOI is required")]
    NoTargetSoi,
    /// A GO term is not present in the ontology
    #[error("term {0} does not exist in the ontology")]
    UnknownTerm(String),
    /// A setting has an invalid value
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting {
        /// Name of the setting
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// A term references a parent that does not exist
    #[error("term {term} references the missing parent {parent}")]
    MalformedOntology {
        /// The child term
        term: String,
        /// The missing parent
        parent: String,
    },
    /// The ontology contains a cycle
    #[error("the ontology contains a cycle through {term}")]
    CyclicOntology {
        /// A term that is part of the cycle
        term: String,
    },
    /// A term id occurs more than once
    #[error("term {0} is defined more than once")]
    DuplicateTerm(String),
    /// A string is not a valid GO term id
    #[error("invalid GO term id `{0}`")]
    InvalidTermId(String),
    /// Failed to parse input data
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Failed to open a file
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// Failed to parse an integer
    #[error("unable to parse Integer")]
    ParseIntError,
}

impl GoSoiError {
    /// Returns `true` for errors caused by an invalid run configuration
    ///
    /// Configuration errors are fatal and abort before any scoring.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            GoSoiError::InvalidEvidenceExpression { .. }
                | GoSoiError::UnknownEvidenceGroup(_)
                | GoSoiError::UnknownEvidenceCode(_)
                | GoSoiError::EvidenceCodeNotInGroup { .. }
                | GoSoiError::ConflictingEvidenceCode(_)
                | GoSoiError::ConflictingEvidenceGroup(_)
                | GoSoiError::WeightOutOfRange { .. }
                | GoSoiError::UnknownSoi { .. }
                | GoSoiError::DuplicateSoi(_)
                | GoSoiError::NoTargetSoi
                | GoSoiError::UnknownTerm(_)
                | GoSoiError::InvalidSetting { .. }
        )
    }

    /// Returns `true` for errors caused by an invalid ontology graph
    pub fn is_ontology_error(&self) -> bool {
        matches!(
            self,
            GoSoiError::MalformedOntology { .. }
                | GoSoiError::CyclicOntology { .. }
                | GoSoiError::DuplicateTerm(_)
        )
    }
}

impl From<ParseIntError> for GoSoiError {
    fn from(_: ParseIntError) -> Self {
        GoSoiError::ParseIntError
    }
}

/// Shortcut for `Result<T, GoSoiError>`
pub type GoSoiResult<T> = Result<T, GoSoiError>;
