//! Run configuration
//!
//! All settings have defaults, so a configuration only has to list the
//! values that differ:
//!
//! ```
//! use gosoi::Settings;
//! use gosoi::stats::PValueTest;
//!
//! let settings = Settings::from_json(r#"{
//!     "pvalue": 0.01,
//!     "significance_test": "binomial",
//!     "indirect_annotations_max_depth": 3
//! }"#).unwrap();
//!
//! assert_eq!(settings.pvalue, 0.01);
//! assert_eq!(settings.significance_test, PValueTest::Binomial);
//! assert!(settings.include_indirect_annotations);
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::Propagation;
use crate::evidence::EvidenceFilter;
use crate::significance::DecisionPolicy;
use crate::soi::{DuplicatePolicy, GeneralDirectionPolicy};
use crate::stats::PValueTest;
use crate::{GoSoiError, GoSoiResult};

/// The default evidence code filter expression
pub const DEFAULT_EVIDENCE_CODES: &str = "experimental(~),phylogenetic(~),computational_analysis(~),author_statement(TAS),!author_statement(NAS),!curator_statement(~),!electronic(~)";

/// Settings of a scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Propagate annotations to ancestor terms
    pub include_indirect_annotations: bool,
    /// Maximum number of ancestor levels, negative means unlimited
    pub indirect_annotations_max_depth: i64,
    /// The evidence code filter expression, see [`crate::evidence`]
    pub evidence_codes: String,
    /// The significance threshold, must be in `(0, 1]`
    pub pvalue: f64,
    /// The test whose p-values decide about significance
    pub significance_test: PValueTest,
    /// Ignore the p-value of the opposite direction
    pub exclude_opposite_regulation_direction_check: bool,
    /// Handling of SOI annotations without direction
    pub general_direction_policy: GeneralDirectionPolicy,
    /// Handling of duplicate SOI annotations
    pub duplicate_annotation_policy: DuplicatePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_indirect_annotations: true,
            indirect_annotations_max_depth: -1,
            evidence_codes: DEFAULT_EVIDENCE_CODES.to_string(),
            pvalue: 0.05,
            significance_test: PValueTest::Fisher,
            exclude_opposite_regulation_direction_check: false,
            general_direction_policy: GeneralDirectionPolicy::Exclude,
            duplicate_annotation_policy: DuplicatePolicy::Max,
        }
    }
}

impl Settings {
    /// Parses and validates settings from JSON
    ///
    /// # Errors
    ///
    /// [`GoSoiError::InvalidSetting`] if the JSON is malformed or a value
    /// is out of range
    pub fn from_json(json: &str) -> GoSoiResult<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|err| GoSoiError::InvalidSetting {
                name: "settings",
                reason: err.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that all values are in range
    ///
    /// # Errors
    ///
    /// - [`GoSoiError::InvalidSetting`] if `pvalue` is not in `(0, 1]`
    /// - any error of [`EvidenceFilter::from_expression`]
    pub fn validate(&self) -> GoSoiResult<()> {
        if !(self.pvalue > 0.0 && self.pvalue <= 1.0) {
            return Err(GoSoiError::InvalidSetting {
                name: "pvalue",
                reason: format!("{} is not in (0, 1]", self.pvalue),
            });
        }
        self.evidence_filter()?;
        Ok(())
    }

    /// Compiles the evidence code expression
    ///
    /// # Errors
    ///
    /// Any error of [`EvidenceFilter::from_expression`]
    pub fn evidence_filter(&self) -> GoSoiResult<EvidenceFilter> {
        EvidenceFilter::from_expression(&self.evidence_codes)
    }

    /// The propagation of annotations to ancestors
    pub fn propagation(&self) -> Propagation {
        Propagation::new(
            self.include_indirect_annotations,
            self.indirect_annotations_max_depth,
        )
    }

    /// The significance decision rule
    pub fn decision_policy(&self) -> DecisionPolicy {
        DecisionPolicy {
            threshold: self.pvalue,
            test: self.significance_test,
            exclude_opposite: self.exclude_opposite_regulation_direction_check,
        }
    }
}
