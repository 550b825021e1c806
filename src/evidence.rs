//! Evidence codes and the evidence filter
//!
//! Every annotation of a gene to a GO term is qualified by an
//! [`EvidenceCode`]. The codes are organised in [`EvidenceGroup`]s and the
//! [`EvidenceFilter`] decides which annotations are used at all, based on
//! an expression such as
//!
//! ```text
//! experimental(~),author_statement(TAS),!author_statement(NAS),!electronic(~)
//! ```
//!
//! Each comma-separated item names a group, optionally prefixed with `!`:
//!
//! | Item           | Listed codes      | Group default |
//! |----------------|-------------------|---------------|
//! | `group(~)`     | -                 | include       |
//! | `!group(~)`    | -                 | exclude       |
//! | `group(A,B)`   | A, B included     | exclude       |
//! | `!group(A,B)`  | A, B excluded     | include       |
//!
//! Explicitly listed codes always override the default of their group.
//! Groups that are not mentioned at all are fully included.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::{GoSoiError, GoSoiResult};

/// The evidence code of a single gene annotation
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvidenceCode {
    Exp,
    Ida,
    Ipi,
    Imp,
    Igi,
    Iep,
    Htp,
    Hda,
    Hmp,
    Hgi,
    Hep,
    Iba,
    Ibd,
    Ikr,
    Ird,
    Iss,
    Iso,
    Isa,
    Ism,
    Igc,
    Rca,
    Tas,
    Nas,
    Ic,
    Nd,
    Iea,
}

impl EvidenceCode {
    /// Returns the code as used in annotation files, e.g. `IDA`
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceCode::Exp => "EXP",
            EvidenceCode::Ida => "IDA",
            EvidenceCode::Ipi => "IPI",
            EvidenceCode::Imp => "IMP",
            EvidenceCode::Igi => "IGI",
            EvidenceCode::Iep => "IEP",
            EvidenceCode::Htp => "HTP",
            EvidenceCode::Hda => "HDA",
            EvidenceCode::Hmp => "HMP",
            EvidenceCode::Hgi => "HGI",
            EvidenceCode::Hep => "HEP",
            EvidenceCode::Iba => "IBA",
            EvidenceCode::Ibd => "IBD",
            EvidenceCode::Ikr => "IKR",
            EvidenceCode::Ird => "IRD",
            EvidenceCode::Iss => "ISS",
            EvidenceCode::Iso => "ISO",
            EvidenceCode::Isa => "ISA",
            EvidenceCode::Ism => "ISM",
            EvidenceCode::Igc => "IGC",
            EvidenceCode::Rca => "RCA",
            EvidenceCode::Tas => "TAS",
            EvidenceCode::Nas => "NAS",
            EvidenceCode::Ic => "IC",
            EvidenceCode::Nd => "ND",
            EvidenceCode::Iea => "IEA",
        }
    }

    /// Returns the group that the code belongs to
    pub fn group(&self) -> EvidenceGroup {
        match self {
            EvidenceCode::Exp
            | EvidenceCode::Ida
            | EvidenceCode::Ipi
            | EvidenceCode::Imp
            | EvidenceCode::Igi
            | EvidenceCode::Iep
            | EvidenceCode::Htp
            | EvidenceCode::Hda
            | EvidenceCode::Hmp
            | EvidenceCode::Hgi
            | EvidenceCode::Hep => EvidenceGroup::Experimental,
            EvidenceCode::Iba | EvidenceCode::Ibd | EvidenceCode::Ikr | EvidenceCode::Ird => {
                EvidenceGroup::Phylogenetic
            }
            EvidenceCode::Iss
            | EvidenceCode::Iso
            | EvidenceCode::Isa
            | EvidenceCode::Ism
            | EvidenceCode::Igc
            | EvidenceCode::Rca => EvidenceGroup::ComputationalAnalysis,
            EvidenceCode::Tas | EvidenceCode::Nas => EvidenceGroup::AuthorStatement,
            EvidenceCode::Ic | EvidenceCode::Nd => EvidenceGroup::CuratorStatement,
            EvidenceCode::Iea => EvidenceGroup::Electronic,
        }
    }
}

impl FromStr for EvidenceCode {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        let code = s.trim();
        EvidenceGroup::ALL
            .iter()
            .flat_map(|group| group.codes())
            .find(|candidate| candidate.as_str() == code)
            .copied()
            .ok_or_else(|| GoSoiError::UnknownEvidenceCode(code.to_string()))
    }
}

impl Display for EvidenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named groups of evidence codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvidenceGroup {
    /// Inferred from experiments, including high throughput
    Experimental,
    /// Inferred from phylogenetic analysis
    Phylogenetic,
    /// Inferred from sequence or structural similarity and other computations
    ComputationalAnalysis,
    /// Traceable and non-traceable author statements
    AuthorStatement,
    /// Inferred by curator, or no biological data available
    CuratorStatement,
    /// Inferred from electronic annotation
    Electronic,
}

impl EvidenceGroup {
    /// All evidence groups
    pub const ALL: [EvidenceGroup; 6] = [
        EvidenceGroup::Experimental,
        EvidenceGroup::Phylogenetic,
        EvidenceGroup::ComputationalAnalysis,
        EvidenceGroup::AuthorStatement,
        EvidenceGroup::CuratorStatement,
        EvidenceGroup::Electronic,
    ];

    /// Returns the name of the group as used in filter expressions
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceGroup::Experimental => "experimental",
            EvidenceGroup::Phylogenetic => "phylogenetic",
            EvidenceGroup::ComputationalAnalysis => "computational_analysis",
            EvidenceGroup::AuthorStatement => "author_statement",
            EvidenceGroup::CuratorStatement => "curator_statement",
            EvidenceGroup::Electronic => "electronic",
        }
    }

    /// Returns all codes of the group
    pub fn codes(&self) -> &'static [EvidenceCode] {
        match self {
            EvidenceGroup::Experimental => &[
                EvidenceCode::Exp,
                EvidenceCode::Ida,
                EvidenceCode::Ipi,
                EvidenceCode::Imp,
                EvidenceCode::Igi,
                EvidenceCode::Iep,
                EvidenceCode::Htp,
                EvidenceCode::Hda,
                EvidenceCode::Hmp,
                EvidenceCode::Hgi,
                EvidenceCode::Hep,
            ],
            EvidenceGroup::Phylogenetic => &[
                EvidenceCode::Iba,
                EvidenceCode::Ibd,
                EvidenceCode::Ikr,
                EvidenceCode::Ird,
            ],
            EvidenceGroup::ComputationalAnalysis => &[
                EvidenceCode::Iss,
                EvidenceCode::Iso,
                EvidenceCode::Isa,
                EvidenceCode::Ism,
                EvidenceCode::Igc,
                EvidenceCode::Rca,
            ],
            EvidenceGroup::AuthorStatement => &[EvidenceCode::Tas, EvidenceCode::Nas],
            EvidenceGroup::CuratorStatement => &[EvidenceCode::Ic, EvidenceCode::Nd],
            EvidenceGroup::Electronic => &[EvidenceCode::Iea],
        }
    }
}

impl FromStr for EvidenceGroup {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        let name = s.trim();
        EvidenceGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == name)
            .ok_or_else(|| GoSoiError::UnknownEvidenceGroup(name.to_string()))
    }
}

impl Display for EvidenceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The codes an [`EvidenceRule`] applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// `~`, the group as a whole
    WholeGroup,
    /// An explicit list of codes
    Codes(Vec<EvidenceCode>),
}

/// A single item of an evidence filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceRule {
    /// The group of the item
    pub group: EvidenceGroup,
    /// `true` if the item is prefixed with `!`
    pub exclude: bool,
    /// Whole group or explicit codes
    pub target: RuleTarget,
}

impl EvidenceRule {
    /// Parses a single item, e.g. `!curator_statement(ND)`
    fn parse(item: &str) -> GoSoiResult<Self> {
        let invalid = |reason: &str| GoSoiError::InvalidEvidenceExpression {
            expression: item.to_string(),
            reason: reason.to_string(),
        };

        let (exclude, rest) = match item.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, item),
        };

        let Some((group, codes)) = rest.split_once('(') else {
            return Err(invalid("expected `group(...)`"));
        };
        let Some(codes) = codes.trim_end().strip_suffix(')') else {
            return Err(invalid("missing closing parenthesis"));
        };
        if codes.contains('(') || codes.contains(')') {
            return Err(invalid("nested parentheses"));
        }
        let group = EvidenceGroup::from_str(group)?;

        let target = match codes.trim() {
            "" => return Err(invalid("no evidence codes given")),
            "~" => RuleTarget::WholeGroup,
            list => {
                let mut parsed = Vec::new();
                for code in list.split(',') {
                    if code.trim().is_empty() {
                        return Err(invalid("empty evidence code"));
                    }
                    let code = EvidenceCode::from_str(code)?;
                    if code.group() != group {
                        return Err(GoSoiError::EvidenceCodeNotInGroup {
                            code: code.to_string(),
                            group: group.to_string(),
                        });
                    }
                    parsed.push(code);
                }
                RuleTarget::Codes(parsed)
            }
        };

        Ok(EvidenceRule {
            group,
            exclude,
            target,
        })
    }

    /// The default that the rule sets for its group
    fn group_default(&self) -> bool {
        match self.target {
            RuleTarget::WholeGroup => !self.exclude,
            RuleTarget::Codes(_) => self.exclude,
        }
    }
}

/// Splits the expression at every comma outside of parentheses
fn split_items(expression: &str) -> GoSoiResult<Vec<&str>> {
    let mut items = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (idx, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    GoSoiError::InvalidEvidenceExpression {
                        expression: expression.to_string(),
                        reason: "unbalanced parentheses".to_string(),
                    }
                })?;
            }
            ',' if depth == 0 => {
                items.push(expression[start..idx].trim());
                start = idx + 1;
            }
            _ => (),
        }
    }
    if depth != 0 {
        return Err(GoSoiError::InvalidEvidenceExpression {
            expression: expression.to_string(),
            reason: "unbalanced parentheses".to_string(),
        });
    }
    items.push(expression[start..].trim());

    if items.iter().any(|item| item.is_empty()) {
        return Err(GoSoiError::InvalidEvidenceExpression {
            expression: expression.to_string(),
            reason: "empty item".to_string(),
        });
    }
    Ok(items)
}

/// Compiled predicate deciding which evidence codes are accepted
///
/// The filter is built once per run and is read-only afterwards.
///
/// # Examples
///
/// ```
/// use gosoi::evidence::{EvidenceCode, EvidenceFilter};
///
/// let filter = EvidenceFilter::from_expression("experimental(~),!curator_statement(ND)").unwrap();
///
/// assert!(filter.accepts(EvidenceCode::Ida));
/// assert!(filter.accepts(EvidenceCode::Ic));
/// assert!(!filter.accepts(EvidenceCode::Nd));
/// assert!(filter.accepts_str("IEA"));
/// assert!(!filter.accepts_str("XYZ"));
/// ```
#[derive(Debug, Clone)]
pub struct EvidenceFilter {
    rules: Vec<EvidenceRule>,
    accepted: HashMap<EvidenceCode, bool>,
}

impl EvidenceFilter {
    /// Returns a filter that accepts every evidence code
    pub fn accept_all() -> Self {
        let accepted = EvidenceGroup::ALL
            .iter()
            .flat_map(|group| group.codes())
            .map(|code| (*code, true))
            .collect();
        Self {
            rules: Vec::new(),
            accepted,
        }
    }

    /// Parses and compiles an evidence filter expression
    ///
    /// An empty expression accepts every code.
    ///
    /// # Errors
    ///
    /// - [`GoSoiError::InvalidEvidenceExpression`] for syntax errors
    /// - [`GoSoiError::UnknownEvidenceGroup`] / [`GoSoiError::UnknownEvidenceCode`]
    /// - [`GoSoiError::EvidenceCodeNotInGroup`] if a code is listed under the wrong group
    /// - [`GoSoiError::ConflictingEvidenceCode`] if a code is both included and excluded
    /// - [`GoSoiError::ConflictingEvidenceGroup`] if a group is both included and
    ///   excluded as a whole and the conflict affects at least one code
    pub fn from_expression(expression: &str) -> GoSoiResult<Self> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Ok(Self::accept_all());
        }
        let rules = split_items(expression)?
            .into_iter()
            .map(EvidenceRule::parse)
            .collect::<GoSoiResult<Vec<EvidenceRule>>>()?;
        Self::from_rules(rules)
    }

    /// Compiles a list of already parsed rules
    ///
    /// # Errors
    ///
    /// Same conflict errors as [`EvidenceFilter::from_expression`]
    pub fn from_rules(rules: Vec<EvidenceRule>) -> GoSoiResult<Self> {
        let mut explicit: HashMap<EvidenceCode, bool> = HashMap::new();
        let mut defaults: HashMap<EvidenceGroup, bool> = HashMap::new();
        let mut conflicting_groups: Vec<EvidenceGroup> = Vec::new();

        for rule in &rules {
            let default = rule.group_default();
            match defaults.insert(rule.group, default) {
                Some(previous) if previous != default => conflicting_groups.push(rule.group),
                _ => (),
            }

            if let RuleTarget::Codes(codes) = &rule.target {
                for code in codes {
                    match explicit.insert(*code, !rule.exclude) {
                        Some(previous) if previous == rule.exclude => {
                            return Err(GoSoiError::ConflictingEvidenceCode(code.to_string()))
                        }
                        _ => (),
                    }
                }
            }
        }

        for group in conflicting_groups {
            if !group.codes().iter().all(|code| explicit.contains_key(code)) {
                return Err(GoSoiError::ConflictingEvidenceGroup(group.to_string()));
            }
        }

        let accepted: HashMap<EvidenceCode, bool> = EvidenceGroup::ALL
            .iter()
            .flat_map(|group| group.codes())
            .map(|code| {
                let accept = explicit
                    .get(code)
                    .or_else(|| defaults.get(&code.group()))
                    .copied()
                    .unwrap_or(true);
                (*code, accept)
            })
            .collect();

        debug!(
            "Evidence filter accepts {} of {} codes",
            accepted.values().filter(|accept| **accept).count(),
            accepted.len()
        );

        Ok(Self { rules, accepted })
    }

    /// Returns `true` if annotations with the evidence code are used
    pub fn accepts(&self, code: EvidenceCode) -> bool {
        self.accepted.get(&code).copied().unwrap_or(true)
    }

    /// Same as [`EvidenceFilter::accepts`] for a raw code string
    ///
    /// Unknown codes are never accepted.
    pub fn accepts_str(&self, code: &str) -> bool {
        EvidenceCode::from_str(code).map_or(false, |code| self.accepts(code))
    }

    /// Returns the parsed rules, in the order of the expression
    pub fn rules(&self) -> &[EvidenceRule] {
        &self.rules
    }

    /// Returns all accepted codes, sorted
    pub fn accepted_codes(&self) -> Vec<EvidenceCode> {
        let mut codes: Vec<EvidenceCode> = self
            .accepted
            .iter()
            .filter(|(_, accept)| **accept)
            .map(|(code, _)| *code)
            .collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for EvidenceFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl FromStr for EvidenceFilter {
    type Err = GoSoiError;
    fn from_str(s: &str) -> GoSoiResult<Self> {
        Self::from_expression(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DEFAULT: &str = "experimental(~),phylogenetic(~),computational_analysis(~),author_statement(TAS),!author_statement(NAS),!curator_statement(~),!electronic(~)";

    #[test]
    fn experimental_without_nd() {
        let filter = EvidenceFilter::from_expression("experimental(~),!curator_statement(ND)").unwrap();
        for code in EvidenceGroup::Experimental.codes() {
            assert!(filter.accepts(*code), "{code}");
        }
        assert!(!filter.accepts(EvidenceCode::Nd));
        assert!(filter.accepts(EvidenceCode::Ic));
        // unmentioned groups
        assert!(filter.accepts(EvidenceCode::Iea));
        assert!(filter.accepts(EvidenceCode::Tas));
    }

    #[test]
    fn default_expression() {
        let filter = EvidenceFilter::from_expression(DEFAULT).unwrap();
        assert!(filter.accepts(EvidenceCode::Exp));
        assert!(filter.accepts(EvidenceCode::Iba));
        assert!(filter.accepts(EvidenceCode::Iss));
        assert!(filter.accepts(EvidenceCode::Tas));
        assert!(!filter.accepts(EvidenceCode::Nas));
        assert!(!filter.accepts(EvidenceCode::Ic));
        assert!(!filter.accepts(EvidenceCode::Nd));
        assert!(!filter.accepts(EvidenceCode::Iea));
        assert_eq!(filter.rules().len(), 7);
    }

    #[test]
    fn only_listed_codes() {
        let filter = EvidenceFilter::from_expression("experimental(IDA, IMP)").unwrap();
        assert!(filter.accepts(EvidenceCode::Ida));
        assert!(filter.accepts(EvidenceCode::Imp));
        assert!(!filter.accepts(EvidenceCode::Exp));
        assert!(filter.accepts(EvidenceCode::Iea));
    }

    #[test]
    fn all_except_listed() {
        let filter = EvidenceFilter::from_expression("!experimental(HTP,HDA)").unwrap();
        assert!(!filter.accepts(EvidenceCode::Htp));
        assert!(!filter.accepts(EvidenceCode::Hda));
        assert!(filter.accepts(EvidenceCode::Exp));
    }

    #[test]
    fn explicit_code_overrides_group() {
        let filter = EvidenceFilter::from_expression("!curator_statement(~),curator_statement(IC)");
        // `!g(~)` excludes the group, `g(IC)` sets the same default and includes IC
        let filter = filter.unwrap();
        assert!(filter.accepts(EvidenceCode::Ic));
        assert!(!filter.accepts(EvidenceCode::Nd));
    }

    #[test]
    fn empty_expression_accepts_all() {
        let filter = EvidenceFilter::from_expression("  ").unwrap();
        assert_eq!(filter.accepted_codes().len(), 26);
        assert!(filter.rules().is_empty());
    }

    #[test]
    fn conflicting_code() {
        let err = EvidenceFilter::from_expression("experimental(IDA),!experimental(IDA)").unwrap_err();
        assert!(matches!(err, GoSoiError::ConflictingEvidenceCode(code) if code == "IDA"));
    }

    #[test]
    fn conflicting_group() {
        let err = EvidenceFilter::from_expression("electronic(~),!electronic(~)").unwrap_err();
        assert!(matches!(err, GoSoiError::ConflictingEvidenceGroup(group) if group == "electronic"));

        let err = EvidenceFilter::from_expression("experimental(~),experimental(IDA)").unwrap_err();
        assert!(matches!(err, GoSoiError::ConflictingEvidenceGroup(_)));
    }

    #[test]
    fn syntax_errors() {
        for expression in [
            "experimental",
            "experimental(~",
            "experimental(~)),",
            "experimental()",
            "experimental(~),,electronic(~)",
            "experimental(IDA,)",
        ] {
            let err = EvidenceFilter::from_expression(expression).unwrap_err();
            assert!(err.is_configuration_error(), "{expression}: {err}");
        }
    }

    #[test]
    fn unknown_names() {
        assert!(matches!(
            EvidenceFilter::from_expression("lab(~)").unwrap_err(),
            GoSoiError::UnknownEvidenceGroup(_)
        ));
        assert!(matches!(
            EvidenceFilter::from_expression("experimental(XYZ)").unwrap_err(),
            GoSoiError::UnknownEvidenceCode(_)
        ));
        assert!(matches!(
            EvidenceFilter::from_expression("experimental(IEA)").unwrap_err(),
            GoSoiError::EvidenceCodeNotInGroup { .. }
        ));
    }
}
