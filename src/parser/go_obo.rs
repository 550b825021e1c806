use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::term::{Category, GoTermId, GoTermRecord};
use crate::{GoSoiError, GoSoiResult};

/// Reads all `[Term]` stanzas of an OBO file
///
/// # Errors
///
/// - [`GoSoiError::CannotOpenFile`] if the file cannot be opened
/// - [`GoSoiError::InvalidInput`] if a stanza is malformed
pub fn read_obo_file<P: AsRef<Path>>(filename: P) -> GoSoiResult<Vec<GoTermRecord>> {
    let path = filename.as_ref();
    let file = File::open(path)
        .map_err(|_| GoSoiError::CannotOpenFile(path.display().to_string()))?;
    parse_obo(BufReader::new(file))
}

/// Parses the `[Term]` stanzas of OBO formatted data
///
/// Only `is_a` relations are used as parent edges. All other stanza types
/// (e.g. `[Typedef]`) and unknown tags are ignored.
///
/// # Errors
///
/// [`GoSoiError::InvalidInput`] if a term stanza has no valid `id`,
/// `name` or `namespace` or if reading fails
///
/// # Examples
///
/// ```
/// use gosoi::parser::go_obo::parse_obo;
/// use gosoi::Category;
///
/// let obo = "format-version: 1.2
///
/// [Term]
/// id: GO:0008150
/// name: biological_process
/// namespace: biological_process
///
/// [Term]
/// id: GO:0001525
/// name: angiogenesis
/// namespace: biological_process
/// def: \"Blood vessel formation.\" [GOC:jid]
/// is_a: GO:0008150 ! biological_process
/// ";
///
/// let records = parse_obo(obo.as_bytes()).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].name, "angiogenesis");
/// assert_eq!(records[1].category, Category::BiologicalProcess);
/// assert_eq!(records[1].description.as_deref(), Some("Blood vessel formation."));
/// assert_eq!(records[1].parents[0].to_string(), "GO:0008150");
/// ```
pub fn parse_obo<R: BufRead>(reader: R) -> GoSoiResult<Vec<GoTermRecord>> {
    let mut records = Vec::new();
    let mut stanza: Option<Stanza> = None;

    for line in reader.lines() {
        let line = line.map_err(|err| GoSoiError::InvalidInput(err.to_string()))?;
        let line = line.trim();

        if line.starts_with('[') {
            if let Some(finished) = stanza.take() {
                records.push(finished.into_record()?);
            }
            if line == "[Term]" {
                stanza = Some(Stanza::default());
            } else {
                trace!("Ignoring stanza {}", line);
            }
            continue;
        }

        if let Some(current) = stanza.as_mut() {
            if let Some((tag, value)) = line.split_once(':') {
                current.add_tag(tag.trim(), value.trim())?;
            }
        }
    }
    if let Some(finished) = stanza.take() {
        records.push(finished.into_record()?);
    }
    debug!("Parsed {} terms from OBO data", records.len());
    Ok(records)
}

#[derive(Default)]
struct Stanza {
    id: Option<GoTermId>,
    name: Option<String>,
    namespace: Option<Category>,
    def: Option<String>,
    is_a: Vec<GoTermId>,
    obsolete: bool,
}

impl Stanza {
    fn add_tag(&mut self, tag: &str, value: &str) -> GoSoiResult<()> {
        match tag {
            "id" => self.id = Some(GoTermId::try_from(value)?),
            "name" => self.name = Some(value.to_string()),
            "namespace" => self.namespace = Some(Category::from_str(value)?),
            "def" => self.def = Some(quoted_text(value).to_string()),
            "is_a" => {
                // is_a: GO:0008150 ! biological_process
                let parent = value.split_whitespace().next().unwrap_or_default();
                self.is_a.push(GoTermId::try_from(parent)?);
            }
            "is_obsolete" => self.obsolete = value == "true",
            _ => (),
        }
        Ok(())
    }

    fn into_record(self) -> GoSoiResult<GoTermRecord> {
        let Some(id) = self.id else {
            return Err(GoSoiError::InvalidInput(
                "[Term] stanza without id".to_string(),
            ));
        };
        let Some(name) = self.name else {
            return Err(GoSoiError::InvalidInput(format!("{id} has no name")));
        };
        let Some(category) = self.namespace else {
            return Err(GoSoiError::InvalidInput(format!("{id} has no namespace")));
        };

        let mut record = self
            .is_a
            .into_iter()
            .fold(GoTermRecord::new(id, &name, category), GoTermRecord::with_parent);
        record.description = self.def;
        record.obsolete = self.obsolete;
        Ok(record)
    }
}

/// Returns the text between the first pair of double quotes
///
/// `"Blood vessel formation." [GOC:jid]` becomes `Blood vessel formation.`
fn quoted_text(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.split_once('"'))
        .map_or(value, |(text, _)| text)
}

#[cfg(test)]
mod test {
    use super::*;

    const OBO: &str = "format-version: 1.2
data-version: releases/2023-01-01

[Term]
id: GO:0000001
name: root
namespace: biological_process

[Term]
id: GO:0000002
name: middle
namespace: biological_process
is_a: GO:0000001 ! root

[Term]
id: GO:0000003
name: leaf
namespace: biological_process
def: \"A leaf term.\" [GOC:xyz]
is_a: GO:0000002 ! middle
is_a: GO:0000001 ! root
relationship: part_of GO:0000004 ! other

[Term]
id: GO:0000004
name: old
namespace: molecular_function
is_obsolete: true

[Typedef]
id: part_of
name: part of
";

    #[test]
    fn parse_terms() {
        let records = parse_obo(OBO.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);

        assert!(records[0].parents.is_empty());
        assert_eq!(records[2].parents.len(), 2);
        assert_eq!(records[2].description.as_deref(), Some("A leaf term."));
        assert!(records[3].obsolete);
        assert_eq!(records[3].category, Category::MolecularActivity);
    }

    #[test]
    fn build_ontology() {
        let ont = crate::Ontology::from_records(parse_obo(OBO.as_bytes()).unwrap()).unwrap();
        assert_eq!(ont.len(), 4);
        assert_eq!(ont.ancestors(3u32).unwrap().len(), 2);
        assert_eq!(ont.term(1u32).unwrap().child_ids().len(), 2);
    }

    #[test]
    fn missing_namespace() {
        let obo = "[Term]\nid: GO:0000001\nname: root\n";
        assert!(matches!(
            parse_obo(obo.as_bytes()),
            Err(GoSoiError::InvalidInput(_))
        ));
    }

    #[test]
    fn invalid_parent_id() {
        let obo = "[Term]\nid: GO:0000002\nname: a\nnamespace: biological_process\nis_a: HP:0000001\n";
        assert!(matches!(
            parse_obo(obo.as_bytes()),
            Err(GoSoiError::InvalidTermId(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_obo_file("does/not/exist.obo"),
            Err(GoSoiError::CannotOpenFile(_))
        ));
    }
}
