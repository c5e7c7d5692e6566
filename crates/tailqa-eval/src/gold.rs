//! Gold standard storage and conversion
//!
//! The gold standard is hand-annotated as `Subject,Predicate,Object`
//! CSV rows and evaluated as line-delimited JSON with the same outer
//! shape as the result store, but list-valued answers:
//! `{"<entity>": {"<property>": {"answer": ["...", "..."]}}}`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use tailqa_core::{GoldAnswers, Position, Result, TailqaError, GOLD_PLACEHOLDER};

/// Predicates about measurements carry comma-bearing values (for example
/// "1,50 m"), so their multi-answer cells are tab-separated instead of
/// comma-separated.
const MEASUREMENT_WORDS: [&str; 5] = [
    "Höhe",
    "Breite",
    "Länge",
    "nachfolgende Arbeiten",
    "basierend auf",
];

// ============================================================================
// Gold Records
// ============================================================================

/// Per-entity gold mapping: property label -> acceptable answers
#[derive(Debug, Clone, PartialEq)]
pub struct GoldRecord {
    pub title: String,
    pub answers: BTreeMap<String, GoldAnswers>,
}

/// JSONL leaf shape: `{"answer": [...]}`
#[derive(Debug, Serialize, Deserialize)]
struct GoldLeaf {
    answer: Vec<String>,
}

impl GoldRecord {
    /// Serialize to one JSONL line
    pub fn to_line(&self) -> Result<String> {
        let inner: BTreeMap<&String, GoldLeaf> = self
            .answers
            .iter()
            .map(|(label, gold)| {
                (
                    label,
                    GoldLeaf {
                        answer: gold.0.clone(),
                    },
                )
            })
            .collect();
        let outer = BTreeMap::from([(&self.title, inner)]);
        Ok(serde_json::to_string(&outer)?)
    }

    /// Parse one JSONL line back into a record
    pub fn from_line(line: &str) -> Result<Self> {
        let mut outer: BTreeMap<String, BTreeMap<String, GoldLeaf>> = serde_json::from_str(line)?;
        if outer.len() != 1 {
            return Err(TailqaError::ValidationError(format!(
                "expected exactly one entity per gold line, found {}",
                outer.len()
            )));
        }
        let title = outer.keys().next().cloned().unwrap_or_default();
        let answers = outer
            .remove(&title)
            .unwrap_or_default()
            .into_iter()
            .map(|(label, leaf)| (label, GoldAnswers::new(leaf.answer)))
            .collect();
        Ok(Self { title, answers })
    }
}

// ============================================================================
// Gold Store
// ============================================================================

/// Line-delimited JSON store of gold records
pub struct GoldStore;

impl GoldStore {
    /// Conventional file name for a position's gold file
    pub fn file_name(position: Position) -> String {
        format!("GoldStandard{}.jsonl", position.code())
    }

    /// Load every gold record from a JSONL file
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<GoldRecord>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| TailqaError::io(path.display().to_string(), e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(GoldRecord::from_line(&line)?);
        }
        Ok(records)
    }

    /// Write gold records to a JSONL file
    pub fn save(path: impl AsRef<Path>, records: &[GoldRecord]) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        let mut writer = BufWriter::new(file);
        for record in records {
            writeln!(writer, "{}", record.to_line()?)
                .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        }
        writer
            .flush()
            .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        Ok(())
    }

    /// Convert the annotated `Subject,Predicate,Object` CSV into gold
    /// records for one position.
    ///
    /// For subject position the entity is the Subject column and the
    /// acceptable answers come from the Object cell; for object position
    /// the roles flip. Multi-answer cells split on commas, except for
    /// measurement predicates, which split on tabs. Every piece is
    /// trimmed. Rows group by entity; a repeated (entity, predicate)
    /// pair keeps the last row.
    pub fn convert_csv(path: impl AsRef<Path>, position: Position) -> Result<Vec<GoldRecord>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?
            .clone();
        let col = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| {
                    TailqaError::ValidationError(format!(
                        "{}: missing '{name}' column",
                        path.display()
                    ))
                })
        };
        let subject_idx = col("Subject")?;
        let predicate_idx = col("Predicate")?;
        let object_idx = col("Object")?;

        let mut by_entity: BTreeMap<String, BTreeMap<String, GoldAnswers>> = BTreeMap::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
            let subject = record.get(subject_idx).unwrap_or("").trim();
            let predicate = record.get(predicate_idx).unwrap_or("").trim();
            let object = record.get(object_idx).unwrap_or("").trim();
            if predicate.is_empty() {
                continue;
            }

            let (entity, answer_cell) = match position {
                Position::Subject => (subject, object),
                Position::Object => (object, subject),
            };
            if entity.is_empty() {
                continue;
            }

            by_entity
                .entry(entity.to_string())
                .or_default()
                .insert(predicate.to_string(), split_answers(predicate, answer_cell));
        }

        Ok(by_entity
            .into_iter()
            .map(|(title, answers)| GoldRecord { title, answers })
            .collect())
    }
}

/// Split a gold answer cell into its acceptable strings.
///
/// A blank cell means the annotators found no answer in the article, so
/// it becomes the placeholder and stays excluded from precision/recall.
fn split_answers(predicate: &str, cell: &str) -> GoldAnswers {
    let separator = if MEASUREMENT_WORDS.iter().any(|w| predicate.contains(w)) {
        '\t'
    } else {
        ','
    };
    let answers: Vec<String> = cell
        .split(separator)
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect();
    if answers.is_empty() {
        return GoldAnswers::new(vec![GOLD_PLACEHOLDER.to_string()]);
    }
    GoldAnswers::new(answers)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_split_and_trim() {
        let gold = split_answers("Geburtsort", "Berlin , Hamburg");
        assert_eq!(gold.0, vec!["Berlin".to_string(), "Hamburg".to_string()]);
    }

    #[test]
    fn test_measurement_predicate_splits_on_tab() {
        let gold = split_answers("Höhe", "1,50 m\t150 cm");
        assert_eq!(gold.0, vec!["1,50 m".to_string(), "150 cm".to_string()]);
    }

    #[test]
    fn test_blank_cell_becomes_placeholder() {
        assert!(split_answers("Beruf", "").is_placeholder());
        // whitespace and stray separators also carry no answer
        assert!(split_answers("Geburtsort", "  ,  ").is_placeholder());
        assert!(split_answers("Höhe", " \t ").is_placeholder());
    }

    #[test]
    fn test_convert_csv_blank_object_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GoldStandardSP.csv");
        std::fs::write(
            &path,
            "Subject,Predicate,Object\n\
             Anna Müller,Beruf,\n\
             Anna Müller,Geburtsort,Berlin\n",
        )
        .unwrap();

        let records = GoldStore::convert_csv(&path, Position::Subject).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].answers["Beruf"].is_placeholder());
        assert!(!records[0].answers["Geburtsort"].is_placeholder());
    }

    #[test]
    fn test_convert_csv_subject_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GoldStandardSP.csv");
        std::fs::write(
            &path,
            "Subject,Predicate,Object\n\
             Anna Müller,Geburtsort,\"Berlin, Hamburg\"\n\
             Anna Müller,Beruf,nan\n\
             Alte Oper,Ort,Frankfurt\n",
        )
        .unwrap();

        let records = GoldStore::convert_csv(&path, Position::Subject).unwrap();
        assert_eq!(records.len(), 2);

        let anna = records.iter().find(|r| r.title == "Anna Müller").unwrap();
        assert_eq!(
            anna.answers["Geburtsort"].0,
            vec!["Berlin".to_string(), "Hamburg".to_string()]
        );
        assert!(anna.answers["Beruf"].is_placeholder());
    }

    #[test]
    fn test_convert_csv_object_position_flips_roles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GoldStandardOP.csv");
        std::fs::write(
            &path,
            "Subject,Predicate,Object\n\
             Johann Wolfgang Goethe,Architekt,Alte Oper\n",
        )
        .unwrap();

        let records = GoldStore::convert_csv(&path, Position::Object).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Alte Oper");
        assert_eq!(
            records[0].answers["Architekt"].0,
            vec!["Johann Wolfgang Goethe".to_string()]
        );
    }

    #[test]
    fn test_gold_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(GoldStore::file_name(Position::Subject));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "GoldStandardSP.jsonl"
        );

        let records = vec![GoldRecord {
            title: "Anna Müller".to_string(),
            answers: BTreeMap::from([
                (
                    "Geburtsort".to_string(),
                    GoldAnswers::new(vec!["Berlin".to_string(), "Hamburg".to_string()]),
                ),
                (
                    "Beruf".to_string(),
                    GoldAnswers::new(vec!["nan".to_string()]),
                ),
            ]),
        }];

        GoldStore::save(&path, &records).unwrap();
        let loaded = GoldStore::load(&path).unwrap();
        assert_eq!(loaded, records);
    }
}
