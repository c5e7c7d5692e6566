//! Tailqa Question - Property store, question bank, and generation
//!
//! Properties and question templates are kept as ordered lists per
//! (category, position); within one pair the property list and every
//! style's question list must stay index-aligned, since question N is
//! the question about property N. `QuestionBank::validate` enforces the
//! length part of that invariant before extraction runs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tailqa_core::{Property, Result, TailqaError, ENTITY_PLACEHOLDER};

pub mod translate;

pub use translate::{HttpTranslator, Translator};

// ============================================================================
// Property Store
// ============================================================================

/// CSV-backed store of (localized label, source label) property pairs.
///
/// Row order is meaningful and preserved.
pub struct PropertyStore;

impl PropertyStore {
    /// Load an ordered property list from a `label,source_label` CSV
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Property>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?
            .clone();
        let label_idx = headers.iter().position(|h| h == "label");
        let source_idx = headers.iter().position(|h| h == "source_label");
        let (label_idx, source_idx) = match (label_idx, source_idx) {
            (Some(l), Some(s)) => (l, s),
            _ => {
                return Err(TailqaError::ValidationError(format!(
                    "{}: expected 'label' and 'source_label' columns",
                    path.display()
                )))
            }
        };

        let mut properties = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
            let label = record.get(label_idx).unwrap_or("").trim();
            let source = record.get(source_idx).unwrap_or("").trim();
            if label.is_empty() {
                continue;
            }
            properties.push(Property::new(label, source));
        }
        Ok(properties)
    }

    /// Write an ordered property list to CSV
    pub fn save(path: impl AsRef<Path>, properties: &[Property]) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        writer
            .write_record(["label", "source_label"])
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        for prop in properties {
            writer
                .write_record([prop.label.as_str(), prop.source_label.as_str()])
                .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        }
        writer.flush().map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        Ok(())
    }
}

// ============================================================================
// Question Bank
// ============================================================================

/// Line-oriented store of question templates, one template per line.
///
/// Every template contains the entity placeholder token `"__"`.
pub struct QuestionBank;

impl QuestionBank {
    /// Load question templates, preserving file order
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        let reader = BufReader::new(file);

        let mut questions = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| TailqaError::io(path.display().to_string(), e))?;
            let line = line.trim();
            if !line.is_empty() {
                questions.push(line.to_string());
            }
        }
        Ok(questions)
    }

    /// Write question templates, one per line
    pub fn save(path: impl AsRef<Path>, questions: &[String]) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        let mut writer = BufWriter::new(file);
        for question in questions {
            writeln!(writer, "{question}")
                .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        }
        writer
            .flush()
            .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        Ok(())
    }

    /// Check the index-alignment length invariant between a question list
    /// and a property list
    pub fn validate(questions: &[String], properties: &[Property]) -> Result<()> {
        if questions.len() != properties.len() {
            return Err(TailqaError::LengthMismatch {
                questions: questions.len(),
                properties: properties.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Baseline Generation
// ============================================================================

/// Build the baseline question list: one literal template per property,
/// directly from the localized label
pub fn baseline_questions(properties: &[Property]) -> Vec<String> {
    properties
        .iter()
        .map(|p| format!("{} von {ENTITY_PLACEHOLDER}?", p.label))
        .collect()
}

/// Build the English scaffolds fed to the translator for the
/// translation-based style
pub fn english_scaffolds(properties: &[Property]) -> Vec<String> {
    properties
        .iter()
        .map(|p| format!("What is the {} of {ENTITY_PLACEHOLDER}?", p.source_label))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Vec<Property> {
        vec![
            Property::new("Geburtsort", "birthPlace"),
            Property::new("Beruf", "occupation"),
        ]
    }

    #[test]
    fn test_baseline_questions_keep_property_order() {
        let questions = baseline_questions(&props());
        assert_eq!(
            questions,
            vec!["Geburtsort von __?".to_string(), "Beruf von __?".to_string()]
        );
    }

    #[test]
    fn test_english_scaffolds_use_source_labels() {
        let scaffolds = english_scaffolds(&props());
        assert_eq!(scaffolds[0], "What is the birthPlace of __?");
        assert_eq!(scaffolds[1], "What is the occupation of __?");
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let questions = vec!["Geburtsort von __?".to_string()];
        let err = QuestionBank::validate(&questions, &props()).unwrap_err();
        match err {
            TailqaError::LengthMismatch {
                questions: q,
                properties: p,
            } => {
                assert_eq!(q, 1);
                assert_eq!(p, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_property_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PersonPropertiesSP.csv");

        PropertyStore::save(&path, &props()).unwrap();
        let loaded = PropertyStore::load(&path).unwrap();
        assert_eq!(loaded, props());
    }

    #[test]
    fn test_property_store_rejects_wrong_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "name,english\nGeburtsort,birthPlace\n").unwrap();

        assert!(matches!(
            PropertyStore::load(&path),
            Err(TailqaError::ValidationError(_))
        ));
    }

    #[test]
    fn test_question_bank_round_trip_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PersonQuestionsSP_BL.txt");

        let questions = vec!["Geburtsort von __?".to_string(), "Beruf von __?".to_string()];
        QuestionBank::save(&path, &questions).unwrap();

        // append a stray blank line as the original files often had
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push('\n');
        std::fs::write(&path, raw).unwrap();

        let loaded = QuestionBank::load(&path).unwrap();
        assert_eq!(loaded, questions);
    }
}
