//! Tailqa Extract - Answer extraction over article text
//!
//! Substitutes entity titles into question templates, runs the
//! extractive-QA capability once per (entity, question), and persists the
//! per-entity answer records as line-delimited JSON. The QA model is a
//! black box behind the `QaModel` trait; the top answer span and its
//! confidence are taken verbatim, with no re-ranking or validation.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use tailqa_core::{
    Category, Position, Property, QaAnswer, QuestionStyle, Result, TailqaError, ENTITY_PLACEHOLDER,
};

pub mod qa_http;

pub use qa_http::HttpQaModel;

// ============================================================================
// QA Capability
// ============================================================================

/// Capability boundary for the pretrained extractive-QA model.
///
/// Given a question and a context string, returns the top answer span
/// and its confidence score. The pipeline never trains or fine-tunes
/// the model behind this trait.
#[async_trait]
pub trait QaModel: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer>;
}

// ============================================================================
// Entity Records
// ============================================================================

/// Per-entity extraction output: property label -> answer span
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub title: String,
    pub answers: BTreeMap<String, QaAnswer>,
}

impl EntityRecord {
    /// Serialize to one JSONL line: `{"<title>": {"<label>": {"answer": ..., "score": ...}}}`
    pub fn to_line(&self) -> Result<String> {
        let outer = BTreeMap::from([(&self.title, &self.answers)]);
        Ok(serde_json::to_string(&outer)?)
    }

    /// Parse one JSONL line back into a record
    pub fn from_line(line: &str) -> Result<Self> {
        let mut outer: BTreeMap<String, BTreeMap<String, QaAnswer>> = serde_json::from_str(line)?;
        if outer.len() != 1 {
            return Err(TailqaError::ValidationError(format!(
                "expected exactly one entity per record line, found {}",
                outer.len()
            )));
        }
        // len checked above, pop the single entry
        let title = outer
            .keys()
            .next()
            .cloned()
            .unwrap_or_default();
        let answers = outer.remove(&title).unwrap_or_default();
        Ok(Self { title, answers })
    }
}

// ============================================================================
// Answer Extractor
// ============================================================================

/// Runs the QA capability over one entity's article text
pub struct AnswerExtractor<'a> {
    model: &'a dyn QaModel,
}

impl<'a> AnswerExtractor<'a> {
    pub fn new(model: &'a dyn QaModel) -> Self {
        Self { model }
    }

    /// Extract answers for one entity.
    ///
    /// `questions` and `properties` must be index-aligned: question N asks
    /// about property N. A length mismatch aborts extraction for the
    /// entity before any model call; no partial record is produced.
    /// Model calls are sequential, one per question, each against the
    /// full article text.
    pub async fn extract(
        &self,
        title: &str,
        text: &str,
        questions: &[String],
        properties: &[Property],
    ) -> Result<EntityRecord> {
        if questions.len() != properties.len() {
            return Err(TailqaError::LengthMismatch {
                questions: questions.len(),
                properties: properties.len(),
            });
        }

        let mut answers = BTreeMap::new();
        for (template, property) in questions.iter().zip(properties) {
            let question = template.replace(ENTITY_PLACEHOLDER, title);
            let answer = self.model.answer(&question, text).await?;
            debug!(
                entity = title,
                property = property.label.as_str(),
                score = answer.score,
                "extracted answer"
            );
            answers.insert(property.label.clone(), answer);
        }

        info!(entity = title, properties = answers.len(), "entity extracted");
        Ok(EntityRecord {
            title: title.to_string(),
            answers,
        })
    }
}

// ============================================================================
// Result Store
// ============================================================================

/// Line-delimited JSON store of per-entity extraction records
pub struct ResultStore;

impl ResultStore {
    /// Conventional file name for a result store segment
    pub fn file_name(category: Category, position: Position, style: QuestionStyle) -> String {
        format!(
            "{}Results{}Questions{}.jsonl",
            category.plural_str(),
            position.code(),
            style.code()
        )
    }

    /// Load every record from a JSONL result file
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<EntityRecord>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| TailqaError::io(path.display().to_string(), e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(EntityRecord::from_line(&line)?);
        }
        Ok(records)
    }

    /// Write records to a JSONL result file, one entity per line
    pub fn save(path: impl AsRef<Path>, records: &[EntityRecord]) -> Result<()> {
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
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Stub model that answers with the question it was asked, so tests
    /// can observe placeholder substitution
    struct EchoModel;

    #[async_trait]
    impl QaModel for EchoModel {
        async fn answer(&self, question: &str, _context: &str) -> Result<QaAnswer> {
            Ok(QaAnswer {
                answer: question.to_string(),
                score: 0.5,
            })
        }
    }

    /// Stub model that always fails
    struct FailingModel;

    #[async_trait]
    impl QaModel for FailingModel {
        async fn answer(&self, _question: &str, _context: &str) -> Result<QaAnswer> {
            Err(TailqaError::QaBackend("inference timeout".to_string()))
        }
    }

    fn props() -> Vec<Property> {
        vec![
            Property::new("Geburtsort", "birthPlace"),
            Property::new("Beruf", "occupation"),
        ]
    }

    fn questions() -> Vec<String> {
        vec![
            "Geburtsort von __?".to_string(),
            "Beruf von __?".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_placeholder_substitution() {
        let model = EchoModel;
        let extractor = AnswerExtractor::new(&model);
        let record = extractor
            .extract("Anna Müller", "Text", &questions(), &props())
            .await
            .unwrap();

        assert_eq!(
            record.answers["Geburtsort"].answer,
            "Geburtsort von Anna Müller?"
        );
        assert_eq!(record.answers["Beruf"].answer, "Beruf von Anna Müller?");
    }

    #[tokio::test]
    async fn test_length_mismatch_produces_no_record() {
        let model = EchoModel;
        let extractor = AnswerExtractor::new(&model);
        let short_questions = vec!["Geburtsort von __?".to_string()];

        let err = extractor
            .extract("Anna Müller", "Text", &short_questions, &props())
            .await
            .unwrap_err();
        assert!(matches!(err, TailqaError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn test_backend_failure_aborts_entity() {
        let model = FailingModel;
        let extractor = AnswerExtractor::new(&model);
        let err = extractor
            .extract("Anna Müller", "Text", &questions(), &props())
            .await
            .unwrap_err();
        assert!(matches!(err, TailqaError::QaBackend(_)));
    }

    #[test]
    fn test_record_line_round_trip() {
        let record = EntityRecord {
            title: "Haus Fürsteneck".to_string(),
            answers: BTreeMap::from([
                (
                    "Ort".to_string(),
                    QaAnswer {
                        answer: "Frankfurt".to_string(),
                        score: 0.93,
                    },
                ),
                (
                    "Baujahr".to_string(),
                    QaAnswer {
                        answer: "1362".to_string(),
                        score: 0.41,
                    },
                ),
            ]),
        };

        let line = record.to_line().unwrap();
        let parsed = EntityRecord::from_line(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_result_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ResultStore::file_name(
            Category::Building,
            Position::Subject,
            QuestionStyle::Baseline,
        ));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "BuildingsResultsSPQuestionsBL.jsonl"
        );

        let records = vec![EntityRecord {
            title: "Alte Oper".to_string(),
            answers: BTreeMap::from([(
                "Ort".to_string(),
                QaAnswer {
                    answer: "Frankfurt".to_string(),
                    score: 0.88,
                },
            )]),
        }];

        ResultStore::save(&path, &records).unwrap();
        let loaded = ResultStore::load(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_multi_entity_line_rejected() {
        let line = r#"{"A": {"Ort": {"answer": "x", "score": 0.1}}, "B": {}}"#;
        assert!(matches!(
            EntityRecord::from_line(line),
            Err(TailqaError::ValidationError(_))
        ));
    }
}
