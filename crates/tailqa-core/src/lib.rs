//! Tailqa Core - Domain models, shared errors, and configuration
//!
//! This crate defines the abstractions shared across the pipeline stages:
//! - Entity categories and grammatical positions
//! - Question styles (baseline, translation-based, human-generated)
//! - Properties, answers, gold answers, and triples
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{ConfigError, PipelineConfig, QaBackendConfig};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for pipeline operations
#[derive(Error, Debug)]
pub enum TailqaError {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid question style: {0}")]
    InvalidStyle(String),

    #[error("Invalid entity position: {0}")]
    InvalidPosition(String),

    #[error("Threshold out of range: {0} (must be strictly between 0.0 and 1.0)")]
    ThresholdOutOfRange(f64),

    #[error("Question/property length mismatch: {questions} questions vs {properties} properties")]
    LengthMismatch { questions: usize, properties: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("QA backend error: {0}")]
    QaBackend(String),

    #[error("Translation backend error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TailqaError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TailqaError>;

// ============================================================================
// Entity Categories
// ============================================================================

/// Semantic categories assigned to infobox-less Wikipedia articles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Person,
    Building,
    Disease,
    History,
    Literature,
    Magazine,
    Newspaper,
    Organization,
    Park,
    School,
    Ship,
}

impl Category {
    /// All categories in the closed set
    pub const ALL: [Category; 11] = [
        Self::Person,
        Self::Building,
        Self::Disease,
        Self::History,
        Self::Literature,
        Self::Magazine,
        Self::Newspaper,
        Self::Organization,
        Self::Park,
        Self::School,
        Self::Ship,
    ];

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Building => "Building",
            Self::Disease => "Disease",
            Self::History => "History",
            Self::Literature => "Literature",
            Self::Magazine => "Magazine",
            Self::Newspaper => "Newspaper",
            Self::Organization => "Organization",
            Self::Park => "Park",
            Self::School => "School",
            Self::Ship => "Ship",
        }
    }

    /// Pluralized form used in corpus file naming.
    ///
    /// History and Literature keep their singular form; every other
    /// category is pluralized with a trailing "s".
    pub fn plural_str(&self) -> &'static str {
        match self {
            Self::Person => "Persons",
            Self::Building => "Buildings",
            Self::Disease => "Diseases",
            Self::History => "History",
            Self::Literature => "Literature",
            Self::Magazine => "Magazines",
            Self::Newspaper => "Newspapers",
            Self::Organization => "Organizations",
            Self::Park => "Parks",
            Self::School => "Schools",
            Self::Ship => "Ships",
        }
    }
}

impl FromStr for Category {
    type Err = TailqaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "person" | "persons" => Ok(Self::Person),
            "building" | "buildings" => Ok(Self::Building),
            "disease" | "diseases" => Ok(Self::Disease),
            "history" => Ok(Self::History),
            "literature" => Ok(Self::Literature),
            "magazine" | "magazines" => Ok(Self::Magazine),
            "newspaper" | "newspapers" => Ok(Self::Newspaper),
            "organization" | "organizations" => Ok(Self::Organization),
            "park" | "parks" => Ok(Self::Park),
            "school" | "schools" => Ok(Self::School),
            "ship" | "ships" => Ok(Self::Ship),
            other => Err(TailqaError::InvalidCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Entity Position
// ============================================================================

/// Grammatical position of the entity in the underlying fact.
///
/// Subject position asks (e, r, ?); object position asks (?, r, e).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "SP")]
    Subject,
    #[serde(rename = "OP")]
    Object,
}

impl Position {
    /// Short code used in file naming ("SP"/"OP")
    pub fn code(&self) -> &'static str {
        match self {
            Self::Subject => "SP",
            Self::Object => "OP",
        }
    }

    /// Triple pattern label for report headings
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Subject => "(e, r, ?)",
            Self::Object => "(?, r, e)",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Subject => "Subject Position",
            Self::Object => "Object Position",
        }
    }
}

impl FromStr for Position {
    type Err = TailqaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SP" => Ok(Self::Subject),
            "OP" => Ok(Self::Object),
            other => Err(TailqaError::InvalidPosition(other.to_string())),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Question Styles
// ============================================================================

/// Question-authoring styles compared by the evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestionStyle {
    /// Literal template built directly from the property label ("BL")
    #[serde(rename = "BL")]
    Baseline,
    /// Generated in English, then machine-translated ("AG")
    #[serde(rename = "AG")]
    Translated,
    /// Manually authored ("NL")
    #[serde(rename = "NL")]
    Human,
}

impl QuestionStyle {
    pub const ALL: [QuestionStyle; 3] = [Self::Baseline, Self::Translated, Self::Human];

    /// Short code used in file naming ("BL"/"AG"/"NL")
    pub fn code(&self) -> &'static str {
        match self {
            Self::Baseline => "BL",
            Self::Translated => "AG",
            Self::Human => "NL",
        }
    }

    /// Human-readable label used in report columns
    pub fn label(&self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::Translated => "Translation-Based",
            Self::Human => "Human-Generated",
        }
    }
}

impl FromStr for QuestionStyle {
    type Err = TailqaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "BL" => Ok(Self::Baseline),
            "AG" => Ok(Self::Translated),
            "NL" => Ok(Self::Human),
            other => Err(TailqaError::InvalidStyle(other.to_string())),
        }
    }
}

impl std::fmt::Display for QuestionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Properties, Answers, Triples
// ============================================================================

/// A DBpedia property used as an extraction target.
///
/// `label` is the localized (German) label that keys questions and result
/// records; `source_label` is the English DBpedia label it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub label: String,
    pub source_label: String,
}

impl Property {
    pub fn new(label: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source_label: source_label.into(),
        }
    }
}

/// An answer span returned by the extractive-QA model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub score: f64,
}

/// Placeholder string marking a gold entry with no acceptable answer
pub const GOLD_PLACEHOLDER: &str = "nan";

/// Placeholder token in question templates, replaced by the entity title
pub const ENTITY_PLACEHOLDER: &str = "__";

/// The set of acceptable answer strings for one (entity, property)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoldAnswers(pub Vec<String>);

impl GoldAnswers {
    pub fn new(answers: Vec<String>) -> Self {
        Self(answers)
    }

    /// True when no gold answer exists for this property
    pub fn is_placeholder(&self) -> bool {
        self.0.first().map(String::as_str) == Some(GOLD_PLACEHOLDER)
    }

    /// True when the given system answer is one of the acceptable strings
    pub fn contains(&self, answer: &str) -> bool {
        self.0.iter().any(|gold| gold == answer)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An (entity, predicate, answer) triple, the pipeline's extraction target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub confidence: f64,
}

impl Triple {
    /// Render a triple from a scored answer, honoring the entity position
    pub fn from_answer(
        entity: &str,
        property: &str,
        answer: &QaAnswer,
        position: Position,
    ) -> Self {
        match position {
            Position::Subject => Self {
                subject: entity.to_string(),
                predicate: property.to_string(),
                object: answer.answer.clone(),
                confidence: answer.score,
            },
            Position::Object => Self {
                subject: answer.answer.clone(),
                predicate: property.to_string(),
                object: entity.to_string(),
                confidence: answer.score,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn test_category_accepts_plural() {
        assert_eq!("Buildings".parse::<Category>().unwrap(), Category::Building);
        assert_eq!("Persons".parse::<Category>().unwrap(), Category::Person);
    }

    #[test]
    fn test_invalid_category_rejected() {
        assert!(matches!(
            "Castle".parse::<Category>(),
            Err(TailqaError::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_plural_keeps_mass_nouns() {
        assert_eq!(Category::History.plural_str(), "History");
        assert_eq!(Category::Literature.plural_str(), "Literature");
        assert_eq!(Category::Ship.plural_str(), "Ships");
    }

    #[test]
    fn test_position_codes() {
        assert_eq!("sp".parse::<Position>().unwrap(), Position::Subject);
        assert_eq!("OP".parse::<Position>().unwrap(), Position::Object);
        assert!("XP".parse::<Position>().is_err());
    }

    #[test]
    fn test_style_codes_and_labels() {
        assert_eq!("BL".parse::<QuestionStyle>().unwrap(), QuestionStyle::Baseline);
        assert_eq!("ag".parse::<QuestionStyle>().unwrap(), QuestionStyle::Translated);
        assert_eq!(QuestionStyle::Human.label(), "Human-Generated");
        assert!("ML".parse::<QuestionStyle>().is_err());
    }

    #[test]
    fn test_gold_placeholder() {
        let gold = GoldAnswers::new(vec!["nan".to_string()]);
        assert!(gold.is_placeholder());
        let gold = GoldAnswers::new(vec!["Berlin".to_string(), "nan".to_string()]);
        assert!(!gold.is_placeholder());
    }

    #[test]
    fn test_triple_orientation() {
        let answer = QaAnswer {
            answer: "Berlin".to_string(),
            score: 0.9,
        };
        let sp = Triple::from_answer("Haus Fürsteneck", "Ort", &answer, Position::Subject);
        assert_eq!(sp.subject, "Haus Fürsteneck");
        assert_eq!(sp.object, "Berlin");

        let op = Triple::from_answer("Haus Fürsteneck", "Ort", &answer, Position::Object);
        assert_eq!(op.subject, "Berlin");
        assert_eq!(op.object, "Haus Fürsteneck");
    }
}
