//! Tailqa Corpus - Article storage and category bookkeeping
//!
//! Holds the per-stage inputs that everything downstream consumes:
//! - `ArticleStore`: JSONL records of (title, article text)
//! - `ClassifierRules`: ordered keyword rules mapping Wikipedia category
//!   strings to the closed category set
//! - `CategoryIndex`: entity title to category lookup built from the
//!   per-category CSV files

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod classify;
pub mod index;

pub use classify::{ClassifierRules, WikitextScanner};
pub use index::CategoryIndex;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading or writing corpus files
#[derive(Error, Debug)]
pub enum CorpusError {
    /// IO error while reading or writing a corpus file
    #[error("IO error on corpus file: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A JSONL line could not be parsed
    #[error("Malformed JSONL record at {path}:{line}")]
    MalformedRecord {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required CSV column is absent
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: String, column: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CorpusError>;

fn io_err(path: &Path, source: std::io::Error) -> CorpusError {
    CorpusError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ============================================================================
// Article Store
// ============================================================================

/// A Wikipedia article selected for extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Article title, which doubles as the entity name
    pub title: String,
    /// Full plain-text article body
    pub text: String,
}

/// Line-delimited JSON store of articles, one record per line
pub struct ArticleStore;

impl ArticleStore {
    /// Load every article from a JSONL file
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Article>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let reader = BufReader::new(file);

        let mut articles = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| io_err(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let article =
                serde_json::from_str(&line).map_err(|e| CorpusError::MalformedRecord {
                    path: path.display().to_string(),
                    line: idx + 1,
                    source: e,
                })?;
            articles.push(article);
        }
        Ok(articles)
    }

    /// Write articles to a JSONL file, one record per line
    pub fn save(path: impl AsRef<Path>, articles: &[Article]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| io_err(path, e))?;
        let mut writer = BufWriter::new(file);

        for article in articles {
            let line = serde_json::to_string(article)?;
            writeln!(writer, "{}", line).map_err(|e| io_err(path, e))?;
        }
        writer.flush().map_err(|e| io_err(path, e))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");

        let articles = vec![
            Article {
                title: "Haus Fürsteneck".to_string(),
                text: "Das Haus Fürsteneck ist ein Bauwerk in Frankfurt.".to_string(),
            },
            Article {
                title: "Anna Müller".to_string(),
                text: "Anna Müller war eine deutsche Schriftstellerin.".to_string(),
            },
        ];

        ArticleStore::save(&path, &articles).unwrap();
        let loaded = ArticleStore::load(&path).unwrap();
        assert_eq!(loaded, articles);
    }

    #[test]
    fn test_article_store_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");
        std::fs::write(
            &path,
            "{\"title\":\"A\",\"text\":\"t\"}\n\n{\"title\":\"B\",\"text\":\"u\"}\n",
        )
        .unwrap();

        let loaded = ArticleStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_article_store_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");
        std::fs::write(&path, "{\"title\":\"A\",\"text\":\"t\"}\nnot json\n").unwrap();

        let err = ArticleStore::load(&path).unwrap_err();
        match err {
            CorpusError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ArticleStore::load("no/such/file.jsonl").unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
