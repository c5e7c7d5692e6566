//! Entity title to category lookup
//!
//! The per-category CSV files (one file per category, `Title` column)
//! are the authority on which entity belongs where. The aggregation stage
//! maps scored entities back through this index; an entity present in no
//! file is simply absent from the index and gets dropped from category
//! aggregates.

use std::collections::HashMap;
use std::path::Path;

use tailqa_core::Category;

use crate::{CorpusError, Result};

/// Lookup table from entity title to its category
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    map: HashMap<String, Category>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single entity
    pub fn insert(&mut self, title: impl Into<String>, category: Category) {
        self.map.insert(title.into(), category);
    }

    /// Look up the category of an entity title
    pub fn category_of(&self, title: &str) -> Option<Category> {
        self.map.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Titles registered under the given category
    pub fn titles_in(&self, category: Category) -> Vec<&str> {
        let mut titles: Vec<&str> = self
            .map
            .iter()
            .filter(|(_, cat)| **cat == category)
            .map(|(title, _)| title.as_str())
            .collect();
        titles.sort_unstable();
        titles
    }

    /// Merge one per-category CSV file into the index.
    ///
    /// The file must carry a `Title` header column; every row's title is
    /// registered under `category`.
    pub fn load_csv(&mut self, path: impl AsRef<Path>, category: Category) -> Result<usize> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let title_idx = reader
            .headers()?
            .iter()
            .position(|h| h == "Title")
            .ok_or_else(|| CorpusError::MissingColumn {
                path: path.display().to_string(),
                column: "Title".to_string(),
            })?;

        let mut count = 0;
        for record in reader.records() {
            let record = record?;
            if let Some(title) = record.get(title_idx) {
                let title = title.trim();
                if !title.is_empty() {
                    self.insert(title, category);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Write the titles of one category out as a `Title` CSV
    pub fn save_csv(&self, path: impl AsRef<Path>, category: Category) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(["Title"])?;
        for title in self.titles_in(category) {
            writer.write_record([title])?;
        }
        writer.flush().map_err(|e| CorpusError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
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
    fn test_insert_and_lookup() {
        let mut index = CategoryIndex::new();
        index.insert("Haus Fürsteneck", Category::Building);
        index.insert("Anna Müller", Category::Person);

        assert_eq!(index.category_of("Haus Fürsteneck"), Some(Category::Building));
        assert_eq!(index.category_of("Unbekannt"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Buildings.csv");

        let mut index = CategoryIndex::new();
        index.insert("Haus Fürsteneck", Category::Building);
        index.insert("Alte Oper", Category::Building);
        index.insert("Anna Müller", Category::Person);
        index.save_csv(&path, Category::Building).unwrap();

        let mut loaded = CategoryIndex::new();
        let count = loaded.load_csv(&path, Category::Building).unwrap();
        assert_eq!(count, 2);
        assert_eq!(loaded.category_of("Alte Oper"), Some(Category::Building));
        assert_eq!(loaded.category_of("Anna Müller"), None);
    }

    #[test]
    fn test_missing_title_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Name\nHaus Fürsteneck\n").unwrap();

        let mut index = CategoryIndex::new();
        let err = index.load_csv(&path, Category::Building).unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn { .. }));
    }

    #[test]
    fn test_title_column_position_is_flexible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two_cols.csv");
        std::fs::write(&path, "Id,Title\n1,Alte Oper\n2, Haus Fürsteneck \n").unwrap();

        let mut index = CategoryIndex::new();
        index.load_csv(&path, Category::Building).unwrap();
        // titles are trimmed
        assert_eq!(index.category_of("Haus Fürsteneck"), Some(Category::Building));
    }
}
