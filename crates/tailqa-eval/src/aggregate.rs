//! Score aggregation and report output
//!
//! Averages per-entity scores, rolls entity scores up into categories
//! via the category index, and writes the delimited comparison files the
//! downstream analysis consumes. Plot rendering happens outside this
//! crate; the CSV files are the hand-off format.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use tailqa_core::{Category, Position, QuestionStyle, Result, TailqaError};
use tailqa_corpus::CategoryIndex;

use crate::scoring::{round1, MetricKind};

/// Arithmetic mean of a score list, rounded to one decimal.
///
/// An empty list yields 0.0, consistent with the zero-denominator policy
/// of the scoring engine.
pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    round1(scores.iter().sum::<f64>() / scores.len() as f64)
}

// ============================================================================
// Category Roll-up
// ============================================================================

/// One category-level score row for the delimited output
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScoreRow {
    pub category: Category,
    pub score: f64,
    pub style: QuestionStyle,
}

/// Rolls per-entity scores up into categories and writes report files
pub struct Aggregator {
    index: CategoryIndex,
}

impl Aggregator {
    pub fn new(index: CategoryIndex) -> Self {
        Self { index }
    }

    /// Map per-entity scores to category rows for one question style.
    ///
    /// An entity missing from the category index is silently dropped
    /// from the roll-up (logged at warn level, never an error).
    pub fn category_rows(
        &self,
        entity_scores: &[(String, f64)],
        style: QuestionStyle,
    ) -> Vec<CategoryScoreRow> {
        let mut rows = Vec::new();
        for (entity, score) in entity_scores {
            match self.index.category_of(entity) {
                Some(category) => rows.push(CategoryScoreRow {
                    category,
                    score: *score,
                    style,
                }),
                None => warn!(entity, "entity not in any category file, dropped"),
            }
        }
        rows
    }

    /// Average the rows of one category and style
    pub fn category_mean(&self, rows: &[CategoryScoreRow], category: Category) -> f64 {
        let scores: Vec<f64> = rows
            .iter()
            .filter(|row| row.category == category)
            .map(|row| row.score)
            .collect();
        mean(&scores)
    }

    /// Write `Category,Score,Question Type` rows for one metric
    pub fn write_category_csv(
        path: impl AsRef<Path>,
        rows: &[CategoryScoreRow],
    ) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        writer
            .write_record(["Category", "Score", "Question Type"])
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        for row in rows {
            writer
                .write_record([
                    row.category.as_str(),
                    &format!("{:.1}", row.score),
                    row.style.label(),
                ])
                .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
        }
        writer
            .flush()
            .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
        Ok(())
    }
}

// ============================================================================
// Per-style Comparison
// ============================================================================

/// Write the per-entity comparison CSV for one metric:
/// `Entity,Baseline <M>,Translation-Based <M>,Human-Generated <M>`.
///
/// Entities are sorted alphabetically; all three style lists must cover
/// the same entity set, otherwise rows would silently misalign, so a
/// missing entity is a validation error.
pub fn write_style_comparison_csv(
    path: impl AsRef<Path>,
    metric: MetricKind,
    baseline: &[(String, f64)],
    translated: &[(String, f64)],
    human: &[(String, f64)],
) -> Result<()> {
    let path = path.as_ref();
    let baseline: BTreeMap<&str, f64> =
        baseline.iter().map(|(e, s)| (e.as_str(), *s)).collect();
    let translated: BTreeMap<&str, f64> =
        translated.iter().map(|(e, s)| (e.as_str(), *s)).collect();
    let human: BTreeMap<&str, f64> = human.iter().map(|(e, s)| (e.as_str(), *s)).collect();

    let lookup = |map: &BTreeMap<&str, f64>, entity: &str, style: QuestionStyle| -> Result<f64> {
        map.get(entity).copied().ok_or_else(|| {
            TailqaError::ValidationError(format!(
                "entity '{entity}' has no {} score",
                style.label()
            ))
        })
    };

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
    writer
        .write_record([
            "Entity".to_string(),
            format!("Baseline {}", metric.code()),
            format!("Translation-Based {}", metric.code()),
            format!("Human-Generated {}", metric.code()),
        ])
        .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;

    for (entity, bl_score) in &baseline {
        let ag_score = lookup(&translated, entity, QuestionStyle::Translated)?;
        let nl_score = lookup(&human, entity, QuestionStyle::Human)?;
        writer
            .write_record([
                entity.to_string(),
                format!("{bl_score:.1}"),
                format!("{ag_score:.1}"),
                format!("{nl_score:.1}"),
            ])
            .map_err(|e| TailqaError::ValidationError(format!("{}: {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| TailqaError::io(path.display().to_string(), e))?;
    Ok(())
}

// ============================================================================
// Text Reports
// ============================================================================

/// Render the per-entity score listing for one (metric, position, style),
/// best score first, with the average at the bottom
pub fn entity_scores_report(
    metric: MetricKind,
    position: Position,
    style: QuestionStyle,
    entity_scores: &[(String, f64)],
) -> String {
    let mut sorted = entity_scores.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut report = format!(
        "{} results for {} with {} questions - {}:\n\n",
        metric.label().to_uppercase(),
        position.label(),
        style.label(),
        position.pattern()
    );
    for (entity, score) in &sorted {
        report.push_str(&format!("{entity}: {score:.1}\n"));
    }
    report.push_str(&format!(
        "\nAverage {} score: {:.1}\n",
        metric.label().to_uppercase(),
        mean(&sorted.iter().map(|(_, s)| *s).collect::<Vec<_>>())
    ));
    report
}

/// Render the style-average comparison for one metric, best style first
pub fn averages_report(
    metric: MetricKind,
    position: Position,
    averages: &[(QuestionStyle, f64)],
) -> String {
    let mut sorted = averages.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut report = format!(
        "=== {} Averages for {} - {} ===\n",
        metric.label(),
        position.label(),
        position.pattern()
    );
    for (style, avg) in &sorted {
        report.push_str(&format!("{}: {avg:.1}\n", style.label()));
    }
    report
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_rounds_to_one_decimal() {
        assert_eq!(mean(&[80.0, 60.0, 100.0]), 80.0);
        assert_eq!(mean(&[70.0, 75.5]), 72.8);
        assert_eq!(mean(&[]), 0.0);
    }

    fn index() -> CategoryIndex {
        let mut index = CategoryIndex::new();
        index.insert("Alte Oper", Category::Building);
        index.insert("Haus Fürsteneck", Category::Building);
        index.insert("Anna Müller", Category::Person);
        index
    }

    #[test]
    fn test_unknown_entities_are_dropped_from_category_rows() {
        let aggregator = Aggregator::new(index());
        let scores = vec![
            ("Alte Oper".to_string(), 80.0),
            ("Unbekanntes Ding".to_string(), 10.0),
            ("Anna Müller".to_string(), 60.0),
        ];
        let rows = aggregator.category_rows(&scores, QuestionStyle::Baseline);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.style == QuestionStyle::Baseline));
    }

    #[test]
    fn test_category_mean() {
        let aggregator = Aggregator::new(index());
        let scores = vec![
            ("Alte Oper".to_string(), 80.0),
            ("Haus Fürsteneck".to_string(), 60.0),
            ("Anna Müller".to_string(), 10.0),
        ];
        let rows = aggregator.category_rows(&scores, QuestionStyle::Human);
        assert_eq!(aggregator.category_mean(&rows, Category::Building), 70.0);
        assert_eq!(aggregator.category_mean(&rows, Category::Person), 10.0);
        // no rows for ships
        assert_eq!(aggregator.category_mean(&rows, Category::Ship), 0.0);
    }

    #[test]
    fn test_style_comparison_csv_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PrecisionSP.csv");

        let bl = vec![("B".to_string(), 50.0), ("A".to_string(), 80.0)];
        let ag = vec![("A".to_string(), 70.0), ("B".to_string(), 40.0)];
        let nl = vec![("A".to_string(), 90.0), ("B".to_string(), 60.0)];

        write_style_comparison_csv(&path, MetricKind::Precision, &bl, &ag, &nl).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Entity,Baseline Precision,Translation-Based Precision,Human-Generated Precision"
        );
        // sorted alphabetically, columns aligned per entity
        assert_eq!(lines[1], "A,80.0,70.0,90.0");
        assert_eq!(lines[2], "B,50.0,40.0,60.0");
    }

    #[test]
    fn test_style_comparison_rejects_missing_entity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RecallSP.csv");

        let bl = vec![("A".to_string(), 80.0)];
        let ag: Vec<(String, f64)> = vec![];
        let nl = vec![("A".to_string(), 90.0)];

        assert!(matches!(
            write_style_comparison_csv(&path, MetricKind::Recall, &bl, &ag, &nl),
            Err(TailqaError::ValidationError(_))
        ));
    }

    #[test]
    fn test_entity_scores_report_sorted_best_first() {
        let scores = vec![("A".to_string(), 50.0), ("B".to_string(), 80.0)];
        let report = entity_scores_report(
            MetricKind::ExactMatch,
            Position::Subject,
            QuestionStyle::Baseline,
            &scores,
        );
        assert!(report.starts_with(
            "EXACT MATCH results for Subject Position with Baseline questions - (e, r, ?):"
        ));
        let b_pos = report.find("B: 80.0").unwrap();
        let a_pos = report.find("A: 50.0").unwrap();
        assert!(b_pos < a_pos);
        assert!(report.contains("Average EXACT MATCH score: 65.0"));
    }

    #[test]
    fn test_averages_report_sorted_best_first() {
        let averages = vec![
            (QuestionStyle::Baseline, 58.4),
            (QuestionStyle::Translated, 62.1),
            (QuestionStyle::Human, 55.0),
        ];
        let report = averages_report(MetricKind::Precision, Position::Object, &averages);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "=== Precision Averages for Object Position - (?, r, e) ===");
        assert_eq!(lines[1], "Translation-Based: 62.1");
        assert_eq!(lines[2], "Baseline: 58.4");
        assert_eq!(lines[3], "Human-Generated: 55.0");
    }
}
