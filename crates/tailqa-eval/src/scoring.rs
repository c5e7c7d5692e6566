//! Scoring engine
//!
//! Computes precision, recall, F1, and exact-match rates for one entity
//! from its joined (system answer, confidence, gold answers) items.
//! Counting rules:
//!
//! - Precision and recall only consider items with a real gold answer
//!   (placeholder items are excluded). A true positive is a system answer
//!   that is a member of the gold set.
//! - On a true positive, every gold answer beyond the matched one counts
//!   as a false negative; on a miss, the whole gold set does.
//! - Exact match covers ALL items, placeholder included.
//! - The thresholded variants additionally gate items on the model
//!   confidence; for exact match, a placeholder item counts as correct
//!   when the model abstained (confidence at or below the threshold).
//!
//! F1 is the harmonic mean of the percentage-scaled precision and recall,
//! which is itself a percentage. Zero denominators uniformly yield 0.0.

use serde::Serialize;
use std::str::FromStr;

use tailqa_core::{GoldAnswers, Result, TailqaError};
use tailqa_extract::EntityRecord;

use crate::gold::GoldRecord;

/// Round a percentage to one decimal
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Joined Items
// ============================================================================

/// One property's joined system/gold row for an entity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub answer: String,
    pub score: f64,
    pub gold: GoldAnswers,
}

/// Join a system record against its gold record by property label.
///
/// Iterates the system record's entries; a system property absent from
/// the gold record fails with a validation error naming the entity and
/// property, so silent misalignment cannot occur.
pub fn join_records(system: &EntityRecord, gold: &GoldRecord) -> Result<Vec<ScoredItem>> {
    let mut items = Vec::with_capacity(system.answers.len());
    for (label, qa) in &system.answers {
        let gold_answers = gold.answers.get(label).ok_or_else(|| {
            TailqaError::ValidationError(format!(
                "no gold entry for entity '{}', property '{}'",
                system.title, label
            ))
        })?;
        items.push(ScoredItem {
            answer: qa.answer.clone(),
            score: qa.score,
            gold: gold_answers.clone(),
        });
    }
    Ok(items)
}

// ============================================================================
// Metric Kinds
// ============================================================================

/// The four evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricKind {
    Precision,
    Recall,
    F1,
    ExactMatch,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [Self::Precision, Self::Recall, Self::F1, Self::ExactMatch];

    /// Human-readable label for report headings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::F1 => "F1",
            Self::ExactMatch => "Exact Match",
        }
    }

    /// Short code used in file naming
    pub fn code(&self) -> &'static str {
        match self {
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::F1 => "F1",
            Self::ExactMatch => "EM",
        }
    }

    /// Pick this metric's value out of a score bundle
    pub fn of(&self, scores: &EntityScores) -> f64 {
        match self {
            Self::Precision => scores.precision,
            Self::Recall => scores.recall,
            Self::F1 => scores.f1,
            Self::ExactMatch => scores.exact_match,
        }
    }
}

impl FromStr for MetricKind {
    type Err = TailqaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "precision" => Ok(Self::Precision),
            "recall" => Ok(Self::Recall),
            "f1" => Ok(Self::F1),
            "em" | "exact match" | "exact-match" => Ok(Self::ExactMatch),
            other => Err(TailqaError::ValidationError(format!(
                "unknown metric: {other}"
            ))),
        }
    }
}

// ============================================================================
// Entity Scorer
// ============================================================================

/// All four metrics for one entity, as percentages rounded to one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub exact_match: f64,
}

/// Scores one entity's joined items, plain or confidence-thresholded
#[derive(Debug, Clone, Copy)]
pub struct EntityScorer {
    threshold: Option<f64>,
}

impl EntityScorer {
    /// Plain scorer: every item participates regardless of confidence
    pub fn new() -> Self {
        Self { threshold: None }
    }

    /// Thresholded scorer; the threshold must lie strictly between
    /// 0.0 and 1.0
    pub fn with_threshold(threshold: f64) -> Result<Self> {
        // written to also reject NaN
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(TailqaError::ThresholdOutOfRange(threshold));
        }
        Ok(Self {
            threshold: Some(threshold),
        })
    }

    /// Whether an item participates in precision/recall counting
    fn counted(&self, item: &ScoredItem) -> bool {
        if item.gold.is_placeholder() {
            return false;
        }
        match self.threshold {
            Some(t) => item.score >= t,
            None => true,
        }
    }

    /// True/false positive counts over the counted items
    pub(crate) fn positive_counts(&self, items: &[ScoredItem]) -> (usize, usize) {
        let mut true_positives = 0;
        let mut false_positives = 0;
        for item in items {
            if !self.counted(item) {
                continue;
            }
            if item.gold.contains(&item.answer) {
                true_positives += 1;
            } else {
                false_positives += 1;
            }
        }
        (true_positives, false_positives)
    }

    /// True positive / false negative counts over the counted items
    fn recall_counts(&self, items: &[ScoredItem]) -> (usize, usize) {
        let mut true_positives = 0;
        let mut false_negatives = 0;
        for item in items {
            if !self.counted(item) {
                continue;
            }
            if item.gold.contains(&item.answer) {
                true_positives += 1;
                // any additional acceptable answers were not extracted
                false_negatives += item.gold.len().saturating_sub(1);
            } else {
                false_negatives += item.gold.len();
            }
        }
        (true_positives, false_negatives)
    }

    /// Precision percentage: TP / (TP + FP)
    pub fn precision(&self, items: &[ScoredItem]) -> f64 {
        let (tp, fp) = self.positive_counts(items);
        if tp + fp == 0 {
            0.0
        } else {
            round1(tp as f64 / (tp + fp) as f64 * 100.0)
        }
    }

    /// Recall percentage: TP / (TP + FN)
    pub fn recall(&self, items: &[ScoredItem]) -> f64 {
        let (tp, fn_) = self.recall_counts(items);
        if tp + fn_ == 0 {
            0.0
        } else {
            round1(tp as f64 / (tp + fn_) as f64 * 100.0)
        }
    }

    /// F1 percentage: harmonic mean of the (already rounded) precision
    /// and recall percentages
    pub fn f1(&self, items: &[ScoredItem]) -> f64 {
        let p = self.precision(items);
        let r = self.recall(items);
        if p + r == 0.0 {
            0.0
        } else {
            round1(2.0 * p * r / (p + r))
        }
    }

    /// Exact-match percentage over ALL items, placeholder items included.
    ///
    /// Without a threshold, an item matches when the system answer is a
    /// member of its gold set. With a threshold `t`, an item counts as
    /// correct iff
    /// `(answer in gold && score >= t) || (gold is placeholder && score <= t)` —
    /// the second arm rewards a correct abstention.
    pub fn exact_match(&self, items: &[ScoredItem]) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let matches = items
            .iter()
            .filter(|item| match self.threshold {
                None => item.gold.contains(&item.answer),
                Some(t) => {
                    (item.gold.contains(&item.answer) && item.score >= t)
                        || (item.gold.is_placeholder() && item.score <= t)
                }
            })
            .count();
        round1(matches as f64 / items.len() as f64 * 100.0)
    }

    /// All four metrics at once
    pub fn score(&self, items: &[ScoredItem]) -> EntityScores {
        EntityScores {
            precision: self.precision(items),
            recall: self.recall(items),
            f1: self.f1(items),
            exact_match: self.exact_match(items),
        }
    }
}

impl Default for EntityScorer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
