//! Tailqa Eval - Scoring extracted answers against the gold standard
//!
//! Joins extraction records with the hand-annotated gold standard per
//! entity and computes precision, recall, F1, and exact-match rates,
//! with optional confidence-threshold variants, then aggregates scores
//! across entities and categories into delimited report files.
//!
//! All percentages are rounded to one decimal. Every zero-denominator
//! case uniformly yields 0.0.

pub mod aggregate;
pub mod gold;
pub mod scoring;

pub use aggregate::{
    averages_report, entity_scores_report, mean, write_style_comparison_csv, Aggregator,
    CategoryScoreRow,
};
pub use gold::{GoldRecord, GoldStore};
pub use scoring::{join_records, EntityScorer, EntityScores, MetricKind, ScoredItem};
