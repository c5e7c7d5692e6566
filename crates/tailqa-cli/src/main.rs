//! Tailqa CLI - Pipeline stage runner
//!
//! Usage:
//!   tailqa classify <titles.csv>
//!   tailqa questions --category Person --position SP --style BL
//!   tailqa extract --category Person --position SP --style BL
//!   tailqa import-gold <gold.csv> --position SP
//!   tailqa evaluate --position SP [--threshold 0.5]

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tailqa_core::{Category, PipelineConfig, Position, QuestionStyle};
use tailqa_corpus::{ArticleStore, CategoryIndex, ClassifierRules};
use tailqa_eval::{
    averages_report, entity_scores_report, join_records, mean, write_style_comparison_csv,
    Aggregator, EntityScorer, GoldStore, MetricKind,
};
use tailqa_extract::{AnswerExtractor, HttpQaModel, ResultStore};
use tailqa_question::{
    baseline_questions, translate::translated_questions, HttpTranslator, PropertyStore,
    QuestionBank,
};

#[derive(Parser)]
#[command(name = "tailqa")]
#[command(about = "Triple extraction and evaluation for infobox-less Wikipedia articles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify titles into categories and write the per-category CSVs
    Classify {
        /// CSV with Title and Categories columns (Categories ';'-joined)
        input: PathBuf,
    },
    /// Generate a question file from the property store
    Questions {
        #[arg(long)]
        category: Category,
        #[arg(long)]
        position: Position,
        #[arg(long)]
        style: QuestionStyle,
    },
    /// Run the QA extractor over a category's articles
    Extract {
        #[arg(long)]
        category: Category,
        #[arg(long)]
        position: Position,
        #[arg(long)]
        style: QuestionStyle,
    },
    /// Convert the annotated gold CSV into the JSONL gold store
    ImportGold {
        /// CSV with Subject, Predicate, Object columns
        input: PathBuf,
        #[arg(long)]
        position: Position,
    },
    /// Score all three question styles against the gold standard
    Evaluate {
        #[arg(long)]
        position: Position,
        /// Confidence threshold for the thresholded metric variants
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PipelineConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { input } => classify(&config, &input),
        Commands::Questions {
            category,
            position,
            style,
        } => questions(&config, category, position, style).await,
        Commands::Extract {
            category,
            position,
            style,
        } => extract(&config, category, position, style).await,
        Commands::ImportGold { input, position } => import_gold(&config, &input, position),
        Commands::Evaluate {
            position,
            threshold,
        } => evaluate(&config, position, threshold),
    }
}

// ============================================================================
// File layout conventions
// ============================================================================

fn category_csv_path(config: &PipelineConfig, category: Category) -> PathBuf {
    config
        .paths
        .data_dir
        .join("categories")
        .join(format!("{}.csv", category.plural_str()))
}

fn articles_path(config: &PipelineConfig, category: Category) -> PathBuf {
    config
        .paths
        .data_dir
        .join("articles")
        .join(format!("{}Articles.jsonl", category.plural_str()))
}

fn properties_path(config: &PipelineConfig, category: Category, position: Position) -> PathBuf {
    config
        .paths
        .data_dir
        .join("properties")
        .join(format!("{}Properties{}.csv", category.as_str(), position.code()))
}

fn questions_path(
    config: &PipelineConfig,
    category: Category,
    position: Position,
    style: QuestionStyle,
) -> PathBuf {
    config.paths.data_dir.join("questions").join(format!(
        "{}Questions{}_{}.txt",
        category.as_str(),
        position.code(),
        style.code()
    ))
}

fn results_path(
    config: &PipelineConfig,
    category: Category,
    position: Position,
    style: QuestionStyle,
) -> PathBuf {
    config
        .paths
        .results_dir
        .join(ResultStore::file_name(category, position, style))
}

fn gold_path(config: &PipelineConfig, position: Position) -> PathBuf {
    config.paths.eval_dir.join(GoldStore::file_name(position))
}

/// Threshold rendered for file names: 0.5 -> "T05"
fn threshold_tag(threshold: Option<f64>) -> String {
    match threshold {
        Some(t) => format!("T{}", t.to_string().replace('.', "")),
        None => String::new(),
    }
}

// ============================================================================
// Stage: classify
// ============================================================================

fn classify(config: &PipelineConfig, input: &PathBuf) -> anyhow::Result<()> {
    let rules = ClassifierRules::new();
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let headers = reader.headers()?.clone();
    let title_idx = headers
        .iter()
        .position(|h| h == "Title")
        .context("input needs a 'Title' column")?;
    let categories_idx = headers
        .iter()
        .position(|h| h == "Categories")
        .context("input needs a 'Categories' column")?;

    let mut index = CategoryIndex::new();
    let mut unmatched = 0usize;
    for record in reader.records() {
        let record = record?;
        let title = record.get(title_idx).unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }
        let category_strings: Vec<String> = record
            .get(categories_idx)
            .unwrap_or("")
            .split(';')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        match rules.classify(&category_strings) {
            Some(category) => index.insert(title, category),
            None => {
                unmatched += 1;
                warn!(title, "no classifier rule matched");
            }
        }
    }

    let out_dir = config.paths.data_dir.join("categories");
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    for category in Category::ALL {
        let titles = index.titles_in(category);
        if titles.is_empty() {
            continue;
        }
        let path = category_csv_path(config, category);
        index.save_csv(&path, category)?;
        info!(
            category = category.as_str(),
            entities = titles.len(),
            path = %path.display(),
            "category file written"
        );
    }
    info!(classified = index.len(), unmatched, "classification done");
    Ok(())
}

// ============================================================================
// Stage: questions
// ============================================================================

async fn questions(
    config: &PipelineConfig,
    category: Category,
    position: Position,
    style: QuestionStyle,
) -> anyhow::Result<()> {
    let properties = PropertyStore::load(properties_path(config, category, position))?;
    info!(
        category = category.as_str(),
        position = position.code(),
        properties = properties.len(),
        "properties loaded"
    );

    let generated = match style {
        QuestionStyle::Baseline => baseline_questions(&properties),
        QuestionStyle::Translated => {
            let translator = HttpTranslator::from_config(&config.translator);
            let pause = translator.pause();
            translated_questions(&properties, &translator, pause).await?
        }
        QuestionStyle::Human => {
            bail!(
                "human-generated questions are authored manually; place the file at {}",
                questions_path(config, category, position, style).display()
            )
        }
    };

    let path = questions_path(config, category, position, style);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    QuestionBank::save(&path, &generated)?;
    info!(questions = generated.len(), path = %path.display(), "question file written");
    Ok(())
}

// ============================================================================
// Stage: extract
// ============================================================================

async fn extract(
    config: &PipelineConfig,
    category: Category,
    position: Position,
    style: QuestionStyle,
) -> anyhow::Result<()> {
    let articles = ArticleStore::load(articles_path(config, category))?;
    let questions = QuestionBank::load(questions_path(config, category, position, style))?;
    let properties = PropertyStore::load(properties_path(config, category, position))?;
    QuestionBank::validate(&questions, &properties)?;

    let model = HttpQaModel::from_config(&config.qa)?;
    let extractor = AnswerExtractor::new(&model);

    info!(
        category = category.as_str(),
        position = position.code(),
        style = style.code(),
        entities = articles.len(),
        questions = questions.len(),
        "starting extraction"
    );

    let mut records = Vec::with_capacity(articles.len());
    for article in &articles {
        let record = extractor
            .extract(&article.title, &article.text, &questions, &properties)
            .await?;
        records.push(record);
    }

    let path = results_path(config, category, position, style);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ResultStore::save(&path, &records)?;
    info!(records = records.len(), path = %path.display(), "result store written");
    Ok(())
}

// ============================================================================
// Stage: import-gold
// ============================================================================

fn import_gold(config: &PipelineConfig, input: &PathBuf, position: Position) -> anyhow::Result<()> {
    let records = GoldStore::convert_csv(input, position)?;
    let path = gold_path(config, position);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    GoldStore::save(&path, &records)?;
    info!(entities = records.len(), path = %path.display(), "gold store written");
    Ok(())
}

// ============================================================================
// Stage: evaluate
// ============================================================================

fn evaluate(
    config: &PipelineConfig,
    position: Position,
    threshold: Option<f64>,
) -> anyhow::Result<()> {
    let threshold = threshold.or(config.scoring.threshold);
    let scorer = match threshold {
        Some(t) => EntityScorer::with_threshold(t)?,
        None => EntityScorer::new(),
    };

    let gold_records = GoldStore::load(gold_path(config, position))?;
    let gold_by_title: BTreeMap<&str, _> = gold_records
        .iter()
        .map(|record| (record.title.as_str(), record))
        .collect();
    info!(entities = gold_records.len(), position = position.code(), "gold standard loaded");

    // per style: entity -> all four metrics
    let mut style_scores: BTreeMap<QuestionStyle, Vec<(String, tailqa_eval::EntityScores)>> =
        BTreeMap::new();
    for style in QuestionStyle::ALL {
        let mut entity_scores = Vec::new();
        for category in Category::ALL {
            let path = results_path(config, category, position, style);
            if !path.exists() {
                continue;
            }
            for record in ResultStore::load(&path)? {
                let gold = gold_by_title.get(record.title.as_str()).with_context(|| {
                    format!("entity '{}' missing from the gold standard", record.title)
                })?;
                let items = join_records(&record, gold)?;
                entity_scores.push((record.title.clone(), scorer.score(&items)));
            }
        }
        if entity_scores.is_empty() {
            bail!(
                "no result stores found for style {} at position {}",
                style.code(),
                position.code()
            );
        }
        info!(style = style.code(), entities = entity_scores.len(), "style scored");
        style_scores.insert(style, entity_scores);
    }

    let index = load_category_index(config)?;
    let aggregator = Aggregator::new(index);
    let tag = threshold_tag(threshold);
    std::fs::create_dir_all(&config.paths.eval_dir)?;

    for metric in MetricKind::ALL {
        let per_style: BTreeMap<QuestionStyle, Vec<(String, f64)>> = style_scores
            .iter()
            .map(|(style, scores)| {
                (
                    *style,
                    scores
                        .iter()
                        .map(|(entity, s)| (entity.clone(), metric.of(s)))
                        .collect(),
                )
            })
            .collect();

        // per-entity comparison table across the three styles
        let csv_path = config
            .paths
            .eval_dir
            .join(format!("{}{}{}.csv", metric.code(), position.code(), tag));
        write_style_comparison_csv(
            &csv_path,
            metric,
            &per_style[&QuestionStyle::Baseline],
            &per_style[&QuestionStyle::Translated],
            &per_style[&QuestionStyle::Human],
        )?;

        // per-style text listings and category roll-up rows
        let mut category_rows = Vec::new();
        let mut averages = Vec::new();
        for style in QuestionStyle::ALL {
            let scores = &per_style[&style];
            let report = entity_scores_report(metric, position, style, scores);
            let report_path = config.paths.eval_dir.join(format!(
                "{}Result{}{}{}.txt",
                metric.code(),
                style.code(),
                position.code(),
                tag
            ));
            std::fs::write(&report_path, report)
                .with_context(|| format!("writing {}", report_path.display()))?;

            category_rows.extend(aggregator.category_rows(scores, style));
            averages.push((style, mean(&scores.iter().map(|(_, s)| *s).collect::<Vec<_>>())));
        }

        let category_csv = config.paths.eval_dir.join(format!(
            "{}CategoryScores{}{}.csv",
            metric.code(),
            position.code(),
            tag
        ));
        Aggregator::write_category_csv(&category_csv, &category_rows)?;

        println!("{}", averages_report(metric, position, &averages));
    }

    info!(position = position.code(), threshold = ?threshold, "evaluation done");
    Ok(())
}

/// Load the full entity -> category index from the per-category CSVs
fn load_category_index(config: &PipelineConfig) -> anyhow::Result<CategoryIndex> {
    let mut index = CategoryIndex::new();
    for category in Category::ALL {
        let path = category_csv_path(config, category);
        if path.exists() {
            index.load_csv(&path, category)?;
        }
    }
    if index.is_empty() {
        warn!("category index is empty; category aggregates will be empty");
    }
    Ok(index)
}
