//! Category classification and wikitext scanning
//!
//! Classification is an ordered keyword table evaluated top to bottom,
//! first match wins. The table replaces the original conditional chain so
//! precedence and coverage stay testable. Keywords are matched
//! case-insensitively as substrings of the article's Wikipedia category
//! strings.

use regex::Regex;
use tailqa_core::Category;

// ============================================================================
// Classifier Rules
// ============================================================================

/// One keyword rule: a lowercase substring and the category it selects
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pub keyword: String,
    pub category: Category,
}

/// Ordered keyword rules mapping Wikipedia category strings to the
/// closed category set
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    rules: Vec<ClassifierRule>,
}

impl ClassifierRules {
    /// Build the default rule table for the German Wikipedia corpus.
    ///
    /// Person rules come first: biography articles carry many incidental
    /// categories, so the birth/death markers must take precedence.
    pub fn new() -> Self {
        let mut rules = Self { rules: Vec::new() };

        rules.add("geboren", Category::Person);
        rules.add("gestorben", Category::Person);
        rules.add("mann", Category::Person);
        rules.add("frau", Category::Person);
        rules.add("person", Category::Person);

        rules.add("bauwerk", Category::Building);
        rules.add("krankheit", Category::Disease);
        rules.add("parasit", Category::Disease);
        rules.add("geschichte", Category::History);
        rules.add("literatur", Category::Literature);
        rules.add("zeitschrift", Category::Magazine);
        rules.add("zeitung", Category::Newspaper);
        rules.add("organisation", Category::Organization);
        rules.add("park", Category::Park);
        rules.add("schul", Category::School);
        rules.add("schiff", Category::Ship);

        rules
    }

    /// Start from an empty table (rules added in evaluation order)
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule to the end of the evaluation order
    pub fn add(&mut self, keyword: &str, category: Category) {
        self.rules.push(ClassifierRule {
            keyword: keyword.to_lowercase(),
            category,
        });
    }

    /// Number of rules in the table
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify an article from its Wikipedia category strings.
    ///
    /// Rules are tried in table order against every category string;
    /// the first rule whose keyword occurs in any string wins. Returns
    /// `None` when no rule matches.
    pub fn classify(&self, category_strings: &[String]) -> Option<Category> {
        for rule in &self.rules {
            if category_strings
                .iter()
                .any(|cat| cat.to_lowercase().contains(&rule.keyword))
            {
                return Some(rule.category);
            }
        }
        None
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Wikitext Scanner
// ============================================================================

/// Regex helpers over raw article wikitext
pub struct WikitextScanner {
    category_re: Regex,
    infobox_re: Regex,
}

impl WikitextScanner {
    pub fn new() -> Self {
        Self {
            // Kategorie tags sit at the article tail, one per line
            category_re: Regex::new(r"(?i)\[\[Kategorie:([^\]|]+)(?:\|[^\]]*)?\]\]")
                .unwrap_or_else(|e| unreachable!("static regex: {e}")),
            // Matches Infobox/Taxobox templates with optional spacing
            infobox_re: Regex::new(r"(?i)\{\{\s?(info|taxo)box")
                .unwrap_or_else(|e| unreachable!("static regex: {e}")),
        }
    }

    /// Extract every `[[Kategorie:...]]` tag value from the wikitext
    pub fn categories(&self, wikitext: &str) -> Vec<String> {
        self.category_re
            .captures_iter(wikitext)
            .map(|cap| cap[1].trim().to_string())
            .collect()
    }

    /// True when the article carries an infobox (or taxobox) template.
    ///
    /// Articles WITH an infobox are dropped by the selection stage; the
    /// pipeline only targets the remaining tail entities.
    pub fn has_infobox(&self, wikitext: &str) -> bool {
        self.infobox_re.is_match(wikitext)
    }
}

impl Default for WikitextScanner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
