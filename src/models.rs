//! Data models shared across the pipeline.
//!
//! - [`CategoryInstruction`]: one news category and its instruction text
//! - [`Evidence`]: a fetched article used as generation context
//! - [`SummaryOutcome`]: what the pipeline produced for a category
//! - [`SummaryRecord`]: the row persisted once per category per run

use crate::error::GenerationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted text for a category whose search returned nothing.
pub const NO_ARTICLES_TEXT: &str = "No relevant news articles found in the last 24 hours.";

/// A news category loaded from the prompt directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInstruction {
    /// Human-readable category name, e.g. "World News".
    pub category: String,
    /// Free-text instruction for the generation API.
    pub instruction: String,
}

/// A single article returned by the search API.
///
/// Instances are only built through ingestion in [`crate::search`], which
/// guarantees non-empty `title`, `url` and `snippet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Evidence {
    /// Whether the item still carries the fields the generator needs.
    pub fn is_usable(&self) -> bool {
        !self.url.trim().is_empty() && !self.snippet.trim().is_empty()
    }
}

/// Result of processing one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Generated summary text plus the URLs it was built from.
    Generated { text: String, sources: Vec<String> },
    /// The search returned no evidence at all.
    NoArticles,
    /// Generation was skipped or failed.
    Failed(GenerationError),
}

impl SummaryOutcome {
    /// The text persisted as the record's summary.
    pub fn summary_text(&self) -> String {
        match self {
            SummaryOutcome::Generated { text, .. } => text.clone(),
            SummaryOutcome::NoArticles => NO_ARTICLES_TEXT.to_string(),
            SummaryOutcome::Failed(e) => e.to_string(),
        }
    }

    /// The sources column: a JSON array of URLs, `[]` when none were used.
    pub fn sources_field(&self) -> String {
        match self {
            SummaryOutcome::Generated { sources, .. } => {
                serde_json::to_string(sources).unwrap_or_else(|_| "[]".to_string())
            }
            _ => "[]".to_string(),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, SummaryOutcome::Generated { .. })
    }

    pub fn is_error_tagged(&self) -> bool {
        matches!(self, SummaryOutcome::Failed(e) if e.is_error_tagged())
    }
}

/// One row of the summaries table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub category: String,
    #[serde(rename = "generation_date")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "summary")]
    pub summary_text: String,
    #[serde(rename = "sources")]
    pub sources_field: String,
}

impl SummaryRecord {
    pub fn new(category: &str, outcome: &SummaryOutcome, generated_at: DateTime<Utc>) -> Self {
        Self {
            category: category.to_string(),
            generated_at,
            summary_text: outcome.summary_text(),
            sources_field: outcome.sources_field(),
        }
    }
}
