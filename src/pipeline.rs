//! Per-category orchestration.
//!
//! A [`Session`] is built once per run and owns every collaborator together
//! with the run's [`DedupLedger`]. Categories are processed strictly one after
//! another in load order:
//!
//! 1. fetch evidence (results that were all unusable are an error)
//! 2. drop URLs already used by an earlier category
//! 3. generate a summary (or a sentinel)
//! 4. mark the used URLs
//! 5. persist exactly one record

use crate::api::AskAsync;
use crate::error::GenerationError;
use crate::generator::SummaryGenerator;
use crate::ledger::DedupLedger;
use crate::models::{CategoryInstruction, SummaryOutcome, SummaryRecord};
use crate::search::{EvidenceFetcher, SearchApi};
use crate::store::{SummaryStore, TableWriter};
use chrono::Utc;
use tracing::{info, instrument, warn};

/// Search query used for a category.
pub fn search_query(category: &str) -> String {
    format!("{category} last 24 hours")
}

/// Outcome of a full pass over the loaded categories.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<SummaryRecord>,
    pub generated: usize,
    pub sentinel: usize,
    pub failed: usize,
    pub persisted: usize,
}

pub struct Session<S, A, W> {
    fetcher: EvidenceFetcher<S>,
    generator: SummaryGenerator<A>,
    store: SummaryStore<W>,
    ledger: DedupLedger,
    max_results: usize,
}

impl<S, A, W> Session<S, A, W>
where
    S: SearchApi,
    A: AskAsync,
    W: TableWriter,
{
    pub fn new(
        fetcher: EvidenceFetcher<S>,
        generator: SummaryGenerator<A>,
        store: SummaryStore<W>,
        max_results: usize,
    ) -> Self {
        Self {
            fetcher,
            generator,
            store,
            ledger: DedupLedger::new(),
            max_results,
        }
    }

    /// Process every category and persist one record for each.
    pub async fn run(&mut self, categories: &[CategoryInstruction]) -> RunReport {
        let mut report = RunReport::default();
        let total = categories.len();

        for (i, ci) in categories.iter().enumerate() {
            info!(index = i + 1, total, category = %ci.category, "Processing category");
            let outcome = self.process(ci).await;

            if outcome.is_generated() {
                report.generated += 1;
            } else if outcome.is_error_tagged() {
                report.failed += 1;
            } else {
                report.sentinel += 1;
            }

            let record = SummaryRecord::new(&ci.category, &outcome, Utc::now());
            if self.store.save(&record).await {
                report.persisted += 1;
            }
            report.records.push(record);
        }

        info!(
            categories = total,
            generated = report.generated,
            sentinel = report.sentinel,
            failed = report.failed,
            persisted = report.persisted,
            used_urls = self.ledger.len(),
            "Run complete"
        );
        report
    }

    #[instrument(level = "info", skip_all, fields(category = %ci.category))]
    async fn process(&mut self, ci: &CategoryInstruction) -> SummaryOutcome {
        let fetched = self
            .fetcher
            .fetch(&search_query(&ci.category), self.max_results)
            .await;
        if fetched.all_unusable() {
            warn!(raw = fetched.raw, "Every fetched article lacked a link or snippet");
            return SummaryOutcome::Failed(GenerationError::UnusableEvidence);
        }
        if fetched.evidence.is_empty() {
            warn!("No articles found; storing sentinel");
            return SummaryOutcome::NoArticles;
        }

        let fetched_count = fetched.evidence.len();
        let evidence = self.ledger.filter(fetched.evidence);
        if evidence.len() < fetched_count {
            info!(
                dropped = fetched_count - evidence.len(),
                "Dropped articles already used by earlier categories"
            );
        }

        let result = self
            .generator
            .generate(&ci.category, &ci.instruction, &evidence)
            .await;
        if !evidence.is_empty() {
            self.ledger.record(&evidence);
        }

        match result {
            Ok(text) => SummaryOutcome::Generated {
                text,
                sources: evidence.iter().map(|e| e.url.clone()).collect(),
            },
            Err(e) => {
                warn!(error = %e, "No summary generated");
                SummaryOutcome::Failed(e)
            }
        }
    }
}
