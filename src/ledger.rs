//! Run-scoped record of article URLs already attributed to a category.

use crate::models::Evidence;
use std::collections::HashSet;

/// URLs used by earlier categories in the current run.
///
/// Never persisted; a fresh ledger is created per run.
#[derive(Debug, Default)]
pub struct DedupLedger {
    used: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the items whose URL has not been used yet, in their original order.
    pub fn filter(&self, evidence: Vec<Evidence>) -> Vec<Evidence> {
        evidence
            .into_iter()
            .filter(|e| !self.used.contains(&e.url))
            .collect()
    }

    /// Mark every item's URL as used. Re-recording a URL is a no-op.
    pub fn record(&mut self, evidence: &[Evidence]) {
        self.used.extend(evidence.iter().map(|e| e.url.clone()));
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(url: &str) -> Evidence {
        Evidence {
            title: format!("Title for {url}"),
            url: url.to_string(),
            snippet: "snippet".to_string(),
            source_name: "example".to_string(),
            published_at: None,
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let mut ledger = DedupLedger::new();
        ledger.record(&[ev("https://a.com/2")]);

        let kept = ledger.filter(vec![ev("https://a.com/3"), ev("https://a.com/2"), ev("https://a.com/1")]);
        let urls: Vec<_> = kept.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/3", "https://a.com/1"]);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut ledger = DedupLedger::new();
        ledger.record(&[ev("https://a.com/1")]);
        ledger.record(&[ev("https://a.com/1"), ev("https://a.com/1")]);

        assert_eq!(ledger.len(), 1);
        assert!(ledger.filter(vec![ev("https://a.com/1")]).is_empty());
    }

    #[test]
    fn test_empty_ledger_passes_everything() {
        let ledger = DedupLedger::new();
        assert_eq!(ledger.filter(vec![ev("https://a.com/1")]).len(), 1);
    }
}
