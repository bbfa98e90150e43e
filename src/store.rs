//! Summary persistence.
//!
//! Rows go to a Supabase (PostgREST) table through the [`TableWriter`] seam.
//! A store built without a client logs and skips every save, and a failed
//! write is logged with the attempted record and never surfaces to the
//! caller, so persistence problems cannot stop later categories.

use crate::error::PersistenceError;
use crate::models::SummaryRecord;
use crate::utils::truncate_for_log;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_TABLE: &str = "daily_summaries";

/// Anything that can insert a summary row and report what came back.
pub trait TableWriter {
    async fn insert(&self, record: &SummaryRecord) -> Result<InsertResponse, PersistenceError>;
}

/// What the datastore returned for an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertResponse {
    pub status: u16,
    pub body: Value,
}

/// PostgREST error payload. Field presence varies between gateway and
/// database errors.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorPayload {
    /// Best available detail: `error`, then `message`, then `details`,
    /// tagged with the error code and hint when present.
    pub fn detail(&self) -> Option<String> {
        let error = self.error.as_ref().and_then(|v| match v {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        let mut detail = error
            .or_else(|| self.message.clone().filter(|m| !m.is_empty()))
            .or_else(|| self.details.clone().filter(|d| !d.is_empty()))?;
        if let Some(code) = self.code.as_deref().filter(|c| !c.is_empty()) {
            detail = format!("[{code}] {detail}");
        }
        if let Some(hint) = self.hint.as_deref().filter(|h| !h.is_empty()) {
            detail = format!("{detail} (hint: {hint})");
        }
        Some(detail)
    }
}

/// Interpret an insert response: success only when at least one row came back.
pub fn check_response(resp: &InsertResponse) -> Result<usize, PersistenceError> {
    if let Value::Array(rows) = &resp.body {
        if !rows.is_empty() && (200..300).contains(&resp.status) {
            return Ok(rows.len());
        }
    }
    let detail = serde_json::from_value::<ErrorPayload>(resp.body.clone())
        .ok()
        .and_then(|p| p.detail())
        .unwrap_or_else(|| "Unknown error".to_string());
    if (200..300).contains(&resp.status) {
        Err(PersistenceError::NoRows(detail))
    } else {
        Err(PersistenceError::Rejected {
            status: resp.status,
            detail,
        })
    }
}

/// Supabase REST client for a single table.
#[derive(Debug)]
pub struct SupabaseClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(project_url: &str, api_key: &str, table: &str) -> Self {
        Self {
            endpoint: format!("{}/rest/v1/{}", project_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Build a client only when both URL and key are present and non-blank.
    pub fn from_parts(url: Option<&str>, key: Option<&str>, table: &str) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let key = key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self::new(url, key, table))
    }
}

impl TableWriter for SupabaseClient {
    async fn insert(&self, record: &SummaryRecord) -> Result<InsertResponse, PersistenceError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(InsertResponse { status, body })
    }
}

/// Persists one record per category. Holds no client when datastore
/// credentials were not configured.
#[derive(Debug)]
pub struct SummaryStore<W> {
    writer: Option<W>,
}

impl<W: TableWriter> SummaryStore<W> {
    pub fn new(writer: Option<W>) -> Self {
        if writer.is_none() {
            warn!("Datastore credentials not configured; summaries will not be persisted");
        }
        Self { writer }
    }

    #[cfg(test)]
    pub fn writer(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Save `record`. Returns whether the row was stored; failures are logged.
    #[instrument(level = "info", skip_all, fields(category = %record.category))]
    pub async fn save(&self, record: &SummaryRecord) -> bool {
        let Some(writer) = self.writer.as_ref() else {
            warn!("Datastore client not initialized; skipping save");
            return false;
        };

        let outcome = match writer.insert(record).await {
            Ok(resp) => check_response(&resp),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(rows) => {
                info!(rows, "Saved summary");
                true
            }
            Err(e) => {
                let attempted = serde_json::to_string(record).unwrap_or_default();
                error!(
                    error = %e,
                    attempted = %truncate_for_log(&attempted, 500),
                    "Failed to save summary; check the table exists with the expected columns and permissions"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryOutcome;
    use chrono::Utc;
    use serde_json::json;
    use std::cell::RefCell;

    struct FakeWriter {
        reply: fn() -> Result<InsertResponse, PersistenceError>,
        seen: RefCell<Vec<SummaryRecord>>,
    }

    impl TableWriter for FakeWriter {
        async fn insert(&self, record: &SummaryRecord) -> Result<InsertResponse, PersistenceError> {
            self.seen.borrow_mut().push(record.clone());
            (self.reply)()
        }
    }

    fn record() -> SummaryRecord {
        SummaryRecord::new("World News", &SummaryOutcome::NoArticles, Utc::now())
    }

    fn resp(status: u16, body: Value) -> InsertResponse {
        InsertResponse { status, body }
    }

    #[test]
    fn test_check_response_success() {
        let r = resp(201, json!([{"id": 1, "category": "World News"}]));
        assert_eq!(check_response(&r).unwrap(), 1);
    }

    #[test]
    fn test_check_response_prefers_error_field() {
        let r = resp(
            200,
            json!({"error": "permission denied", "message": "other", "details": "more"}),
        );
        match check_response(&r) {
            Err(PersistenceError::NoRows(detail)) => assert_eq!(detail, "permission denied"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_check_response_falls_back_to_message_then_details() {
        let r = resp(
            404,
            json!({"code": "42P01", "message": "relation \"daily_summaries\" does not exist", "details": null}),
        );
        match check_response(&r) {
            Err(PersistenceError::Rejected { status, detail }) => {
                assert_eq!(status, 404);
                assert_eq!(detail, "[42P01] relation \"daily_summaries\" does not exist");
            }
            other => panic!("unexpected {other:?}"),
        }

        let r = resp(400, json!({"details": "bad column"}));
        assert!(check_response(&r).unwrap_err().to_string().contains("bad column"));
    }

    #[test]
    fn test_check_response_empty_rows() {
        let err = check_response(&resp(201, json!([]))).unwrap_err();
        assert!(matches!(err, PersistenceError::NoRows(ref d) if d == "Unknown error"));
        let err = check_response(&resp(204, Value::Null)).unwrap_err();
        assert!(matches!(err, PersistenceError::NoRows(_)));
    }

    #[test]
    fn test_from_parts_requires_both() {
        assert!(SupabaseClient::from_parts(Some("https://x.supabase.co"), None, DEFAULT_TABLE).is_none());
        assert!(SupabaseClient::from_parts(None, Some("key"), DEFAULT_TABLE).is_none());
        assert!(SupabaseClient::from_parts(Some(" "), Some("key"), DEFAULT_TABLE).is_none());
        let client =
            SupabaseClient::from_parts(Some("https://x.supabase.co/"), Some("key"), DEFAULT_TABLE).unwrap();
        assert_eq!(client.endpoint, "https://x.supabase.co/rest/v1/daily_summaries");
    }

    #[tokio::test]
    async fn test_save_without_client_is_noop() {
        let store: SummaryStore<FakeWriter> = SummaryStore::new(None);
        assert!(!store.is_enabled());
        assert!(!store.save(&record()).await);
    }

    #[tokio::test]
    async fn test_save_success() {
        let store = SummaryStore::new(Some(FakeWriter {
            reply: || Ok(InsertResponse { status: 201, body: json!([{"id": 7}]) }),
            seen: RefCell::new(Vec::new()),
        }));
        assert!(store.save(&record()).await);
    }

    #[tokio::test]
    async fn test_save_error_payload_returns_normally() {
        let store = SummaryStore::new(Some(FakeWriter {
            reply: || Ok(InsertResponse { status: 200, body: json!({"error": "insert failed"}) }),
            seen: RefCell::new(Vec::new()),
        }));
        let rec = record();
        assert!(!store.save(&rec).await);
        let writer = store.writer.as_ref().unwrap();
        assert_eq!(writer.seen.borrow().as_slice(), &[rec]);
    }

    #[tokio::test]
    async fn test_save_transport_error_returns_normally() {
        let store = SummaryStore::new(Some(FakeWriter {
            reply: || Err(PersistenceError::Rejected { status: 503, detail: "unavailable".into() }),
            seen: RefCell::new(Vec::new()),
        }));
        assert!(!store.save(&record()).await);
    }
}
