//! Evidence fetching from a news search API.
//!
//! The fetcher is fail-open: any transport, status, decode or credential
//! problem is logged and reported to the caller as an empty result, so one
//! category's search failure never aborts the run.
//!
//! Raw results are validated at ingestion. Items without a title, an absolute
//! http(s) link, or a snippet are dropped, duplicate links within a batch keep
//! only their first occurrence, and the output is capped at `max_results`.

use crate::error::EvidenceFetchError;
use crate::models::Evidence;
use crate::utils::{source_tag, truncate_for_log};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const SERPER_NEWS_URL: &str = "https://google.serper.dev/news";

/// Serper's "past day" time filter.
const LAST_24_HOURS: &str = "qdr:d";

/// Backend able to run one search request.
pub trait SearchApi {
    async fn search(&self, query: &str, num: usize) -> Result<SearchResponse, EvidenceFetchError>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
    tbs: &'a str,
}

/// Search response body. News results arrive under `news`; the web endpoint
/// uses `organic` with the same item shape.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub news: Vec<RawResult>,
    #[serde(default)]
    pub organic: Vec<RawResult>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Serper client. A missing key is not an error at construction time; every
/// search then fails with [`EvidenceFetchError::MissingCredential`].
#[derive(Debug)]
pub struct SerperClient {
    api_key: Option<String>,
    http: reqwest::Client,
    endpoint: String,
}

impl SerperClient {
    pub fn new(api_key: Option<String>, timeout: StdDuration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
            endpoint: SERPER_NEWS_URL.to_string(),
        })
    }
}

impl SearchApi for SerperClient {
    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str, num: usize) -> Result<SearchResponse, EvidenceFetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(EvidenceFetchError::MissingCredential);
        };

        let body = SearchRequest {
            q: query,
            num,
            tbs: LAST_24_HOURS,
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(EvidenceFetchError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&text, 300),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Result of one fetch: how many raw results the search returned, and the
/// usable evidence left after ingestion.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fetched {
    pub raw: usize,
    pub evidence: Vec<Evidence>,
}

impl Fetched {
    /// The search returned results but none survived ingestion.
    pub fn all_unusable(&self) -> bool {
        self.raw > 0 && self.evidence.is_empty()
    }
}

/// Fetches and validates evidence for a query.
#[derive(Debug)]
pub struct EvidenceFetcher<S> {
    api: S,
}

impl<S: SearchApi> EvidenceFetcher<S> {
    pub fn new(api: S) -> Self {
        Self { api }
    }

    /// Fetch at most `max_results` usable articles for `query`.
    ///
    /// Never fails; errors degrade to an empty [`Fetched`] with `raw == 0`.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, query: &str, max_results: usize) -> Fetched {
        if max_results == 0 {
            return Fetched::default();
        }
        let response = match self.api.search(query, max_results).await {
            Ok(r) => r,
            Err(EvidenceFetchError::MissingCredential) => {
                warn!("Search API key missing; continuing without evidence");
                return Fetched::default();
            }
            Err(e) => {
                warn!(error = %e, "Search failed; continuing without evidence");
                return Fetched::default();
            }
        };

        let raw = response.news.len() + response.organic.len();
        let evidence = ingest(response, max_results, Utc::now());
        info!(raw, usable = evidence.len(), "Fetched evidence");
        Fetched { raw, evidence }
    }
}

/// Validate and convert raw results, preserving upstream order.
pub fn ingest(response: SearchResponse, max_results: usize, now: DateTime<Utc>) -> Vec<Evidence> {
    let mut seen = HashSet::new();
    response
        .news
        .into_iter()
        .chain(response.organic)
        .filter_map(|raw| to_evidence(raw, now))
        .filter(|e| seen.insert(e.url.clone()))
        .take(max_results)
        .collect()
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn to_evidence(raw: RawResult, now: DateTime<Utc>) -> Option<Evidence> {
    let title = non_empty(raw.title)?;
    let url = non_empty(raw.link).filter(|l| is_resolvable(l))?;
    let Some(snippet) = non_empty(raw.snippet) else {
        debug!(%url, "Dropping result without snippet");
        return None;
    };
    let source_name = non_empty(raw.source)
        .or_else(|| source_tag(&url))
        .unwrap_or_default();
    let published_at = raw.date.as_deref().and_then(|d| parse_published(d, now));
    Some(Evidence {
        title,
        url,
        snippet,
        source_name,
        published_at,
    })
}

fn is_resolvable(link: &str) -> bool {
    Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

static RELATIVE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)\s*(sec|second|min|minute|hour|hr|day|week)s?\s+ago$").unwrap()
});

/// Parse an RFC 3339 timestamp or a relative form such as "3 hours ago".
pub fn parse_published(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let caps = RELATIVE_DATE.captures(raw)?;
    let n: i64 = caps[1].parse().ok()?;
    let delta = match caps[2].to_lowercase().as_str() {
        "sec" | "second" => Duration::try_seconds(n)?,
        "min" | "minute" => Duration::try_minutes(n)?,
        "hour" | "hr" => Duration::try_hours(n)?,
        "day" => Duration::try_days(n)?,
        "week" => Duration::try_weeks(n)?,
        _ => return None,
    };
    now.checked_sub_signed(delta)
}
