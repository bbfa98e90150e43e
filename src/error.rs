//! Error taxonomy for the summary pipeline.
//!
//! Only [`ConfigError`] ever terminates the process. The other three kinds are
//! recovered by the component that produces them and turned into a logged,
//! persisted outcome so a run always covers every loaded category.

use thiserror::Error;

/// Fatal configuration problems detected before any category is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was not supplied.
    #[error("required credential {0} is not set")]
    MissingCredential(&'static str),

    /// The prompt directory could not be listed at all.
    #[error("cannot read prompt directory {path}: {source}")]
    PromptDirUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The prompt directory has no eligible category files.
    #[error("no category instruction files found in {0}")]
    NoCategories(String),

    /// Every eligible category file failed to load.
    #[error("all {0} category instruction files in {1} failed to load")]
    AllCategoriesFailed(usize, String),

    /// The JSON archive directory is not writable.
    #[error("output directory {path} is not writable: {source}")]
    OutputDirUnwritable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while fetching or decoding search results for one category.
#[derive(Debug, Error)]
pub enum EvidenceFetchError {
    #[error("search API key is not configured")]
    MissingCredential,

    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a category did not get a generated summary.
///
/// The `Display` text of each variant is exactly what gets persisted as the
/// category's summary, so the wording is part of the stored-data contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Nothing was handed to the generator.
    #[error("Insufficient data: no source articles were available to summarize.")]
    NoEvidence,

    /// Evidence arrived, but none of it had a usable link and snippet.
    #[error("Error: Insufficient data - fetched articles had no usable links or snippets.")]
    UnusableEvidence,

    /// Transport or API-level failure from the text-generation service.
    #[error("Error: generation request failed: {0}")]
    Api(String),

    /// The service answered but returned no message content.
    #[error("Error: no content received from the generation API.")]
    EmptyResponse,
}

impl GenerationError {
    /// True for variants whose persisted text carries the `Error:` tag.
    pub fn is_error_tagged(&self) -> bool {
        !matches!(self, GenerationError::NoEvidence)
    }
}

/// Failure writing a summary row to the datastore.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("datastore request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("datastore rejected write ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("datastore returned no rows: {0}")]
    NoRows(String),
}
