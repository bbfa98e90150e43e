//! Command-line interface definitions for Daily Digest.
//!
//! Every option can be given as a flag or through its environment variable.
//! `main` loads a `.env` file from the working directory before parsing.

use crate::error::ConfigError;
use clap::Parser;

/// Command-line arguments for the Daily Digest batch job.
///
/// # Examples
///
/// ```sh
/// # Credentials from the environment, prompts from ./prompts
/// daily_digest
///
/// # Custom prompt directory, more evidence, and a local JSON archive
/// daily_digest -p ./categories -n 8 -j ./archive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory with one instruction file per news category
    #[arg(short, long, env = "PROMPTS_DIR", default_value = "prompts")]
    pub prompts_dir: String,

    /// Maximum number of articles used per category
    #[arg(short = 'n', long, env = "MAX_RESULTS", default_value_t = 5)]
    pub max_results: usize,

    /// Timeout for each search request, in seconds
    #[arg(long, env = "SEARCH_TIMEOUT_SECS", default_value_t = 10)]
    pub search_timeout_secs: u64,

    /// Optional directory for a JSON archive of the run
    #[arg(short, long, env = "JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,

    /// OpenAI API key (required)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Model used for summary generation
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub openai_model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = crate::api::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Serper API key; without it every category gets no evidence
    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true)]
    pub serper_api_key: Option<String>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase API key
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Table that receives summary rows
    #[arg(long, env = "SUPABASE_TABLE", default_value = crate::store::DEFAULT_TABLE)]
    pub supabase_table: String,
}

impl Cli {
    /// The generation API key, or a fatal error when it is absent or blank.
    pub fn require_openai_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))
    }
}
