//! # Daily Digest
//!
//! A batch job that writes one news summary per category per run. For each
//! category it searches the last 24 hours of news, asks an OpenAI-compatible
//! model for a footnoted briefing grounded only in those results, and stores
//! the text in a Supabase table.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=... SERPER_API_KEY=... daily_digest -p ./prompts
//! ```
//!
//! ## Architecture
//!
//! 1. **Prompts**: load one instruction per category file
//! 2. **Search**: fetch recent articles per category (fail-open)
//! 3. **Dedup**: drop articles already used by an earlier category
//! 4. **Generate**: summarize with deterministic decoding
//! 5. **Persist**: store one record per category, whatever the outcome
//!
//! Only configuration problems stop the process (exit code 1). Search,
//! generation and persistence failures are recorded per category.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod error;
mod generator;
mod ledger;
mod models;
mod outputs;
mod pipeline;
mod prompts;
mod search;
mod store;
mod utils;

use api::OpenAiChat;
use cli::Cli;
use error::ConfigError;
use generator::SummaryGenerator;
use outputs::json::{RunArchive, write_archive};
use pipeline::Session;
use search::{EvidenceFetcher, SerperClient};
use store::{SummaryStore, SupabaseClient};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real environment variables still apply
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    run(Cli::parse()).await.inspect_err(|e| {
        error!(error = %e, "Fatal error; aborting run");
    })
}

async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!(date = %Utc::now().date_naive(), "daily_digest starting up");
    debug!(prompts_dir = %args.prompts_dir, max_results = args.max_results, model = %args.openai_model, "Parsed CLI arguments");

    // ---- Fatal preconditions ----
    let openai_key = args.require_openai_key()?;

    if let Some(dir) = args.json_output_dir.as_deref() {
        if let Err(source) = ensure_writable_dir(dir).await {
            return Err(ConfigError::OutputDirUnwritable {
                path: dir.to_string(),
                source,
            }
            .into());
        }
    }

    let categories = prompts::load_all(Path::new(&args.prompts_dir)).await?;

    // ---- Collaborators ----
    let serper = SerperClient::new(
        args.serper_api_key.clone(),
        Duration::from_secs(args.search_timeout_secs),
    )?;
    let chat = OpenAiChat::new(openai_key, &args.openai_base_url);
    let supabase = SupabaseClient::from_parts(
        args.supabase_url.as_deref(),
        args.supabase_key.as_deref(),
        &args.supabase_table,
    );
    if args.serper_api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
        warn!("SERPER_API_KEY not set; every category will be stored without a summary");
    }

    let store = SummaryStore::new(supabase);
    info!(
        categories = categories.len(),
        persistence = store.is_enabled(),
        table = %args.supabase_table,
        "Starting summary generation"
    );

    let mut session = Session::new(
        EvidenceFetcher::new(serper),
        SummaryGenerator::new(chat, args.openai_model.clone()),
        store,
        args.max_results,
    );
    let report = session.run(&categories).await;

    // ---- Optional local archive ----
    if let Some(dir) = args.json_output_dir.as_deref() {
        let archive = RunArchive::new(&report.records, Utc::now());
        if let Err(e) = write_archive(&archive, dir).await {
            error!(error = %e, "Failed to write JSON archive");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        generated = report.generated,
        sentinel = report.sentinel,
        failed = report.failed,
        persisted = report.persisted,
        "Execution complete"
    );
    Ok(())
}
