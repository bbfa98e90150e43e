//! Category instruction loading.
//!
//! Each eligible file in the prompt directory holds the full instruction for
//! one news category. The category name comes from the filename:
//! `world-news.md` becomes `"World News"`.

use crate::error::ConfigError;
use crate::models::CategoryInstruction;
use crate::utils::title_case;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Filenames reserved for aggregate or legacy instructions.
const RESERVED_FILENAMES: &[&str] = &["daily-prompts.md", "prompts.md", "readme.md"];

/// Derive a display name from a filename.
///
/// Drops the extension, treats `-`, `_` and `.` as word separators, and
/// title-cases the result. Returns `None` when nothing is left.
pub fn category_name_from_filename(filename: &str) -> Option<String> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let spaced = stem.replace(['-', '_', '.'], " ");
    let name = title_case(&spaced);
    if name.is_empty() { None } else { Some(name) }
}

fn is_eligible(filename: &str) -> bool {
    if filename.starts_with('.') {
        return false;
    }
    let lower = filename.to_lowercase();
    !RESERVED_FILENAMES.contains(&lower.as_str())
}

/// Load every category instruction from `dir`, ordered by filename.
///
/// A single unreadable or empty file is skipped with a warning. Zero eligible
/// files, or zero that load, is a [`ConfigError`].
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn load_all(dir: &Path) -> Result<Vec<CategoryInstruction>, ConfigError> {
    let dir_label = dir.display().to_string();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|source| ConfigError::PromptDirUnreadable {
            path: dir_label.clone(),
            source,
        })?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(ConfigError::PromptDirUnreadable {
                    path: dir_label,
                    source,
                });
            }
        };
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping non-UTF-8 filename");
            continue;
        };
        if !is_eligible(&filename) {
            debug!(%filename, "Skipping reserved prompt file");
            continue;
        }
        files.push((filename, entry.path()));
    }

    if files.is_empty() {
        return Err(ConfigError::NoCategories(dir_label));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let eligible = files.len();
    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(eligible);
    for (filename, path) in files {
        let Some(category) = category_name_from_filename(&filename) else {
            warn!(%filename, "Cannot derive a category name; skipping");
            continue;
        };
        let instruction = match fs::read_to_string(&path).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(%filename, error = %e, "Failed to read category instruction; skipping");
                continue;
            }
        };
        if instruction.is_empty() {
            warn!(%filename, %category, "Category instruction is empty; skipping");
            continue;
        }
        if !seen.insert(category.clone()) {
            warn!(%filename, %category, "Duplicate category name; keeping the first file");
            continue;
        }
        debug!(%filename, %category, "Loaded category instruction");
        categories.push(CategoryInstruction {
            category,
            instruction,
        });
    }

    if categories.is_empty() {
        return Err(ConfigError::AllCategoriesFailed(eligible, dir_label));
    }
    info!(count = categories.len(), "Loaded category instructions");
    Ok(categories)
}
