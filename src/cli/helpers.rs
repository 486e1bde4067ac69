//! Shared helper functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use pagefuse::config::Config;
use pagefuse::models::PageContent;

/// Page dumps come either as a bare array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageDump {
    Pages(Vec<PageContent>),
    Document { pages: Vec<PageContent> },
}

/// Read a JSON page dump.
pub async fn load_pages(path: &Path) -> anyhow::Result<Vec<PageContent>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let dump: PageDump = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse page dump {}", path.display()))?;
    Ok(match dump {
        PageDump::Pages(pages) => pages,
        PageDump::Document { pages } => pages,
    })
}

/// Load configuration from an explicit path, or discover it.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load().await),
    }
}
