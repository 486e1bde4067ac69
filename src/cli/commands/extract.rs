//! Document extraction command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use pagefuse::config::Config;
use pagefuse::models::{DocumentRecord, ExtractionMethod};
use pagefuse::services::{DocumentExtractor, ExtractionEvent};

use super::OutputFormat;
use crate::cli::helpers::load_pages;

/// Flags of the extract command.
pub struct ExtractOptions {
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub no_ocr: bool,
    pub no_vision: bool,
    pub jobs: Option<usize>,
}

pub async fn cmd_extract(
    mut config: Config,
    input: &Path,
    options: ExtractOptions,
) -> anyhow::Result<()> {
    if options.no_ocr {
        config.recognition.ocr_engine = "none".to_string();
    }
    if options.no_vision {
        config.recognition.vision_engine = "none".to_string();
    }
    if let Some(jobs) = options.jobs {
        config.recognition.page_concurrency = jobs;
    }
    config.validate()?;

    let pages = load_pages(input).await?;
    let total = pages.len();
    eprintln!(
        "{} Extracting {} pages from {}",
        style("→").cyan(),
        total,
        input.display()
    );

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );

    let (event_tx, mut event_rx) = mpsc::channel::<ExtractionEvent>(64);
    let pb = progress.clone();
    let reporter = tokio::spawn(async move {
        let mut failed_regions = 0usize;
        while let Some(event) = event_rx.recv().await {
            match event {
                ExtractionEvent::PageStarted {
                    index,
                    content_type,
                    images,
                } => {
                    pb.set_message(format!("page {} ({}, {} images)", index, content_type, images));
                }
                ExtractionEvent::RegionRecognized { method, .. } => {
                    if method == ExtractionMethod::Error {
                        failed_regions += 1;
                    }
                }
                ExtractionEvent::PageCompleted { .. } => pb.inc(1),
                ExtractionEvent::DocumentCompleted { .. } => pb.finish_and_clear(),
            }
        }
        failed_regions
    });

    let extractor = DocumentExtractor::from_config(&config).with_events(event_tx);
    let result = extractor.extract_document(pages).await;
    drop(extractor);
    let failed_regions = reporter.await.unwrap_or(0);
    progress.finish_and_clear();

    let document = result.context("Page dump violates the page contract")?;
    write_output(&document, &options)?;
    print_summary(&document, failed_regions);
    Ok(())
}

fn write_output(document: &DocumentRecord, options: &ExtractOptions) -> anyhow::Result<()> {
    let rendered = match options.format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Text => document.full_text.clone(),
    };

    match &options.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn print_summary(document: &DocumentRecord, failed_regions: usize) {
    let stats = &document.stats;
    eprintln!(
        "{} Extracted {} pages in {}ms",
        style("✓").green(),
        stats.total_pages,
        stats.elapsed_ms
    );
    for (method, count) in &stats.pages_by_method {
        eprintln!("  {:<20} {}", method.as_str(), count);
    }
    if failed_regions > 0 {
        eprintln!(
            "  {} {} image regions failed on both tracks ({} pages affected)",
            style("!").yellow(),
            failed_regions,
            stats.pages_with_errors
        );
    }
    if stats.is_scanned {
        eprintln!("  {} document has no text layer", style("i").dim());
    }
}
