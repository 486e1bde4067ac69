//! Page classification command.

use std::path::Path;

use console::style;
use serde::Serialize;

use pagefuse::analysis::{PageClassifier, PageSignals};
use pagefuse::config::Config;
use pagefuse::models::ContentType;
use pagefuse::services::validate_pages;

use crate::cli::helpers::load_pages;

#[derive(Serialize)]
struct ClassifiedPage {
    index: u32,
    content_type: ContentType,
    signals: PageSignals,
}

pub async fn cmd_classify(config: &Config, input: &Path, json: bool) -> anyhow::Result<()> {
    let pages = load_pages(input).await?;
    validate_pages(&pages)?;

    let classifier = PageClassifier::new(config.classifier.clone());
    let classified: Vec<ClassifiedPage> = pages
        .iter()
        .map(|page| {
            let signals = PageSignals::from_page(page);
            ClassifiedPage {
                index: page.index,
                content_type: classifier.classify_signals(signals),
                signals,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    println!(
        "{} {} pages (text threshold: {} chars)",
        style("→").cyan(),
        classified.len(),
        classifier.threshold()
    );
    for page in &classified {
        println!(
            "  {:>4}  {:<18} text={} blocks={} images={}",
            page.index,
            page.content_type.as_str(),
            page.signals.native_text_chars,
            page.signals.text_blocks,
            page.signals.image_count
        );
    }
    Ok(())
}
