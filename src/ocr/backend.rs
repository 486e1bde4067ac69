//! Recognition engine abstraction.
//!
//! Engines are black boxes with a request/response contract: image bytes in,
//! text (and maybe a confidence) out. Two kinds feed the dual-track pipeline:
//! - OCR engines (Tesseract via command-line)
//! - Vision models (any OpenAI-compatible multimodal chat API)

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use super::tesseract::TesseractEngine;
use super::vision_api::VisionApiEngine;
use crate::config::{Config, RecognitionConfig};
use crate::models::{EngineOutput, EngineTag};

/// Errors from recognition engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine not available: {0}")]
    NotAvailable(String),

    #[error("Recognition failed: {0}")]
    Failed(String),

    #[error("Rate limited by {engine}, retry after {retry_after_secs:?}s")]
    RateLimited {
        engine: String,
        retry_after_secs: Option<u64>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Trait for recognition engines.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Track this engine feeds.
    fn engine_tag(&self) -> EngineTag;

    /// Engine identifier (e.g. "tesseract", "vision-api").
    fn name(&self) -> &str;

    /// Check if this engine can be called (binary installed, key present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Recognize text in one encoded image of type `mime` (e.g. "image/png").
    async fn recognize(&self, image: &[u8], mime: &str) -> Result<EngineOutput, EngineError>;

    /// Model name for this engine, if applicable.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// Engine identifiers accepted by [`create_engine`].
pub const ENGINE_NAMES: &[&str] = &["tesseract", "vision-api", "qwen-vl", "openai", "none"];

/// Build the engine named `name`, or `None` if it is disabled or unknown.
pub fn create_engine(name: &str, config: &Config) -> Option<Arc<dyn RecognitionEngine>> {
    let name = RecognitionConfig::engine_enabled(name)?;
    match name.to_lowercase().as_str() {
        "tesseract" => Some(Arc::new(TesseractEngine::new(config.tesseract.clone()))),
        "vision-api" | "vision" | "qwen-vl" | "qwen" | "openai" => {
            Some(Arc::new(VisionApiEngine::new(config.vision.clone())))
        }
        other => {
            warn!(
                "Unknown recognition engine '{}', track disabled (known: {})",
                other,
                ENGINE_NAMES.join(", ")
            );
            None
        }
    }
}
