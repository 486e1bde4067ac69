//! Recognition track outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which recognition track produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineTag {
    /// Classic OCR engine.
    Ocr,
    /// Multimodal vision model.
    Vision,
}

impl EngineTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineTag::Ocr => "ocr",
            EngineTag::Vision => "vision",
        }
    }
}

impl std::fmt::Display for EngineTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a track did not produce usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("engine error: {message}")]
    EngineError { message: String },

    #[error("engine returned no text")]
    EmptyResult,

    #[error("engine unavailable: {message}")]
    Unavailable { message: String },

    #[error("track disabled")]
    Disabled,
}

/// Raw output of one engine call, before the track judges it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// Engine-reported confidence (0.0 - 1.0), if the engine reports one.
    pub confidence: Option<f64>,
    /// Model used, for engines that have one.
    pub model: Option<String>,
}

impl EngineOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            model: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Result of one recognition track. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    pub engine: EngineTag,
    /// Engine identifier (e.g. "tesseract", "vision-api").
    pub engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub text: String,
    /// Confidence in [0, 1]; 0 when the engine reports none.
    pub confidence: f64,
    pub elapsed_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl RecognitionResult {
    pub fn succeeded(
        engine: EngineTag,
        engine_name: impl Into<String>,
        output: EngineOutput,
        elapsed: Duration,
    ) -> Self {
        Self {
            engine,
            engine_name: engine_name.into(),
            model: output.model,
            text: output.text,
            confidence: output
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(0.0),
            elapsed_ms: elapsed.as_millis() as u64,
            success: true,
            failure: None,
        }
    }

    pub fn failed(
        engine: EngineTag,
        engine_name: impl Into<String>,
        reason: FailureReason,
        elapsed: Duration,
    ) -> Self {
        Self {
            engine,
            engine_name: engine_name.into(),
            model: None,
            text: String::new(),
            confidence: 0.0,
            elapsed_ms: elapsed.as_millis() as u64,
            success: false,
            failure: Some(reason),
        }
    }

    /// Result for a track that is not configured.
    pub fn disabled(engine: EngineTag) -> Self {
        Self::failed(engine, "none", FailureReason::Disabled, Duration::ZERO)
    }
}

/// Provenance of one track, kept on the region record after fusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub success: bool,
    pub confidence: f64,
    pub elapsed_ms: u64,
    pub text_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl From<&RecognitionResult> for TrackSummary {
    fn from(result: &RecognitionResult) -> Self {
        Self {
            engine_name: result.engine_name.clone(),
            model: result.model.clone(),
            success: result.success,
            confidence: result.confidence,
            elapsed_ms: result.elapsed_ms,
            text_chars: result.text.chars().count(),
            failure: result.failure.clone(),
        }
    }
}
