//! One recognition track: an engine call bounded by a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::backend::RecognitionEngine;
use crate::models::{EngineTag, FailureReason, RecognitionResult};

/// Wraps a single engine behind `recognize(image, mime) -> RecognitionResult`.
///
/// Every outcome is a result: timeouts, engine errors and empty text all
/// come back as `success == false` with the reason attached.
#[derive(Clone)]
pub struct ImageRecognitionTrack {
    engine: Arc<dyn RecognitionEngine>,
    timeout: Duration,
}

impl ImageRecognitionTrack {
    pub fn new(engine: Arc<dyn RecognitionEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn engine_tag(&self) -> EngineTag {
        self.engine.engine_tag()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn engine(&self) -> &Arc<dyn RecognitionEngine> {
        &self.engine
    }

    /// Run the engine on `image`. If the timeout fires first the engine call
    /// is dropped and its eventual output discarded.
    pub async fn recognize(&self, image: Vec<u8>, mime: &str) -> RecognitionResult {
        let tag = self.engine.engine_tag();
        let name = self.engine.name().to_string();
        let start = Instant::now();

        if !self.engine.is_available() {
            return RecognitionResult::failed(
                tag,
                name,
                FailureReason::Unavailable {
                    message: self.engine.availability_hint(),
                },
                start.elapsed(),
            );
        }

        let outcome =
            tokio::time::timeout(self.timeout, self.engine.recognize(&image, mime)).await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Err(_) => {
                warn!(
                    engine = %name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Recognition timed out"
                );
                RecognitionResult::failed(
                    tag,
                    name,
                    FailureReason::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    },
                    elapsed,
                )
            }
            Ok(Err(e)) => {
                warn!(engine = %name, "Recognition failed: {}", e);
                RecognitionResult::failed(
                    tag,
                    name,
                    FailureReason::EngineError {
                        message: e.to_string(),
                    },
                    elapsed,
                )
            }
            Ok(Ok(output)) if output.text.trim().is_empty() => {
                debug!(engine = %name, "Recognition returned no text");
                RecognitionResult::failed(tag, name, FailureReason::EmptyResult, elapsed)
            }
            Ok(Ok(output)) => {
                let mut output = output;
                if output.model.is_none() {
                    output.model = self.engine.model_name();
                }
                RecognitionResult::succeeded(tag, name, output, elapsed)
            }
        };

        debug!(
            engine = %result.engine_name,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            chars = result.text.chars().count(),
            "Track finished"
        );
        result
    }
}

impl std::fmt::Debug for ImageRecognitionTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRecognitionTrack")
            .field("engine", &self.engine.name())
            .field("tag", &self.engine.engine_tag())
            .field("timeout", &self.timeout)
            .finish()
    }
}
