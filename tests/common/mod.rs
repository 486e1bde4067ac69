//! Scripted in-process recognition engines for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pagefuse::config::Config;
use pagefuse::models::{BBox, EmbeddedImage, EngineOutput, EngineTag, PageContent};
use pagefuse::ocr::{EngineError, ImageRecognitionTrack, RecognitionEngine};
use pagefuse::services::{DocumentExtractor, DualTrackOrchestrator};

/// What an engine does for one image.
#[derive(Clone)]
pub enum Step {
    Reply {
        text: &'static str,
        confidence: f64,
        delay: Duration,
    },
    Fail(&'static str),
    Hang,
}

pub fn reply(text: &'static str, confidence: f64) -> Step {
    Step::Reply {
        text,
        confidence,
        delay: Duration::ZERO,
    }
}

pub fn slow_reply(text: &'static str, confidence: f64, delay_ms: u64) -> Step {
    Step::Reply {
        text,
        confidence,
        delay: Duration::from_millis(delay_ms),
    }
}

/// Engine whose behaviour is keyed by the first byte of the image.
pub struct ScriptedEngine {
    tag: EngineTag,
    script: HashMap<u8, Step>,
    fallback: Step,
    pub calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(tag: EngineTag) -> Self {
        Self {
            tag,
            script: HashMap::new(),
            fallback: Step::Fail("no script for image"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on(mut self, image_id: u8, step: Step) -> Self {
        self.script.insert(image_id, step);
        self
    }

    pub fn otherwise(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedEngine {
    fn engine_tag(&self) -> EngineTag {
        self.tag
    }

    fn name(&self) -> &str {
        match self.tag {
            EngineTag::Ocr => "scripted-ocr",
            EngineTag::Vision => "scripted-vision",
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "scripted".to_string()
    }

    async fn recognize(&self, image: &[u8], _mime: &str) -> Result<EngineOutput, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = image
            .first()
            .and_then(|id| self.script.get(id))
            .unwrap_or(&self.fallback)
            .clone();
        match step {
            Step::Reply {
                text,
                confidence,
                delay,
            } => {
                tokio::time::sleep(delay).await;
                Ok(EngineOutput::new(text).with_confidence(confidence))
            }
            Step::Fail(message) => Err(EngineError::Failed(message.to_string())),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(EngineOutput::new("too late"))
            }
        }
    }
}

/// Orchestrator over two scripted engines with the given timeouts.
pub fn orchestrator(
    ocr: ScriptedEngine,
    vision: ScriptedEngine,
    ocr_timeout_ms: u64,
    vision_timeout_ms: u64,
) -> DualTrackOrchestrator {
    DualTrackOrchestrator::new(
        Some(ImageRecognitionTrack::new(
            Arc::new(ocr),
            Duration::from_millis(ocr_timeout_ms),
        )),
        Some(ImageRecognitionTrack::new(
            Arc::new(vision),
            Duration::from_millis(vision_timeout_ms),
        )),
    )
}

pub fn extractor(orchestrator: DualTrackOrchestrator) -> DocumentExtractor {
    DocumentExtractor::with_orchestrator(&Config::default(), orchestrator)
}

/// Image whose bytes start with `id`, placed at `(x, y)`.
pub fn image(id: u8, x: f32, y: f32) -> EmbeddedImage {
    EmbeddedImage::new(BBox::new(x, y, x + 100.0, y + 100.0), vec![id, 0, 0, 0])
}

pub fn image_page(index: u32, images: Vec<EmbeddedImage>) -> PageContent {
    images
        .into_iter()
        .fold(PageContent::new(index, 595.0, 842.0), |page, img| {
            page.with_image(img)
        })
}

pub fn text_page(index: u32, text: &str) -> PageContent {
    PageContent::new(index, 595.0, 842.0).with_native_text(text)
}
