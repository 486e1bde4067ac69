//! Concurrent OCR + vision recognition of one image region.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{EmbeddedImage, EngineTag, FailureReason, RecognitionResult};
use crate::ocr::{create_engine, ImageRecognitionTrack};

/// Runs the OCR and vision tracks side by side.
///
/// Each track is its own task with its own copy of the image and its own
/// timeout. Both are awaited before returning; a failure or timeout on one
/// side never cancels the other.
#[derive(Debug, Clone, Default)]
pub struct DualTrackOrchestrator {
    ocr: Option<ImageRecognitionTrack>,
    vision: Option<ImageRecognitionTrack>,
}

impl DualTrackOrchestrator {
    pub fn new(ocr: Option<ImageRecognitionTrack>, vision: Option<ImageRecognitionTrack>) -> Self {
        if let Some(track) = &ocr {
            if track.engine_tag() != EngineTag::Ocr {
                warn!(engine = track.engine_name(), "OCR slot holds a non-OCR engine");
            }
        }
        if let Some(track) = &vision {
            if track.engine_tag() != EngineTag::Vision {
                warn!(engine = track.engine_name(), "Vision slot holds a non-vision engine");
            }
        }
        Self { ocr, vision }
    }

    /// Build both tracks from the configured engine identifiers.
    pub fn from_config(config: &Config) -> Self {
        let recognition = &config.recognition;
        let ocr = create_engine(&recognition.ocr_engine, config)
            .map(|engine| ImageRecognitionTrack::new(engine, recognition.ocr_timeout()));
        let vision = create_engine(&recognition.vision_engine, config)
            .map(|engine| ImageRecognitionTrack::new(engine, recognition.vision_timeout()));
        Self::new(ocr, vision)
    }

    pub fn ocr_track(&self) -> Option<&ImageRecognitionTrack> {
        self.ocr.as_ref()
    }

    pub fn vision_track(&self) -> Option<&ImageRecognitionTrack> {
        self.vision.as_ref()
    }

    /// Whether any recognition will be attempted.
    pub fn has_tracks(&self) -> bool {
        self.ocr.is_some() || self.vision.is_some()
    }

    /// Recognize `image` on both tracks and return `(ocr, vision)`.
    pub async fn run_dual(
        &self,
        image: &EmbeddedImage,
    ) -> (RecognitionResult, RecognitionResult) {
        let mime = image.mime_type();
        let ocr = spawn_track(self.ocr.clone(), EngineTag::Ocr, &image.data, mime);
        let vision = spawn_track(self.vision.clone(), EngineTag::Vision, &image.data, mime);

        let (ocr, vision) = tokio::join!(ocr, vision);
        let ocr = settle(ocr, EngineTag::Ocr, self.ocr.as_ref());
        let vision = settle(vision, EngineTag::Vision, self.vision.as_ref());

        debug!(
            ocr_success = ocr.success,
            ocr_ms = ocr.elapsed_ms,
            vision_success = vision.success,
            vision_ms = vision.elapsed_ms,
            "Dual-track recognition finished"
        );
        (ocr, vision)
    }
}

fn spawn_track(
    track: Option<ImageRecognitionTrack>,
    tag: EngineTag,
    image: &[u8],
    mime: &'static str,
) -> JoinHandle<RecognitionResult> {
    let image = image.to_vec();
    tokio::spawn(async move {
        match track {
            Some(track) => track.recognize(image, mime).await,
            None => RecognitionResult::disabled(tag),
        }
    })
}

/// A panicked track task still yields a failed result.
fn settle(
    joined: Result<RecognitionResult, tokio::task::JoinError>,
    tag: EngineTag,
    track: Option<&ImageRecognitionTrack>,
) -> RecognitionResult {
    joined.unwrap_or_else(|e| {
        let name = track.map(|t| t.engine_name()).unwrap_or("none");
        warn!(engine = name, "Recognition task aborted: {}", e);
        RecognitionResult::failed(
            tag,
            name,
            FailureReason::EngineError {
                message: format!("recognition task aborted: {}", e),
            },
            std::time::Duration::ZERO,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BBox, EngineOutput};
    use crate::ocr::{EngineError, RecognitionEngine};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    struct Sleeper {
        tag: EngineTag,
        delay: Duration,
        text: &'static str,
        seen_mime: Mutex<Option<String>>,
    }

    #[async_trait]
    impl RecognitionEngine for Sleeper {
        fn engine_tag(&self) -> EngineTag {
            self.tag
        }
        fn name(&self) -> &str {
            "sleeper"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            String::new()
        }
        async fn recognize(
            &self,
            _image: &[u8],
            mime: &str,
        ) -> Result<EngineOutput, EngineError> {
            if let Ok(mut seen) = self.seen_mime.lock() {
                *seen = Some(mime.to_string());
            }
            tokio::time::sleep(self.delay).await;
            Ok(EngineOutput::new(self.text).with_confidence(0.8))
        }
    }

    fn sleeper(tag: EngineTag, delay_ms: u64) -> Arc<Sleeper> {
        Arc::new(Sleeper {
            tag,
            delay: Duration::from_millis(delay_ms),
            text: "text",
            seen_mime: Mutex::new(None),
        })
    }

    fn track(tag: EngineTag, delay_ms: u64, timeout_ms: u64) -> ImageRecognitionTrack {
        ImageRecognitionTrack::new(sleeper(tag, delay_ms), Duration::from_millis(timeout_ms))
    }

    fn image(data: Vec<u8>) -> EmbeddedImage {
        EmbeddedImage::new(BBox::new(0.0, 0.0, 10.0, 10.0), data)
    }

    #[tokio::test]
    async fn tracks_run_concurrently() {
        let orchestrator = DualTrackOrchestrator::new(
            Some(track(EngineTag::Ocr, 300, 2_000)),
            Some(track(EngineTag::Vision, 300, 2_000)),
        );
        let start = Instant::now();
        let (ocr, vision) = orchestrator.run_dual(&image(vec![1, 2, 3])).await;

        assert!(ocr.success && vision.success);
        assert!(start.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn vision_timeout_does_not_lose_ocr_result() {
        let orchestrator = DualTrackOrchestrator::new(
            Some(track(EngineTag::Ocr, 10, 100)),
            Some(track(EngineTag::Vision, 10_000, 150)),
        );
        let start = Instant::now();
        let (ocr, vision) = orchestrator.run_dual(&image(vec![1])).await;

        assert!(ocr.success);
        assert_eq!(vision.failure, Some(FailureReason::Timeout { timeout_ms: 150 }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn missing_tracks_yield_disabled_results() {
        let orchestrator = DualTrackOrchestrator::new(Some(track(EngineTag::Ocr, 0, 100)), None);
        assert!(orchestrator.has_tracks());

        let (ocr, vision) = orchestrator.run_dual(&image(vec![1])).await;
        assert!(ocr.success);
        assert_eq!(vision.engine, EngineTag::Vision);
        assert_eq!(vision.failure, Some(FailureReason::Disabled));

        assert!(!DualTrackOrchestrator::default().has_tracks());
    }

    #[tokio::test]
    async fn both_engines_receive_format_hint() {
        let ocr = sleeper(EngineTag::Ocr, 0);
        let vision = sleeper(EngineTag::Vision, 0);
        let orchestrator = DualTrackOrchestrator::new(
            Some(ImageRecognitionTrack::new(ocr.clone(), Duration::from_secs(1))),
            Some(ImageRecognitionTrack::new(vision.clone(), Duration::from_secs(1))),
        );

        let mut scan = image(vec![0, 1, 2, 3]);
        scan.format = Some("jpeg".to_string());
        orchestrator.run_dual(&scan).await;

        assert_eq!(ocr.seen_mime.lock().unwrap().as_deref(), Some("image/jpeg"));
        assert_eq!(vision.seen_mime.lock().unwrap().as_deref(), Some("image/jpeg"));
    }
}
