//! Document extraction service.
//!
//! Classifies each page, sends image regions through dual-track recognition
//! and fusion, and assembles the document. Pages may be processed
//! concurrently; records are put back into index order before assembly.
//! Separated from UI concerns - emits events for progress tracking.

mod types;

use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::assembly::{DocumentBuilder, PageAssembler};
use super::dual_track::DualTrackOrchestrator;
use crate::analysis::{PageClassifier, TextCleaner};
use crate::config::Config;
use crate::fusion::FusionEngine;
use crate::models::{
    DocumentRecord, EmbeddedImage, ImageRegionRecord, PageContent, PageRecord, TrackSummary,
};

pub use types::{ExtractionError, ExtractionEvent};

/// Runs the whole per-page pipeline over a document.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    classifier: PageClassifier,
    orchestrator: DualTrackOrchestrator,
    fusion: FusionEngine,
    assembler: PageAssembler,
    page_concurrency: usize,
    events: Option<mpsc::Sender<ExtractionEvent>>,
}

impl DocumentExtractor {
    pub fn new(
        classifier: PageClassifier,
        orchestrator: DualTrackOrchestrator,
        fusion: FusionEngine,
        assembler: PageAssembler,
    ) -> Self {
        Self {
            classifier,
            orchestrator,
            fusion,
            assembler,
            page_concurrency: 1,
            events: None,
        }
    }

    /// Build every component from `config`, with engines from the factory.
    pub fn from_config(config: &Config) -> Self {
        Self::with_orchestrator(config, DualTrackOrchestrator::from_config(config))
    }

    /// Build from `config` but with caller-supplied recognition tracks.
    pub fn with_orchestrator(config: &Config, orchestrator: DualTrackOrchestrator) -> Self {
        Self::new(
            PageClassifier::new(config.classifier.clone()),
            orchestrator,
            FusionEngine::new(config.fusion.clone()),
            PageAssembler::new(TextCleaner::new(config.cleanup.clone())),
        )
        .with_page_concurrency(config.recognition.page_concurrency)
    }

    pub fn with_page_concurrency(mut self, pages: usize) -> Self {
        self.page_concurrency = pages.max(1);
        self
    }

    /// Send progress events to `tx`. Send failures are ignored.
    pub fn with_events(mut self, tx: mpsc::Sender<ExtractionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn classifier(&self) -> &PageClassifier {
        &self.classifier
    }

    pub fn orchestrator(&self) -> &DualTrackOrchestrator {
        &self.orchestrator
    }

    /// Extract a whole document.
    ///
    /// Fails only when the input breaks the page contract (indices not
    /// exactly 1..=n, bad geometry). Recognition failures never fail the
    /// document; they show up as `error` regions.
    pub async fn extract_document(
        &self,
        pages: Vec<PageContent>,
    ) -> Result<DocumentRecord, ExtractionError> {
        validate_pages(&pages)?;
        let total = pages.len();
        let start = Instant::now();
        info!(
            pages = total,
            concurrency = self.page_concurrency,
            "Extracting document"
        );

        let mut slots: Vec<Option<PageRecord>> = vec![None; total];
        let mut completed = stream::iter(pages)
            .map(|page| self.process_page(page))
            .buffer_unordered(self.page_concurrency);
        while let Some(record) = completed.next().await {
            let slot = record.index as usize - 1;
            slots[slot] = Some(record);
        }

        let mut builder = DocumentBuilder::with_capacity(total);
        for (position, record) in slots.into_iter().enumerate() {
            let expected = position as u32 + 1;
            let record = record.ok_or(ExtractionError::OutOfOrder {
                expected,
                found: 0,
            })?;
            builder.append(record)?;
        }
        let mut document = builder.finish();
        document.stats.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = document.stats.total_pages,
            errors = document.stats.error_count,
            elapsed_ms = document.stats.elapsed_ms,
            page_ms = document.stats.total_processing_ms,
            "Document extracted"
        );
        self.emit(ExtractionEvent::DocumentCompleted {
            total_pages: document.stats.total_pages,
            error_count: document.stats.error_count,
        })
        .await;
        Ok(document)
    }

    /// Classify, recognize and assemble one page.
    pub async fn process_page(&self, page: PageContent) -> PageRecord {
        let start = Instant::now();
        let content_type = self.classifier.classify(&page);
        debug!(
            page = page.index,
            content_type = content_type.as_str(),
            "Classified page"
        );
        self.emit(ExtractionEvent::PageStarted {
            index: page.index,
            content_type,
            images: page.images.len(),
        })
        .await;

        let mut regions = Vec::new();
        if content_type.needs_recognition() {
            for (image_index, image) in page.images_in_reading_order() {
                let region = self.recognize_region(page.index, image_index, image).await;
                self.emit(ExtractionEvent::RegionRecognized {
                    page: page.index,
                    image_index,
                    method: region.method,
                })
                .await;
                regions.push(region);
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let record = self
            .assembler
            .assemble(&page, content_type, regions, elapsed_ms);
        self.emit(ExtractionEvent::PageCompleted {
            index: record.index,
            method: record.method,
            processing_ms: record.processing_ms,
        })
        .await;
        record
    }

    async fn recognize_region(
        &self,
        page: u32,
        image_index: usize,
        image: &EmbeddedImage,
    ) -> ImageRegionRecord {
        if !self.orchestrator.has_tracks() {
            return self.assembler.unrecognized_region(image_index, image.bbox);
        }

        let (ocr, vision) = self.orchestrator.run_dual(image).await;
        let ocr_summary = TrackSummary::from(&ocr);
        let vision_summary = TrackSummary::from(&vision);
        let span = self.fusion.fuse(ocr, vision);
        debug!(
            page,
            image = image_index,
            method = span.method.as_str(),
            "Region recognized"
        );

        self.assembler
            .region(image_index, image.bbox, ocr_summary, vision_summary, span)
    }

    async fn emit(&self, event: ExtractionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

/// Check the page contract: indices exactly 1..=n in order, finite
/// non-negative geometry.
pub fn validate_pages(pages: &[PageContent]) -> Result<(), ExtractionError> {
    for (position, page) in pages.iter().enumerate() {
        if page.index == 0 {
            return Err(ExtractionError::ZeroIndex { position });
        }
        let expected = position as u32 + 1;
        if page.index != expected {
            return Err(ExtractionError::NonSequential {
                position,
                expected,
                found: page.index,
            });
        }
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(page.width) || !valid(page.height) {
            return Err(ExtractionError::InvalidGeometry {
                index: page.index,
                width: page.width,
                height: page.height,
            });
        }
    }
    Ok(())
}
