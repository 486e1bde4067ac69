//! Page and document assembly.

use tracing::debug;

use super::extraction::ExtractionError;
use crate::analysis::{NativeTextPath, TextCleaner};
use crate::fusion::FusedTextSpan;
use crate::models::{
    BBox, ContentType, DocumentRecord, EngineTag, ExtractionMethod, ImageRegionRecord, PageContent,
    PageRecord, ProcessingStats, RecognitionResult, TrackSummary,
};

/// Separator between page texts in the document's full text.
const PAGE_SEPARATOR: &str = "\n\n";

/// Combines native text and fused region spans into page records.
#[derive(Debug, Clone, Default)]
pub struct PageAssembler {
    native: NativeTextPath,
    cleaner: TextCleaner,
}

impl PageAssembler {
    pub fn new(cleaner: TextCleaner) -> Self {
        Self {
            native: NativeTextPath,
            cleaner,
        }
    }

    /// Record for one image region, keeping the provenance of both tracks.
    pub fn region(
        &self,
        image_index: usize,
        bbox: BBox,
        ocr: TrackSummary,
        vision: TrackSummary,
        span: FusedTextSpan,
    ) -> ImageRegionRecord {
        ImageRegionRecord {
            image_index,
            bbox,
            method: span.method,
            text: self.cleaner.apply(span.text),
            strategy: span.strategy,
            ocr,
            vision,
            ocr_score: span.ocr_score,
            vision_score: span.vision_score,
        }
    }

    /// Record for a region no engine looked at.
    pub fn unrecognized_region(&self, image_index: usize, bbox: BBox) -> ImageRegionRecord {
        let ocr = RecognitionResult::disabled(EngineTag::Ocr);
        let vision = RecognitionResult::disabled(EngineTag::Vision);
        self.region(
            image_index,
            bbox,
            TrackSummary::from(&ocr),
            TrackSummary::from(&vision),
            FusedTextSpan::image_only(),
        )
    }

    /// Build the page record. `regions` must be in reading order; native
    /// text pages carry none.
    pub fn assemble(
        &self,
        page: &PageContent,
        content_type: ContentType,
        regions: Vec<ImageRegionRecord>,
        processing_ms: u64,
    ) -> PageRecord {
        let (text, method) = match content_type {
            ContentType::NativeTextOnly => {
                let mut record = self.native.extract_native(page);
                record.processing_ms = processing_ms;
                return record;
            }
            ContentType::Empty => (String::new(), ExtractionMethod::Empty),
            ContentType::MixedContent => {
                let native = self.native.text(page);
                let parts = std::iter::once(native.as_str())
                    .chain(regions.iter().map(|r| r.text.as_str()));
                (join_non_empty(parts), ExtractionMethod::NativeText)
            }
            ContentType::ImageOnly => {
                let parts = regions.iter().map(|r| r.text.as_str());
                (join_non_empty(parts), resolve_image_method(&regions))
            }
        };

        debug!(
            page = page.index,
            content_type = content_type.as_str(),
            method = method.as_str(),
            regions = regions.len(),
            "Assembled page"
        );
        PageRecord::new(page, content_type, method, text, regions, processing_ms)
    }
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let parts: Vec<&str> = parts.filter(|p| !p.trim().is_empty()).collect();
    parts.join("\n")
}

/// Page method for an image-only page, from its regions' methods.
fn resolve_image_method(regions: &[ImageRegionRecord]) -> ExtractionMethod {
    let mut methods: Vec<ExtractionMethod> = regions
        .iter()
        .map(|r| r.method)
        .filter(|m| !m.is_error())
        .collect();
    methods.sort();
    methods.dedup();

    match methods.as_slice() {
        [] if regions.is_empty() => ExtractionMethod::ImageOnly,
        [] => ExtractionMethod::Error,
        [single] => *single,
        _ => ExtractionMethod::OcrVisionFusion,
    }
}

/// Accumulates page records in index order. The only writer of a document.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    pages: Vec<PageRecord>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(pages: usize) -> Self {
        Self {
            pages: Vec::with_capacity(pages),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Append the next page. Indices must run 1, 2, 3, ... without gaps.
    pub fn append(&mut self, page: PageRecord) -> Result<(), ExtractionError> {
        let expected = self.pages.len() as u32 + 1;
        if page.index != expected {
            return Err(ExtractionError::OutOfOrder {
                expected,
                found: page.index,
            });
        }
        self.pages.push(page);
        Ok(())
    }

    /// Freeze the document and compute its statistics.
    pub fn finish(self) -> DocumentRecord {
        let stats = ProcessingStats::tally(&self.pages);
        let texts: Vec<&str> = self.pages.iter().map(|p| p.text.as_str()).collect();
        let full_text = texts.join(PAGE_SEPARATOR);
        DocumentRecord {
            pages: self.pages,
            full_text,
            stats,
        }
    }
}
