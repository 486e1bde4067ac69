//! Page and document records produced by extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::page::{BBox, PageContent};
use super::recognition::TrackSummary;
use crate::fusion::{FusionStrategy, QualityScore};

/// Content type of a page, derived purely from its raw content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    NativeTextOnly,
    MixedContent,
    ImageOnly,
    Empty,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeTextOnly => "native_text_only",
            Self::MixedContent => "mixed_content",
            Self::ImageOnly => "image_only",
            Self::Empty => "empty",
        }
    }

    /// Whether the page carries a usable native text layer.
    pub fn has_text_layer(&self) -> bool {
        matches!(self, Self::NativeTextOnly | Self::MixedContent)
    }

    /// Whether the page has images that go through recognition.
    pub fn needs_recognition(&self) -> bool {
        matches!(self, Self::MixedContent | Self::ImageOnly)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a piece of text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Taken from the native text layer.
    NativeText,
    /// OCR track only.
    OcrProcessed,
    /// Vision track only.
    VisionProcessed,
    /// Both tracks succeeded and were fused.
    OcrVisionFusion,
    /// Image content with no recognition attempted.
    ImageOnly,
    /// Page had neither text nor images.
    Empty,
    /// Every attempted track failed.
    Error,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeText => "native_text",
            Self::OcrProcessed => "ocr_processed",
            Self::VisionProcessed => "vision_processed",
            Self::OcrVisionFusion => "ocr_vision_fusion",
            Self::ImageOnly => "image_only",
            Self::Empty => "empty",
            Self::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One embedded image after dual-track recognition and fusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRegionRecord {
    /// Index of the image in the parser's image list.
    pub image_index: usize,
    pub bbox: BBox,
    pub method: ExtractionMethod,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<FusionStrategy>,
    pub ocr: TrackSummary,
    pub vision: TrackSummary,
    pub ocr_score: Option<QualityScore>,
    pub vision_score: Option<QualityScore>,
}

/// Final record of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    /// 1-based page index.
    pub index: u32,
    pub width: f32,
    pub height: f32,
    pub content_type: ContentType,
    pub method: ExtractionMethod,
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub native_text_chars: usize,
    pub text_block_count: usize,
    pub image_count: usize,
    /// Image regions in reading order.
    pub regions: Vec<ImageRegionRecord>,
    pub processing_ms: u64,
}

impl PageRecord {
    /// Build a record for `page`, deriving counts from `text`.
    pub fn new(
        page: &PageContent,
        content_type: ContentType,
        method: ExtractionMethod,
        text: String,
        regions: Vec<ImageRegionRecord>,
        processing_ms: u64,
    ) -> Self {
        Self {
            index: page.index,
            width: page.width,
            height: page.height,
            content_type,
            method,
            char_count: text.trim().chars().count(),
            word_count: count_words(&text),
            text,
            native_text_chars: page.native_text_chars(),
            text_block_count: page.text_block_count(),
            image_count: page.images.len(),
            regions,
            processing_ms,
        }
    }

    /// Number of regions whose tracks all failed.
    pub fn error_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.method.is_error()).count()
    }
}

/// Aggregate statistics over a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub total_pages: usize,
    pub pages_by_content_type: BTreeMap<ContentType, usize>,
    pub pages_by_method: BTreeMap<ExtractionMethod, usize>,
    pub regions_by_method: BTreeMap<ExtractionMethod, usize>,
    /// Image regions where every track failed.
    pub error_count: usize,
    pub pages_with_errors: usize,
    /// Sum of per-page processing times. Exceeds `elapsed_ms` when pages
    /// are processed concurrently.
    pub total_processing_ms: u64,
    /// Wall-clock time of the whole extraction.
    pub elapsed_ms: u64,
    pub has_text_layer: bool,
    pub is_scanned: bool,
}

impl ProcessingStats {
    /// Tally statistics over assembled pages.
    pub fn tally(pages: &[PageRecord]) -> Self {
        let mut stats = Self {
            total_pages: pages.len(),
            ..Default::default()
        };

        for page in pages {
            *stats
                .pages_by_content_type
                .entry(page.content_type)
                .or_insert(0) += 1;
            *stats.pages_by_method.entry(page.method).or_insert(0) += 1;
            for region in &page.regions {
                *stats.regions_by_method.entry(region.method).or_insert(0) += 1;
            }

            let errors = page.error_regions();
            stats.error_count += errors;
            if errors > 0 {
                stats.pages_with_errors += 1;
            }
            stats.total_processing_ms += page.processing_ms;
            stats.has_text_layer |= page.content_type.has_text_layer();
        }

        stats.is_scanned = !pages.is_empty() && !stats.has_text_layer;
        stats
    }

    pub fn pages_with_method(&self, method: ExtractionMethod) -> usize {
        self.pages_by_method.get(&method).copied().unwrap_or(0)
    }

    pub fn regions_with_method(&self, method: ExtractionMethod) -> usize {
        self.regions_by_method.get(&method).copied().unwrap_or(0)
    }
}

/// Extraction result for a whole document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub pages: Vec<PageRecord>,
    pub full_text: String,
    pub stats: ProcessingStats,
}

/// Count words: whitespace-separated tokens, with each CJK ideograph
/// counted as its own word.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| {
            let ideographs = token.chars().filter(|c| is_cjk_ideograph(*c)).count();
            let has_other = token
                .chars()
                .any(|c| !is_cjk_ideograph(c) && c.is_alphanumeric());
            ideographs + usize::from(has_other)
        })
        .sum()
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: u32, content_type: ContentType, method: ExtractionMethod) -> PageRecord {
        PageRecord {
            index,
            width: 100.0,
            height: 100.0,
            content_type,
            method,
            text: String::new(),
            char_count: 0,
            word_count: 0,
            native_text_chars: 0,
            text_block_count: 0,
            image_count: 0,
            regions: Vec::new(),
            processing_ms: 10,
        }
    }

    #[test]
    fn counts_latin_and_cjk_words() {
        assert_eq!(count_words("Invoice #123, Total: 450.00"), 4);
        assert_eq!(count_words("你好 世界"), 4);
        assert_eq!(count_words("Total 总计"), 3);
        assert_eq!(count_words("  "), 0);
    }

    #[test]
    fn tally_counts_methods_and_flags_scanned_documents() {
        let pages = vec![
            page(1, ContentType::ImageOnly, ExtractionMethod::OcrProcessed),
            page(2, ContentType::ImageOnly, ExtractionMethod::Error),
        ];
        let stats = ProcessingStats::tally(&pages);

        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.pages_with_method(ExtractionMethod::Error), 1);
        assert_eq!(stats.total_processing_ms, 20);
        assert!(!stats.has_text_layer);
        assert!(stats.is_scanned);
    }

    #[test]
    fn tally_of_empty_document_is_not_scanned() {
        let stats = ProcessingStats::tally(&[]);
        assert_eq!(stats.total_pages, 0);
        assert!(!stats.is_scanned);
    }

    #[test]
    fn content_type_serializes_snake_case() {
        let json = serde_json::to_string(&ContentType::NativeTextOnly).unwrap();
        assert_eq!(json, "\"native_text_only\"");
        assert_eq!(ExtractionMethod::OcrVisionFusion.as_str(), "ocr_vision_fusion");
    }
}
