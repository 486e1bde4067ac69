//! Extraction service types and events.

use thiserror::Error;

use crate::models::{ContentType, ExtractionMethod};

/// Input contract violations. The only errors that abort a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("page at position {position} has index 0 (indices are 1-based)")]
    ZeroIndex { position: usize },

    #[error("page at position {position} has index {found}, expected {expected}")]
    NonSequential {
        position: usize,
        expected: u32,
        found: u32,
    },

    #[error("page {index} has invalid geometry {width}x{height}")]
    InvalidGeometry { index: u32, width: f32, height: f32 },

    #[error("page {found} appended out of order, expected page {expected}")]
    OutOfOrder { expected: u32, found: u32 },
}

/// Events emitted during document extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// Page classified, processing started
    PageStarted {
        index: u32,
        content_type: ContentType,
        images: usize,
    },
    /// One image region went through recognition and fusion
    RegionRecognized {
        page: u32,
        image_index: usize,
        method: ExtractionMethod,
    },
    /// Page record assembled
    PageCompleted {
        index: u32,
        method: ExtractionMethod,
        processing_ms: u64,
    },
    /// All pages assembled
    DocumentCompleted {
        total_pages: usize,
        error_count: usize,
    },
}
