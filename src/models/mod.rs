//! Data models for pagefuse.

mod page;
mod recognition;
mod record;

pub use page::{BBox, EmbeddedImage, PageContent, TextBlock};
pub use recognition::{EngineOutput, EngineTag, FailureReason, RecognitionResult, TrackSummary};
pub use record::{
    count_words, ContentType, DocumentRecord, ExtractionMethod, ImageRegionRecord, PageRecord,
    ProcessingStats,
};
