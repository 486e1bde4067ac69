//! Service layer for pagefuse.
//!
//! Orchestration on top of the pure components: dual-track recognition,
//! page/document assembly, and whole-document extraction. Services can be
//! used by the CLI or embedded by other callers.

pub mod assembly;
pub mod dual_track;
pub mod extraction;

pub use assembly::{DocumentBuilder, PageAssembler};
pub use dual_track::DualTrackOrchestrator;
pub use extraction::{validate_pages, DocumentExtractor, ExtractionError, ExtractionEvent};
