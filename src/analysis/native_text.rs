//! Text taken directly from a page's native text layer.

use crate::models::{ContentType, ExtractionMethod, PageContent, PageRecord};

/// Builds page text from native text blocks.
///
/// Blocks are used in the order the parser produced them; no re-ordering
/// happens here.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTextPath;

impl NativeTextPath {
    /// Concatenate the page's text blocks, one per line. Falls back to the
    /// full native text when no block carries text.
    pub fn text(&self, page: &PageContent) -> String {
        let blocks = page.block_text();
        if blocks.trim().is_empty() {
            return page.native_text.trim().to_string();
        }
        blocks
    }

    /// Record for a page that needs no recognition.
    pub fn extract_native(&self, page: &PageContent) -> PageRecord {
        PageRecord::new(
            page,
            ContentType::NativeTextOnly,
            ExtractionMethod::NativeText,
            self.text(page),
            Vec::new(),
            0,
        )
    }
}
