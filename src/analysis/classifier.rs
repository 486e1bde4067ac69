//! Page content classification.

use serde::Serialize;

use crate::config::ClassifierConfig;
use crate::models::{ContentType, PageContent};

/// Raw signals a page is classified from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSignals {
    /// Trimmed native text length in characters.
    pub native_text_chars: usize,
    /// Native text blocks carrying text.
    pub text_blocks: usize,
    /// Embedded images.
    pub image_count: usize,
    /// Embedded images carrying image data.
    pub image_blocks: usize,
}

impl PageSignals {
    pub fn from_page(page: &PageContent) -> Self {
        Self {
            native_text_chars: page.native_text_chars(),
            text_blocks: page.text_block_count(),
            image_count: page.images.len(),
            image_blocks: page.image_block_count(),
        }
    }
}

/// Assigns a [`ContentType`] to each page. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct PageClassifier {
    config: ClassifierConfig,
}

impl PageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn threshold(&self) -> usize {
        self.config.min_native_text_chars
    }

    pub fn classify(&self, page: &PageContent) -> ContentType {
        self.classify_signals(PageSignals::from_page(page))
    }

    /// First match wins: empty, native text only, image only, mixed.
    pub fn classify_signals(&self, signals: PageSignals) -> ContentType {
        let has_text = signals.native_text_chars >= self.config.min_native_text_chars;
        let has_images = signals.image_count > 0;

        match (has_text, has_images) {
            (false, false) => ContentType::Empty,
            (true, false) => ContentType::NativeTextOnly,
            (false, true) => ContentType::ImageOnly,
            (true, true) => ContentType::MixedContent,
        }
    }
}
