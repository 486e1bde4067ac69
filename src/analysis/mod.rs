//! Page analysis: classification, native text, and recognized-text cleanup.

mod classifier;
mod cleanup;
mod native_text;

pub use classifier::{PageClassifier, PageSignals};
pub use cleanup::TextCleaner;
pub use native_text::NativeTextPath;
