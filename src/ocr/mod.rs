//! Recognition engines and tracks.
//!
//! - **Tesseract**: classic OCR via command-line, reports word confidences
//! - **Vision API**: multimodal chat model (Qwen-VL by default), no confidence
//!
//! Each engine is wrapped in an [`ImageRecognitionTrack`] that bounds the
//! call with a timeout and turns every outcome into a `RecognitionResult`.

mod backend;
mod model_utils;
mod tesseract;
mod track;
mod vision_api;

pub use backend::{create_engine, EngineError, RecognitionEngine, ENGINE_NAMES};
pub use tesseract::TesseractEngine;
pub use track::ImageRecognitionTrack;
pub use vision_api::VisionApiEngine;
