//! pagefuse - page classification and dual-track OCR/vision text extraction.
//!
//! Each page of a parsed document is classified by content type. Text pages
//! use their native text layer; embedded images are sent to an OCR engine
//! and a vision model at the same time, and the two results are scored and
//! fused into one text span with full provenance.
//!
//! ```no_run
//! # async fn demo(pages: Vec<pagefuse::models::PageContent>) -> Result<(), pagefuse::services::ExtractionError> {
//! use pagefuse::config::Config;
//! use pagefuse::services::DocumentExtractor;
//!
//! let config = Config::load().await;
//! let document = DocumentExtractor::from_config(&config)
//!     .extract_document(pages)
//!     .await?;
//! println!("{}", document.full_text);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod fusion;
pub mod models;
pub mod ocr;
pub mod services;

pub use config::Config;
pub use models::{DocumentRecord, PageContent, PageRecord};
pub use services::{DocumentExtractor, ExtractionError};
