//! Fusion of OCR and vision recognition results.
//!
//! Both results are scored with [`QualityScore`] and arbitrated:
//! - only one side succeeded: that side's text, tagged with its track
//! - both succeeded with close scores: lines of both merged
//! - otherwise the better side is primary and the other supplements it

mod merge;
mod score;

pub use merge::{merge_lines, supplement};
pub use score::QualityScore;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FusionConfig;
use crate::models::{ExtractionMethod, RecognitionResult};

/// How a fused span was assembled when both tracks succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Lines of both texts, deduplicated.
    Merge,
    /// OCR text with vision-only lines appended.
    OcrPrimary,
    /// Vision text with OCR-only lines appended.
    VisionPrimary,
}

impl FusionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::OcrPrimary => "ocr_primary",
            Self::VisionPrimary => "vision_primary",
        }
    }
}

impl std::fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one fusion decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedTextSpan {
    pub text: String,
    pub method: ExtractionMethod,
    /// Set only when both tracks succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<FusionStrategy>,
    /// Score of the OCR result, `None` if that track failed.
    pub ocr_score: Option<QualityScore>,
    /// Score of the vision result, `None` if that track failed.
    pub vision_score: Option<QualityScore>,
}

impl FusedTextSpan {
    /// Span for a region where no recognition was attempted.
    pub fn image_only() -> Self {
        Self {
            text: String::new(),
            method: ExtractionMethod::ImageOnly,
            strategy: None,
            ocr_score: None,
            vision_score: None,
        }
    }
}

/// Scores and arbitrates recognition results.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Score one successful result.
    pub fn score(&self, result: &RecognitionResult) -> QualityScore {
        QualityScore::compute(&result.text, result.confidence, &self.config)
    }

    /// Fuse the results of both tracks into one span. Consumes the results.
    pub fn fuse(&self, ocr: RecognitionResult, vision: RecognitionResult) -> FusedTextSpan {
        let ocr_score = ocr.success.then(|| self.score(&ocr));
        let vision_score = vision.success.then(|| self.score(&vision));

        let (text, method, strategy) = match (ocr_score, vision_score) {
            (None, None) => (String::new(), ExtractionMethod::Error, None),
            (Some(_), None) => (ocr.text, ExtractionMethod::OcrProcessed, None),
            (None, Some(_)) => (vision.text, ExtractionMethod::VisionProcessed, None),
            (Some(o), Some(v)) => {
                let strategy = self.decide(&o, &v);
                let skip = self.config.supplement_skip_ratio;
                let text = match strategy {
                    FusionStrategy::Merge => merge_lines(&ocr.text, &vision.text),
                    FusionStrategy::OcrPrimary => supplement(&ocr.text, &vision.text, skip),
                    FusionStrategy::VisionPrimary => supplement(&vision.text, &ocr.text, skip),
                };
                debug!(
                    ocr_score = o.total,
                    vision_score = v.total,
                    strategy = strategy.as_str(),
                    "Fused recognition results"
                );
                (text, ExtractionMethod::OcrVisionFusion, Some(strategy))
            }
        };

        FusedTextSpan {
            text,
            method,
            strategy,
            ocr_score,
            vision_score,
        }
    }

    fn decide(&self, ocr: &QualityScore, vision: &QualityScore) -> FusionStrategy {
        let diff = (ocr.total - vision.total).abs();
        if diff < self.config.score_diff_threshold {
            FusionStrategy::Merge
        } else if ocr.total > vision.total {
            FusionStrategy::OcrPrimary
        } else {
            FusionStrategy::VisionPrimary
        }
    }
}
