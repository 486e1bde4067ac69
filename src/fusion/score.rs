//! Quality scoring of recognized text.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::FusionConfig;

/// ASCII and full-width punctuation counted, along with digits, towards the
/// structure sub-score.
const STRUCTURE_PUNCT: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '，', '。', '；', '：', '！', '？',
    '（', '）',
];

/// Composite quality score of one recognition result.
///
/// Every sub-score is normalized to [0, 1]. Computed per fusion decision and
/// kept on the region record for auditing only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    pub confidence: f64,
    pub length: f64,
    pub diversity: f64,
    pub script_ratio: f64,
    pub structure: f64,
    /// Average of length, diversity, script ratio and structure.
    pub quality: f64,
    /// Weighted composite used for the fusion decision.
    pub total: f64,
}

impl QualityScore {
    /// Score `text` with the engine-reported `confidence`.
    pub fn compute(text: &str, confidence: f64, config: &FusionConfig) -> Self {
        let text = text.trim();
        let chars: Vec<char> = text.chars().collect();
        let char_count = chars.len();

        let length = saturate(char_count as f64, config.length_norm);

        let unique: HashSet<char> = chars.iter().copied().collect();
        let diversity = saturate(unique.len() as f64, config.diversity_norm);

        let script_ratio = if char_count == 0 {
            0.0
        } else {
            let in_script = chars
                .iter()
                .filter(|c| config.target_script.contains(**c))
                .count();
            (in_script as f64 / char_count as f64 * config.script_ratio_multiplier).min(1.0)
        };

        let structure_chars = chars
            .iter()
            .filter(|c| c.is_numeric() || STRUCTURE_PUNCT.contains(*c))
            .count();
        let structure = saturate(structure_chars as f64, config.structure_norm);

        let quality = (length + diversity + script_ratio + structure) / 4.0;
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let weights = &config.weights;
        let total =
            weights.confidence * confidence + weights.length * length + weights.quality * quality;

        Self {
            confidence,
            length,
            diversity,
            script_ratio,
            structure,
            quality,
            total,
        }
    }
}

fn saturate(value: f64, norm: f64) -> f64 {
    if norm <= 0.0 {
        return 0.0;
    }
    (value / norm).min(1.0)
}
