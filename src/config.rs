//! Configuration management for pagefuse using the prefer crate.
//!
//! Every threshold and weight used by classification and fusion lives here so
//! the heuristics can be retuned without code changes. Components receive
//! their section by value at construction and never read ambient state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default DashScope endpoint (OpenAI-compatible mode) for Qwen-VL.
pub const DEFAULT_VISION_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";

/// Prompt sent to the vision model alongside each image.
pub const DEFAULT_VISION_PROMPT: &str = "Extract all visible text from this image. \
Keep the reading order top-to-bottom, left-to-right. Be exact with numbers, amounts and dates. \
Return only the extracted text without explanations.";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Page classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum trimmed native text length (in characters) for a page to
    /// count as text-bearing.
    pub min_native_text_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_native_text_chars: 10,
        }
    }
}

/// Recognition track settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// OCR engine identifier, or "none" to disable the OCR track.
    pub ocr_engine: String,
    /// Vision engine identifier, or "none" to disable the vision track.
    pub vision_engine: String,
    pub ocr_timeout_ms: u64,
    pub vision_timeout_ms: u64,
    /// Pages processed concurrently.
    pub page_concurrency: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            ocr_engine: "tesseract".to_string(),
            vision_engine: "vision-api".to_string(),
            ocr_timeout_ms: 30_000,
            vision_timeout_ms: 60_000,
            page_concurrency: 1,
        }
    }
}

impl RecognitionConfig {
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }

    pub fn vision_timeout(&self) -> Duration {
        Duration::from_millis(self.vision_timeout_ms)
    }

    /// Engine name with "none"/"" mapped to `None`.
    pub fn engine_enabled(name: &str) -> Option<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Weights of the composite quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub confidence: f64,
    pub length: f64,
    pub quality: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            confidence: 0.4,
            length: 0.3,
            quality: 0.3,
        }
    }
}

/// Script the documents are expected to be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScript {
    /// CJK unified ideographs.
    #[default]
    Cjk,
    /// Latin letters, including Latin-1 and Latin Extended-A/B.
    Latin,
}

impl TargetScript {
    pub fn contains(&self, c: char) -> bool {
        match self {
            TargetScript::Cjk => ('\u{4e00}'..='\u{9fff}').contains(&c),
            TargetScript::Latin => {
                c.is_ascii_alphabetic() || (('\u{00c0}'..='\u{024f}').contains(&c) && c.is_alphabetic())
            }
        }
    }
}

/// Fusion scoring and decision settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Below this score difference both texts are merged.
    pub score_diff_threshold: f64,
    pub weights: FusionWeights,
    /// Text length at which the length sub-score saturates.
    pub length_norm: f64,
    /// Unique character count at which the diversity sub-score saturates.
    pub diversity_norm: f64,
    /// Digit/punctuation count at which the structure sub-score saturates.
    pub structure_norm: f64,
    pub script_ratio_multiplier: f64,
    pub target_script: TargetScript,
    /// When set, a primary text longer than `ratio` times the secondary text
    /// is returned without supplementary lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplement_skip_ratio: Option<f64>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            score_diff_threshold: 0.1,
            weights: FusionWeights::default(),
            length_norm: 200.0,
            diversity_norm: 50.0,
            structure_norm: 20.0,
            script_ratio_multiplier: 2.0,
            target_script: TargetScript::Cjk,
            supplement_skip_ratio: None,
        }
    }
}

/// Cleanup of recognized text before page assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    /// Lines shorter than this (in characters) are dropped.
    pub min_line_chars: usize,
    /// Lines containing any of these phrases are dropped.
    pub noise_phrases: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_line_chars: 3,
            noise_phrases: vec![
                "图中没有可见文字".to_string(),
                "图中所有可见文字：".to_string(),
                "图中所有文字：".to_string(),
                "No visible text".to_string(),
            ],
        }
    }
}

/// Tesseract OCR engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    pub binary: String,
    /// Language for OCR (e.g., "eng", "chi_sim+eng").
    pub language: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: std::env::var("TESSERACT_BIN").unwrap_or_else(|_| "tesseract".to_string()),
            language: std::env::var("TESSERACT_LANG").unwrap_or_else(|_| "chi_sim+eng".to_string()),
        }
    }
}

/// Vision model settings (OpenAI-compatible chat completions API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub model: String,
    /// API key; read from VISION_API_KEY or DASHSCOPE_API_KEY when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Confidence reported for vision output, since the model gives none.
    /// Unset records 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumed_confidence: Option<f64>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("VISION_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_VISION_ENDPOINT.to_string()),
            model: std::env::var("VISION_MODEL").unwrap_or_else(|_| "qwen-vl-plus".to_string()),
            api_key: std::env::var("VISION_API_KEY")
                .or_else(|_| std::env::var("DASHSCOPE_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            prompt: DEFAULT_VISION_PROMPT.to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            assumed_confidence: Some(1.0),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub tesseract: TesseractConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults (with env overrides) when no file is found.
    pub async fn load() -> Self {
        match prefer::load("pagefuse").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                debug!("No pagefuse config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Check thresholds and weights for values the heuristics cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fusion = &self.fusion;
        let weights = [
            ("confidence", fusion.weights.confidence),
            ("length", fusion.weights.length),
            ("quality", fusion.weights.quality),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "fusion.weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(ConfigError::Invalid(
                "fusion.weights must not all be zero".to_string(),
            ));
        }
        if !fusion.score_diff_threshold.is_finite() || fusion.score_diff_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "fusion.score_diff_threshold must be non-negative".to_string(),
            ));
        }
        let norms = [
            ("length_norm", fusion.length_norm),
            ("diversity_norm", fusion.diversity_norm),
            ("structure_norm", fusion.structure_norm),
        ];
        for (name, norm) in norms {
            if !norm.is_finite() || norm <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "fusion.{} must be positive, got {}",
                    name, norm
                )));
            }
        }
        if let Some(ratio) = fusion.supplement_skip_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ConfigError::Invalid(
                    "fusion.supplement_skip_ratio must be positive".to_string(),
                ));
            }
        }
        if let Some(confidence) = self.vision.assumed_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ConfigError::Invalid(format!(
                    "vision.assumed_confidence must be within [0, 1], got {}",
                    confidence
                )));
            }
        }
        if self.recognition.ocr_timeout_ms == 0 || self.recognition.vision_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "recognition timeouts must be greater than zero".to_string(),
            ));
        }
        if self.recognition.page_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "recognition.page_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to TOML for display.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            format: "TOML",
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.classifier.min_native_text_chars, 10);
        assert_eq!(config.recognition.ocr_timeout(), Duration::from_secs(30));
        assert_eq!(config.recognition.vision_timeout(), Duration::from_secs(60));
        assert_eq!(config.fusion.score_diff_threshold, 0.1);
        assert_eq!(config.fusion.weights, FusionWeights::default());
        assert!(!config.cleanup.enabled);
        assert_eq!(config.vision.assumed_confidence, Some(1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let config = Config::parse(
            r#"
            [classifier]
            min_native_text_chars = 40

            [fusion]
            score_diff_threshold = 0.2
            target_script = "latin"

            [fusion.weights]
            confidence = 0.5
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.classifier.min_native_text_chars, 40);
        assert_eq!(config.fusion.score_diff_threshold, 0.2);
        assert_eq!(config.fusion.target_script, TargetScript::Latin);
        assert_eq!(config.fusion.weights.confidence, 0.5);
        assert_eq!(config.fusion.weights.length, 0.3);
        assert_eq!(config.recognition.ocr_timeout_ms, 30_000);
    }

    #[test]
    fn yaml_and_json_are_supported() {
        let yaml = Config::parse("recognition:\n  vision_engine: none\n", "yml").unwrap();
        assert_eq!(RecognitionConfig::engine_enabled(&yaml.recognition.vision_engine), None);

        let json = Config::parse(r#"{"recognition": {"page_concurrency": 4}}"#, "json").unwrap();
        assert_eq!(json.recognition.page_concurrency, 4);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        config.fusion.weights.length = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.fusion.weights = FusionWeights {
            confidence: 0.0,
            length: 0.0,
            quality: 0.0,
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recognition.page_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fusion.length_norm = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.vision.assumed_confidence = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_errors_name_the_format() {
        let err = Config::parse("not = [valid", "toml").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn target_script_membership() {
        assert!(TargetScript::Cjk.contains('世'));
        assert!(!TargetScript::Cjk.contains('a'));
        assert!(TargetScript::Latin.contains('é'));
        assert!(!TargetScript::Latin.contains('世'));
    }

    #[tokio::test]
    async fn load_from_path_records_source_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagefuse.toml");
        std::fs::write(&path, "[recognition]\nocr_timeout_ms = 0\n").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());

        std::fs::write(&path, "[recognition]\nocr_timeout_ms = 5000\n").unwrap();
        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.recognition.ocr_timeout_ms, 5000);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }
}
