//! Tesseract OCR engine.
//!
//! Runs the `tesseract` command-line tool in TSV mode so word confidences
//! come back along with the text. The child process is killed if the call is
//! abandoned by its track timeout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::backend::{EngineError, RecognitionEngine};
use super::model_utils::{check_binary, extension_for_mime};
use crate::config::TesseractConfig;
use crate::models::{EngineOutput, EngineTag};

/// TSV row level for words.
const WORD_LEVEL: &str = "5";

/// Tesseract OCR engine.
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    async fn run_tesseract(&self, image: &[u8], mime: &str) -> Result<String, EngineError> {
        let temp = tempfile::Builder::new()
            .prefix("pagefuse-")
            .suffix(&format!(".{}", extension_for_mime(mime)))
            .tempfile()?;
        tokio::fs::write(temp.path(), image).await?;

        let output = Command::new(&self.config.binary)
            .arg(temp.path())
            .arg("stdout")
            .args(["-l", &self.config.language])
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(EngineError::Failed(format!(
                    "tesseract failed: {}",
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::NotAvailable(
                "tesseract not found (install tesseract-ocr)".to_string(),
            )),
            Err(e) => Err(EngineError::Io(e)),
        }
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn engine_tag(&self) -> EngineTag {
        EngineTag::Ocr
    }

    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.config.binary)
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            format!("Tesseract is available (language: {})", self.config.language)
        } else {
            "Install tesseract-ocr (apt install tesseract-ocr tesseract-ocr-chi-sim) \
             or set tesseract.binary"
                .to_string()
        }
    }

    async fn recognize(&self, image: &[u8], mime: &str) -> Result<EngineOutput, EngineError> {
        let tsv = self.run_tesseract(image, mime).await?;
        let parsed = parse_tsv(&tsv);
        debug!(
            words = parsed.words,
            confidence = ?parsed.confidence,
            "Parsed tesseract output"
        );

        let mut output = EngineOutput::new(parsed.text).with_model(self.config.language.clone());
        output.confidence = parsed.confidence;
        Ok(output)
    }
}

/// Text and mean word confidence parsed from tesseract TSV output.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TsvText {
    pub text: String,
    pub confidence: Option<f64>,
    pub words: usize,
}

/// Group word rows into lines by (block, paragraph, line) and average the
/// word confidences, ignoring negative ones.
pub(crate) fn parse_tsv(tsv: &str) -> TsvText {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<(&str, &str, &str)> = None;
    let mut conf_sum = 0.0;
    let mut conf_count = 0usize;
    let mut words = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        if let Ok(conf) = cols[10].trim().parse::<f64>() {
            if conf >= 0.0 {
                conf_sum += conf;
                conf_count += 1;
            }
        }

        let key = (cols[2], cols[3], cols[4]);
        match lines.last_mut() {
            Some(line) if current_key == Some(key) => {
                line.push(' ');
                line.push_str(word);
            }
            _ => {
                lines.push(word.to_string());
                current_key = Some(key);
            }
        }
        words += 1;
    }

    TsvText {
        text: lines.join("\n"),
        confidence: (conf_count > 0).then(|| (conf_sum / conf_count as f64 / 100.0).clamp(0.0, 1.0)),
        words,
    }
}
