//! Noise filtering for recognized text.
//!
//! Vision models in particular tend to answer blank or decorative images with
//! filler ("no visible text") or repeat a single token many times. The cleaner
//! drops such lines before region text reaches a page. Native text never
//! passes through here.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::CleanupConfig;

/// Lines made only of digits, whitespace and separators.
static SEPARATOR_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s\-_.]+$").unwrap());

/// Filters noise lines out of recognized text.
#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    config: CleanupConfig,
}

impl TextCleaner {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Clean `text` if cleanup is enabled, otherwise return it unchanged.
    pub fn apply(&self, text: String) -> String {
        if self.config.enabled {
            self.clean(&text)
        } else {
            text
        }
    }

    /// Drop noise lines and repeated lines, keeping first-seen order.
    pub fn clean(&self, text: &str) -> String {
        let mut seen = HashSet::new();
        let kept: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !self.is_noise(line))
            .filter(|line| seen.insert(*line))
            .collect();
        kept.join("\n")
    }

    fn is_noise(&self, line: &str) -> bool {
        if line.chars().count() < self.config.min_line_chars {
            return true;
        }
        if SEPARATOR_ONLY.is_match(line) {
            return true;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() > 2 && tokens.iter().all(|t| *t == tokens[0]) {
            return true;
        }

        self.config
            .noise_phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && line.contains(phrase.as_str()))
    }
}
