//! Text normalizer
//!
//! Maps raw article text to a space-separated sequence of stemmed tokens.
//! The same normalizer runs at training and at serving time so both paths
//! produce identical feature spaces.
//!
//! Steps:
//! 1. Lowercase
//! 2. Strip URLs and email-like substrings
//! 3. Keep only ASCII letters and whitespace
//! 4. Split on whitespace, drop stopwords and short tokens
//! 5. Porter-stem each token to a fixed point, then filter again
//!
//! The output is a fixed point of the normalizer: normalizing it a second
//! time returns it unchanged.

use crate::stemmer::PorterStemmer;
use crate::stopwords::StopwordSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use verinews_core::{Error, Result};

/// Normalizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Remove URLs and email addresses before filtering characters
    #[serde(default = "default_true")]
    pub strip_urls: bool,

    /// Tokens shorter than this are dropped
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,

    /// Stopwords added to the English list
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_urls: true,
            min_token_len: default_min_token_len(),
            extra_stopwords: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_token_len() -> usize {
    3
}

/// Deterministic text normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    url_regex: Regex,
    email_regex: Regex,
    stopwords: StopwordSet,
    stemmer: PorterStemmer,
}

impl Normalizer {
    /// Create a normalizer from configuration
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let url_regex = Regex::new(r"http\S+|www\S+|https\S+")
            .map_err(|e| Error::config(format!("Failed to compile URL regex: {}", e)))?;
        let email_regex = Regex::new(r"\S+@\S+")
            .map_err(|e| Error::config(format!("Failed to compile email regex: {}", e)))?;

        let mut stopwords = StopwordSet::english();
        stopwords.extend(&config.extra_stopwords);

        Ok(Self {
            config,
            url_regex,
            email_regex,
            stopwords,
            stemmer: PorterStemmer::new(),
        })
    }

    /// Get the configuration this normalizer was built with
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a possibly absent text into a space-separated token string
    pub fn normalize(&self, text: Option<&str>) -> String {
        self.tokens(text).join(" ")
    }

    /// Normalize a text into its token sequence
    pub fn tokens(&self, text: Option<&str>) -> Vec<String> {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return Vec::new(),
        };

        let mut lowered = text.to_lowercase();
        if self.config.strip_urls {
            lowered = self.url_regex.replace_all(&lowered, "").into_owned();
            lowered = self.email_regex.replace_all(&lowered, "").into_owned();
        }

        let letters: String = lowered
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect();

        letters
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(|token| self.stem(token))
            .filter(|stem| self.keep(stem) && !self.looks_like_url(stem))
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        token.len() >= self.config.min_token_len && !self.stopwords.contains(token)
    }

    // Letter filtering can glue "ht1tpx" into "httpx"; such tokens would be
    // stripped on a second pass, so they are dropped here.
    fn looks_like_url(&self, token: &str) -> bool {
        self.config.strip_urls && self.url_regex.is_match(token)
    }

    /// Stem until the word stops changing.
    ///
    /// Each pass either shortens the word or rewrites a final y/i, so the
    /// loop terminates.
    fn stem(&self, token: &str) -> String {
        let mut current = token.to_string();
        loop {
            let next = self.stemmer.stem(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default()).expect("Failed to create default normalizer")
    }
}
