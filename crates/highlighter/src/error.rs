//! Error types for the detection engine
//!
//! Configuration problems are the only hard failures. Everything that can
//! go wrong mid-scan (vanished elements, overlapping requests) is a normal
//! outcome and never surfaces here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HighlighterError>;

/// Why a pattern set was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("pattern #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate pattern name: {0}")]
    DuplicateName(String),

    #[error("pattern '{pattern}' has an empty class key")]
    EmptyClassKey { pattern: String },

    #[error("duplicate class key: {0}")]
    DuplicateClassKey(String),

    #[error("pattern '{pattern}' has no detectors")]
    NoDetectors { pattern: String },

    #[error("detector #{index} of pattern '{pattern}' has no expressions")]
    EmptyDetector { pattern: String, index: usize },

    #[error("pattern '{pattern}' has an empty info URL")]
    EmptyInfoUrl { pattern: String },

    #[error("pattern '{pattern}' has an empty description")]
    EmptyInfo { pattern: String },

    #[error("pattern '{pattern}' supports no languages")]
    NoLanguages { pattern: String },

    #[error("pattern '{pattern}' lists an empty language code")]
    EmptyLanguage { pattern: String },
}

#[derive(Debug, Error)]
pub enum HighlighterError {
    #[error("Invalid pattern configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Invalid expression in pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("DOM error: {0}")]
    Dom(#[from] dom::DomError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
