//! Pattern definitions and the validated registry
//!
//! A pattern is a named list of detectors. Detectors are pure predicates
//! over the current text of a node and, when the node existed in the
//! earlier snapshot, its previous text.
//!
//! Evaluation order is part of the contract: patterns in declaration
//! order, then detectors in declaration order, first hit wins. When two
//! patterns could claim a node, the one registered first gets it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::countdown;
use crate::error::{HighlighterError, Result, ValidationError};

/// Two-argument detector: `(current_text, previous_text)`
pub type Predicate = Arc<dyn Fn(&str, Option<&str>) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Detector {
    /// Fires when every expression matches the current text
    AllOf(Vec<Regex>),
    /// Fires when any expression matches the current text
    AnyOf(Vec<Regex>),
    /// Running countdown between previous and current text
    Countdown,
    Custom(Predicate),
}

impl Detector {
    /// Case-insensitive conjunction of expressions
    pub fn all_of(expressions: &[&str]) -> std::result::Result<Self, regex::Error> {
        Ok(Self::AllOf(compile(expressions)?))
    }

    /// Case-insensitive disjunction of expressions
    pub fn any_of(expressions: &[&str]) -> std::result::Result<Self, regex::Error> {
        Ok(Self::AnyOf(compile(expressions)?))
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn detect(&self, current: &str, previous: Option<&str>) -> bool {
        match self {
            Self::AllOf(expressions) => expressions.iter().all(|re| re.is_match(current)),
            Self::AnyOf(expressions) => expressions.iter().any(|re| re.is_match(current)),
            Self::Countdown => countdown::is_countdown(current, previous),
            Self::Custom(predicate) => predicate(current, previous),
        }
    }

    /// An expression detector without expressions can never fire
    fn is_empty(&self) -> bool {
        match self {
            Self::AllOf(expressions) | Self::AnyOf(expressions) => expressions.is_empty(),
            Self::Countdown | Self::Custom(_) => false,
        }
    }
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllOf(expressions) => f.debug_tuple("AllOf").field(expressions).finish(),
            Self::AnyOf(expressions) => f.debug_tuple("AnyOf").field(expressions).finish(),
            Self::Countdown => f.write_str("Countdown"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn compile(expressions: &[&str]) -> std::result::Result<Vec<Regex>, regex::Error> {
    expressions
        .iter()
        .map(|expr| RegexBuilder::new(expr).case_insensitive(true).build())
        .collect()
}

/// One kind of manipulative interface pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub class_key: String,
    pub detectors: Vec<Detector>,
    pub info_url: String,
    pub info: String,
    pub languages: Vec<String>,
}

/// Check a pattern set, reporting the first problem found
pub fn validate(patterns: &[Pattern]) -> std::result::Result<(), ValidationError> {
    let mut names = HashSet::new();
    let mut class_keys = HashSet::new();

    for (index, pattern) in patterns.iter().enumerate() {
        if pattern.name.is_empty() {
            return Err(ValidationError::EmptyName { index });
        }
        if !names.insert(pattern.name.as_str()) {
            return Err(ValidationError::DuplicateName(pattern.name.clone()));
        }

        let name = || pattern.name.clone();

        if pattern.class_key.is_empty() {
            return Err(ValidationError::EmptyClassKey { pattern: name() });
        }
        if !class_keys.insert(pattern.class_key.as_str()) {
            return Err(ValidationError::DuplicateClassKey(pattern.class_key.clone()));
        }
        if pattern.detectors.is_empty() {
            return Err(ValidationError::NoDetectors { pattern: name() });
        }
        if let Some(index) = pattern.detectors.iter().position(Detector::is_empty) {
            return Err(ValidationError::EmptyDetector {
                pattern: name(),
                index,
            });
        }
        if pattern.info_url.is_empty() {
            return Err(ValidationError::EmptyInfoUrl { pattern: name() });
        }
        if pattern.info.is_empty() {
            return Err(ValidationError::EmptyInfo { pattern: name() });
        }
        if pattern.languages.is_empty() {
            return Err(ValidationError::NoLanguages { pattern: name() });
        }
        if pattern.languages.iter().any(String::is_empty) {
            return Err(ValidationError::EmptyLanguage { pattern: name() });
        }
    }

    Ok(())
}

pub fn is_valid(patterns: &[Pattern]) -> bool {
    validate(patterns).is_ok()
}

/// Declarative form of a detector, as found in JSON configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorSpec {
    All { expressions: Vec<String> },
    Any { expressions: Vec<String> },
    Countdown,
}

/// Declarative form of a pattern, as found in JSON configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatternSpec {
    pub name: String,
    pub class_key: String,
    pub detectors: Vec<DetectorSpec>,
    pub info_url: String,
    pub info: String,
    pub languages: Vec<String>,
}

impl PatternSpec {
    pub fn compile(&self) -> Result<Pattern> {
        let detectors = self
            .detectors
            .iter()
            .map(|spec| {
                let compiled = match spec {
                    DetectorSpec::All { expressions } => {
                        compile(&as_strs(expressions)).map(Detector::AllOf)
                    }
                    DetectorSpec::Any { expressions } => {
                        compile(&as_strs(expressions)).map(Detector::AnyOf)
                    }
                    DetectorSpec::Countdown => Ok(Detector::Countdown),
                };
                compiled.map_err(|source| HighlighterError::InvalidRegex {
                    pattern: self.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Pattern {
            name: self.name.clone(),
            class_key: self.class_key.clone(),
            detectors,
            info_url: self.info_url.clone(),
            info: self.info.clone(),
            languages: self.languages.clone(),
        })
    }
}

fn as_strs(expressions: &[String]) -> Vec<&str> {
    expressions.iter().map(String::as_str).collect()
}

/// A pattern set that passed validation
///
/// There is no way to build one from an invalid set, so an engine holding
/// a registry never runs with a partial or malformed configuration.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
}

impl PatternRegistry {
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        validate(&patterns)?;
        Ok(Self { patterns })
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self> {
        let patterns = specs
            .iter()
            .map(PatternSpec::compile)
            .collect::<Result<Vec<_>>>()?;
        Self::new(patterns)
    }

    /// Load a JSON array of pattern specs
    pub fn from_json_str(json: &str) -> Result<Self> {
        let specs: Vec<PatternSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, class_key: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.class_key == class_key)
    }

    /// Class key of the first pattern with a firing detector
    pub fn evaluate(&self, current: &str, previous: Option<&str>) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| {
                pattern
                    .detectors
                    .iter()
                    .any(|detector| detector.detect(current, previous))
            })
            .map(|pattern| pattern.class_key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(name: &str, class_key: &str, detectors: Vec<Detector>) -> Pattern {
        Pattern {
            name: name.to_string(),
            class_key: class_key.to_string(),
            detectors,
            info_url: "https://example.org/patterns".to_string(),
            info: "Explains the pattern.".to_string(),
            languages: vec!["en".to_string()],
        }
    }

    fn minimal() -> Pattern {
        pattern("Limited", "limited", vec![Detector::any_of(&["limited"]).unwrap()])
    }

    #[test]
    fn test_minimal_pattern_is_valid() {
        assert!(is_valid(&[minimal()]));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut other = minimal();
        other.class_key = "other".to_string();

        assert_eq!(
            validate(&[minimal(), other]),
            Err(ValidationError::DuplicateName("Limited".to_string()))
        );
    }

    #[test]
    fn test_duplicate_class_key_rejected() {
        let mut other = minimal();
        other.name = "Other".to_string();

        assert!(matches!(
            validate(&[minimal(), other]),
            Err(ValidationError::DuplicateClassKey(_))
        ));
    }

    #[test]
    fn test_missing_detectors_rejected() {
        let mut broken = minimal();
        broken.detectors.clear();
        assert!(!is_valid(&[broken]));

        let mut never_fires = minimal();
        never_fires.detectors.push(Detector::AllOf(Vec::new()));
        assert_eq!(
            validate(&[never_fires]),
            Err(ValidationError::EmptyDetector {
                pattern: "Limited".to_string(),
                index: 1
            })
        );
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut no_url = minimal();
        no_url.info_url.clear();
        let mut no_info = minimal();
        no_info.info.clear();
        let mut no_languages = minimal();
        no_languages.languages.clear();
        let mut blank_language = minimal();
        blank_language.languages.push(String::new());
        let mut no_key = minimal();
        no_key.class_key.clear();
        let mut no_name = minimal();
        no_name.name.clear();

        for broken in [no_url, no_info, no_languages, blank_language, no_key, no_name] {
            assert!(!is_valid(&[broken]));
        }
    }

    #[test]
    fn test_invalid_set_never_becomes_registry() {
        let err = PatternRegistry::new(vec![minimal(), minimal()]).unwrap_err();

        assert!(err.to_string().contains("duplicate pattern name"));
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let registry = PatternRegistry::new(vec![
            pattern("First", "first", vec![Detector::any_of(&["deal"]).unwrap()]),
            pattern("Second", "second", vec![Detector::any_of(&["deal"]).unwrap()]),
        ])
        .unwrap();

        assert_eq!(registry.evaluate("Deal of the day", None), Some("first"));
        assert_eq!(registry.evaluate("nothing here", None), None);
    }

    #[test]
    fn test_custom_detector_sees_previous_text() {
        let registry = PatternRegistry::new(vec![pattern(
            "Changed",
            "changed",
            vec![Detector::custom(|current, previous| {
                previous.is_some_and(|previous| previous != current)
            })],
        )])
        .unwrap();

        assert_eq!(registry.evaluate("b", Some("a")), Some("changed"));
        assert_eq!(registry.evaluate("b", None), None);
    }

    #[test]
    fn test_all_of_requires_every_expression() {
        let detector = Detector::all_of(&["urgent", "false"]).unwrap();

        assert!(detector.detect("FALSE sense of URGENT need", None));
        assert!(!detector.detect("urgent", None));
    }

    #[test]
    fn test_registry_from_json() {
        let json = r#"[
            {
                "name": "Countdown",
                "classKey": "countdown",
                "detectors": [{ "kind": "countdown" }],
                "infoUrl": "https://example.org/countdown",
                "info": "Fake timers.",
                "languages": ["en", "de"]
            },
            {
                "name": "Scarcity",
                "classKey": "scarcity",
                "detectors": [{ "kind": "any", "expressions": ["limited", "rare"] }],
                "infoUrl": "https://example.org/scarcity",
                "info": "Fake scarcity.",
                "languages": ["en"]
            }
        ]"#;

        let registry = PatternRegistry::from_json_str(json).unwrap();

        assert_eq!(registry.patterns().len(), 2);
        assert_eq!(registry.evaluate("Rare find", None), Some("scarcity"));
        assert_eq!(registry.evaluate("00:09", Some("00:10")), Some("countdown"));
    }

    #[test]
    fn test_bad_expression_in_json() {
        let json = r#"[{
            "name": "Broken",
            "classKey": "broken",
            "detectors": [{ "kind": "all", "expressions": ["(unclosed"] }],
            "infoUrl": "https://example.org",
            "info": "x",
            "languages": ["en"]
        }]"#;

        assert!(matches!(
            PatternRegistry::from_json_str(json),
            Err(HighlighterError::InvalidRegex { .. })
        ));
    }
}
