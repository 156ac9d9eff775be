//! Scan results, rebuilt from the live tree's markers

use dom::{utils, DomArena, Phid};
use serde::{Deserialize, Serialize};

use crate::config::Markers;
use crate::pattern::PatternRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternResult {
    pub name: String,
    pub class_key: String,
    pub elements_visible: Vec<Phid>,
    pub elements_hidden: Vec<Phid>,
}

impl PatternResult {
    pub fn len(&self) -> usize {
        self.elements_visible.len() + self.elements_hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, phid: Phid) -> bool {
        self.elements_visible.contains(&phid) || self.elements_hidden.contains(&phid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// One entry per registered pattern, in registry order
    pub patterns: Vec<PatternResult>,
    pub count_visible: usize,
    pub count: usize,
}

impl ScanResult {
    /// Collect every marked element, split by visibility
    pub fn aggregate(arena: &DomArena, registry: &PatternRegistry, markers: &Markers) -> Self {
        let mut result = ScanResult::default();

        for pattern in registry.patterns() {
            let mut entry = PatternResult {
                name: pattern.name.clone(),
                class_key: pattern.class_key.clone(),
                ..Default::default()
            };

            for node_id in arena.find_by_class(&markers.pattern(&pattern.class_key)) {
                let Ok(node) = arena.get(node_id) else {
                    continue;
                };
                let Some(phid) = node.phid else {
                    continue;
                };
                if utils::is_element_visible(node) {
                    entry.elements_visible.push(phid);
                } else {
                    entry.elements_hidden.push(phid);
                }
            }

            result.count_visible += entry.elements_visible.len();
            result.count += entry.len();
            result.patterns.push(entry);
        }

        result
    }

    pub fn pattern(&self, class_key: &str) -> Option<&PatternResult> {
        self.patterns.iter().find(|p| p.class_key == class_key)
    }

    /// Class key of the pattern an element was reported under
    pub fn class_key_of(&self, phid: Phid) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.contains(phid))
            .map(|p| p.class_key.as_str())
    }
}
