//! Node and layout types shared by the live tree and its snapshots
//!
//! Two kinds of handle exist. A `NodeId` indexes one arena and means
//! nothing outside it; a `Phid` is stamped onto elements and survives
//! cloning, so it is what links a live element to its snapshot copies.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Index into one arena
pub type NodeId = u32;

/// Pattern highlighter identity, stable across snapshots
pub type Phid = u64;

/// Attribute carrying the identity on every stamped element
pub const PHID_ATTRIBUTE: &str = "data-phid";

/// Element categories that never carry user-visible content
pub const DEFAULT_TAG_BLACKLIST: &[&str] = &["script", "style", "noscript", "audio", "video"];

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }
}

/// Rectangle with coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// A box with neither width nor height renders nothing
    pub fn has_area(&self) -> bool {
        self.width > 0.0 || self.height > 0.0
    }
}

/// One element, text or structural node
///
/// Layout data is optional: hosts that never render leave it empty, and
/// such elements count as hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub phid: Option<Phid>,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,

    // Layout, as reported by the host
    pub computed_styles: HashMap<String, String>,
    /// Document coordinates (top-left of page, ignores scroll)
    pub bounds: Option<DomRect>,
}

impl DomNode {
    /// Create a new node with required fields
    ///
    /// `node_id` is assigned by the arena on insertion.
    pub fn new(node_type: NodeType, node_name: impl Into<String>) -> Self {
        Self {
            node_id: 0,
            node_type,
            phid: None,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name: node_name.into(),
            node_value: String::new(),
            attributes: HashMap::new(),
            computed_styles: HashMap::new(),
            bounds: None,
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeType::Element, tag)
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Text, "#text");
        node.node_value = value.into();
        node
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Get computed style property
    pub fn style(&self, property: &str) -> Option<&str> {
        self.computed_styles.get(property).map(|s| s.as_str())
    }

    /// Whitespace-separated class list
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class unless already present
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    /// Strip every class starting with `prefix`, returns how many were removed
    pub fn remove_classes_with_prefix(&mut self, prefix: &str) -> usize {
        let before = self.classes().count();
        let kept: Vec<&str> = self.classes().filter(|c| !c.starts_with(prefix)).collect();
        let removed = before - kept.len();
        if removed > 0 {
            let joined = kept.join(" ");
            self.set_attr("class", joined);
        }
        removed
    }
}
