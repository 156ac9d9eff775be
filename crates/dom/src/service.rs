//! DOM Service - builds an arena from a host's JSON tree
//!
//! The input is shaped like CDP's `DOM.getDocument` response, with two
//! optional per-node layout fields hosts may add:
//!
//! ```json
//! {
//!   "root": {
//!     "nodeType": 1,
//!     "nodeName": "DIV",
//!     "attributes": ["class", "promo", "data-phid", "12"],
//!     "computedStyles": { "display": "block" },
//!     "bounds": [0, 120, 300, 40],
//!     "children": [...]
//!   }
//! }
//! ```
//!
//! A `data-phid` attribute on input is honoured, so a host that re-sends a
//! previously stamped tree keeps its identities.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::*;
use serde_json::Value;

/// Configuration for DOM service
#[derive(Debug, Clone)]
pub struct DomServiceConfig {
    /// Root the arena at the first `<body>` instead of the document node
    pub body_only: bool,
    pub max_depth: usize,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            body_only: true,
            max_depth: 512,
        }
    }
}

/// Tree loader
pub struct DomService {
    config: DomServiceConfig,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        Self { config }
    }

    /// Parse a JSON tree into a fresh arena
    pub fn parse_tree(&self, response: &Value) -> Result<DomArena> {
        let root = response
            .get("root")
            .ok_or_else(|| DomError::MalformedTree("Missing 'root'".to_string()))?;

        let mut arena = DomArena::new();
        let root_id = self.parse_node(&mut arena, root, None, 0)?;
        arena.set_root(root_id)?;

        if self.config.body_only {
            if let Some(&body_id) = arena.find_by_tag("body").first() {
                arena.set_root(body_id)?;
            }
        }

        Ok(arena)
    }

    /// Parse a JSON string into a fresh arena
    pub fn parse_str(&self, json: &str) -> Result<DomArena> {
        let value: Value = serde_json::from_str(json)?;
        self.parse_tree(&value)
    }

    /// Recursively parse a node
    fn parse_node(
        &self,
        arena: &mut DomArena,
        json_node: &Value,
        parent_id: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId> {
        if depth > self.config.max_depth {
            return Err(DomError::MaxDepthExceeded {
                current: depth,
                max: self.config.max_depth,
            });
        }

        let node_type_val = json_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::MalformedTree("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = json_node["nodeName"].as_str().unwrap_or("");
        let mut node = DomNode::new(node_type, node_name);
        node.node_value = json_node["nodeValue"].as_str().unwrap_or("").to_string();
        node.parent_id = parent_id;

        // Attributes come as a flat [name, value, name, value, ...] list
        if let Some(attrs) = json_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    node.set_attr(key, value);
                }
            }
        }
        if node.is_element() {
            node.phid = node.attr(PHID_ATTRIBUTE).and_then(|v| v.parse().ok());
        }

        if let Some(styles) = json_node["computedStyles"].as_object() {
            for (key, value) in styles {
                if let Some(value) = value.as_str() {
                    node.computed_styles.insert(key.clone(), value.to_string());
                }
            }
        }

        if let Some(bounds) = json_node["bounds"].as_array() {
            let coords: Vec<f64> = bounds.iter().filter_map(Value::as_f64).collect();
            if let &[x, y, width, height] = coords.as_slice() {
                node.bounds = Some(DomRect::new(x, y, width, height));
            }
        }

        let current_node_id = arena.add_node(node);

        if let Some(children) = json_node["children"].as_array() {
            let mut child_ids = smallvec::SmallVec::new();

            for child in children {
                let child_id = self.parse_node(arena, child, Some(current_node_id), depth + 1)?;
                child_ids.push(child_id);
            }

            arena.get_mut(current_node_id)?.children_ids = child_ids;
        }

        Ok(current_node_id)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}
