//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId, NodeType};

/// Cap text length to keep log lines short
pub fn cap_text_length(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Check if element is visible according to CSS
pub fn is_element_visible_by_css(node: &DomNode) -> bool {
    let display = node.style("display").unwrap_or("");
    let visibility = node.style("visibility").unwrap_or("");
    let opacity = node.style("opacity").unwrap_or("1");

    if display == "none" || visibility == "hidden" {
        return false;
    }

    if let Ok(opacity_val) = opacity.trim().parse::<f64>() {
        if opacity_val <= 0.0 {
            return false;
        }
    }

    true
}

/// Visible by CSS and occupying some space on the page
///
/// Nodes the host never laid out have no box and count as hidden.
pub fn is_element_visible(node: &DomNode) -> bool {
    is_element_visible_by_css(node) && node.bounds.is_some_and(|b| b.has_area())
}

/// Get all text content from node and its children
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text.trim().to_string())
}
