//! Arena storage for page trees
//!
//! Nodes live in one `Vec` and refer to each other by `u32` index, so a
//! whole tree clones in one pass and every walk is an explicit stack loop
//! rather than recursion.
//!
//! Detached subtrees leave empty slots behind; an index is never handed
//! out twice by the same arena, so a stale `NodeId` simply fails lookup.
//!
//! ```text
//! nodes:    [body][div][None][#text]...
//! phid_map: { 0 → 0, 1 → 1 }
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType, Phid, PHID_ATTRIBUTE};
use ahash::AHashMap;

/// Slot storage plus a phid index; cloning yields an independent tree
#[derive(Debug, Clone)]
pub struct DomArena {
    nodes: Vec<Option<DomNode>>,

    /// Phid → NodeId lookup
    phid_map: AHashMap<Phid, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,

    /// Attached node count
    live: usize,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            phid_map: AHashMap::with_capacity(capacity),
            root_id: None,
            live: 0,
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if let Some(phid) = node.phid {
            self.phid_map.insert(phid, node_id);
        }
        self.nodes.push(Some(node));
        self.live += 1;
        node_id
    }

    /// Add a node as the last child of `parent_id`
    pub fn append_child(&mut self, parent_id: NodeId, mut node: DomNode) -> Result<NodeId> {
        self.get(parent_id)?;
        node.parent_id = Some(parent_id);
        let child_id = self.add_node(node);
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(child_id)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .and_then(Option::as_ref)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .and_then(Option::as_mut)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Check whether a node is still attached to this arena
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_ok()
    }

    /// Get node ID by identity
    pub fn node_id_by_phid(&self, phid: Phid) -> Option<NodeId> {
        self.phid_map.get(&phid).copied()
    }

    /// Get node by identity
    pub fn get_by_phid(&self, phid: Phid) -> Option<&DomNode> {
        self.node_id_by_phid(phid).and_then(|id| self.get(id).ok())
    }

    /// Get node by identity (mutable)
    pub fn get_by_phid_mut(&mut self, phid: Phid) -> Option<&mut DomNode> {
        let node_id = self.node_id_by_phid(phid)?;
        self.get_mut(node_id).ok()
    }

    /// Stamp an identity on a node, mirrored into its identity attribute
    pub fn assign_phid(&mut self, node_id: NodeId, phid: Phid) -> Result<()> {
        let node = self.get_mut(node_id)?;
        if let Some(previous) = node.phid.replace(phid) {
            // A duplicated identity may still belong to another node
            if self.phid_map.get(&previous) == Some(&node_id) {
                self.phid_map.remove(&previous);
            }
        }
        let node = self.get_mut(node_id)?;
        node.set_attr(PHID_ATTRIBUTE, phid.to_string());
        self.phid_map.insert(phid, node_id);
        Ok(())
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::MalformedTree("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// Number of attached nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterator over all attached nodes, in allocation order
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter().flatten()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Traverse tree depth-first, pre-order (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Element IDs in post-order: every child before its parent,
    /// siblings left-to-right
    pub fn post_order_elements(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![(start_id, false)];

        while let Some((node_id, expanded)) = stack.pop() {
            let node = self.get(node_id)?;
            if expanded {
                if node.is_element() {
                    order.push(node_id);
                }
                continue;
            }
            stack.push((node_id, true));
            for &child_id in node.children_ids.iter().rev() {
                stack.push((child_id, false));
            }
        }

        Ok(order)
    }

    /// Find nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        if let Some(root_id) = self.root_id {
            let _ = self.traverse_df(root_id, |node| {
                if predicate(node) {
                    found.push(node.node_id);
                }
                Ok(())
            });
        }
        found
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.node_type == NodeType::Element && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// Find all elements carrying a class
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.has_class(class))
    }

    /// Detach a node and everything below it
    ///
    /// Slots are emptied and their identities forgotten.
    pub fn remove_subtree(&mut self, node_id: NodeId) -> Result<usize> {
        let parent_id = self.get(node_id)?.parent_id;
        if let Some(parent_id) = parent_id {
            if let Ok(parent) = self.get_mut(parent_id) {
                parent.children_ids.retain(|child| *child != node_id);
            }
        }
        if self.root_id == Some(node_id) {
            self.root_id = None;
        }

        let mut removed = 0;
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id as usize).and_then(Option::take) else {
                continue;
            };
            if let Some(phid) = node.phid {
                self.phid_map.remove(&phid);
            }
            stack.extend(node.children_ids.iter().copied());
            removed += 1;
        }
        self.live -= removed;

        Ok(removed)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
