//! Tree fixtures shared by the unit tests

use dom::{DomArena, DomNode, DomRect, NodeId};

fn laid_out(tag: &str) -> DomNode {
    let mut node = DomNode::element(tag);
    node.bounds = Some(DomRect::new(0.0, 0.0, 320.0, 24.0));
    node
}

/// An empty, laid-out body
pub(crate) fn page() -> (DomArena, NodeId) {
    let mut arena = DomArena::new();
    let body = arena.add_node(laid_out("body"));
    arena.set_root(body).expect("body was just added");
    (arena, body)
}

/// A laid-out element holding one text node
pub(crate) fn block(arena: &mut DomArena, parent: NodeId, tag: &str, text: &str) -> NodeId {
    let node_id = arena
        .append_child(parent, laid_out(tag))
        .expect("parent is attached");
    arena
        .append_child(node_id, DomNode::text(text))
        .expect("block was just added");
    node_id
}

/// The text node inside a `block`
pub(crate) fn text_of_block(arena: &DomArena, block: NodeId) -> NodeId {
    arena.get(block).expect("block is attached").children_ids[0]
}
