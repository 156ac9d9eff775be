//! Point-in-time copies of the live tree
//!
//! A snapshot is a deep copy with non-content subtrees (scripts, styles,
//! media) cut away. It shares nothing with the live arena: the matcher may
//! excise nodes from a snapshot without touching the page.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId, Phid};
use crate::utils;

#[derive(Debug, Clone)]
pub struct Snapshot {
    arena: DomArena,
}

impl Snapshot {
    /// Copy the live tree and drop every blacklisted subtree
    pub fn capture(live: &DomArena, tag_blacklist: &[String]) -> Result<Self> {
        let mut arena = live.clone();

        for tag in tag_blacklist {
            for node_id in arena.find_by_tag(tag) {
                // Nested blacklisted nodes may already be gone with their ancestor
                if arena.contains(node_id) {
                    arena.remove_subtree(node_id)?;
                }
            }
        }

        Ok(Self { arena })
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.arena.root_id()
    }

    pub fn get_by_phid(&self, phid: Phid) -> Option<&DomNode> {
        self.arena.get_by_phid(phid)
    }

    /// Text of a node as it stands now, after any excisions
    pub fn text_of(&self, node_id: NodeId) -> Result<String> {
        utils::get_text_content(&self.arena, node_id)
    }

    /// Text of the node carrying `phid`, if it is still in the snapshot
    pub fn text_of_phid(&self, phid: Phid) -> Option<String> {
        let node_id = self.arena.node_id_by_phid(phid)?;
        self.text_of(node_id).ok()
    }

    /// Cut a node and its subtree out, so its text no longer reaches ancestors
    pub fn excise(&mut self, phid: Phid) -> bool {
        match self.arena.node_id_by_phid(phid) {
            Some(node_id) => self.arena.remove_subtree(node_id).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityAssigner;
    use crate::types::DEFAULT_TAG_BLACKLIST;

    fn blacklist() -> Vec<String> {
        DEFAULT_TAG_BLACKLIST.iter().map(|s| s.to_string()).collect()
    }

    fn page() -> DomArena {
        let mut arena = DomArena::new();
        let body = arena.add_node(DomNode::element("BODY"));
        arena.set_root(body).unwrap();
        let p = arena.append_child(body, DomNode::element("p")).unwrap();
        arena.append_child(p, DomNode::text("Welcome")).unwrap();
        let script = arena.append_child(body, DomNode::element("SCRIPT")).unwrap();
        arena.append_child(script, DomNode::text("only 1 left")).unwrap();
        let video = arena.append_child(p, DomNode::element("video")).unwrap();
        let nested = arena.append_child(video, DomNode::element("audio")).unwrap();
        arena.append_child(nested, DomNode::text("limited")).unwrap();
        IdentityAssigner::new().stamp(&mut arena).unwrap();
        arena
    }

    #[test]
    fn test_blacklisted_subtrees_are_dropped() {
        let live = page();
        let snapshot = Snapshot::capture(&live, &blacklist()).unwrap();

        let root = snapshot.root_id().unwrap();
        assert_eq!(snapshot.text_of(root).unwrap(), "Welcome");
        assert!(snapshot.arena().find_by_tag("script").is_empty());
        assert!(snapshot.arena().find_by_tag("audio").is_empty());

        // The live tree keeps everything
        assert_eq!(live.find_by_tag("script").len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_live_tree() {
        let mut live = page();
        let mut snapshot = Snapshot::capture(&live, &blacklist()).unwrap();

        let p_phid = live.get(live.find_by_tag("p")[0]).unwrap().phid.unwrap();
        assert!(snapshot.excise(p_phid));
        assert!(snapshot.get_by_phid(p_phid).is_none());
        assert!(live.get_by_phid(p_phid).is_some());

        let body = live.root_id().unwrap();
        live.append_child(body, DomNode::text(" again")).unwrap();
        assert_eq!(snapshot.text_of(snapshot.root_id().unwrap()).unwrap(), "");
    }
}
