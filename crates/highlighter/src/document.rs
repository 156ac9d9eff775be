//! The live document shared between host and engine
//!
//! The host owns the content and tells us about changes; the engine owns
//! the annotations. Both write to the same arena behind one lock, but only
//! host writes go out on the mutation bus, so annotating a page never wakes
//! the scheduler.

use std::sync::Arc;

use dom::{DomArena, DomNode, DomRect, DomService, Phid};
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Markers;
use crate::error::Result;
use crate::events::{EventBus, MutationRecord};

#[derive(Clone)]
pub struct LiveDocument {
    tree: Arc<RwLock<DomArena>>,
    mutations: Arc<EventBus<MutationRecord>>,
}

impl LiveDocument {
    pub fn new(arena: DomArena) -> Self {
        Self {
            tree: Arc::new(RwLock::new(arena)),
            mutations: Arc::new(EventBus::new()),
        }
    }

    /// Load a host tree in `DOM.getDocument` shape
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(DomService::new().parse_str(json)?))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, DomArena> {
        self.tree.read().await
    }

    /// Engine-side write access, invisible to observers
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, DomArena> {
        self.tree.write().await
    }

    /// Host-side change: apply it, then notify observers
    pub async fn mutate<F, R>(&self, record: MutationRecord, change: F) -> R
    where
        F: FnOnce(&mut DomArena) -> R,
    {
        let outcome = {
            let mut tree = self.tree.write().await;
            change(&mut *tree)
        };
        self.mutations.publish(record);
        outcome
    }

    /// Start observing mutations; dropping the receiver stops it
    pub fn observe(&self) -> broadcast::Receiver<MutationRecord> {
        self.mutations.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.mutations.subscriber_count()
    }
}

/// Strip every engine class from previously matched elements
pub fn reset_annotations(arena: &mut DomArena, markers: &Markers) -> usize {
    let matched = arena.find_by_class(markers.detected());
    for node_id in &matched {
        if let Ok(node) = arena.get_mut(*node_id) {
            node.remove_classes_with_prefix(markers.prefix());
        }
    }
    matched.len()
}

/// Tag an element with the generic and the pattern-specific marker
///
/// Returns false when the element has left the tree since it was captured.
pub fn annotate(arena: &mut DomArena, phid: Phid, class_key: &str, markers: &Markers) -> bool {
    let Some(node) = arena.get_by_phid_mut(phid) else {
        return false;
    };
    node.add_class(markers.detected());
    node.add_class(&markers.pattern(class_key));
    true
}

/// Put a single positioned overlay over the element carrying `phid`
///
/// Any earlier overlay is removed first, even when the element is gone.
pub fn place_overlay(arena: &mut DomArena, phid: Phid, markers: &Markers) -> bool {
    for overlay_id in arena.find_by_class(markers.current()) {
        let _ = arena.remove_subtree(overlay_id);
    }

    let Some(rect) = arena
        .get_by_phid(phid)
        .map(|node| node.bounds.unwrap_or_else(DomRect::zero))
    else {
        return false;
    };
    let Some(root_id) = arena.root_id() else {
        return false;
    };

    let mut overlay = DomNode::element("div");
    overlay.add_class(markers.current());
    overlay.set_attr(
        "style",
        format!(
            "position: absolute; top: {}px; left: {}px; width: {}px; height: {}px;",
            rect.y, rect.x, rect.width, rect.height
        ),
    );
    overlay.bounds = Some(rect);

    arena.append_child(root_id, overlay).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use dom::IdentityAssigner;

    fn stamped_page() -> (DomArena, Phid) {
        let mut arena = DomArena::new();
        let body = arena.add_node(DomNode::element("body"));
        arena.set_root(body).unwrap();
        let mut banner = DomNode::element("div");
        banner.bounds = Some(DomRect::new(10.0, 200.0, 300.0, 50.0));
        let banner = arena.append_child(body, banner).unwrap();
        IdentityAssigner::new().stamp(&mut arena).unwrap();
        let phid = arena.get(banner).unwrap().phid.unwrap();
        (arena, phid)
    }

    #[test]
    fn test_annotate_and_reset() {
        let markers = EngineConfig::default().markers();
        let (mut arena, phid) = stamped_page();
        arena.get_by_phid_mut(phid).unwrap().add_class("banner");

        assert!(annotate(&mut arena, phid, "disguised-ad", &markers));
        assert!(annotate(&mut arena, phid, "disguised-ad", &markers));
        assert_eq!(
            arena.get_by_phid(phid).unwrap().attr("class"),
            Some("banner d_pattern-detected d_disguised-ad")
        );

        assert_eq!(reset_annotations(&mut arena, &markers), 1);
        assert_eq!(arena.get_by_phid(phid).unwrap().attr("class"), Some("banner"));
        assert!(!annotate(&mut arena, 999, "disguised-ad", &markers));
    }

    #[test]
    fn test_overlay_replaces_previous_one() {
        let markers = EngineConfig::default().markers();
        let (mut arena, phid) = stamped_page();

        assert!(place_overlay(&mut arena, phid, &markers));
        assert!(place_overlay(&mut arena, phid, &markers));

        let overlays = arena.find_by_class(markers.current());
        assert_eq!(overlays.len(), 1);
        let overlay = arena.get(overlays[0]).unwrap();
        assert_eq!(overlay.bounds, Some(DomRect::new(10.0, 200.0, 300.0, 50.0)));
        assert!(overlay.attr("style").unwrap().contains("top: 200px"));

        assert!(!place_overlay(&mut arena, 999, &markers));
        assert!(arena.find_by_class(markers.current()).is_empty());
    }

    #[tokio::test]
    async fn test_only_host_writes_notify() {
        let (arena, phid) = stamped_page();
        let document = LiveDocument::new(arena);
        let mut observer = document.observe();

        document.write().await.get_by_phid_mut(phid).unwrap().add_class("x");
        assert!(observer.try_recv().is_err());

        document
            .mutate(MutationRecord::CharacterData, |tree| {
                let root = tree.root_id().unwrap();
                tree.append_child(root, DomNode::text("new")).unwrap();
            })
            .await;
        assert_eq!(observer.try_recv().unwrap(), MutationRecord::CharacterData);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"root": {"nodeType": 1, "nodeName": "BODY", "attributes": ["data-phid", "3"]}}"#;
        let document = LiveDocument::from_json(json).unwrap();

        let tree = tokio_test::block_on(document.read());
        assert_eq!(tree.get_by_phid(3).unwrap().node_name, "BODY");
        assert_eq!(document.observer_count(), 0);
        assert!(LiveDocument::from_json("{}").is_err());
    }
}
