//! Snapshot matcher
//!
//! Walks the later snapshot children-first, pairs every element with its
//! counterpart in the earlier snapshot by phid, and asks the registry for a
//! verdict. A node that matches is cut out of both snapshots straight away:
//! its text then no longer feeds into ancestors that are still to be
//! evaluated, so one deceptive phrase is reported once, on the innermost
//! element that carries it.

use dom::{utils, DomError, Phid, Snapshot};
use serde::{Deserialize, Serialize};

use crate::pattern::PatternRegistry;

/// An element claimed by a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub phid: Phid,
    pub class_key: String,
}

/// Classify every element of `current` against its state in `previous`
///
/// Both snapshots are consumed in the process: matched subtrees are gone
/// from them afterwards.
pub fn match_snapshots(
    registry: &PatternRegistry,
    current: &mut Snapshot,
    previous: &mut Snapshot,
) -> Result<Vec<PatternMatch>, DomError> {
    let Some(root_id) = current.root_id() else {
        return Ok(Vec::new());
    };

    let mut matches = Vec::new();
    for node_id in current.arena().post_order_elements(root_id)? {
        let Ok(node) = current.arena().get(node_id) else {
            continue;
        };
        let Some(phid) = node.phid else {
            continue;
        };

        let text = current.text_of(node_id)?;
        let previous_text = previous.text_of_phid(phid);

        let Some(class_key) = registry.evaluate(&text, previous_text.as_deref()) else {
            continue;
        };

        tracing::debug!(
            "[Matcher] {} on phid {}: {:?}",
            class_key,
            phid,
            utils::cap_text_length(&text, 80)
        );

        previous.excise(phid);
        current.excise(phid);
        matches.push(PatternMatch {
            phid,
            class_key: class_key.to_string(),
        });
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{block, page};
    use dom::{DomArena, DomNode, IdentityAssigner, NodeId};
    use std::collections::HashSet;

    fn blacklist() -> Vec<String> {
        dom::DEFAULT_TAG_BLACKLIST.iter().map(|s| s.to_string()).collect()
    }

    fn phid_of(arena: &DomArena, node_id: NodeId) -> Phid {
        arena.get(node_id).unwrap().phid.unwrap()
    }

    fn run(after: &DomArena, before: &DomArena) -> Vec<PatternMatch> {
        let registry = PatternRegistry::builtin().unwrap();
        let mut previous = Snapshot::capture(before, &blacklist()).unwrap();
        let mut current = Snapshot::capture(after, &blacklist()).unwrap();
        match_snapshots(&registry, &mut current, &mut previous).unwrap()
    }

    #[test]
    fn test_innermost_element_claims_the_text() {
        let (mut arena, body) = page();
        let wrapper = block(&mut arena, body, "div", "Welcome ");
        let ad = block(&mut arena, wrapper, "span", "Sponsored");
        IdentityAssigner::new().stamp(&mut arena).unwrap();

        let matches = run(&arena, &arena);

        assert_eq!(
            matches,
            vec![PatternMatch {
                phid: phid_of(&arena, ad),
                class_key: "disguised-ad".to_string(),
            }]
        );
    }

    #[test]
    fn test_ticking_child_is_not_reported_again_on_ancestors() {
        let (mut before, body) = page();
        let wrapper = block(&mut before, body, "div", "Offer ");
        let timer = block(&mut before, wrapper, "span", "00:05:30");
        let mut ids = IdentityAssigner::new();
        ids.stamp(&mut before).unwrap();

        let mut after = before.clone();
        let text_id = after.get(timer).unwrap().children_ids[0];
        after.get_mut(text_id).unwrap().node_value = "00:05:10".to_string();

        let matches = run(&after, &before);

        // The wrapper's own text ticks as well while the span is part of it
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].phid, phid_of(&before, timer));
        assert_eq!(matches[0].class_key, "countdown");
    }

    #[test]
    fn test_new_nodes_are_evaluated_without_history() {
        let (mut before, body) = page();
        let mut ids = IdentityAssigner::new();
        ids.stamp(&mut before).unwrap();

        let mut after = before.clone();
        let fresh = block(&mut after, body, "p", "Only 3 left in stock");
        let clock = block(&mut after, body, "p", "00:00:09");
        ids.stamp(&mut after).unwrap();

        let matches = run(&after, &before);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].phid, phid_of(&after, fresh));
        assert_eq!(matches[0].class_key, "false-urgency");
        assert!(matches.iter().all(|m| m.phid != phid_of(&after, clock)));
    }

    #[test]
    fn test_each_node_matched_once() {
        let (mut arena, body) = page();
        for text in ["Limited offer", "Deal of the day", "Get Premium free"] {
            block(&mut arena, body, "li", text);
        }
        arena.append_child(body, DomNode::text("Sponsored")).unwrap();
        IdentityAssigner::new().stamp(&mut arena).unwrap();

        let matches = run(&arena, &arena);
        let keys: Vec<&str> = matches.iter().map(|m| m.class_key.as_str()).collect();

        assert_eq!(
            keys,
            vec!["bait-and-switch", "false-urgency", "subscription-trap", "disguised-ad"]
        );
        let phids: HashSet<Phid> = matches.iter().map(|m| m.phid).collect();
        assert_eq!(phids.len(), 4);
    }
}
