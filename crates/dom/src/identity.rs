//! Identity stamping
//!
//! Hosts have no persistent element ID we can rely on, so we hand out our
//! own. A counter lives for the lifetime of one loaded document; every
//! element without a phid gets the next value, elements that already carry
//! one keep it. Stamping an unchanged tree is a no-op.
//!
//! Identities restored from the host (`data-phid` on input) are only kept
//! when they are unambiguous: the first element in document order that
//! holds a value keeps it, any other holder is re-stamped. `Phid::MAX` is
//! never kept or handed out.

use ahash::AHashSet;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{NodeId, Phid};

/// Monotonic phid source for one document
#[derive(Debug, Default)]
pub struct IdentityAssigner {
    next_id: Phid,
}

impl IdentityAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The phid the next unstamped element will receive
    pub fn next_id(&self) -> Phid {
        self.next_id
    }

    /// Stamp every unstamped element below (and including) the root
    ///
    /// Returns how many new identities were assigned.
    pub fn stamp(&mut self, arena: &mut DomArena) -> Result<usize> {
        let Some(root_id) = arena.root_id() else {
            return Ok(0);
        };

        let mut unstamped: Vec<NodeId> = Vec::new();
        let mut held: AHashSet<Phid> = AHashSet::new();
        let mut highest: Option<Phid> = None;
        arena.traverse_df(root_id, |node| {
            if !node.is_element() {
                return Ok(());
            }
            let keep = match node.phid {
                Some(phid) => {
                    phid < Phid::MAX
                        && arena.node_id_by_phid(phid) == Some(node.node_id)
                        && held.insert(phid)
                }
                None => false,
            };
            if keep {
                highest = highest.max(node.phid);
            } else {
                unstamped.push(node.node_id);
            }
            Ok(())
        })?;

        // Kept identities must never be handed out again; below MAX, so no overflow
        if let Some(highest) = highest {
            self.next_id = self.next_id.max(highest + 1);
        }

        for node_id in &unstamped {
            let phid = self.allocate()?;
            arena.assign_phid(*node_id, phid)?;
        }

        Ok(unstamped.len())
    }

    fn allocate(&mut self) -> Result<Phid> {
        if self.next_id == Phid::MAX {
            return Err(DomError::IdentitiesExhausted);
        }
        let phid = self.next_id;
        self.next_id += 1;
        Ok(phid)
    }
}
