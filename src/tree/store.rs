//! The single-writer owner of the current snapshot

use super::Snapshot;
use crate::graph;
use crate::model::{Address, Node};
use crate::Result;
use parking_lot::RwLock;
use tracing::{debug, info};

struct State {
    snapshot: Snapshot,
    /// Number of snapshot replacements so far
    generation: u64,
}

/// Holds the viewer's current snapshot
///
/// Readers get a cheap clone of the current snapshot and keep it valid for
/// as long as they like. Merges are applied against whatever snapshot is
/// current when they complete and replace it atomically, so concurrent
/// fetches for different nodes may finish in any order.
pub struct TreeStore {
    state: RwLock<State>,
}

impl TreeStore {
    /// Create a store around an initial snapshot
    pub fn new(snapshot: Snapshot) -> Self {
        TreeStore {
            state: RwLock::new(State {
                snapshot,
                generation: 0,
            }),
        }
    }

    /// Create a store from a root node
    pub fn from_root(root: Node) -> Result<Self> {
        Ok(Self::new(Snapshot::new(root)?))
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().snapshot.clone()
    }

    /// How many times the snapshot has been replaced
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Merge fetched children into the current snapshot
    ///
    /// Returns the snapshot that is current afterwards. A stale target
    /// leaves the store as it was.
    pub fn apply_children(&self, target: &Address, children: Vec<Node>) -> Result<Snapshot> {
        let count = children.len();
        let mut state = self.state.write();
        let next = state.snapshot.apply_children(target, children)?;

        if next.same_root(&state.snapshot) {
            debug!(address = %target, "merge left snapshot unchanged");
        } else {
            state.generation += 1;
            state.snapshot = next.clone();
            info!(
                address = %target,
                children = count,
                generation = state.generation,
                "merged referrals"
            );
        }
        Ok(next)
    }

    /// Known node count; a lower bound on the real network size
    pub fn count_all(&self) -> usize {
        graph::count_all(&self.snapshot())
    }

    /// The viewer's direct referral count, once known and non-empty
    pub fn direct_referral_count(&self) -> Option<usize> {
        graph::direct_referral_count(&self.snapshot())
    }
}
