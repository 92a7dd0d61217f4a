//! The expansion protocol: toggling nodes and fetching on first expansion

use super::expansion::{affordance, ExpansionState, ExpansionTable, NodeState};
use super::rows::{visible_rows, VisibleRow};
use crate::model::Address;
use crate::source::ReferralSource;
use crate::tree::{Snapshot, TreeStore};
use crate::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a toggle did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The node is now expanded; `fetched` tells whether the source was asked
    Expanded { fetched: bool },
    Collapsed,
    /// A fetch for this node is already in flight
    Busy,
    /// The node sits at the depth limit and is never expanded
    DepthLimit,
    /// No node with this address in the current snapshot
    NotFound,
}

/// Drives expansion for every node of one viewer's tree
///
/// View flags live here, keyed by address; fetched data lives in the
/// [`TreeStore`]. At most one fetch per node is in flight at any time;
/// fetches for different nodes run concurrently and merge in whatever
/// order they complete.
pub struct Explorer {
    store: Arc<TreeStore>,
    source: Arc<dyn ReferralSource>,
    states: Mutex<ExpansionTable>,
    max_depth: usize,
}

impl Explorer {
    pub fn new(store: Arc<TreeStore>, source: Arc<dyn ReferralSource>, max_depth: usize) -> Self {
        let root = store.snapshot().root().address.clone();
        Explorer {
            store,
            source,
            states: Mutex::new(ExpansionTable::new(root)),
            max_depth,
        }
    }

    /// Start with the root collapsed instead of expanded
    ///
    /// For a root whose referrals are still unknown, so the first toggle
    /// fetches them.
    pub fn with_root_collapsed(mut self) -> Self {
        let root = self.store.snapshot().root().address.clone();
        self.states.get_mut().set(&root, ExpansionState::COLLAPSED);
        self
    }

    pub fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// A handle on a single node
    pub fn node(&self, address: impl Into<Address>) -> NodeController<'_> {
        NodeController {
            explorer: self,
            address: address.into(),
        }
    }

    pub fn expansion(&self, address: &Address) -> ExpansionState {
        self.states.lock().get(address)
    }

    pub fn state(&self, address: &Address) -> NodeState {
        self.expansion(address).state()
    }

    /// Whether the node should show an expand control
    pub fn can_expand(&self, address: &Address) -> bool {
        let snapshot = self.store.snapshot();
        match snapshot.find_with_depth(address) {
            Some((node, depth)) => affordance(node, depth, self.max_depth).is_ok(),
            None => false,
        }
    }

    /// Addresses with a fetch in flight
    pub fn in_flight(&self) -> Vec<Address> {
        self.states.lock().loading()
    }

    /// Rows to render, in display order
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let snapshot = self.store.snapshot();
        let states = self.states.lock();
        visible_rows(&snapshot, &states, self.max_depth)
    }

    /// Flip a node between collapsed and expanded
    ///
    /// Expanding a node whose referrals are unknown fetches them first and
    /// merges them into the store; the node only becomes `Expanded` once
    /// the merge has happened. On failure the node goes back to
    /// `Collapsed` with its referrals still unknown, and the error is
    /// returned so the caller can surface it. Nothing is cached, so the
    /// next toggle tries again.
    pub async fn toggle(&self, address: &Address) -> Result<ToggleOutcome> {
        {
            let mut states = self.states.lock();
            // read under the lock so a finished expansion is always visible
            let snapshot = self.store.snapshot();
            match states.state(address) {
                NodeState::Expanding => return Ok(ToggleOutcome::Busy),
                NodeState::Expanded => {
                    states.set(address, ExpansionState::COLLAPSED);
                    return Ok(ToggleOutcome::Collapsed);
                }
                NodeState::Collapsed => {}
            }

            let Some((node, depth)) = snapshot.find_with_depth(address) else {
                debug!(address = %address, "toggle on unknown address");
                return Ok(ToggleOutcome::NotFound);
            };
            if depth >= self.max_depth {
                return Ok(ToggleOutcome::DepthLimit);
            }
            if node.children.is_known() {
                states.set(address, ExpansionState::EXPANDED);
                return Ok(ToggleOutcome::Expanded { fetched: false });
            }
            states.set(address, ExpansionState::LOADING);
        }

        debug!(address = %address, source = self.source.name(), "fetching referrals");
        let merged = match self.source.fetch_children(address).await {
            Ok(children) => self.store.apply_children(address, children),
            Err(e) => Err(e),
        };

        let mut states = self.states.lock();
        match merged {
            Ok(_) => {
                states.set(address, ExpansionState::EXPANDED);
                Ok(ToggleOutcome::Expanded { fetched: true })
            }
            Err(e) => {
                warn!(address = %address, error = %e, "expansion failed");
                states.set(address, ExpansionState::COLLAPSED);
                Err(e)
            }
        }
    }
}

/// One node's controls
pub struct NodeController<'a> {
    explorer: &'a Explorer,
    address: Address,
}

impl NodeController<'_> {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn state(&self) -> NodeState {
        self.explorer.state(&self.address)
    }

    pub fn can_expand(&self) -> bool {
        self.explorer.can_expand(&self.address)
    }

    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        self.explorer.toggle(&self.address).await
    }
}
