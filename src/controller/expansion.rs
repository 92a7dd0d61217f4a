//! Per-node view state, kept apart from the fetched data

use crate::model::{Address, Children, Node};
use serde::Serialize;
use std::collections::HashMap;

/// Expansion state of one node as the presentation layer sees it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Collapsed,
    /// A fetch is in flight; the toggle is disabled
    Expanding,
    Expanded,
}

/// Raw view flags for a node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    pub expanded: bool,
    pub loading: bool,
}

impl ExpansionState {
    pub const COLLAPSED: ExpansionState = ExpansionState {
        expanded: false,
        loading: false,
    };
    pub const LOADING: ExpansionState = ExpansionState {
        expanded: false,
        loading: true,
    };
    pub const EXPANDED: ExpansionState = ExpansionState {
        expanded: true,
        loading: false,
    };

    pub fn state(&self) -> NodeState {
        if self.loading {
            NodeState::Expanding
        } else if self.expanded {
            NodeState::Expanded
        } else {
            NodeState::Collapsed
        }
    }
}

/// Why a node offers no expand control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAffordance {
    /// Known to have no referrals, or the source says it has none
    Leaf,
    /// At or below the depth limit
    DepthLimit,
}

/// Whether a node at `depth` gets an expand control
pub fn affordance(node: &Node, depth: usize, max_depth: usize) -> Result<(), NoAffordance> {
    if depth >= max_depth {
        return Err(NoAffordance::DepthLimit);
    }
    match node.children {
        Children::Empty => Err(NoAffordance::Leaf),
        Children::NotFetched if node.hinted_leaf() => Err(NoAffordance::Leaf),
        _ => Ok(()),
    }
}

/// View flags keyed by address
///
/// Nodes without an entry are collapsed, except the root which starts
/// expanded.
#[derive(Debug)]
pub struct ExpansionTable {
    root: Address,
    entries: HashMap<Address, ExpansionState>,
}

impl ExpansionTable {
    pub fn new(root: Address) -> Self {
        ExpansionTable {
            root,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, address: &Address) -> ExpansionState {
        match self.entries.get(address) {
            Some(state) => *state,
            None if address == &self.root => ExpansionState::EXPANDED,
            None => ExpansionState::COLLAPSED,
        }
    }

    pub fn state(&self, address: &Address) -> NodeState {
        self.get(address).state()
    }

    pub fn set(&mut self, address: &Address, state: ExpansionState) {
        self.entries.insert(address.clone(), state);
    }

    /// Addresses currently in flight
    pub fn loading(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(_, s)| s.loading)
            .map(|(a, _)| a.clone())
            .collect()
    }
}
