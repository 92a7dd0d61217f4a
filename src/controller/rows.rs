//! Flattened rows for the presentation layer

use super::expansion::{affordance, ExpansionTable, NodeState};
use crate::model::{Address, NodeId};
use crate::tree::Snapshot;
use serde::Serialize;

/// One rendered line of the tree
///
/// Rows must be keyed by `address` when rendered: positions shift as
/// referrals arrive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisibleRow {
    pub address: Address,
    pub id: NodeId,
    pub depth: usize,
    pub state: NodeState,
    pub expandable: bool,
    /// Loaded direct referrals, if known and non-empty
    pub direct_count: Option<usize>,
    /// Source's referral count hint
    pub referral_count: Option<u64>,
}

/// Pre-order rows from the root, descending only into expanded nodes above
/// the depth limit
pub fn visible_rows(snapshot: &Snapshot, states: &ExpansionTable, max_depth: usize) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut stack = vec![(snapshot.root(), 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let state = states.state(&node.address);
        rows.push(VisibleRow {
            address: node.address.clone(),
            id: node.id.clone(),
            depth,
            state,
            expandable: affordance(node, depth, max_depth).is_ok(),
            direct_count: node.children.loaded_len(),
            referral_count: node.referral_count,
        });

        if state == NodeState::Expanded && depth < max_depth {
            if let Some(children) = node.children.loaded() {
                stack.extend(children.iter().rev().map(|child| (child, depth + 1)));
            }
        }
    }
    rows
}
