//! Counting helpers over a snapshot
//!
//! All counts reflect what has been fetched so far. Unfetched subtrees
//! contribute only their top node, so every total here is a lower bound on
//! the real size of the network, not a census.

use crate::model::Children;
use crate::tree::Snapshot;

use super::traversal::walk;

/// Root plus every node reachable through loaded children
///
/// Nodes whose referrals were never fetched count as one. Use this as a
/// lower bound of the network size.
pub fn count_all(snapshot: &Snapshot) -> usize {
    snapshot.root().count_known()
}

/// Number of the root's direct referrals
///
/// `None` while the root's referrals are unknown, and also when they are
/// known to be empty.
pub fn direct_referral_count(snapshot: &Snapshot) -> Option<usize> {
    snapshot.root().children.loaded_len()
}

/// Known nodes per level, root level first
pub fn count_by_depth(snapshot: &Snapshot) -> Vec<usize> {
    let mut levels: Vec<usize> = Vec::new();
    for (_, depth) in walk(snapshot, usize::MAX) {
        if levels.len() <= depth {
            levels.resize(depth + 1, 0);
        }
        levels[depth] += 1;
    }
    levels
}

/// Nodes whose referrals have never been fetched (the unexplored frontier)
pub fn pending_count(snapshot: &Snapshot) -> usize {
    walk(snapshot, usize::MAX)
        .filter(|(node, _)| matches!(node.children, Children::NotFetched))
        .count()
}

/// Depth of the deepest known node
pub fn max_known_depth(snapshot: &Snapshot) -> usize {
    walk(snapshot, usize::MAX)
        .map(|(_, depth)| depth)
        .max()
        .unwrap_or(0)
}
