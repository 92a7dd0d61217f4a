//! Depth-bounded traversal over the known part of a snapshot

use crate::model::Node;
use crate::tree::Snapshot;
use std::sync::Arc;

/// Depth-first pre-order iterator over known nodes
///
/// Yields `(node, depth)` pairs in display order (children in fetch order)
/// and never descends below `max_depth`.
pub struct Walk<'a> {
    stack: Vec<(&'a Arc<Node>, usize)>,
    max_depth: usize,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a Arc<Node>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        if depth < self.max_depth {
            if let Some(children) = node.children.loaded() {
                self.stack
                    .extend(children.iter().rev().map(|child| (child, depth + 1)));
            }
        }
        Some((node, depth))
    }
}

/// Walk the snapshot from the root, down to `max_depth` inclusive
pub fn walk(snapshot: &Snapshot, max_depth: usize) -> Walk<'_> {
    Walk {
        stack: vec![(snapshot.root(), 0)],
        max_depth,
    }
}

/// All known nodes on one level, in display order
pub fn nodes_at_depth(snapshot: &Snapshot, depth: usize) -> Vec<Arc<Node>> {
    walk(snapshot, depth)
        .filter(|(_, d)| *d == depth)
        .map(|(node, _)| Arc::clone(node))
        .collect()
}
