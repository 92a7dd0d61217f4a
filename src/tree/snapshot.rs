//! Immutable tree snapshots and the path-copy merge

use crate::model::{Address, Children, Fingerprint, Node};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An immutable view of the referral tree at a point in time
///
/// Cloning is cheap: snapshots share their nodes through `Arc`. A merge
/// produces a new snapshot that copies only the nodes on the path from the
/// root to the merge target; every other subtree is shared with the
/// snapshot it was derived from, which stays valid for anyone holding it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    root: Arc<Node>,
}

impl Snapshot {
    /// Create a snapshot from a root node, rejecting duplicate addresses
    pub fn new(root: Node) -> Result<Self> {
        let mut seen = HashSet::new();
        collect_unique(&root, &mut seen)?;
        Ok(Snapshot {
            root: Arc::new(root),
        })
    }

    /// The root node (the viewer)
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Find a node by address
    pub fn find(&self, address: &Address) -> Option<&Arc<Node>> {
        self.locate(address).map(|path| self.node_at(&path))
    }

    /// Depth of a node (root = 0)
    pub fn depth_of(&self, address: &Address) -> Option<usize> {
        self.locate(address).map(|path| path.len())
    }

    /// Find a node together with its depth
    pub fn find_with_depth(&self, address: &Address) -> Option<(&Arc<Node>, usize)> {
        self.locate(address)
            .map(|path| (self.node_at(&path), path.len()))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.locate(address).is_some()
    }

    /// Every known address, in depth-first pre-order
    pub fn addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            out.push(node.address.clone());
            if let Some(children) = node.children.loaded() {
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Digest of the whole snapshot
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Fingerprint::of_node(&self.root)
    }

    /// Whether both snapshots hold the very same allocation for the node at
    /// `address` (i.e. the subtree was shared, not copied)
    pub fn shares_subtree(&self, other: &Snapshot, address: &Address) -> bool {
        match (self.find(address), other.find(address)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether both snapshots are the same allocation
    pub fn same_root(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Resolve the children of `target`, returning a new snapshot
    ///
    /// The node's children become `Loaded(children)`, or `Empty` when the
    /// fetch returned nothing. A missing target is a stale result, not an
    /// error: the snapshot comes back unchanged. Incoming children without
    /// fetched referrals inherit the known referrals of the current child
    /// with the same address, so a repeated merge never forgets data.
    ///
    /// Fails with [`Error::DuplicateAddress`] if the result would hold an
    /// address twice; `self` is untouched either way.
    pub fn apply_children(&self, target: &Address, children: Vec<Node>) -> Result<Snapshot> {
        let Some(path) = self.locate(target) else {
            debug!(address = %target, "merge target not in snapshot, ignoring");
            return Ok(self.clone());
        };

        let current = self.node_at(&path);
        let resolved = reconcile(&current.children, children);
        self.check_unique(target, &resolved)?;

        Ok(Snapshot {
            root: rebuild(&self.root, &path, resolved),
        })
    }

    // === Internal helpers ===

    /// Child-index path from the root to `target`
    fn locate(&self, target: &Address) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        if locate_in(&self.root, target, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn node_at(&self, path: &[usize]) -> &Arc<Node> {
        let mut node = &self.root;
        for &index in path {
            match &node.children {
                Children::Loaded(children) => node = &children[index],
                _ => unreachable!("paths only run through loaded children"),
            }
        }
        node
    }

    /// Everything outside the target's current subtree plus the incoming
    /// subtrees must be pairwise distinct
    fn check_unique(&self, target: &Address, incoming: &Children) -> Result<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            seen.insert(node.address.clone());
            if &node.address == target {
                continue;
            }
            if let Some(children) = node.children.loaded() {
                stack.extend(children.iter());
            }
        }

        if let Some(children) = incoming.loaded() {
            for child in children {
                collect_unique(child, &mut seen)?;
            }
        }
        Ok(())
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.same_root(other) || self.root == other.root
    }
}

fn locate_in(node: &Arc<Node>, target: &Address, path: &mut Vec<usize>) -> bool {
    if &node.address == target {
        return true;
    }
    if let Some(children) = node.children.loaded() {
        for (index, child) in children.iter().enumerate() {
            path.push(index);
            if locate_in(child, target, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

fn collect_unique(node: &Node, seen: &mut HashSet<Address>) -> Result<()> {
    if !seen.insert(node.address.clone()) {
        return Err(Error::DuplicateAddress(node.address.clone()));
    }
    if let Some(children) = node.children.loaded() {
        for child in children {
            collect_unique(child, seen)?;
        }
    }
    Ok(())
}

/// Merge fetched children with what the snapshot already knows about them
fn reconcile(existing: &Children, incoming: Vec<Node>) -> Children {
    if incoming.is_empty() {
        return Children::Empty;
    }

    let previous: HashMap<&Address, &Arc<Node>> = existing
        .loaded()
        .map(|nodes| nodes.iter().map(|n| (&n.address, n)).collect())
        .unwrap_or_default();

    let nodes = incoming
        .into_iter()
        .map(|mut node| match previous.get(&node.address) {
            Some(prev) => {
                if !node.children.is_known() && prev.children.is_known() {
                    node.children = prev.children.clone();
                }
                if ***prev == node {
                    Arc::clone(prev)
                } else {
                    Arc::new(node)
                }
            }
            None => Arc::new(node),
        })
        .collect();

    Children::Loaded(nodes)
}

/// Shallow-copy the nodes along `path`, installing `children` at its end
fn rebuild(node: &Arc<Node>, path: &[usize], children: Children) -> Arc<Node> {
    match path.split_first() {
        None => Arc::new(Node {
            id: node.id.clone(),
            address: node.address.clone(),
            children,
            referral_count: node.referral_count,
            attrs: node.attrs.clone(),
        }),
        Some((&index, rest)) => {
            let mut copy = (**node).clone();
            if let Children::Loaded(ref mut siblings) = copy.children {
                let replaced = rebuild(&siblings[index], rest, children);
                siblings[index] = replaced;
            }
            Arc::new(copy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    /// root -> [x -> [x1, x2], y]
    fn sample() -> Snapshot {
        Snapshot::new(Node::new(0, "root").with_children(vec![
            Node::new(1, "x").with_children(vec![Node::new(3, "x1"), Node::new(4, "x2")]),
            Node::new(2, "y"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let root = Node::new(0, "root").with_children(vec![Node::new(1, "a"), Node::new(2, "a")]);
        assert!(matches!(
            Snapshot::new(root),
            Err(Error::DuplicateAddress(a)) if a == addr("a")
        ));
    }

    #[test]
    fn test_find_and_depth() {
        let snap = sample();
        assert_eq!(snap.depth_of(&addr("root")), Some(0));
        assert_eq!(snap.depth_of(&addr("x2")), Some(2));
        assert_eq!(snap.find(&addr("y")).unwrap().id, NodeId::Numeric(2));
        assert!(snap.find(&addr("nope")).is_none());
        assert_eq!(
            snap.addresses(),
            vec![addr("root"), addr("x"), addr("x1"), addr("x2"), addr("y")]
        );
    }

    #[test]
    fn test_apply_sets_loaded_and_empty() {
        let snap = sample();

        let loaded = snap
            .apply_children(&addr("y"), vec![Node::new(5, "y1")])
            .unwrap();
        assert_eq!(
            loaded.find(&addr("y")).unwrap().children.loaded_len(),
            Some(1)
        );

        let empty = snap.apply_children(&addr("x1"), Vec::new()).unwrap();
        assert_eq!(empty.find(&addr("x1")).unwrap().children, Children::Empty);

        // the source snapshot is untouched
        assert_eq!(snap.find(&addr("y")).unwrap().children, Children::NotFetched);
    }

    #[test]
    fn test_apply_missing_target_is_noop() {
        let snap = sample();
        let next = snap
            .apply_children(&addr("unknown-address"), vec![Node::new(9, "z")])
            .unwrap();
        assert!(next.same_root(&snap));
        assert_eq!(next, snap);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let snap = sample();
        let children = vec![Node::new(5, "y1"), Node::new(6, "y2")];

        let once = snap.apply_children(&addr("y"), children.clone()).unwrap();
        let twice = once.apply_children(&addr("y"), children).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.fingerprint().unwrap(), twice.fingerprint().unwrap());
    }

    #[test]
    fn test_apply_copies_only_the_path() {
        let snap = sample();
        let next = snap
            .apply_children(&addr("x1"), vec![Node::new(7, "x1a")])
            .unwrap();

        // off-path subtrees are shared
        assert!(next.shares_subtree(&snap, &addr("y")));
        assert!(next.shares_subtree(&snap, &addr("x2")));
        // the path itself is copied
        assert!(!next.shares_subtree(&snap, &addr("root")));
        assert!(!next.shares_subtree(&snap, &addr("x")));
        assert!(!next.shares_subtree(&snap, &addr("x1")));
    }

    #[test]
    fn test_apply_rejects_address_already_in_tree() {
        let snap = sample();
        let result = snap.apply_children(&addr("y"), vec![Node::new(8, "x1")]);
        assert!(matches!(result, Err(Error::DuplicateAddress(a)) if a == addr("x1")));

        let result = snap.apply_children(&addr("y"), vec![Node::new(8, "y")]);
        assert!(matches!(result, Err(Error::DuplicateAddress(_))));

        let result =
            snap.apply_children(&addr("y"), vec![Node::new(8, "q"), Node::new(9, "q")]);
        assert!(matches!(result, Err(Error::DuplicateAddress(_))));
    }

    #[test]
    fn test_reapply_keeps_known_grandchildren() {
        let snap = sample();
        // x is re-fetched with its children unknown; x1 keeps what we knew
        let x1_known = snap
            .apply_children(&addr("x1"), vec![Node::new(7, "x1a")])
            .unwrap();
        let refetched = x1_known
            .apply_children(&addr("x"), vec![Node::new(3, "x1"), Node::new(4, "x2")])
            .unwrap();

        assert_eq!(
            refetched.find(&addr("x1")).unwrap().children.loaded_len(),
            Some(1)
        );
        assert!(refetched.shares_subtree(&x1_known, &addr("x1")));
        assert_eq!(refetched.depth_of(&addr("x1a")), Some(3));
    }

    #[test]
    fn test_disjoint_merges_commute() {
        let snap = sample();
        let a = vec![Node::new(10, "x1a")];
        let b = vec![Node::new(11, "y1")];

        let ab = snap
            .apply_children(&addr("x1"), a.clone())
            .unwrap()
            .apply_children(&addr("y"), b.clone())
            .unwrap();
        let ba = snap
            .apply_children(&addr("y"), b)
            .unwrap()
            .apply_children(&addr("x1"), a)
            .unwrap();

        assert_eq!(ab, ba);
    }
}
