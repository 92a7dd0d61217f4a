//! Node type - one participant in the referral hierarchy

use super::{Address, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fetch state of a node's direct referrals
///
/// `NotFetched` and `Empty` are deliberately distinct: the first means the
/// source has never been asked, the second that it answered with no
/// referrals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "nodes", rename_all = "snake_case")]
pub enum Children {
    /// Never fetched
    #[default]
    NotFetched,
    /// Fetched, the node is a leaf
    Empty,
    /// Fetched, in source order
    Loaded(Vec<Arc<Node>>),
}

impl Children {
    /// Build the known state for a completed fetch
    pub fn from_fetched(nodes: Vec<Node>) -> Self {
        if nodes.is_empty() {
            Children::Empty
        } else {
            Children::Loaded(nodes.into_iter().map(Arc::new).collect())
        }
    }

    /// Whether the children have been fetched (empty or not)
    pub fn is_known(&self) -> bool {
        !matches!(self, Children::NotFetched)
    }

    /// The loaded children, if any
    pub fn loaded(&self) -> Option<&[Arc<Node>]> {
        match self {
            Children::Loaded(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Number of loaded children; `None` unless the state is `Loaded`
    pub fn loaded_len(&self) -> Option<usize> {
        self.loaded().map(<[_]>::len)
    }
}

/// A participant in the referral tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Opaque identifier reported by the source
    pub id: NodeId,

    /// Canonical identity, unique across a snapshot
    pub address: Address,

    /// Direct referrals
    #[serde(default)]
    pub children: Children,

    /// Direct referral count as reported by the source, if it knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_count: Option<u64>,

    /// Presentational payload, carried through merges untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

impl Node {
    /// Create a node whose referrals have not been fetched yet
    pub fn new(id: impl Into<NodeId>, address: impl Into<Address>) -> Self {
        Node {
            id: id.into(),
            address: address.into(),
            children: Children::NotFetched,
            referral_count: None,
            attrs: BTreeMap::new(),
        }
    }

    /// Set already-known children
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Children::from_fetched(children);
        self
    }

    /// Set the source's referral count hint
    pub fn with_referral_count(mut self, count: u64) -> Self {
        self.referral_count = Some(count);
        self
    }

    /// Add a presentational attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Whether the source has told us this node has no referrals without
    /// us fetching them
    pub fn hinted_leaf(&self) -> bool {
        !self.children.is_known() && self.referral_count == Some(0)
    }

    /// This node plus every node reachable through loaded children
    pub fn count_known(&self) -> usize {
        1 + self
            .children
            .loaded()
            .map(|nodes| nodes.iter().map(|n| n.count_known()).sum::<usize>())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fetched_distinguishes_empty() {
        assert_eq!(Children::from_fetched(Vec::new()), Children::Empty);
        assert!(Children::Empty.is_known());
        assert!(!Children::NotFetched.is_known());
        assert_eq!(Children::Empty.loaded_len(), None);

        let loaded = Children::from_fetched(vec![Node::new(1, "0xa")]);
        assert_eq!(loaded.loaded_len(), Some(1));
    }

    #[test]
    fn test_count_known_ignores_unfetched_descendants() {
        let node = Node::new(0, "root").with_children(vec![
            Node::new(1, "a").with_children(vec![Node::new(3, "c")]),
            Node::new(2, "b"),
        ]);
        assert_eq!(node.count_known(), 4);
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"{
            "id": 7,
            "address": "0x07",
            "children": { "state": "loaded", "nodes": [ { "id": "x", "address": "0x08" } ] },
            "referral_count": 1
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();

        assert_eq!(node.id, NodeId::Numeric(7));
        assert_eq!(node.referral_count, Some(1));
        let children = node.children.loaded().unwrap();
        assert_eq!(children[0].address, Address::new("0x08"));
        assert_eq!(children[0].children, Children::NotFetched);
    }

    #[test]
    fn test_hinted_leaf() {
        assert!(Node::new(1, "a").with_referral_count(0).hinted_leaf());
        assert!(!Node::new(1, "a").with_referral_count(3).hinted_leaf());
        assert!(!Node::new(1, "a").hinted_leaf());
    }
}
