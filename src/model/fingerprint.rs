//! Merkle-style digest of a (partial) referral tree using BLAKE3

use super::{Children, Node};
use serde::{Deserialize, Serialize};
use std::fmt;

const TAG_NOT_FETCHED: u8 = 0;
const TAG_EMPTY: u8 = 1;
const TAG_LOADED: u8 = 2;

/// A 32-byte BLAKE3 digest identifying a tree state
///
/// Each node's digest covers its identity, its attributes, its children
/// state and its children's digests in order, so two trees compare equal
/// exactly when their fingerprints do.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digest a node and everything reachable through its loaded children
    pub fn of_node(node: &Node) -> crate::Result<Self> {
        let header = bincode::serialize(&(
            &node.id,
            &node.address,
            &node.referral_count,
            serde_json::to_string(&node.attrs)?,
        ))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&header);
        match &node.children {
            Children::NotFetched => {
                hasher.update(&[TAG_NOT_FETCHED]);
            }
            Children::Empty => {
                hasher.update(&[TAG_EMPTY]);
            }
            Children::Loaded(children) => {
                hasher.update(&[TAG_LOADED]);
                hasher.update(&(children.len() as u64).to_le_bytes());
                for child in children {
                    hasher.update(Fingerprint::of_node(child)?.as_bytes());
                }
            }
        }
        Ok(Fingerprint(*hasher.finalize().as_bytes()))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short prefix for display
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let node = Node::new(1, "0xa").with_children(vec![Node::new(2, "0xb")]);
        assert_eq!(
            Fingerprint::of_node(&node).unwrap(),
            Fingerprint::of_node(&node.clone()).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_separates_unknown_from_empty() {
        let unknown = Node::new(1, "0xa");
        let empty = Node::new(1, "0xa").with_children(Vec::new());
        assert_ne!(
            Fingerprint::of_node(&unknown).unwrap(),
            Fingerprint::of_node(&empty).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let ab = Node::new(0, "r").with_children(vec![Node::new(1, "a"), Node::new(2, "b")]);
        let ba = Node::new(0, "r").with_children(vec![Node::new(2, "b"), Node::new(1, "a")]);
        assert_ne!(
            Fingerprint::of_node(&ab).unwrap(),
            Fingerprint::of_node(&ba).unwrap()
        );
        assert_eq!(Fingerprint::of_node(&ab).unwrap().short().len(), 7);
    }
}
