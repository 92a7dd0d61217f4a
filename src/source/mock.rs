//! Mock source for testing

use super::{ReferralSource, RootProvider};
use crate::model::{Address, Node, NodeId};
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock source that derives referrals deterministically from the address
///
/// Useful for testing without a live indexer. The same address always gets
/// the same referrals, whose addresses are BLAKE3-derived from their parent
/// so they are unique in practice.
pub struct MockSource {
    max_fanout: u8,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock source with at most `max_fanout` referrals per node
    pub fn new(max_fanout: u8) -> Self {
        MockSource {
            max_fanout,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch_children` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn referrals_of(&self, address: &Address) -> Vec<Node> {
        let hash = blake3::hash(address.as_str().as_bytes());
        let fanout = match self.max_fanout {
            0 => 0,
            max => (u16::from(hash.as_bytes()[0]) % (u16::from(max) + 1)) as u8,
        };

        (0..fanout)
            .map(|i| {
                let mut hasher = blake3::Hasher::new();
                hasher.update(address.as_str().as_bytes());
                hasher.update(&[i]);
                let child = hasher.finalize();
                let bytes = child.as_bytes();

                let mut id = [0u8; 8];
                id.copy_from_slice(&bytes[..8]);
                Node::new(
                    NodeId::Numeric(u64::from_le_bytes(id) >> 16),
                    format!("0x{}", hex::encode(&bytes[..20])),
                )
            })
            .collect()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        MockSource::new(3)
    }
}

#[async_trait]
impl ReferralSource for MockSource {
    async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.referrals_of(address))
    }

    fn name(&self) -> &str {
        "mock-source"
    }
}

#[async_trait]
impl RootProvider for MockSource {
    async fn fetch_root(&self, viewer: &Address) -> Result<Node> {
        Ok(Node::new(0, viewer))
    }
}
