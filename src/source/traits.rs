//! Data source trait definitions

use crate::model::{Address, Node};
use crate::Result;
use async_trait::async_trait;

/// Fetches a participant's direct referrals on demand
///
/// Implementations can use:
/// - A remote indexer over the referral contract
/// - A static JSON document
/// - Mock implementations for testing
///
/// A genuine leaf must come back as an empty vector, never as an error:
/// errors are treated as transient and retried on the next expansion.
#[async_trait]
pub trait ReferralSource: Send + Sync {
    /// Direct referrals of `address`, in display order
    async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// Supplies the viewer's own node, with any direct referrals it already
/// knows about
#[async_trait]
pub trait RootProvider: Send + Sync {
    async fn fetch_root(&self, viewer: &Address) -> Result<Node>;
}
