//! Persistent referral tree with structural sharing
//!
//! - A [`Snapshot`] is immutable; merging fetched children copies only the
//!   path from the root to the merged node
//! - Unchanged subtrees are shared across snapshots
//! - The [`TreeStore`] owns the current snapshot and swaps it atomically

mod snapshot;
mod store;

pub use snapshot::Snapshot;
pub use store::TreeStore;
