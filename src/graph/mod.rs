//! Read-only traversal and aggregation over snapshots

mod aggregate;
mod traversal;

pub use aggregate::{
    count_all, count_by_depth, direct_referral_count, max_known_depth, pending_count,
};
pub use traversal::{nodes_at_depth, walk, Walk};
