//! Core data model types for referral_tree

mod address;
mod fingerprint;
mod node;

pub use address::{Address, NodeId};
pub use fingerprint::Fingerprint;
pub use node::{Children, Node};
