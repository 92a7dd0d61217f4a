//! # referral_tree
//!
//! A lazily fetched, immutable referral (genealogy) tree.
//!
//! Participants in a multi-level referral structure are explored on demand:
//! a node's direct referrals are fetched from an external source the first
//! time it is expanded and merged into an immutable snapshot that shares
//! every untouched subtree with its predecessor.
//!
//! ## Core Concepts
//!
//! - **Nodes**: participants keyed by address, with referrals that are
//!   unknown, known-empty or loaded
//! - **Snapshots**: immutable trees; merges copy only the root-to-target path
//! - **Explorer**: per-node expand/collapse state and the fetch-on-expand
//!   protocol
//! - **Sources**: pluggable providers of referrals and of the viewer's node
//!
//! ## Example
//!
//! ```ignore
//! use referral_tree::{Config, FixtureSource, Genealogy};
//! use std::sync::Arc;
//!
//! let source = Arc::new(FixtureSource::load("tree.json")?);
//! let view = Genealogy::open("0xviewer", source.as_ref(), source.clone(), Config::default()).await;
//! let explorer = view.ready()?;
//! explorer.node("0xreferral").toggle().await?;
//! ```

pub mod controller;
pub mod graph;
pub mod model;
pub mod source;
pub mod tree;

mod config;
mod error;
mod session;

pub use config::{Config, DEFAULT_API_URL, DEFAULT_MAX_DEPTH};
pub use controller::{
    ExpansionState, Explorer, NodeController, NodeState, ToggleOutcome, VisibleRow,
};
pub use error::{Error, Result};
pub use graph::{count_all, direct_referral_count};
pub use model::{Address, Children, Fingerprint, Node, NodeId};
pub use session::{ExpandReport, Genealogy, ViewStatus};
pub use source::{ApiSource, FixtureSource, MockSource, ReferralSource, RootProvider};
pub use tree::{Snapshot, TreeStore};
