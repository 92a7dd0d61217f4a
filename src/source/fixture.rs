//! Source backed by a static JSON document
//!
//! ```json
//! {
//!   "root": { "id": 1, "address": "0xroot" },
//!   "referrals": { "0xroot": [ { "id": 2, "address": "0xa" } ] },
//!   "failing": [ "0xbroken" ]
//! }
//! ```

use super::{ReferralSource, RootProvider};
use crate::model::{Address, Node};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A referral source answering from an in-memory document
///
/// Addresses with no entry in `referrals` are leaves. Addresses listed in
/// `failing` always fail to fetch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FixtureSource {
    /// The viewer's node
    pub root: Option<Node>,
    /// Direct referrals per address
    #[serde(default)]
    pub referrals: HashMap<Address, Vec<Node>>,
    /// Addresses whose fetches fail
    #[serde(default)]
    pub failing: HashSet<Address>,
}

impl FixtureSource {
    /// Load a fixture document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a fixture document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the viewer's node
    pub fn with_root(mut self, root: Node) -> Self {
        self.root = Some(root);
        self
    }

    /// Register the direct referrals of an address
    pub fn with_referrals(mut self, address: impl Into<Address>, nodes: Vec<Node>) -> Self {
        self.referrals.insert(address.into(), nodes);
        self
    }

    /// Make fetches for an address fail
    pub fn with_failure(mut self, address: impl Into<Address>) -> Self {
        self.failing.insert(address.into());
        self
    }
}

#[async_trait]
impl ReferralSource for FixtureSource {
    async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>> {
        if self.failing.contains(address) {
            return Err(Error::fetch(address, "fixture marks address as failing"));
        }
        Ok(self.referrals.get(address).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

#[async_trait]
impl RootProvider for FixtureSource {
    async fn fetch_root(&self, viewer: &Address) -> Result<Node> {
        match &self.root {
            Some(root) if &root.address == viewer => Ok(root.clone()),
            Some(_) => Err(Error::RootUnavailable(format!(
                "fixture has no account {}",
                viewer
            ))),
            None => Err(Error::RootUnavailable("fixture has no root".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Children;

    const DOC: &str = r#"{
        "root": {
            "id": 1,
            "address": "0xroot",
            "children": { "state": "loaded", "nodes": [ { "id": 2, "address": "0xa" } ] }
        },
        "referrals": { "0xa": [ { "id": 3, "address": "0xa1" } ] },
        "failing": [ "0xbroken" ]
    }"#;

    #[tokio::test]
    async fn test_fixture_root_and_referrals() {
        let fixture = FixtureSource::from_json(DOC).unwrap();

        let root = fixture.fetch_root(&Address::new("0xroot")).await.unwrap();
        assert!(matches!(root.children, Children::Loaded(ref n) if n.len() == 1));

        let children = fixture.fetch_children(&Address::new("0xa")).await.unwrap();
        assert_eq!(children[0].address, Address::new("0xa1"));

        // unknown address is a leaf, not an error
        let leaf = fixture.fetch_children(&Address::new("0xa1")).await.unwrap();
        assert!(leaf.is_empty());
    }

    #[tokio::test]
    async fn test_fixture_failures() {
        let fixture = FixtureSource::from_json(DOC).unwrap();

        let err = fixture
            .fetch_children(&Address::new("0xbroken"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));

        let err = fixture
            .fetch_root(&Address::new("0xsomeone"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RootUnavailable(_)));
    }

    #[test]
    fn test_fixture_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(&path, DOC).unwrap();

        let fixture = FixtureSource::load(&path).unwrap();
        assert_eq!(fixture.failing.len(), 1);
        assert!(fixture.referrals.contains_key(&Address::new("0xa")));
    }
}
