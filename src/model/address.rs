//! Identity types: the canonical address and the opaque node identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a participant (e.g. a wallet address)
///
/// Addresses are the join key for merges and for per-node view state. They
/// are compared exactly; any normalisation is the caller's business.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Address(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

impl From<&String> for Address {
    fn from(s: &String) -> Self {
        Address(s.clone())
    }
}

impl From<&Address> for Address {
    fn from(a: &Address) -> Self {
        a.clone()
    }
}

/// Opaque participant identifier as reported by the data source
///
/// Sources report either on-chain sequence numbers or string ids, so both
/// shapes deserialize from plain JSON numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Numeric(n) => write!(f, "{}", n),
            NodeId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for NodeId {
    fn from(n: u64) -> Self {
        NodeId::Numeric(n)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Text(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Text(s)
    }
}
