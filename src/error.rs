//! Error types for referral_tree

use crate::model::Address;
use thiserror::Error;

/// Result type alias for referral_tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or exploring a referral tree
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate address in tree: {0}")]
    DuplicateAddress(Address),

    #[error("Failed to fetch referrals of {address}: {message}")]
    Fetch { address: Address, message: String },

    #[error("Root unavailable: {0}")]
    RootUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Build a fetch failure for the given address
    pub fn fetch(address: &Address, message: impl Into<String>) -> Self {
        Error::Fetch {
            address: address.clone(),
            message: message.into(),
        }
    }
}
