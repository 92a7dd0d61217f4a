//! Pluggable referral data sources

mod api;
mod fixture;
mod mock;
mod traits;

pub use api::{ApiSource, API_KEY_ENV};
pub use fixture::FixtureSource;
pub use mock::MockSource;
pub use traits::{ReferralSource, RootProvider};
