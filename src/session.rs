//! High-level view API
//!
//! A [`Genealogy`] is one viewer's tree: it loads the viewer's node from a
//! [`RootProvider`] and, once that succeeds, hands out an [`Explorer`] for
//! on-demand expansion.

use crate::config::Config;
use crate::controller::{affordance, Explorer, NodeState, ToggleOutcome};
use crate::graph;
use crate::model::Address;
use crate::source::{ReferralSource, RootProvider};
use crate::tree::TreeStore;
use crate::{Error, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Whole-view status
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ViewStatus {
    Loading,
    Ready,
    /// The root could not be loaded; nothing is rendered
    Failed(String),
}

/// Summary of an [`Genealogy::expand_to_depth`] run
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExpandReport {
    /// Nodes toggled open
    pub expanded: usize,
    /// Of those, how many needed a fetch
    pub fetched: usize,
    /// Nodes whose fetch failed; they stay collapsed
    pub failed: Vec<Address>,
}

/// One viewer's genealogy tree
pub struct Genealogy {
    viewer: Address,
    config: Config,
    status: ViewStatus,
    explorer: Option<Explorer>,
}

impl Genealogy {
    /// A view that has not loaded its root yet
    pub fn new(viewer: impl Into<Address>, config: Config) -> Self {
        Genealogy {
            viewer: viewer.into(),
            config,
            status: ViewStatus::Loading,
            explorer: None,
        }
    }

    /// Create a view and load its root
    pub async fn open(
        viewer: impl Into<Address>,
        provider: &dyn RootProvider,
        source: Arc<dyn ReferralSource>,
        config: Config,
    ) -> Self {
        let mut view = Self::new(viewer, config);
        view.load(provider, source).await;
        view
    }

    /// Load (or reload) the root
    ///
    /// A root whose own referrals are unknown gets them fetched straight
    /// away, since the root is shown expanded. If that fetch fails the root
    /// starts collapsed instead, so toggling it or expanding the view
    /// retries the fetch.
    pub async fn load(&mut self, provider: &dyn RootProvider, source: Arc<dyn ReferralSource>) {
        self.status = ViewStatus::Loading;
        self.explorer = None;

        let store = match provider.fetch_root(&self.viewer).await {
            Ok(root) => TreeStore::from_root(root),
            Err(e) => Err(e),
        };
        let store = match store {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(viewer = %self.viewer, error = %e, "failed to load root");
                self.status = ViewStatus::Failed(e.to_string());
                return;
            }
        };

        let snapshot = store.snapshot();
        let root = snapshot.root();
        if !root.children.is_known() && !root.hinted_leaf() {
            match source.fetch_children(&root.address).await {
                Ok(children) => {
                    if let Err(e) = store.apply_children(&root.address, children) {
                        warn!(viewer = %self.viewer, error = %e, "root referrals rejected");
                    }
                }
                Err(e) => warn!(viewer = %self.viewer, error = %e, "root referrals unavailable"),
            }
        }

        let root_pending = {
            let root = store.snapshot();
            let root = root.root();
            !root.children.is_known() && !root.hinted_leaf()
        };

        info!(viewer = %self.viewer, known = store.count_all(), "view ready");
        let explorer = Explorer::new(store, source, self.config.max_depth);
        self.explorer = Some(if root_pending {
            explorer.with_root_collapsed()
        } else {
            explorer
        });
        self.status = ViewStatus::Ready;
    }

    pub fn viewer(&self) -> &Address {
        &self.viewer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn explorer(&self) -> Option<&Explorer> {
        self.explorer.as_ref()
    }

    /// The explorer, or the reason there is none
    pub fn ready(&self) -> Result<&Explorer> {
        match (&self.status, &self.explorer) {
            (ViewStatus::Ready, Some(explorer)) => Ok(explorer),
            (ViewStatus::Failed(message), _) => Err(Error::RootUnavailable(message.clone())),
            _ => Err(Error::RootUnavailable("root not loaded yet".to_string())),
        }
    }

    /// Expand every expandable node, level by level, down to `depth`
    ///
    /// Fetches for one level run concurrently. Failed nodes are reported
    /// and left collapsed; the rest of the level carries on.
    pub async fn expand_to_depth(&self, depth: usize) -> Result<ExpandReport> {
        let explorer = self.ready()?;
        let depth = depth.min(explorer.max_depth());
        let mut report = ExpandReport::default();

        for level in 0..depth {
            let snapshot = explorer.snapshot();
            let targets: Vec<Address> = graph::nodes_at_depth(&snapshot, level)
                .into_iter()
                .filter(|node| affordance(node, level, explorer.max_depth()).is_ok())
                .filter(|node| explorer.state(&node.address) == NodeState::Collapsed)
                .map(|node| node.address.clone())
                .collect();

            let outcomes = join_all(targets.iter().map(|address| explorer.toggle(address))).await;
            for (address, outcome) in targets.into_iter().zip(outcomes) {
                match outcome {
                    Ok(ToggleOutcome::Expanded { fetched }) => {
                        report.expanded += 1;
                        if fetched {
                            report.fetched += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => report.failed.push(address),
                }
            }
        }

        info!(
            viewer = %self.viewer,
            depth,
            expanded = report.expanded,
            fetched = report.fetched,
            failed = report.failed.len(),
            "expanded view"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::source::{FixtureSource, MockSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_failed_root_is_whole_view_error() {
        let fixture = FixtureSource::default();
        let view = Genealogy::open(
            "0xviewer",
            &fixture,
            Arc::new(fixture.clone()),
            Config::default(),
        )
        .await;

        assert!(matches!(view.status(), ViewStatus::Failed(_)));
        assert!(view.explorer().is_none());
        assert!(matches!(view.ready(), Err(Error::RootUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unknown_root_referrals_are_fetched_on_load() {
        let fixture = FixtureSource::default()
            .with_root(Node::new(0, "0xviewer"))
            .with_referrals("0xviewer", vec![Node::new(1, "0xa"), Node::new(2, "0xb")]);
        let view = Genealogy::open(
            "0xviewer",
            &fixture,
            Arc::new(fixture.clone()),
            Config::default(),
        )
        .await;

        let explorer = view.ready().unwrap();
        assert_eq!(explorer.store().direct_referral_count(), Some(2));
        assert_eq!(explorer.visible_rows().len(), 3);
    }

    /// Fails the first `failures` fetches, then answers from the fixture
    struct FlakySource {
        inner: FixtureSource,
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReferralSource for FlakySource {
        async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(Error::fetch(address, "temporarily unavailable"));
            }
            self.inner.fetch_children(address).await
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky(failures: usize) -> (FixtureSource, Arc<FlakySource>) {
        let fixture = FixtureSource::default()
            .with_root(Node::new(0, "0xviewer"))
            .with_referrals("0xviewer", vec![Node::new(1, "0xa"), Node::new(2, "0xb")]);
        let source = Arc::new(FlakySource {
            inner: fixture.clone(),
            failures,
            calls: AtomicUsize::new(0),
        });
        (fixture, source)
    }

    #[tokio::test]
    async fn test_failed_root_referrals_are_retried_by_expand() {
        let (fixture, source) = flaky(1);
        let view = Genealogy::open("0xviewer", &fixture, source.clone(), Config::default()).await;

        let explorer = view.ready().unwrap();
        assert_eq!(explorer.state(&Address::new("0xviewer")), NodeState::Collapsed);
        assert_eq!(explorer.store().count_all(), 1);

        let report = view.expand_to_depth(1).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.fetched, 1);
        assert!(report.failed.is_empty());
        assert_eq!(explorer.state(&Address::new("0xviewer")), NodeState::Expanded);
        assert_eq!(explorer.store().direct_referral_count(), Some(2));
        assert_eq!(explorer.visible_rows().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_root_referrals_are_retried_by_toggle() {
        let (fixture, source) = flaky(1);
        let view = Genealogy::open("0xviewer", &fixture, source.clone(), Config::default()).await;

        let outcome = view
            .ready()
            .unwrap()
            .node("0xviewer")
            .toggle()
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Expanded { fetched: true });
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_root_referrals_still_failing_are_reported() {
        let (fixture, source) = flaky(usize::MAX);
        let view = Genealogy::open("0xviewer", &fixture, source, Config::default()).await;

        let report = view.expand_to_depth(3).await.unwrap();
        assert_eq!(report.failed, vec![Address::new("0xviewer")]);
        assert_eq!(
            view.ready().unwrap().state(&Address::new("0xviewer")),
            NodeState::Collapsed
        );
    }

    #[tokio::test]
    async fn test_expand_to_depth_stops_at_depth() {
        let source = Arc::new(MockSource::new(3));
        let view = Genealogy::open("0xviewer", source.as_ref(), source.clone(), Config::default()).await;

        let report = view.expand_to_depth(3).await.unwrap();
        let explorer = view.ready().unwrap();
        let snapshot = explorer.snapshot();

        assert!(report.failed.is_empty());
        assert!(graph::max_known_depth(&snapshot) <= 3);
        assert!(explorer
            .visible_rows()
            .iter()
            .all(|row| row.depth <= 3));
    }

    #[tokio::test]
    async fn test_expand_to_depth_capped_by_max_depth() {
        let source = Arc::new(MockSource::new(2));
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let view = Genealogy::open("0xviewer", source.as_ref(), source.clone(), config).await;

        view.expand_to_depth(50).await.unwrap();
        let snapshot = view.ready().unwrap().snapshot();
        assert!(graph::max_known_depth(&snapshot) <= 2);
    }
}
