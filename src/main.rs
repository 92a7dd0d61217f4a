//! genealogy CLI - explore a referral tree from the command line
//!
//! Loads a viewer's node, expands parts of the tree on demand and prints
//! the visible rows and counters as JSON, so other tools can wrap it.

use clap::{Parser, Subcommand};
use referral_tree::{
    graph, Address, ApiSource, Config, FixtureSource, Genealogy, MockSource, ReferralSource,
    RootProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "genealogy")]
#[command(about = "Explore a lazily fetched referral tree")]
#[command(version)]
struct Cli {
    /// Where referrals come from
    #[arg(short, long, default_value = "fixture")]
    source: SourceKind,

    /// Fixture document (for --source fixture)
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Indexer base URL (for --source http)
    #[arg(long)]
    api_url: Option<String>,

    /// Deepest level that is rendered
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Log level for stderr output (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum SourceKind {
    Fixture,
    Mock,
    Http,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the visible part of a viewer's tree
    Tree {
        /// The viewer's address
        viewer: String,
        /// Toggle these addresses, in order
        #[arg(short, long)]
        expand: Vec<String>,
        /// Expand everything down to this depth first
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Show counters for a viewer's tree
    Count {
        /// The viewer's address
        viewer: String,
        /// Expand everything down to this depth first
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Fetch the direct referrals of one address
    Children {
        /// The address
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("referral_tree={0},genealogy={0}", cli.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    let (provider, source) = build_source(cli.source, &config)?;

    match cli.command {
        Commands::Tree {
            ref viewer,
            ref expand,
            depth,
        } => {
            let view = Genealogy::open(viewer.as_str(), provider.as_ref(), source, config).await;
            let explorer = match view.ready() {
                Ok(explorer) => explorer,
                Err(e) => fail(&cli.format, &e.to_string()),
            };

            if let Some(depth) = depth {
                view.expand_to_depth(depth).await?;
            }

            let mut toggles = Vec::new();
            for address in expand {
                let address = Address::new(address.as_str());
                match explorer.toggle(&address).await {
                    Ok(outcome) => toggles.push(serde_json::json!({
                        "address": address,
                        "result": outcome
                    })),
                    Err(e) => toggles.push(serde_json::json!({
                        "address": address,
                        "error": e.to_string()
                    })),
                }
            }

            let snapshot = explorer.snapshot();
            output(
                &cli.format,
                &serde_json::json!({
                    "viewer": view.viewer(),
                    "toggles": toggles,
                    "rows": explorer.visible_rows(),
                    "count_all": graph::count_all(&snapshot),
                    "direct_referrals": graph::direct_referral_count(&snapshot),
                    "fingerprint": snapshot.fingerprint()?.to_hex()
                }),
            );
        }

        Commands::Count { ref viewer, depth } => {
            let view = Genealogy::open(viewer.as_str(), provider.as_ref(), source, config).await;
            let explorer = match view.ready() {
                Ok(explorer) => explorer,
                Err(e) => fail(&cli.format, &e.to_string()),
            };

            let report = match depth {
                Some(depth) => Some(view.expand_to_depth(depth).await?),
                None => None,
            };

            let snapshot = explorer.snapshot();
            output(
                &cli.format,
                &serde_json::json!({
                    "viewer": view.viewer(),
                    "count_all": graph::count_all(&snapshot),
                    "count_is_lower_bound": true,
                    "direct_referrals": graph::direct_referral_count(&snapshot),
                    "by_depth": graph::count_by_depth(&snapshot),
                    "pending": graph::pending_count(&snapshot),
                    "expansion": report
                }),
            );
        }

        Commands::Children { ref address } => {
            let address = Address::new(address.as_str());
            match source.fetch_children(&address).await {
                Ok(children) => output(
                    &cli.format,
                    &serde_json::json!({
                        "address": address,
                        "count": children.len(),
                        "referrals": children
                    }),
                ),
                Err(e) => fail(&cli.format, &e.to_string()),
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(path) = &cli.fixture {
        config.fixture = Some(path.clone());
    }
    Ok(config)
}

fn build_source(
    kind: SourceKind,
    config: &Config,
) -> anyhow::Result<(Arc<dyn RootProvider>, Arc<dyn ReferralSource>)> {
    match kind {
        SourceKind::Fixture => {
            let path = config
                .fixture
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--fixture is required for the fixture source"))?;
            let fixture = Arc::new(FixtureSource::load(path)?);
            let provider: Arc<dyn RootProvider> = fixture.clone();
            let source: Arc<dyn ReferralSource> = fixture;
            Ok((provider, source))
        }
        SourceKind::Mock => {
            let mock = Arc::new(MockSource::default());
            let provider: Arc<dyn RootProvider> = mock.clone();
            let source: Arc<dyn ReferralSource> = mock;
            Ok((provider, source))
        }
        SourceKind::Http => {
            let api = Arc::new(ApiSource::new(config)?);
            let provider: Arc<dyn RootProvider> = api.clone();
            let source: Arc<dyn ReferralSource> = api;
            Ok((provider, source))
        }
    }
}

fn fail(format: &OutputFormat, message: &str) -> ! {
    output(
        format,
        &serde_json::json!({
            "status": "error",
            "message": message
        }),
    );
    std::process::exit(1);
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}
