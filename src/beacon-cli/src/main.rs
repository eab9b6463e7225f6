//! Beacon CLI: emits beacon events from the command line, for exercising a
//! collection endpoint without a browser.

use std::path::PathBuf;
use std::sync::Arc;

use beacon_core::types::page_view_payload;
use beacon_core::{BeaconConfig, EventName};
use beacon_web_sdk::{Beacon, FileStore, HttpFallback, Transport};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "beacon-cli")]
#[command(about = "Emit search beacon events to a collection endpoint")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables take precedence)
    #[arg(long, env = "SEARCH_BEACON_CONFIG")]
    config: Option<PathBuf>,

    /// Collection endpoint (overrides config)
    #[arg(long, env = "SEARCH_BEACON__ENDPOINT")]
    endpoint: Option<String>,

    /// File holding the persisted device identity
    #[arg(long, default_value = ".beacon-state.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the device identity, creating it if needed
    DeviceId,
    /// Send a page_view event
    PageView {
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Send a search event, as the page-level manual trigger does
    Search {
        query: String,
        #[arg(long, default_value = "/")]
        page: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon_cli=info,beacon_web_sdk=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => BeaconConfig::load_from(path),
        None => BeaconConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        BeaconConfig::default()
    });
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    config.validate()?;

    info!(
        endpoint = %config.endpoint,
        state_file = %cli.state_file.display(),
        "Configuration loaded"
    );

    let fallback = Arc::new(HttpFallback::new()?);
    let transport = Transport::from_config(&config, None, fallback.clone());
    let store = Arc::new(FileStore::new(cli.state_file));
    let beacon = Beacon::from_config(&config, store, Arc::new(transport));

    match cli.command {
        Command::DeviceId => {
            println!("{}", beacon.device_id());
        }
        Command::PageView { path, title } => {
            beacon.send(EventName::PageView, Some(page_view_payload(path, title)));
        }
        Command::Search { query, page } => {
            beacon.track_search(&serde_json::Value::String(query), &page);
        }
    }

    fallback.flush().await;
    info!("Done");
    Ok(())
}
