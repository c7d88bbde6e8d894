//! Claim tracker CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   address / ENS name
//!          │
//!          ▼
//!   ┌─────────────────┐   eth_call (ENS)   ┌────────────────┐
//!   │ AddressResolver │───────────────────▶│ identity chain │
//!   └────────┬────────┘                    └────────────────┘
//!            ▼
//!   ┌─────────────────┐   POST claim       ┌────────────────┐
//!   │ ClaimSubmitter  │───────────────────▶│ delivery queue │
//!   └────────┬────────┘                    └───────▲────────┘
//!            ▼                                     │ GET queue/{uid}
//!   ┌─────────────────┐                    ┌───────┴────────┐   receipts   ┌────────────────┐
//!   │TransactionStore │◀───── save ────────│   Reconciler   │─────────────▶│ delivery chain │
//!   └────────┬────────┘                    └───────┬────────┘              └────────────────┘
//!            ▼                                     ▼
//!      status API                             notifications
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use claim_tracker::blockchain::{AlloyChainReader, ChainReader};
use claim_tracker::claims::{parse_address, rewards_to_claim, Event, RewardCatalog};
use claim_tracker::config::{load_config, ClaimConfig};
use claim_tracker::http::StatusServer;
use claim_tracker::lifecycle::wait_for_shutdown;
use claim_tracker::observability::{logging, metrics};
use claim_tracker::queue::{DeliveryQueueClient, HttpQueueClient};
use claim_tracker::reconcile::{Notifier, Severity};
use claim_tracker::store::TransactionStore;
use claim_tracker::view::{ClaimView, ViewDeps};

#[derive(Parser)]
#[command(name = "claim-tracker")]
#[command(about = "Claim rewards and track their delivery", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an address or ENS name against an event's eligibility list
    Resolve {
        #[arg(long)]
        event: PathBuf,
        input: String,
    },
    /// Submit a claim for an address or ENS name
    Claim {
        #[arg(long)]
        event: PathBuf,
        #[arg(long)]
        delivery: u64,
        input: String,
        /// Keep reconciling until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Reconcile an event's tracked claims until Ctrl-C
    Watch {
        #[arg(long)]
        event: PathBuf,
        /// Only report this address
        #[arg(long)]
        address: Option<String>,
    },
    /// Print tracked transactions
    List {
        #[arg(long)]
        key: Option<String>,
    },
    /// List the reward events that belong to an event
    Rewards {
        #[arg(long)]
        event: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClaimConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "claim-tracker starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = match &config.store.persistence_path {
        Some(path) => TransactionStore::open(path)?,
        None => TransactionStore::default(),
    };

    match cli.command {
        Commands::Resolve { event, input } => {
            let view = build_view(&config, &store, load_event(&event)?, 0).await?;
            view.set_input(input);
            let resolved = view.validate().await?;
            print_json(&resolved)?;
            if view.is_claimed() {
                println!("Already claimed");
            }
        }
        Commands::Claim {
            event,
            delivery,
            input,
            watch,
        } => {
            let view = build_view(&config, &store, load_event(&event)?, delivery).await?;
            view.set_input(input);
            view.validate().await?;
            let tx = view.submit().await?;
            print_json(&tx)?;
            if watch {
                run_until_shutdown(&config, &store, &view, Some(tx.address.to_checksum(None))).await?;
            }
        }
        Commands::Watch { event, address } => {
            let address = match address {
                Some(raw) => Some(
                    parse_address(raw.trim())
                        .ok_or_else(|| format!("Not a valid address: {raw}"))?
                        .to_checksum(None),
                ),
                None => None,
            };
            let view = build_view(&config, &store, load_event(&event)?, 0).await?;
            run_until_shutdown(&config, &store, &view, address).await?;
        }
        Commands::List { key } => {
            let transactions = match key {
                Some(key) => store.list_for_event(&key),
                None => store.list(),
            };
            print_json(&transactions)?;
        }
        Commands::Rewards { event } => {
            let event = load_event(&event)?;
            let catalog = HttpQueueClient::new(config.queue.clone())?;
            let rewards = rewards_to_claim(&catalog.reward_events().await?, &event);
            print_json(&rewards)?;
        }
    }

    store.flush()?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn load_event(path: &Path) -> Result<Event, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn build_view(
    config: &ClaimConfig,
    store: &TransactionStore,
    event: Event,
    delivery_id: u64,
) -> Result<ClaimView, Box<dyn Error>> {
    let chain: Arc<dyn ChainReader> = Arc::new(
        AlloyChainReader::connect(&config.identity_chain, &config.delivery_chain).await?,
    );
    let queue: Arc<dyn DeliveryQueueClient> = Arc::new(HttpQueueClient::new(config.queue.clone())?);

    Ok(ClaimView::new(
        event,
        delivery_id,
        ViewDeps {
            chain,
            queue,
            store: store.clone(),
            notifier: Notifier::new(),
            reconciler: config.reconciler.clone(),
        },
    ))
}

/// Reconcile until Ctrl-C, printing notifications and accepted updates.
async fn run_until_shutdown(
    config: &ClaimConfig,
    store: &TransactionStore,
    view: &ClaimView,
    address: Option<String>,
) -> Result<(), Box<dyn Error>> {
    if config.status_api.enabled {
        let listener = TcpListener::bind(&config.status_api.bind_address).await?;
        let server = StatusServer::new(&config.status_api, store.clone());
        tokio::spawn(async move {
            if let Err(e) = server.run(listener, wait_for_shutdown()).await {
                tracing::error!(error = %e, "Status API failed");
            }
        });
    }

    let mut updates = store.subscribe();
    let mut notifications = view.notifier().subscribe();
    let reconciler = view.start()?;
    let key = view.event().key.clone();

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Ok(tx) = updates.recv() => {
                let wanted = tx.key == key
                    && address.as_ref().map_or(true, |a| *a == tx.address.to_checksum(None));
                if wanted {
                    print_json(&tx)?;
                }
            }
            Ok(notification) = notifications.recv() => {
                let marker = match notification.severity {
                    Severity::Success => "+",
                    Severity::Error => "!",
                    Severity::Info => "*",
                };
                println!("[{marker}] {}: {}", notification.title, notification.description);
            }
        }
    }

    view.teardown();
    if let Err(e) = reconciler.await {
        tracing::error!(error = %e, "Reconciler task failed");
    }
    Ok(())
}
