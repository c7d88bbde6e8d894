//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the claim tracker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Mainnet ENS registry (same address on every network ENS is deployed to).
pub const DEFAULT_ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// Root configuration for the claim tracker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClaimConfig {
    /// Chain used to resolve human-readable names (ENS) to addresses.
    pub identity_chain: ChainConfig,

    /// Chain on which claimed rewards are settled.
    pub delivery_chain: ChainConfig,

    /// Backend delivery queue API.
    pub queue: QueueConfig,

    /// Reconciliation loop cadence and per-call deadlines.
    pub reconciler: ReconcilerConfig,

    /// Transaction store persistence.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only status API for the presentation layer.
    pub status_api: StatusApiConfig,
}

/// JSON-RPC access to one blockchain network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Enable this chain. A disabled chain has no provider connection.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Expected chain ID (1 for Ethereum mainnet, 100 for Gnosis).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// ENS registry contract. Only read on the identity chain.
    pub ens_registry: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            ens_registry: DEFAULT_ENS_REGISTRY.to_string(),
        }
    }
}

/// Backend delivery queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Base URL of the backend API.
    pub api_url: String,

    /// Path of the claim submission endpoint.
    pub claim_path: String,

    /// Path prefix of the queue status endpoint (`{queue_path}/{queue_uid}`).
    pub queue_path: String,

    /// Path of the reward event listing.
    pub events_path: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            claim_path: "/actions/claim-delivery-v2".to_string(),
            queue_path: "/queue-message".to_string(),
            events_path: "/events".to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Tick period in milliseconds.
    pub poll_interval_ms: u64,

    /// Deadline for each queue/receipt lookup inside a tick, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            request_timeout_secs: 15,
        }
    }
}

/// Transaction store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file the store is loaded from and flushed to. In-memory only when unset.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusApiConfig {
    /// Serve the status API while watching.
    pub enabled: bool,

    /// Bind address.
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StatusApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}
