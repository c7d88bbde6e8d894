//! Read-only access to the identity-resolution and delivery chains.

use alloy::network::ReceiptResponse as _;
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::ens;
use crate::blockchain::types::{ChainError, ChainResult, Receipt};
use crate::config::ChainConfig;

/// What the claim flow needs from the two chains.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Whether a provider for the identity-resolution chain exists right now.
    fn has_identity_provider(&self) -> bool;

    /// Resolve a human-readable name. `Ok(None)` when the name has no address.
    async fn resolve_name(&self, name: &str) -> ChainResult<Option<Address>>;

    /// Look up a delivery-chain receipt. `Ok(None)` while the transaction is unmined.
    async fn get_transaction_receipt(&self, hash: &str) -> ChainResult<Option<Receipt>>;
}

/// [`ChainReader`] backed by alloy JSON-RPC providers.
#[derive(Debug, Clone)]
pub struct AlloyChainReader {
    identity: Option<BlockchainClient>,
    delivery: Option<BlockchainClient>,
    ens_registry: Address,
}

impl AlloyChainReader {
    /// Connect to both chains.
    ///
    /// A chain that is disabled or fails to initialise is left without a
    /// client; calls that need it then fail with [`ChainError::NotAvailable`].
    pub async fn connect(identity: &ChainConfig, delivery: &ChainConfig) -> ChainResult<Self> {
        let ens_registry: Address = identity.ens_registry.parse().map_err(|e| {
            ChainError::InvalidConfig(format!(
                "Invalid ENS registry '{}': {}",
                identity.ens_registry, e
            ))
        })?;

        Ok(Self {
            identity: Self::connect_one("identity", identity).await,
            delivery: Self::connect_one("delivery", delivery).await,
            ens_registry,
        })
    }

    /// Build a reader from already-connected clients.
    pub fn from_clients(
        identity: Option<BlockchainClient>,
        delivery: Option<BlockchainClient>,
        ens_registry: Address,
    ) -> Self {
        Self {
            identity,
            delivery,
            ens_registry,
        }
    }

    async fn connect_one(role: &'static str, config: &ChainConfig) -> Option<BlockchainClient> {
        if !config.enabled {
            tracing::info!(chain = role, "Chain disabled");
            return None;
        }
        match BlockchainClient::new(config.clone()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(chain = role, error = %e, "Error while initiating provider");
                None
            }
        }
    }
}

#[async_trait]
impl ChainReader for AlloyChainReader {
    fn has_identity_provider(&self) -> bool {
        self.identity.is_some()
    }

    async fn resolve_name(&self, name: &str) -> ChainResult<Option<Address>> {
        let client = self
            .identity
            .as_ref()
            .ok_or_else(|| ChainError::NotAvailable("identity chain".to_string()))?;
        ens::resolve(client, self.ens_registry, name).await
    }

    async fn get_transaction_receipt(&self, hash: &str) -> ChainResult<Option<Receipt>> {
        let client = self
            .delivery
            .as_ref()
            .ok_or_else(|| ChainError::NotAvailable("delivery chain".to_string()))?;
        let tx_hash: TxHash = hash
            .parse()
            .map_err(|_| ChainError::InvalidHash(hash.to_string()))?;

        let receipt = client.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.map(|r| Receipt {
            status: r.status(),
            block_number: r.block_number,
        }))
    }
}
