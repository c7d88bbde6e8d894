//! Address validation and resolution.
//!
//! # Steps
//! ```text
//! input ──empty──▶ EmptyInput
//!   │
//!   ├─ syntactically an address ──▶ checksummed form
//!   └─ otherwise a name ── no identity provider ──▶ NoProviderConnection
//!                       ── lookup miss / RPC failure ──▶ InvalidIdentifier
//!   │
//!   └─ lowercase lookup in Event.addresses ── absent ──▶ NotEligible
//! ```

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::ChainReader;
use crate::claims::event::Event;

/// Why an input could not be turned into an eligible address.
///
/// All variants are user-correctable; their `Display` is the inline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Please enter an address")]
    EmptyInput,

    /// Neither an address nor a resolvable name. Lookup misses and lookup
    /// outages are deliberately indistinguishable.
    #[error("Please enter a valid Ethereum address or ENS Name")]
    InvalidIdentifier,

    #[error("Address not found in claim list")]
    NotEligible,

    #[error("No connection to the Ethereum network")]
    NoProviderConnection,
}

/// An eligible, canonical claimant address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAddress {
    pub address: Address,
    /// The name the user typed, when the address came from name resolution.
    pub display_name: Option<String>,
    /// Claim ids from the eligibility list.
    pub claims: Vec<u64>,
}

impl ResolvedAddress {
    pub fn checksummed(&self) -> String {
        self.address.to_checksum(None)
    }
}

/// Parse `input` as an address.
///
/// Accepts 40 hex digits with an optional `0x` prefix. All-lowercase and
/// all-uppercase input carries no checksum; mixed case must be valid EIP-55.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex = input.strip_prefix("0x").unwrap_or(input);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let address: Address = format!("0x{hex}").parse().ok()?;

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *hex {
        return None;
    }
    Some(address)
}

/// Turns user input into an eligible address.
#[derive(Clone)]
pub struct AddressResolver {
    chain: Arc<dyn ChainReader>,
}

impl AddressResolver {
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self { chain }
    }

    /// Validate `input` against `event`'s eligibility list.
    ///
    /// Only reads from the chain; no state is changed.
    pub async fn resolve(
        &self,
        input: &str,
        event: &Event,
    ) -> Result<ResolvedAddress, ResolutionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }

        let (address, display_name) = match parse_address(input) {
            Some(address) => (address, None),
            None => (self.resolve_name(input).await?, Some(input.to_string())),
        };

        let claims = event
            .eligible_claims(&address)
            .ok_or(ResolutionError::NotEligible)?
            .to_vec();

        tracing::info!(
            event_key = %event.key,
            address = %address,
            name = ?display_name,
            claims = ?claims,
            "Address validated"
        );

        Ok(ResolvedAddress {
            address,
            display_name,
            claims,
        })
    }

    async fn resolve_name(&self, name: &str) -> Result<Address, ResolutionError> {
        if !self.chain.has_identity_provider() {
            return Err(ResolutionError::NoProviderConnection);
        }
        match self.chain.resolve_name(name).await {
            Ok(Some(address)) => Ok(address),
            Ok(None) => {
                tracing::debug!(name, "Name did not resolve");
                Err(ResolutionError::InvalidIdentifier)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "Name resolution failed");
                Err(ResolutionError::InvalidIdentifier)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{ChainError, ChainResult, Receipt};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[derive(Default)]
    struct FakeChain {
        connected: bool,
        outage: bool,
        names: HashMap<String, Address>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        fn has_identity_provider(&self) -> bool {
            self.connected
        }

        async fn resolve_name(&self, name: &str) -> ChainResult<Option<Address>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.outage {
                return Err(ChainError::Rpc("All RPC providers failed".to_string()));
            }
            Ok(self.names.get(name).copied())
        }

        async fn get_transaction_receipt(&self, _hash: &str) -> ChainResult<Option<Receipt>> {
            Ok(None)
        }
    }

    fn event_for(address: &str, claims: Vec<u64>) -> Event {
        let mut event = Event {
            key: "drop".to_string(),
            active: true,
            ..Event::default()
        };
        event.addresses.insert(address.to_lowercase(), claims);
        event
    }

    fn resolver(chain: FakeChain) -> (AddressResolver, Arc<FakeChain>) {
        let chain = Arc::new(chain);
        (AddressResolver::new(chain.clone()), chain)
    }

    #[test]
    fn test_parse_address_forms() {
        let expected: Address = CHECKSUMMED.parse().unwrap();
        assert_eq!(parse_address(CHECKSUMMED), Some(expected));
        assert_eq!(parse_address(&CHECKSUMMED.to_lowercase()), Some(expected));
        assert_eq!(parse_address(&format!("0x{}", CHECKSUMMED[2..].to_uppercase())), Some(expected));
        assert_eq!(parse_address(&CHECKSUMMED[2..]), Some(expected));
    }

    #[test]
    fn test_parse_address_rejects() {
        // One letter flipped breaks the checksum.
        assert_eq!(parse_address("0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed"), None);
        assert_eq!(parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea"), None);
        assert_eq!(parse_address("vitalik.eth"), None);
        assert_eq!(parse_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"), None);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (resolver, _) = resolver(FakeChain::default());
        let event = event_for(CHECKSUMMED, vec![1]);
        assert_eq!(resolver.resolve("", &event).await, Err(ResolutionError::EmptyInput));
        assert_eq!(resolver.resolve("   ", &event).await, Err(ResolutionError::EmptyInput));
    }

    #[tokio::test]
    async fn test_mixed_case_input_is_checksummed_and_eligible() {
        let (resolver, chain) = resolver(FakeChain::default());
        let event = event_for(CHECKSUMMED, vec![42]);

        let resolved = resolver
            .resolve(&CHECKSUMMED.to_lowercase(), &event)
            .await
            .unwrap();
        assert_eq!(resolved.checksummed(), CHECKSUMMED);
        assert_eq!(resolved.claims, vec![42]);
        assert_eq!(resolved.display_name, None);
        assert_eq!(chain.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_address_input_needs_no_provider() {
        let (resolver, _) = resolver(FakeChain::default());
        let event = event_for(CHECKSUMMED, vec![1]);
        assert!(resolver.resolve(CHECKSUMMED, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_ineligible_address_regardless_of_provider() {
        let event = event_for("0x0000000000000000000000000000000000000001", vec![1]);
        for chain in [
            FakeChain::default(),
            FakeChain {
                connected: true,
                outage: true,
                ..FakeChain::default()
            },
        ] {
            let (resolver, _) = resolver(chain);
            assert_eq!(
                resolver.resolve(CHECKSUMMED, &event).await,
                Err(ResolutionError::NotEligible)
            );
        }
    }

    #[tokio::test]
    async fn test_name_without_provider() {
        let (resolver, chain) = resolver(FakeChain::default());
        let event = event_for(CHECKSUMMED, vec![1]);
        assert_eq!(
            resolver.resolve("vitalik.eth", &event).await,
            Err(ResolutionError::NoProviderConnection)
        );
        assert_eq!(chain.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_miss_and_outage_look_the_same() {
        let event = event_for(CHECKSUMMED, vec![1]);

        let (miss, _) = resolver(FakeChain {
            connected: true,
            ..FakeChain::default()
        });
        let (outage, _) = resolver(FakeChain {
            connected: true,
            outage: true,
            ..FakeChain::default()
        });

        let a = miss.resolve("nobody.eth", &event).await;
        let b = outage.resolve("nobody.eth", &event).await;
        assert_eq!(a, Err(ResolutionError::InvalidIdentifier));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_name_resolution_keeps_display_name() {
        let address: Address = CHECKSUMMED.parse().unwrap();
        let mut names = HashMap::new();
        names.insert("alice.eth".to_string(), address);
        let (resolver, chain) = resolver(FakeChain {
            connected: true,
            names,
            ..FakeChain::default()
        });
        let event = event_for(CHECKSUMMED, vec![7, 8]);

        let resolved = resolver.resolve("alice.eth", &event).await.unwrap();
        assert_eq!(resolved.address, address);
        assert_eq!(resolved.display_name.as_deref(), Some("alice.eth"));
        assert_eq!(resolved.claims, vec![7, 8]);
        assert_eq!(chain.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ResolutionError::NotEligible.to_string(),
            "Address not found in claim list"
        );
        assert_eq!(
            ResolutionError::NoProviderConnection.to_string(),
            "No connection to the Ethereum network"
        );
    }
}
