//! ENS name resolution over plain `eth_call`s.
//!
//! ```text
//! name → normalize → namehash
//!      → registry.resolver(node)   (zero address: name has no resolver)
//!      → resolver.addr(node)       (zero address: name has no address record)
//! ```

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::ChainResult;

sol! {
    /// ENS registry lookup of the resolver responsible for a node.
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    /// EIP-137 address record.
    interface IAddrResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

/// Lowercase and trim a name before hashing.
///
/// Full UTS-46 normalisation is not applied; ASCII names hash identically.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Decode an ABI-encoded `address` return word. Zero and short returns mean "unset".
pub fn decode_address(ret: &[u8]) -> Option<Address> {
    if ret.len() < 32 {
        return None;
    }
    let address = Address::from_slice(&ret[12..32]);
    (address != Address::ZERO).then_some(address)
}

/// Resolve `name` through the registry at `registry`.
pub async fn resolve(
    client: &BlockchainClient,
    registry: Address,
    name: &str,
) -> ChainResult<Option<Address>> {
    let name = normalize(name);
    let node = namehash(&name);

    let ret = client
        .call(registry, IEnsRegistry::resolverCall { node }.abi_encode().into())
        .await?;
    let Some(resolver) = decode_address(&ret) else {
        tracing::debug!(name = %name, "ENS name has no resolver");
        return Ok(None);
    };

    let ret = client
        .call(resolver, IAddrResolver::addrCall { node }.abi_encode().into())
        .await?;
    let address = decode_address(&ret);
    tracing::debug!(name = %name, resolver = %resolver, resolved = ?address, "ENS lookup finished");
    Ok(address)
}
