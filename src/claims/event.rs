//! Claim campaign (event) input.

use std::collections::{BTreeSet, HashMap};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// A claim campaign. Supplied by the host and read-only to the claim flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifies the campaign; transactions are grouped by it.
    pub key: String,

    /// Lowercase address → claim ids the address is eligible for.
    #[serde(default)]
    pub addresses: HashMap<String, Vec<u64>>,

    /// Address → already-claimed flag.
    #[serde(default)]
    pub claims: HashMap<String, bool>,

    /// Reward ids that belong to this campaign.
    #[serde(default)]
    pub event_ids: BTreeSet<u64>,

    /// Gate on new claims.
    #[serde(default)]
    pub active: bool,
}

/// Key of `address` in [`Event::addresses`].
///
/// The eligibility list is keyed by lowercase hex; this is the only place an
/// address is compared case-insensitively.
pub fn eligibility_key(address: &Address) -> String {
    address.to_checksum(None).to_lowercase()
}

impl Event {
    /// Claim ids `address` may claim, or `None` if it is not on the list.
    pub fn eligible_claims(&self, address: &Address) -> Option<&[u64]> {
        self.addresses
            .get(&eligibility_key(address))
            .map(Vec::as_slice)
    }

    /// Whether the campaign already records a claim for `address`.
    ///
    /// Looked up by checksummed form first, then lowercase.
    pub fn is_claimed(&self, address: &Address) -> bool {
        let checksummed = address.to_checksum(None);
        self.claims
            .get(&checksummed)
            .or_else(|| self.claims.get(&checksummed.to_lowercase()))
            .copied()
            .unwrap_or(false)
    }
}
