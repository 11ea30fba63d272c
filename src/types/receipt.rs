//! Action receipts.
//!
//! Every successful registry action returns an [`ActionReceipt`]. The
//! registry never talks to other contracts directly; anything it needs done
//! outside its own tables is listed in `outbound` for the host to execute
//! inside the same transaction.

use sha2::{Digest, Sha256};

use crate::types::{Asset, Name, Settlement};

/// A request the registry makes of another contract.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutboundAction {
    /// Token transfer, signed by the registry
    Transfer {
        contract: Name,
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    },

    /// Buy storage for a newly created DAO
    BuyRamBytes {
        payer: Name,
        receiver: Name,
        bytes: u32,
    },

    /// Stake network and CPU bandwidth for a newly created DAO
    DelegateBandwidth {
        from: Name,
        receiver: Name,
        net: Asset,
        cpu: Asset,
        transfer: bool,
    },
}

/// What `createoffer` / `canceloffer` did.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum OfferOutcome {
    /// Consumed a resting offer; no row was inserted
    Matched(Settlement),

    /// No counter-offer; a new active row was inserted
    Resting { offer_id: u64 },

    /// Closed by its creator, escrow returned
    Cancelled { offer_id: u64, refund: Asset },
}

/// Execution receipt for one registry action.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionReceipt {
    /// Sequence number of the action (1-based, counts successful actions)
    pub sequence: u64,

    /// Action name
    pub action: String,

    /// Requests for the host, in order
    pub outbound: Vec<OutboundAction>,

    /// Offer result, for offer actions
    pub offer: Option<OfferOutcome>,
}

impl ActionReceipt {
    pub fn new(sequence: u64, action: &str) -> Self {
        Self {
            sequence,
            action: action.to_string(),
            outbound: Vec::new(),
            offer: None,
        }
    }

    /// Check if the action produced no outbound requests
    pub fn is_local(&self) -> bool {
        self.outbound.is_empty()
    }

    /// Settlement, if the action matched a resting offer
    pub fn settlement(&self) -> Option<&Settlement> {
        match &self.offer {
            Some(OfferOutcome::Matched(settlement)) => Some(settlement),
            _ => None,
        }
    }
}

/// Compute SHA-256 hash of the given data
///
/// Returns a 32-byte array suitable for use as a state root.
pub fn compute_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// ============================================================================
// Unit Tests
// ============================================================================
