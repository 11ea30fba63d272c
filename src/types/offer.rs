//! Offer types for the registry's offer book.
//!
//! ## Lifecycle
//!
//! An offer is created `Active` with `available_quantity == total_quantity`
//! and moves to `Closed` exactly once: when a later offer consumes it, or
//! when its creator cancels it. Closed is terminal.
//!
//! ## Numeric encoding
//!
//! `OfferType` and `OfferStatus` keep the registry's on-chain numbering
//! (sell = 0, buy = 1; closed = 0, active = 1) for hashing.

use ssz_rs::prelude::*;

use crate::error::RegistryError;
use crate::types::{Asset, Name};

// ============================================================================
// OfferType enum
// ============================================================================

/// Offer side
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    /// Sell the DAO token for the quote token
    #[default]
    Sell,
    /// Buy the DAO token with the quote token
    Buy,
}

impl OfferType {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            OfferType::Sell => 0,
            OfferType::Buy => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OfferType::Sell),
            1 => Some(OfferType::Buy),
            _ => None,
        }
    }

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            OfferType::Sell => OfferType::Buy,
            OfferType::Buy => OfferType::Sell,
        }
    }
}

// ============================================================================
// OfferStatus enum
// ============================================================================

/// Offer status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Closed,
    #[default]
    Active,
}

impl OfferStatus {
    pub fn to_u8(self) -> u8 {
        match self {
            OfferStatus::Closed => 0,
            OfferStatus::Active => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OfferStatus::Closed),
            1 => Some(OfferStatus::Active),
            _ => None,
        }
    }
}

// ============================================================================
// ConversionRecord
// ============================================================================

/// One entry of an offer's settlement log.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, SimpleSerialize, serde::Serialize, serde::Deserialize,
)]
pub struct ConversionRecord {
    /// Creator of the offer on the other side
    pub counterparty: Name,

    /// Side of the counter-offer as u8 (0=Sell, 1=Buy)
    pub counter_offer_type_raw: u8,

    /// Base-token quantity exchanged
    pub quantity: Asset,

    /// Price per whole unit, in the quote token
    pub price_per_unit: Asset,

    /// Quote-token total (quantity × price, truncated)
    pub total: Asset,

    /// Settlement time
    pub date: u64,
}

// ============================================================================
// Offer struct
// ============================================================================

/// A buy or sell offer for one DAO token.
///
/// ## Example
///
/// ```
/// use dao_registry::types::{Offer, OfferType, OfferStatus};
///
/// let offer = Offer::new(
///     0,                              // offer_id
///     "bob".parse().unwrap(),         // creator
///     "1.0000 DTK".parse().unwrap(),  // quantity
///     "0.1000 TLOS".parse().unwrap(), // price_per_unit
///     OfferType::Sell,
///     0,                              // token_idx
///     "token.c".parse().unwrap(),     // token_contract
///     1_700_000_000,                  // creation_date
/// );
/// assert_eq!(offer.status, OfferStatus::Active);
/// assert_eq!(offer.available_quantity, offer.total_quantity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Offer {
    /// Identifier, unique within the DAO
    pub offer_id: u64,

    pub creator: Name,

    /// Quantity at creation (never changes)
    pub total_quantity: Asset,

    /// Quantity still open
    pub available_quantity: Asset,

    /// Price per whole unit of the base token, in the quote token
    pub price_per_unit: Asset,

    /// Settlements this offer took part in as the resting side
    pub conversion_info: Vec<ConversionRecord>,

    pub status: OfferStatus,

    pub creation_date: u64,

    #[serde(rename = "type")]
    pub offer_type: OfferType,

    /// Index into the DAO's token list
    pub token_idx: u64,

    /// Contract of the DAO token, fixed at creation
    pub token_contract: Name,
}

impl Offer {
    /// Create a new active offer
    pub fn new(
        offer_id: u64,
        creator: Name,
        quantity: Asset,
        price_per_unit: Asset,
        offer_type: OfferType,
        token_idx: u64,
        token_contract: Name,
        creation_date: u64,
    ) -> Self {
        Self {
            offer_id,
            creator,
            total_quantity: quantity,
            available_quantity: quantity, // Initially, available = total
            price_per_unit,
            conversion_info: Vec::new(),
            status: OfferStatus::Active,
            creation_date,
            offer_type,
            token_idx,
            token_contract,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }

    /// Amount held in escrow for this offer
    ///
    /// Base token for a sell, quote token (quantity × price) for a buy.
    pub fn escrow(&self) -> Result<Asset, RegistryError> {
        if !self.is_active() {
            return Ok(match self.offer_type {
                OfferType::Sell => Asset::zero(self.available_quantity.symbol),
                OfferType::Buy => Asset::zero(self.price_per_unit.symbol),
            });
        }
        match self.offer_type {
            OfferType::Sell => Ok(self.available_quantity),
            OfferType::Buy => self.available_quantity.checked_mul_price(&self.price_per_unit),
        }
    }

    /// Close the offer, zeroing the open quantity
    pub fn close(&mut self) {
        self.available_quantity = Asset::zero(self.available_quantity.symbol);
        self.status = OfferStatus::Closed;
    }

    /// Fixed-size summary used for state hashing
    pub(crate) fn header(&self) -> OfferHeader {
        OfferHeader {
            offer_id: self.offer_id,
            creator: self.creator,
            total_quantity: self.total_quantity,
            available_quantity: self.available_quantity,
            price_per_unit: self.price_per_unit,
            conversions: self.conversion_info.len() as u64,
            status_raw: self.status.to_u8(),
            creation_date: self.creation_date,
            type_raw: self.offer_type.to_u8(),
            token_idx: self.token_idx,
            token_contract: self.token_contract,
        }
    }
}

/// SSZ view of an offer without its variable-length log.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub(crate) struct OfferHeader {
    pub offer_id: u64,
    pub creator: Name,
    pub total_quantity: Asset,
    pub available_quantity: Asset,
    pub price_per_unit: Asset,
    pub conversions: u64,
    pub status_raw: u8,
    pub creation_date: u64,
    pub type_raw: u8,
    pub token_idx: u64,
    pub token_contract: Name,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sell_offer() -> Offer {
        Offer::new(
            0,
            "bob".parse().unwrap(),
            "1.0000 DTK".parse().unwrap(),
            "0.1000 TLOS".parse().unwrap(),
            OfferType::Sell,
            0,
            "token.c".parse().unwrap(),
            0,
        )
    }

    #[test]
    fn test_offer_type_conversion() {
        assert_eq!(OfferType::Sell.to_u8(), 0);
        assert_eq!(OfferType::Buy.to_u8(), 1);
        assert_eq!(OfferType::from_u8(1), Some(OfferType::Buy));
        assert_eq!(OfferType::from_u8(2), None);
        assert_eq!(OfferType::Buy.opposite(), OfferType::Sell);
    }

    #[test]
    fn test_offer_status_conversion() {
        assert_eq!(OfferStatus::Closed.to_u8(), 0);
        assert_eq!(OfferStatus::Active.to_u8(), 1);
        assert_eq!(OfferStatus::from_u8(0), Some(OfferStatus::Closed));
        assert_eq!(OfferStatus::from_u8(7), None);
    }

    #[test]
    fn test_escrow_by_side() {
        let sell = sell_offer();
        assert_eq!(sell.escrow().unwrap().to_string(), "1.0000 DTK");

        let mut buy = sell_offer();
        buy.offer_type = OfferType::Buy;
        assert_eq!(buy.escrow().unwrap().to_string(), "0.1000 TLOS");
    }

    #[test]
    fn test_close() {
        let mut offer = sell_offer();
        offer.close();

        assert!(!offer.is_active());
        assert!(offer.available_quantity.is_zero());
        assert_eq!(offer.total_quantity.to_string(), "1.0000 DTK");
        assert!(offer.escrow().unwrap().is_zero());
    }

    #[test]
    fn test_header_ssz_is_fixed_size() {
        let mut offer = sell_offer();
        let before = ssz_rs::serialize(&offer.header()).expect("Failed to serialize");

        offer.conversion_info.push(ConversionRecord::default());
        let after = ssz_rs::serialize(&offer.header()).expect("Failed to serialize");

        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
    }

    #[test]
    fn test_offer_json_uses_type_key() {
        let json = serde_json::to_value(sell_offer()).unwrap();
        assert_eq!(json["type"], "sell");
        assert_eq!(json["status"], "active");
        assert_eq!(json["available_quantity"], "1.0000 DTK");
    }
}
