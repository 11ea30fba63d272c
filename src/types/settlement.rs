//! Settlement type representing an executed match between two offers.

use ssz_rs::prelude::*;

use crate::types::{Asset, ConversionRecord, Name, OfferType};

/// A settlement is a single match between a resting offer and a taker.
///
/// ## Terminology
///
/// - **Resting**: the offer that was already in the book
/// - **Taker**: the incoming offer that triggered the match; it never gets a row
///
/// ## Price
///
/// Matching is exact: taker and resting offer agree on price and quantity,
/// so there is no price discovery. `total` is `quantity × price_per_unit`
/// truncated to the quote precision.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, SimpleSerialize, serde::Serialize, serde::Deserialize,
)]
pub struct Settlement {
    /// DAO whose offer book produced the match
    pub dao_id: u64,

    /// Resting offer ID
    pub resting_offer_id: u64,

    /// Side of the resting offer as u8 (0=Sell, 1=Buy)
    pub resting_type_raw: u8,

    /// Account that receives the quote token
    pub seller: Name,

    /// Account that receives the base token
    pub buyer: Name,

    /// Base-token quantity
    pub quantity: Asset,

    /// Price per whole unit in the quote token
    pub price_per_unit: Asset,

    /// Quote-token total
    pub total: Asset,

    /// Execution time
    pub date: u64,
}

impl Settlement {
    /// Side of the resting offer
    pub fn resting_type(&self) -> OfferType {
        OfferType::from_u8(self.resting_type_raw).unwrap_or_default()
    }

    /// Creator of the taker offer
    pub fn taker(&self) -> Name {
        match self.resting_type() {
            OfferType::Sell => self.buyer,
            OfferType::Buy => self.seller,
        }
    }

    /// Log entry appended to the resting offer
    pub fn conversion_record(&self) -> ConversionRecord {
        ConversionRecord {
            counterparty: self.taker(),
            counter_offer_type_raw: self.resting_type().opposite().to_u8(),
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total: self.total,
            date: self.date,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
