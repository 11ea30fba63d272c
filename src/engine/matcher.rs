//! Exact-match settlement.
//!
//! ## Algorithm
//!
//! 1. Look up the price level of the opposite side at the incoming price
//! 2. Walk it oldest first and take the first offer whose open quantity
//!    equals the incoming quantity
//! 3. Credit the buyer with the base token and the seller with the quote
//!    total, close the resting offer, log the conversion
//!
//! Both sides already paid their escrow, so settlement only credits.
//! There are no partial fills and no price improvement.

use tracing::debug;

use crate::error::RegistryError;
use crate::ledger::{BalanceLedger, TokenKey};
use crate::orderbook::{OfferBook, RestingKey};
use crate::types::{Asset, Name, OfferType, Settlement};

/// An offer being placed, before it gets a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingOffer {
    pub dao_id: u64,
    pub creator: Name,
    pub quantity: Asset,
    pub price_per_unit: Asset,
    pub offer_type: OfferType,
    pub token_idx: u64,
    pub token_contract: Name,
}

impl IncomingOffer {
    /// Level a counter-offer must rest at
    pub fn counter_key(&self) -> RestingKey {
        RestingKey::new(
            self.token_contract,
            self.quantity.symbol,
            self.offer_type.opposite(),
            self.price_per_unit,
        )
    }
}

/// Ledger rows a settlement credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAccounts {
    /// DAO token, credited to the buyer
    pub base: TokenKey,
    /// Quote token, credited to the seller
    pub quote: TokenKey,
}

/// Result of matching one incoming offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// A resting offer was consumed
    Matched(Settlement),
    /// Nothing changed; the caller inserts the offer
    NoMatch,
}

/// Stateless exact-match engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingEngine;

impl MatchingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Oldest active offer that exactly fits `incoming`
    pub fn find_counter_offer(&self, book: &OfferBook, incoming: &IncomingOffer) -> Option<u64> {
        let level = book.level(&incoming.counter_key())?;
        level.iter().find(|&offer_id| {
            book.get(offer_id).map_or(false, |offer| {
                offer.is_active() && offer.available_quantity == incoming.quantity
            })
        })
    }

    /// Match `incoming` against the book and settle on a hit
    ///
    /// # Arguments
    ///
    /// * `book` - Offer book of the incoming offer's DAO
    /// * `ledger` - Balance ledger to credit
    /// * `incoming` - The offer being placed (escrow already taken)
    /// * `accounts` - Base and quote ledger keys
    /// * `now` - Settlement time
    pub fn match_offer(
        &self,
        book: &mut OfferBook,
        ledger: &mut BalanceLedger,
        incoming: &IncomingOffer,
        accounts: &SettlementAccounts,
        now: u64,
    ) -> Result<MatchResult, RegistryError> {
        let resting_id = match self.find_counter_offer(book, incoming) {
            Some(offer_id) => offer_id,
            None => {
                debug!(
                    dao_id = incoming.dao_id,
                    side = ?incoming.offer_type,
                    quantity = %incoming.quantity,
                    price = %incoming.price_per_unit,
                    "No counter-offer"
                );
                return Ok(MatchResult::NoMatch);
            }
        };

        let resting = book.get(resting_id).ok_or(RegistryError::OfferNotFound)?;
        let resting_type = resting.offer_type;
        let (seller, buyer) = match incoming.offer_type {
            OfferType::Sell => (incoming.creator, resting.creator),
            OfferType::Buy => (resting.creator, incoming.creator),
        };

        let total = incoming.quantity.checked_mul_price(&incoming.price_per_unit)?;

        ledger.credit(buyer, &accounts.base, &incoming.quantity)?;
        ledger.credit(seller, &accounts.quote, &total)?;

        book.close(resting_id)?;

        let settlement = Settlement {
            dao_id: incoming.dao_id,
            resting_offer_id: resting_id,
            resting_type_raw: resting_type.to_u8(),
            seller,
            buyer,
            quantity: incoming.quantity,
            price_per_unit: incoming.price_per_unit,
            total,
            date: now,
        };
        book.record_conversion(resting_id, settlement.conversion_record())?;

        debug!(
            dao_id = incoming.dao_id,
            resting_offer_id = resting_id,
            %seller,
            %buyer,
            quantity = %settlement.quantity,
            total = %settlement.total,
            "Matched"
        );

        Ok(MatchResult::Matched(settlement))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
