//! Per-DAO offer book.
//!
//! ## Architecture
//!
//! - **Slab**: every offer row, keyed by `offer_id`. Rows are never removed,
//!   so the next vacant key is always the next offer id.
//! - **BTreeMap**: active offers grouped by [`RestingKey`] into FIFO
//!   [`PriceLevel`]s, so an exact-match lookup touches one level only.
//!
//! Closed offers stay in the slab as history and leave the resting index.
//!
//! ## Example
//!
//! ```
//! use dao_registry::orderbook::{OfferBook, RestingKey};
//! use dao_registry::types::{Offer, OfferType};
//!
//! let mut book = OfferBook::new();
//! let offer = Offer::new(
//!     book.next_offer_id(),
//!     "bob".parse().unwrap(),
//!     "1.0000 DTK".parse().unwrap(),
//!     "0.1000 TLOS".parse().unwrap(),
//!     OfferType::Sell,
//!     0,
//!     "token.c".parse().unwrap(),
//!     0,
//! );
//! let key = RestingKey::of(&offer);
//! let offer_id = book.insert(offer);
//!
//! assert_eq!(offer_id, 0);
//! assert_eq!(book.level(&key).unwrap().peek_front(), Some(0));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use slab::Slab;

use crate::error::RegistryError;
use crate::orderbook::PriceLevel;
use crate::types::{Asset, ConversionRecord, Name, Offer, OfferType, Symbol};

/// Index key of a price level.
///
/// Keyed by the token itself (contract and symbol), not by its position in
/// the DAO's token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RestingKey {
    pub token_contract: Name,
    pub token: Symbol,
    pub offer_type: OfferType,
    pub price: Asset,
}

impl RestingKey {
    pub fn new(token_contract: Name, token: Symbol, offer_type: OfferType, price: Asset) -> Self {
        Self {
            token_contract,
            token,
            offer_type,
            price,
        }
    }

    /// Level an offer rests at
    pub fn of(offer: &Offer) -> Self {
        Self::new(
            offer.token_contract,
            offer.total_quantity.symbol,
            offer.offer_type,
            offer.price_per_unit,
        )
    }
}

/// Offers of one DAO.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    /// Key: offer id
    offers: Slab<Offer>,

    /// Active offers by (token, side, price)
    resting: BTreeMap<RestingKey, PriceLevel>,

    active_count: usize,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offers: Slab::with_capacity(capacity),
            resting: BTreeMap::new(),
            active_count: 0,
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Id the next inserted offer will get
    #[inline]
    pub fn next_offer_id(&self) -> u64 {
        self.offers.vacant_key() as u64
    }

    /// Number of offer rows, active and closed
    #[inline]
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of non-empty price levels
    #[inline]
    pub fn level_count(&self) -> usize {
        self.resting.len()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, offer_id: u64) -> Option<&Offer> {
        self.offers.get(usize::try_from(offer_id).ok()?)
    }

    pub fn level(&self, key: &RestingKey) -> Option<&PriceLevel> {
        self.resting.get(key)
    }

    /// All offers ordered by id
    pub fn offers(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter().map(|(_, offer)| offer)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert an active offer at the back of its price level
    ///
    /// The offer id is overwritten with [`next_offer_id`](Self::next_offer_id).
    ///
    /// # Returns
    ///
    /// The assigned offer id
    pub fn insert(&mut self, mut offer: Offer) -> u64 {
        let offer_id = self.next_offer_id();
        offer.offer_id = offer_id;

        let key = RestingKey::of(&offer);
        let quantity = offer.available_quantity.amount;
        let active = offer.is_active();

        self.offers.insert(offer);

        if active {
            self.resting
                .entry(key)
                .or_insert_with(|| PriceLevel::new(key.price))
                .push_back(offer_id, quantity);
            self.active_count += 1;
        }

        offer_id
    }

    /// Close an active offer and drop it from the resting index
    pub fn close(&mut self, offer_id: u64) -> Result<&Offer, RegistryError> {
        let offer = usize::try_from(offer_id)
            .ok()
            .and_then(|key| self.offers.get_mut(key))
            .ok_or(RegistryError::OfferNotFound)?;

        if !offer.is_active() {
            return Err(RegistryError::OfferNotActive);
        }

        let key = RestingKey::of(offer);
        if let Some(level) = self.resting.get_mut(&key) {
            level.remove(offer_id, offer.available_quantity.amount);
            if level.is_empty() {
                self.resting.remove(&key);
            }
        }

        offer.close();
        self.active_count -= 1;
        Ok(&*offer)
    }

    /// Append a settlement to an offer's log
    pub fn record_conversion(&mut self, offer_id: u64, record: ConversionRecord) -> Result<(), RegistryError> {
        let offer = usize::try_from(offer_id)
            .ok()
            .and_then(|key| self.offers.get_mut(key))
            .ok_or(RegistryError::OfferNotFound)?;
        offer.conversion_info.push(record);
        Ok(())
    }
}

/// Offer books of every DAO, keyed by `dao_id`.
///
/// Books are shared between clones and copied on first write, so staging a
/// copy of the registry only duplicates the books an action touches.
#[derive(Debug, Clone, Default)]
pub struct OfferBooks {
    books: BTreeMap<u64, Arc<OfferBook>>,
}

impl OfferBooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dao_id: u64) -> Option<&OfferBook> {
        self.books.get(&dao_id).map(Arc::as_ref)
    }

    pub fn get_mut(&mut self, dao_id: u64) -> Option<&mut OfferBook> {
        self.books.get_mut(&dao_id).map(Arc::make_mut)
    }

    /// Book of `dao_id`, created empty on first use
    pub fn book_mut(&mut self, dao_id: u64) -> &mut OfferBook {
        Arc::make_mut(self.books.entry(dao_id).or_default())
    }

    /// Books ordered by `dao_id`
    pub fn iter(&self) -> impl Iterator<Item = (u64, &OfferBook)> {
        self.books.iter().map(|(dao_id, book)| (*dao_id, book.as_ref()))
    }

    pub fn clear(&mut self) {
        self.books.clear();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
