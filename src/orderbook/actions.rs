//! `createoffer` and `canceloffer`.
//!
//! ## Escrow
//!
//! Placing an offer debits its escrow from the creator's available balance
//! before matching:
//!
//! - **Sell**: `quantity` of the DAO token, from scope `dao_id`
//! - **Buy**: `quantity × price_per_unit` of the quote token, from scope 0
//!
//! The escrow travels with the offer until a match pays it to the other
//! side or a cancel refunds it.

use tracing::info;

use crate::engine::{IncomingOffer, MatchResult, MatchingEngine, SettlementAccounts};
use crate::error::RegistryError;
use crate::ledger::TokenKey;
use crate::registry::{ActionContext, RegistryState};
use crate::types::{Asset, Name, Offer, OfferOutcome, OfferType};

impl RegistryState {
    pub(crate) fn createoffer(
        &mut self,
        ctx: &ActionContext,
        dao_id: u64,
        creator: Name,
        quantity: Asset,
        price_per_unit: Asset,
        offer_type: OfferType,
    ) -> Result<OfferOutcome, RegistryError> {
        ctx.require_auth(creator)?;
        let dao = self.directory.require(dao_id)?;

        if quantity.is_zero() || price_per_unit.is_zero() {
            return Err(RegistryError::NonPositiveAmount);
        }
        if price_per_unit.symbol != self.system_token.symbol {
            return Err(RegistryError::UnsupportedSystemToken);
        }

        let (token_idx, token) = dao
            .tokens
            .find_code(quantity.symbol)
            .map(|(idx, entry)| (idx, *entry))
            .ok_or(RegistryError::UnsupportedToken)?;
        if token.symbol != quantity.symbol {
            return Err(RegistryError::PrecisionMismatch {
                expected: token.symbol,
                found: quantity.symbol,
            });
        }

        let accounts = SettlementAccounts {
            base: TokenKey::new(dao_id, token.token_contract, token.symbol),
            quote: self.system_key(),
        };

        // Also rejects prices too small to ever settle
        let total = quantity.checked_mul_price(&price_per_unit)?;
        if total.is_zero() {
            return Err(RegistryError::NonPositiveAmount);
        }

        let (escrow_key, escrow) = match offer_type {
            OfferType::Sell => (accounts.base, quantity),
            OfferType::Buy => (accounts.quote, total),
        };
        self.ledger.debit(creator, &escrow_key, &escrow)?;

        let incoming = IncomingOffer {
            dao_id,
            creator,
            quantity,
            price_per_unit,
            offer_type,
            token_idx,
            token_contract: token.token_contract,
        };

        let book = self.books.book_mut(dao_id);
        match MatchingEngine::new().match_offer(book, &mut self.ledger, &incoming, &accounts, ctx.now)? {
            MatchResult::Matched(settlement) => {
                info!(
                    dao_id,
                    resting_offer_id = settlement.resting_offer_id,
                    %creator,
                    %quantity,
                    "Offer matched"
                );
                Ok(OfferOutcome::Matched(settlement))
            }
            MatchResult::NoMatch => {
                let offer_id = book.next_offer_id();
                book.insert(Offer::new(
                    offer_id,
                    creator,
                    quantity,
                    price_per_unit,
                    offer_type,
                    token_idx,
                    token.token_contract,
                    ctx.now,
                ));
                info!(dao_id, offer_id, %creator, side = ?offer_type, %quantity, "Offer resting");
                Ok(OfferOutcome::Resting { offer_id })
            }
        }
    }

    /// Close an active offer and refund its escrow to the creator
    pub(crate) fn canceloffer(
        &mut self,
        ctx: &ActionContext,
        dao_id: u64,
        offer_id: u64,
    ) -> Result<OfferOutcome, RegistryError> {
        let offer = self
            .books
            .get(dao_id)
            .and_then(|book| book.get(offer_id))
            .ok_or(RegistryError::OfferNotFound)?;

        ctx.require_auth(offer.creator)?;
        if !offer.is_active() {
            return Err(RegistryError::OfferNotActive);
        }

        let creator = offer.creator;
        let refund = offer.escrow()?;
        let key = self.escrow_key(dao_id, offer);

        self.books
            .get_mut(dao_id)
            .ok_or(RegistryError::OfferNotFound)?
            .close(offer_id)?;
        self.ledger.credit(creator, &key, &refund)?;

        info!(dao_id, offer_id, %creator, %refund, "Offer cancelled");
        Ok(OfferOutcome::Cancelled { offer_id, refund })
    }

    /// Ledger row an offer's escrow came from
    ///
    /// Built from the offer row alone, so it still resolves after the DAO
    /// is deleted.
    pub(crate) fn escrow_key(&self, dao_id: u64, offer: &Offer) -> TokenKey {
        match offer.offer_type {
            OfferType::Sell => TokenKey::new(dao_id, offer.token_contract, offer.total_quantity.symbol),
            OfferType::Buy => self.system_key(),
        }
    }
}
