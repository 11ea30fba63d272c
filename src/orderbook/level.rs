//! Resting offers at one (token, side, price) point.
//!
//! ## Design
//!
//! A `PriceLevel` holds the ids of the active offers resting at a single
//! price, oldest first (time priority).
//!
//! ```text
//! front (oldest) -> offer2 -> offer3 -> back (newest)
//! ```
//!
//! - New offers are appended at the back
//! - Matching scans from the front and takes the first exact fit
//! - Cancels and fills remove from anywhere in the queue

use std::collections::VecDeque;

use crate::types::Asset;

/// Active offers at a single price.
///
/// The offer rows live in the book's slab; this struct only holds the
/// queue of ids.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Price for this level, in the quote token
    pub price: Asset,

    /// Total open quantity at this level, in base-token units
    pub total_quantity: u64,

    /// Offer ids in creation order
    queue: VecDeque<u64>,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: Asset) -> Self {
        Self {
            price,
            total_quantity: 0,
            queue: VecDeque::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of offers at this price level
    #[inline]
    pub fn order_count(&self) -> usize {
        self.queue.len()
    }

    /// Append an offer to the back of the queue
    ///
    /// # Arguments
    ///
    /// * `offer_id` - The offer id (also its slab key)
    /// * `quantity` - Open quantity of the offer
    pub fn push_back(&mut self, offer_id: u64, quantity: u64) {
        self.queue.push_back(offer_id);
        self.total_quantity = self.total_quantity.saturating_add(quantity);
    }

    /// Remove an offer from the queue
    ///
    /// # Returns
    ///
    /// `true` if the offer was queued at this level
    pub fn remove(&mut self, offer_id: u64, quantity: u64) -> bool {
        match self.queue.iter().position(|&id| id == offer_id) {
            Some(pos) => {
                self.queue.remove(pos);
                self.total_quantity = self.total_quantity.saturating_sub(quantity);
                true
            }
            None => false,
        }
    }

    /// Oldest offer id
    #[inline]
    pub fn peek_front(&self) -> Option<u64> {
        self.queue.front().copied()
    }

    /// Offer ids, oldest first
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.queue.iter().copied()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn price() -> Asset {
        "0.1000 TLOS".parse().unwrap()
    }

    #[test]
    fn test_price_level_new() {
        let level = PriceLevel::new(price());

        assert_eq!(level.price, price());
        assert_eq!(level.total_quantity, 0);
        assert_eq!(level.order_count(), 0);
        assert!(level.peek_front().is_none());
        assert!(level.is_empty());
    }

    #[test]
    fn test_price_level_push_keeps_fifo() {
        let mut level = PriceLevel::new(price());

        level.push_back(0, 10_000);
        level.push_back(3, 20_000);
        level.push_back(7, 30_000);

        assert_eq!(level.order_count(), 3);
        assert_eq!(level.total_quantity, 60_000);
        assert_eq!(level.peek_front(), Some(0));
        assert_eq!(level.iter().collect::<Vec<_>>(), vec![0, 3, 7]);
    }

    #[test]
    fn test_price_level_remove_middle() {
        let mut level = PriceLevel::new(price());
        level.push_back(0, 10_000);
        level.push_back(1, 20_000);
        level.push_back(2, 30_000);

        assert!(level.remove(1, 20_000));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity, 40_000);
        assert_eq!(level.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_price_level_remove_head() {
        let mut level = PriceLevel::new(price());
        level.push_back(0, 10_000);
        level.push_back(1, 20_000);

        level.remove(0, 10_000);

        assert_eq!(level.peek_front(), Some(1));
        assert_eq!(level.total_quantity, 20_000);
    }

    #[test]
    fn test_price_level_remove_only() {
        let mut level = PriceLevel::new(price());
        level.push_back(5, 10_000);

        assert!(level.remove(5, 10_000));
        assert!(level.is_empty());
        assert_eq!(level.total_quantity, 0);
    }

    #[test]
    fn test_price_level_remove_unknown() {
        let mut level = PriceLevel::new(price());
        level.push_back(0, 10_000);

        assert!(!level.remove(9, 10_000));
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity, 10_000);
    }
}
