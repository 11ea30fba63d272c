//! Offer books for DAO tokens.
//!
//! ## Architecture
//!
//! Each DAO has its own [`OfferBook`]:
//!
//! - **Slab-based storage**: offer rows keyed by `offer_id`, handed out in order
//! - **Price levels**: active offers grouped by (token, side, price) using BTreeMap
//! - **Time priority**: FIFO ordering at each price level
//!
//! ## Components
//!
//! - [`PriceLevel`]: Queue of offer ids at a single price point
//! - [`OfferBook`]: Offer rows and the resting index of one DAO
//! - [`OfferBooks`]: Books of all DAOs
//!
//! The `createoffer` and `canceloffer` handlers live here too.
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert offer | O(log n) |
//! | Lookup by id | O(1) |
//! | Find exact counter-offer | O(log n + k) |
//! | Close offer | O(log n + k) |
//!
//! *k = offers resting at the same price level*

mod actions;
pub mod book;
pub mod level;

pub use book::{OfferBook, OfferBooks, RestingKey};
pub use level::PriceLevel;
