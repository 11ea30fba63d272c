//! Fixed-point token amounts.
//!
//! ## Overview
//!
//! Every amount in the registry is an [`Asset`]: an unsigned integer count of
//! the smallest unit, tagged with a [`Symbol`] that carries the token code
//! and its decimal precision. `100.0000 DTK` is stored as
//! `amount = 1_000_000` with symbol `4,DTK`.
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware. Ledger math must be exact and reproducible, so amounts are
//! integers and the one multiplication the ledger needs (quantity × price)
//! goes through `rust_decimal`.
//!
//! ## Examples
//!
//! ```
//! use dao_registry::types::{Asset, Symbol};
//!
//! let quantity: Asset = "1.0000 DTK".parse().unwrap();
//! let price: Asset = "0.1000 TLOS".parse().unwrap();
//!
//! let total = quantity.checked_mul_price(&price).unwrap();
//! assert_eq!(total.to_string(), "0.1000 TLOS");
//! assert_eq!(total.symbol, "4,TLOS".parse::<Symbol>().unwrap());
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use ssz_rs::prelude::*;

use crate::error::RegistryError;

/// Largest supported precision
pub const MAX_PRECISION: u8 = 18;

/// Longest supported symbol code
pub const MAX_CODE_LEN: usize = 7;

// ============================================================================
// Symbol
// ============================================================================

/// Token symbol: precision in the low byte, upper-case code in the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SimpleSerialize)]
pub struct Symbol {
    /// Packed representation
    pub raw: u64,
}

impl Symbol {
    /// Build a symbol from a precision and a code such as `"DTK"`
    pub fn new(precision: u8, code: &str) -> Result<Self, RegistryError> {
        let invalid = || RegistryError::InvalidSymbol(format!("{},{}", precision, code));

        if precision > MAX_PRECISION || code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(invalid());
        }

        let mut raw = precision as u64;
        for (i, c) in code.bytes().enumerate() {
            if !c.is_ascii_uppercase() {
                return Err(invalid());
            }
            raw |= (c as u64) << (8 * (i + 1));
        }

        Ok(Self { raw })
    }

    /// Build a symbol in a const context
    ///
    /// Invalid input panics, which is a compile error in a `const`.
    pub const fn constant(precision: u8, code: &str) -> Self {
        let bytes = code.as_bytes();
        assert!(precision <= MAX_PRECISION, "precision out of range");
        assert!(!bytes.is_empty() && bytes.len() <= MAX_CODE_LEN, "invalid code length");

        let mut raw = precision as u64;
        let mut i = 0;
        while i < bytes.len() {
            assert!(bytes[i].is_ascii_uppercase(), "invalid code character");
            raw |= (bytes[i] as u64) << (8 * (i + 1));
            i += 1;
        }

        Self { raw }
    }

    /// Number of decimal places
    #[inline]
    pub fn precision(&self) -> u8 {
        (self.raw & 0xff) as u8
    }

    /// Packed code without the precision byte
    ///
    /// Two symbols with the same code and different precision share this value.
    #[inline]
    pub fn code_raw(&self) -> u64 {
        self.raw >> 8
    }

    /// Token code as text (e.g. `"DTK"`)
    pub fn code(&self) -> String {
        let mut tmp = self.code_raw();
        let mut code = String::new();
        while tmp > 0 {
            code.push((tmp & 0xff) as u8 as char);
            tmp >>= 8;
        }
        code
    }

    /// 10^precision, the number of smallest units in one whole token
    #[inline]
    pub fn unit(&self) -> u64 {
        10u64.pow(self.precision() as u32)
    }
}

impl FromStr for Symbol {
    type Err = RegistryError;

    /// Parse `"4,DTK"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| RegistryError::InvalidSymbol(s.to_string()))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| RegistryError::InvalidSymbol(s.to_string()))?;
        Symbol::new(precision, code.trim())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

// ============================================================================
// Asset
// ============================================================================

/// An amount of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SimpleSerialize)]
pub struct Asset {
    /// Amount in smallest units (scaled by 10^precision)
    pub amount: u64,

    /// Token symbol
    pub symbol: Symbol,
}

impl Asset {
    /// Create an asset from a raw amount
    pub fn new(amount: u64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// Zero amount of the given symbol
    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Amount as a Decimal carrying the symbol's scale
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.amount as i128, self.symbol.precision() as u32)
    }

    /// Add two assets of the same symbol
    ///
    /// # Returns
    ///
    /// * `Err(PrecisionMismatch)` - If the symbols differ
    /// * `Err(Overflow)` - If the sum exceeds u64
    pub fn checked_add(&self, other: &Asset) -> Result<Asset, RegistryError> {
        self.ensure_same_symbol(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(RegistryError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Subtract `other` from `self`
    ///
    /// Returns `None` when the result would be negative; the caller decides
    /// which error that is.
    pub fn checked_sub(&self, other: &Asset) -> Result<Option<Asset>, RegistryError> {
        self.ensure_same_symbol(other)?;
        Ok(self
            .amount
            .checked_sub(other.amount)
            .map(|amount| Asset::new(amount, self.symbol)))
    }

    /// Value of `self` units at `price` per whole unit
    ///
    /// The product is truncated toward zero to the price's precision.
    ///
    /// # Example
    ///
    /// ```
    /// use dao_registry::types::Asset;
    ///
    /// let qty: Asset = "2.5000 DTK".parse().unwrap();
    /// let price: Asset = "0.3333 TLOS".parse().unwrap();
    /// // 2.5 * 0.3333 = 0.83325 -> 0.8332
    /// assert_eq!(qty.checked_mul_price(&price).unwrap().to_string(), "0.8332 TLOS");
    /// ```
    pub fn checked_mul_price(&self, price: &Asset) -> Result<Asset, RegistryError> {
        let product = self
            .to_decimal()
            .checked_mul(price.to_decimal())
            .ok_or(RegistryError::Overflow)?;
        let truncated =
            product.round_dp_with_strategy(price.symbol.precision() as u32, RoundingStrategy::ToZero);
        let scaled = truncated
            .checked_mul(Decimal::from(price.symbol.unit()))
            .ok_or(RegistryError::Overflow)?;
        let amount = scaled.trunc().to_u64().ok_or(RegistryError::Overflow)?;
        Ok(Asset::new(amount, price.symbol))
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<(), RegistryError> {
        if self.symbol != other.symbol {
            return Err(RegistryError::PrecisionMismatch {
                expected: self.symbol,
                found: other.symbol,
            });
        }
        Ok(())
    }
}

impl FromStr for Asset {
    type Err = RegistryError;

    /// Parse `"100.0000 DTK"`
    ///
    /// The number of fraction digits sets the precision. Negative amounts
    /// are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidAsset(s.to_string());

        let (amount, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        if amount.starts_with('-') || amount.starts_with('+') {
            return Err(invalid());
        }

        let precision = match amount.split_once('.') {
            Some((_, frac)) if frac.is_empty() => return Err(invalid()),
            Some((_, frac)) => frac.len(),
            None => 0,
        };
        if precision > MAX_PRECISION as usize {
            return Err(invalid());
        }

        let decimal = Decimal::from_str(amount).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision as u8, code.trim())?;

        let mut units = decimal;
        units.rescale(precision as u32);
        let amount = u64::try_from(units.mantissa()).map_err(|_| invalid())?;

        Ok(Asset::new(amount, symbol))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision() as usize;
        write!(f, "{:.*} {}", precision, self.to_decimal(), self.symbol.code())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
