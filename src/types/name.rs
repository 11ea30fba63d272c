//! Account names.
//!
//! ## Encoding
//!
//! A `Name` packs up to 13 characters into a single `u64`, 5 bits per
//! character for the first 12 and 4 bits for the 13th. The alphabet is
//! `.12345abcdefghijklmnopqrstuvwxyz`, so `.` encodes as zero and trailing
//! dots vanish from the text form.
//!
//! Names are used for DAO names, creators, balance owners and token
//! contracts. Because the value is a plain `u64` it orders and hashes
//! cheaply and serializes to 8 bytes with SSZ.
//!
//! ## Example
//!
//! ```
//! use dao_registry::types::Name;
//!
//! let name: Name = "daoregistry".parse().unwrap();
//! assert_eq!(name.to_string(), "daoregistry");
//! ```

use std::fmt;
use std::str::FromStr;

use ssz_rs::prelude::*;

use crate::error::RegistryError;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters in a name
pub const MAX_NAME_LEN: usize = 13;

/// A 64-bit account identifier with a base-32 text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SimpleSerialize)]
pub struct Name {
    /// Packed representation
    pub value: u64,
}

impl Name {
    /// Wrap an already packed value
    pub const fn from_raw(value: u64) -> Self {
        Self { value }
    }

    /// Build a name in a const context
    ///
    /// Only the 12-character form is accepted. Invalid input panics, which
    /// is a compile error when the result is bound to a `const`.
    pub const fn constant(s: &str) -> Self {
        let bytes = s.as_bytes();
        assert!(!bytes.is_empty() && bytes.len() <= 12, "invalid name length");

        let mut value = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            let v = match c {
                b'.' => 0,
                b'1'..=b'5' => (c - b'1') as u64 + 1,
                b'a'..=b'z' => (c - b'a') as u64 + 6,
                _ => panic!("invalid name character"),
            };
            value |= v << (64 - 5 * (i + 1));
            i += 1;
        }

        Self { value }
    }

    /// Check if this is the empty name (all dots)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value == 0
    }
}

fn char_to_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidName(s.to_string());

        if s.is_empty() || s.len() > MAX_NAME_LEN {
            return Err(invalid());
        }

        let bytes = s.as_bytes();
        let mut value = 0u64;

        for (i, &c) in bytes.iter().enumerate().take(12) {
            let v = char_to_value(c).ok_or_else(invalid)?;
            value |= (v & 0x1f) << (64 - 5 * (i + 1));
        }

        if bytes.len() == MAX_NAME_LEN {
            let v = char_to_value(bytes[12]).ok_or_else(invalid)?;
            if v > 0x0f {
                return Err(invalid());
            }
            value |= v;
        }

        let name = Name { value };

        // Rejects trailing dots and other forms that do not round-trip
        if name.to_string() != s {
            return Err(invalid());
        }

        Ok(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.value;

        for i in 0..MAX_NAME_LEN {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }

        let len = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHARMAP is ASCII
        f.write_str(std::str::from_utf8(&out[..len]).map_err(|_| fmt::Error)?)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
