//! # Code Module
//!
//! Provides the `Code` type: a fixed-width string of `0`/`1` digits where a
//! `1` at position *i* means base item *i* is part of the combination.
//!
//! ## Why Digits Instead of a Bitmask?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE STORED FORM                                                        │
//! │                                                                         │
//! │  Code "0000100010"  ← position 4 and position 8 set                     │
//! │                                                                         │
//! │  Persisted as the integer 100010: leading zeros are lost, so the        │
//! │  width has to be restored from the catalog when reading it back.        │
//! │                                                                         │
//! │  Position 0 is the LEFTMOST digit. The digit string is literally the    │
//! │  binary expansion of the combination ordinal, zero-padded on the left.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chargecalc_core::code::Code;
//!
//! let code: Code = "000010".parse().unwrap();
//! assert!(code.is_set(4));
//! assert_eq!(code.positions().into_iter().collect::<Vec<_>>(), vec![4]);
//!
//! // Integer column lost the leading zeros
//! let restored = Code::from_stored(10, 6).unwrap();
//! assert_eq!(restored, code);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodeError;
use crate::MAX_CODE_WIDTH;

// =============================================================================
// Code Type
// =============================================================================

/// A positional digit code over the base item catalog.
///
/// Invariant: non-empty, at most [`MAX_CODE_WIDTH`] digits, every digit is
/// `0` or `1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Parses a digit string.
    ///
    /// ## Example
    /// ```rust
    /// use chargecalc_core::code::Code;
    ///
    /// assert!(Code::parse("0101").is_ok());
    /// assert!(Code::parse("0121").is_err());
    /// assert!(Code::parse("").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        let digits = input.trim();

        if digits.is_empty() {
            return Err(CodeError::Empty);
        }

        if digits.len() > MAX_CODE_WIDTH {
            return Err(CodeError::TooWide {
                width: digits.len(),
                max: MAX_CODE_WIDTH,
            });
        }

        if let Some((position, found)) = digits
            .chars()
            .enumerate()
            .find(|(_, c)| *c != '0' && *c != '1')
        {
            return Err(CodeError::InvalidDigit { position, found });
        }

        Ok(Code(digits.to_string()))
    }

    /// Builds the width-`width` code for a combination ordinal.
    ///
    /// The result is the binary expansion of `mask`, left-padded with zeros.
    /// The caller guarantees `mask < 2^width`.
    pub(crate) fn from_mask(mask: u64, width: usize) -> Self {
        Code(format!("{:0width$b}", mask, width = width))
    }

    /// Encodes a set of positions as a code of the given width.
    ///
    /// ## Example
    /// ```rust
    /// use chargecalc_core::code::Code;
    ///
    /// let code = Code::from_positions([0, 3], 6).unwrap();
    /// assert_eq!(code.as_str(), "100100");
    /// ```
    pub fn from_positions(
        positions: impl IntoIterator<Item = usize>,
        width: usize,
    ) -> Result<Self, CodeError> {
        if width == 0 {
            return Err(CodeError::Empty);
        }
        if width > MAX_CODE_WIDTH {
            return Err(CodeError::TooWide {
                width,
                max: MAX_CODE_WIDTH,
            });
        }

        let mut digits = vec![b'0'; width];
        for position in positions {
            let slot = digits
                .get_mut(position)
                .ok_or(CodeError::PositionOutOfRange { position, width })?;
            *slot = b'1';
        }

        Ok(Code(digits.into_iter().map(char::from).collect()))
    }

    /// Restores a code persisted as an integer column.
    ///
    /// Leading zeros are lost in storage, so the decimal digits of `value`
    /// are left-padded back to `width`.
    pub fn from_stored(value: i64, width: usize) -> Result<Self, CodeError> {
        if value < 0 {
            return Err(CodeError::NegativeStored(value));
        }

        let digits = value.to_string();
        if digits.len() > width {
            return Err(CodeError::StoredOverflow { value, width });
        }

        Code::parse(&format!("{:0>width$}", digits, width = width))
    }

    /// The integer form used by the persistence layer.
    ///
    /// A valid code has at most [`MAX_CODE_WIDTH`] digits, which always fits
    /// an `i64`.
    pub fn to_stored(&self) -> i64 {
        self.0
            .bytes()
            .fold(0i64, |acc, digit| acc * 10 + i64::from(digit - b'0'))
    }

    /// The digit string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits.
    #[inline]
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Checks whether the digit at `position` is `1`.
    ///
    /// Positions beyond the width read as `0`.
    pub fn is_set(&self, position: usize) -> bool {
        self.0.as_bytes().get(position) == Some(&b'1')
    }

    /// Positions of every `1` digit, ascending.
    pub fn positions(&self) -> BTreeSet<usize> {
        self.0
            .bytes()
            .enumerate()
            .filter(|(_, digit)| *digit == b'1')
            .map(|(position, _)| position)
            .collect()
    }

    /// True when no digit is set.
    pub fn is_blank(&self) -> bool {
        !self.0.contains('1')
    }

    /// Right-pads with zeros up to `width`.
    ///
    /// Codes already at or beyond `width` are returned unchanged.
    pub fn padded_to(&self, width: usize) -> Code {
        if self.width() >= width {
            return self.clone();
        }
        Code(format!("{:0<width$}", self.0, width = width))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Code::parse(s)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Code::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
