//! Arbitrary-precision vote tallies.
//!
//! Vote weights are 128-bit values on chain and tallies are sums of many
//! of them, so they are stored and exchanged as decimal strings and
//! accumulated with a big integer. Negative or non-numeric strings are
//! rejected rather than coerced.

use num_bigint::BigUint;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TallyError {
    #[error("not a non-negative decimal integer: {0:?}")]
    Invalid(String),
}

/// A non-negative, arbitrary-precision vote tally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally(BigUint);

impl Tally {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    /// Parse a decimal string. Only ASCII digits are accepted: signs,
    /// whitespace, and the empty string all fail.
    pub fn parse(input: &str) -> Result<Self, TallyError> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TallyError::Invalid(input.to_string()));
        }
        let value = BigUint::parse_bytes(input.as_bytes(), 10)
            .ok_or_else(|| TallyError::Invalid(input.to_string()))?;
        Ok(Self(value))
    }

    /// Fold another tally into this one.
    pub fn accumulate(&mut self, amount: &Tally) {
        self.0 += &amount.0;
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::default()
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
