//! Good prices and cart amounts.
//!
//! Prices are whole currency units stored as non-negative integers. Amounts
//! are the number of units of a good in a cart line and are always at least
//! [`Amount::MIN`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The value is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The value does not fit in a database integer.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Maximum allowed price.
        max: i64,
    },
}

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The value is below [`Amount::MIN`].
    #[error("amount must be at least {min}")]
    TooSmall {
        /// Minimum allowed amount.
        min: i64,
    },
    /// The value does not fit in a database integer.
    #[error("amount must be at most {max}")]
    TooLarge {
        /// Maximum allowed amount.
        max: i64,
    },
}

/// Price of a good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i32);

impl Price {
    /// Create a price from a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or exceeds `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, PriceError> {
        if value < 0 {
            return Err(PriceError::Negative);
        }
        i32::try_from(value).map(Self).map_err(|_| PriceError::TooLarge {
            max: i64::from(i32::MAX),
        })
    }

    /// Get the price as an `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0 as i64
    }

    /// Get the price as stored in the database.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Price of `amount` units of this good.
    #[must_use]
    pub const fn times(&self, amount: Amount) -> i64 {
        self.as_i64().saturating_mul(amount.as_i64())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of units of a good in a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i32);

impl Amount {
    /// Smallest amount a cart line may hold.
    pub const MIN: i64 = 1;

    /// Create an amount from a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is below [`Amount::MIN`] or exceeds
    /// `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value < Self::MIN {
            return Err(AmountError::TooSmall { min: Self::MIN });
        }
        i32::try_from(value).map(Self).map_err(|_| AmountError::TooLarge {
            max: i64::from(i32::MAX),
        })
    }

    /// Get the amount as an `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0 as i64
    }

    /// Get the amount as stored in the database.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
