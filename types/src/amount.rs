//! Voting power amounts.
//!
//! The backend counts voting power in integer subunits. Users enter and read
//! decimal amounts, where one whole unit is [`SUBUNIT_SCALE`] subunits.
//! Conversion from a decimal entry is one-way: it floors, so converting the
//! result back and scaling again would not give the same number.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Subunits per whole unit of voting power.
pub const SUBUNIT_SCALE: u64 = 100_000;

/// Number of decimal places represented by [`SUBUNIT_SCALE`].
pub const SUBUNIT_DECIMALS: u32 = 5;

/// An amount of voting power in backend subunits.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VotingPower(u64);

impl VotingPower {
    pub const ZERO: Self = Self(0);

    pub fn from_subunits(raw: u64) -> Self {
        Self(raw)
    }

    pub fn subunits(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Scale a user-entered decimal amount to subunits: `floor(amount * SUBUNIT_SCALE)`.
    pub fn from_decimal(amount: Decimal) -> Result<Self, TypesError> {
        if amount < Decimal::ZERO {
            return Err(TypesError::NegativeAmount(amount.to_string()));
        }
        let scaled = amount
            .checked_mul(Decimal::from(SUBUNIT_SCALE))
            .ok_or_else(|| TypesError::AmountOverflow(amount.to_string()))?
            .floor();
        scaled
            .to_u64()
            .map(Self)
            .ok_or_else(|| TypesError::AmountOverflow(amount.to_string()))
    }

    /// Parse a decimal string as typed by the user and scale it.
    pub fn parse_decimal(input: &str) -> Result<Self, TypesError> {
        let amount = Decimal::from_str(input.trim())
            .map_err(|e| TypesError::InvalidAmount(format!("{input:?}: {e}")))?;
        Self::from_decimal(amount)
    }

    /// The user-facing value, `subunits / SUBUNIT_SCALE`, without trailing zeros.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), SUBUNIT_DECIMALS).normalize()
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for VotingPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}
