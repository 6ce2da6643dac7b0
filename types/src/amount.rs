//! Token amount type.
//!
//! Amounts are represented as unsigned integers (u128) in the token's smallest
//! unit (wei for the native asset). Negative amounts are unrepresentable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::ParseError;

/// An amount of some token, in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Raw units in one whole native token (10^18 wei).
    pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// `whole` native tokens expressed in wei, or `None` on overflow.
    pub fn from_ether(whole: u128) -> Option<Self> {
        whole.checked_mul(Self::WEI_PER_ETHER).map(Self)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a decimal raw amount. Underscores are accepted as digit separators
/// (`1_000`), and an `ether` suffix scales by 10^18 (`"2 ether"`).
impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, ether) = match trimmed.strip_suffix("ether") {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };
        let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
        if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidAmount(s.to_string()));
        }
        let raw: u128 = cleaned
            .parse()
            .map_err(|_| ParseError::InvalidAmount(s.to_string()))?;
        if ether {
            Self::from_ether(raw).ok_or_else(|| ParseError::InvalidAmount(s.to_string()))
        } else {
            Ok(Self(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_separated_digits() {
        assert_eq!("42".parse::<Amount>().unwrap(), Amount::new(42));
        assert_eq!("1_000_000".parse::<Amount>().unwrap(), Amount::new(1_000_000));
    }

    #[test]
    fn parses_ether_suffix() {
        assert_eq!(
            "1 ether".parse::<Amount>().unwrap(),
            Amount::new(Amount::WEI_PER_ETHER)
        );
        assert_eq!("0ether".parse::<Amount>().unwrap(), Amount::ZERO);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!("-5".parse::<Amount>().is_err());
        assert!("12abc".parse::<Amount>().is_err());
        assert!("1e18".parse::<Amount>().is_err());
    }

    #[test]
    fn checked_sub_refuses_to_go_negative() {
        assert_eq!(Amount::new(3).checked_sub(Amount::new(4)), None);
        assert_eq!(Amount::new(4).checked_sub(Amount::new(4)), Some(Amount::ZERO));
    }
}
