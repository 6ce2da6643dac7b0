//! Token identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::error::ParseError;

/// Which asset a stake or pool refers to.
///
/// The zero address names the chain's base currency; every other address names
/// a separately issued token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenId {
    Native,
    Fungible(Address),
}

impl TokenId {
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// False for `Fungible(0x0)`, which names the same asset as `Native`.
    pub fn is_canonical(&self) -> bool {
        *self == Self::from(self.address())
    }

    /// The on-chain address of this token (`0x0` for the native asset).
    pub fn address(&self) -> Address {
        match self {
            Self::Native => Address::ZERO,
            Self::Fungible(addr) => *addr,
        }
    }
}

impl From<Address> for TokenId {
    fn from(addr: Address) -> Self {
        if addr.is_zero() {
            Self::Native
        } else {
            Self::Fungible(addr)
        }
    }
}

impl FromStr for TokenId {
    type Err = ParseError;

    /// Accepts `native`/`eth` or any address; the zero address maps to `Native`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "eth" => Ok(Self::Native),
            _ => s.parse::<Address>().map(Self::from),
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Fungible(addr) => write!(f, "{addr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_native() {
        let t: TokenId = "0x0000000000000000000000000000000000000000".parse().unwrap();
        assert_eq!(t, TokenId::Native);
        assert_eq!(TokenId::from(Address::ZERO), TokenId::Native);
    }

    #[test]
    fn nonzero_address_is_fungible() {
        let t: TokenId = "0x01".parse().unwrap();
        assert_eq!(t, TokenId::Fungible(Address::from_low_u64(1)));
        assert_eq!(t.address(), Address::from_low_u64(1));
        assert!(t.is_canonical());
        assert!(TokenId::Native.is_canonical());
        assert!(!TokenId::Fungible(Address::ZERO).is_canonical());
    }

    #[test]
    fn native_aliases() {
        assert_eq!("native".parse::<TokenId>().unwrap(), TokenId::Native);
        assert_eq!("ETH".parse::<TokenId>().unwrap(), TokenId::Native);
    }
}
