//! Wide-intermediate integer arithmetic for share computation.
//!
//! A pro-rata share `value × part / whole` overflows u128 long before its
//! result does (wei-denominated reserves times stake-seconds), so the product
//! is carried in 256 bits. Stake-seconds themselves (`amount × elapsed`)
//! can also exceed u128 for large-supply tokens, so they are [`U256`].

use std::fmt;

/// Compute `floor(a × b / d)` with a 256-bit intermediate product.
///
/// Returns `None` if `d == 0` or the quotient does not fit in u128.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Some(lo / d);
    }
    if hi >= d {
        return None;
    }

    // Restoring long division of (hi, lo) by d; the running remainder starts
    // at hi < d and stays below d after every step.
    let mut rem = hi;
    let mut quot: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    Some(quot)
}

/// `floor(a × part / whole)` for 256-bit `part` and `whole`.
///
/// Returns `None` if `whole` is zero or `part > whole`; otherwise the result
/// never exceeds `a`. When `whole` needs more than 128 bits, both operands are
/// shifted right until it fits, which loses at most a couple of units of the
/// result.
pub fn mul_div_wide(a: u128, part: U256, whole: U256) -> Option<u128> {
    if whole.is_zero() || part > whole {
        return None;
    }
    let shift = 128 - whole.hi.leading_zeros();
    let (part, whole) = (part.shr(shift), whole.shr(shift));
    mul_div(a, part.lo, whole.lo)
}

/// An unsigned 256-bit integer, used for stake-second totals.
///
/// Only the operations the ledger needs are provided. Fields are ordered high
/// then low so the derived ordering is numeric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    pub const ZERO: Self = Self { hi: 0, lo: 0 };

    /// The full product `a × b`.
    pub fn mul(a: u128, b: u128) -> Self {
        let (hi, lo) = widening_mul(a, b);
        Self { hi, lo }
    }

    pub fn is_zero(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    /// The value as u128, if it fits.
    pub fn to_u128(self) -> Option<u128> {
        (self.hi == 0).then_some(self.lo)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (lo, carry) = self.lo.overflowing_add(other.lo);
        let hi = self.hi.checked_add(other.hi)?.checked_add(carry as u128)?;
        Some(Self { hi, lo })
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (lo, borrow) = self.lo.overflowing_sub(other.lo);
        let hi = self.hi.checked_sub(other.hi)?.checked_sub(borrow as u128)?;
        Some(Self { hi, lo })
    }

    fn shr(self, shift: u32) -> Self {
        match shift {
            0 => self,
            1..=127 => Self {
                hi: self.hi >> shift,
                lo: (self.lo >> shift) | (self.hi << (128 - shift)),
            },
            128 => Self { hi: 0, lo: self.hi },
            _ => Self::ZERO,
        }
    }

    /// Divide by a 64-bit value, returning quotient and remainder.
    fn div_rem_u64(self, d: u64) -> (Self, u64) {
        let d = d as u128;
        let limbs = [
            (self.hi >> 64) as u64,
            self.hi as u64,
            (self.lo >> 64) as u64,
            self.lo as u64,
        ];
        let mut out = [0u64; 4];
        let mut rem: u128 = 0;
        for (i, limb) in limbs.iter().enumerate() {
            let cur = (rem << 64) | *limb as u128;
            out[i] = (cur / d) as u64;
            rem = cur % d;
        }
        let quot = Self {
            hi: ((out[0] as u128) << 64) | out[1] as u128,
            lo: ((out[2] as u128) << 64) | out[3] as u128,
        };
        (quot, rem as u64)
    }
}

impl From<u128> for U256 {
    fn from(lo: u128) -> Self {
        Self { hi: 0, lo }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(small) = self.to_u128() {
            return write!(f, "{small}");
        }
        // Peel off 19 decimal digits at a time.
        const CHUNK: u64 = 10_000_000_000_000_000_000;
        let mut chunks = Vec::new();
        let mut rest = *self;
        while !rest.is_zero() {
            let (q, r) = rest.div_rem_u64(CHUNK);
            chunks.push(r);
            rest = q;
        }
        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for chunk in iter {
            write!(f, "{chunk:019}")?;
        }
        Ok(())
    }
}

/// Full 256-bit product of two u128 values as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a0, a1) = (a & MASK, a >> 64);
    let (b0, b1) = (b & MASK, b >> 64);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let (mid, mid_carry) = p01.overflowing_add(p10);
    let (lo, lo_carry) = p00.overflowing_add(mid << 64);
    let hi = p11 + (mid >> 64) + ((mid_carry as u128) << 64) + lo_carry as u128;
    (hi, lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_match_native_arithmetic() {
        assert_eq!(mul_div(10, 20, 3), Some(66));
        assert_eq!(mul_div(0, u128::MAX, 7), Some(0));
        assert_eq!(mul_div(7, 7, 49), Some(1));
    }

    #[test]
    fn divide_by_zero_is_none() {
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn wide_product_divides_back_down() {
        // (2^127)(2^127) / 2^127 = 2^127
        let x = 1u128 << 127;
        assert_eq!(mul_div(x, x, x), Some(x));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
    }

    #[test]
    fn share_of_wei_reserve_does_not_overflow() {
        // 10^21 wei reserve, share 1/3 of a 10^27 stake-second total.
        let reserve = 1_000_000_000_000_000_000_000u128;
        let whole = 3_000_000_000_000_000_000_000_000_000u128;
        let part = whole / 3;
        assert_eq!(mul_div(reserve, part, whole), Some(reserve / 3));
    }

    #[test]
    fn quotient_overflow_is_none() {
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn wide_product_keeps_high_bits() {
        let p = U256::mul(u128::MAX, 2);
        assert_eq!(p.to_u128(), None);
        assert_eq!(p.checked_sub(U256::from(u128::MAX)), Some(U256::from(u128::MAX)));
        assert_eq!(U256::mul(u128::MAX, u128::MAX).checked_add(U256::mul(u128::MAX, u128::MAX)), None);
    }

    #[test]
    fn subtraction_borrows_across_halves() {
        let big = U256::mul(1u128 << 64, 1u128 << 64); // 2^128
        assert_eq!(big.checked_sub(U256::from(1)), Some(U256::from(u128::MAX)));
        assert_eq!(U256::from(1).checked_sub(big), None);
    }

    #[test]
    fn display_prints_full_decimal() {
        assert_eq!(U256::from(604_800).to_string(), "604800");
        // 2^128 = 340282366920938463463374607431768211456
        let big = U256::mul(1u128 << 64, 1u128 << 64);
        assert_eq!(big.to_string(), "340282366920938463463374607431768211456");
        // 10^19 · 10^19 = 10^38 still fits; 10^20 · 10^19 does not.
        let wide = U256::mul(100_000_000_000_000_000_000, 10_000_000_000_000_000_000);
        assert_eq!(wide.to_string(), format!("1{}", "0".repeat(39)));
    }

    #[test]
    fn wide_share_matches_narrow_when_it_fits() {
        assert_eq!(
            mul_div_wide(900, U256::from(1), U256::from(3)),
            mul_div(900, 1, 3)
        );
        assert_eq!(mul_div_wide(10, U256::ZERO, U256::ZERO), None);
        assert_eq!(mul_div_wide(10, U256::from(4), U256::from(3)), None);
    }

    #[test]
    fn wide_share_of_oversized_weights() {
        // Both weights far beyond u128; part is a quarter of whole.
        let whole = U256::mul(u128::MAX, 4_000_000);
        let part = U256::mul(u128::MAX, 1_000_000);
        let share = mul_div_wide(1_000_000, part, whole).unwrap();
        assert!((249_998..=250_000).contains(&share), "share {share}");
        assert_eq!(mul_div_wide(777, whole, whole), Some(777));
    }
}
