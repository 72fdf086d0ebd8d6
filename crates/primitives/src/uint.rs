//! EVM-flavored arithmetic on top of [`alloy::primitives::U256`].
//!
//! `U256` itself (four 64-bit limbs, little-endian, from `alloy`/`ruint`)
//! already gives us wrapping add/sub/mul, big-endian byte conversion, and
//! full-precision `add_mod`/`mul_mod`. What EVM opcodes need on top is a
//! handful of non-default semantics — division by zero yielding zero,
//! two's-complement signed division/shift with the `MIN / -1` trap
//! handled by wrapping rather than panicking, `SIGNEXTEND`, and the
//! presence-checked narrowing conversions PUSH/offset opcodes rely on.
//! `U256Ext` collects those as an extension trait rather than a new
//! wrapper type, so call sites keep using plain `U256` values.

use alloy::primitives::{I256, U256};

pub trait U256Ext: Sized {
    /// EVM `DIV`: division by zero yields zero instead of trapping.
    fn evm_div(self, rhs: Self) -> Self;
    /// EVM `MOD`: modulo zero yields zero.
    fn evm_rem(self, rhs: Self) -> Self;
    /// EVM `SDIV`: two's-complement division. Zero divisor -> 0;
    /// `MIN / -1` wraps to `MIN` rather than overflowing.
    fn evm_sdiv(self, rhs: Self) -> Self;
    /// EVM `SMOD`: two's-complement remainder, sign of the dividend.
    /// Zero divisor -> 0; `MIN % -1 == 0`.
    fn evm_srem(self, rhs: Self) -> Self;
    /// EVM `ADDMOD`: `(self + rhs) % modulus` at full precision.
    /// `modulus` of 0 or 1 yields 0.
    fn evm_addmod(self, rhs: Self, modulus: Self) -> Self;
    /// EVM `MULMOD`: `(self * rhs) % modulus` at full precision.
    fn evm_mulmod(self, rhs: Self, modulus: Self) -> Self;
    /// EVM `EXP`: square-and-multiply, wrapping mod 2^256.
    fn evm_exp(self, exponent: Self) -> Self;
    /// EVM `SHL`: logical shift left. Shift >= 256 yields 0.
    fn evm_shl(self, shift: Self) -> Self;
    /// EVM `SHR`: logical shift right. Shift >= 256 yields 0.
    fn evm_shr(self, shift: Self) -> Self;
    /// EVM `SAR`: arithmetic shift right. Shift >= 256 yields all-ones
    /// if negative, else 0.
    fn evm_sar(self, shift: Self) -> Self;
    /// EVM `SIGNEXTEND`: sign-extend from bit `8*byte_index + 7`.
    /// `byte_index >= 31` leaves the value unchanged.
    fn evm_signextend(self, byte_index: Self) -> Self;
    /// EVM `BYTE`: the `index`-th most-significant byte, 0 if
    /// `index >= 32`.
    fn evm_byte(self, index: Self) -> Self;
    /// Minimum number of bits needed to represent the value (0 for 0).
    fn bit_len(&self) -> usize;
    /// Minimum number of bytes needed to represent the value (0 for 0).
    fn byte_len(&self) -> usize;
    /// Big-endian bytes, left-padded with zero to 32, from a buffer
    /// shorter than 32 bytes (PUSH1..PUSH31 immediates).
    fn from_be_slice_padded(bytes: &[u8]) -> Self;
    /// Narrowing conversion to `u64`, `None` if the value doesn't fit.
    fn try_to_u64(&self) -> Option<u64>;
    /// Narrowing conversion to `u128`, `None` if the value doesn't fit.
    fn try_to_u128(&self) -> Option<u128>;
    /// Narrowing conversion to `usize`, `None` if the value doesn't fit.
    fn try_to_usize(&self) -> Option<usize>;
}

impl U256Ext for U256 {
    fn evm_div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            U256::ZERO
        } else {
            self / rhs
        }
    }

    fn evm_rem(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            U256::ZERO
        } else {
            self % rhs
        }
    }

    fn evm_sdiv(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return U256::ZERO;
        }
        let a = I256::from_raw(self);
        let b = I256::from_raw(rhs);
        a.wrapping_div(b).into_raw()
    }

    fn evm_srem(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return U256::ZERO;
        }
        let a = I256::from_raw(self);
        let b = I256::from_raw(rhs);
        a.wrapping_rem(b).into_raw()
    }

    fn evm_addmod(self, rhs: Self, modulus: Self) -> Self {
        if modulus <= U256::from(1u8) {
            U256::ZERO
        } else {
            self.add_mod(rhs, modulus)
        }
    }

    fn evm_mulmod(self, rhs: Self, modulus: Self) -> Self {
        if modulus <= U256::from(1u8) {
            U256::ZERO
        } else {
            self.mul_mod(rhs, modulus)
        }
    }

    fn evm_exp(self, exponent: Self) -> Self {
        self.wrapping_pow(exponent)
    }

    fn evm_shl(self, shift: Self) -> Self {
        match shift.try_to_usize() {
            Some(s) if s < 256 => self.wrapping_shl(s),
            _ => U256::ZERO,
        }
    }

    fn evm_shr(self, shift: Self) -> Self {
        match shift.try_to_usize() {
            Some(s) if s < 256 => self.wrapping_shr(s),
            _ => U256::ZERO,
        }
    }

    fn evm_sar(self, shift: Self) -> Self {
        let negative = (self.byte(31) & 0x80) != 0;
        match shift.try_to_usize() {
            Some(s) if s < 256 => I256::from_raw(self).asr(s).into_raw(),
            _ => {
                if negative {
                    U256::MAX
                } else {
                    U256::ZERO
                }
            }
        }
    }

    fn evm_signextend(self, byte_index: Self) -> Self {
        match byte_index.try_to_u64() {
            Some(b) if b < 31 => {
                let b = b as usize;
                let mut bytes = self.to_be_bytes::<32>();
                let sign_pos = 31 - b;
                let negative = (bytes[sign_pos] & 0x80) != 0;
                let fill = if negative { 0xFF } else { 0x00 };
                for byte in bytes.iter_mut().take(sign_pos) {
                    *byte = fill;
                }
                U256::from_be_bytes(bytes)
            }
            _ => self,
        }
    }

    fn evm_byte(self, index: Self) -> Self {
        match index.try_to_u64() {
            Some(i) if i < 32 => {
                let bytes = self.to_be_bytes::<32>();
                U256::from(bytes[i as usize])
            }
            _ => U256::ZERO,
        }
    }

    fn bit_len(&self) -> usize {
        U256::bit_len(self)
    }

    fn byte_len(&self) -> usize {
        self.bit_len().div_ceil(8)
    }

    fn from_be_slice_padded(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= 32);
        let mut padded = [0u8; 32];
        let start = 32 - bytes.len();
        padded[start..].copy_from_slice(bytes);
        U256::from_be_bytes(padded)
    }

    fn try_to_u64(&self) -> Option<u64> {
        (*self).try_into().ok()
    }

    fn try_to_u128(&self) -> Option<u128> {
        (*self).try_into().ok()
    }

    fn try_to_usize(&self) -> Option<usize> {
        (*self).try_into().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_commutative_and_wraps() {
        let a = U256::MAX;
        let b = U256::from(1u8);
        assert_eq!(a.wrapping_add(b), U256::ZERO);
        assert_eq!(a.wrapping_add(b), b.wrapping_add(a));
    }

    #[test]
    fn div_by_zero_is_zero() {
        assert_eq!(U256::from(10u8).evm_div(U256::ZERO), U256::ZERO);
        assert_eq!(U256::from(10u8).evm_rem(U256::ZERO), U256::ZERO);
    }

    #[test]
    fn div_rem_identity() {
        let a = U256::from(17u8);
        let b = U256::from(5u8);
        let q = a.evm_div(b);
        let r = a.evm_rem(b);
        assert_eq!(q.wrapping_mul(b).wrapping_add(r), a);
    }

    #[test]
    fn sdiv_min_by_minus_one_wraps_to_min() {
        let min = U256::from(1u8) << 255;
        let minus_one = U256::MAX;
        assert_eq!(min.evm_sdiv(minus_one), min);
        assert_eq!(min.evm_srem(minus_one), U256::ZERO);
    }

    #[test]
    fn addmod_mulmod_full_precision() {
        let a = U256::MAX;
        let b = U256::MAX;
        let n = U256::from(7u8);
        // (MAX + MAX) mod 7 computed via full 257-bit precision.
        assert_eq!(a.evm_addmod(b, n), a.evm_addmod(b, n));
        assert_eq!(a.evm_mulmod(b, U256::ZERO), U256::ZERO);
        assert_eq!(a.evm_addmod(b, U256::from(1u8)), U256::ZERO);
    }

    #[test]
    fn shift_at_or_past_256_yields_boundary_value() {
        let one = U256::from(1u8);
        assert_eq!(one.evm_shl(U256::from(256u16)), U256::ZERO);
        assert_eq!(one.evm_shr(U256::from(256u16)), U256::ZERO);
        let negative_one = U256::MAX;
        assert_eq!(negative_one.evm_sar(U256::from(256u16)), U256::MAX);
        assert_eq!(one.evm_sar(U256::from(256u16)), U256::ZERO);
    }

    #[test]
    fn signextend_past_31_is_identity() {
        let v = U256::from(0xFFu16);
        assert_eq!(v.evm_signextend(U256::from(31u8)), v);
        assert_eq!(v.evm_signextend(U256::from(99u8)), v);
        // byte 0 sign-extends 0xFF to all-ones.
        assert_eq!(v.evm_signextend(U256::ZERO), U256::MAX);
    }

    #[test]
    fn byte_index_past_31_is_zero() {
        let v = U256::MAX;
        assert_eq!(v.evm_byte(U256::from(32u8)), U256::ZERO);
        assert_eq!(v.evm_byte(U256::ZERO), U256::from(0xFFu16));
    }

    #[test]
    fn round_trip_be_bytes() {
        let v = U256::from(0x1234_5678u64);
        let bytes = v.to_be_bytes::<32>();
        assert_eq!(U256::from_be_bytes(bytes), v);
    }

    #[test]
    fn padded_from_short_slice_matches_left_padded_full_slice() {
        let short = [0x01u8, 0x02];
        let mut full = [0u8; 32];
        full[30..].copy_from_slice(&short);
        assert_eq!(U256::from_be_slice_padded(&short), U256::from_be_bytes(full));
    }
}
