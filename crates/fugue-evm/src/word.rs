//! 256-bit word arithmetic
//!
//! Everything here wraps modulo 2^256 and never fails. Signed opcodes read the
//! same bits as two's complement on demand.

use fugue_primitives::{U256, U512};

/// Bit pattern of the most negative signed word
pub const SIGN_BIT: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

/// 1 for true, 0 for false
pub fn from_bool(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Narrow to `usize` if the value fits
pub fn to_usize(value: U256) -> Option<usize> {
    if value > U256::from(u64::MAX) {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}

/// Narrow to `u64`, clamping at `u64::MAX`
pub fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.low_u64()
    }
}

// ==================== Unsigned ====================

/// Wrapping addition
pub fn add(a: U256, b: U256) -> U256 {
    a.overflowing_add(b).0
}

/// Wrapping subtraction
pub fn sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

/// Wrapping multiplication
pub fn mul(a: U256, b: U256) -> U256 {
    a.overflowing_mul(b).0
}

/// Division, zero when dividing by zero
pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a / b
    }
}

/// Remainder, zero when dividing by zero
pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a % b
    }
}

/// (a + b) % n without intermediate overflow
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow((U512::from(a) + U512::from(b)) % U512::from(n))
}

/// (a * b) % n without intermediate overflow
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow(a.full_mul(b) % U512::from(n))
}

fn narrow(value: U512) -> U256 {
    // callers only pass values already reduced below a 256-bit modulus
    U256::try_from(value).unwrap_or_default()
}

/// base^exponent modulo 2^256
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Number of significant bytes in the exponent, used for EXP pricing
pub fn byte_len(value: U256) -> u64 {
    (value.bits() as u64).div_ceil(8)
}

// ==================== Signed ====================

/// Sign bit set
pub fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Two's complement negation
pub fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}

/// Signed division truncating toward zero; `MIN / -1` wraps to `MIN`
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(a) != is_negative(b) {
        negate(quotient)
    } else {
        quotient
    }
}

/// Signed remainder taking the sign of the dividend
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(a) {
        negate(remainder)
    } else {
        remainder
    }
}

/// Signed less-than
pub fn slt(a: U256, b: U256) -> bool {
    (a ^ SIGN_BIT) < (b ^ SIGN_BIT)
}

/// Signed greater-than
pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

/// Extend the sign of the low `byte + 1` bytes of `value`
pub fn signextend(byte: U256, value: U256) -> U256 {
    if byte >= U256::from(31) {
        return value;
    }
    let bit = byte.low_u64() as usize * 8 + 7;
    let mask = (U256::one() << (bit + 1)) - U256::one();
    if value.bit(bit) {
        value | !mask
    } else {
        value & mask
    }
}

// ==================== Bitwise ====================

/// Byte `index` of `value`, 0 being the most significant
pub fn byte(index: U256, value: U256) -> U256 {
    if index >= U256::from(32) {
        return U256::zero();
    }
    U256::from(value.byte(31 - index.low_u64() as usize))
}

/// Logical shift left
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.low_u64() as usize
    }
}

/// Logical shift right
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.low_u64() as usize
    }
}

/// Arithmetic shift right
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u64() as usize;
    if negative {
        !((!value) >> shift)
    } else {
        value >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn w(n: u64) -> U256 {
        U256::from(n)
    }

    fn neg(n: u64) -> U256 {
        negate(w(n))
    }

    #[test]
    fn test_sub_wraps_to_all_ones() {
        assert_eq!(sub(U256::zero(), U256::one()), U256::MAX);
        assert_eq!(add(U256::MAX, w(2)), w(1));
        assert_eq!(mul(U256::MAX, w(2)), U256::MAX - w(1));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(div(w(10), U256::zero()), U256::zero());
        assert_eq!(rem(w(10), U256::zero()), U256::zero());
        assert_eq!(sdiv(w(10), U256::zero()), U256::zero());
        assert_eq!(smod(w(10), U256::zero()), U256::zero());
        assert_eq!(addmod(w(1), w(2), U256::zero()), U256::zero());
        assert_eq!(mulmod(w(1), w(2), U256::zero()), U256::zero());
    }

    #[test]
    fn test_signed_division() {
        assert_eq!(sdiv(neg(10), w(3)), neg(3));
        assert_eq!(sdiv(w(10), neg(3)), neg(3));
        assert_eq!(sdiv(neg(10), neg(3)), w(3));
        // MIN / -1 overflows back to MIN
        assert_eq!(sdiv(SIGN_BIT, U256::MAX), SIGN_BIT);
    }

    #[test]
    fn test_signed_modulo_follows_dividend() {
        assert_eq!(smod(neg(8), w(3)), neg(2));
        assert_eq!(smod(w(8), neg(3)), w(2));
    }

    #[test]
    fn test_addmod_mulmod_no_overflow() {
        assert_eq!(addmod(U256::MAX, w(2), w(2)), w(1));
        assert_eq!(mulmod(U256::MAX, U256::MAX, w(12)), w(9));
        assert_eq!(addmod(w(10), w(10), w(8)), w(4));
    }

    #[test]
    fn test_exp() {
        assert_eq!(exp(w(2), w(10)), w(1024));
        assert_eq!(exp(w(2), w(256)), U256::zero());
        assert_eq!(exp(U256::zero(), U256::zero()), w(1));
        assert_eq!(byte_len(U256::zero()), 0);
        assert_eq!(byte_len(w(0xff)), 1);
        assert_eq!(byte_len(w(0x100)), 2);
        assert_eq!(byte_len(U256::MAX), 32);
    }

    #[test]
    fn test_signed_comparison() {
        assert!(slt(neg(1), w(0)));
        assert!(!slt(w(0), neg(1)));
        assert!(sgt(w(1), neg(5)));
        assert!(slt(SIGN_BIT, neg(1)));
    }

    #[test]
    fn test_signextend() {
        assert_eq!(signextend(U256::zero(), w(0xff)), U256::MAX);
        assert_eq!(signextend(U256::zero(), w(0x7f)), w(0x7f));
        assert_eq!(signextend(w(1), w(0x1_8000)), neg(0x8000));
        assert_eq!(signextend(w(31), w(0xff)), w(0xff));
        assert_eq!(signextend(U256::MAX, w(0xff)), w(0xff));
    }

    #[test]
    fn test_byte() {
        let value = U256::from_big_endian(&[0xaa; 1]) << 248;
        assert_eq!(byte(U256::zero(), value), w(0xaa));
        assert_eq!(byte(w(31), w(0x12)), w(0x12));
        assert_eq!(byte(w(32), U256::MAX), U256::zero());
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(w(4), w(1)), w(16));
        assert_eq!(shl(w(256), w(1)), U256::zero());
        assert_eq!(shr(w(4), w(16)), w(1));
        assert_eq!(shr(U256::MAX, U256::MAX), U256::zero());
        assert_eq!(sar(w(4), neg(16)), neg(1));
        assert_eq!(sar(w(300), neg(16)), U256::MAX);
        assert_eq!(sar(w(300), w(16)), U256::zero());
        assert_eq!(sar(U256::zero(), neg(3)), neg(3));
    }

    #[test]
    fn test_to_usize() {
        assert_eq!(to_usize(w(42)), Some(42));
        assert_eq!(to_usize(U256::MAX), None);
        assert_eq!(saturating_u64(U256::MAX), u64::MAX);
        assert_eq!(saturating_u64(w(7)), 7);
    }

    fn any_word() -> impl Strategy<Value = U256> {
        any::<[u64; 4]>().prop_map(U256)
    }

    proptest! {
        #[test]
        fn add_matches_512_bit_reference(a in any_word(), b in any_word()) {
            let wide = (U512::from(a) + U512::from(b)) % (U512::from(U256::MAX) + U512::one());
            prop_assert_eq!(U512::from(add(a, b)), wide);
        }

        #[test]
        fn sub_inverts_add(a in any_word(), b in any_word()) {
            prop_assert_eq!(sub(add(a, b), b), a);
        }

        #[test]
        fn sdiv_smod_recompose(a in any_word(), b in any_word()) {
            prop_assume!(!b.is_zero());
            prop_assume!(!(a == SIGN_BIT && b == U256::MAX));
            prop_assert_eq!(add(mul(sdiv(a, b), b), smod(a, b)), a);
        }
    }
}
