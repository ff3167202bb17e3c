//! Fixed-width big integer arithmetic
//!
//! This module provides `Uint<N>`, an unsigned integer with N 64-bit limbs
//! stored in little-endian limb order. The curve engine only needs 256-bit
//! values (`U256`), but the arithmetic is written generically the same way
//! it would be for any limb count.
//!
//! All modular operations (`mod_add`, `mod_sub`, `mod_pow`, `mod_inverse`)
//! expect their operands already reduced below the modulus unless stated
//! otherwise, and always return a reduced result.

use std::cmp::Ordering;
use std::fmt;

/// Unsigned integer with N 64-bit limbs, little-endian limb order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Uint<const N: usize> {
    limbs: [u64; N],
}

/// 256-bit unsigned integer, the scalar and coordinate type of the engine.
pub type U256 = Uint<4>;

impl<const N: usize> Uint<N> {
    /// Total bit capacity.
    pub const BITS: usize = N * 64;

    #[inline]
    pub const fn zero() -> Self {
        Self { limbs: [0; N] }
    }

    #[inline]
    pub const fn one() -> Self {
        let mut limbs = [0; N];
        limbs[0] = 1;
        Self { limbs }
    }

    #[inline]
    pub const fn from_u64(val: u64) -> Self {
        let mut limbs = [0; N];
        limbs[0] = val;
        Self { limbs }
    }

    /// Parses a big-endian hex string, with or without a `0x` prefix.
    ///
    /// # Panics
    /// Panics on a non-hex character or a literal wider than `Self::BITS`.
    /// Intended for compile-time-known constants and test fixtures.
    pub fn from_hex(s: &str) -> Self {
        let s = s.trim().trim_start_matches("0x");
        let mut out = Self::zero();
        for ch in s.chars() {
            let digit = ch
                .to_digit(16)
                .unwrap_or_else(|| panic!("invalid hex digit {ch:?}"));
            for _ in 0..4 {
                let (shifted, carry) = out.overflowing_shl1();
                assert!(!carry, "hex literal exceeds integer capacity");
                out = shifted;
            }
            out.limbs[0] |= digit as u64;
        }
        out
    }

    /// Builds a value from big-endian bytes. Bytes beyond the capacity of
    /// the integer (the most significant ones) are ignored.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut limbs = [0u64; N];
        for (i, &byte) in bytes.iter().rev().enumerate() {
            let limb = i / 8;
            if limb < N {
                limbs[limb] |= (byte as u64) << ((i % 8) * 8);
            }
        }
        Self { limbs }
    }

    /// Serializes to exactly `N * 8` big-endian bytes (fixed width, zero
    /// padded), the encoding the identity digest requires for coordinates.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(N * 8);
        for limb in self.limbs.iter().rev() {
            bytes.extend_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.limbs[0] == 1 && self.limbs[1..].iter().all(|&l| l == 0)
    }

    /// Value of the bit at `idx` (0 = least significant). Out-of-range
    /// indices read as zero.
    #[inline]
    pub fn bit(&self, idx: usize) -> bool {
        if idx >= Self::BITS {
            return false;
        }
        (self.limbs[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Position of the highest set bit plus one; zero for zero.
    pub fn bit_length(&self) -> usize {
        for i in (0..N).rev() {
            if self.limbs[i] != 0 {
                return (i + 1) * 64 - self.limbs[i].leading_zeros() as usize;
            }
        }
        0
    }

    /// The least significant 64 bits.
    #[inline]
    pub fn low_u64(&self) -> u64 {
        self.limbs[0]
    }

    /// Wrapping addition, returning the carry-out.
    pub fn overflowing_add(&self, other: &Self) -> (Self, bool) {
        let mut out = [0u64; N];
        let mut carry = false;
        for i in 0..N {
            let (s1, c1) = self.limbs[i].overflowing_add(other.limbs[i]);
            let (s2, c2) = s1.overflowing_add(carry as u64);
            out[i] = s2;
            carry = c1 | c2;
        }
        (Self { limbs: out }, carry)
    }

    /// Wrapping subtraction, returning the borrow-out.
    pub fn overflowing_sub(&self, other: &Self) -> (Self, bool) {
        let mut out = [0u64; N];
        let mut borrow = false;
        for i in 0..N {
            let (d1, b1) = self.limbs[i].overflowing_sub(other.limbs[i]);
            let (d2, b2) = d1.overflowing_sub(borrow as u64);
            out[i] = d2;
            borrow = b1 | b2;
        }
        (Self { limbs: out }, borrow)
    }

    /// Shift left by one bit, returning the bit shifted out of the top.
    pub fn overflowing_shl1(&self) -> (Self, bool) {
        let mut out = [0u64; N];
        let mut carry = 0u64;
        for i in 0..N {
            out[i] = (self.limbs[i] << 1) | carry;
            carry = self.limbs[i] >> 63;
        }
        (Self { limbs: out }, carry != 0)
    }

    /// Shift right by one bit.
    pub fn shr1(&self) -> Self {
        let mut out = [0u64; N];
        for i in 0..N {
            out[i] = self.limbs[i] >> 1;
            if i + 1 < N {
                out[i] |= self.limbs[i + 1] << 63;
            }
        }
        Self { limbs: out }
    }

    /// Shift right by one bit with a carry entering the top bit; used for
    /// halving (N*64 + 1)-bit intermediates in the binary inverse.
    fn shr1_with_carry(&self, carry: bool) -> Self {
        let mut out = self.shr1();
        out.limbs[N - 1] |= (carry as u64) << 63;
        out
    }

    /// `self mod m`, for arbitrary (not necessarily reduced) `self`.
    ///
    /// Bit-serial reduction. The modulus may occupy the full bit width, so
    /// doubling the remainder can overflow; the shifted-out carry feeds the
    /// correction step.
    pub fn reduce(&self, m: &Self) -> Self {
        debug_assert!(!m.is_zero(), "reduction modulo zero");
        if self < m {
            return *self;
        }
        let mut r = Self::zero();
        for i in (0..self.bit_length()).rev() {
            let (shifted, carry) = r.overflowing_shl1();
            r = if carry || shifted >= *m {
                shifted.overflowing_sub(m).0
            } else {
                shifted
            };
            if self.bit(i) {
                let (sum, c) = r.overflowing_add(&Self::one());
                r = if c || sum >= *m {
                    sum.overflowing_sub(m).0
                } else {
                    sum
                };
            }
        }
        r
    }

    /// `(self + other) mod m`, operands reduced.
    pub fn mod_add(&self, other: &Self, m: &Self) -> Self {
        let (sum, carry) = self.overflowing_add(other);
        if carry || sum >= *m {
            sum.overflowing_sub(m).0
        } else {
            sum
        }
    }

    /// `(self - other) mod m`, operands reduced.
    pub fn mod_sub(&self, other: &Self, m: &Self) -> Self {
        if self >= other {
            self.overflowing_sub(other).0
        } else {
            m.overflowing_sub(other).0.overflowing_add(self).0
        }
    }

    /// `(self * other) mod m` via double-and-add over the bits of `self`,
    /// most significant first. Operands need not be reduced.
    pub fn mod_mul(&self, other: &Self, m: &Self) -> Self {
        let a = self.reduce(m);
        let b = other.reduce(m);
        let mut r = Self::zero();
        for i in (0..a.bit_length()).rev() {
            r = r.mod_add(&r, m);
            if a.bit(i) {
                r = r.mod_add(&b, m);
            }
        }
        r
    }

    /// `self^exp mod m` by square-and-multiply, most significant bit first.
    pub fn mod_pow(&self, exp: &Self, m: &Self) -> Self {
        if m.is_one() {
            return Self::zero();
        }
        let base = self.reduce(m);
        let mut r = Self::one();
        for i in (0..exp.bit_length()).rev() {
            r = r.mod_mul(&r, m);
            if exp.bit(i) {
                r = r.mod_mul(&base, m);
            }
        }
        r
    }

    /// Modular multiplicative inverse by the binary extended Euclidean
    /// algorithm. Requires an odd modulus (both the field prime and the
    /// group order are odd). Returns `None` when `self ≡ 0 (mod m)` or no
    /// inverse exists.
    pub fn mod_inverse(&self, m: &Self) -> Option<Self> {
        if m.is_zero() || !m.bit(0) {
            return None;
        }
        let a = self.reduce(m);
        if a.is_zero() {
            return None;
        }

        // Invariants: x1 * a ≡ u (mod m), x2 * a ≡ v (mod m).
        let mut u = a;
        let mut v = *m;
        let mut x1 = Self::one();
        let mut x2 = Self::zero();

        while !u.is_one() && !v.is_one() {
            while !u.bit(0) {
                u = u.shr1();
                x1 = if x1.bit(0) {
                    let (sum, carry) = x1.overflowing_add(m);
                    sum.shr1_with_carry(carry)
                } else {
                    x1.shr1()
                };
            }
            while !v.bit(0) {
                v = v.shr1();
                x2 = if x2.bit(0) {
                    let (sum, carry) = x2.overflowing_add(m);
                    sum.shr1_with_carry(carry)
                } else {
                    x2.shr1()
                };
            }
            if u >= v {
                u = u.overflowing_sub(&v).0;
                x1 = x1.mod_sub(&x2, m);
            } else {
                v = v.overflowing_sub(&u).0;
                x2 = x2.mod_sub(&x1, m);
            }
            // A zero here means gcd(a, m) > 1: no inverse exists.
            if u.is_zero() || v.is_zero() {
                return None;
            }
        }

        Some(if u.is_one() { x1 } else { x2 })
    }
}

impl<const N: usize> Ord for Uint<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..N).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl<const N: usize> PartialOrd for Uint<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> fmt::Debug for Uint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint<{N}>(0x")?;
        for limb in self.limbs.iter().rev() {
            write!(f, "{limb:016x}")?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> fmt::Display for Uint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        let mut started = false;
        for &limb in self.limbs.iter().rev() {
            if started {
                write!(f, "{limb:016x}")?;
            } else if limb != 0 {
                write!(f, "{limb:x}")?;
                started = true;
            }
        }
        if !started {
            write!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_one_basics() {
        assert!(U256::zero().is_zero());
        assert!(U256::one().is_one());
        assert!(!U256::one().is_zero());
        assert_eq!(U256::from_u64(7).low_u64(), 7);
    }

    #[test]
    fn hex_round_trip() {
        let v = U256::from_hex("8542D69E4C044F18E8B92435BF6FF7DE457283915C45517D722EDB8B08F1DFC3");
        let bytes = v.to_be_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[0], 0x85);
        assert_eq!(bytes[31], 0xC3);
        assert_eq!(U256::from_be_bytes(&bytes), v);
    }

    #[test]
    fn hex_accepts_prefix_and_case() {
        assert_eq!(U256::from_hex("0xff"), U256::from_u64(255));
        assert_eq!(U256::from_hex("FF"), U256::from_u64(255));
    }

    #[test]
    fn add_sub_carry_chain() {
        let max = U256::from_u64(u64::MAX);
        let (sum, carry) = max.overflowing_add(&U256::one());
        assert!(!carry);
        assert!(sum.bit(64));
        assert_eq!(sum.overflowing_sub(&U256::one()).0, max);

        let (_, borrow) = U256::zero().overflowing_sub(&U256::one());
        assert!(borrow);
    }

    #[test]
    fn bit_length_and_shifts() {
        assert_eq!(U256::zero().bit_length(), 0);
        assert_eq!(U256::one().bit_length(), 1);
        assert_eq!(U256::from_u64(0x100).bit_length(), 9);
        assert_eq!(U256::from_u64(0x100).shr1(), U256::from_u64(0x80));

        let (v, carry) = U256::from_u64(3).overflowing_shl1();
        assert_eq!(v, U256::from_u64(6));
        assert!(!carry);
    }

    #[test]
    fn shr1_crosses_limbs() {
        let mut v = U256::one();
        for _ in 0..64 {
            v = v.overflowing_shl1().0;
        }
        assert!(v.bit(64));
        assert!(v.shr1().bit(63));
    }

    #[test]
    fn reduce_small_and_wide() {
        let m = U256::from_u64(97);
        assert_eq!(U256::from_u64(100).reduce(&m), U256::from_u64(3));
        assert_eq!(U256::from_u64(96).reduce(&m), U256::from_u64(96));

        // Modulus above half the bit width exercises the doubling carry.
        let wide =
            U256::from_hex("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7");
        let x = U256::from_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");
        let r = x.reduce(&wide);
        assert!(r < wide);
        // x - r must be a multiple of the modulus.
        let mut back = r;
        while back < x {
            back = back.overflowing_add(&wide).0;
        }
        assert_eq!(back, x);
    }

    #[test]
    fn modular_add_sub_wrap() {
        let m = U256::from_u64(97);
        let a = U256::from_u64(90);
        let b = U256::from_u64(20);
        assert_eq!(a.mod_add(&b, &m), U256::from_u64(13));
        assert_eq!(b.mod_sub(&a, &m), U256::from_u64(27));
    }

    #[test]
    fn modular_mul_pow() {
        let m = U256::from_u64(97);
        assert_eq!(
            U256::from_u64(13).mod_mul(&U256::from_u64(29), &m),
            U256::from_u64(13 * 29 % 97)
        );
        // Fermat: a^(p-1) = 1 mod p
        assert_eq!(
            U256::from_u64(5).mod_pow(&U256::from_u64(96), &m),
            U256::one()
        );
    }

    #[test]
    fn inverse_matches_fermat_exponentiation() {
        // Callers may not assume an algorithm, only the postcondition: the
        // binary-EEA result must agree with a^(p-2) for a prime modulus.
        let p = U256::from_hex("8542D69E4C044F18E8B92435BF6FF7DE457283915C45517D722EDB8B08F1DFC3");
        let p_minus_2 = p.overflowing_sub(&U256::from_u64(2)).0;
        for seed in [2u64, 3, 65537, 0xDEADBEEF] {
            let a = U256::from_u64(seed).mod_mul(&p_minus_2, &p);
            let inv = a.mod_inverse(&p).unwrap();
            assert_eq!(inv, a.mod_pow(&p_minus_2, &p));
            assert!(a.mod_mul(&inv, &p).is_one());
        }
    }

    #[test]
    fn inverse_of_zero_is_none() {
        let p = U256::from_u64(97);
        assert_eq!(U256::zero().mod_inverse(&p), None);
        assert_eq!(U256::from_u64(97).mod_inverse(&p), None);
        // even modulus unsupported by the binary algorithm
        assert_eq!(U256::from_u64(3).mod_inverse(&U256::from_u64(8)), None);
    }

    #[test]
    fn inverse_none_when_not_coprime() {
        let m = U256::from_u64(15);
        assert_eq!(U256::from_u64(5).mod_inverse(&m), None);
        assert_eq!(U256::from_u64(2).mod_inverse(&m), Some(U256::from_u64(8)));
    }

    #[test]
    fn ordering_is_limbwise_from_top() {
        let small = U256::from_u64(u64::MAX);
        let big = small.overflowing_add(&U256::one()).0;
        assert!(small < big);
        assert!(big > small);
        assert_eq!(big.cmp(&big), Ordering::Equal);
    }
}
