//! Scalar multiplication strategies
//!
//! Three interchangeable ways to compute k·P, all reducing k modulo the
//! group order first and all agreeing on the affine result:
//!
//! 1. `mul_binary` — plain double-and-add over the bits of k. The
//!    authoritative reference: key generation derives public keys with it
//!    so correctness never depends on an optimization being bug-free.
//! 2. `mul_wnaf` — windowed non-adjacent form with a per-call table of odd
//!    multiples. Fewer additions than binary for the same scalar.
//! 3. `mul_base` — wNAF over the generator reusing the curve's cached
//!    odd-multiple table, built once per instance.

use crate::bigint::U256;
use crate::curve::{Curve, Jacobian, Point};
use crate::error::Sm2Error;

/// Precomputed odd multiples P, 3P, 5P, …, (2^(w-1)−1)P of a fixed base.
///
/// Immutable after construction and safe to share read-only across
/// concurrent signing operations.
#[derive(Clone, Debug)]
pub struct WindowTable {
    width: u32,
    odd: Vec<Point>,
}

impl WindowTable {
    /// Builds the table with one doubling (2P) followed by repeated
    /// additions of 2P.
    pub fn build(curve: &Curve, base: &Point, width: u32) -> Result<Self, Sm2Error> {
        debug_assert!((2..=16).contains(&width));
        let count = 1usize << (width - 2);
        let mut odd = Vec::with_capacity(count);
        odd.push(*base);
        let two_p = curve.double(base)?;
        let mut cur = *base;
        for _ in 1..count {
            cur = curve.add(&cur, &two_p)?;
            odd.push(cur);
        }
        Ok(Self { width, odd })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The stored multiple m·P for odd m, if present.
    pub fn get(&self, multiple: u32) -> Option<&Point> {
        if multiple % 2 == 1 {
            self.odd.get(((multiple - 1) / 2) as usize)
        } else {
            None
        }
    }
}

/// Recodes a scalar into signed digits in {0, ±1, ±3, …, ±(2^(w−1)−1)},
/// least significant first, such that no two nonzero digits are within w
/// positions of each other.
pub fn wnaf_digits(k: &U256, width: u32) -> Vec<i32> {
    let mut k = *k;
    let mut digits = Vec::with_capacity(k.bit_length() + 1);
    let modulus: u64 = 1 << width;
    let half: u64 = 1 << (width - 1);
    while !k.is_zero() {
        if k.bit(0) {
            let m = k.low_u64() & (modulus - 1);
            if m >= half {
                // Negative digit: borrow from the bits above.
                digits.push(m as i32 - modulus as i32);
                k = k.overflowing_add(&U256::from_u64(modulus - m)).0;
            } else {
                digits.push(m as i32);
                k = k.overflowing_sub(&U256::from_u64(m)).0;
            }
        } else {
            digits.push(0);
        }
        k = k.shr1();
    }
    digits
}

impl Curve {
    /// Baseline double-and-add multiplication, most significant bit first.
    ///
    /// `k ≡ 0 (mod n)` or `P = O` yields infinity without an arithmetic
    /// step.
    pub fn mul_binary(&self, k: &U256, point: &Point) -> Result<Point, Sm2Error> {
        let k = k.reduce(&self.n);
        if k.is_zero() || point.is_infinity() {
            return Ok(Point::Infinity);
        }
        let base = self.to_jacobian(point);
        let mut acc = Jacobian::infinity();
        for i in (0..k.bit_length()).rev() {
            acc = self.double_jacobian(&acc);
            if k.bit(i) {
                acc = self.add_jacobian(&acc, &base);
            }
        }
        self.to_affine(&acc)
    }

    /// wNAF multiplication with a freshly built odd-multiple table for
    /// `point`, using the curve's configured window width.
    pub fn mul_wnaf(&self, k: &U256, point: &Point) -> Result<Point, Sm2Error> {
        let k = k.reduce(&self.n);
        if k.is_zero() || point.is_infinity() {
            return Ok(Point::Infinity);
        }
        let table = WindowTable::build(self, point, self.window)?;
        self.wnaf_with_table(&k, point, &table)
    }

    /// Fixed-base multiplication of the generator through the cached
    /// odd-multiple table. The table is constructed on first use and
    /// reused for the process lifetime of this curve instance.
    pub fn mul_base(&self, k: &U256) -> Result<Point, Sm2Error> {
        let k = k.reduce(&self.n);
        if k.is_zero() {
            return Ok(Point::Infinity);
        }
        let generator = self.generator();
        let table = self.generator_table()?;
        self.wnaf_with_table(&k, &generator, table)
    }

    /// Shared digit loop: one doubling per digit position, one table
    /// addition (or subtraction, via y-negation) per nonzero digit. A
    /// multiple absent from the table is computed on demand, so the result
    /// never depends on the cache being complete — only on present entries
    /// being correct.
    fn wnaf_with_table(
        &self,
        k: &U256,
        base: &Point,
        table: &WindowTable,
    ) -> Result<Point, Sm2Error> {
        let digits = wnaf_digits(k, table.width());
        let mut acc = Jacobian::infinity();
        for &digit in digits.iter().rev() {
            acc = self.double_jacobian(&acc);
            if digit == 0 {
                continue;
            }
            let magnitude = digit.unsigned_abs();
            let entry = match table.get(magnitude) {
                Some(point) => *point,
                None => self.mul_wnaf(&U256::from_u64(magnitude as u64), base)?,
            };
            let entry = if digit < 0 { self.negate(&entry) } else { entry };
            acc = self.add_jacobian(&acc, &self.to_jacobian(&entry));
        }
        self.to_affine(&acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wnaf_digits_are_sparse_and_odd() {
        let k = U256::from_hex("6CB28D99385C175C94F94E934817663FC176D925DD72B727260DBAAE1FB2F96F");
        for width in 4..=6 {
            let digits = wnaf_digits(&k, width);
            let bound = 1 << (width - 1);
            let mut last_nonzero: Option<usize> = None;
            for (i, &d) in digits.iter().enumerate() {
                assert!(d.abs() < bound);
                if d != 0 {
                    assert!(d % 2 != 0, "nonzero digits must be odd");
                    if let Some(prev) = last_nonzero {
                        assert!(i - prev >= width as usize);
                    }
                    last_nonzero = Some(i);
                }
            }
        }
    }

    #[test]
    fn wnaf_digits_reconstruct_scalar() {
        // sum(d_i * 2^i) == k for a small scalar checked in i128 space
        let k = U256::from_u64(0xB5F3_9C41);
        let digits = wnaf_digits(&k, 5);
        let mut acc: i128 = 0;
        for (i, &d) in digits.iter().enumerate() {
            acc += (d as i128) << i;
        }
        assert_eq!(acc, 0xB5F3_9C41);
    }

    #[test]
    fn table_holds_odd_multiples() {
        let curve = Curve::sm2();
        let g = curve.generator();
        let table = WindowTable::build(&curve, &g, 5).unwrap();
        assert_eq!(table.get(1), Some(&g));
        assert!(table.get(2).is_none());
        assert!(table.get(15).is_some());
        assert!(table.get(17).is_none());
        // 3P from the table equals P + P + P
        let three = curve.add(&curve.add(&g, &g).unwrap(), &g).unwrap();
        assert_eq!(table.get(3), Some(&three));
    }

    #[test]
    fn zero_scalar_and_infinity_base() {
        let curve = Curve::sm2();
        let g = curve.generator();
        assert_eq!(
            curve.mul_binary(&U256::zero(), &g).unwrap(),
            Point::Infinity
        );
        assert_eq!(curve.mul_wnaf(&U256::zero(), &g).unwrap(), Point::Infinity);
        assert_eq!(curve.mul_base(&U256::zero()).unwrap(), Point::Infinity);
        // scalar equal to the group order reduces to zero
        let n = curve.n;
        assert_eq!(curve.mul_binary(&n, &g).unwrap(), Point::Infinity);
        assert_eq!(curve.mul_wnaf(&n, &g).unwrap(), Point::Infinity);
        assert_eq!(curve.mul_base(&n).unwrap(), Point::Infinity);
        assert_eq!(
            curve.mul_wnaf(&U256::from_u64(7), &Point::Infinity).unwrap(),
            Point::Infinity
        );
    }

    #[test]
    fn multiplying_by_one_is_identity() {
        let curve = Curve::sm2();
        let g = curve.generator();
        assert_eq!(curve.mul_binary(&U256::one(), &g).unwrap(), g);
        assert_eq!(curve.mul_wnaf(&U256::one(), &g).unwrap(), g);
        assert_eq!(curve.mul_base(&U256::one()).unwrap(), g);
    }

    #[test]
    fn strategies_agree_on_small_scalars() {
        let curve = Curve::sm2();
        let g = curve.generator();
        for k in [2u64, 3, 7, 16, 31, 97, 65537] {
            let k = U256::from_u64(k);
            let baseline = curve.mul_binary(&k, &g).unwrap();
            assert_eq!(curve.mul_wnaf(&k, &g).unwrap(), baseline);
            assert_eq!(curve.mul_base(&k).unwrap(), baseline);
            assert!(curve.is_on_curve(&baseline));
        }
    }

    #[test]
    fn strategies_agree_on_full_width_scalar() {
        let curve = Curve::sm2();
        let g = curve.generator();
        let k = U256::from_hex("6CB28D99385C175C94F94E934817663FC176D925DD72B727260DBAAE1FB2F96F");
        let baseline = curve.mul_binary(&k, &g).unwrap();
        assert_eq!(curve.mul_wnaf(&k, &g).unwrap(), baseline);
        assert_eq!(curve.mul_base(&k).unwrap(), baseline);
    }

    #[test]
    fn window_widths_agree() {
        let k = U256::from_hex("128B2FA8BD433C6C068C8D803DFF79792A519A55171B1B650C23661D15897263");
        let reference = Curve::sm2().mul_binary(&k, &Curve::sm2().generator()).unwrap();
        for width in [4, 5, 6] {
            let curve = Curve::sm2_with_window(width);
            let g = curve.generator();
            assert_eq!(curve.mul_wnaf(&k, &g).unwrap(), reference);
            assert_eq!(curve.mul_base(&k).unwrap(), reference);
        }
    }

    #[test]
    fn non_generator_base() {
        let curve = Curve::sm2();
        let g = curve.generator();
        let q = curve.mul_binary(&U256::from_u64(0xABCDEF), &g).unwrap();
        let k = U256::from_hex("5AE74EE7C32E79B7");
        assert_eq!(
            curve.mul_wnaf(&k, &q).unwrap(),
            curve.mul_binary(&k, &q).unwrap()
        );
    }

    #[test]
    fn scalar_multiplication_composes() {
        // mul(k, mul(l, P)) == mul(k*l mod n, P)
        let curve = Curve::sm2();
        let g = curve.generator();
        let k = U256::from_u64(0x1234_5678_9ABC);
        let l = U256::from_u64(0xFEDC_BA98_7654);
        let kl = k.mod_mul(&l, &curve.n);
        let step = curve.mul_wnaf(&l, &g).unwrap();
        let composed = curve.mul_wnaf(&k, &step).unwrap();
        assert_eq!(composed, curve.mul_binary(&kl, &g).unwrap());
    }

    #[test]
    fn cached_table_reused_across_calls() {
        let curve = Curve::sm2();
        let _ = curve.mul_base(&U256::from_u64(3)).unwrap();
        let first = curve.generator_table().unwrap() as *const WindowTable;
        let _ = curve.mul_base(&U256::from_u64(5)).unwrap();
        let second = curve.generator_table().unwrap() as *const WindowTable;
        assert_eq!(first, second);
    }
}
