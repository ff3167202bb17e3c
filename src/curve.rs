//! Short Weierstrass curve group: y² = x³ + ax + b over F_p
//!
//! Points are represented in two forms:
//! 1. `Point` — affine coordinates, or the explicit point at infinity.
//!    This is the form all public interfaces speak.
//! 2. `Jacobian` — projective coordinates (X, Y, Z) with the affine point
//!    at (X/Z², Y/Z³) and Z = 0 encoding infinity. Used internally during
//!    multi-step computations: Jacobian doubling and addition need no field
//!    inversion, and scalar multiplication performs hundreds of point
//!    operations per signature, so paying one inversion per operation in
//!    affine form would dominate the cost.

use crate::bigint::U256;
use crate::error::Sm2Error;
use crate::scalar_mul::WindowTable;
use once_cell::sync::OnceCell;
use std::fmt;

/// A point on the curve: affine coordinates or the identity element.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Point {
    /// The point at infinity (group identity).
    Infinity,
    /// A point with affine coordinates (x, y), both in [0, p).
    Affine { x: U256, y: U256 },
}

impl Point {
    #[inline]
    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => write!(f, "O (point at infinity)"),
            Point::Affine { x, y } => write!(f, "({x}, {y})"),
        }
    }
}

/// A point in Jacobian projective coordinates; `z == 0` is infinity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Jacobian {
    pub x: U256,
    pub y: U256,
    pub z: U256,
}

impl Jacobian {
    pub fn infinity() -> Self {
        Self {
            x: U256::one(),
            y: U256::one(),
            z: U256::zero(),
        }
    }

    #[inline]
    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }
}

/// Domain parameters of one fixed short Weierstrass curve, plus the cached
/// odd-multiple table for its generator.
///
/// The table is built lazily, at most once per instance, and is immutable
/// afterwards; concurrent first users synchronize through the `OnceCell`.
/// Independent instances (e.g. tests with different window widths) get
/// independent tables.
#[derive(Clone, Debug)]
pub struct Curve {
    /// Prime field modulus.
    pub p: U256,
    /// Curve coefficient a.
    pub a: U256,
    /// Curve coefficient b.
    pub b: U256,
    /// Generator x-coordinate.
    pub gx: U256,
    /// Generator y-coordinate.
    pub gy: U256,
    /// Order of the generator (prime).
    pub n: U256,
    /// Cofactor (1 for this curve).
    pub h: U256,
    /// wNAF window width used by the windowed strategies.
    pub window: u32,
    g_table: OnceCell<WindowTable>,
}

impl Curve {
    /// The 256-bit SM2 parameter set from the national standard's worked
    /// example, the set with published signature test vectors.
    pub fn sm2() -> Self {
        Self::sm2_with_window(5)
    }

    /// Same parameters with an explicit wNAF window width (4-6 is typical;
    /// must be at least 2).
    pub fn sm2_with_window(window: u32) -> Self {
        assert!((2..=16).contains(&window), "unreasonable window width");
        Self {
            p: U256::from_hex("8542D69E4C044F18E8B92435BF6FF7DE457283915C45517D722EDB8B08F1DFC3"),
            a: U256::from_hex("787968B4FA32C3FD2417842E73BBFEFF2F3C848B6831D7E0EC65228B3937E498"),
            b: U256::from_hex("63E4C6D3B23B0C849CF84241484BFE48F61D59A5B16BA06E6E12D1DA27C5249A"),
            gx: U256::from_hex("421DEBD61B62EAB6746434EBC3CC315E32220B3BADD50BDC4C4E6C147FEDD43D"),
            gy: U256::from_hex("0680512BCBB42C07D47349D2153B70C4E5D7FDFCBFA36EA1A85841B9E46E09A2"),
            n: U256::from_hex("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7"),
            h: U256::one(),
            window,
            g_table: OnceCell::new(),
        }
    }

    /// The generator point G.
    #[inline]
    pub fn generator(&self) -> Point {
        Point::Affine {
            x: self.gx,
            y: self.gy,
        }
    }

    pub(crate) fn generator_table(&self) -> Result<&WindowTable, Sm2Error> {
        self.g_table
            .get_or_try_init(|| WindowTable::build(self, &self.generator(), self.window))
    }

    // Field helpers over F_p.
    #[inline]
    fn fadd(&self, a: &U256, b: &U256) -> U256 {
        a.mod_add(b, &self.p)
    }

    #[inline]
    fn fsub(&self, a: &U256, b: &U256) -> U256 {
        a.mod_sub(b, &self.p)
    }

    #[inline]
    fn fmul(&self, a: &U256, b: &U256) -> U256 {
        a.mod_mul(b, &self.p)
    }

    /// Whether the point is the identity or an on-curve affine point with
    /// coordinates in range. Any point received from outside the process
    /// must pass this check before being used in arithmetic; an unchecked
    /// point admits invalid-curve attacks.
    pub fn is_on_curve(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                if *x >= self.p || *y >= self.p {
                    return false;
                }
                let lhs = self.fmul(y, y);
                let x_sq = self.fmul(x, x);
                let rhs = self.fadd(&self.fadd(&self.fmul(&x_sq, x), &self.fmul(&self.a, x)), &self.b);
                lhs == rhs
            }
        }
    }

    /// The additive inverse: same x, negated y.
    pub fn negate(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine {
                x: *x,
                y: U256::zero().mod_sub(y, &self.p),
            },
        }
    }

    pub fn to_jacobian(&self, point: &Point) -> Jacobian {
        match point {
            Point::Infinity => Jacobian::infinity(),
            Point::Affine { x, y } => Jacobian {
                x: *x,
                y: *y,
                z: U256::one(),
            },
        }
    }

    /// Converts back to affine coordinates; the one place point arithmetic
    /// performs a field inversion. `z = 0` maps to `Infinity` before any
    /// inversion is attempted, so `DivisionByZero` cannot arise from a
    /// well-formed Jacobian point, but it is propagated rather than
    /// defaulted if it ever does.
    pub fn to_affine(&self, point: &Jacobian) -> Result<Point, Sm2Error> {
        if point.is_infinity() {
            return Ok(Point::Infinity);
        }
        let z_inv = point
            .z
            .mod_inverse(&self.p)
            .ok_or(Sm2Error::DivisionByZero)?;
        let z_inv2 = self.fmul(&z_inv, &z_inv);
        let z_inv3 = self.fmul(&z_inv2, &z_inv);
        Ok(Point::Affine {
            x: self.fmul(&point.x, &z_inv2),
            y: self.fmul(&point.y, &z_inv3),
        })
    }

    /// Point doubling in Jacobian coordinates.
    ///
    /// `2·O = O`, and a point with y = 0 (order 2) doubles to infinity:
    /// the tangent line there is vertical.
    pub fn double_jacobian(&self, pt: &Jacobian) -> Jacobian {
        if pt.is_infinity() {
            return Jacobian::infinity();
        }
        if pt.y.is_zero() {
            return Jacobian::infinity();
        }
        let y_sq = self.fmul(&pt.y, &pt.y);
        // S = 4·X·Y²
        let s = self.fmul(&U256::from_u64(4), &self.fmul(&pt.x, &y_sq));
        // M = 3·X² + a·Z⁴
        let z_sq = self.fmul(&pt.z, &pt.z);
        let z_4 = self.fmul(&z_sq, &z_sq);
        let m = self.fadd(
            &self.fmul(&U256::from_u64(3), &self.fmul(&pt.x, &pt.x)),
            &self.fmul(&self.a, &z_4),
        );
        // X3 = M² − 2S; Y3 = M(S − X3) − 8Y⁴; Z3 = 2YZ
        let x3 = self.fsub(&self.fmul(&m, &m), &self.fadd(&s, &s));
        let y_4 = self.fmul(&y_sq, &y_sq);
        let y3 = self.fsub(
            &self.fmul(&m, &self.fsub(&s, &x3)),
            &self.fmul(&U256::from_u64(8), &y_4),
        );
        let z3 = self.fmul(&U256::from_u64(2), &self.fmul(&pt.y, &pt.z));
        Jacobian { x: x3, y: y3, z: z3 }
    }

    /// Point addition in Jacobian coordinates, total over all cases:
    /// identity on either side, P + (−P) = O, and P + P delegating to
    /// doubling.
    pub fn add_jacobian(&self, p: &Jacobian, q: &Jacobian) -> Jacobian {
        if p.is_infinity() {
            return *q;
        }
        if q.is_infinity() {
            return *p;
        }
        let z1_sq = self.fmul(&p.z, &p.z);
        let z2_sq = self.fmul(&q.z, &q.z);
        let u1 = self.fmul(&p.x, &z2_sq);
        let u2 = self.fmul(&q.x, &z1_sq);
        let s1 = self.fmul(&p.y, &self.fmul(&z2_sq, &q.z));
        let s2 = self.fmul(&q.y, &self.fmul(&z1_sq, &p.z));
        if u1 == u2 {
            if s1 != s2 {
                // Same x, opposite y: the points are inverses.
                return Jacobian::infinity();
            }
            return self.double_jacobian(p);
        }
        let h = self.fsub(&u2, &u1);
        let r = self.fsub(&s2, &s1);
        let h_sq = self.fmul(&h, &h);
        let h_cu = self.fmul(&h_sq, &h);
        let u1_h_sq = self.fmul(&u1, &h_sq);
        let x3 = self.fsub(
            &self.fsub(&self.fmul(&r, &r), &h_cu),
            &self.fadd(&u1_h_sq, &u1_h_sq),
        );
        let y3 = self.fsub(
            &self.fmul(&r, &self.fsub(&u1_h_sq, &x3)),
            &self.fmul(&s1, &h_cu),
        );
        let z3 = self.fmul(&h, &self.fmul(&p.z, &q.z));
        Jacobian { x: x3, y: y3, z: z3 }
    }

    /// Affine point addition, routed through Jacobian coordinates.
    pub fn add(&self, p: &Point, q: &Point) -> Result<Point, Sm2Error> {
        let sum = self.add_jacobian(&self.to_jacobian(p), &self.to_jacobian(q));
        self.to_affine(&sum)
    }

    /// Affine point doubling.
    pub fn double(&self, p: &Point) -> Result<Point, Sm2Error> {
        let doubled = self.double_jacobian(&self.to_jacobian(p));
        self.to_affine(&doubled)
    }
}
