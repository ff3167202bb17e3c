//! SM2-style signature protocol: key generation, identity digest (ZA),
//! signing, and verification.
//!
//! The hash is an injected dependency through the `Digest` trait: the
//! national-standard SM3 is the default, but any 256-bit-class digest
//! (e.g. SHA-256, which the original demonstrations substituted when SM3
//! was unavailable) drops in. Signer and verifier must of course agree on
//! the choice.

use crate::bigint::U256;
use crate::curve::{Curve, Point};
use crate::error::Sm2Error;
use rand::RngCore;
use sha2::Digest;
use std::marker::PhantomData;

/// Defensive cap on nonce redraws during signing. Each degenerate outcome
/// (`r = 0`, `r + k ≡ 0`, `s = 0`) occurs with probability about 1/n, so a
/// correct implementation terminates on the first attempt essentially
/// always; the cap exists only to turn a broken RNG into an error instead
/// of a hang.
const MAX_SIGN_RETRIES: u32 = 64;

/// A private scalar d in [1, n−2] and its public point Q = d·G.
#[derive(Clone, Copy, Debug)]
pub struct KeyPair {
    pub d: U256,
    pub q: Point,
}

/// A signature (r, s), each component in [1, n−1] by construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
}

/// The signature engine over one fixed curve, parameterized by the digest.
#[derive(Clone, Debug)]
pub struct Sm2<D> {
    curve: Curve,
    _digest: PhantomData<D>,
}

impl<D: Digest> Sm2<D> {
    pub fn new(curve: Curve) -> Self {
        Self {
            curve,
            _digest: PhantomData,
        }
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Curve-membership check for externally received public points.
    /// Callers must run this on any peer-supplied point before handing it
    /// to `verify`.
    pub fn point_is_valid(&self, point: &Point) -> bool {
        !point.is_infinity() && self.curve.is_on_curve(point)
    }

    /// Draws d uniformly from [1, n−2] and derives Q = d·G with the
    /// baseline strategy.
    pub fn generate_keypair(&self, rng: &mut impl RngCore) -> Result<KeyPair, Sm2Error> {
        let upper = self.curve.n.overflowing_sub(&U256::from_u64(2)).0;
        let d = random_scalar(rng, &upper);
        let q = self.curve.mul_binary(&d, &self.curve.generator())?;
        Ok(KeyPair { d, q })
    }

    /// The identity digest ZA: binds the identifier, curve coefficients,
    /// generator, and public key coordinates into one hash, closing the
    /// key-substitution gap. Every coordinate is fixed-width big-endian;
    /// the identifier is prefixed with its bit length as 2 bytes.
    pub fn identity_digest(&self, identity: &str, q: &Point) -> Result<Vec<u8>, Sm2Error> {
        let (qx, qy) = match q {
            Point::Affine { x, y } if self.curve.is_on_curve(q) => (x, y),
            _ => return Err(Sm2Error::InvalidPoint),
        };
        let id_bytes = identity.as_bytes();
        if id_bytes.len() > 8191 {
            return Err(Sm2Error::IdentityTooLong);
        }
        let entl = (id_bytes.len() as u16) * 8;

        let mut hasher = D::new();
        hasher.update(entl.to_be_bytes());
        hasher.update(id_bytes);
        hasher.update(self.curve.a.to_be_bytes());
        hasher.update(self.curve.b.to_be_bytes());
        hasher.update(self.curve.gx.to_be_bytes());
        hasher.update(self.curve.gy.to_be_bytes());
        hasher.update(qx.to_be_bytes());
        hasher.update(qy.to_be_bytes());
        Ok(hasher.finalize().to_vec())
    }

    /// e = H(ZA ‖ msg) mod n.
    fn message_scalar(&self, q: &Point, identity: &str, msg: &[u8]) -> Result<U256, Sm2Error> {
        let za = self.identity_digest(identity, q)?;
        let mut hasher = D::new();
        hasher.update(&za);
        hasher.update(msg);
        let digest = hasher.finalize();
        Ok(U256::from_be_bytes(digest.as_slice()).reduce(&self.curve.n))
    }

    /// Signs `msg` under identity `identity`, drawing fresh nonces from
    /// `rng` until a non-degenerate one is found.
    pub fn sign(
        &self,
        d: &U256,
        msg: &[u8],
        identity: &str,
        rng: &mut impl RngCore,
    ) -> Result<Signature, Sm2Error> {
        self.sign_counted(d, msg, identity, rng).map(|(sig, _)| sig)
    }

    /// Like `sign`, also reporting how many nonces were discarded before
    /// one succeeded — a diagnostic, not control flow; it is 0 in all but
    /// astronomically unlikely runs.
    pub fn sign_counted(
        &self,
        d: &U256,
        msg: &[u8],
        identity: &str,
        rng: &mut impl RngCore,
    ) -> Result<(Signature, u32), Sm2Error> {
        // Public key from the baseline strategy: authoritative.
        let q = self.curve.mul_binary(d, &self.curve.generator())?;
        let e = self.message_scalar(&q, identity, msg)?;
        let upper = self.curve.n.overflowing_sub(&U256::one()).0;
        for retries in 0..MAX_SIGN_RETRIES {
            let k = random_scalar(rng, &upper);
            if let Some(sig) = self.finish_nonce(d, &e, &k)? {
                return Ok((sig, retries));
            }
        }
        Err(Sm2Error::RetriesExhausted)
    }

    /// One signing attempt with a caller-supplied nonce k in [1, n−1].
    /// Returns `None` when the nonce is degenerate and must be redrawn.
    ///
    /// This is the entry point for fixed test vectors and for
    /// demonstrating the scheme's documented nonce-misuse weaknesses; it
    /// performs real curve arithmetic, never a placeholder.
    pub fn sign_with_nonce(
        &self,
        d: &U256,
        msg: &[u8],
        identity: &str,
        k: &U256,
    ) -> Result<Option<Signature>, Sm2Error> {
        let q = self.curve.mul_binary(d, &self.curve.generator())?;
        let e = self.message_scalar(&q, identity, msg)?;
        self.finish_nonce(d, &e, k)
    }

    fn finish_nonce(&self, d: &U256, e: &U256, k: &U256) -> Result<Option<Signature>, Sm2Error> {
        let n = &self.curve.n;
        let k = k.reduce(n);

        // (x1, _) = k·G via wNAF; k is single-use.
        let x1 = match self.curve.mul_wnaf(&k, &self.curve.generator())? {
            Point::Affine { x, .. } => x.reduce(n),
            Point::Infinity => return Ok(None),
        };
        let r = e.mod_add(&x1, n);
        // r = 0 leaves e unbound; r + k = n would cancel the nonce out of
        // the verification relation. Both force a redraw.
        if r.is_zero() || r.mod_add(&k, n).is_zero() {
            return Ok(None);
        }

        // s = (1 + d)⁻¹ · (k − r·d) mod n
        let d = d.reduce(n);
        let one_plus_d = d.mod_add(&U256::one(), n);
        let inv = one_plus_d.mod_inverse(n).ok_or(Sm2Error::DivisionByZero)?;
        let s = inv.mod_mul(&k.mod_sub(&d.mod_mul(&r, n), n), n);
        if s.is_zero() {
            return Ok(None);
        }
        Ok(Some(Signature { r, s }))
    }

    /// Verifies `sig` over `msg` for identity `identity` and public point
    /// `q`. Malformed or forged signatures yield `false`, never an error;
    /// internal arithmetic failures also map to `false`.
    pub fn verify(&self, q: &Point, msg: &[u8], identity: &str, sig: &Signature) -> bool {
        self.verify_inner(q, msg, identity, sig).unwrap_or(false)
    }

    fn verify_inner(
        &self,
        q: &Point,
        msg: &[u8],
        identity: &str,
        sig: &Signature,
    ) -> Result<bool, Sm2Error> {
        let n = &self.curve.n;
        // Format invariant: r, s in [1, n−1].
        if sig.r.is_zero() || sig.s.is_zero() || sig.r >= *n || sig.s >= *n {
            return Ok(false);
        }
        let e = self.message_scalar(q, identity, msg)?;
        let t = sig.r.mod_add(&sig.s, n);
        if t.is_zero() {
            return Ok(false);
        }
        // R' = s·G + t·Q, fixed-base table for the generator term.
        let s_g = self.curve.mul_base(&sig.s)?;
        let t_q = self.curve.mul_wnaf(&t, q)?;
        match self.curve.add(&s_g, &t_q)? {
            Point::Infinity => Ok(false),
            Point::Affine { x, .. } => Ok(e.mod_add(&x.reduce(n), n) == sig.r),
        }
    }
}

/// Uniform scalar in [1, upper] by rejection sampling 256-bit strings.
fn random_scalar(rng: &mut impl RngCore, upper: &U256) -> U256 {
    let mut buf = [0u8; 32];
    loop {
        rng.fill_bytes(&mut buf);
        let candidate = U256::from_be_bytes(&buf);
        if !candidate.is_zero() && candidate <= *upper {
            return candidate;
        }
    }
}
