//! SM2-style elliptic curve signature engine
//!
//! Implements the national-standard signature scheme over one
//! fixed 256-bit short Weierstrass curve: prime field arithmetic, affine
//! and Jacobian point operations, three interchangeable scalar
//! multiplication strategies, the identity-binding ZA digest, and the key
//! generation / sign / verify protocol.
//!
//! The hash function is injected via the `Digest` trait; SM3 is the
//! intended default, SHA-256 a working substitute.

/// Fixed-width big integer arithmetic (`Uint<N>`, `U256`)
pub mod bigint;
/// Curve parameters and affine/Jacobian group operations
pub mod curve;
/// Engine error taxonomy
pub mod error;
/// Double-and-add, wNAF, and fixed-base scalar multiplication
pub mod scalar_mul;
/// Key generation, ZA digest, signing, and verification
pub mod sm2;

pub use bigint::U256;
pub use curve::{Curve, Jacobian, Point};
pub use error::Sm2Error;
pub use scalar_mul::WindowTable;
pub use sm2::{KeyPair, Signature, Sm2};
