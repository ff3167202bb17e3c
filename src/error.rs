//! Engine error types

/// Errors surfaced by the curve engine.
///
/// Degenerate nonce outcomes during signing (`r = 0`, `r + k ≡ 0`, `s = 0`)
/// are internal retry triggers, not errors; they never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sm2Error {
    /// A modular inverse was requested for a value congruent to zero.
    DivisionByZero,
    /// A supplied point is not on the curve (or is the point at infinity
    /// where an affine point is required).
    InvalidPoint,
    /// The identity string is too long for its bit length to fit the
    /// 2-byte ENTL field of the identity digest.
    IdentityTooLong,
    /// The signing loop exhausted its defensive retry cap without finding
    /// a non-degenerate nonce. Probability on the order of 2^-256 per
    /// attempt; seeing this indicates a broken RNG.
    RetriesExhausted,
}

impl std::fmt::Display for Sm2Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sm2Error::DivisionByZero => write!(f, "modular inverse of zero"),
            Sm2Error::InvalidPoint => write!(f, "point is not on the curve"),
            Sm2Error::IdentityTooLong => {
                write!(f, "identity exceeds the 2-byte ENTL length field")
            }
            Sm2Error::RetriesExhausted => {
                write!(f, "signing retry cap exhausted; check the RNG")
            }
        }
    }
}

impl std::error::Error for Sm2Error {}
