//! HMAC-SHA256 webhook signature verification.
//!
//! Signatures use the `sha256=<hex-digest>` format sent in the
//! `X-Hub-Signature-256` header. Verification is a pure function: it never
//! errors, never logs, and returns `false` for every malformed input.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

type HmacSha256 = Hmac<Sha256>;

/// Verifier for `sha256=` prefixed HMAC signatures
///
/// # Examples
///
/// ```rust
/// use witness_gate_core::SignatureVerifier;
///
/// let body = br#"{"workflow_run":{}}"#;
/// let signature = SignatureVerifier::sign(body, "gate-a-secret");
///
/// assert!(SignatureVerifier::verify(body, Some(&signature), "gate-a-secret"));
/// assert!(!SignatureVerifier::verify(body, Some(&signature), "gate-b-secret"));
/// assert!(!SignatureVerifier::verify(body, None, "gate-a-secret"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Prefix identifying the digest algorithm
    pub const PREFIX: &'static str = "sha256=";

    /// Compute the expected signature for `body` under `secret`
    pub fn sign(body: &[u8], secret: &str) -> String {
        // HMAC accepts keys of any length, so key setup cannot fail here.
        match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mut mac) => {
                mac.update(body);
                format!("{}{}", Self::PREFIX, hex::encode(mac.finalize().into_bytes()))
            }
            Err(_) => String::new(),
        }
    }

    /// Check a presented signature against the raw request body
    ///
    /// Fails closed on an absent or empty signature. The comparison touches
    /// every byte position of the longer operand regardless of where the first
    /// mismatch occurs, and a length difference is folded into the result
    /// rather than returned early.
    pub fn verify(body: &[u8], presented: Option<&str>, secret: &str) -> bool {
        let presented = match presented {
            Some(value) if !value.is_empty() => value,
            _ => return false,
        };

        let expected = Self::sign(body, secret);
        if expected.is_empty() {
            return false;
        }

        constant_time_eq(expected.as_bytes(), presented.as_bytes())
    }
}

/// Constant-time byte comparison
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    compare_bytes(a, b).equal
}

/// Result of a full-length comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Comparison {
    pub equal: bool,
    pub positions_examined: usize,
}

pub(crate) fn compare_bytes(a: &[u8], b: &[u8]) -> Comparison {
    let span = a.len().max(b.len());
    let mut equal: Choice = a.len().ct_eq(&b.len());
    let mut positions_examined = 0;

    for i in 0..span {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        equal &= x.ct_eq(&y);
        positions_examined += 1;
    }

    Comparison {
        equal: bool::from(equal),
        positions_examined,
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
