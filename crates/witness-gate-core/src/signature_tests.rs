//! Tests for [`SignatureVerifier`].
//!
//! Covers acceptance of correctly signed bodies, rejection of every
//! single-byte tamper, fail-closed handling of absent signatures, and the
//! structural full-length comparison.

use super::*;

const SECRET: &str = "gate-a-secret";
const BODY: &[u8] = br#"{"workflow_run":{"name":"ci","conclusion":"success"}}"#;

// ============================================================================
// verify tests
// ============================================================================

mod verify_tests {
    use super::*;

    #[test]
    fn test_signature_produced_by_sign_is_accepted() {
        for (secret, body) in [
            (SECRET, BODY),
            ("", b"".as_slice()),
            ("k", b"x".as_slice()),
            ("a much longer secret value with spaces", b"\x00\xff\x10".as_slice()),
        ] {
            let signature = SignatureVerifier::sign(body, secret);
            assert!(
                SignatureVerifier::verify(body, Some(&signature), secret),
                "expected acceptance for secret {:?}",
                secret
            );
        }
    }

    #[test]
    fn test_signature_format_is_prefixed_lowercase_hex() {
        let signature = SignatureVerifier::sign(BODY, SECRET);

        let digest = signature.strip_prefix("sha256=").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_every_single_byte_flip_is_rejected() {
        let signature = SignatureVerifier::sign(BODY, SECRET);
        let original = signature.as_bytes().to_vec();

        for position in 0..original.len() {
            let mut tampered = original.clone();
            tampered[position] ^= 0x01;
            let tampered = String::from_utf8_lossy(&tampered).to_string();

            assert!(
                !SignatureVerifier::verify(BODY, Some(&tampered), SECRET),
                "flip at byte {} must be rejected",
                position
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let signature = SignatureVerifier::sign(BODY, SECRET);

        assert!(!SignatureVerifier::verify(BODY, Some(&signature), "gate-b-secret"));
    }

    #[test]
    fn test_modified_body_is_rejected() {
        let signature = SignatureVerifier::sign(BODY, SECRET);

        assert!(!SignatureVerifier::verify(b"{}", Some(&signature), SECRET));
    }

    #[test]
    fn test_absent_or_empty_signature_fails_closed() {
        assert!(!SignatureVerifier::verify(BODY, None, SECRET));
        assert!(!SignatureVerifier::verify(BODY, Some(""), SECRET));
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        let signature = SignatureVerifier::sign(BODY, SECRET);
        let bare = signature.strip_prefix("sha256=").unwrap();

        assert!(!SignatureVerifier::verify(BODY, Some(bare), SECRET));
    }

    #[test]
    fn test_malformed_hex_returns_false() {
        assert!(!SignatureVerifier::verify(
            BODY,
            Some("sha256=not-valid-hex!!"),
            SECRET
        ));
        assert!(!SignatureVerifier::verify(BODY, Some("sha256="), SECRET));
    }

    #[test]
    fn test_truncated_and_extended_signatures_are_rejected() {
        let signature = SignatureVerifier::sign(BODY, SECRET);

        let truncated = &signature[..signature.len() - 1];
        let extended = format!("{}0", signature);

        assert!(!SignatureVerifier::verify(BODY, Some(truncated), SECRET));
        assert!(!SignatureVerifier::verify(BODY, Some(&extended), SECRET));
    }
}

// ============================================================================
// Constant-time comparison tests
// ============================================================================

mod compare_bytes_tests {
    use super::*;

    #[test]
    fn test_mismatch_in_first_byte_still_examines_every_position() {
        let a = b"sha256=aaaaaaaaaaaaaaaa";
        let b = b"Xha256=aaaaaaaaaaaaaaaa";

        let comparison = compare_bytes(a, b);

        assert!(!comparison.equal);
        assert_eq!(comparison.positions_examined, a.len());
    }

    #[test]
    fn test_length_mismatch_examines_the_longer_operand() {
        let short = b"sha256=ab";
        let long = b"sha256=abcdef";

        let comparison = compare_bytes(short, long);

        assert!(!comparison.equal);
        assert_eq!(comparison.positions_examined, long.len());
    }

    #[test]
    fn test_prefix_equal_operands_of_different_length_do_not_match() {
        assert!(!constant_time_eq(b"abc", b"abc\0"));
        assert!(!constant_time_eq(b"", b"\0"));
    }

    #[test]
    fn test_identical_operands_match() {
        let comparison = compare_bytes(b"same", b"same");

        assert!(comparison.equal);
        assert_eq!(comparison.positions_examined, 4);
        assert!(constant_time_eq(b"", b""));
    }
}
