//! Tests for the witness-gate-core library module.

use super::*;

#[test]
fn test_gate_name_validation() {
    assert!(GateName::new("gateA").is_ok());
    assert!(GateName::new("bridge_world-2").is_ok());

    let empty = GateName::new("");
    assert!(matches!(empty, Err(ValidationError::Required { .. })));

    let too_long = GateName::new("a".repeat(65));
    assert!(matches!(too_long, Err(ValidationError::TooLong { .. })));

    let slashes = GateName::new("../escape");
    assert!(matches!(
        slashes,
        Err(ValidationError::InvalidCharacters { .. })
    ));

    let hyphen = GateName::new("-gate");
    assert!(matches!(hyphen, Err(ValidationError::InvalidFormat { .. })));
}

#[test]
fn test_timestamp_rfc3339_round_trip_preserves_ordering() {
    let earlier = Timestamp::from_rfc3339("2024-05-01T10:00:00Z").unwrap();
    let later = Timestamp::from_rfc3339("2024-05-01T10:00:00.001Z").unwrap();

    assert!(later > earlier);
    assert_eq!(
        Timestamp::from_rfc3339(&earlier.to_rfc3339()).unwrap(),
        earlier
    );
}

#[test]
fn test_timestamp_keeps_nanoseconds() {
    let precise = Timestamp::from_rfc3339("2024-05-01T10:00:00.123456789Z").unwrap();
    let truncated = Timestamp::from_rfc3339("2024-05-01T10:00:00.123456Z").unwrap();

    assert!(precise > truncated);
    assert!(precise.to_rfc3339().contains(".123456789"));
    assert_eq!(Timestamp::from_rfc3339(&precise.to_rfc3339()).unwrap(), precise);
}

#[test]
fn test_timestamp_rejects_garbage() {
    let result = Timestamp::from_rfc3339("yesterday");
    assert!(matches!(result, Err(ParseError::InvalidFormat { .. })));
}
