//! Tests for the text codec
//!
//! These tests verify:
//! - Hex encoding of non-zero bytes
//! - Base-26 encoding of zero runs
//! - Rejection of malformed text
//! - Output bounds on decoding

use hostkv::codec::{decode, decode_bounded, encode, MAX_DECODED_LEN};
use hostkv::{HostKvError, ResultCode};

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_hex_bytes() {
    assert_eq!(encode(&[0x3f, 0x01, 0xff]), "3F01FF");
    assert_eq!(encode(&[]), "");
}

#[test]
fn test_encode_zero_runs() {
    assert_eq!(encode(&[0]), "b");
    assert_eq!(encode(&[0, 0]), "c");
    assert_eq!(encode(&[0; 25]), "z");
    assert_eq!(encode(&[0; 26]), "ab");
    assert_eq!(encode(&[0; 27]), "bb");
}

#[test]
fn test_encode_mixed() {
    assert_eq!(encode(&[0x3f, 0, 0, 0x01]), "3Fc01");
    assert_eq!(encode(&[0, 0x10, 0]), "b10b");
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_mixed() {
    assert_eq!(decode("3Fc01").unwrap(), vec![0x3f, 0, 0, 0x01]);
    assert_eq!(decode("ab").unwrap(), vec![0; 26]);
}

#[test]
fn test_page_round_trip() {
    let mut page = vec![0u8; 4096];
    page[..16].copy_from_slice(b"SQLite format 3\0");
    page[100] = 0x0d;
    page[4095] = 0xaa;

    let text = encode(&page);

    assert!(text.len() < page.len());
    assert_eq!(decode(&text).unwrap(), page);
}

#[test]
fn test_decode_rejects_bad_input() {
    assert!(decode("3").is_err());
    assert!(decode("3g").is_err());
    assert!(decode("#!").is_err());
    assert!(decode("3f").is_err());
}

// =============================================================================
// Bound Tests
// =============================================================================

#[test]
fn test_decode_rejects_huge_zero_run() {
    // Eleven `z` digits describe a run of petabytes.
    let err = decode("zzzzzzzzzzz").unwrap_err();

    assert!(matches!(err, HostKvError::Corruption(_)));
    assert_eq!(err.code(), ResultCode::IoError);
}

#[test]
fn test_decode_rejects_run_past_default_limit() {
    let text = encode(&vec![0u8; MAX_DECODED_LEN + 1]);
    assert!(matches!(decode(&text), Err(HostKvError::Corruption(_))));

    let text = encode(&vec![0u8; MAX_DECODED_LEN]);
    assert_eq!(decode(&text).unwrap().len(), MAX_DECODED_LEN);
}

#[test]
fn test_decode_bounded_limits_runs_and_hex() {
    assert_eq!(decode_bounded("3Fc01", 4).unwrap(), vec![0x3f, 0, 0, 0x01]);

    assert!(matches!(decode_bounded("3Fc01", 3), Err(HostKvError::Corruption(_))));
    assert!(matches!(decode_bounded("3Fd", 3), Err(HostKvError::Corruption(_))));
    assert!(matches!(decode_bounded("0102", 1), Err(HostKvError::Corruption(_))));
    assert_eq!(decode_bounded("", 0).unwrap(), Vec::<u8>::new());
}
