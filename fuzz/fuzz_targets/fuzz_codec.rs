//! Fuzz target for frame decoding.
//!
//! Tests handling of malformed frames including:
//! - Unknown op-bytes and string tags
//! - Negative and oversized lengths
//! - Dangling and conflicting string handles
//!
//! Every input is also checked against the prefix contract: a proper prefix
//! of a decodable frame must ask for more bytes and leave the dictionary alone.

#![no_main]

use libfuzzer_sys::fuzz_target;
use perfstat_core::{decode, DecodeLimits, Decoded, StringDictionary};

fuzz_target!(|data: &[u8]| {
    // Small cap so huge declared lengths are rejected quickly
    let limits = DecodeLimits { max_field_len: 4096 };
    let mut dict = StringDictionary::new();

    let consumed = match decode(data, &mut dict, &limits) {
        Ok(Decoded::Record { consumed, .. }) | Ok(Decoded::Control { consumed }) => consumed,
        Ok(Decoded::NeedMore) | Err(_) => return,
    };
    assert!(consumed > 0 && consumed <= data.len());

    for cut in 0..consumed {
        let mut fresh = StringDictionary::new();
        let decoded = decode(&data[..cut], &mut fresh, &limits);
        assert_eq!(decoded, Ok(Decoded::NeedMore));
        assert!(fresh.is_empty());
    }
});
