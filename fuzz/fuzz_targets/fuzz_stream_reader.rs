//! Fuzz target for the stream reader.
//!
//! Feeds arbitrary bytes as a capture stream. The reader must never panic
//! and must stop after the first error.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use perfstat_core::{DecodeLimits, StreamReader};
use uuid::Uuid;

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits { max_field_len: 4096 };
    let mut reader = StreamReader::with_limits(Cursor::new(data), Uuid::nil(), limits);

    loop {
        match reader.next_record() {
            Ok(Some(record)) => assert_eq!(record.node_id, Uuid::nil()),
            Ok(None) => break,
            Err(e) => {
                assert!(e.offset() <= data.len() as u64);
                assert!(matches!(reader.next_record(), Ok(None)));
                break;
            }
        }
    }
    assert!(reader.offset() <= data.len() as u64);
});
