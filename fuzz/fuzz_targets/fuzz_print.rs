//! Fuzz target for record rendering.
//!
//! Decodes arbitrary streams and renders every record as text and JSON.
//! Every JSON line must be exactly one newline-terminated line, whatever the
//! decoded strings contain.

#![no_main]

use std::io::{Cursor, Sink};

use libfuzzer_sys::fuzz_target;
use perfstat_core::{DecodeLimits, Handler, OutputFormat, PrintHandler, StreamReader};
use uuid::Uuid;

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits { max_field_len: 4096 };
    let reader = StreamReader::with_limits(Cursor::new(data), Uuid::nil(), limits);
    let mut sink: PrintHandler<Sink> = PrintHandler::new(std::io::sink(), OutputFormat::Text);

    for record in reader.flatten() {
        sink.handle(&record).unwrap();

        let mut json = PrintHandler::new(Vec::new(), OutputFormat::Json);
        json.handle(&record).unwrap();
        let line = json.into_inner();
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(line.last(), Some(&b'\n'));
    }
});
