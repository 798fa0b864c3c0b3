//! Capture file wire format.
//!
//! A capture file is a plain concatenation of frames with no global header
//! and no trailer. Every frame is `<op-byte><payload>`:
//!
//! | Op-byte  | Frame |
//! |----------|-------|
//! | 0..=17   | Record of the `OperationKind` with that ordinal |
//! | 0xFE     | String definition: `handle:i32 len:i32 bytes` |
//! | 0xFF     | Extension: `len:i32 payload`, skipped |
//!
//! Integers are big-endian, UUIDs are two big-endian 64-bit halves (most
//! significant first) and booleans are a single 0/1 byte. String fields are
//! `tag:u8 handle:i32`, followed by `len:i32 bytes` when `tag` is 0 (inline
//! definition); tag 1 is a reference to a handle defined earlier in the same
//! stream.

mod decode;
mod dictionary;
mod encode;

pub use decode::{decode, Decoded};
pub use dictionary::StringDictionary;
pub use encode::Encoder;

/// Op-byte of a standalone string-definition frame.
pub const STRING_DEFINITION_FRAME: u8 = 0xFE;

/// Op-byte of an extension frame.
pub const EXTENSION_FRAME: u8 = 0xFF;

/// String field tag: handle followed by the literal bytes.
pub const STRING_TAG_DEFINITION: u8 = 0;

/// String field tag: handle only.
pub const STRING_TAG_REFERENCE: u8 = 1;

/// Default cap on any length field (16 MiB).
pub const DEFAULT_MAX_FIELD_LEN: usize = 16 * 1024 * 1024;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest string, extension payload or cache id list (in bytes) accepted.
    pub max_field_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_field_len: DEFAULT_MAX_FIELD_LEN,
        }
    }
}
