//! Error types for NDEF encoding and decoding

use thiserror::Error;

/// Error type for NDEF message handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NdefError {
    /// Input ended in the middle of a record
    #[error("truncated record at byte {offset}")]
    Truncated { offset: usize },

    /// A message must contain at least one record
    #[error("empty message")]
    Empty,

    /// First record lacks the message-begin flag, or a later record carries it
    #[error("message-begin flag misplaced at record {index}")]
    MessageBegin { index: usize },

    /// Bytes follow the record flagged as message-end, or no record carries it
    #[error("message-end flag misplaced at record {index}")]
    MessageEnd { index: usize },

    /// Record type or ID does not fit its one-byte length field
    #[error("record {index}: {field} is {len} bytes (max 255)")]
    FieldTooLong {
        index: usize,
        field: &'static str,
        len: usize,
    },

    /// Chunked records (CF flag) are not supported
    #[error("chunked records are not supported")]
    Chunked,

    /// Record is not a well-known URI record
    #[error("not a URI record")]
    NotUri,

    /// URI identifier code outside the NFC Forum table
    #[error("unknown URI identifier code 0x{0:02x}")]
    UnknownUriCode(u8),

    /// URI payload is not valid UTF-8
    #[error("invalid utf-8 in URI payload")]
    InvalidUtf8,

    /// Link cannot be interpreted as a URI
    #[error("invalid uri: {0}")]
    InvalidUri(String),
}
