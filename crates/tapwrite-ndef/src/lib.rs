//! NFC Data Exchange Format support for tapwrite.
//!
//! Only what writing links needs: well-known URI records with the NFC Forum
//! prefix abbreviation table, and the message framing around them.

mod error;
mod message;
mod uri;

pub use error::NdefError;
pub use message::{NdefMessage, NdefRecord, Tnf, RTD_URI};
pub use uri::{normalize_scheme, UriRecord, URI_PREFIXES};

/// Encode `link` as a single-record URI message.
pub fn encode_uri_message(link: &str) -> Result<Vec<u8>, NdefError> {
    let uri = UriRecord::parse(link)?;
    Ok(NdefMessage::single_uri(&uri).encode())
}

/// Decode a message and return the URI of its first record.
pub fn decode_first_uri(bytes: &[u8]) -> Result<String, NdefError> {
    let message = NdefMessage::decode(bytes)?;
    message.records()[0].to_uri().map(|u| u.uri())
}
