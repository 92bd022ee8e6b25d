use tapwrite_ndef::{NdefMessage, UriRecord};

use crate::nfc_tag::{NfcTagHandle, TagTechnology};
use crate::state::WriteOutcome;

/// Build the single URI record message for `link`.
///
/// A link that does not parse as a URI is written as the empty URI, matching
/// what shipped tags already carry.
pub(crate) fn uri_message(link: &str) -> NdefMessage {
    let uri = match UriRecord::parse(link) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(%e, "link is not a URI; writing empty URI record");
            UriRecord::empty()
        }
    };
    NdefMessage::single_uri(&uri)
}

/// Open connection to a tag. Closed on drop.
struct TagConnection<'a> {
    tag: &'a dyn NfcTagHandle,
}

impl<'a> TagConnection<'a> {
    fn open(tag: &'a dyn NfcTagHandle) -> Result<Self, String> {
        tag.connect().into_result()?;
        Ok(Self { tag })
    }
}

impl Drop for TagConnection<'_> {
    fn drop(&mut self) {
        self.tag.close();
    }
}

pub(crate) fn write_link(tag: &dyn NfcTagHandle, link: &str) -> WriteOutcome {
    let bytes = uri_message(link).encode();
    match tag.technology() {
        TagTechnology::Ndef => write_ndef(tag, bytes),
        TagTechnology::NdefFormatable => format_ndef(tag, bytes),
        TagTechnology::Unsupported => WriteOutcome::UnsupportedTag,
    }
}

fn write_ndef(tag: &dyn NfcTagHandle, bytes: Vec<u8>) -> WriteOutcome {
    let conn = match TagConnection::open(tag) {
        Ok(c) => c,
        Err(message) => return WriteOutcome::IoFailure { message },
    };
    if !conn.tag.is_writable() {
        return WriteOutcome::ReadOnlyTag;
    }
    let max_size = conn.tag.max_size();
    if bytes.len() > max_size as usize {
        return WriteOutcome::MessageTooLarge {
            size: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
            max_size,
        };
    }
    match conn.tag.write_ndef(bytes).into_result() {
        Ok(()) => WriteOutcome::Success,
        Err(message) => WriteOutcome::IoFailure { message },
    }
}

fn format_ndef(tag: &dyn NfcTagHandle, bytes: Vec<u8>) -> WriteOutcome {
    let conn = match TagConnection::open(tag) {
        Ok(c) => c,
        Err(message) => return WriteOutcome::IoFailure { message },
    };
    match conn.tag.format_ndef(bytes).into_result() {
        Ok(()) => WriteOutcome::Success,
        Err(message) => WriteOutcome::IoFailure { message },
    }
}
