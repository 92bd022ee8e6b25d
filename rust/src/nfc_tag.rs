/// Data-exchange capability a tag offers, as probed by the host
/// (`Ndef.get(tag)` / `NdefFormatable.get(tag)` on Android).
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTechnology {
    /// Tag already speaks NDEF and can take a message directly.
    Ndef,
    /// Tag is blank but can be formatted with a first NDEF message.
    NdefFormatable,
    Unsupported,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct TagIoResult {
    pub ok: bool,
    pub error_message: Option<String>,
}

impl TagIoResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_message: Some(message.into()),
        }
    }

    pub(crate) fn into_result(self) -> Result<(), String> {
        if self.ok {
            Ok(())
        } else {
            Err(self
                .error_message
                .unwrap_or_else(|| "tag i/o error".to_string()))
        }
    }
}

/// Host-side handle for one detected tag. Every method is called from the
/// actor thread while the tag is still in the field.
///
/// Messages are passed as encoded NDEF bytes; hosts rebuild their native
/// message type from them (`NdefMessage(bytes)` on Android).
#[uniffi::export(callback_interface)]
pub trait NfcTagHandle: Send + Sync + 'static {
    fn id(&self) -> Vec<u8>;
    fn technology(&self) -> TagTechnology;
    fn connect(&self) -> TagIoResult;
    fn close(&self);
    fn is_writable(&self) -> bool;
    fn max_size(&self) -> u32;
    fn write_ndef(&self, message: Vec<u8>) -> TagIoResult;
    fn format_ndef(&self, message: Vec<u8>) -> TagIoResult;
}
