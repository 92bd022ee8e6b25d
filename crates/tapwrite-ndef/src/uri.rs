use crate::error::NdefError;

/// NFC Forum URI Record Type Definition identifier codes. Index is the code.
pub const URI_PREFIXES: &[&str] = &[
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// A URI split into its abbreviation code and the remaining text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UriRecord {
    code: u8,
    rest: String,
}

impl UriRecord {
    /// Build a record from an already-validated URI string. The scheme is
    /// lower-cased and the longest matching table prefix is abbreviated.
    pub fn new(uri: &str) -> Self {
        let uri = normalize_scheme(uri);
        let (code, prefix) = URI_PREFIXES
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, p)| uri.starts_with(*p))
            .max_by_key(|(_, p)| p.len())
            .map(|(i, p)| (i as u8, *p))
            .unwrap_or((0, ""));
        Self {
            code,
            rest: uri[prefix.len()..].to_string(),
        }
    }

    /// Parse a user-supplied link. Rejects empty input and anything carrying
    /// whitespace or control characters, which no URI grammar allows.
    pub fn parse(link: &str) -> Result<Self, NdefError> {
        let trimmed = link.trim();
        if trimmed.is_empty() {
            return Err(NdefError::InvalidUri(link.to_string()));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(NdefError::InvalidUri(trimmed.to_string()));
        }
        Ok(Self::new(trimmed))
    }

    /// The empty URI: identifier code 0 with no text.
    pub fn empty() -> Self {
        Self {
            code: 0,
            rest: String::new(),
        }
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    /// Full URI with the abbreviation expanded.
    pub fn uri(&self) -> String {
        format!("{}{}", URI_PREFIXES[self.code as usize], self.rest)
    }

    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.rest.is_empty()
    }

    pub(crate) fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.rest.len());
        out.push(self.code);
        out.extend_from_slice(self.rest.as_bytes());
        out
    }

    pub(crate) fn from_payload(payload: &[u8]) -> Result<Self, NdefError> {
        let Some((&code, rest)) = payload.split_first() else {
            return Err(NdefError::Truncated { offset: 0 });
        };
        if code as usize >= URI_PREFIXES.len() {
            return Err(NdefError::UnknownUriCode(code));
        }
        let rest = std::str::from_utf8(rest).map_err(|_| NdefError::InvalidUtf8)?;
        Ok(Self {
            code,
            rest: rest.to_string(),
        })
    }
}

/// Lower-case an RFC 3986 scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`)
/// if the string starts with one. Everything after the colon is untouched.
pub fn normalize_scheme(uri: &str) -> String {
    let Some(colon) = uri.find(':') else {
        return uri.to_string();
    };
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return uri.to_string();
    }
    format!("{}{}", scheme.to_ascii_lowercase(), &uri[colon..])
}
