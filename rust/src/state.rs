#[derive(uniffi::Record, Clone, Debug)]
pub struct AppState {
    pub rev: u64,
    pub nfc: NfcAvailability,
    pub queue: QueueState,
    pub busy: BusyState,
    pub last_write: Option<WriteReport>,
    pub toast: Option<String>,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            nfc: NfcAvailability::Unknown,
            queue: QueueState::empty(),
            busy: BusyState::idle(),
            last_write: None,
            toast: None,
        }
    }
}

/// Whether the device can talk to tags at all. Reported once by the host
/// after it probes for an NFC adapter.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NfcAvailability {
    Unknown,
    Available,
    Unsupported,
}

/// Projection of the link queue for the status screen.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct QueueState {
    /// Display name of the loaded file, if the host gave one.
    pub source: Option<String>,
    pub links: Vec<String>,
    pub total: u32,
    pub written: u32,
    pub remaining: u32,
    pub next_link: Option<String>,
}

impl QueueState {
    pub fn empty() -> Self {
        Self {
            source: None,
            links: vec![],
            total: 0,
            written: 0,
            remaining: 0,
            next_link: None,
        }
    }
}

/// "In flight" flags the UI should reflect while the actor is working.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct BusyState {
    pub loading: bool,
    pub writing: bool,
}

impl BusyState {
    pub fn idle() -> Self {
        Self {
            loading: false,
            writing: false,
        }
    }
}

/// Result of one write attempt against one tag.
#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    ReadOnlyTag,
    MessageTooLarge { size: u32, max_size: u32 },
    UnsupportedTag,
    IoFailure { message: String },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success)
    }

    /// Short human-readable reason, used in toasts and logs.
    pub fn describe(&self) -> String {
        match self {
            WriteOutcome::Success => "ok".to_string(),
            WriteOutcome::ReadOnlyTag => "tag is read-only".to_string(),
            WriteOutcome::MessageTooLarge { size, max_size } => {
                format!("message too large: {size}B > {max_size}B")
            }
            WriteOutcome::UnsupportedTag => "tag does not support NDEF".to_string(),
            WriteOutcome::IoFailure { message } => format!("i/o failure: {message}"),
        }
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct WriteReport {
    /// Position of `link` in the queue when the write was attempted.
    pub index: u32,
    pub link: String,
    pub outcome: WriteOutcome,
}
