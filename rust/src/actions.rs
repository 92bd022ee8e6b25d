#[derive(uniffi::Enum, Debug, Clone)]
pub enum AppAction {
    // Device
    NfcAvailabilityChanged {
        available: bool,
    },

    // Queue
    LoadLinks {
        source: Option<String>,
        text: String,
    },
    LoadLinksFromPath {
        path: String,
    },
    ResetQueue,

    // UI
    ClearToast,
}

impl AppAction {
    /// Log-safe action tag (never includes file contents).
    pub fn tag(&self) -> &'static str {
        match self {
            // Device
            AppAction::NfcAvailabilityChanged { .. } => "NfcAvailabilityChanged",

            // Queue
            AppAction::LoadLinks { .. } => "LoadLinks",
            AppAction::LoadLinksFromPath { .. } => "LoadLinksFromPath",
            AppAction::ResetQueue => "ResetQueue",

            // UI
            AppAction::ClearToast => "ClearToast",
        }
    }
}
