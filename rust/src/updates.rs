use std::sync::Arc;

use crate::nfc_tag::NfcTagHandle;
use crate::state::{AppState, WriteReport};
use crate::AppAction;

#[derive(uniffi::Enum, Clone, Debug)]
pub enum AppUpdate {
    FullState(AppState),
    LinksLoaded {
        rev: u64,
        count: u32,
    },
    TagWritten {
        rev: u64,
        report: WriteReport,
    },
    TagWriteFailed {
        rev: u64,
        report: WriteReport,
    },
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
            AppUpdate::LinksLoaded { rev, .. } => *rev,
            AppUpdate::TagWritten { rev, .. } => *rev,
            AppUpdate::TagWriteFailed { rev, .. } => *rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(AppAction),
    Internal(Box<InternalEvent>),
}

#[derive(Debug)]
pub enum InternalEvent {
    // Host NFC dispatch
    TagDetected { tag: DetectedTag },
}

/// A tag handed over by the host. Kept opaque so `InternalEvent` stays `Debug`.
pub struct DetectedTag(pub Arc<dyn NfcTagHandle>);

impl std::fmt::Debug for DetectedTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DetectedTag")
            .field(&hex::encode(self.0.id()))
            .finish()
    }
}
