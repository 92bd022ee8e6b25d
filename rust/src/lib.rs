mod actions;
mod core;
mod logging;
mod nfc_tag;
mod sim_tag;
mod state;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::AppAction;
pub use nfc_tag::*;
pub use state::*;
pub use updates::*;

// Not exposed over UniFFI; used by the CLI and tests.
pub use crate::core::{
    decode_link_file, load_app_config, load_app_config_file, read_link_file, AppConfig,
    LinkFileFormat, LinkQueue, LoadError, CONFIG_FILE_NAME,
};
pub use sim_tag::{SimTagSnapshot, SimulatedTag};

/// Encode `link` exactly as it would be written to a tag.
#[uniffi::export]
pub fn encode_link_message(link: &str) -> Vec<u8> {
    crate::core::uri_message_bytes(link)
}

/// Count of links `text` would load with default parsing rules.
#[uniffi::export]
pub fn count_links(text: &str) -> u32 {
    let n = LinkFileFormat::default().parse(text).len();
    u32::try_from(n).unwrap_or(u32::MAX)
}

uniffi::setup_scaffolding!();

#[uniffi::export(callback_interface)]
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

#[derive(uniffi::Object)]
pub struct FfiApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
}

#[uniffi::export]
impl FfiApp {
    #[uniffi::constructor]
    pub fn new(data_dir: String) -> Arc<Self> {
        logging::init_logging();
        tracing::info!(data_dir = %data_dir, "FfiApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));

        // Actor loop thread (single threaded "app actor"). Tag I/O runs here too,
        // so one tag is handled to completion before the next event is read.
        let shared_for_core = shared_state.clone();
        thread::spawn(move || {
            let mut core = crate::core::AppCore::new(update_tx, data_dir, shared_for_core);
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
        })
    }

    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    /// Host NFC dispatch entry point (foreground dispatch / reader mode).
    pub fn on_tag_detected(&self, tag: Box<dyn NfcTagHandle>) {
        let tag: Arc<dyn NfcTagHandle> = Arc::from(tag);
        self.send_tag(tag);
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }
}

impl FfiApp {
    /// Same as `on_tag_detected`, for Rust callers that keep their own handle
    /// to the tag (tests, the CLI simulator).
    pub fn send_tag(&self, tag: Arc<dyn NfcTagHandle>) {
        let _ = self.core_tx.send(CoreMsg::Internal(Box::new(
            InternalEvent::TagDetected {
                tag: DetectedTag(tag),
            },
        )));
    }
}
