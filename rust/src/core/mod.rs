mod config;
mod queue;
mod writer;

use std::path::Path;
use std::sync::{Arc, RwLock};

use flume::Sender;

use crate::actions::AppAction;
use crate::nfc_tag::NfcTagHandle;
use crate::state::{BusyState, NfcAvailability, QueueState, WriteOutcome, WriteReport};
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};

pub use config::{load_app_config, load_app_config_file, AppConfig, CONFIG_FILE_NAME};
pub use queue::{decode_link_file, read_link_file, LinkFileFormat, LinkQueue, LoadError};

const NFC_UNSUPPORTED_MESSAGE: &str = "NFC is not supported on this device";

pub fn uri_message_bytes(link: &str) -> Vec<u8> {
    writer::uri_message(link).encode()
}

pub struct AppCore {
    pub state: crate::state::AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    shared_state: Arc<RwLock<crate::state::AppState>>,

    config: AppConfig,
    format: LinkFileFormat,
    queue: LinkQueue,
}

impl AppCore {
    pub fn new(
        update_sender: Sender<AppUpdate>,
        data_dir: String,
        shared_state: Arc<RwLock<crate::state::AppState>>,
    ) -> Self {
        let config = load_app_config(&data_dir);
        Self::with_config(update_sender, config, shared_state)
    }

    pub fn with_config(
        update_sender: Sender<AppUpdate>,
        config: AppConfig,
        shared_state: Arc<RwLock<crate::state::AppState>>,
    ) -> Self {
        let format = config.link_file_format();
        tracing::debug!(separator = %format.separator, uri_prefixes = ?format.uri_prefixes, "link file format");

        let this = Self {
            state: crate::state::AppState::empty(),
            rev: 0,
            update_sender,
            shared_state,
            config,
            format,
            queue: LinkQueue::new(),
        };

        // Ensure FfiApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &crate::state::AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    /// Side-effect update: bumps rev and keeps the snapshot in step, but does
    /// not resend the whole state.
    fn emit_side_effect(&mut self, make: impl FnOnce(u64) -> AppUpdate) {
        let rev = self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(make(rev));
    }

    fn toast(&mut self, msg: impl Into<String>) {
        // Toast stays in state until the UI clears it, so a resync from
        // state() still shows it.
        self.state.toast = Some(msg.into());
        self.emit_state();
    }

    fn set_busy(&mut self, f: impl FnOnce(&mut BusyState)) {
        let mut next = self.state.busy.clone();
        f(&mut next);
        if next != self.state.busy {
            self.state.busy = next;
            self.emit_state();
        }
    }

    /// End of a busy operation: clear busy flags and show `msg` in a single
    /// update, so listeners see one final state per operation.
    fn finish_with_toast(&mut self, msg: impl Into<String>) {
        self.state.busy = BusyState::idle();
        self.toast(msg);
    }

    fn is_halted(&self) -> bool {
        self.state.nfc == NfcAvailability::Unsupported
    }

    /// Project the queue into `state.queue`. Caller emits.
    fn sync_queue_state(&mut self) {
        let q = &self.queue;
        let source = self.state.queue.source.take();
        self.state.queue = QueueState {
            source,
            links: q.links().to_vec(),
            total: as_u32(q.len()),
            written: as_u32(q.cursor()),
            remaining: as_u32(q.remaining()),
            next_link: q.current().map(str::to_string),
        };
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(action) => {
                // Never log `?action`: LoadLinks carries whole files.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action);
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::TagDetected { tag } => self.handle_tag(tag.0.as_ref()),
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        if self.is_halted() && !matches!(action, AppAction::ClearToast) {
            tracing::debug!(action = action.tag(), "ignored: nfc unsupported");
            return;
        }
        match action {
            // Device
            AppAction::NfcAvailabilityChanged { available } => {
                if available {
                    self.state.nfc = NfcAvailability::Available;
                    self.emit_state();
                } else {
                    tracing::error!("no nfc adapter; halting");
                    self.state.nfc = NfcAvailability::Unsupported;
                    self.toast(NFC_UNSUPPORTED_MESSAGE);
                }
            }

            // Queue
            AppAction::LoadLinks { source, text } => {
                self.set_busy(|b| b.loading = true);
                let msg = match self.load_text(source, &text) {
                    Ok(count) => format!("Links loaded: {count}"),
                    Err(msg) => msg,
                };
                self.finish_with_toast(msg);
            }
            AppAction::LoadLinksFromPath { path } => {
                self.set_busy(|b| b.loading = true);
                let p = Path::new(&path);
                let result = match read_link_file(p) {
                    Ok(text) => {
                        let source = p
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .or(Some(path.clone()));
                        self.load_text(source, &text)
                    }
                    Err(e) => {
                        tracing::warn!(%e, "load failed");
                        Err(format!("Could not read link file: {e}"))
                    }
                };
                let msg = match result {
                    Ok(count) => format!("Links loaded: {count}"),
                    Err(msg) => msg,
                };
                self.finish_with_toast(msg);
            }
            AppAction::ResetQueue => {
                self.queue.reset();
                self.sync_queue_state();
                self.emit_state();
            }

            // UI
            AppAction::ClearToast => {
                if self.state.toast.is_some() {
                    self.state.toast = None;
                    self.emit_state();
                }
            }
        }
    }

    /// Replace the queue with the links in `text`. On rejection the queue is
    /// untouched and the error is the toast to show.
    fn load_text(&mut self, source: Option<String>, text: &str) -> Result<usize, String> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let links = self.format.parse(text);
        if let Err(e) = self.config.check_link_count(links.len()) {
            tracing::warn!(%e, "link file rejected");
            return Err(format!("Link file rejected: {e}"));
        }

        let count = self.queue.load_links(links);
        tracing::info!(count, "links loaded");
        self.state.queue.source = source;
        self.state.last_write = None;
        self.sync_queue_state();
        self.emit_side_effect(|rev| AppUpdate::LinksLoaded {
            rev,
            count: as_u32(count),
        });
        Ok(count)
    }

    fn handle_tag(&mut self, tag: &dyn NfcTagHandle) {
        if self.is_halted() {
            return;
        }
        let tag_id = hex::encode(tag.id());
        if self.queue.is_empty() {
            tracing::debug!(tag = %tag_id, "tag ignored: no links loaded");
            self.toast("Load a link file first");
            return;
        }
        let Some(link) = self.queue.current().map(str::to_string) else {
            tracing::debug!(tag = %tag_id, "tag ignored: queue exhausted");
            self.toast("All links written");
            return;
        };
        let index = self.queue.cursor();

        self.set_busy(|b| b.writing = true);
        let outcome = writer::write_link(tag, &link);
        let report = WriteReport {
            index: as_u32(index),
            link: link.clone(),
            outcome: outcome.clone(),
        };
        self.state.last_write = Some(report.clone());

        if outcome.is_success() {
            self.queue.advance();
            self.sync_queue_state();
            tracing::info!(tag = %tag_id, index, remaining = self.queue.remaining(), "tag written");
            self.emit_side_effect(|rev| AppUpdate::TagWritten { rev, report });
            self.finish_with_toast(format!("Written: {link}"));
        } else {
            tracing::warn!(
                tag = %tag_id,
                index,
                outcome = outcome.log_kind(),
                reason = %outcome.describe(),
                "tag write failed"
            );
            self.emit_side_effect(|rev| AppUpdate::TagWriteFailed { rev, report });
            self.finish_with_toast(format!("Write failed: {}", outcome.describe()));
        }
    }

    #[cfg(test)]
    fn queue(&self) -> &LinkQueue {
        &self.queue
    }
}

fn as_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl WriteOutcome {
    pub(crate) fn log_kind(&self) -> &'static str {
        match self {
            WriteOutcome::Success => "success",
            WriteOutcome::ReadOnlyTag => "read_only",
            WriteOutcome::MessageTooLarge { .. } => "too_large",
            WriteOutcome::UnsupportedTag => "unsupported",
            WriteOutcome::IoFailure { .. } => "io_failure",
        }
    }
}
