use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tapwrite_core::{
    AppAction, AppReconciler, AppState, AppUpdate, FfiApp, NfcTagHandle, SimulatedTag,
    WriteReport,
};

const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

struct ChannelReconciler(flume::Sender<AppUpdate>);

impl AppReconciler for ChannelReconciler {
    fn reconcile(&self, update: AppUpdate) {
        let _ = self.0.send(update);
    }
}

/// How each simulated tag is built.
#[derive(Debug, Clone)]
pub struct TagPlan {
    pub capacity: u32,
    pub formatable: bool,
    pub read_only_at: Vec<usize>,
}

impl TagPlan {
    pub fn build(&self, index: usize) -> SimulatedTag {
        let id = (index as u32).to_be_bytes().to_vec();
        let tag = if self.formatable {
            SimulatedTag::formatable(id, self.capacity)
        } else {
            SimulatedTag::ndef(id, self.capacity)
        };
        if self.read_only_at.contains(&index) {
            tag.read_only()
        } else {
            tag
        }
    }
}

/// What one tap produced: the write report (none when nothing was
/// attempted) and the toast shown afterwards.
#[derive(Debug)]
pub struct Tap {
    pub report: Option<WriteReport>,
    pub toast: Option<String>,
    pub contents: Option<Vec<u8>>,
}

/// An app core driven from the terminal, one operation at a time.
pub struct Session {
    app: Arc<FfiApp>,
    updates: flume::Receiver<AppUpdate>,
}

impl Session {
    pub fn start(state_dir: &Path) -> Self {
        let app = FfiApp::new(state_dir.to_string_lossy().to_string());
        let (tx, rx) = flume::unbounded();
        app.listen_for_updates(Box::new(ChannelReconciler(tx)));
        app.dispatch(AppAction::NfcAvailabilityChanged { available: true });
        Self { app, updates: rx }
    }

    pub fn state(&self) -> AppState {
        self.app.state()
    }

    /// Load `path` and return the number of links queued.
    pub fn load(&self, path: &Path) -> Result<u32> {
        self.app.dispatch(AppAction::LoadLinksFromPath {
            path: path.to_string_lossy().to_string(),
        });
        let mut loaded = None;
        loop {
            match self.next_update()? {
                AppUpdate::LinksLoaded { count, .. } => loaded = Some(count),
                AppUpdate::FullState(s) if !s.busy.loading && s.toast.is_some() => {
                    return loaded.ok_or_else(|| anyhow!(s.toast.unwrap_or_default()));
                }
                _ => {}
            }
        }
    }

    pub fn tap(&self, tag: SimulatedTag) -> Result<Tap> {
        let tag = Arc::new(tag);
        let handle: Arc<dyn NfcTagHandle> = tag.clone();
        self.app.send_tag(handle);

        let mut report = None;
        loop {
            match self.next_update()? {
                AppUpdate::TagWritten { report: r, .. }
                | AppUpdate::TagWriteFailed { report: r, .. } => report = Some(r),
                AppUpdate::FullState(s) if !s.busy.writing && s.toast.is_some() => {
                    return Ok(Tap {
                        report,
                        toast: s.toast,
                        contents: tag.snapshot().contents,
                    });
                }
                _ => {}
            }
        }
    }

    fn next_update(&self) -> Result<AppUpdate> {
        self.updates
            .recv_timeout(UPDATE_TIMEOUT)
            .context("app core stopped responding")
    }
}
