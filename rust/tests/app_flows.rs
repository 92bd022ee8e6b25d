use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tapwrite_core::{
    count_links, AppAction, AppReconciler, AppUpdate, FfiApp, NfcAvailability, NfcTagHandle, SimulatedTag,
    TagIoResult, TagTechnology, WriteOutcome, CONFIG_FILE_NAME,
};
use tempfile::tempdir;

fn write_config(data_dir: &str, v: serde_json::Value) {
    let path = std::path::Path::new(data_dir).join(CONFIG_FILE_NAME);
    std::fs::write(path, serde_json::to_vec(&v).unwrap()).unwrap();
}

fn wait_until(what: &str, timeout: Duration, mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("{what}: condition not met within {timeout:?}");
}

struct TestReconciler {
    updates: Arc<Mutex<Vec<AppUpdate>>>,
}

impl TestReconciler {
    fn new() -> (Self, Arc<Mutex<Vec<AppUpdate>>>) {
        let updates = Arc::new(Mutex::new(vec![]));
        (
            Self {
                updates: updates.clone(),
            },
            updates,
        )
    }
}

impl AppReconciler for TestReconciler {
    fn reconcile(&self, update: AppUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

/// NDEF tag that accepts the connection but loses the field mid-write.
#[derive(Default)]
struct VanishingTag {
    connects: AtomicU32,
    closes: AtomicU32,
}

impl NfcTagHandle for VanishingTag {
    fn id(&self) -> Vec<u8> {
        vec![0xde, 0xad]
    }

    fn technology(&self) -> TagTechnology {
        TagTechnology::Ndef
    }

    fn connect(&self) -> TagIoResult {
        self.connects.fetch_add(1, Ordering::SeqCst);
        TagIoResult::ok()
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn max_size(&self) -> u32 {
        137
    }

    fn write_ndef(&self, _message: Vec<u8>) -> TagIoResult {
        TagIoResult::failed("Tag was lost.")
    }

    fn format_ndef(&self, _message: Vec<u8>) -> TagIoResult {
        TagIoResult::failed("Tag was lost.")
    }
}

fn new_app() -> (tempfile::TempDir, Arc<FfiApp>) {
    let dir = tempdir().unwrap();
    let app = FfiApp::new(dir.path().to_string_lossy().to_string());
    (dir, app)
}

fn load(app: &FfiApp, text: &str) {
    app.dispatch(AppAction::LoadLinks {
        source: Some("links.csv".into()),
        text: text.into(),
    });
}

fn tap(app: &FfiApp, tag: &Arc<SimulatedTag>) {
    let handle: Arc<dyn NfcTagHandle> = tag.clone();
    app.send_tag(handle);
}

#[test]
fn load_links_parses_file_and_resets_cursor() {
    let (_dir, app) = new_app();
    load(&app, "http://a.com\nb.com,c.com\n\"d.com\"");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 4
    });

    let q = app.state().queue;
    assert_eq!(q.links, vec!["http://a.com", "b.com", "c.com", "d.com"]);
    assert_eq!(q.written, 0);
    assert_eq!(q.remaining, 4);
    assert_eq!(q.next_link.as_deref(), Some("http://a.com"));
}

#[test]
fn taps_write_links_in_order_until_exhausted() {
    let (_dir, app) = new_app();
    let (reconciler, updates) = TestReconciler::new();
    app.listen_for_updates(Box::new(reconciler));

    load(&app, "https://one.example\nhttps://two.example");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 2
    });

    let tags: Vec<Arc<SimulatedTag>> = (0..3u8)
        .map(|i| Arc::new(SimulatedTag::ndef(vec![i], 128)))
        .collect();
    for tag in &tags {
        tap(&app, tag);
    }
    wait_until("all written", Duration::from_secs(2), || {
        app.state().toast.as_deref() == Some("All links written")
    });

    let s = app.state();
    assert_eq!(s.queue.written, 2);
    assert_eq!(s.queue.remaining, 0);
    assert!(s.queue.next_link.is_none());

    let written: Vec<String> = tags[..2]
        .iter()
        .map(|t| tapwrite_ndef::decode_first_uri(&t.snapshot().contents.unwrap()).unwrap())
        .collect();
    assert_eq!(written, vec!["https://one.example", "https://two.example"]);
    assert!(tags[2].snapshot().contents.is_none());
    assert_eq!(tags[2].snapshot().connects, 0);

    wait_until("updates delivered", Duration::from_secs(2), || {
        updates
            .lock()
            .unwrap()
            .last()
            .map(|u| u.rev() == app.state().rev)
            .unwrap_or(false)
    });
    let up = updates.lock().unwrap();
    // Revs must be strictly increasing by 1.
    for w in up.windows(2) {
        assert_eq!(w[0].rev() + 1, w[1].rev());
    }
    let written_indices: Vec<u32> = up
        .iter()
        .filter_map(|u| match u {
            AppUpdate::TagWritten { report, .. } => Some(report.index),
            _ => None,
        })
        .collect();
    assert_eq!(written_indices, vec![0, 1]);
}

#[test]
fn too_small_tag_reports_message_too_large_and_keeps_cursor() {
    let (_dir, app) = new_app();
    load(&app, "https://example.com/a/fairly/long/path");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 1
    });

    let small = Arc::new(SimulatedTag::ndef(vec![1], 8));
    tap(&app, &small);
    wait_until("write attempted", Duration::from_secs(2), || {
        app.state().last_write.is_some()
    });

    let s = app.state();
    let report = s.last_write.unwrap();
    assert!(matches!(
        report.outcome,
        WriteOutcome::MessageTooLarge { max_size: 8, .. }
    ));
    assert_eq!(s.queue.written, 0);
    assert!(s.toast.unwrap().starts_with("Write failed: message too large"));
    assert!(!small.snapshot().connected);

    // Same link goes to the next tag.
    let big = Arc::new(SimulatedTag::ndef(vec![2], 256));
    tap(&app, &big);
    wait_until("written", Duration::from_secs(2), || {
        app.state().queue.written == 1
    });
    assert_eq!(
        tapwrite_ndef::decode_first_uri(&big.snapshot().contents.unwrap()).unwrap(),
        "https://example.com/a/fairly/long/path"
    );
}

#[test]
fn lost_tag_is_io_failure_and_connection_is_released() {
    let (_dir, app) = new_app();
    load(&app, "a.com");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 1
    });

    let tag = Arc::new(VanishingTag::default());
    let handle: Arc<dyn NfcTagHandle> = tag.clone();
    app.send_tag(handle);
    wait_until("write attempted", Duration::from_secs(2), || {
        app.state().last_write.is_some()
    });

    assert_eq!(
        app.state().last_write.unwrap().outcome,
        WriteOutcome::IoFailure {
            message: "Tag was lost.".into()
        }
    );
    assert_eq!(app.state().queue.written, 0);
    assert_eq!(tag.connects.load(Ordering::SeqCst), 1);
    assert_eq!(tag.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn reset_rewinds_without_reloading() {
    let (_dir, app) = new_app();
    load(&app, "a.com\nb.com\nc.com");
    for i in 0..2u8 {
        tap(&app, &Arc::new(SimulatedTag::ndef(vec![i], 64)));
    }
    wait_until("two written", Duration::from_secs(2), || {
        app.state().queue.written == 2
    });

    app.dispatch(AppAction::ResetQueue);
    wait_until("reset", Duration::from_secs(2), || {
        app.state().queue.written == 0
    });
    let q = app.state().queue;
    assert_eq!(q.links, vec!["a.com", "b.com", "c.com"]);
    assert_eq!(q.next_link.as_deref(), Some("a.com"));
    assert_eq!(q.remaining, 3);
}

#[test]
fn load_from_path_uses_file_name_as_source() {
    let (dir, app) = new_app();
    let path = dir.path().join("batch-7.csv");
    std::fs::write(&path, "\u{feff}x.com;y.com\n").unwrap();
    write_config(
        &dir.path().to_string_lossy(),
        serde_json::json!({ "separator": ";" }),
    );
    // Config is read at startup, so build a fresh app over the same dir.
    let app2 = FfiApp::new(dir.path().to_string_lossy().to_string());
    drop(app);

    app2.dispatch(AppAction::LoadLinksFromPath {
        path: path.to_string_lossy().to_string(),
    });
    wait_until("links loaded", Duration::from_secs(2), || {
        app2.state().queue.total == 2
    });
    let q = app2.state().queue;
    assert_eq!(q.source.as_deref(), Some("batch-7.csv"));
    assert_eq!(q.links, vec!["x.com", "y.com"]);
}

#[test]
fn unreadable_file_shows_toast_and_keeps_queue() {
    let (dir, app) = new_app();
    load(&app, "a.com");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 1
    });

    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, [b'a', 0xff, 0xfe]).unwrap();
    app.dispatch(AppAction::LoadLinksFromPath {
        path: bad.to_string_lossy().to_string(),
    });
    wait_until("toast", Duration::from_secs(2), || {
        app.state()
            .toast
            .map(|t| t.starts_with("Could not read link file"))
            .unwrap_or(false)
    });
    let s = app.state();
    assert_eq!(s.queue.links, vec!["a.com"]);
    assert!(!s.busy.loading);
}

#[test]
fn missing_nfc_halts_the_app() {
    let (_dir, app) = new_app();
    app.dispatch(AppAction::NfcAvailabilityChanged { available: false });
    load(&app, "a.com");
    let tag = Arc::new(SimulatedTag::ndef(vec![1], 64));
    tap(&app, &tag);
    app.dispatch(AppAction::ClearToast);

    wait_until("toast cleared", Duration::from_secs(2), || {
        app.state().toast.is_none() && app.state().nfc == NfcAvailability::Unsupported
    });
    assert_eq!(app.state().queue.total, 0);
    assert_eq!(tag.snapshot().connects, 0);
}

#[test]
fn formatable_and_unsupported_tags() {
    let (_dir, app) = new_app();
    app.dispatch(AppAction::NfcAvailabilityChanged { available: true });
    load(&app, "tel:+15550100");

    let unsupported = Arc::new(SimulatedTag::unsupported(vec![1]));
    tap(&app, &unsupported);
    wait_until("unsupported reported", Duration::from_secs(2), || {
        app.state()
            .last_write
            .map(|r| r.outcome == WriteOutcome::UnsupportedTag)
            .unwrap_or(false)
    });
    assert_eq!(app.state().queue.written, 0);

    let blank = Arc::new(SimulatedTag::formatable(vec![2], 64));
    tap(&app, &blank);
    wait_until("formatted", Duration::from_secs(2), || {
        app.state().queue.written == 1
    });
    let snap = blank.snapshot();
    assert_eq!(snap.technology, TagTechnology::Ndef);
    assert_eq!(
        tapwrite_ndef::decode_first_uri(&snap.contents.unwrap()).unwrap(),
        "tel:+15550100"
    );
}

#[test]
fn cr_only_file_loads_one_link_per_line() {
    let (_dir, app) = new_app();
    let text = "https://a.example\rb.example;c.example\r\nd.example\r";
    load(&app, text);
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 3
    });

    let q = app.state().queue;
    assert_eq!(
        q.links,
        vec!["https://a.example", "b.example;c.example", "d.example"]
    );
    assert_eq!(count_links(text), q.total);

    let tag = Arc::new(SimulatedTag::ndef(vec![1], 64));
    tap(&app, &tag);
    wait_until("written", Duration::from_secs(2), || {
        app.state().queue.written == 1
    });
    assert_eq!(
        tapwrite_ndef::decode_first_uri(&tag.snapshot().contents.unwrap()).unwrap(),
        "https://a.example"
    );
}

#[test]
fn non_uri_link_is_written_as_empty_uri_and_advances() {
    let (_dir, app) = new_app();
    load(&app, "not a link\nhttps://next.example");
    wait_until("links loaded", Duration::from_secs(2), || {
        app.state().queue.total == 2
    });

    let tag = Arc::new(SimulatedTag::ndef(vec![1], 64));
    tap(&app, &tag);
    wait_until("written", Duration::from_secs(2), || {
        app.state().toast.as_deref() == Some("Written: not a link")
    });

    let s = app.state();
    assert_eq!(s.last_write.unwrap().outcome, WriteOutcome::Success);
    assert_eq!(s.queue.written, 1);
    assert_eq!(s.queue.next_link.as_deref(), Some("https://next.example"));
    assert_eq!(
        tag.snapshot().contents.unwrap(),
        vec![0xd1, 0x01, 0x01, b'U', 0x00]
    );
}
