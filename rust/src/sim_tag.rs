use std::sync::Mutex;

use crate::nfc_tag::{NfcTagHandle, TagIoResult, TagTechnology};

/// In-memory tag used by tests and the desktop simulator.
///
/// Not exposed over UniFFI; hosts provide real tags through [`NfcTagHandle`].
#[derive(Debug)]
pub struct SimulatedTag {
    id: Vec<u8>,
    inner: Mutex<SimInner>,
}

#[derive(Debug, Clone)]
struct SimInner {
    technology: TagTechnology,
    writable: bool,
    capacity: u32,
    fail_io: Option<String>,
    connected: bool,
    connects: u32,
    closes: u32,
    contents: Option<Vec<u8>>,
}

/// Counters and contents observed after a session with the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTagSnapshot {
    pub technology: TagTechnology,
    pub connected: bool,
    pub connects: u32,
    pub closes: u32,
    pub contents: Option<Vec<u8>>,
}

impl SimulatedTag {
    /// Writable NDEF tag with `capacity` bytes of message space.
    pub fn ndef(id: impl Into<Vec<u8>>, capacity: u32) -> Self {
        Self::with(id, TagTechnology::Ndef, capacity)
    }

    /// Blank tag that becomes an NDEF tag once formatted.
    pub fn formatable(id: impl Into<Vec<u8>>, capacity: u32) -> Self {
        Self::with(id, TagTechnology::NdefFormatable, capacity)
    }

    pub fn unsupported(id: impl Into<Vec<u8>>) -> Self {
        Self::with(id, TagTechnology::Unsupported, 0)
    }

    fn with(id: impl Into<Vec<u8>>, technology: TagTechnology, capacity: u32) -> Self {
        Self {
            id: id.into(),
            inner: Mutex::new(SimInner {
                technology,
                writable: true,
                capacity,
                fail_io: None,
                connected: false,
                connects: 0,
                closes: 0,
                contents: None,
            }),
        }
    }

    pub fn read_only(self) -> Self {
        self.lock().writable = false;
        self
    }

    /// Make every connect/write/format fail with `message`.
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.lock().fail_io = Some(message.into());
        self
    }

    pub fn snapshot(&self) -> SimTagSnapshot {
        let g = self.lock();
        SimTagSnapshot {
            technology: g.technology,
            connected: g.connected,
            connects: g.connects,
            closes: g.closes,
            contents: g.contents.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

impl NfcTagHandle for SimulatedTag {
    fn id(&self) -> Vec<u8> {
        self.id.clone()
    }

    fn technology(&self) -> TagTechnology {
        self.lock().technology
    }

    fn connect(&self) -> TagIoResult {
        let mut g = self.lock();
        if let Some(msg) = &g.fail_io {
            return TagIoResult::failed(msg.clone());
        }
        if g.connected {
            return TagIoResult::failed("already connected");
        }
        g.connected = true;
        g.connects += 1;
        TagIoResult::ok()
    }

    fn close(&self) {
        let mut g = self.lock();
        if g.connected {
            g.connected = false;
            g.closes += 1;
        }
    }

    fn is_writable(&self) -> bool {
        self.lock().writable
    }

    fn max_size(&self) -> u32 {
        self.lock().capacity
    }

    fn write_ndef(&self, message: Vec<u8>) -> TagIoResult {
        let mut g = self.lock();
        if !g.connected {
            return TagIoResult::failed("not connected");
        }
        if g.technology != TagTechnology::Ndef {
            return TagIoResult::failed("tag is not NDEF formatted");
        }
        if !g.writable {
            return TagIoResult::failed("tag is read-only");
        }
        if message.len() > g.capacity as usize {
            return TagIoResult::failed("message exceeds tag capacity");
        }
        g.contents = Some(message);
        TagIoResult::ok()
    }

    fn format_ndef(&self, message: Vec<u8>) -> TagIoResult {
        let mut g = self.lock();
        if let Some(msg) = &g.fail_io {
            return TagIoResult::failed(msg.clone());
        }
        if !g.connected {
            return TagIoResult::failed("not connected");
        }
        if g.technology != TagTechnology::NdefFormatable {
            return TagIoResult::failed("tag is already formatted");
        }
        if message.len() > g.capacity as usize {
            return TagIoResult::failed("message exceeds tag capacity");
        }
        g.technology = TagTechnology::Ndef;
        g.contents = Some(message);
        TagIoResult::ok()
    }
}
