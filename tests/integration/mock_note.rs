//! Mock Notecard for integration tests.
//!
//! Emulates the notefile store (per-file note queues), the relay link, and
//! the status query, and records every request so tests can assert on the
//! full transaction history without real hardware.

use std::collections::{HashMap, HashSet, VecDeque};

use notebridge::TransportLink;
use notebridge::config::{NOTEFILE_INBOUND, NOTEFILE_OUTBOUND};
use notebridge::error::SessionError;
use notebridge::note::{Notecard, Request, Response, Value};

pub struct MockNotecard {
    /// Relay (Notehub) session established.
    pub hub_connected: bool,
    /// Free-text status string returned by `hub.status`.
    pub status_text: String,
    pub device_uid: String,
    pub epoch_time: i64,
    /// Per-notefile queues of note payloads.
    pub files: HashMap<String, VecDeque<Vec<u8>>>,
    /// Every request issued, in order.
    pub sent: Vec<Request>,
    /// Request names answered with a protocol `err`.
    pub fail: HashSet<&'static str>,
    /// Request names answered with a host allocation failure.
    pub refuse: HashSet<&'static str>,
    pub begin_calls: u32,
    pub begin_error: Option<SessionError>,
    pub last_link: Option<TransportLink>,
}

#[allow(dead_code)]
impl MockNotecard {
    pub fn new() -> Self {
        Self {
            hub_connected: false,
            status_text: "cell registered {connected}".into(),
            device_uid: "dev:868050040000000".into(),
            epoch_time: 1_700_000_000,
            files: HashMap::new(),
            sent: Vec::new(),
            fail: HashSet::new(),
            refuse: HashSet::new(),
            begin_calls: 0,
            begin_error: None,
            last_link: None,
        }
    }

    /// A mock whose relay session is already up.
    pub fn connected() -> Self {
        let mut mock = Self::new();
        mock.hub_connected = true;
        mock
    }

    /// Simulate the relay round trip: every outbound note is delivered
    /// back into the inbound notefile, in order.
    pub fn deliver_loopback(&mut self) {
        let outbound: Vec<_> = self
            .files
            .get_mut(NOTEFILE_OUTBOUND)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default();
        let inbound = self.files.entry(NOTEFILE_INBOUND.into()).or_default();
        inbound.extend(outbound);
    }

    /// Queue a note as if the relay had pushed it down.
    pub fn push_inbound(&mut self, payload: &[u8]) {
        self.files
            .entry(NOTEFILE_INBOUND.into())
            .or_default()
            .push_back(payload.to_vec());
    }

    pub fn count(&self, name: &str) -> usize {
        self.sent.iter().filter(|r| r.name() == name).count()
    }

    pub fn last(&self, name: &str) -> Option<&Request> {
        self.sent.iter().rev().find(|r| r.name() == name)
    }

    fn file_of(req: &Request) -> String {
        match req.field("file") {
            Some(Value::Text(f)) => f.clone(),
            _ => String::new(),
        }
    }
}

impl Default for MockNotecard {
    fn default() -> Self {
        Self::new()
    }
}

impl Notecard for MockNotecard {
    fn begin(&mut self, link: &TransportLink) -> Result<(), SessionError> {
        self.begin_calls += 1;
        self.last_link = Some(*link);
        self.begin_error.map_or(Ok(()), Err)
    }

    fn transact(&mut self, req: Request) -> Option<Response> {
        let name = req.name();
        self.sent.push(req.clone());

        if self.refuse.contains(&name) {
            return None;
        }
        if self.fail.contains(&name) {
            return Some(Response::error("forced failure {io}"));
        }

        match name {
            "hub.status" => Some(
                Response::new()
                    .with("status", Value::Text(self.status_text.clone()))
                    .with("connected", Value::Bool(self.hub_connected)),
            ),
            "hub.get" => {
                Some(Response::new().with("device", Value::Text(self.device_uid.clone())))
            }
            "hub.set" | "note.template" | "card.attn" => Some(Response::new()),
            "card.time" => Some(Response::new().with("time", Value::Int(self.epoch_time))),
            "note.add" => {
                let file = Self::file_of(&req);
                if let Some(Value::Blob(payload)) = req.field("payload") {
                    self.files.entry(file).or_default().push_back(payload.clone());
                }
                Some(Response::new())
            }
            "note.get" => {
                let file = Self::file_of(&req);
                let consume = matches!(req.field("delete"), Some(Value::Bool(true)));
                let queue = self.files.entry(file).or_default();
                match queue.front() {
                    Some(payload) => {
                        let rsp = Response::new().with("payload", Value::Blob(payload.clone()));
                        if consume {
                            queue.pop_front();
                        }
                        Some(rsp)
                    }
                    None => Some(Response::error("note does not exist {note-noexist}")),
                }
            }
            other => Some(Response::error(format!("unknown request {other}"))),
        }
    }
}

/// Clock the tests advance by hand.
pub struct ManualClock(pub std::cell::Cell<u64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self(std::cell::Cell::new(0))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl notebridge::clock::Clock for &ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
