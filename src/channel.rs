//! Queue channels — named, directional notefiles used as message queues.
//!
//! Two fixed instances exist per handler: an inbound channel the relay
//! pushes notes into, and an outbound channel the host adds notes to. Each
//! carries a compact binary-payload template and a narrowband port so the
//! same notefiles work on LoRa/satellite Notecards.

use log::{debug, error, info};

use crate::error::ChannelError;
use crate::note::{ERR_NOTE_NOEXIST, Notecard, Request, Response};

/// Descriptor for one directional queue channel.
///
/// Fixed for the handler's lifetime; all methods borrow the transaction
/// capability rather than owning it, because both channels share the one
/// physical link.
#[derive(Debug, Clone, Copy)]
pub struct QueueChannel {
    file: &'static str,
    port: i64,
}

/// Internal three-way classification of a dequeue attempt.
///
/// Only `Empty` (the `{note-noexist}` token) may rearm the hardware
/// interrupt; `Failed` must not, and both degrade to "no data" at the
/// stream interface.
#[derive(Debug, PartialEq)]
pub enum Dequeue {
    /// A note was retrieved; here is its binary payload.
    Payload(Vec<u8>),
    /// The notefile is confirmed empty.
    Empty,
    /// The transaction could not be issued or returned some other error.
    Failed,
}

impl QueueChannel {
    pub const fn new(file: &'static str, port: i64) -> Self {
        Self { file, port }
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Declare the channel's compact binary template. Idempotent — INIT may
    /// repeat it on every restart.
    pub fn declare_template(&self, note: &mut impl Notecard) -> Result<(), ChannelError> {
        let req = Request::new("note.template")
            .text("file", self.file)
            .text("format", "compact")
            .int("port", self.port);
        debug!("declaring template: {}", req.to_debug_json());

        let Some(rsp) = note.transact(req) else {
            return Err(ChannelError::OutOfMemory);
        };
        if let Some(err) = rsp.err() {
            error!("{}: template declaration failed: {err}", self.file);
            return Err(ChannelError::Transaction);
        }
        Ok(())
    }

    /// Add a note carrying `payload`. With `sync`, the add also requests
    /// immediate synchronization with the relay instead of waiting for the
    /// next scheduled sync.
    pub fn enqueue(
        &self,
        note: &mut impl Notecard,
        payload: &[u8],
        sync: bool,
    ) -> Result<(), ChannelError> {
        let mut req = Request::new("note.add")
            .text("file", self.file)
            .blob("payload", payload);
        if sync {
            req = req.flag("sync", true);
        }

        let Some(rsp) = note.transact(req) else {
            return Err(ChannelError::OutOfMemory);
        };
        if let Some(err) = rsp.err() {
            error!("{}: note.add failed: {err}", self.file);
            return Err(ChannelError::Transaction);
        }
        info!("{}: message sent ({} bytes)", self.file, payload.len());
        Ok(())
    }

    /// Retrieve the oldest note, consuming it when `consume` is set.
    pub fn dequeue(&self, note: &mut impl Notecard, consume: bool) -> Dequeue {
        let mut req = Request::new("note.get").text("file", self.file);
        if consume {
            req = req.flag("delete", true);
        }
        self.classify(note.transact(req))
    }

    /// Pure classification of a `note.get` outcome, split out so the
    /// empty-vs-failed distinction is testable without a transport.
    fn classify(&self, rsp: Option<Response>) -> Dequeue {
        let Some(rsp) = rsp else {
            return Dequeue::Failed;
        };
        if let Some(err) = rsp.err() {
            if err.contains(ERR_NOTE_NOEXIST) {
                return Dequeue::Empty;
            }
            // Anything else still means no note is available; the caller
            // sees "no data" either way.
            debug!("{}: note.get error treated as no data: {err}", self.file);
            return Dequeue::Failed;
        }
        match rsp.blob("payload") {
            Some(bytes) => Dequeue::Payload(bytes.to_vec()),
            // A note with no payload field yields an empty byte sequence.
            None => Dequeue::Payload(Vec::new()),
        }
    }
}
