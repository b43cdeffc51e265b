//! The connection handler — state machine plus byte-stream interface.
//!
//! Owns the transaction capability, both queue channels, and the inbound
//! buffer. The higher-level sync layer sees a trivial stream surface
//! (`write`/`read`/`available`/`get_time`); the owning driver ticks the
//! state machine at whatever cadence it likes.
//!
//! Single-threaded by design: the inbound buffer is mutated only by
//! `available()` and read only by `read()`, both on the same logical
//! thread as the state-machine ticks, so no locking is needed here. If the
//! physical channel must be shared, mutual exclusion is the caller's
//! responsibility.

mod fsm;

pub use fsm::ConnectionState;

use log::{error, info, warn};

use crate::attn;
use crate::channel::{Dequeue, QueueChannel};
use crate::clock::{Clock, StdClock};
use crate::config::{
    ConnectionConfig, NOTEFILE_INBOUND, NOTEFILE_INBOUND_PORT, NOTEFILE_OUTBOUND,
    NOTEFILE_OUTBOUND_PORT,
};
use crate::error::WriteError;
use crate::note::{Notecard, Request};
use crate::status::{self, ConnectionStatus};

/// Capacity of the resolved device UID (`dev:` prefix plus identifier).
const DEVICE_UID_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Inbound buffer
// ---------------------------------------------------------------------------

/// Single-note byte cursor: the payload of the most recently dequeued note
/// plus a read offset. Replaced wholesale on every successful dequeue,
/// never partially updated.
#[derive(Debug, Default)]
struct InboundBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl InboundBuffer {
    fn has_unread(&self) -> bool {
        self.cursor < self.data.len()
    }

    /// Next byte, advancing the cursor; `None` once exhausted.
    fn next(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.cursor)?;
        self.cursor += 1;
        Some(byte)
    }

    /// Discard the old contents and adopt `payload` with the cursor reset.
    fn adopt(&mut self, payload: Vec<u8>) {
        self.data = payload;
        self.cursor = 0;
    }
}

// ---------------------------------------------------------------------------
// Connection handler
// ---------------------------------------------------------------------------

/// Connection-management adapter over a Notecard-class transactional
/// endpoint.
///
/// Generic over the transaction capability `N` and the wall clock `C` so
/// the whole handler runs against fakes on the host.
pub struct NotecardConnectionHandler<N: Notecard, C: Clock = StdClock> {
    note: N,
    clock: C,
    config: ConnectionConfig,
    state: ConnectionState,
    /// Timestamp recorded on the INIT → CONNECTING transition; the
    /// CONNECTING timeout is measured from here.
    conn_start_ms: u64,
    /// Resolved during INIT, overwritten only by a successful re-init.
    device_uid: heapless::String<DEVICE_UID_CAPACITY>,
    inbound: InboundBuffer,
    inbound_channel: QueueChannel,
    outbound_channel: QueueChannel,
}

impl<N: Notecard> NotecardConnectionHandler<N, StdClock> {
    pub fn new(note: N, config: ConnectionConfig) -> Self {
        Self::with_clock(note, config, StdClock::new())
    }
}

impl<N: Notecard, C: Clock> NotecardConnectionHandler<N, C> {
    pub fn with_clock(note: N, config: ConnectionConfig, clock: C) -> Self {
        Self {
            note,
            clock,
            config,
            state: ConnectionState::Init,
            conn_start_ms: 0,
            device_uid: heapless::String::new(),
            inbound: InboundBuffer::default(),
            inbound_channel: QueueChannel::new(NOTEFILE_INBOUND, NOTEFILE_INBOUND_PORT),
            outbound_channel: QueueChannel::new(NOTEFILE_OUTBOUND, NOTEFILE_OUTBOUND_PORT),
        }
    }

    /// Device UID resolved during INIT; empty before the first successful
    /// initialization.
    pub fn device_uid(&self) -> &str {
        &self.device_uid
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Borrow the underlying transaction endpoint (host tests drive their
    /// fakes through this; production drivers rarely need it).
    pub fn notecard_mut(&mut self) -> &mut N {
        &mut self.note
    }

    // -----------------------------------------------------------------------
    // Stream interface (consumed by the sync layer above)
    // -----------------------------------------------------------------------

    /// Current epoch time from the Notecard, or `0` when unknown. Zero is
    /// never a valid time; callers must treat it as "no time available".
    pub fn get_time(&mut self) -> u64 {
        let Some(rsp) = self.note.transact(Request::new("card.time")) else {
            return 0;
        };
        if let Some(err) = rsp.err() {
            error!("card.time: {err}");
            return 0;
        }
        rsp.int("time").map_or(0, |t| t.max(0) as u64)
    }

    /// Enqueue `payload` onto the outbound channel. Under keep-alive the
    /// add also forces an immediate sync with the relay.
    pub fn write(&mut self, payload: &[u8]) -> Result<(), WriteError> {
        self.outbound_channel
            .enqueue(&mut self.note, payload, self.config.keep_alive)
            .map_err(WriteError::from)
    }

    /// Next buffered byte, or `None` when the buffer is exhausted. Never
    /// blocks and never issues a transaction — draining the queue is
    /// `available()`'s job.
    pub fn read(&mut self) -> Option<u8> {
        self.inbound.next()
    }

    /// True if a byte can be read. With an empty buffer this performs one
    /// consuming dequeue and, on success, adopts the new payload wholesale.
    pub fn available(&mut self) -> bool {
        if self.inbound.has_unread() {
            return true;
        }
        match self.fetch_note(true) {
            Some(payload) => {
                // Adopted wholesale even when empty; the next read simply
                // reports no data and a later check fetches the next note.
                self.inbound.adopt(payload);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// One dequeue attempt against the inbound channel.
    ///
    /// Rearms the ATTN interrupt only on a *confirmed* empty queue (and
    /// only when hardware interrupts are enabled); an unknown dequeue
    /// failure neither rearms nor surfaces — it degrades to "no data".
    fn fetch_note(&mut self, consume: bool) -> Option<Vec<u8>> {
        match self.inbound_channel.dequeue(&mut self.note, consume) {
            Dequeue::Payload(payload) => Some(payload),
            Dequeue::Empty => {
                if self.config.hw_interrupts {
                    attn::rearm(
                        &mut self.note,
                        self.inbound_channel.file(),
                        self.config.strict_rearm,
                    );
                }
                None
            }
            Dequeue::Failed => None,
        }
    }

    fn probe_status(&mut self) -> ConnectionStatus {
        status::probe(&mut self.note)
    }

    fn set_device_uid(&mut self, uid: &str) {
        self.device_uid.clear();
        if self.device_uid.push_str(uid).is_err() {
            warn!("device UID exceeds {DEVICE_UID_CAPACITY} bytes, truncating");
            for ch in uid.chars() {
                if self.device_uid.push(ch).is_err() {
                    break;
                }
            }
        }
        info!("configured device with UID: {}", self.device_uid);
    }
}

// ---------------------------------------------------------------------------
// Test fake shared by the unit tests in this module tree
// ---------------------------------------------------------------------------
