//! Connection status probe — decodes `hub.status` into a compact record.
//!
//! Local-transport connectivity and relay connectivity are independent: the
//! modem can be attached to the network long before a Notehub session
//! exists. The two error flags are mutually exclusive outcomes of a single
//! query — it either fails to execute (`host_error`) or executes and
//! returns a protocol error (`notecard_error`), never both.

use log::error;

use crate::note::{Notecard, Request, Response, STATUS_CONNECTED_TOKEN};

/// Result of one status query. Recomputed fresh on every probe, never
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// The local physical/network link is up.
    pub transport_connected: bool,
    /// A session with the relay (Notehub) is established.
    pub connected_to_notehub: bool,
    /// The status query executed but returned a protocol-level error.
    pub notecard_error: bool,
    /// The status query could not be issued at all.
    pub host_error: bool,
}

impl ConnectionStatus {
    fn host_failure() -> Self {
        Self {
            host_error: true,
            ..Self::default()
        }
    }

    fn notecard_failure() -> Self {
        Self {
            notecard_error: true,
            ..Self::default()
        }
    }

    /// Decode a `hub.status` outcome. Pure — the probe itself is just this
    /// plus one transaction.
    pub fn decode(rsp: Option<Response>) -> Self {
        let Some(rsp) = rsp else {
            return Self::host_failure();
        };
        if let Some(err) = rsp.err() {
            error!("hub.status: {err}");
            return Self::notecard_failure();
        }
        Self {
            transport_connected: rsp
                .text("status")
                .is_some_and(|s| s.contains(STATUS_CONNECTED_TOKEN)),
            connected_to_notehub: rsp.flag("connected"),
            notecard_error: false,
            host_error: false,
        }
    }

    /// True when neither error flag is set and the connectivity booleans
    /// are therefore meaningful.
    pub fn is_valid(&self) -> bool {
        !self.notecard_error && !self.host_error
    }
}

/// Issue one `hub.status` query and decode it.
pub fn probe(note: &mut impl Notecard) -> ConnectionStatus {
    ConnectionStatus::decode(note.transact(Request::new("hub.status")))
}
