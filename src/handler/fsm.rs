//! Connection state machine.
//!
//! ```text
//!  INIT ──[ok, keep-alive]──▶ CONNECTING ──[relay up]──▶ CONNECTED
//!    ▲                            │    ▲                     │
//!    │                       [timeout] └──[relay up lost]──▶ DISCONNECTED
//!    └────────────────────────────┘                          │
//!                                         [keep-alive]──▶ INIT
//!  INIT ──[ok, one-shot]──▶ DISCONNECTED ──[reconfigure ok]──▶ CLOSED
//!
//!  Any transactional failure in INIT/DISCONNECTED ──▶ ERROR (terminal)
//! ```
//!
//! Each tick the owning driver calls [`update`], which runs the handler for
//! the current state and returns the next state. Transitions are computed
//! by the handlers, never asserted from outside; DISCONNECTING is reachable
//! only through the driver's own symmetric machine, so this handler merely
//! falls through it.

use log::{error, info};

use crate::clock::Clock;
use crate::config::{CONNECT_INBOUND_MINS, CONNECT_TIMEOUT_MS, DISCONNECT_INBOUND_MINS};
use crate::note::{Notecard, Request};

use super::NotecardConnectionHandler;

/// Connection lifecycle states. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Init = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
    Disconnected = 4,
    Closed = 5,
    Error = 6,
}

impl ConnectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Disconnecting => "DISCONNECTING",
            Self::Disconnected => "DISCONNECTED",
            Self::Closed => "CLOSED",
            Self::Error => "ERROR",
        }
    }

    /// Terminal with respect to this handler: the driver decides whether
    /// and when to reconstruct.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}

impl<N: Notecard, C: Clock> NotecardConnectionHandler<N, C> {
    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Advance the state machine by one tick: run the current state's
    /// handler, persist and return the next state.
    pub fn update(&mut self) -> ConnectionState {
        let next = match self.state {
            ConnectionState::Init => self.handle_init(),
            ConnectionState::Connecting => self.handle_connecting(),
            ConnectionState::Connected => self.handle_connected(),
            ConnectionState::Disconnecting => self.handle_disconnecting(),
            ConnectionState::Disconnected => self.handle_disconnected(),
            // Terminal states: nothing to do until the driver intervenes.
            ConnectionState::Closed | ConnectionState::Error => self.state,
        };

        if next != self.state {
            info!("connection: {} -> {}", self.state.as_str(), next.as_str());
        }
        self.state = next;
        next
    }

    // -----------------------------------------------------------------------
    // INIT
    // -----------------------------------------------------------------------

    fn handle_init(&mut self) -> ConnectionState {
        if let Err(e) = self.note.begin(&self.config.link) {
            error!("transport session begin failed: {e}");
            return ConnectionState::Error;
        }

        // Non-consuming probe of the inbound queue. If a note is pending,
        // the ATTN line stays unarmed — that signals the application that
        // outstanding notes need draining. An empty queue rearms (inside
        // fetch_note) when hardware interrupts are enabled.
        let _ = self.fetch_note(false);

        if !self.configure_connection(true) {
            return ConnectionState::Error;
        }

        if self.inbound_channel.declare_template(&mut self.note).is_err()
            || self.outbound_channel.declare_template(&mut self.note).is_err()
        {
            return ConnectionState::Error;
        }

        let Some(rsp) = self.note.transact(Request::new("hub.get")) else {
            return ConnectionState::Error;
        };
        if let Some(err) = rsp.err() {
            error!("hub.get: {err}");
            return ConnectionState::Error;
        }
        let uid = rsp.text("device").unwrap_or_default().to_owned();
        self.set_device_uid(&uid);

        if self.config.keep_alive {
            self.conn_start_ms = self.clock.now_ms();
            info!("connecting to the network...");
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    // -----------------------------------------------------------------------
    // CONNECTING
    // -----------------------------------------------------------------------

    fn handle_connecting(&mut self) -> ConnectionState {
        let status = self.probe_status();

        if status.connected_to_notehub {
            info!("connected to Notehub");
            return ConnectionState::Connected;
        }

        let elapsed = self.clock.now_ms().saturating_sub(self.conn_start_ms);
        if elapsed > CONNECT_TIMEOUT_MS {
            error!("connection timeout after {elapsed} ms, restarting");
            return ConnectionState::Init;
        }

        if status.transport_connected {
            info!("establishing connection to Notehub...");
        } else {
            info!("connecting to the network...");
        }
        ConnectionState::Connecting
    }

    // -----------------------------------------------------------------------
    // CONNECTED
    // -----------------------------------------------------------------------

    fn handle_connected(&mut self) -> ConnectionState {
        let status = self.probe_status();
        if status.connected_to_notehub {
            return ConnectionState::Connected;
        }

        if status.transport_connected {
            error!("connection to Notehub lost");
        } else {
            error!("connection to the network lost");
        }
        ConnectionState::Disconnected
    }

    // -----------------------------------------------------------------------
    // DISCONNECTING
    // -----------------------------------------------------------------------

    fn handle_disconnecting(&mut self) -> ConnectionState {
        error!("connection to the network lost");
        ConnectionState::Disconnected
    }

    // -----------------------------------------------------------------------
    // DISCONNECTED
    // -----------------------------------------------------------------------

    fn handle_disconnected(&mut self) -> ConnectionState {
        if self.config.keep_alive {
            error!("attempting reconnection...");
            return ConnectionState::Init;
        }

        if self.configure_connection(false) {
            info!("closing connection...");
            ConnectionState::Closed
        } else {
            error!("error closing connection");
            ConnectionState::Error
        }
    }

    // -----------------------------------------------------------------------
    // Relay configuration (hub.set)
    // -----------------------------------------------------------------------

    /// Configure the relay connection parameters for connect mode
    /// (continuous polling, bounded inbound interval, synchronous outbound)
    /// or disconnect mode (low-frequency periodic polling, outbound
    /// disabled, velocity limits cleared).
    fn configure_connection(&mut self, connect: bool) -> bool {
        let mut req = Request::new("hub.set").text("product", self.config.project_uid.clone());
        if !self.config.notehub_url.is_empty() {
            req = req.text("host", self.config.notehub_url.clone());
        }
        req = if connect {
            req.text("mode", "continuous")
                .int("inbound", CONNECT_INBOUND_MINS)
                .flag("sync", true)
        } else {
            req.text("mode", "periodic")
                .int("inbound", DISCONNECT_INBOUND_MINS)
                .int("outbound", -1)
                .text("vinbound", "-")
                .text("voutbound", "-")
        };

        let Some(rsp) = self.note.transact(req) else {
            return false;
        };
        if let Some(err) = rsp.err() {
            error!("hub.set: {err}");
            return false;
        }
        true
    }
}
