//! Connection configuration and protocol constants.
//!
//! Everything here is fixed at construction time; the handler never mutates
//! its configuration. Protocol constants live next to the component they
//! parametrize.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Notefile constants (queue channels)
// ---------------------------------------------------------------------------

/// Base name shared by both queue-channel notefiles.
pub const NOTEFILE_BASE_NAME: &str = "notebridge";

/// Inbound queue-channel notefile (relay → host). The `.qis` suffix marks a
/// secure inbound queue on the Notecard.
pub const NOTEFILE_INBOUND: &str = "notebridge.qis";

/// Outbound queue-channel notefile (host → relay).
pub const NOTEFILE_OUTBOUND: &str = "notebridge.qos";

/// Narrowband (LoRa/satellite) port for the inbound notefile.
/// Ignored by cellular/WiFi Notecards.
pub const NOTEFILE_INBOUND_PORT: i64 = 79;

/// Narrowband (LoRa/satellite) port for the outbound notefile.
pub const NOTEFILE_OUTBOUND_PORT: i64 = 83;

// ---------------------------------------------------------------------------
// Relay connection constants (hub.set / state machine)
// ---------------------------------------------------------------------------

/// Wall-clock budget for the CONNECTING state before a full restart.
/// Cellular attach plus a Notehub session can take well over two minutes.
pub const CONNECT_TIMEOUT_MS: u64 = 185_000;

/// Inbound check interval (minutes) while in connect mode. Fail-safe only:
/// continuous mode syncs inbound notes as they arrive.
pub const CONNECT_INBOUND_MINS: i64 = 15;

/// Inbound check interval (minutes) while in disconnect mode (once a day).
pub const DISCONNECT_INBOUND_MINS: i64 = 1440;

// ---------------------------------------------------------------------------
// Transport link
// ---------------------------------------------------------------------------

/// Physical link selection — exactly one of the two, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportLink {
    /// UART link at the given speed.
    Serial { baud_rate: u32 },
    /// Addressed bus (I2C) link with a maximum per-transaction byte count.
    I2c { address: u32, max_transaction: u32 },
}

// ---------------------------------------------------------------------------
// Connection configuration
// ---------------------------------------------------------------------------

/// Construction-time configuration for the connection handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Notehub project UID the device syncs against.
    pub project_uid: String,
    /// Relay URL override. Empty string means "use the relay's default".
    pub notehub_url: String,
    /// Continuously maintain and restore relay connectivity (`true`), or
    /// perform a single connect/operate/idle cycle (`false`).
    pub keep_alive: bool,
    /// Use the hardware ATTN line to signal inbound note arrival.
    pub hw_interrupts: bool,
    /// Treat `card.attn` rearm errors as real failures. Off by default:
    /// some firmware versions report an error even though the interrupt
    /// armed (rearm is not idempotent there).
    pub strict_rearm: bool,
    /// Physical link to the Notecard.
    pub link: TransportLink,
}

impl ConnectionConfig {
    /// Serial-link configuration with defaults matching a one-shot session.
    pub fn serial(project_uid: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            project_uid: project_uid.into(),
            notehub_url: String::new(),
            keep_alive: false,
            hw_interrupts: false,
            strict_rearm: false,
            link: TransportLink::Serial { baud_rate },
        }
    }

    /// I2C-link configuration with defaults matching a one-shot session.
    pub fn i2c(project_uid: impl Into<String>, address: u32, max_transaction: u32) -> Self {
        Self {
            project_uid: project_uid.into(),
            notehub_url: String::new(),
            keep_alive: false,
            hw_interrupts: false,
            strict_rearm: false,
            link: TransportLink::I2c {
                address,
                max_transaction,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-state check-interval hints
// ---------------------------------------------------------------------------

/// Suggested polling interval for the owning driver, per state.
///
/// These are hints only — the driver may tick at any cadence it likes; the
/// handler is correct at any polling rate.
pub fn check_interval_ms(state: crate::handler::ConnectionState) -> u32 {
    use crate::handler::ConnectionState as S;
    match state {
        S::Init => 100,
        S::Connecting => 500,
        S::Connected => 10_000,
        S::Disconnecting => 100,
        S::Disconnected => 1_000,
        S::Closed => 1_000,
        S::Error => 1_000,
    }
}
