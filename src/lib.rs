//! Notebridge — a byte-stream connection bridge over a Notecard-class
//! transactional transport.
//!
//! The Notecard is not a socket: it exchanges structured request/response
//! transactions and persists application data in named queue-like notefiles.
//! This crate turns that store-and-forward endpoint into (a) a deterministic,
//! poll-driven connection state machine with timeout-driven retries and (b) a
//! synchronous byte-stream interface backed by single-note buffering, so the
//! cloud-sync layer above can treat it like any other network adapter.
//!
//! The vendor transaction library is a trait boundary ([`note::Notecard`]);
//! everything else runs on the host against fakes.

#![deny(unused_must_use)]

pub mod attn;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod handler;
pub mod note;
pub mod status;

pub use config::{ConnectionConfig, TransportLink};
pub use error::{ChannelError, Error, Result, SessionError, WriteError};
pub use handler::{ConnectionState, NotecardConnectionHandler};
pub use status::ConnectionStatus;
