//! Unified error types for the connection bridge.
//!
//! A single crate-wide `Error` enum that every subsystem converts into,
//! keeping the state-machine and stream-interface error handling uniform.
//! All variants are `Copy` so they can be cheaply passed through handler
//! ticks without allocation. Errors are values here — nothing in this crate
//! panics on a failed transaction; failures become state transitions or
//! status codes.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the bridge funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The transport session could not be established.
    Session(SessionError),
    /// A queue-channel operation failed.
    Channel(ChannelError),
    /// A stream write failed.
    Write(WriteError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::Write(e) => write!(f, "write: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport session errors
// ---------------------------------------------------------------------------

/// Failures from `Notecard::begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The physical link could not be opened.
    LinkUnavailable,
    /// The link opened but the handshake with the Notecard failed.
    HandshakeFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkUnavailable => write!(f, "physical link unavailable"),
            Self::HandshakeFailed => write!(f, "transport handshake failed"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Queue-channel errors
// ---------------------------------------------------------------------------

/// Failures from template declaration and enqueue transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The request object could not be allocated host-side.
    OutOfMemory,
    /// The response carried a protocol-level `err` field.
    Transaction,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "host out of memory"),
            Self::Transaction => write!(f, "transaction error"),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

// ---------------------------------------------------------------------------
// Stream write status
// ---------------------------------------------------------------------------

/// Failures from [`write`](crate::handler::NotecardConnectionHandler::write).
///
/// Host resource exhaustion is distinct from a generic transaction error so
/// the sync layer above can apply different backoff policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// The response carried a protocol-level `err` field.
    Generic,
    /// The request object could not be allocated host-side.
    OutOfMemory,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "transaction error"),
            Self::OutOfMemory => write!(f, "host out of memory"),
        }
    }
}

impl From<WriteError> for Error {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}

impl From<ChannelError> for WriteError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::OutOfMemory => Self::OutOfMemory,
            ChannelError::Transaction => Self::Generic,
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
