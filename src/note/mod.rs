//! Transaction capability — the boundary toward the vendor note library.
//!
//! The Notecard is a command/response device: the host builds a named
//! request, attaches typed fields, executes it, and decodes fields from the
//! response. This module models that capability as data types plus the
//! [`Notecard`] trait, so the state machine and queue channels can be
//! exercised against a fake device on the host with no hardware attached.
//!
//! ```text
//!   handler ──▶ Notecard trait ──▶ vendor library ──▶ UART / I2C
//! ```
//!
//! Response ownership is strict: `transact` hands the [`Response`] to the
//! caller on every path — success and protocol-error alike — and the
//! implementation retains nothing across calls.

use serde_json::json;

use crate::config::TransportLink;
use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Typed field values
// ---------------------------------------------------------------------------

/// A single typed request/response field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
    /// Binary note payload. Carried out-of-band from the JSON rendering.
    Blob(Vec<u8>),
    /// List of strings (e.g. the `files` array of `card.attn`).
    List(Vec<String>),
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A named transaction plus its ordered field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    name: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl Request {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, Value::Text(value.into())));
        self
    }

    pub fn int(mut self, key: &'static str, value: i64) -> Self {
        self.fields.push((key, Value::Int(value)));
        self
    }

    pub fn flag(mut self, key: &'static str, value: bool) -> Self {
        self.fields.push((key, Value::Bool(value)));
        self
    }

    pub fn blob(mut self, key: &'static str, value: &[u8]) -> Self {
        self.fields.push((key, Value::Blob(value.to_vec())));
        self
    }

    pub fn list(mut self, key: &'static str, value: &[&str]) -> Self {
        let items = value.iter().map(|s| (*s).to_string()).collect();
        self.fields.push((key, Value::List(items)));
        self
    }

    /// Look up a field by key (first match).
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// JSON rendering for trace logging. Blobs are summarized by length,
    /// never dumped.
    pub fn to_debug_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("req".into(), json!(self.name));
        for (key, value) in &self.fields {
            let rendered = match value {
                Value::Text(s) => json!(s),
                Value::Int(i) => json!(i),
                Value::Bool(b) => json!(b),
                Value::Blob(bytes) => json!(format!("<{} bytes>", bytes.len())),
                Value::List(items) => json!(items),
            };
            obj.insert((*key).to_string(), rendered);
        }
        serde_json::Value::Object(obj)
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Error token the Notecard returns when a queried notefile is empty.
pub const ERR_NOTE_NOEXIST: &str = "{note-noexist}";

/// Status-string token present while the local transport link is up.
pub const STATUS_CONNECTED_TOKEN: &str = "{connected}";

/// Decoded response fields from one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    fields: Vec<(String, Value)>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.push((key.into(), value));
        self
    }

    /// The `err` field, if present and non-empty. Presence means the
    /// transaction itself failed at the protocol level.
    pub fn err(&self) -> Option<&str> {
        match self.text("err") {
            Some("") | None => None,
            Some(e) => Some(e),
        }
    }

    /// True if the error text contains the given Notecard error token.
    pub fn err_contains(&self, token: &str) -> bool {
        self.err().is_some_and(|e| e.contains(token))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.field(key) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.field(key) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean field; absent decodes as `false`, matching the wire
    /// convention of omitting false booleans.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.field(key), Some(Value::Bool(true)))
    }

    pub fn blob(&self, key: &str) -> Option<&[u8]> {
        match self.field(key) {
            Some(Value::Blob(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Convenience constructor for a protocol-error response.
    pub fn error(err: impl Into<String>) -> Self {
        Self::new().with("err", Value::Text(err.into()))
    }
}

// ---------------------------------------------------------------------------
// Notecard trait (the vendor library boundary)
// ---------------------------------------------------------------------------

/// Abstract transaction endpoint.
///
/// `transact` returning `None` means the request object could not be
/// allocated host-side (resource exhaustion) — distinct from a response
/// that carries a protocol-level `err` field.
pub trait Notecard {
    /// Open the physical link described by `link`. Exactly one transport is
    /// configured — serial at the declared speed, or the addressed bus with
    /// the declared maximum transaction size — never both.
    fn begin(&mut self, link: &TransportLink) -> Result<(), SessionError>;

    /// Execute one request/response transaction. Blocks for the duration
    /// of the bus exchange; there is no cancellation.
    fn transact(&mut self, req: Request) -> Option<Response>;
}
