//! JSON envelopes carried in text frames.
//!
//! Client to server:
//!
//! ```text
//! {"msg": "hi", "to": "k3x9a0qz"}     chat, `to` is optional
//! {"type": "setName", "name": "alice"}
//! {"type": "typing", "to": "k3x9a0qz"} `to` is optional
//! ```
//!
//! Server to client: `id`, `clientList`, `message`, `typing` and `error`,
//! see [`Outbound`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RouteError;

/// Display names are cut to this many UTF-16 code units.
pub const MAX_NAME_LEN: usize = 50;

/// Longest accepted chat message, in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetName { name: String },
    Typing { to: Option<Recipient> },
    Chat { msg: String, to: Option<Recipient> },
}

/// Addressee of a private message or typing indicator.
///
/// Any truthy `to` makes a message private. Only a string can name a
/// peer, anything else is kept as sent and never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Recipient {
    Id(String),
    Invalid(Value),
}

impl Recipient {
    /// Read an optional `to` field, falsy values mean no recipient.
    pub fn from_value(to: Option<Value>) -> Option<Self> {
        match to? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) => Some(Recipient::Id(s)),
            other => Some(Recipient::Invalid(other)),
        }
    }

    /// Peer id this addresses, if any.
    #[inline]
    pub fn id(&self) -> Option<&str> {
        match self {
            Recipient::Id(id) => Some(id),
            Recipient::Invalid(_) => None,
        }
    }
}

// every field is optional and loosely typed,
// the shape is decided in `parse`
#[derive(Debug, Deserialize)]
struct Inbound {
    #[serde(rename = "type")]
    kind: Option<Value>,
    name: Option<Value>,
    msg: Option<Value>,
    to: Option<Value>,
}

/// Parse a text payload into a command.
pub fn parse(payload: &str) -> Result<Command, RouteError> {
    let value: Value = serde_json::from_str(payload).map_err(|_| RouteError::InvalidJson)?;

    // valid json, but not an object
    let inbound = Inbound::deserialize(value).map_err(|_| RouteError::Unsupported)?;

    let to = Recipient::from_value(inbound.to);

    match inbound.kind.as_ref().and_then(Value::as_str) {
        Some("setName") => Ok(Command::SetName {
            name: match inbound.name {
                Some(Value::String(s)) => s,
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(true)) => "true".to_string(),
                _ => String::new(),
            },
        }),
        Some("typing") => Ok(Command::Typing { to }),
        _ => match inbound.msg {
            Some(Value::String(msg)) => Ok(Command::Chat { msg, to }),
            _ => Err(RouteError::Unsupported),
        },
    }
}

/// Number of UTF-16 code units, the unit browsers count string length in.
#[inline]
pub fn utf16_len(s: &str) -> usize { s.chars().map(char::len_utf16).sum() }

/// Longest prefix of `s` holding at most `max` UTF-16 code units.
/// A surrogate pair is never split.
pub fn truncate_utf16(s: &str, max: usize) -> &str {
    let mut units = 0;
    for (idx, ch) in s.char_indices() {
        units += ch.len_utf16();
        if units > max {
            return &s[..idx];
        }
    }
    s
}

/// Display name from a `setName` request: trimmed, truncated,
/// or the peer id if nothing is left.
pub fn normalize_name(name: &str, id: &str) -> String {
    let name = truncate_utf16(name.trim(), MAX_NAME_LEN);
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

/// Entry of a presence snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Chat message, either delivered or acknowledged to its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage<'a> {
    pub from: &'a str,
    pub from_name: &'a str,
    pub msg: &'a str,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<&'a Recipient>,
}

/// Server to client envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound<'a> {
    /// Sent once, right after the handshake.
    Id { id: &'a str },
    ClientList { clients: Vec<ClientInfo<'a>> },
    Message(ChatMessage<'a>),
    /// `to` is serialized as `null` for a public indicator.
    Typing {
        from: &'a str,
        name: &'a str,
        to: Option<&'a Recipient>,
    },
    Error { msg: String },
}

impl From<RouteError> for Outbound<'_> {
    fn from(e: RouteError) -> Self { Outbound::Error { msg: e.to_string() } }
}
