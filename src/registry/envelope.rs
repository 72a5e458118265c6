//! Envelope and identity types for application routing
//!
//! This module defines the keys used to identify applications and the
//! envelopes that are fanned out to subscribers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a registered application
///
/// Ids are the decimal rendering of a monotonically increasing counter and
/// are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    /// Wrap an id received from the outside (e.g. a URL path segment)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for AppId {
    fn from(seq: u64) -> Self {
        Self(seq.to_string())
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity reported by a registering client
///
/// Two registrations are the same application exactly when both fields are
/// equal. Empty strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Reported user agent
    pub user_agent: String,
    /// Reported host
    pub host: String,
}

impl Identity {
    pub fn new(user_agent: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            host: host.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.host, self.user_agent)
    }
}

/// Kind tag of an envelope
///
/// The relay itself only distinguishes `event` (cached for replay) from
/// everything else, but any tag is transmissible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// State snapshot; the latest one is replayed to late joiners
    Event,
    /// Command or transient notification; never replayed
    Action,
    /// Any other tag
    Other(String),
}

impl Kind {
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Event => "event",
            Kind::Action => "action",
            Kind::Other(tag) => tag,
        }
    }
}

impl From<&str> for Kind {
    fn from(tag: &str) -> Self {
        match tag {
            "event" => Kind::Event,
            "action" => Kind::Action,
            other => Kind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An envelope fanned out to subscribers
///
/// Immutable once built. Cheap to clone since the payload is reference
/// counted `Bytes`; every subscriber shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: Kind,
    payload: Bytes,
}

impl Envelope {
    pub fn new(kind: impl Into<Kind>, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Create an `event` envelope
    pub fn event(payload: impl Into<Bytes>) -> Self {
        Self::new(Kind::Event, payload)
    }

    /// Create an `action` envelope
    pub fn action(payload: impl Into<Bytes>) -> Self {
        Self::new(Kind::Action, payload)
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Opaque payload, relayed without parsing
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Whether this envelope replaces the replay cache
    pub fn is_event(&self) -> bool {
        self.kind == Kind::Event
    }
}
