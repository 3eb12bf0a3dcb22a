//! Terminal identity.
//!
//! Registered terminals pass a stable opaque identifier when connecting and
//! get a persisted client record. Terminals that pass nothing are anonymous:
//! they get a random display tag for logs and the UI, and nothing is ever
//! persisted for them.

use rand::Rng;

/// Identity of one connected terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Client-supplied stable identifier; backed by a client record.
    Registered(String),
    /// Generated display tag; never persisted.
    Anonymous(String),
}

impl ClientIdentity {
    /// Build an identity from the optional `client` connection parameter.
    /// A missing or empty identifier yields an anonymous tag.
    pub fn from_request(identifier: Option<&str>) -> Self {
        match identifier {
            Some(id) if !id.is_empty() => Self::Registered(id.to_string()),
            _ => Self::Anonymous(anonymous_tag()),
        }
    }

    /// The name this session goes by in logs and client lists.
    pub fn name(&self) -> &str {
        match self {
            Self::Registered(id) | Self::Anonymous(id) => id,
        }
    }

    /// Whether this session has no persisted client record.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous(_))
    }
}

/// Generate a cosmetic `Anonymous-XXX` display tag (three hex chars).
pub fn anonymous_tag() -> String {
    let n: u16 = rand::rng().random_range(0..0x1000);
    format!("Anonymous-{n:03X}")
}
