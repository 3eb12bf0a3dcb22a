//! Wire protocol between the server and display terminals.
//!
//! Every message in either direction is an [`Envelope`] of `{action, data}`.
//! The field names (`action`, `data`, `urls`, `clients`) are decoded by the
//! terminal-side scripts and must not be renamed.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Outbound action pushed when a terminal's URL rotation changes.
pub const ACTION_UPDATE_URLS: &str = "updateUrls";
/// Outbound action carrying the identifiers of live, registered terminals.
pub const ACTION_UPDATE_CLIENTS: &str = "updateClients";

/// The `{action, data}` envelope framing every wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message discriminator, e.g. `"sendUrls"` or `"updateUrls"`.
    pub action: String,
    /// Action-specific payload. Inbound envelopes may omit it entirely.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Build an `updateUrls` push.
    ///
    /// An empty rotation serializes as `"urls": []`, never `null` — the
    /// terminal treats "no URLs" uniformly with any other rotation.
    pub fn update_urls(urls: Vec<String>) -> Self {
        Self {
            action: ACTION_UPDATE_URLS.to_string(),
            data: json!({ "urls": urls }),
        }
    }

    /// Build an `updateClients` push listing live registered terminals.
    pub fn update_clients(clients: Vec<String>) -> Self {
        Self {
            action: ACTION_UPDATE_CLIENTS.to_string(),
            data: json!({ "clients": clients }),
        }
    }

    /// Classify this envelope's action as an inbound request.
    pub fn inbound_action(&self) -> InboundAction {
        InboundAction::from(self.action.as_str())
    }
}

/// Requests a terminal may issue over the duplex channel.
///
/// Anything else decodes as [`InboundAction::Unknown`] and is logged but
/// otherwise ignored (the connection stays open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
    /// Mark the session as a controller (log/UI role only) and push both
    /// the resolved URL set and the live client list.
    FlagController,
    /// Push the session's personalized URL set.
    SendUrls,
    /// Push the identifiers of all live, registered sessions.
    SendClients,
    /// Unrecognized action; carried verbatim for logging.
    Unknown(String),
}

impl From<&str> for InboundAction {
    fn from(action: &str) -> Self {
        match action {
            "flagController" => Self::FlagController,
            "sendUrls" => Self::SendUrls,
            "sendClients" => Self::SendClients,
            other => Self::Unknown(other.to_string()),
        }
    }
}
