//! # wallboard-core
//!
//! Shared vocabulary for the wallboard crates:
//!
//! - **Protocol**: [`protocol::Envelope`] wire envelope and the inbound
//!   action set decoded from terminals
//! - **Identity**: [`identity::ClientIdentity`] — registered identifier vs.
//!   generated anonymous display tag
//! - **Timing**: keepalive, write-deadline, and reconciliation constants
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `wallboard-server` (the store speaks
//! rows and SQL, not wire protocol, and stands alone).

#![deny(unsafe_code)]

pub mod identity;
pub mod protocol;
pub mod timing;

pub use identity::ClientIdentity;
pub use protocol::{Envelope, InboundAction};
