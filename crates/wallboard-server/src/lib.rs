//! # wallboard-server
//!
//! Real-time synchronization core for the display fleet.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `broker` | Single-authority actor owning the live-session set; registration, fan-out, reconciliation tick |
//! | `session` | Per-terminal duplex pump: read loop with sliding keepalive, write loop with deadlines and pings |
//! | `server` | Axum router: WebSocket upgrade and health |
//!
//! ## Data Flow
//!
//! upgrade (`server`) → `session::run` registers with the `broker` and pumps
//! messages; the broker's tick re-resolves every live terminal's URL set via
//! `wallboard-store` and pushes `updateUrls`.

#![deny(unsafe_code)]

pub mod broker;
pub mod errors;
pub mod server;
pub mod session;

pub use broker::{Broker, BrokerHandle, SessionHandle};
pub use server::{AppState, router, serve};
