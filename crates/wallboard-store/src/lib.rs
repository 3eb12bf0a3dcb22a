//! # wallboard-store
//!
//! The resolution store: clients, URLs, named URL lists, and their
//! assignments, persisted in `SQLite` via `rusqlite` behind an `r2d2` pool.
//!
//! - **Repositories**: stateless per-table CRUD, every method takes
//!   `&Connection` ([`repositories`])
//! - **Store**: pooled high-level API composing the repositories ([`store`])
//! - **Resolution**: [`store::Store::resolve_urls`] — the total
//!   client-to-URL-set function with fallback to the global catalog
//!
//! ## Crate Position
//!
//! Leaf data crate. Depended on by `wallboard-server` and the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod repositories;
pub mod resolver;
pub mod schema;
pub mod store;

pub use errors::{Result, StoreError};
pub use schema::{DEFAULT_LIST_ID, DEFAULT_LIST_NAME};
pub use store::Store;
