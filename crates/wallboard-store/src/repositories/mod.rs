//! Stateless per-table repositories. Every method takes `&Connection` so
//! callers decide pooling and transaction boundaries.

pub mod clients;
pub mod lists;
pub mod urls;

pub use clients::{ClientRepo, ClientRow};
pub use lists::{ListRepo, ListRow};
pub use urls::UrlRepo;
