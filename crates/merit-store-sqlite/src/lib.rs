//! SQLite backend for the merit ledger.
//!
//! Wraps [`tokio_rusqlite`] so the single connection lives on its own thread
//! and the TUI never blocks on disk I/O inside a render.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::LATEST_VERSION;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
