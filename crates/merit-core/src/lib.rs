//! Core types and trait definitions for the merit ledger.
//!
//! Free of database and terminal dependencies. The SQLite backend and the
//! TUI both depend on this crate and talk to each other only through
//! [`store::RecordStore`].

// Native `async fn` in traits; see the note on `RecordStore`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod record;
pub mod reset;
pub mod session;
pub mod store;
pub mod view;

pub use error::{Result, ValidationError};
