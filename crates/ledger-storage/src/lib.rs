//! Persistent transaction-log backends for the ledger.
//!
//! Both stores implement `ledger_core::TransactionLog`, so either can be handed to
//! `Ledger::with_backend`.

pub mod file_log;
pub mod sled_store;

pub use file_log::FileLog;
pub use sled_store::SledLog;
