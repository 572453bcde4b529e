//! Single-node, hash-linked ledger sealed by proof of work.

pub mod backend;
pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod mine;
pub mod pow;

pub use backend::{MemoryLog, TransactionLog};
pub use block::{Block, SealHash};
pub use chain::{genesis_block, Ledger, MineOutcome};
pub use config::{LedgerConfig, MiningBudget};
pub use error::{LedgerError, Result};

pub type Hash = [u8; 32];
