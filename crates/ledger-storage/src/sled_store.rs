use anyhow::{Context, Result};
use ledger_core::TransactionLog;
use sled::{Db, Tree};
use std::path::Path;
use tracing::info;

const TREE_TRANSACTIONS: &str = "pending_transactions";

/// Transaction log kept in a sled tree.
///
/// Keys are ids from `Db::generate_id` in big-endian, so iteration order is append order,
/// also across reopen.
#[derive(Clone)]
pub struct SledLog {
  db: Db,
  tree: Tree,
}

impl SledLog {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let db = sled::open(path)?;
    let tree = db.open_tree(TREE_TRANSACTIONS)?;
    info!(entries = tree.len(), "sled transaction log opened");
    Ok(Self { db, tree })
  }

  pub fn len(&self) -> usize {
    self.tree.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tree.is_empty()
  }
}

impl TransactionLog for SledLog {
  fn append_line(&self, line: &str) -> Result<()> {
    let key = self.db.generate_id()?.to_be_bytes();
    self.tree.insert(key, line.as_bytes())?;
    self.tree.flush()?;
    Ok(())
  }

  fn read_all_lines(&self) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(self.tree.len());
    for value in self.tree.iter().values() {
      let value = value?;
      let text = std::str::from_utf8(&value).context("transaction entry is not valid UTF-8")?;
      // An entry holding embedded newlines reads back as several lines, like the file log.
      lines.extend(text.lines().map(str::to_owned));
    }
    Ok(lines)
  }

  fn truncate(&self) -> Result<()> {
    self.tree.clear()?;
    self.tree.flush()?;
    Ok(())
  }
}
