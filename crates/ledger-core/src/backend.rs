use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Line-oriented transaction log the ledger can delegate intake to.
///
/// This lives in `ledger-core` so storage crates can implement it without a circular
/// dependency. Implementations take `&self`; several ledgers may share one log.
pub trait TransactionLog: Send + Sync {
    /// Persist one transaction as a newline-terminated line.
    fn append_line(&self, line: &str) -> Result<()>;
    /// Every line currently stored, oldest first, without line terminators.
    fn read_all_lines(&self) -> Result<Vec<String>>;
    /// Drop everything stored so far.
    fn truncate(&self) -> Result<()>;
}

/// In-process log backed by a text buffer.
#[derive(Debug, Default)]
pub struct MemoryLog {
    contents: Mutex<String>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw buffer, including terminators.
    pub fn contents(&self) -> Result<String> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, String>> {
        self.contents
            .lock()
            .map_err(|_| anyhow!("memory log lock poisoned"))
    }
}

impl TransactionLog for MemoryLog {
    fn append_line(&self, line: &str) -> Result<()> {
        let mut contents = self.lock()?;
        contents.push_str(line);
        contents.push('\n');
        Ok(())
    }

    fn read_all_lines(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.lines().map(str::to_owned).collect())
    }

    fn truncate(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
