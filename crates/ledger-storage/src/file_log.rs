use anyhow::{anyhow, Context, Result};
use ledger_core::TransactionLog;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Plain text transaction log: one transaction per line.
#[derive(Debug)]
pub struct FileLog {
  path: PathBuf,
  // Serializes operations from this handle; other processes are not coordinated.
  lock: Mutex<()>,
}

impl FileLog {
  /// Opens `path`, creating the file (and its parent directory) if missing.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .with_context(|| format!("opening transaction log {}", path.display()))?;
    info!(path = %path.display(), "file transaction log opened");
    Ok(Self {
      path,
      lock: Mutex::new(()),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
    self
      .lock
      .lock()
      .map_err(|_| anyhow!("file log lock poisoned"))
  }
}

impl TransactionLog for FileLog {
  fn append_line(&self, line: &str) -> Result<()> {
    let _guard = self.guard()?;
    let mut file = OpenOptions::new()
      .append(true)
      .open(&self.path)
      .with_context(|| format!("opening {} for append", self.path.display()))?;
    // Single write per line keeps concurrent appenders from interleaving.
    let record = format!("{line}\n");
    file.write_all(record.as_bytes())?;
    Ok(())
  }

  fn read_all_lines(&self) -> Result<Vec<String>> {
    let _guard = self.guard()?;
    let text = fs::read_to_string(&self.path)
      .with_context(|| format!("reading {}", self.path.display()))?;
    Ok(text.lines().map(str::to_owned).collect())
  }

  fn truncate(&self) -> Result<()> {
    let _guard = self.guard()?;
    File::create(&self.path).with_context(|| format!("truncating {}", self.path.display()))?;
    Ok(())
  }
}
