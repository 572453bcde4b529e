use ledger_storage::{FileLog, SledLog};
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

#[allow(dead_code)]
pub fn create_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

#[allow(dead_code)]
pub fn create_temp_file_log() -> (TempDir, FileLog) {
    let (temp_dir, path) = create_temp_dir();
    let log = FileLog::open(path.join("transactions.log")).expect("Failed to open FileLog");
    (temp_dir, log)
}

#[allow(dead_code)]
pub fn create_temp_sled_log() -> (TempDir, SledLog) {
    let (temp_dir, path) = create_temp_dir();
    let log = SledLog::open(path.join("sled")).expect("Failed to open SledLog");
    (temp_dir, log)
}
