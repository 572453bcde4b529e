mod helpers;

use helpers::{create_temp_dir, create_temp_file_log, create_temp_sled_log};
use ledger_core::{Ledger, LedgerConfig, MineOutcome, TransactionLog};
use ledger_storage::{FileLog, SledLog};
use rand::Rng;
use std::fs;
use std::sync::Arc;

fn exercise_log(log: &dyn TransactionLog) -> anyhow::Result<()> {
    assert!(log.read_all_lines()?.is_empty());
    log.append_line("alpha")?;
    log.append_line("beta")?;
    assert_eq!(log.read_all_lines()?, vec!["alpha", "beta"]);
    // Reading does not consume.
    assert_eq!(log.read_all_lines()?.len(), 2);
    log.truncate()?;
    assert!(log.read_all_lines()?.is_empty());
    log.append_line("gamma")?;
    assert_eq!(log.read_all_lines()?, vec!["gamma"]);
    Ok(())
}

#[test]
fn test_file_log_append_read_truncate() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_file_log();
    exercise_log(&log)?;
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_sled_log_append_read_truncate() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_sled_log();
    exercise_log(&log)?;
    drop(log);
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_file_log_writes_newline_terminated_lines() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_file_log();
    log.append_line("alpha")?;
    log.append_line("beta")?;
    assert_eq!(fs::read_to_string(log.path())?, "alpha\nbeta\n");
    log.truncate()?;
    assert_eq!(fs::metadata(log.path())?.len(), 0);
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_file_log_creates_missing_directories() -> anyhow::Result<()> {
    let (temp_dir, path) = create_temp_dir();
    let nested = path.join("a").join("b").join("tx.log");
    let log = FileLog::open(&nested)?;
    assert!(nested.exists());
    assert!(log.read_all_lines()?.is_empty());
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_file_log_persistence() -> anyhow::Result<()> {
    let (temp_dir, path) = create_temp_dir();
    let file = path.join("transactions.log");
    {
        let log = FileLog::open(&file)?;
        log.append_line("persisted")?;
    }
    {
        let log = FileLog::open(&file)?;
        assert_eq!(log.read_all_lines()?, vec!["persisted"]);
    }
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_sled_log_persistence_keeps_order() -> anyhow::Result<()> {
    let (temp_dir, path) = create_temp_dir();
    let db_path = path.join("sled");
    let mut rng = rand::thread_rng();
    let lines: Vec<String> = (0..100)
        .map(|i| format!("tx-{i}-{}", rng.gen::<u32>()))
        .collect();
    {
        let log = SledLog::open(&db_path)?;
        for line in &lines[..50] {
            log.append_line(line)?;
        }
    }
    {
        let log = SledLog::open(&db_path)?;
        for line in &lines[50..] {
            log.append_line(line)?;
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.read_all_lines()?, lines);
    }
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_ledger_mines_from_file_backend() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_file_log();
    let log = Arc::new(log);
    let mut ledger = Ledger::with_backend(LedgerConfig::with_difficulty(2), log.clone())?;

    ledger.add_new_transaction("alpha")?;
    assert!(ledger.pending_transactions().is_empty());
    assert_eq!(fs::read_to_string(log.path())?, "alpha\n");

    assert!(ledger.mine()?.is_mined());
    assert_eq!(ledger.last_block().transactions(), ["alpha"]);
    assert!(ledger.last_block().seal_hash().as_str().starts_with("00"));
    assert!(log.read_all_lines()?.is_empty());
    ledger.verify_full_block_history()?;
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_ledger_mines_from_sled_backend() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_sled_log();
    let log = Arc::new(log);
    let mut ledger = Ledger::with_backend(LedgerConfig::with_difficulty(1), log.clone())?;

    for tx in ["one", "two", "three"] {
        ledger.add_new_transaction(tx)?;
    }
    assert!(ledger.mine()?.is_mined());
    assert_eq!(ledger.last_block().transactions(), ["one", "two", "three"]);
    assert!(log.is_empty());
    assert_eq!(ledger.mine()?, MineOutcome::NothingToMine);
    drop(ledger);
    drop(log);
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_two_ledgers_sharing_a_file_backend() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_file_log();
    let log = Arc::new(log);
    let mut first = Ledger::with_backend(LedgerConfig::default(), log.clone())?;
    let mut second = Ledger::with_backend(LedgerConfig::default(), log.clone())?;

    first.add_new_transaction("test")?;
    second.mine()?;
    first.mine()?;
    assert_eq!(second.last_block().transactions(), ["test"]);
    assert!(first.last_block().transactions().is_empty());
    assert_eq!(second.full_chain_summary().len(), 2);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_sled_log_concurrent_appends() -> anyhow::Result<()> {
    use tokio::task;

    let (temp_dir, log) = create_temp_sled_log();
    let log = Arc::new(log);
    let num_lines = 50;
    let mut handles = Vec::new();
    for i in 0..num_lines {
        let log = Arc::clone(&log);
        handles.push(task::spawn(async move {
            log.append_line(&format!("tx-{i}")).unwrap();
        }));
    }
    for handle in handles {
        handle.await?;
    }

    let mut lines = log.read_all_lines()?;
    assert_eq!(lines.len(), num_lines);
    lines.sort();
    lines.dedup();
    assert_eq!(lines.len(), num_lines);
    drop(log);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_file_log_concurrent_appends() -> anyhow::Result<()> {
    let (temp_dir, log) = create_temp_file_log();
    let log = Arc::new(log);
    let mut handles = Vec::new();
    for i in 0..50 {
        let log = Arc::clone(&log);
        handles.push(tokio::task::spawn_blocking(move || {
            log.append_line(&format!("line-{i}"))
        }));
    }
    for handle in handles {
        handle.await??;
    }
    let lines = log.read_all_lines()?;
    assert_eq!(lines.len(), 50);
    assert!(lines.iter().all(|l| l.starts_with("line-")));
    temp_dir.close()?;
    Ok(())
}
