use crate::backend::TransactionLog;
use crate::block::{now_timestamp, Block, SealHash};
use crate::config::LedgerConfig;
use crate::constants::{GENESIS_INDEX, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result};
use crate::{mine, pow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a call to [`Ledger::mine`] did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MineOutcome {
    /// A new block was sealed and appended.
    Mined { index: u64, hash: SealHash },
    /// No pending transactions; the chain is unchanged.
    NothingToMine,
    /// The sealed candidate failed linkage or proof checks in `add_block`.
    Rejected,
    /// The configured mining budget ran out before a qualifying nonce was found.
    BudgetExhausted,
}

impl MineOutcome {
    pub fn is_mined(&self) -> bool {
        matches!(self, MineOutcome::Mined { .. })
    }
}

/// Append-only chain of sealed blocks plus the buffer of transactions waiting to be mined.
pub struct Ledger {
    config: LedgerConfig,
    chain: Vec<Block>,
    pending: Vec<String>,
    backend: Option<Arc<dyn TransactionLog>>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .field("height", &self.last_block().index())
            .field("pending", &self.pending.len())
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

impl Ledger {
    /// In-memory ledger holding a freshly sealed genesis block.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Ledger whose transaction intake goes through `backend`.
    pub fn with_backend(config: LedgerConfig, backend: Arc<dyn TransactionLog>) -> Result<Self> {
        Self::build(config, Some(backend))
    }

    fn build(config: LedgerConfig, backend: Option<Arc<dyn TransactionLog>>) -> Result<Self> {
        config.validate()?;
        let genesis = genesis_block()?;
        info!(
            difficulty = config.difficulty,
            backend = backend.is_some(),
            genesis = %genesis.seal_hash(),
            "ledger created"
        );
        Ok(Self {
            config,
            chain: vec![genesis],
            pending: Vec::new(),
            backend,
        })
    }

    /// Rebuilds a ledger from previously exported blocks.
    ///
    /// Only the genesis shape is checked here; run [`Ledger::verify_full_block_history`]
    /// before trusting the result.
    pub fn restore(
        config: LedgerConfig,
        blocks: Vec<Block>,
        backend: Option<Arc<dyn TransactionLog>>,
    ) -> Result<Self> {
        config.validate()?;
        let first = blocks.first().ok_or(LedgerError::EmptyChain)?;
        if first.index() != GENESIS_INDEX || first.previous_hash() != GENESIS_PREVIOUS_HASH {
            return Err(LedgerError::MissingGenesis {
                index: first.index(),
                previous_hash: first.previous_hash().to_owned(),
            });
        }
        info!(blocks = blocks.len(), "ledger restored");
        Ok(Self {
            config,
            chain: blocks,
            pending: Vec::new(),
            backend,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Never true: a ledger always holds its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds a genesis block")
    }

    pub fn pending_transactions(&self) -> &[String] {
        &self.pending
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Queues a transaction for the next block, or writes it straight to the backend
    /// when one is configured.
    ///
    /// Backends are line oriented: a payload containing `\n` is read back as several
    /// transactions.
    pub fn add_new_transaction(&mut self, data: impl Into<String>) -> Result<()> {
        let data = data.into();
        if self.backend.is_some() {
            self.save_transaction(&data)
        } else {
            self.pending.push(data);
            Ok(())
        }
    }

    /// Appends one transaction line to the backend.
    pub fn save_transaction(&self, data: &str) -> Result<()> {
        let backend = self.backend.as_ref().ok_or(LedgerError::BackendUnavailable)?;
        backend.append_line(data)?;
        Ok(())
    }

    /// Moves every backend line into the pending buffer, trailing whitespace stripped.
    ///
    /// The backend is not consumed, so reading twice without mining queues duplicates.
    pub fn read_transactions(&mut self) -> Result<usize> {
        let backend = self.backend.as_ref().ok_or(LedgerError::BackendUnavailable)?;
        let lines = backend.read_all_lines()?;
        let count = lines.len();
        self.pending
            .extend(lines.into_iter().map(|line| line.trim_end().to_owned()));
        debug!(count, "read transactions from backend");
        Ok(count)
    }

    /// Seals the pending transactions into a new block.
    ///
    /// Only backend I/O produces an `Err`. Unless a block is mined, the pending buffer is
    /// left as it was before the call.
    pub fn mine(&mut self) -> Result<MineOutcome> {
        self.mine_with(search_nonce)
    }

    pub(crate) fn mine_with<F>(&mut self, search: F) -> Result<MineOutcome>
    where
        F: FnOnce(&mut Block, &LedgerConfig) -> Option<String>,
    {
        let pending_before = self.pending.len();
        if self.backend.is_some() {
            self.read_transactions()?;
        }
        if self.pending.is_empty() {
            return Ok(MineOutcome::NothingToMine);
        }

        let last = self.last_block();
        let mut candidate = Block::new(
            last.index() + 1,
            self.pending.clone(),
            now_timestamp(),
            last.seal_hash().as_str(),
        );

        let Some(proof) = search(&mut candidate, &self.config) else {
            self.pending.truncate(pending_before);
            return Ok(MineOutcome::BudgetExhausted);
        };

        let index = candidate.index();
        let Some(sealed) = self.seal_candidate(candidate, &proof) else {
            warn!(index, %proof, "mined block rejected");
            self.pending.truncate(pending_before);
            return Ok(MineOutcome::Rejected);
        };

        // Truncate before appending: a failed truncate must leave the chain unchanged.
        if let Some(backend) = &self.backend {
            if let Err(err) = backend.truncate() {
                self.pending.truncate(pending_before);
                return Err(err.into());
            }
        }

        let txs = self.pending.len();
        self.pending.clear();
        let hash = sealed.seal_hash().clone();
        self.chain.push(sealed);
        info!(index, txs, %hash, "mined block");
        Ok(MineOutcome::Mined { index, hash })
    }

    /// `proof` must carry the difficulty prefix and be the block's own recomputed hash.
    pub fn is_valid_proof(&self, block: &Block, proof: &str) -> bool {
        pow::meets_difficulty(proof, self.config.difficulty) && proof == block.compute_hash()
    }

    /// Seals and appends `block` if it extends the current tip with a valid proof.
    pub fn add_block(&mut self, block: Block, proof: &str) -> bool {
        match self.seal_candidate(block, proof) {
            Some(sealed) => {
                self.chain.push(sealed);
                true
            }
            None => false,
        }
    }

    /// Checks linkage and proof, returning the sealed block without appending it.
    fn seal_candidate(&self, mut block: Block, proof: &str) -> Option<Block> {
        if block.previous_hash() != self.last_block().seal_hash().as_str() {
            debug!(index = block.index(), "block does not extend the tip");
            return None;
        }
        if !self.is_valid_proof(&block, proof) {
            debug!(index = block.index(), "invalid proof of work");
            return None;
        }
        block.set_seal_hash(proof).ok()?;
        Some(block)
    }

    /// Walks the chain re-deriving every hash from block content.
    ///
    /// Each block's `previous_hash` is compared with a fresh hash of its predecessor rather
    /// than the predecessor's stored seal, and the tip is checked against its own seal, so
    /// editing any block after sealing is caught.
    pub fn verify_full_block_history(&self) -> Result<()> {
        for pair in self.chain.windows(2) {
            let (prev, block) = (&pair[0], &pair[1]);
            if block.index() != prev.index() + 1 {
                return Err(LedgerError::ChainIntegrityViolation {
                    index: block.index(),
                    expected: format!("index {}", prev.index() + 1),
                    found: format!("index {}", block.index()),
                });
            }
            let recomputed = prev.compute_hash();
            if recomputed != block.previous_hash() {
                return Err(LedgerError::ChainIntegrityViolation {
                    index: block.index(),
                    expected: recomputed,
                    found: block.previous_hash().to_owned(),
                });
            }
            debug!(index = block.index(), "block verified");
        }

        let tip = self.last_block();
        let recomputed = tip.compute_hash();
        if tip.seal_hash().as_str() != recomputed {
            return Err(LedgerError::ChainIntegrityViolation {
                index: tip.index(),
                expected: recomputed,
                found: tip.seal_hash().to_string(),
            });
        }
        Ok(())
    }

    /// One summary line per block, genesis first.
    pub fn full_chain_summary(&self) -> Vec<String> {
        self.chain.iter().map(Block::summary).collect()
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.chain
    }
}

fn search_nonce(block: &mut Block, config: &LedgerConfig) -> Option<String> {
    if config.parallel {
        mine::proof_of_work_parallel(block, config.difficulty, config.budget)
    } else {
        pow::proof_of_work_within(block, config.difficulty, config.budget)
    }
}

/// Index 0, no transactions, sentinel previous hash, sealed with its own hash.
///
/// Genesis is exempt from proof of work.
pub fn genesis_block() -> Result<Block> {
    let mut genesis = Block::new(
        GENESIS_INDEX,
        Vec::new(),
        now_timestamp(),
        GENESIS_PREVIOUS_HASH,
    );
    let hash = genesis.compute_hash();
    genesis.set_seal_hash(hash)?;
    Ok(genesis)
}
