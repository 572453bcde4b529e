use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("seal hash must be a string, got {found}")]
    InvalidSealType { found: &'static str },

    #[error("seal hash must have {expected} characters, got {length}", expected = crate::constants::HASH_HEX_SIZE)]
    InvalidSealLength { length: usize },

    #[error("chain integrity violation at block {index}: expected {expected}, found {found}")]
    ChainIntegrityViolation {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("no transaction log backend configured")]
    BackendUnavailable,

    #[error("difficulty {difficulty} exceeds the {max} hex characters of a seal hash", max = crate::constants::HASH_HEX_SIZE)]
    InvalidDifficulty { difficulty: u32 },

    #[error("parallel mining cannot honor a duration budget; use max_iterations")]
    ParallelDurationBudget,

    #[error("cannot restore a ledger from an empty block list")]
    EmptyChain,

    #[error("first block is not a genesis block (index {index}, previous hash {previous_hash})")]
    MissingGenesis { index: u64, previous_hash: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
