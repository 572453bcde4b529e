use crate::constants::{DEFAULT_DIFFICULTY, HASH_HEX_SIZE};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Optional cap on the nonce search. Both limits unset means search forever.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningBudget {
    #[serde(default)]
    pub max_iterations: Option<u64>,
    #[serde(default)]
    pub max_duration_ms: Option<u64>,
}

impl MiningBudget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn iterations(max: u64) -> Self {
        Self {
            max_iterations: Some(max),
            max_duration_ms: None,
        }
    }

    pub fn duration(max: Duration) -> Self {
        Self {
            max_iterations: None,
            max_duration_ms: Some(max.as_millis() as u64),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_iterations.is_none() && self.max_duration_ms.is_none()
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default)]
    pub budget: MiningBudget,
    /// Search nonces on the rayon pool instead of the calling thread.
    #[serde(default)]
    pub parallel: bool,
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            budget: MiningBudget::default(),
            parallel: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidDifficulty {
                difficulty: self.difficulty,
            });
        }
        if self.parallel && self.budget.max_duration_ms.is_some() {
            return Err(LedgerError::ParallelDurationBudget);
        }
        Ok(())
    }
}
