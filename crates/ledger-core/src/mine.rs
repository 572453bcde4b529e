use crate::{block::Block, config::MiningBudget, hasher, pow::meets_difficulty};
use rayon::prelude::*;
use tracing::{info, warn};

/// Searches nonces in parallel on the rayon pool.
///
/// Uses `find_first`, so the winner is the lowest qualifying nonce: the same one the
/// sequential search returns. Only `budget.max_iterations` is honored here, and like the
/// sequential search at least one nonce is tried.
pub fn proof_of_work_parallel(
    block: &mut Block,
    difficulty: u32,
    budget: MiningBudget,
) -> Option<String> {
    let upper = budget.max_iterations.unwrap_or(u64::MAX).max(1);
    let index = block.index();
    let timestamp = block.timestamp();
    let previous_hash = block.previous_hash().to_owned();
    let transactions = block.transactions();

    let found = (0u64..upper).into_par_iter().find_first(|nonce| {
        let bytes =
            hasher::canonical_bytes(index, transactions, timestamp, &previous_hash, *nonce);
        meets_difficulty(&hasher::digest_hex(&bytes), difficulty)
    });

    let Some(nonce) = found else {
        warn!(index, upper, difficulty, "parallel mining budget exhausted");
        return None;
    };

    block.set_nonce(nonce);
    let hash = block.compute_hash();
    info!(index, nonce, %hash, "mined block in parallel");
    Some(hash)
}
