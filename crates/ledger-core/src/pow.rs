use crate::block::Block;
use crate::config::MiningBudget;
use std::time::Instant;
use tracing::{debug, warn};

/// Number of leading `'0'` characters in a hex hash.
pub fn count_leading_zero_nibbles(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// A hash qualifies when its first `difficulty` characters are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    count_leading_zero_nibbles(hash) >= difficulty as usize
}

/// Searches nonces from zero upward until the block hash meets `difficulty`.
///
/// Never gives up. The block's nonce is left at the winning value.
pub fn proof_of_work(block: &mut Block, difficulty: u32) -> String {
    block.set_nonce(0);
    let mut computed = block.compute_hash();
    while !meets_difficulty(&computed, difficulty) {
        block.set_nonce(block.nonce().wrapping_add(1));
        computed = block.compute_hash();
    }
    debug!(
        index = block.index(),
        nonce = block.nonce(),
        "proof of work found"
    );
    computed
}

/// Same search as [`proof_of_work`], stopping once `budget` is spent.
///
/// At least one hash is always tried. Returns `None` when no qualifying nonce was found in
/// time; the block's nonce is then the last one tried.
pub fn proof_of_work_within(
    block: &mut Block,
    difficulty: u32,
    budget: MiningBudget,
) -> Option<String> {
    if budget.is_unbounded() {
        return Some(proof_of_work(block, difficulty));
    }
    let deadline = budget.max_duration().map(|d| Instant::now() + d);
    let mut attempts: u64 = 1;

    block.set_nonce(0);
    let mut computed = block.compute_hash();
    while !meets_difficulty(&computed, difficulty) {
        let out_of_iterations = budget.max_iterations.is_some_and(|max| attempts >= max);
        let out_of_time = deadline.is_some_and(|d| Instant::now() >= d);
        if out_of_iterations || out_of_time {
            warn!(
                index = block.index(),
                attempts, difficulty, "mining budget exhausted"
            );
            return None;
        }
        block.set_nonce(block.nonce().wrapping_add(1));
        attempts += 1;
        computed = block.compute_hash();
    }
    Some(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Block {
        Block::new(
            1,
            vec!["Alice->Bob:10".to_string(), "Bob->Charlie:5".to_string()],
            1_600_000_200.0,
            "0",
        )
    }

    #[test]
    fn leading_zero_nibble_examples() {
        assert_eq!(count_leading_zero_nibbles(&"0".repeat(64)), 64);
        assert_eq!(count_leading_zero_nibbles("00f0"), 2);
        assert_eq!(count_leading_zero_nibbles("f000"), 0);
        assert_eq!(count_leading_zero_nibbles(""), 0);
    }

    #[test]
    fn difficulty_zero_accepts_anything() {
        assert!(meets_difficulty("ffff", 0));
        assert!(meets_difficulty("", 0));
        assert!(!meets_difficulty("0fff", 2));
        assert!(meets_difficulty("00ff", 2));
    }

    #[test]
    fn mine_block_example() {
        let mut block = candidate();
        let hash = proof_of_work(&mut block, 3);
        assert!(hash.starts_with("000"));
        assert_eq!(hash, block.compute_hash());
    }

    #[test]
    fn proof_of_work_restarts_from_zero() {
        let mut fresh = candidate();
        let expected = proof_of_work(&mut fresh, 2);

        let mut dirty = Block::with_nonce(
            1,
            candidate().transactions().to_vec(),
            1_600_000_200.0,
            "0",
            9_999,
        );
        assert_eq!(proof_of_work(&mut dirty, 2), expected);
        assert_eq!(dirty.nonce(), fresh.nonce());
    }

    #[test]
    fn proof_of_work_returns_lowest_qualifying_nonce() {
        let mut block = candidate();
        proof_of_work(&mut block, 2);
        let winner = block.nonce();
        for nonce in 0..winner {
            let probe = Block::with_nonce(
                1,
                candidate().transactions().to_vec(),
                1_600_000_200.0,
                "0",
                nonce,
            );
            assert!(!meets_difficulty(&probe.compute_hash(), 2));
        }
    }

    #[test]
    fn iteration_budget_gives_up() {
        let mut block = candidate();
        // 64 leading zeros is unreachable in practice.
        let found = proof_of_work_within(&mut block, 64, MiningBudget::iterations(50));
        assert!(found.is_none());
        assert_eq!(block.nonce(), 49);
    }

    #[test]
    fn generous_budget_matches_unbounded_search() {
        let mut a = candidate();
        let mut b = candidate();
        let unbounded = proof_of_work(&mut a, 2);
        let bounded = proof_of_work_within(&mut b, 2, MiningBudget::iterations(1_000_000));
        assert_eq!(bounded.as_deref(), Some(unbounded.as_str()));
    }

    #[test]
    fn duration_budget_gives_up() {
        let mut block = candidate();
        let budget = MiningBudget::duration(std::time::Duration::from_millis(20));
        assert!(proof_of_work_within(&mut block, 64, budget).is_none());
    }
}
