use crate::{block_hash, constants::NONCES_PER_BATCH, Block};
use rayon::prelude::*;
use tracing::debug;

/// True when the first `difficulty` hex characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

pub fn valid_proof(block: &Block, difficulty: usize) -> bool {
    meets_difficulty(&block_hash(block), difficulty)
}

/// Mine the block by counting `proof` up from zero until its hash meets
/// `difficulty`. Blocks the caller until a proof is found, which never
/// happens for a difficulty above the hash width; see
/// [`LedgerConfig::validate`](crate::LedgerConfig::validate).
pub fn mine(mut block: Block, difficulty: usize) -> Block {
    block.proof = 0;
    while !valid_proof(&block, difficulty) {
        block.proof += 1;
    }
    debug!(index = block.index, proof = block.proof, "proof found");
    block
}

/// Same result as [`mine`], searched in parallel.
///
/// Nonces are handed to rayon in consecutive batches and each batch is
/// searched with `find_first`, so the smallest qualifying proof wins exactly
/// as it would sequentially.
pub fn mine_parallel(mut block: Block, difficulty: usize) -> Block {
    let mut start = 0u64;
    let proof = loop {
        let end = start.saturating_add(NONCES_PER_BATCH);
        let found = (start..end)
            .into_par_iter()
            .map_init(
                || block.clone(),
                |candidate, proof| {
                    candidate.proof = proof;
                    (proof, valid_proof(candidate, difficulty))
                },
            )
            .find_first(|(_, ok)| *ok);
        if let Some((proof, _)) = found {
            break proof;
        }
        start = end;
    };
    block.proof = proof;
    debug!(index = block.index, proof, "proof found in parallel");
    block
}
