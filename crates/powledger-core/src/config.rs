use serde::{Deserialize, Serialize};

use crate::{
    constants::{HASH_HEX_SIZE, MINING_REWARD, POW_TARGET_DIFFICULTY},
    error::ConfigError,
};

/// Whether the node registry admits loopback hosts such as `127.0.0.1`.
///
/// Rejecting them keeps a node from advertising addresses its peers cannot
/// reach; allowing them is what same-host test topologies need.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopbackPolicy {
    #[default]
    Reject,
    Allow,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of every block hash.
    pub difficulty: usize,
    pub mining_reward: u64,
    pub loopback: LoopbackPolicy,
    /// Search nonces with rayon instead of a single thread.
    pub parallel_mining: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
            mining_reward: MINING_REWARD,
            loopback: LoopbackPolicy::Reject,
            parallel_mining: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_loopback(mut self, loopback: LoopbackPolicy) -> Self {
        self.loopback = loopback;
        self
    }

    pub fn with_parallel_mining(mut self, parallel_mining: bool) -> Self {
        self.parallel_mining = parallel_mining;
        self
    }

    /// Reject settings under which mining can never finish.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_difficulty(self.difficulty)?;
        Ok(())
    }
}

/// A hash has [`HASH_HEX_SIZE`] hex characters; asking for more leading zeros
/// than that is unsatisfiable.
pub fn check_difficulty(difficulty: usize) -> Result<usize, ConfigError> {
    if difficulty > HASH_HEX_SIZE {
        return Err(ConfigError::DifficultyTooHigh {
            difficulty,
            max: HASH_HEX_SIZE,
        });
    }
    Ok(difficulty)
}
