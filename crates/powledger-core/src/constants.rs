pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const POW_TARGET_DIFFICULTY: usize = 4;
pub const MINING_REWARD: u64 = 1;
/// Sender used for the coinbase transaction of every block.
pub const REWARD_SENDER: &str = "0";
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
/// Nonces handed to rayon per round of `mine_parallel`.
pub const NONCES_PER_BATCH: u64 = 1 << 14;
pub const HTTP_SCHEME: &str = "http://";
pub const LOOPBACK_HOSTS: [&str; 4] = ["localhost", "0.0.0.0", "127.0.0.1", "[::1]"];
