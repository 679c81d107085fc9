use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod chain;
pub mod config;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod nodes;
pub mod pool;
pub mod pow;

pub use chain::{validate_chain, Ledger};
pub use config::{LedgerConfig, LoopbackPolicy};
pub use consensus::{resolve_conflicts, PeerTransport};
pub use error::{ConfigError, TransactionError, TransportError};
pub use nodes::NodeRegistry;
pub use pool::TransactionPool;

use constants::REWARD_SENDER;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub uuid: String,
}

impl Transaction {
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

/// A transaction as submitted by a client. Every field may be absent so the
/// pool can tell a missing field from an empty one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl TransactionDraft {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: Some(sender.into()),
            recipient: Some(recipient.into()),
            amount: Some(amount),
            uuid: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }
}

impl From<Transaction> for TransactionDraft {
    fn from(tx: Transaction) -> Self {
        Self {
            sender: Some(tx.sender),
            recipient: Some(tx.recipient),
            amount: Some(tx.amount),
            uuid: Some(tx.uuid),
        }
    }
}

/// A block as it travels between peers. Its own hash is never stored; see
/// [`block_hash`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// An unmined block stamped with the current time and `proof = 0`.
    pub fn template(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof: 0,
            previous_hash,
        }
    }

    pub fn hash(&self) -> String {
        block_hash(self)
    }

    pub fn reward_count(&self) -> usize {
        self.transactions.iter().filter(|tx| tx.is_reward()).count()
    }
}

/// The `/chain` wire format: the full chain plus its claimed length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Compact JSON with every object's keys sorted by name, recursively.
/// The in-memory field order of `value` never affects the output.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(sort_keys(serde_json::to_value(value)?).to_string())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// SHA-256 of the block's canonical JSON, as 64 lowercase hex characters.
/// Mining, validation and the HTTP layer all hash through here.
pub fn block_hash(block: &Block) -> String {
    // A block only holds strings and numbers, so it always has a JSON form.
    let canonical = canonical_json(block).expect("block serializes to json");
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// 32 lowercase hex characters from 16 random bytes, used for transaction
/// uuids and node accounts.
pub fn random_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
