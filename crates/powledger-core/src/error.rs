use thiserror::Error;

/// Why the pool refused a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("sender \"0\" is reserved for mining rewards")]
    ReservedSender,

    #[error("transaction {0} is already pending or on chain")]
    DuplicateUuid(String),
}

/// A [`LedgerConfig`](crate::LedgerConfig) no node could run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("difficulty {difficulty} exceeds the {max} hex characters of a block hash")]
    DifficultyTooHigh { difficulty: usize, max: usize },
}

/// Failures talking to a peer. Consensus treats all of them as "skip this peer".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0} timed out")]
    Timeout(String),

    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("peer {peer} sent an undecodable body: {reason}")]
    Decode { peer: String, reason: String },
}
