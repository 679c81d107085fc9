use crate::{
    constants::REWARD_SENDER, error::TransactionError, random_id, Block, Transaction,
    TransactionDraft,
};

/// Transactions waiting for the next block, in submission order.
#[derive(Clone, Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `draft` and queue it.
    ///
    /// `history` is the chain the transaction would be appended to; its
    /// uuid must not appear there nor among the pending transactions. Nothing
    /// is mutated on rejection.
    pub fn submit(
        &mut self,
        draft: TransactionDraft,
        history: &[Block],
    ) -> Result<Transaction, TransactionError> {
        let sender = draft.sender.ok_or(TransactionError::MissingField("sender"))?;
        let recipient = draft
            .recipient
            .ok_or(TransactionError::MissingField("recipient"))?;
        let amount = draft.amount.ok_or(TransactionError::MissingField("amount"))?;

        if sender.is_empty() {
            return Err(TransactionError::EmptyField("sender"));
        }
        if sender == REWARD_SENDER {
            return Err(TransactionError::ReservedSender);
        }
        if recipient.is_empty() {
            return Err(TransactionError::EmptyField("recipient"));
        }
        if amount == 0 {
            return Err(TransactionError::EmptyField("amount"));
        }
        let uuid = match draft.uuid {
            Some(uuid) if uuid.is_empty() => return Err(TransactionError::EmptyField("uuid")),
            Some(uuid) => uuid,
            None => random_id(),
        };

        if self.contains(&uuid) || on_chain(&uuid, history) {
            return Err(TransactionError::DuplicateUuid(uuid));
        }

        let tx = Transaction {
            sender,
            recipient,
            amount,
            uuid,
        };
        self.pending.push(tx.clone());
        Ok(tx)
    }

    /// Queue the coinbase for the block about to be mined. Its fields are
    /// all non-empty and its uuid fresh, so it skips validation.
    pub fn inject_reward(&mut self, recipient: &str, amount: u64) -> Transaction {
        let tx = Transaction {
            sender: REWARD_SENDER.to_string(),
            recipient: recipient.to_string(),
            amount,
            uuid: random_id(),
        };
        self.pending.push(tx.clone());
        tx
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.pending.iter().any(|tx| tx.uuid == uuid)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn snapshot(&self) -> Vec<Transaction> {
        self.pending.clone()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Drop pending transactions that `history` already contains.
    /// Returns how many were removed.
    pub fn prune(&mut self, history: &[Block]) -> usize {
        let before = self.pending.len();
        self.pending.retain(|tx| !on_chain(&tx.uuid, history));
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// Newest blocks first: a replayed transaction is most likely recent.
fn on_chain(uuid: &str, history: &[Block]) -> bool {
    history
        .iter()
        .rev()
        .any(|block| block.transactions.iter().any(|tx| tx.uuid == uuid))
}
