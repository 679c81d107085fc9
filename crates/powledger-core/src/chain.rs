use std::collections::HashSet;

use tracing::{debug, info};

use crate::{
    block_hash,
    config::LedgerConfig,
    constants::GENESIS_PREVIOUS_HASH,
    error::TransactionError,
    nodes::{self, NodeRegistry},
    pool::TransactionPool,
    pow::{meets_difficulty, mine, mine_parallel},
    random_id, Block, ChainSnapshot, Transaction, TransactionDraft,
};

/// Check a chain end to end: every block meets `difficulty`, sits at its
/// 1-based position, links to the hash of its predecessor and carries exactly
/// one reward transaction. Genesis links to the all-zero hash and no uuid
/// appears twice. Empty chains are invalid.
pub fn validate_chain(chain: &[Block], difficulty: usize) -> bool {
    let Some(genesis) = chain.first() else {
        return false;
    };
    if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        debug!(index = genesis.index, "genesis does not link to the zero hash");
        return false;
    }

    let mut previous_hash = String::new();
    let mut seen = HashSet::new();
    for (position, block) in chain.iter().enumerate() {
        let hash = block_hash(block);
        if block.index != position as u64 + 1 {
            debug!(index = block.index, position, "block index out of place");
            return false;
        }
        if !meets_difficulty(&hash, difficulty) {
            debug!(index = block.index, "block fails proof of work");
            return false;
        }
        if position > 0 && block.previous_hash != previous_hash {
            debug!(index = block.index, "block does not link to its predecessor");
            return false;
        }
        if block.reward_count() != 1 {
            debug!(index = block.index, "block reward count is not one");
            return false;
        }
        if let Some(tx) = block.transactions.iter().find(|tx| !seen.insert(tx.uuid.as_str())) {
            debug!(index = block.index, uuid = %tx.uuid, "transaction repeated on chain");
            return false;
        }
        previous_hash = hash;
    }
    true
}

/// The ledger context of one node: chain, pending pool, peer registry and the
/// account this node mines to.
///
/// All mutation goes through `&mut self`; callers sharing a ledger wrap it in a
/// single lock so forging, submission and consensus never interleave.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pool: TransactionPool,
    nodes: NodeRegistry,
    account: String,
    host: Option<String>,
    config: LedgerConfig,
}

impl Ledger {
    /// A fresh ledger holding only its freshly mined genesis block.
    pub fn new(config: LedgerConfig) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pool: TransactionPool::new(),
            nodes: NodeRegistry::with_policy(config.loopback),
            account: random_id(),
            host: None,
            config,
        };
        ledger.forge_on(GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    /// Mine the pending transactions plus a reward into a new block on the
    /// tip. Blocks until a proof is found.
    pub fn forge_block(&mut self) -> Block {
        let previous_hash = self.last_block().hash();
        self.forge_on(previous_hash)
    }

    fn forge_on(&mut self, previous_hash: String) -> Block {
        self.pool
            .inject_reward(&self.account, self.config.mining_reward);
        let template = Block::template(
            self.chain.len() as u64 + 1,
            self.pool.snapshot(),
            previous_hash,
        );
        let block = if self.config.parallel_mining {
            mine_parallel(template, self.config.difficulty)
        } else {
            mine(template, self.config.difficulty)
        };
        self.pool.clear();

        info!(
            index = block.index,
            proof = block.proof,
            txs = block.transactions.len(),
            hash = %block.hash(),
            "forged block"
        );
        self.chain.push(block.clone());
        block
    }

    /// Queue a transaction for the next block, reporting why it was refused.
    pub fn try_submit(&mut self, draft: TransactionDraft) -> Result<Transaction, TransactionError> {
        let result = self.pool.submit(draft, &self.chain);
        if let Err(err) = &result {
            debug!(error = %err, "transaction rejected");
        }
        result
    }

    pub fn submit_transaction(&mut self, draft: TransactionDraft) -> bool {
        self.try_submit(draft).is_ok()
    }

    /// Validate `chain` under this ledger's difficulty. Does not need to be
    /// the local chain.
    pub fn validate_chain(&self, chain: &[Block]) -> bool {
        validate_chain(chain, self.config.difficulty)
    }

    pub fn register_node(&mut self, address: &str) -> bool {
        self.nodes.register(address)
    }

    /// Record the address this node advertises and register it as a peer.
    pub fn set_host(&mut self, address: &str) -> bool {
        self.host = Some(nodes::netloc(address).unwrap_or_else(|| address.to_string()));
        self.nodes.register(address)
    }

    /// Known peers other than this node itself.
    pub fn peers(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| Some(node.as_str()) != self.host.as_deref())
            .cloned()
            .collect()
    }

    /// Swap in a chain adopted through consensus. Pending transactions that
    /// the new chain already contains are dropped.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
        let pruned = self.pool.prune(&self.chain);
        if pruned > 0 {
            debug!(pruned, "dropped pending transactions already on the adopted chain");
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds a genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain.clone())
    }

    pub fn pending(&self) -> &[Transaction] {
        self.pool.pending()
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
