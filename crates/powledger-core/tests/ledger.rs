use powledger_core::{
    constants::POW_TARGET_DIFFICULTY, pow::valid_proof, Ledger, LedgerConfig, TransactionDraft,
};

#[test]
fn mine_after_transfer_at_network_difficulty() {
    let mut ledger = Ledger::new(LedgerConfig::default());
    assert_eq!(ledger.len(), 1);
    let genesis_hash = ledger.last_block().hash();

    assert!(ledger.submit_transaction(TransactionDraft::new("alice", "bob", 10)));
    let block = ledger.forge_block();

    assert_eq!(block.index, 2);
    assert_eq!(block.transactions.len(), 2);
    assert_eq!(block.transactions[0].sender, "alice");
    assert_eq!(block.transactions[0].recipient, "bob");
    assert_eq!(block.transactions[0].amount, 10);
    assert_eq!(block.reward_count(), 1);
    assert_eq!(block.previous_hash, genesis_hash);
    assert!(block.hash().starts_with("0000"));
    assert!(valid_proof(&block, POW_TARGET_DIFFICULTY));
    assert!(ledger.validate_chain(ledger.chain()));
}

#[test]
fn every_forged_block_has_one_reward() {
    let mut ledger = Ledger::new(LedgerConfig::default().with_difficulty(1));
    for i in 0..5u64 {
        assert!(ledger.submit_transaction(TransactionDraft::new("alice", "bob", i + 1)));
        // Clients cannot mint: the reward sender is reserved.
        assert!(!ledger.submit_transaction(TransactionDraft::new("0", "mallory", 50)));
        assert_eq!(ledger.forge_block().reward_count(), 1);
    }
    assert!(ledger.chain().iter().all(|block| block.reward_count() == 1));
    assert!(ledger.validate_chain(ledger.chain()));
}

#[test]
fn duplicate_submission_is_refused() {
    let mut ledger = Ledger::new(LedgerConfig::default().with_difficulty(0));
    let draft = TransactionDraft::new("alice", "bob", 10).with_uuid("tx-1");
    assert!(ledger.submit_transaction(draft.clone()));
    assert!(!ledger.submit_transaction(draft));
    assert!(!ledger.submit_transaction(TransactionDraft::new("eve", "bob", 99).with_uuid("tx-1")));
    assert_eq!(ledger.pending().len(), 1);
}
