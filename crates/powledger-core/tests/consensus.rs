use std::collections::HashMap;
use std::sync::Mutex;

use powledger_core::{
    Block, ChainSnapshot, Ledger, LedgerConfig, LoopbackPolicy, PeerTransport, TransportError,
};

const DIFFICULTY: usize = 2;

/// What a fake peer answers with.
#[derive(Clone)]
enum Reply {
    Chain(ChainSnapshot),
    Timeout,
}

#[derive(Default)]
struct FakePeers {
    replies: HashMap<String, Reply>,
    asked: Mutex<Vec<String>>,
}

impl FakePeers {
    fn with(mut self, peer: &str, reply: Reply) -> Self {
        self.replies.insert(peer.to_string(), reply);
        self
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl PeerTransport for FakePeers {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, TransportError> {
        self.asked.lock().unwrap().push(peer.to_string());
        match self.replies.get(peer) {
            Some(Reply::Chain(snapshot)) => Ok(snapshot.clone()),
            Some(Reply::Timeout) => Err(TransportError::Timeout(peer.to_string())),
            None => Err(TransportError::Unreachable {
                peer: peer.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

fn config() -> LedgerConfig {
    LedgerConfig::default()
        .with_difficulty(DIFFICULTY)
        .with_loopback(LoopbackPolicy::Allow)
}

fn ledger_of_length(length: usize) -> Ledger {
    let mut ledger = Ledger::new(config());
    while ledger.len() < length {
        ledger.forge_block();
    }
    ledger
}

fn local_with_peers(length: usize, peers: &[&str]) -> Ledger {
    let mut ledger = ledger_of_length(length);
    for peer in peers {
        assert!(ledger.register_node(peer));
    }
    ledger
}

fn tampered(mut chain: Vec<Block>) -> Vec<Block> {
    chain[1].transactions[0].amount += 100;
    chain
}

#[tokio::test]
async fn adopts_longer_valid_chain() {
    let mut local = local_with_peers(3, &["10.0.0.2:5000"]);
    let remote = ledger_of_length(5);
    let peers = FakePeers::default().with(
        "10.0.0.2:5000",
        Reply::Chain(remote.snapshot()),
    );

    assert!(local.resolve(&peers).await);
    assert_eq!(local.len(), 5);
    assert_eq!(local.chain(), remote.chain());
}

#[tokio::test]
async fn keeps_chain_when_longer_one_is_invalid() {
    let mut local = local_with_peers(3, &["10.0.0.2:5000"]);
    let before = local.chain().to_vec();
    let remote = ledger_of_length(5);
    let peers = FakePeers::default().with(
        "10.0.0.2:5000",
        Reply::Chain(ChainSnapshot::new(tampered(remote.chain().to_vec()))),
    );

    assert!(!local.resolve(&peers).await);
    assert_eq!(local.chain(), before.as_slice());
}

#[tokio::test]
async fn length_mismatch_abandons_the_round() {
    let mut local = local_with_peers(3, &["10.0.0.2:5000", "10.0.0.3:5000"]);
    let before = local.chain().to_vec();
    let good = ledger_of_length(5).snapshot();
    let mut lying = ledger_of_length(4).snapshot();
    lying.length = 6;

    let peers = FakePeers::default()
        .with("10.0.0.2:5000", Reply::Chain(good))
        .with("10.0.0.3:5000", Reply::Chain(lying));

    assert!(!local.resolve(&peers).await);
    assert_eq!(local.chain(), before.as_slice());
}

#[tokio::test]
async fn skips_unreachable_peers() {
    let mut local = local_with_peers(2, &["10.0.0.2:5000", "10.0.0.3:5000", "10.0.0.4:5000"]);
    let remote = ledger_of_length(4);
    let peers = FakePeers::default()
        .with("10.0.0.2:5000", Reply::Timeout)
        .with("10.0.0.4:5000", Reply::Chain(remote.snapshot()));

    assert!(local.resolve(&peers).await);
    assert_eq!(local.chain(), remote.chain());
    assert_eq!(peers.asked().len(), 3);
}

#[tokio::test]
async fn picks_the_longest_of_several() {
    let mut local = local_with_peers(2, &["10.0.0.2:5000", "10.0.0.3:5000"]);
    let shorter = ledger_of_length(3);
    let longest = ledger_of_length(5);
    let peers = FakePeers::default()
        .with("10.0.0.2:5000", Reply::Chain(longest.snapshot()))
        .with("10.0.0.3:5000", Reply::Chain(shorter.snapshot()));

    assert!(local.resolve(&peers).await);
    assert_eq!(local.chain(), longest.chain());
}

#[tokio::test]
async fn equal_length_is_not_a_replacement() {
    let mut local = local_with_peers(3, &["10.0.0.2:5000"]);
    let before = local.chain().to_vec();
    let peers = FakePeers::default().with(
        "10.0.0.2:5000",
        Reply::Chain(ledger_of_length(3).snapshot()),
    );

    assert!(!local.resolve(&peers).await);
    assert_eq!(local.chain(), before.as_slice());
}

#[tokio::test]
async fn own_host_is_never_polled() {
    let mut local = ledger_of_length(1);
    assert!(local.set_host("127.0.0.1:5000"));
    assert!(local.register_node("127.0.0.1:5001"));
    let peers = FakePeers::default();

    assert!(!local.resolve(&peers).await);
    assert_eq!(peers.asked(), vec!["127.0.0.1:5001".to_string()]);
}

#[tokio::test]
async fn adopted_chain_accepts_new_blocks() {
    let mut local = local_with_peers(2, &["10.0.0.2:5000"]);
    let remote = ledger_of_length(4);
    let peers = FakePeers::default().with("10.0.0.2:5000", Reply::Chain(remote.snapshot()));
    assert!(local.resolve(&peers).await);

    let block = local.forge_block();
    assert_eq!(block.index, 5);
    assert!(local.validate_chain(local.chain()));
}
