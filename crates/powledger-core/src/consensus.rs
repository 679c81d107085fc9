use std::future::Future;

use tracing::{info, warn};

use crate::{chain::Ledger, error::TransportError, Block, ChainSnapshot};

/// How the resolver reaches peers. The node implements it over HTTP; tests
/// hand out canned snapshots.
pub trait PeerTransport {
    /// Fetch `peer`'s full chain. Implementations bound the call with their
    /// own timeout.
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<ChainSnapshot, TransportError>> + Send;
}

/// Longest valid chain wins.
///
/// Peers are polled one after another; unreachable ones are skipped. A peer
/// whose claimed length disagrees with the chain it sent ends the whole round
/// with no replacement. Returns true iff the local chain was replaced by a
/// strictly longer chain that passed validation.
pub async fn resolve_conflicts<T: PeerTransport>(ledger: &mut Ledger, transport: &T) -> bool {
    let mut max_length = ledger.len();
    let mut best: Option<(String, Vec<Block>)> = None;

    for peer in ledger.peers() {
        let snapshot = match transport.fetch_chain(&peer).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%peer, error = %err, "skipping peer");
                continue;
            }
        };

        if snapshot.length != snapshot.chain.len() {
            warn!(
                %peer,
                claimed = snapshot.length,
                actual = snapshot.chain.len(),
                "peer chain length mismatch, abandoning resolution"
            );
            return false;
        }

        if snapshot.length > max_length && ledger.validate_chain(&snapshot.chain) {
            max_length = snapshot.length;
            best = Some((peer, snapshot.chain));
        }
    }

    match best {
        Some((peer, chain)) => {
            info!(%peer, from = ledger.len(), to = chain.len(), "replacing local chain");
            ledger.replace_chain(chain);
            true
        }
        None => false,
    }
}

impl Ledger {
    /// Run one consensus round against every known peer. See
    /// [`resolve_conflicts`].
    pub async fn resolve<T: PeerTransport>(&mut self, transport: &T) -> bool {
        resolve_conflicts(self, transport).await
    }
}
