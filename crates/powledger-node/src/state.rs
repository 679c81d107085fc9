use std::sync::Arc;

use powledger_core::{Block, ChainSnapshot, Ledger};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};

use crate::transport::HttpTransport;

/// Shared by every handler.
///
/// `ledger` is the single lock all mutating operations go through. `published`
/// is a copy of the chain refreshed while that lock is held, so `/chain` can be
/// served to peers while a block is being mined or a resolution is running.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub published: Arc<RwLock<ChainSnapshot>>,
    pub transport: HttpTransport,
}

impl AppState {
    pub fn new(ledger: Ledger, transport: HttpTransport) -> Self {
        let published = Arc::new(RwLock::new(ledger.snapshot()));
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            published,
            transport,
        }
    }

    /// Refresh the published chain. Call with the ledger lock held.
    pub async fn publish(&self, ledger: &Ledger) {
        *self.published.write().await = ledger.snapshot();
    }

    /// Start a consensus round on its own task.
    ///
    /// The round holds the ledger lock until every peer has answered or timed
    /// out. Dropping the handle does not stop it, so a caller that hangs up
    /// mid-round still gets the chain adopted. Yields whether the chain was
    /// replaced and the chain as it stands afterwards.
    pub fn spawn_resolve(&self) -> JoinHandle<(bool, Vec<Block>)> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ledger = state.ledger.lock().await;
            let replaced = ledger.resolve(&state.transport).await;
            if replaced {
                state.publish(&ledger).await;
            }
            (replaced, ledger.chain().to_vec())
        })
    }

    /// [`AppState::publish`] for use inside `spawn_blocking`.
    pub fn publish_blocking(&self, ledger: &Ledger) {
        *self.published.blocking_write() = ledger.snapshot();
    }
}
