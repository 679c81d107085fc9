use std::collections::BTreeSet;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use powledger_core::{nodes::netloc, Block, ChainSnapshot, Transaction, TransactionDraft};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    state::AppState,
    transport::{HttpTransport, NodeList, TotalNodes},
};

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    pub block_hash: String,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        let block_hash = block.hash();
        Self {
            message: "New Block Forged".to_string(),
            index: block.index,
            transactions: block.transactions,
            proof: block.proof,
            previous_hash: block.previous_hash,
            block_hash,
        }
    }
}

/// Either a single `transaction` or a batch of `transactions`, or both.
///
/// Entries stay raw JSON until each is decoded on its own, so a malformed one
/// is reported at its position instead of failing the whole body.
#[derive(Deserialize)]
struct TransactionsIn {
    #[serde(default)]
    transaction: Option<Value>,
    #[serde(default)]
    transactions: Vec<Value>,
}

#[derive(Serialize)]
struct Rejected {
    position: usize,
    reason: String,
}

/// A peer given either as `address` or as separate `host` and `port`.
#[derive(Deserialize)]
struct RegisterIn {
    address: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

type Reply = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transactions))
        .route("/chain", get(full_chain))
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_node))
        .route("/nodes/search", get(search_nodes))
        .route("/nodes/resolve", get(resolve))
        .route("/sync_nodes", post(sync_nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn mine(State(state): State<AppState>) -> Result<Json<MineResponse>, Reply> {
    let worker = state.clone();
    let (block, peers) = tokio::task::spawn_blocking(move || {
        let mut ledger = worker.ledger.blocking_lock();
        let block = ledger.forge_block();
        worker.publish_blocking(&ledger);
        (block, ledger.peers())
    })
    .await
    .map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("mining task failed: {err}") })),
        )
    })?;

    notify_peers(&state.transport, peers).await;
    Ok(Json(MineResponse::from(block)))
}

async fn notify_peers(transport: &HttpTransport, peers: Vec<String>) {
    for peer in peers {
        if let Err(err) = transport.notify_resolve(&peer).await {
            debug!(%peer, error = %err, "peer not notified of new block");
        }
    }
}

async fn new_transactions(
    State(state): State<AppState>,
    Json(body): Json<TransactionsIn>,
) -> Reply {
    let entries = body.transaction.into_iter().chain(body.transactions);

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let next_index = {
        let mut ledger = state.ledger.lock().await;
        for (position, entry) in entries.enumerate() {
            let draft = match serde_json::from_value::<TransactionDraft>(entry) {
                Ok(draft) => draft,
                Err(err) => {
                    rejected.push(Rejected {
                        position,
                        reason: format!("malformed transaction: {err}"),
                    });
                    continue;
                }
            };
            match ledger.try_submit(draft) {
                Ok(tx) => accepted.push(tx),
                Err(err) => rejected.push(Rejected {
                    position,
                    reason: err.to_string(),
                }),
            }
        }
        ledger.len() + 1
    };

    if accepted.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid transactions", "rejected": rejected })),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Transactions will be added to block {next_index}"),
            "transactions": accepted,
            "rejected": rejected,
        })),
    )
}

async fn full_chain(State(state): State<AppState>) -> Json<ChainSnapshot> {
    Json(state.published.read().await.clone())
}

async fn list_nodes(State(state): State<AppState>) -> Json<Value> {
    let ledger = state.ledger.lock().await;
    Json(json!({
        "host": ledger.host(),
        "total_nodes": ledger.nodes().to_vec(),
    }))
}

async fn register_node(State(state): State<AppState>, Json(body): Json<RegisterIn>) -> Reply {
    let address = body
        .address
        .or_else(|| Some(format!("{}:{}", body.host?, body.port?)));
    let Some(address) = address else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing address" })),
        );
    };

    let (registered, nodes) = {
        let mut ledger = state.ledger.lock().await;
        (ledger.register_node(&address), ledger.nodes().to_vec())
    };
    if !registered {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "New node is invalid",
                "new_node": address,
                "total_nodes": nodes,
            })),
        );
    }

    // Handshake: hand the new peer our set and merge whatever it knows.
    let mut total_nodes = nodes.clone();
    if let Some(peer) = netloc(&address) {
        match state.transport.push_nodes(&peer, nodes).await {
            Ok(theirs) => {
                let mut ledger = state.ledger.lock().await;
                for node in &theirs {
                    ledger.register_node(node);
                }
                total_nodes = ledger.nodes().to_vec();
            }
            Err(err) => debug!(%peer, error = %err, "peer did not take our node list"),
        }
    }

    info!(node = %address, "peer added");
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "New nodes have been added",
            "new_node": address,
            "total_nodes": total_nodes,
        })),
    )
}

async fn sync_nodes(State(state): State<AppState>, Json(body): Json<NodeList>) -> Reply {
    if body.nodes.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing nodes" })),
        );
    }
    let mut ledger = state.ledger.lock().await;
    for node in &body.nodes {
        ledger.register_node(node);
    }
    let reply = TotalNodes {
        total_nodes: ledger.nodes().to_vec(),
    };
    (StatusCode::CREATED, Json(json!(reply)))
}

async fn search_nodes(State(state): State<AppState>) -> Reply {
    let (peers, nodes) = {
        let ledger = state.ledger.lock().await;
        (ledger.peers(), ledger.nodes().to_vec())
    };

    let mut discovered = BTreeSet::new();
    for peer in peers {
        match state.transport.push_nodes(&peer, nodes.clone()).await {
            Ok(theirs) => discovered.extend(theirs),
            Err(err) => debug!(%peer, error = %err, "peer skipped during search"),
        }
    }

    let mut ledger = state.ledger.lock().await;
    for node in &discovered {
        ledger.register_node(node);
    }
    (
        StatusCode::CREATED,
        Json(json!({ "add_nodes": discovered })),
    )
}

async fn resolve(State(state): State<AppState>) -> Reply {
    let (replaced, chain) = match state.spawn_resolve().await {
        Ok(outcome) => outcome,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": format!("consensus task failed: {err}") })),
            )
        }
    };
    if replaced {
        (
            StatusCode::OK,
            Json(json!({
                "message": "Our chain was replaced",
                "new_chain": chain,
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "message": "Our chain is authoritative",
                "chain": chain,
            })),
        )
    }
}
