use std::time::Duration;

use powledger_core::{ChainSnapshot, PeerTransport, TransportError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalNodes {
    pub total_nodes: Vec<String>,
}

/// Peer-to-peer calls over plain HTTP, each bounded by the same timeout.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Ask `peer` to run its own consensus round, typically after we mined.
    pub async fn notify_resolve(&self, peer: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .get(url(peer, "/nodes/resolve"))
            .send()
            .await
            .map_err(|err| classify(peer, err))?;
        expect_status(peer, response.status(), StatusCode::OK)
    }

    /// Push our peer set to `peer`'s `/sync_nodes` and return the set it
    /// reports back.
    pub async fn push_nodes(
        &self,
        peer: &str,
        nodes: Vec<String>,
    ) -> Result<Vec<String>, TransportError> {
        let response = self
            .client
            .post(url(peer, "/sync_nodes"))
            .json(&NodeList { nodes })
            .send()
            .await
            .map_err(|err| classify(peer, err))?;
        expect_status(peer, response.status(), StatusCode::CREATED)?;
        let body: TotalNodes = response.json().await.map_err(|err| decode(peer, err))?;
        Ok(body.total_nodes)
    }
}

impl PeerTransport for HttpTransport {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, TransportError> {
        let response = self
            .client
            .get(url(peer, "/chain"))
            .send()
            .await
            .map_err(|err| classify(peer, err))?;
        expect_status(peer, response.status(), StatusCode::OK)?;
        response.json().await.map_err(|err| decode(peer, err))
    }
}

pub fn url(peer: &str, path: &str) -> String {
    format!("http://{peer}{path}")
}

fn expect_status(peer: &str, got: StatusCode, want: StatusCode) -> Result<(), TransportError> {
    if got == want {
        Ok(())
    } else {
        Err(TransportError::Status {
            peer: peer.to_string(),
            status: got.as_u16(),
        })
    }
}

fn classify(peer: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(peer.to_string())
    } else {
        TransportError::Unreachable {
            peer: peer.to_string(),
            reason: err.to_string(),
        }
    }
}

fn decode(peer: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(peer.to_string());
    }
    TransportError::Decode {
        peer: peer.to_string(),
        reason: err.to_string(),
    }
}
