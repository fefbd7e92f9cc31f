use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use super::Node;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer refused a write because its own chain is at least as long.
    #[error("peer reported a conflicting chain")]
    Conflict,

    #[error("peer answered with HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// GET/PUT of serialized snapshots against a peer's chain endpoint.
#[async_trait]
pub trait ReplicaTransport: Send + Sync {
    async fn get_chain(&self, node: &Node) -> Result<Vec<u8>, TransportError>;

    async fn put_chain(&self, node: &Node, body: Vec<u8>) -> Result<(), TransportError>;
}

/// [`ReplicaTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReplicaTransport for HttpTransport {
    async fn get_chain(&self, node: &Node) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(node.chain_url()).send().await?;
        check_status(response.status())?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn put_chain(&self, node: &Node, body: Vec<u8>) -> Result<(), TransportError> {
        let response = self
            .client
            .put(node.chain_url())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        check_status(response.status())
    }
}

fn check_status(status: StatusCode) -> Result<(), TransportError> {
    if status == StatusCode::CONFLICT {
        Err(TransportError::Conflict)
    } else if !status.is_success() {
        Err(TransportError::Status(status.as_u16()))
    } else {
        Ok(())
    }
}
