//! Push/pull reconciliation with adjacent peers.
//!
//! Every local mutation fans out one background exchange per peer. The
//! fork-choice rule is plain block count: a snapshot replaces local state
//! only when it holds strictly more blocks and verifies.

use log::{debug, info, warn};
use tokio::runtime::Handle;

use super::{Node, TransportError};
use crate::blockchain::{Blockchain, Snapshot};
use crate::error::{ChainError, Result};
use crate::ledger::Ledger;

/// Which primitive a peer exchange tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Push; pull back if the peer holds a longer chain.
    PushFirst,
    /// Pull; push instead if the local chain is at least as long.
    PullFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed,
    Pulled,
    Failed(String),
}

/// Result of one background exchange with one peer.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub peer: Node,
    pub mode: SyncMode,
    pub outcome: SyncOutcome,
}

impl Ledger {
    /// Fetch the peer's snapshot and adopt it if it is longer than ours.
    /// Returns `ChainOutdated` when the local chain is at least as long.
    pub async fn pull_from(&self, peer: &Node) -> Result<()> {
        let data = self.inner.transport.get_chain(peer).await?;
        let snapshot = Snapshot::decode(&data)?;
        let height = snapshot.blocks.len();
        self.receive_snapshot(snapshot)?;
        info!("SYNC - adopted chain of {height} blocks from {}", peer.name);
        Ok(())
    }

    /// Send a snapshot to the peer. `ChainOutdated` means the peer's chain
    /// is at least as long as the one we sent.
    pub async fn push_to(&self, peer: &Node, payload: Vec<u8>) -> Result<()> {
        match self.inner.transport.put_chain(peer, payload).await {
            Ok(()) => {
                debug!("SYNC - pushed chain to {}", peer.name);
                Ok(())
            }
            Err(TransportError::Conflict) => Err(ChainError::ChainOutdated),
            Err(e) => Err(e.into()),
        }
    }

    /// Accept a peer snapshot under the ledger lock. Serves both pulls and
    /// incoming pushes.
    pub fn receive_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        if snapshot.blocks.len() <= self.len() {
            return Err(ChainError::ChainOutdated);
        }
        // verified before taking the lock
        let remote = Blockchain::from_snapshot(snapshot)?;

        let mut chain = self.inner.chain.lock();
        if remote.len() <= chain.len() {
            return Err(ChainError::ChainOutdated);
        }
        *chain = remote;
        Ok(())
    }

    /// Start one independent exchange per adjacent peer and return at once.
    /// Outcomes are only published on the [`Ledger::subscribe`] channel.
    pub fn synchronize(&self, mode: SyncMode) {
        let peers = self.peers();
        if peers.is_empty() {
            return;
        }
        let payload = match self.snapshot().encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("SYNC - cannot encode snapshot: {e}");
                return;
            }
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("SYNC - no async runtime, skipping sync with {} peers", peers.len());
            return;
        };

        for peer in peers {
            let ledger = self.clone();
            let payload = payload.clone();
            runtime.spawn(async move {
                let outcome = ledger.exchange(&peer, mode, payload).await;
                // nobody listening is fine
                let _ = ledger.inner.events.send(SyncEvent {
                    peer,
                    mode,
                    outcome,
                });
            });
        }
    }

    async fn exchange(&self, peer: &Node, mode: SyncMode, payload: Vec<u8>) -> SyncOutcome {
        let result = match mode {
            SyncMode::PushFirst => match self.push_to(peer, payload).await {
                Err(ChainError::ChainOutdated) => {
                    self.pull_from(peer).await.map(|()| SyncOutcome::Pulled)
                }
                other => other.map(|()| SyncOutcome::Pushed),
            },
            SyncMode::PullFirst => match self.pull_from(peer).await {
                Err(ChainError::ChainOutdated) => {
                    self.push_to(peer, payload).await.map(|()| SyncOutcome::Pushed)
                }
                other => other.map(|()| SyncOutcome::Pulled),
            },
        };

        result.unwrap_or_else(|e| {
            debug!("SYNC - exchange with {} ({mode:?}) failed: {e}", peer.name);
            SyncOutcome::Failed(e.to_string())
        })
    }

    /// Bring `node` in line with us, then add it to the adjacency set.
    ///
    /// The node's chain is pulled first; if ours is at least as long it is
    /// pushed instead. A conflict on that push means both chains have the
    /// same length, which also counts as consistent.
    pub async fn register_peer(&self, node: Node) -> Result<()> {
        match self.pull_from(&node).await {
            Ok(()) => {}
            Err(ChainError::ChainOutdated) => {
                let payload = self.snapshot().encode()?;
                match self.push_to(&node, payload).await {
                    Ok(()) | Err(ChainError::ChainOutdated) => {}
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }

        let mut peers = self.inner.peers.write();
        if peers.iter().any(|p| p.address == node.address) {
            debug!("SYNC - peer {} already registered", node.address);
        } else {
            info!("SYNC - registered peer {} at {}", node.name, node.address);
            peers.push(node);
        }
        Ok(())
    }
}
