use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::blockchain::{Block, Blockchain, Snapshot};
use crate::error::Result;
use crate::network::{Node, ReplicaTransport, SyncEvent, SyncMode};
use crate::transaction::Transaction;

/// Capacity of the sync event channel. Slow subscribers miss old events.
const SYNC_EVENT_CAPACITY: usize = 256;

/// Shared handle to a replicated chain. Cloning is cheap and every clone
/// sees the same state.
#[derive(Clone)]
pub struct Ledger {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    /// Guards balance check + append, block commits and snapshot acceptance.
    pub(crate) chain: Mutex<Blockchain>,
    /// Held for a whole seal, mine and commit round.
    pub(crate) mining: Mutex<()>,
    pub(crate) peers: RwLock<Vec<Node>>,
    pub(crate) transport: Arc<dyn ReplicaTransport>,
    pub(crate) events: broadcast::Sender<SyncEvent>,
}

impl Ledger {
    /// Start a ledger holding only the genesis block.
    pub fn open(difficulty: u32, transport: Arc<dyn ReplicaTransport>) -> Result<Self> {
        Self::from_blockchain(Blockchain::new(difficulty)?, transport)
    }

    /// Resume from a previously saved snapshot.
    pub fn restore(snapshot: Snapshot, transport: Arc<dyn ReplicaTransport>) -> Result<Self> {
        Self::from_blockchain(Blockchain::from_snapshot(snapshot)?, transport)
    }

    fn from_blockchain(chain: Blockchain, transport: Arc<dyn ReplicaTransport>) -> Result<Self> {
        let (events, _) = broadcast::channel(SYNC_EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                chain: Mutex::new(chain),
                mining: Mutex::new(()),
                peers: RwLock::new(Vec::new()),
                transport,
                events,
            }),
        })
    }

    pub fn difficulty(&self) -> u8 {
        self.inner.chain.lock().difficulty()
    }

    pub fn set_difficulty(&self, difficulty: u32) -> Result<()> {
        self.inner.chain.lock().set_difficulty(difficulty)?;
        info!("LEDGER - difficulty set to {difficulty}");
        Ok(())
    }

    pub fn balance_of(&self, account: &str) -> i128 {
        self.inner.chain.lock().balance_of(account)
    }

    /// Queue a transfer from `source` to `target`. Returns false without
    /// touching state when `source` cannot cover `amount`.
    pub fn push_transaction(&self, target: &str, source: &str, amount: u64) -> bool {
        let accepted = {
            let mut chain = self.inner.chain.lock();
            chain.push_transaction(target, source, amount).cloned()
        };
        match accepted {
            Some(tx) => {
                debug!("LEDGER - queued tx {} ({source} -> {target}: {amount})", tx.id);
                self.synchronize(SyncMode::PushFirst);
                true
            }
            None => false,
        }
    }

    /// Queue a coinbase transaction crediting `target`.
    pub fn push_coinbase(&self, target: &str, amount: u64) -> Transaction {
        let tx = self.inner.chain.lock().push_coinbase(target, amount).clone();
        debug!("LEDGER - queued coinbase {} ({target}: {amount})", tx.id);
        self.synchronize(SyncMode::PushFirst);
        tx
    }

    pub fn last_block(&self) -> Block {
        self.inner.chain.lock().last_block().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.chain.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.chain.lock().len()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.inner.chain.lock().blocks().to_vec()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.inner.chain.lock().pending().to_vec()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.chain.lock().snapshot()
    }

    pub fn verify(&self) -> bool {
        self.inner.chain.lock().verify()
    }

    /// Mine every pending transaction into a new block. Blocks the caller
    /// for the whole nonce search.
    pub fn process_pending(&self) -> Result<Duration> {
        self.process_pending_until(&AtomicBool::new(false))
    }

    /// Like [`Ledger::process_pending`], but the search stops with
    /// `MiningCancelled` once `cancel` is raised. On any failure the chain
    /// and the pending pool are left as they were.
    ///
    /// Only one round runs at a time per ledger. A second caller waits and
    /// then mines whatever is still pending.
    pub fn process_pending_until(&self, cancel: &AtomicBool) -> Result<Duration> {
        let _round = self.inner.mining.lock();
        let (mut block, sealed, difficulty) = {
            let chain = self.inner.chain.lock();
            match chain.seal_pending() {
                Some((block, sealed)) => (block, sealed, chain.difficulty()),
                None => return Ok(Duration::ZERO),
            }
        };

        // the lock is not held during the nonce search
        let elapsed = block.mine_until(difficulty, cancel)?;
        let (hash, nonce) = (block.hash.clone(), block.nonce);

        let height = {
            let mut chain = self.inner.chain.lock();
            chain.commit(block, sealed)?;
            chain.len() - 1
        };
        info!(
            "MINER - sealed block #{height} with {sealed} txs (hash={hash}, nonce={nonce}, {} ms)",
            elapsed.as_millis()
        );

        self.synchronize(SyncMode::PushFirst);
        Ok(elapsed)
    }

    pub fn peers(&self) -> Vec<Node> {
        self.inner.peers.read().clone()
    }

    /// Receive the outcome of every background peer exchange.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::Ledger;
    use crate::error::ChainError;
    use crate::network::{Node, ReplicaTransport, TransportError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    /// Transport for ledgers that never talk to anyone.
    pub(crate) struct Offline;

    #[async_trait]
    impl ReplicaTransport for Offline {
        async fn get_chain(&self, _node: &Node) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Request("offline".into()))
        }

        async fn put_chain(&self, _node: &Node, _body: Vec<u8>) -> Result<(), TransportError> {
            Err(TransportError::Request("offline".into()))
        }
    }

    pub(crate) fn offline_ledger(difficulty: u32) -> Ledger {
        Ledger::open(difficulty, Arc::new(Offline)).unwrap()
    }

    #[test]
    fn difficulty_can_rise_but_not_fall() {
        for (d1, d2) in [(0u32, 0u32), (1, 4), (3, 3), (2, 9)] {
            let ledger = offline_ledger(d1);
            ledger.push_coinbase("alice", 1);
            ledger.process_pending().unwrap();
            ledger.set_difficulty(d2).unwrap();
            ledger.push_coinbase("alice", 1);
            ledger.process_pending().unwrap();
            if d2 > 0 {
                assert!(matches!(
                    ledger.set_difficulty(d2 - 1),
                    Err(ChainError::DifficultyDecreased { .. })
                ));
            }
            assert_eq!(u32::from(ledger.difficulty()), d2);
        }
    }

    #[test]
    fn fresh_ledger_verifies() {
        let ledger = offline_ledger(0);
        assert!(ledger.is_empty());
        assert!(ledger.verify());
        assert!(ledger.last_block().is_genesis());
    }

    #[test]
    fn processing_keeps_chain_valid_and_nonce_tampering_breaks_it() {
        let ledger = offline_ledger(6);
        ledger.push_coinbase("alice", 10);
        ledger.push_coinbase("bob", 10);
        ledger.process_pending().unwrap();
        assert!(ledger.verify());
        assert!(!ledger.is_empty());

        let mut snapshot = ledger.snapshot();
        snapshot.blocks[1].nonce = snapshot.blocks[1].nonce.wrapping_add(1);
        assert!(Ledger::restore(snapshot, Arc::new(Offline)).is_err());
    }

    #[test]
    fn empty_pending_is_a_noop() {
        let ledger = offline_ledger(0);
        assert_eq!(ledger.process_pending().unwrap().as_nanos(), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn cancelled_mining_preserves_pending() {
        let ledger = offline_ledger(255);
        ledger.push_coinbase("alice", 10);
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            ledger.process_pending_until(&cancel),
            Err(ChainError::MiningCancelled)
        ));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn concurrent_mining_rounds_do_not_collide() {
        let ledger = offline_ledger(10);
        ledger.push_coinbase("alice", 10);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.process_pending())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(ledger.len(), 2);
        assert!(ledger.pending().is_empty());
        assert!(ledger.verify());
    }

    #[test]
    fn restores_own_snapshot_after_difficulty_raise() {
        let ledger = offline_ledger(0);
        ledger.push_coinbase("alice", 10);
        ledger.process_pending().unwrap();
        ledger.set_difficulty(4).unwrap();

        let restored = Ledger::restore(ledger.snapshot(), Arc::new(Offline)).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.difficulty(), 4);
        assert_eq!(restored.balance_of("alice"), 10);
    }

    #[test]
    fn balances_follow_transfers() {
        let ledger = offline_ledger(0);
        ledger.push_coinbase("A", 100);
        ledger.push_coinbase("B", 100);
        ledger.process_pending().unwrap();

        // B pays A
        assert!(ledger.push_transaction("A", "B", 50));
        assert_eq!(ledger.balance_of("A"), 150);
        assert_eq!(ledger.balance_of("B"), 50);
        ledger.process_pending().unwrap();
        assert_eq!(ledger.balance_of("A"), 150);
        assert_eq!(ledger.balance_of("B"), 50);

        let pending = ledger.pending().len();
        assert!(!ledger.push_transaction("A", "B", 51));
        assert_eq!(ledger.pending().len(), pending);
    }

    #[test]
    fn demo_scenario() {
        let ledger = offline_ledger(0);
        ledger.push_coinbase("Nickolay", 100);
        ledger.push_coinbase("Anna", 100);
        ledger.process_pending().unwrap();

        assert!(ledger.push_transaction("Nickolay", "Anna", 50));
        ledger.process_pending().unwrap();

        assert!(ledger.push_transaction("Anna", "Nickolay", 10));
        assert!(!ledger.push_transaction("Anna", "Nickolay", 200));

        assert_eq!(ledger.blocks().len(), 3);
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.balance_of("Nickolay"), 140);
        assert_eq!(ledger.balance_of("Anna"), 60);
        assert!(ledger.verify());
    }

    #[test]
    fn concurrent_transfers_never_overdraw() {
        let ledger = offline_ledger(0);
        ledger.push_coinbase("alice", 100);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| ledger.push_transaction(&format!("bob{i}"), "alice", 3))
                        .count()
                })
            })
            .collect();
        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(accepted, 33);
        assert_eq!(ledger.balance_of("alice"), 1);
    }
}
