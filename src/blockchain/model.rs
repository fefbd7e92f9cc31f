use log::debug;

use super::{Block, Snapshot};
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;

/// In-memory chain with its pending pool and current proof-of-work target.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: u8,
}

impl Blockchain {
    /// Initialize a new blockchain holding only the genesis block.
    pub fn new(difficulty: u32) -> Result<Self> {
        let mut bc = Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty: 0,
        };
        bc.set_difficulty(difficulty)?;
        Ok(bc)
    }

    /// Rebuild a chain from a peer or saved snapshot. The blocks must pass
    /// [`Blockchain::verify_integrity`]. Blocks mined before a difficulty
    /// raise are still accepted.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let bc = Self {
            chain: snapshot.blocks,
            pending: snapshot.pending,
            difficulty: snapshot.difficulty,
        };
        if bc.chain.is_empty() {
            return Err(ChainError::InvalidSnapshot("no blocks".into()));
        }
        if !bc.verify_integrity() {
            return Err(ChainError::InvalidSnapshot("chain does not verify".into()));
        }
        Ok(bc)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            difficulty: self.difficulty,
            blocks: self.chain.clone(),
            pending: self.pending.clone(),
        }
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Change the target for future blocks. It can never go below the
    /// difficulty of the last block.
    pub fn set_difficulty(&mut self, difficulty: u32) -> Result<()> {
        let current = self.last_block().difficulty;
        if difficulty < u32::from(current) {
            return Err(ChainError::DifficultyDecreased {
                requested: difficulty,
                current,
            });
        }
        self.difficulty =
            u8::try_from(difficulty).map_err(|_| ChainError::DifficultyOutOfRange(difficulty))?;
        Ok(())
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        // `chain` always holds at least the genesis block
        &self.chain[self.chain.len() - 1]
    }

    /// True when only the genesis block exists.
    pub fn is_empty(&self) -> bool {
        self.chain.len() == 1
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Net amount held by `account` over committed blocks then the pending pool.
    pub fn balance_of(&self, account: &str) -> i128 {
        self.chain
            .iter()
            .skip(1)
            .flat_map(|b| b.transactions.iter())
            .chain(self.pending.iter())
            .fold(0i128, |balance, tx| {
                if tx.target == account {
                    balance + i128::from(tx.amount)
                } else if tx.source == account {
                    balance - i128::from(tx.amount)
                } else {
                    balance
                }
            })
    }

    /// Queue a transfer from `source` to `target` if `source` can cover it.
    /// Returns the queued transaction, or `None` on insufficient balance.
    pub fn push_transaction(
        &mut self,
        target: &str,
        source: &str,
        amount: u64,
    ) -> Option<&Transaction> {
        let balance = self.balance_of(source);
        if balance < i128::from(amount) {
            debug!("rejected transfer {source} -> {target} of {amount}: balance is {balance}");
            return None;
        }
        self.pending.push(Transaction::new(target, source, amount));
        self.pending.last()
    }

    /// Queue value created from nothing. Always accepted.
    pub fn push_coinbase(&mut self, target: &str, amount: u64) -> &Transaction {
        self.pending.push(Transaction::coinbase(target, amount));
        &self.pending[self.pending.len() - 1]
    }

    /// Build an unmined block from the whole pending pool, linked after the
    /// current tail. Also returns how many pending entries it holds.
    pub fn seal_pending(&self) -> Option<(Block, usize)> {
        if self.pending.is_empty() {
            return None;
        }
        let mut block = Block::seal(&self.pending);
        block.link_after(self.last_block());
        Some((block, self.pending.len()))
    }

    /// Append a mined block and drop the `sealed` pending entries it holds.
    /// Fails if the tail is no longer the block it was linked after.
    pub fn commit(&mut self, block: Block, sealed: usize) -> Result<()> {
        if block.prev_hash != self.last_block().hash {
            return Err(ChainError::ChainReplaced);
        }
        self.chain.push(block);
        let sealed = sealed.min(self.pending.len());
        self.pending.drain(..sealed);
        Ok(())
    }

    /// Validate the entire chain: genesis, linkage, difficulty, hashes and PoW.
    /// Every mined block must also meet the current difficulty.
    pub fn verify(&self) -> bool {
        self.verify_integrity()
            && self
                .chain
                .iter()
                .skip(1)
                .all(|block| block.difficulty >= self.difficulty)
    }

    /// Genesis, linkage, non-decreasing block difficulty, hashes and PoW.
    /// Unlike [`Blockchain::verify`] it ignores the current difficulty.
    pub fn verify_integrity(&self) -> bool {
        if !self.chain.first().is_some_and(Block::is_genesis) {
            return false;
        }

        self.chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            current.prev_hash == prev.hash
                && current.difficulty >= prev.difficulty
                && current.verify_proof_of_work()
                && current.verify_hash()
        })
    }
}
