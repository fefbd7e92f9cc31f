use std::io::{Read, Seek, SeekFrom, Write};

use serde::{Deserialize, Serialize};

use super::Block;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;

/// Full ledger state exchanged between peers and written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub difficulty: u8,
    pub blocks: Vec<Block>,
    pub pending: Vec<Transaction>,
}

impl Snapshot {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Write this snapshot at the start of `stream`. Bytes past the end of
    /// the document are left in place; [`Snapshot::read_from`] skips them.
    pub fn write_to<W: Write + Seek>(&self, stream: &mut W) -> Result<()> {
        stream.seek(SeekFrom::Start(0))?;
        serde_json::to_writer_pretty(&mut *stream, self)?;
        stream.flush()?;
        Ok(())
    }

    /// Read the first snapshot document in `stream`.
    pub fn read_from<R: Read>(stream: R) -> Result<Self> {
        match serde_json::Deserializer::from_reader(stream)
            .into_iter::<Self>()
            .next()
        {
            Some(snapshot) => Ok(snapshot?),
            None => Err(ChainError::Decode("empty snapshot stream".into())),
        }
    }
}
