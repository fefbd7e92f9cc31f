//! Snapshot file persistence for the node binary.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use log::{debug, info};

use crate::blockchain::Snapshot;
use crate::error::Result;

/// Read a snapshot from `path`. A missing file is not an error.
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        debug!("STORAGE - no snapshot at {}", path.display());
        return Ok(None);
    }
    let snapshot = Snapshot::read_from(BufReader::new(File::open(path)?))?;
    info!(
        "STORAGE - loaded {} blocks and {} pending txs from {}",
        snapshot.blocks.len(),
        snapshot.pending.len(),
        path.display()
    );
    Ok(Some(snapshot))
}

/// Write `snapshot` next to `path` and move it into place.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        snapshot.write_to(&mut file)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    info!(
        "STORAGE - saved {} blocks to {}",
        snapshot.blocks.len(),
        path.display()
    );
    Ok(())
}
