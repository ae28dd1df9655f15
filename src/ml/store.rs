//! Opportunistic cache of trained networks, keyed by descriptor name
//!
//! Lookup goes memory, then snapshot file, then caller-supplied fresh init.
//! Snapshot I/O is best effort: failures are logged and never surface.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::network::DenseNetwork;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

/// Where a network handed out by the store came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHit {
    Memory,
    Snapshot,
    Fresh,
}

#[derive(Debug, Default)]
pub struct ModelStore {
    models: RwLock<HashMap<String, DenseNetwork>>,
    snapshot_dir: Option<PathBuf>,
}

impl ModelStore {
    /// In-memory store without snapshots
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store that also persists snapshots under `dir`
    pub fn with_snapshots(dir: impl Into<PathBuf>) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            snapshot_dir: Some(dir.into()),
        }
    }

    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.snapshot_dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Cached network for `name`, if one is held in memory
    pub fn get(&self, name: &str) -> Option<DenseNetwork> {
        self.models.read().get(name).cloned()
    }

    /// Network for `name` whose layer layout equals `layout`.
    ///
    /// Falls back to `init` when neither memory nor snapshot holds a compatible one.
    pub fn get_or_create<F>(&self, name: &str, layout: &[usize], init: F) -> (DenseNetwork, CacheHit)
    where
        F: FnOnce() -> DenseNetwork,
    {
        if let Some(net) = self.get(name).filter(|n| n.layout() == layout) {
            debug!(model = name, "model cache hit");
            return (net, CacheHit::Memory);
        }

        match self.load_snapshot(name) {
            Ok(Some(net)) if net.layout() == layout => {
                info!(model = name, "loaded model snapshot");
                self.models.write().insert(name.to_string(), net.clone());
                return (net, CacheHit::Snapshot);
            }
            Ok(Some(_)) => {
                warn!(model = name, "ignoring snapshot with mismatched layout");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(model = name, error = %e, "failed to load model snapshot");
            }
        }

        debug!(model = name, "creating new model");
        (init(), CacheHit::Fresh)
    }

    /// Cache `net` under `name` and write its snapshot when enabled
    pub fn put(&self, name: &str, net: DenseNetwork) {
        if let Err(e) = self.save_snapshot(name, &net) {
            warn!(model = name, error = %e, "failed to save model snapshot");
        }
        self.models.write().insert(name.to_string(), net);
    }

    fn snapshot_path(&self, name: &str) -> Option<PathBuf> {
        self.snapshot_dir.as_ref().map(|d| d.join(format!("{name}.bin")))
    }

    fn load_snapshot(&self, name: &str) -> Result<Option<DenseNetwork>, StoreError> {
        let Some(path) = self.snapshot_path(name) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(bincode::deserialize(&bytes)?))
    }

    fn save_snapshot(&self, name: &str, net: &DenseNetwork) -> Result<(), StoreError> {
        let Some(path) = self.snapshot_path(name) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bincode::serialize(net)?)?;
        Ok(())
    }
}
