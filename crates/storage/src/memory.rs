//! In-memory engine

use tessera_core::error::Result;
use tracing::debug;

use crate::state::Snapshot;
use crate::traits::{Engine, Transaction};
use crate::transaction::StoreCore;

/// Engine whose data lives only as long as the value
///
/// # Example
///
/// ```
/// use tessera_storage::{Engine, MemoryEngine};
///
/// let engine = MemoryEngine::new();
/// let mut txn = engine.begin(true).unwrap();
/// txn.create_bucket("users").unwrap();
/// txn.put("users", b"k", b"v").unwrap();
/// txn.commit().unwrap();
///
/// let txn = engine.begin(false).unwrap();
/// assert_eq!(txn.get("users", b"k").unwrap(), Some(b"v".to_vec()));
/// ```
pub struct MemoryEngine {
    core: StoreCore,
}

impl MemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        debug!(target: "tessera::storage", "Opened memory engine");
        Self {
            core: StoreCore::new(Snapshot::new(), None, 1),
        }
    }

    /// Shared state, for inspection
    pub fn core(&self) -> &StoreCore {
        &self.core
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MemoryEngine {
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(self.core.begin(writable)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
