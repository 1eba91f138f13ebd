pub mod snapshot;

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

pub use snapshot::Snapshot;

/// Process-wide holder of the latest published snapshot.
///
/// Snapshots are immutable and swapped as a whole behind an `Arc`; the lock
/// is held only long enough to clone or replace the pointer, never across I/O.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Create a store serving the empty snapshot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// The last successfully published snapshot
    pub fn get(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the current snapshot. Returns false (and keeps the current one)
    /// if `snapshot` is not newer than what is already published.
    pub fn publish(&self, snapshot: Snapshot) -> bool {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());

        if next.sequence <= guard.sequence {
            warn!(
                "Refusing stale snapshot #{} (current #{})",
                next.sequence, guard.sequence
            );
            return false;
        }

        debug!("Publishing snapshot #{} ({} records)", next.sequence, next.len());
        *guard = next;
        true
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
