//! The single-slot artifact hand-off channel.
//!
//! One mailbox belongs to one session. It holds at most one unconsumed
//! `Artifact`: publishing overwrites, draining empties. The orchestrator
//! clears it before every tool call and drains it after, so a chart from an
//! earlier turn can never surface in a later one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use biznavi_contracts::artifact::Artifact;

#[derive(Debug, Default)]
pub struct ArtifactMailbox {
    slot: Mutex<Option<Artifact>>,
}

impl ArtifactMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the slot, discarding whatever was there.
    pub fn clear(&self) {
        if let Some(stale) = self.lock().take() {
            debug!(artifact_id = %stale.id.0, "cleared unconsumed artifact");
        }
    }

    /// Store `artifact`, replacing any unconsumed one.
    pub fn publish(&self, artifact: Artifact) {
        let mut slot = self.lock();
        if let Some(previous) = slot.replace(artifact) {
            debug!(artifact_id = %previous.id.0, "unconsumed artifact overwritten");
        }
    }

    /// Take the artifact out, leaving the slot empty.
    pub fn drain(&self) -> Option<Artifact> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    // A panic while holding the lock cannot leave the Option half-written,
    // so a poisoned slot is still consistent.
    fn lock(&self) -> MutexGuard<'_, Option<Artifact>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
