//! The in-process runner registry (§5): `orchestrationId -> generation`,
//! guarded by a short mutex. Supersession is "newer generation wins" — an
//! older runner discovers it's been superseded at the top of its next loop
//! iteration and exits without cleanup (the newer runner owns the marker).

use loom_core::OrchestrationId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunnerRegistry {
    generations: Arc<Mutex<HashMap<OrchestrationId, u64>>>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new runner for `id`, superseding whatever generation was
    /// previously registered, and returns the generation this runner owns.
    pub fn start(&self, id: OrchestrationId) -> u64 {
        let mut generations = self.generations.lock();
        let next = generations.get(&id).copied().unwrap_or(0) + 1;
        generations.insert(id, next);
        next
    }

    /// Whether `generation` is still the active one for `id` — `false`
    /// means either a newer runner took over or `stop` removed the entry.
    pub fn is_current(&self, id: &OrchestrationId, generation: u64) -> bool {
        self.generations.lock().get(id).copied() == Some(generation)
    }

    /// Removes the registry entry entirely; the owning runner observes the
    /// absence on its next iteration and exits (§5 cancellation semantics).
    pub fn stop(&self, id: &OrchestrationId) {
        self.generations.lock().remove(id);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
