//! In-memory guardian set that can be swapped at runtime.

use parking_lot::RwLock;
use shared_types::GuardianSet;
use tracing::info;

use crate::ports::GuardianSetProvider;

/// Guardian set held in memory.
#[derive(Debug, Default)]
pub struct StaticGuardianSet {
    set: RwLock<GuardianSet>,
}

impl StaticGuardianSet {
    /// Provider for `set`.
    pub fn new(set: GuardianSet) -> Self {
        Self {
            set: RwLock::new(set),
        }
    }

    /// Replace the current set.
    pub fn update(&self, set: GuardianSet) {
        info!(
            index = set.index,
            guardians = set.len(),
            "Guardian set updated"
        );
        *self.set.write() = set;
    }
}

impl GuardianSetProvider for StaticGuardianSet {
    fn current(&self) -> GuardianSet {
        self.set.read().clone()
    }
}
