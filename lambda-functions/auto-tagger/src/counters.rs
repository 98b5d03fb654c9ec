use serde::{Deserialize, Serialize};

/// Outcome of one tag attempt against one resource.
///
/// Every discovered resource produces exactly one outcome, so `total` is
/// incremented exactly once per resource regardless of what happened to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tag write succeeded (or was already present; last-write-wins).
    Tagged,
    /// Dry-run mode: the resource was discovered but no write was issued.
    WouldTag,
    /// The list, describe, or tag-write call failed for this resource.
    Failed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total: u64,
    pub tagged: u64,
    pub failed: u64,
}

impl RunCounters {
    pub fn record(&mut self, outcome: TagOutcome) {
        self.total += 1;
        match outcome {
            TagOutcome::Tagged => self.tagged += 1,
            TagOutcome::Failed => self.failed += 1,
            TagOutcome::WouldTag => {}
        }
    }

    /// Counters reported for a region whose pass could not start at all.
    pub fn failed_region() -> Self {
        Self {
            total: 0,
            tagged: 0,
            failed: 1,
        }
    }

    pub fn absorb(&mut self, other: RunCounters) {
        self.total += other.total;
        self.tagged += other.tagged;
        self.failed += other.failed;
    }
}
