//! Per-invocation sync outcome.

use serde::{Deserialize, Serialize};

/// Default cap on the number of failures carried in a summary.
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 10;

/// One contact that could not be upserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub email: String,
    pub error: String,
}

/// Counts for a single sync run.
///
/// `failed` counts every failure; `errors` holds at most the cap passed to
/// [`SyncSummary::record_failure`] so the response payload stays bounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub fetched: usize,
    pub upserted: usize,
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
}

impl SyncSummary {
    /// Starts a summary for `fetched` source records.
    #[must_use]
    pub fn new(fetched: usize) -> Self {
        Self {
            fetched,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self) {
        self.upserted += 1;
    }

    /// Counts a failure, keeping its details only while under `cap`.
    pub fn record_failure(
        &mut self,
        email: impl Into<String>,
        error: impl Into<String>,
        cap: usize,
    ) {
        self.failed += 1;
        if self.errors.len() < cap {
            self.errors.push(SyncFailure {
                email: email.into(),
                error: error.into(),
            });
        }
    }

    /// Source records that never reached the target (no resolvable email).
    pub fn dropped(&self) -> usize {
        self.fetched.saturating_sub(self.upserted + self.failed)
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
