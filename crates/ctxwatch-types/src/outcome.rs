use serde::Serialize;

/// One directory worth notifying about, with the counts behind the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryCandidate {
    pub path: String,
    /// Files changed directly in this directory
    pub direct_count: usize,
    /// Files absorbed from below-threshold child directories
    pub from_children_count: usize,
    /// Number of child directories that were absorbed
    pub child_count: usize,
}

impl DirectoryCandidate {
    pub fn total_count(&self) -> usize {
        self.direct_count + self.from_children_count
    }
}

/// Result of one session-end check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckOutcome {
    /// Nothing to surface; state was still advanced and persisted
    NoAction,
    /// Session judged complete with directories worth acting on
    Notify {
        candidates: Vec<DirectoryCandidate>,
        completion_reason: String,
    },
}

impl CheckOutcome {
    pub fn is_no_action(&self) -> bool {
        matches!(self, CheckOutcome::NoAction)
    }
}
