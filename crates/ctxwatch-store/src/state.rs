use chrono::{DateTime, Utc};
use ctxwatch_scan::CompletionCache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-(project, log) scan state. Missing fields deserialize to defaults so
/// files written by earlier layouts keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub last_processed_line: usize,
    /// Directories surfaced this session, in first-suggestion order
    pub suggested_directories: Vec<String>,
    pub completion_cache: CompletionCache,
    pub last_run_time: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn already_suggested(&self, dir: &str) -> bool {
        self.suggested_directories.iter().any(|d| d == dir)
    }

    pub fn mark_suggested(&mut self, dir: &str) {
        if !self.already_suggested(dir) {
            self.suggested_directories.push(dir.to_string());
        }
    }
}

/// Per-project record of when each directory last had a generation event.
///
/// Keyed on the recorded event time, not the artifact's mtime: a user
/// hand-editing a generated file must not reset the cooldown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationLedger {
    pub generated_at: BTreeMap<String, DateTime<Utc>>,
}

impl GenerationLedger {
    pub fn within_cooldown(&self, dir: &str, now: DateTime<Utc>, cooldown_minutes: i64) -> bool {
        match self.generated_at.get(dir) {
            Some(stamped) => {
                let elapsed = now.signed_duration_since(*stamped);
                elapsed.num_minutes() < cooldown_minutes
            }
            None => false,
        }
    }

    pub fn record(&mut self, dir: &str, now: DateTime<Utc>) {
        self.generated_at.insert(dir.to_string(), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_state_defaults_from_empty_json() {
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, SessionState::default());
        assert_eq!(state.completion_cache.last_edit_index, -1);
    }

    #[test]
    fn test_legacy_state_without_cache_gets_default_cache() {
        let json = r#"{"last_processed_line": 120, "suggested_directories": ["src/api"]}"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.last_processed_line, 120);
        assert!(state.already_suggested("src/api"));
        assert_eq!(state.completion_cache, CompletionCache::default());
    }

    #[test]
    fn test_mark_suggested_preserves_order_without_duplicates() {
        let mut state = SessionState::default();
        state.mark_suggested("src/b");
        state.mark_suggested("src/a");
        state.mark_suggested("src/b");
        assert_eq!(state.suggested_directories, vec!["src/b", "src/a"]);
    }

    #[test]
    fn test_cooldown_window() {
        let now = Utc::now();
        let mut ledger = GenerationLedger::default();
        ledger.record("src/api", now - Duration::minutes(10));

        assert!(ledger.within_cooldown("src/api", now, 30));
        assert!(!ledger.within_cooldown("src/api", now, 10));
        assert!(!ledger.within_cooldown("src/other", now, 30));
    }
}
