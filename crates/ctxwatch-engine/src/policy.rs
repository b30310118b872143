use chrono::{DateTime, Utc};
use ctxwatch_store::{GenerationLedger, SessionState};
use ctxwatch_types::DirectoryCandidate;
use tracing::debug;

/// Filter aggregator candidates against notification history, then stamp
/// the survivors so an immediate re-check suppresses them.
///
/// Two independent gates: a directory is surfaced at most once per session
/// (`suggested_directories`), and at most once per cooldown window per
/// project (`generated_at`, which persists across sessions and restarts).
pub fn apply_notification_policy(
    candidates: Vec<DirectoryCandidate>,
    state: &mut SessionState,
    ledger: &mut GenerationLedger,
    now: DateTime<Utc>,
    cooldown_minutes: i64,
) -> Vec<DirectoryCandidate> {
    let mut kept = Vec::new();

    for candidate in candidates {
        if state.already_suggested(&candidate.path) {
            debug!(dir = %candidate.path, "dropped: already suggested this session");
            continue;
        }
        if ledger.within_cooldown(&candidate.path, now, cooldown_minutes) {
            debug!(dir = %candidate.path, "dropped: within cooldown window");
            continue;
        }

        state.mark_suggested(&candidate.path);
        ledger.record(&candidate.path, now);
        kept.push(candidate);
    }

    kept
}
