use ctxwatch_scan::CompletionCache;
use ctxwatch_types::JudgePolicy;

/// Outcome of the completion judgement, with the winning rule spelled out
/// for the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_complete: bool,
    pub reason: String,
}

impl Verdict {
    fn complete(reason: &str) -> Self {
        Self {
            is_complete: true,
            reason: reason.to_string(),
        }
    }

    fn incomplete(reason: &str) -> Self {
        Self {
            is_complete: false,
            reason: reason.to_string(),
        }
    }
}

/// Decide whether the session is over, from the sticky signal cache and the
/// quiet period (lines since the last file mutation).
///
/// Rules are checked in priority order, first match wins. A commit is the
/// strongest signal, so it tolerates the shortest quiet period; the
/// catch-all gap covers sessions that never emit an explicit signal.
pub fn judge(cache: &CompletionCache, total_lines: usize, policy: &JudgePolicy) -> Verdict {
    if cache.last_edit_index < 0 {
        return Verdict::incomplete("no modifications this session");
    }

    let quiet = (total_lines as i64 - cache.last_edit_index).max(0) as usize;

    if cache.has_commit && quiet > policy.commit_quiet_lines {
        return Verdict::complete("commit/push with no recent edits");
    }
    if cache.has_test_success && quiet > policy.signal_quiet_lines {
        return Verdict::complete("tests passing with no recent edits");
    }
    if cache.has_build_success && quiet > policy.signal_quiet_lines {
        return Verdict::complete("build succeeded with no recent edits");
    }
    if cache.has_task_complete && quiet > policy.signal_quiet_lines {
        return Verdict::complete("task list completed with no recent edits");
    }
    if cache.has_completion_phrase && quiet > policy.signal_quiet_lines {
        return Verdict::complete("completion phrase with no recent edits");
    }
    if quiet > policy.fallback_quiet_lines {
        return Verdict::complete("long gap since last edit");
    }

    Verdict::incomplete("recent edit activity")
}
