use crate::aggregate::aggregate;
use crate::judge::judge;
use crate::policy::apply_notification_policy;
use chrono::{DateTime, Utc};
use ctxwatch_scan::{LogSlice, read_from, scan_slice};
use ctxwatch_store::StateStore;
use ctxwatch_types::{CheckOutcome, Settings};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Everything one session-end check needs. The clock is injected; the
/// engine never reads it directly.
pub struct CheckRequest<'a> {
    pub log_path: &'a Path,
    pub project_root: &'a Path,
    pub settings: &'a Settings,
    pub now: DateTime<Utc>,
}

/// Run one session-end check: scan new log lines, judge completion,
/// aggregate changed directories, filter against notification history, and
/// persist the advanced state.
///
/// This is the degrade boundary: every internal failure mode resolves to
/// `NoAction` here, and the state write-back happens on every path so a
/// no-op run still advances the cursors.
pub fn run_check(req: &CheckRequest<'_>) -> CheckOutcome {
    if !req.settings.auto_generate {
        return CheckOutcome::NoAction;
    }

    let store = StateStore::open(req.project_root);
    let key = ctxwatch_core::log_identity_hash(req.log_path);
    let mut state = store.load_session(&key);
    let mut ledger = store.load_ledger();
    let mut cache = state.completion_cache.clone();

    // One physical pass serves both cursors; start at whichever is behind
    let scan_start = cache.last_scanned_line.min(state.last_processed_line);
    let slice = read_from(req.log_path, scan_start).unwrap_or_else(|err| {
        debug!(log = %req.log_path.display(), %err, "log unreadable, treating as no new data");
        LogSlice::empty(scan_start)
    });

    let changes = scan_slice(
        &slice.lines,
        slice.start_line,
        &mut cache,
        state.last_processed_line,
    );
    let total_lines = slice.next_cursor;
    state.completion_cache = cache.clone();

    let verdict = judge(&cache, total_lines, &req.settings.judge);
    let outcome = if verdict.is_complete {
        // Extraction is consumed now, so this cursor only advances here;
        // an incomplete session keeps its changes for the next check.
        state.last_processed_line = state.last_processed_line.max(total_lines);

        let root = req.project_root.to_string_lossy();
        let mut seen: HashSet<String> = HashSet::new();
        let mut rel_paths: Vec<String> = Vec::new();
        for change in &changes {
            if let Some(rel) = ctxwatch_core::relativize(&change.path, &root)
                && seen.insert(rel.clone())
            {
                rel_paths.push(rel);
            }
        }
        if rel_paths.len() > req.settings.max_files_analyzed {
            debug!(
                dropped = rel_paths.len() - req.settings.max_files_analyzed,
                "change list capped at maxFilesAnalyzed"
            );
            rel_paths.truncate(req.settings.max_files_analyzed);
        }

        let aggregation = aggregate(
            &rel_paths,
            &req.settings.effective_exclusions(),
            req.settings.threshold,
        );
        let kept = apply_notification_policy(
            aggregation.candidates,
            &mut state,
            &mut ledger,
            req.now,
            req.settings.cooldown_minutes,
        );

        if kept.is_empty() {
            CheckOutcome::NoAction
        } else {
            CheckOutcome::Notify {
                candidates: kept,
                completion_reason: verdict.reason,
            }
        }
    } else {
        debug!(reason = %verdict.reason, "session not complete");
        CheckOutcome::NoAction
    };

    state.last_run_time = Some(req.now);
    if let Err(err) = store.save(&key, &state, &ledger) {
        // State loss costs at most one redundant rescan; never surface it
        warn!(%err, "failed to persist session state");
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxwatch_store::SessionState;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_line(path: &str) -> String {
        format!(
            r#"{{"message":{{"content":[{{"type":"tool_use","name":"Write","input":{{"file_path":"{}"}}}}]}}}}"#,
            path
        )
    }

    fn text_line(text: &str) -> String {
        format!(
            r#"{{"message":{{"content":[{{"type":"text","text":"{}"}}]}}}}"#,
            text
        )
    }

    fn quiet_lines(n: usize) -> Vec<String> {
        (0..n).map(|i| text_line(&format!("waiting {}", i))).collect()
    }

    fn write_transcript(dir: &TempDir, name: &str, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn completed_session_lines() -> Vec<String> {
        let mut lines = vec![
            write_line("src/api/a.ts"),
            write_line("src/api/b.ts"),
            text_line("Committed the changes and pushed to main"),
        ];
        lines.extend(quiet_lines(4));
        lines
    }

    fn request<'a>(
        log_path: &'a Path,
        project_root: &'a Path,
        settings: &'a Settings,
    ) -> CheckRequest<'a> {
        CheckRequest {
            log_path,
            project_root,
            settings,
            now: Utc::now(),
        }
    }

    fn load_state(project_root: &Path, log_path: &Path) -> SessionState {
        StateStore::open(project_root).load_session(&ctxwatch_core::log_identity_hash(log_path))
    }

    #[test]
    fn test_completed_session_notifies_and_persists() {
        let dir = TempDir::new().unwrap();
        let log = write_transcript(&dir, "session.jsonl", &completed_session_lines());
        let settings = Settings::default();

        let outcome = run_check(&request(&log, dir.path(), &settings));
        match outcome {
            CheckOutcome::Notify {
                candidates,
                completion_reason,
            } => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].path, "src/api");
                assert_eq!(candidates[0].direct_count, 2);
                assert_eq!(completion_reason, "commit/push with no recent edits");
            }
            CheckOutcome::NoAction => panic!("expected a notification"),
        }

        let state = load_state(dir.path(), &log);
        assert_eq!(state.last_processed_line, 7);
        assert_eq!(state.completion_cache.last_scanned_line, 7);
        assert!(state.completion_cache.has_commit);
        assert!(state.already_suggested("src/api"));
    }

    #[test]
    fn test_second_check_with_no_new_lines_is_noop() {
        let dir = TempDir::new().unwrap();
        let log = write_transcript(&dir, "session.jsonl", &completed_session_lines());
        let settings = Settings::default();

        let first = run_check(&request(&log, dir.path(), &settings));
        assert!(!first.is_no_action());
        let state_after_first = load_state(dir.path(), &log);

        let second = run_check(&request(&log, dir.path(), &settings));
        assert!(second.is_no_action());

        // Identical except for the refreshed run timestamp
        let mut state_after_second = load_state(dir.path(), &log);
        state_after_second.last_run_time = state_after_first.last_run_time;
        assert_eq!(state_after_second, state_after_first);
    }

    #[test]
    fn test_incomplete_session_keeps_changes_for_later() {
        let dir = TempDir::new().unwrap();
        let lines = vec![write_line("src/api/a.ts"), write_line("src/api/b.ts")];
        let log = write_transcript(&dir, "session.jsonl", &lines);
        let settings = Settings::default();

        let outcome = run_check(&request(&log, dir.path(), &settings));
        assert!(outcome.is_no_action());

        // Signals were consumed, extraction was not
        let state = load_state(dir.path(), &log);
        assert_eq!(state.completion_cache.last_scanned_line, 2);
        assert_eq!(state.last_processed_line, 0);

        // The session later goes quiet long enough for the fallback rule
        let mut extended = lines.clone();
        extended.extend(quiet_lines(16));
        let log = write_transcript(&dir, "session.jsonl", &extended);

        match run_check(&request(&log, dir.path(), &settings)) {
            CheckOutcome::Notify {
                candidates,
                completion_reason,
            } => {
                assert_eq!(candidates[0].path, "src/api");
                assert_eq!(candidates[0].direct_count, 2);
                assert_eq!(completion_reason, "long gap since last edit");
            }
            CheckOutcome::NoAction => panic!("expected a notification"),
        }
    }

    #[test]
    fn test_cooldown_suppresses_across_sessions() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();

        let log_a = write_transcript(&dir, "a.jsonl", &completed_session_lines());
        assert!(!run_check(&request(&log_a, dir.path(), &settings)).is_no_action());

        // A different session in the same project touches the same directory
        // minutes later; the project ledger gates it.
        let log_b = write_transcript(&dir, "b.jsonl", &completed_session_lines());
        assert!(run_check(&request(&log_b, dir.path(), &settings)).is_no_action());
    }

    #[test]
    fn test_auto_generate_off_disables_everything() {
        let dir = TempDir::new().unwrap();
        let log = write_transcript(&dir, "session.jsonl", &completed_session_lines());
        let mut settings = Settings::default();
        settings.auto_generate = false;

        assert!(run_check(&request(&log, dir.path(), &settings)).is_no_action());
    }

    #[test]
    fn test_unreadable_log_degrades_to_noop() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.jsonl");
        let settings = Settings::default();

        assert!(run_check(&request(&missing, dir.path(), &settings)).is_no_action());
    }

    #[test]
    fn test_malformed_lines_do_not_stop_the_check() {
        let dir = TempDir::new().unwrap();
        let mut lines = vec![
            write_line("src/api/a.ts"),
            "{\"broken\": ".to_string(),
            write_line("src/api/b.ts"),
            text_line("Committed the changes"),
        ];
        lines.extend(quiet_lines(4));
        let log = write_transcript(&dir, "session.jsonl", &lines);
        let settings = Settings::default();

        match run_check(&request(&log, dir.path(), &settings)) {
            CheckOutcome::Notify { candidates, .. } => {
                assert_eq!(candidates[0].path, "src/api");
                assert_eq!(candidates[0].direct_count, 2);
            }
            CheckOutcome::NoAction => panic!("expected a notification"),
        }

        let state = load_state(dir.path(), &log);
        assert_eq!(state.last_processed_line, 8);
    }

    #[test]
    fn test_max_files_analyzed_caps_the_change_list() {
        let dir = TempDir::new().unwrap();
        let log = write_transcript(&dir, "session.jsonl", &completed_session_lines());
        let mut settings = Settings::default();
        settings.max_files_analyzed = 1;

        // Only one of the two files survives the cap, so src/api never
        // reaches the threshold
        assert!(run_check(&request(&log, dir.path(), &settings)).is_no_action());
    }

    #[test]
    fn test_out_of_project_paths_are_dropped() {
        let dir = TempDir::new().unwrap();
        let mut lines = vec![
            write_line("/etc/hosts"),
            write_line("/somewhere/else/a.ts"),
            text_line("Committed the changes"),
        ];
        lines.extend(quiet_lines(4));
        let log = write_transcript(&dir, "session.jsonl", &lines);
        let settings = Settings::default();

        assert!(run_check(&request(&log, dir.path(), &settings)).is_no_action());
    }
}
