use crate::schema::{ContentBlock, LogRecord, ToolAction, classify_tool};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("signal pattern must compile"))
        .collect()
}

// Signal batteries, ordered strongest-first within each category. Matched
// against the raw log line, which embeds tool inputs and message text
// verbatim, so no parse is needed on the fast path.

static COMMIT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)git\s+commit",
        r"(?i)git\s+push",
        r"(?i)\bcommitted\b",
        r"(?i)\bpushed\s+to\s+\w+",
        r"(?i)\bready\s+to\s+commit\b",
    ])
});

static TEST_SUCCESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\btests?\s+(pass|passed|passing)\b",
        r"(?i)\ball\s+(tests\s+)?green\b",
        r"(?i)\b\d+\s+passed\b",
        r"(?i)\btested\s+and\s+working\b",
    ])
});

static BUILD_SUCCESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bbuild\s+(succeeded|successful|passes|passed)\b",
        r"(?i)\bcompiled\s+successfully\b",
        r"(?i)\bbuild\s+(is\s+)?(complete|clean)\b",
    ])
});

static TASK_COMPLETE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#""status"\s*:\s*"completed""#,
        r"(?i)\ball\s+tasks?\s+(are\s+)?(complete|completed|done)\b",
        r"(?i)\btask\s+list\s+(is\s+)?(complete|done)\b",
    ])
});

static COMPLETION_PHRASE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(done|finished|complete|completed)\b",
        r"(?i)\blooks?\s+(good|great|fine)\b",
        r"(?i)\ball\s+set\b",
        r"(?i)that'?s\s+it\b",
        r"(?i)\banything\s+else\b",
    ])
});

static ACTIVITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#""name"\s*:\s*"Write""#,
        r#""name"\s*:\s*"Edit""#,
        r#""name"\s*:\s*"MultiEdit""#,
        r#""name"\s*:\s*"NotebookEdit""#,
    ])
});

fn battery_matches(battery: &[Regex], text: &str) -> bool {
    // First match wins for the category; later patterns are not tested
    battery.iter().any(|re| re.is_match(text))
}

/// Cumulative completion signals for one session. Persisted between checks
/// so old lines are never re-matched against the batteries.
///
/// Invariants: `last_scanned_line` never decreases; booleans only flip
/// false -> true; `last_edit_index` is -1 until the first file mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionCache {
    pub last_scanned_line: usize,
    pub has_commit: bool,
    pub has_test_success: bool,
    pub has_build_success: bool,
    pub has_task_complete: bool,
    pub has_completion_phrase: bool,
    pub last_edit_index: i64,
}

impl Default for CompletionCache {
    fn default() -> Self {
        Self {
            last_scanned_line: 0,
            has_commit: false,
            has_test_success: false,
            has_build_success: false,
            has_task_complete: false,
            has_completion_phrase: false,
            last_edit_index: -1,
        }
    }
}

impl CompletionCache {
    /// OR one raw line into the sticky signal state. Batteries whose bit is
    /// already set are skipped entirely.
    pub fn observe_line(&mut self, line: &str, index: usize) {
        if battery_matches(&ACTIVITY_PATTERNS, line) {
            self.last_edit_index = self.last_edit_index.max(index as i64);
        }
        if !self.has_commit && battery_matches(&COMMIT_PATTERNS, line) {
            self.has_commit = true;
        }
        if !self.has_test_success && battery_matches(&TEST_SUCCESS_PATTERNS, line) {
            self.has_test_success = true;
        }
        if !self.has_build_success && battery_matches(&BUILD_SUCCESS_PATTERNS, line) {
            self.has_build_success = true;
        }
        if !self.has_task_complete && battery_matches(&TASK_COMPLETE_PATTERNS, line) {
            self.has_task_complete = true;
        }
        if !self.has_completion_phrase && battery_matches(&COMPLETION_PHRASE_PATTERNS, line) {
            self.has_completion_phrase = true;
        }
    }

    /// A shell command string only carries commit intent; the other
    /// categories come from message text.
    pub fn observe_command(&mut self, command: &str) {
        if !self.has_commit && battery_matches(&COMMIT_PATTERNS, command) {
            self.has_commit = true;
        }
    }
}

/// One extracted file mutation: the raw tool-input path and the absolute
/// line index it was seen at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub line_index: usize,
}

/// Drive one pass over a slice of new log lines, feeding both consumers:
///
/// - signal accumulation for lines at/after `cache.last_scanned_line`
/// - file-change extraction for lines at/after `extract_from`
///
/// The two cursors differ when the session state predates the signal cache
/// (default-cache fallback rescans signals without re-extracting paths).
/// Returns extracted changes deduplicated by raw path, first occurrence wins.
pub fn scan_slice(
    lines: &[String],
    base_index: usize,
    cache: &mut CompletionCache,
    extract_from: usize,
) -> Vec<FileChange> {
    let mut changes = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (offset, line) in lines.iter().enumerate() {
        let index = base_index + offset;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let scan_signals = index >= cache.last_scanned_line;
        if scan_signals {
            cache.observe_line(trimmed, index);
        }

        if index >= extract_from {
            for block in LogRecord::parse(trimmed).content() {
                let ContentBlock::ToolUse { name, input } = block else {
                    continue;
                };
                match classify_tool(name, input) {
                    Some(ToolAction::FileMutation { path }) => {
                        if seen.insert(path.clone()) {
                            changes.push(FileChange {
                                path,
                                line_index: index,
                            });
                        }
                    }
                    Some(ToolAction::Command { command }) => {
                        if scan_signals {
                            cache.observe_command(&command);
                        }
                    }
                    None => {}
                }
            }
        }
    }

    cache.last_scanned_line = cache.last_scanned_line.max(base_index + lines.len());
    changes
}
