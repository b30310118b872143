use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory names that never warrant a context suggestion, regardless of
/// how many files change under them. Matched per path segment, not substring.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "packages",
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "obj",
    "test",
    "tests",
    "spec",
    "specs",
    "__tests__",
    "__snapshots__",
    "coverage",
    ".next",
    ".nuxt",
    ".angular",
    "__pycache__",
    "temp",
    "tmp",
    "cache",
];

/// Quiet-period cutoffs for the completion judge, in transcript lines.
///
/// These numbers have drifted across versions of the heuristic and carry no
/// deeper meaning; they are settings so deployments can tune them without a
/// rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JudgePolicy {
    /// Quiet lines required after a commit/push signal
    pub commit_quiet_lines: usize,
    /// Quiet lines required after any other explicit signal
    pub signal_quiet_lines: usize,
    /// Quiet lines after which a session counts as complete with no signal at all
    pub fallback_quiet_lines: usize,
}

impl Default for JudgePolicy {
    fn default() -> Self {
        Self {
            commit_quiet_lines: 3,
            signal_quiet_lines: 5,
            fallback_quiet_lines: 15,
        }
    }
}

/// Per-project settings, loaded from `.claude/ctxwatch/config.toml`.
///
/// Field names stay camelCase on disk so existing plugin configs carry over
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Files changed in one directory before it becomes a candidate
    pub threshold: usize,
    /// Master switch; false disables every check
    pub auto_generate: bool,
    /// Minimum minutes between two notifications for the same directory
    pub cooldown_minutes: i64,
    /// Cap on extracted file changes fed to the aggregator per check
    pub max_files_analyzed: usize,
    /// Verbose diagnostics on stderr
    pub debug: bool,
    /// Extra excluded directory names, appended to the built-in list
    pub excluded_directories: Vec<String>,
    pub judge: JudgePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: 2,
            auto_generate: true,
            cooldown_minutes: 30,
            max_files_analyzed: 50,
            debug: false,
            excluded_directories: Vec::new(),
            judge: JudgePolicy::default(),
        }
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Built-in exclusions plus any configured extras, in match order.
    pub fn effective_exclusions(&self) -> Vec<String> {
        let mut all: Vec<String> = DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect();
        all.extend(self.excluded_directories.iter().cloned());
        all
    }
}
