use crate::lock::ScopedLock;
use crate::state::{GenerationLedger, SessionState};
use ctxwatch_types::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const LOCK_TIMEOUT: Duration = Duration::from_secs(2);
/// Session state older than this is garbage
const SWEEP_MAX_AGE: Duration = Duration::from_secs(14 * 24 * 60 * 60);
/// Minimum interval between automatic sweeps
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const LEGACY_PREFIX: &str = "ctxwatch-state-";

/// Durable store for session state and the per-project generation ledger.
///
/// Layout under `<project>/.claude/ctxwatch/`:
/// `sessions/<hash>.json` per log, `generations.json` per project, plus the
/// `.lock` and `.last-sweep` bookkeeping files. The legacy flat layout
/// (`.claude/ctxwatch-state-<hash>.json`) is migrated in on first access.
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn open(project_root: &Path) -> Self {
        let store = Self {
            root: ctxwatch_core::state_root(project_root),
        };
        store.migrate_legacy_layout();
        store.maybe_sweep();
        store
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    fn session_path(&self, key: &str) -> PathBuf {
        self.sessions_dir().join(format!("{}.json", key))
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("generations.json")
    }

    /// Load the state for one log, falling back to defaults on any failure.
    pub fn load_session(&self, key: &str) -> SessionState {
        load_json_or_default(&self.session_path(key))
    }

    pub fn load_ledger(&self) -> GenerationLedger {
        load_json_or_default(&self.ledger_path())
    }

    /// Persist both records under the advisory lock. Atomic per file
    /// (temp write + rename); the two files are not atomic together, which
    /// at worst costs one duplicate-suppressed cycle.
    pub fn save(&self, key: &str, state: &SessionState, ledger: &GenerationLedger) -> Result<()> {
        std::fs::create_dir_all(self.sessions_dir())?;

        let _lock = ScopedLock::acquire(&self.root.join(".lock"), LOCK_TIMEOUT);

        write_json_atomic(&self.session_path(key), state)?;
        write_json_atomic(&self.ledger_path(), ledger)?;
        Ok(())
    }

    /// Move legacy flat-layout state files into the sessions subdirectory.
    /// Failures are logged and skipped; a file left behind just means one
    /// session rescans from the start.
    fn migrate_legacy_layout(&self) {
        let Some(claude_dir) = self.root.parent() else {
            return;
        };
        let Ok(entries) = std::fs::read_dir(claude_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(key) = name
                .strip_prefix(LEGACY_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };

            let target = self.session_path(key);
            if target.exists() {
                continue;
            }
            if let Err(err) = std::fs::create_dir_all(self.sessions_dir())
                .and_then(|_| std::fs::rename(entry.path(), &target))
            {
                warn!(file = name, %err, "legacy state migration failed");
            } else {
                debug!(file = name, "migrated legacy state file");
            }
        }
    }

    /// Sweep stale session files, at most once per `SWEEP_INTERVAL`.
    fn maybe_sweep(&self) {
        let marker = self.root.join(".last-sweep");
        if let Ok(meta) = std::fs::metadata(&marker)
            && let Ok(modified) = meta.modified()
            && let Ok(elapsed) = SystemTime::now().duration_since(modified)
            && elapsed < SWEEP_INTERVAL
        {
            return;
        }

        if std::fs::create_dir_all(&self.root).is_ok() {
            let _ = std::fs::write(&marker, b"");
        }
        self.sweep(SystemTime::now());
    }

    /// Delete session files older than `SWEEP_MAX_AGE`. Returns how many
    /// were removed.
    pub fn sweep(&self, now: SystemTime) -> usize {
        let Ok(entries) = std::fs::read_dir(self.sessions_dir()) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let stale = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > SWEEP_MAX_AGE);

            if stale {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(err) => warn!(path = %entry.path().display(), %err, "sweep failed"),
                }
            }
        }
        removed
    }
}

fn load_json_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> T {
    let Ok(content) = std::fs::read_to_string(path) else {
        return T::default();
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), %err, "corrupt state file, using defaults");
            T::default()
        }
    }
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| ctxwatch_types::Error::Config(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
