use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Number of hex characters kept from the log identity digest. Short enough
/// for a file name, long enough that two logs in one project never collide.
const IDENTITY_HASH_LEN: usize = 12;

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Discover project root based on priority:
/// 1. explicit_project_root (--project-root flag, with tilde expansion)
/// 2. CTXWATCH_PROJECT_ROOT environment variable (with tilde expansion)
/// 3. Current working directory
pub fn discover_project_root(explicit_project_root: Option<&str>) -> Result<PathBuf> {
    if let Some(root) = explicit_project_root {
        return Ok(expand_tilde(root));
    }

    if let Ok(env_root) = std::env::var("CTXWATCH_PROJECT_ROOT") {
        return Ok(expand_tilde(&env_root));
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd)
}

/// Stable short identity for a log file, derived from its path.
///
/// Session state is keyed by this value, so it must not change across
/// invocations for the same log. The raw path string is hashed as given;
/// canonicalizing would break identity for logs deleted between checks.
pub fn log_identity_hash(log_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(log_path.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..IDENTITY_HASH_LEN].to_string()
}

/// Rewrite backslash separators to forward slashes. Tool inputs arrive in
/// whichever convention the agent's platform used.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn is_absolute_like(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    // Windows drive prefix (C:/...)
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Resolve a raw tool-input path to project-relative form.
///
/// Relative inputs are taken as already project-relative. Absolute inputs
/// must fall under the project root; anything outside is rejected with None
/// and the caller drops it.
pub fn relativize(raw_path: &str, project_root: &str) -> Option<String> {
    let path = normalize_separators(raw_path);
    let root = normalize_separators(project_root);
    let root = root.trim_end_matches('/');

    if !is_absolute_like(&path) {
        return Some(path);
    }

    let stripped = path.strip_prefix(root)?;
    if !stripped.is_empty() && !stripped.starts_with('/') {
        // Prefix match landed mid-segment (/home/user/proj vs /home/user/project2)
        return None;
    }
    Some(stripped.trim_start_matches('/').to_string())
}

/// Immediate parent directory of a relative file path; "." for top-level files.
pub fn parent_dir(rel_path: &str) -> String {
    match rel_path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent.to_string(),
        _ => ".".to_string(),
    }
}

/// Check if any path segment matches an excluded directory name exactly.
pub fn is_excluded_path(rel_dir: &str, exclusions: &[String]) -> bool {
    rel_dir
        .split('/')
        .any(|segment| exclusions.iter().any(|ex| ex == segment))
}

/// Root of all persisted ctxwatch state for a project.
pub fn state_root(project_root: &Path) -> PathBuf {
    project_root.join(".claude").join("ctxwatch")
}
