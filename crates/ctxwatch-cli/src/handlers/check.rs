use anyhow::Result;
use chrono::Utc;
use ctxwatch_engine::{CheckRequest, run_check};
use ctxwatch_types::{CheckOutcome, DirectoryCandidate, Settings};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;

/// Stop-hook payload as delivered by the host on stdin.
#[derive(Debug, Default, Deserialize)]
struct HookInput {
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    transcript_path: Option<String>,
    #[serde(default)]
    stop_hook_active: bool,
}

pub fn handle(log: Option<PathBuf>, project_root_flag: Option<&str>) -> Result<()> {
    let (log_path, root_hint) = match log {
        Some(path) => (path, None),
        None => {
            let Ok(input) = serde_json::from_reader::<_, HookInput>(std::io::stdin()) else {
                return allow_stop();
            };
            if input.stop_hook_active {
                // The host re-fires the hook after a blocked stop; never loop
                return allow_stop();
            }
            let Some(transcript) = input.transcript_path else {
                return allow_stop();
            };
            (PathBuf::from(transcript), input.cwd)
        }
    };

    let explicit_root = project_root_flag.map(str::to_string).or(root_hint);
    let Ok(project_root) = ctxwatch_core::discover_project_root(explicit_root.as_deref()) else {
        return allow_stop();
    };

    let settings_path = ctxwatch_core::state_root(&project_root).join("config.toml");
    let settings_result = Settings::load_from(&settings_path);
    let settings = match &settings_result {
        Ok(settings) => settings.clone(),
        Err(_) => Settings::default(),
    };
    crate::logging::init(settings.debug);
    if let Err(err) = &settings_result {
        warn!(%err, "settings unreadable, using defaults");
    }

    let request = CheckRequest {
        log_path: &log_path,
        project_root: &project_root,
        settings: &settings,
        now: Utc::now(),
    };

    match run_check(&request) {
        CheckOutcome::NoAction => allow_stop(),
        CheckOutcome::Notify {
            candidates,
            completion_reason,
        } => {
            let reason = render_reason(&candidates, &completion_reason);
            println!("{}", json!({ "decision": "block", "reason": reason }));
            Ok(())
        }
    }
}

fn allow_stop() -> Result<()> {
    println!("{}", json!({ "ok": true }));
    Ok(())
}

fn render_reason(candidates: &[DirectoryCandidate], completion_reason: &str) -> String {
    let mut out = format!(
        "Session looks complete ({}). Concentrated changes detected in:\n",
        completion_reason
    );

    for candidate in candidates {
        let total = candidate.total_count();
        let files = if total == 1 { "file" } else { "files" };
        if candidate.child_count > 0 {
            out.push_str(&format!(
                "  - {} ({} {}, {} rolled up from {} subdirectories)\n",
                candidate.path, total, files, candidate.from_children_count, candidate.child_count
            ));
        } else {
            out.push_str(&format!("  - {} ({} {})\n", candidate.path, total, files));
        }
    }

    out.push_str("\nConsider regenerating the context docs for these directories.");
    out
}
