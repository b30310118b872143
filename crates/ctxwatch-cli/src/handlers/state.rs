use anyhow::Result;
use ctxwatch_store::StateStore;
use serde_json::json;
use std::path::Path;

pub fn handle(log: &Path, project_root_flag: Option<&str>) -> Result<()> {
    crate::logging::init(false);

    let project_root = ctxwatch_core::discover_project_root(project_root_flag)?;
    let store = StateStore::open(&project_root);
    let key = ctxwatch_core::log_identity_hash(log);

    let report = json!({
        "key": key,
        "session": store.load_session(&key),
        "generations": store.load_ledger(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
