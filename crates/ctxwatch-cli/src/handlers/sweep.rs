use anyhow::Result;
use ctxwatch_store::StateStore;
use std::time::SystemTime;

pub fn handle(project_root_flag: Option<&str>) -> Result<()> {
    crate::logging::init(false);

    let project_root = ctxwatch_core::discover_project_root(project_root_flag)?;
    let store = StateStore::open(&project_root);
    let removed = store.sweep(SystemTime::now());
    println!("Removed {} stale session state file(s)", removed);
    Ok(())
}
