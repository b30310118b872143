use crate::args::{Cli, Commands};
use crate::handlers;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { log } => handlers::check::handle(log, cli.project_root.as_deref()),
        Commands::State { log } => handlers::state::handle(&log, cli.project_root.as_deref()),
        Commands::Sweep => handlers::sweep::handle(cli.project_root.as_deref()),
    }
}
