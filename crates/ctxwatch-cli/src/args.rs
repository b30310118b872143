use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ctxwatch")]
#[command(about = "Watch agent session transcripts and surface directories with concentrated change", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true)]
    pub project_root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a session-end check; without --log, reads stop-hook JSON from stdin
    Check {
        #[arg(long, help = "Transcript path (bypasses the stdin hook protocol)")]
        log: Option<PathBuf>,
    },

    /// Print the persisted state for a transcript
    State {
        #[arg(long)]
        log: PathBuf,
    },

    /// Delete stale session state files now
    Sweep,
}
