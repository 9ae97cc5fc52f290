use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "plughost", version, about = "Native plugin discovery and loading")]
pub struct Args {
    /// TOML file with a `[discovery]` table.
    #[arg(long, global = true, env = "PLUGHOST_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, env = "PLUGHOST_INSTALL_ROOT")]
    pub install_root: Option<PathBuf>,
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the directories a pass would scan.
    Dirs,
    /// List plugin libraries without loading them.
    Scan,
    /// Run a full discovery and load pass.
    Load,
    /// Load one pluggable device library, or every library in a directory.
    Device { path: PathBuf },
}
