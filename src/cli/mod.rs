//! CLI command definitions for settings-resolver
//!
//! `show` prints the resolved tree as JSON or YAML, `get` prints one value
//! by dotted path and `check` reports the source format and any undefined
//! environment variables. `--dir`, `--log` and `--html` apply to all three.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format accepted by `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Yaml,
}

/// Resolve layered settings files and print the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the settings files (overrides SETTINGS_RESOLVER_DIR)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Render errors and diagnostics as an HTML fragment
    #[arg(long, global = true)]
    pub html: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved settings (default if no subcommand given)
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
    },

    /// Print a single value by dotted path, e.g. `sql.server`
    Get {
        /// Dotted path to the value
        path: String,
    },

    /// Resolve and report the source used and any diagnostics
    Check,
}
