//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// In-memory hierarchical namespace with an interactive shell
#[derive(Parser, Debug)]
#[command(name = "treefs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Start from this snapshot instead of an empty tree
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub load: Option<PathBuf>,

    /// Read shell commands from a file instead of stdin
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub script: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/treefs/treefs.toml)
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath, env = "TREEFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print a commented config template and exit
    #[arg(long)]
    pub config_template: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}
