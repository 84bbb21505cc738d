//! CLI layer: argument parsing, shell command parsing and dispatch

pub mod args;
pub mod command;
pub mod commands;
pub mod error;
pub mod output;

pub use args::Cli;
pub use command::ShellCommand;
pub use error::{CliError, CliResult};
