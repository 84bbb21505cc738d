//! treefs: an in-memory hierarchical namespace with an interactive shell
//!
//! Layers, innermost first:
//! - `domain`: the arena-backed namespace tree, its text codec and rendering
//! - `application`: shell session and snapshot services
//! - `infrastructure`: filesystem and prompt boundaries, DI container
//! - `cli`: argument parsing, shell command parsing and dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
