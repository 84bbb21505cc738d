//! Domain layer: the namespace tree engine
//!
//! This layer is independent of external concerns (no files, no prompts, no
//! CLI). Decisions that need a user arrive as plain values.

pub mod arena;
pub mod clock;
pub mod codec;
pub mod entities;
pub mod error;
pub mod node;
pub mod render;

pub use arena::{Children, NamespaceTree, MAX_SYMLINK_HOPS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{deserialize, from_reader, from_text, serialize, to_text, Record};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use node::{validate_name, Node, NodeId, NodeKind};
pub use render::{entry_label, release, render, ToTermTree};

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
