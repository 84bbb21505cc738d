//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Prompter)
//! but are themselves concrete structs, not traits.

mod shell;
mod snapshot;

pub use shell::{EntryRow, ShellService, TouchOutcome};
pub use snapshot::SnapshotService;
