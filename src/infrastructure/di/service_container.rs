//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{ShellService, SnapshotService};
use crate::config::Settings;
use crate::domain::{Clock, NamespaceTree, SystemClock};
use crate::infrastructure::traits::{FileSystem, Prompter, RealFileSystem, TerminalPrompter};

/// Container holding the I/O boundaries every service is built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Interactive decisions
    pub prompter: Arc<dyn Prompter>,

    /// Source of modification times
    pub clock: Arc<dyn Clock>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(TerminalPrompter),
            Arc::new(SystemClock),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        prompter: Arc<dyn Prompter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            prompter,
            clock,
        }
    }

    pub fn snapshot_service(&self) -> SnapshotService {
        SnapshotService::new(Arc::clone(&self.fs))
    }

    /// A shell session on an empty tree.
    pub fn shell_service(&self) -> ShellService {
        ShellService::new(
            NamespaceTree::with_clock(Arc::clone(&self.clock)),
            Arc::clone(&self.prompter),
            self.snapshot_service(),
            Arc::clone(&self.settings),
        )
    }
}
