//! Snapshot persistence
//!
//! Writes the whole tree in the line-oriented text format and reads it back
//! into a fresh tree.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{from_reader, to_text, NamespaceTree};
use crate::infrastructure::traits::FileSystem;

/// Service for saving and loading tree snapshots.
pub struct SnapshotService {
    fs: Arc<dyn FileSystem>,
}

impl SnapshotService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Serialize the children of the root to `path`.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn save(&self, tree: &NamespaceTree, path: &Path) -> ApplicationResult<()> {
        let text = to_text(tree, tree.root())?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write(path, &text)
            .with_path_context("write snapshot", path)?;
        debug!("saved {} nodes to {}", tree.len(), path.display());
        Ok(())
    }

    /// Decode `path` into a new tree sharing the clock of `template`.
    ///
    /// The returned tree has passed `verify`. Nothing is modified on failure;
    /// callers swap the result in themselves.
    #[instrument(level = "debug", skip(self, template))]
    pub fn load(&self, template: &NamespaceTree, path: &Path) -> ApplicationResult<NamespaceTree> {
        let bytes = self
            .fs
            .read(path)
            .with_path_context("read snapshot", path)?;
        let tree = from_reader(template, bytes.as_slice())?;
        tree.verify()?;
        debug!("loaded {} nodes from {}", tree.len(), path.display());
        Ok(tree)
    }
}
