//! Interactive shell session
//!
//! Owns one namespace tree and a current directory. Every name argument is
//! resolved inside the current directory; prompts go through `Prompter`.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, instrument};

use crate::application::services::SnapshotService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{
    entry_label, render, ConflictResolution, DomainError, MergeReport, NamespaceTree, NodeId,
    NodeKind, RemoveOutcome, SortKey,
};
use crate::infrastructure::traits::Prompter;

/// One line of `ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub kind: NodeKind,
    /// Byte size for files, item count for directories, 0 for links
    pub size: u64,
    pub modified: String,
    pub label: String,
}

/// What `touch` did when it was done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchOutcome {
    Created,
    /// Name was taken and the answer was skip (or not understood)
    Skipped,
    /// Created under the new name
    Renamed(String),
    /// Existing entry destroyed, new empty file created
    Overwritten,
}

pub struct ShellService {
    tree: NamespaceTree,
    cwd: NodeId,
    prompter: Arc<dyn Prompter>,
    snapshots: SnapshotService,
    settings: Arc<Settings>,
}

impl ShellService {
    pub fn new(
        tree: NamespaceTree,
        prompter: Arc<dyn Prompter>,
        snapshots: SnapshotService,
        settings: Arc<Settings>,
    ) -> Self {
        let cwd = tree.root();
        Self {
            tree,
            cwd,
            prompter,
            snapshots,
            settings,
        }
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    pub fn cwd(&self) -> NodeId {
        self.cwd
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    pub fn mkdir(&mut self, name: &str) -> ApplicationResult<NodeId> {
        Ok(self.tree.make_directory(self.cwd, name)?)
    }

    /// Create an empty file, running the conflict protocol if `name` is taken.
    #[instrument(level = "debug", skip(self))]
    pub fn touch(&mut self, name: &str) -> ApplicationResult<TouchOutcome> {
        if self.tree.find(self.cwd, name, None).is_none() {
            self.tree.make_file(self.cwd, name)?;
            return Ok(TouchOutcome::Created);
        }

        match self.prompter.resolve_conflict(name) {
            Some(ConflictResolution::Rename(new_name)) => {
                self.tree.make_file(self.cwd, &new_name)?;
                Ok(TouchOutcome::Renamed(new_name))
            }
            Some(ConflictResolution::Overwrite) => {
                self.tree.remove_subtree(self.cwd, name, true)?;
                self.tree.make_file(self.cwd, name)?;
                Ok(TouchOutcome::Overwritten)
            }
            Some(ConflictResolution::Skip) | None => {
                debug!("touch: keeping existing '{}'", name);
                Ok(TouchOutcome::Skipped)
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn symlink(&mut self, target: &str, link: &str) -> ApplicationResult<NodeId> {
        Ok(self.tree.create_symlink(self.cwd, target, link)?)
    }

    // ------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------

    pub fn list(&self) -> ApplicationResult<Vec<EntryRow>> {
        let rows = self
            .tree
            .entries(self.cwd)?
            .into_iter()
            .map(|(_, node)| EntryRow {
                kind: node.kind(),
                size: match node.kind() {
                    NodeKind::File => node.size(),
                    NodeKind::Directory => node.item_count() as u64,
                    NodeKind::Symlink => 0,
                },
                modified: format_timestamp(node.modified_at(), &self.settings.date_format),
                label: entry_label(node),
            })
            .collect();
        Ok(rows)
    }

    /// Rendered subtree of the current directory.
    pub fn tree_view(&self) -> String {
        render(&self.tree, self.cwd)
    }

    /// Content of a file in the current directory, following symlinks.
    #[instrument(level = "debug", skip(self))]
    pub fn cat(&self, name: &str) -> ApplicationResult<String> {
        let id = self.tree.resolve(self.tree.lookup(self.cwd, name)?)?;
        let node = self.tree.node(id)?;
        if !node.is_file() {
            return Err(DomainError::WrongKind {
                name: name.to_string(),
                expected: "file",
            }
            .into());
        }
        Ok(node.content().unwrap_or_default().to_string())
    }

    pub fn pwd(&self) -> ApplicationResult<String> {
        Ok(self.tree.path_of(self.cwd)?)
    }

    pub fn count_files(&self) -> usize {
        self.tree.count_files(self.tree.root())
    }

    // ------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------

    /// Enter a child directory. `..` goes up, `/` goes to the root.
    #[instrument(level = "debug", skip(self))]
    pub fn cd(&mut self, name: &str) -> ApplicationResult<()> {
        match name {
            ".." => {
                self.cd_up();
                return Ok(());
            }
            "/" => {
                self.cwd = self.tree.root();
                return Ok(());
            }
            _ => {}
        }
        let id = self.tree.resolve(self.tree.lookup(self.cwd, name)?)?;
        if !self.tree.node(id)?.is_dir() {
            return Err(DomainError::WrongKind {
                name: name.to_string(),
                expected: "directory",
            }
            .into());
        }
        self.cwd = id;
        Ok(())
    }

    /// Go to the parent directory; the root is its own parent.
    pub fn cd_up(&mut self) {
        if let Some(parent) = self.tree.get_node(self.cwd).and_then(|n| n.parent()) {
            self.cwd = parent;
        }
    }

    // ------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------

    /// Replace a file's content. Without `text` the prompter is asked for a
    /// line; end of input leaves the file untouched and returns false.
    #[instrument(level = "debug", skip(self, text))]
    pub fn edit(&mut self, name: &str, text: Option<&str>) -> ApplicationResult<bool> {
        let id = self.tree.resolve(self.tree.lookup(self.cwd, name)?)?;
        let text = match text {
            Some(text) => text.to_string(),
            None => match self.prompter.read_line("Enter new content:") {
                Some(line) => line,
                None => return Ok(false),
            },
        };
        self.tree.edit_content(id, &text)?;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, old: &str, new: &str) -> ApplicationResult<()> {
        let id = self.tree.lookup(self.cwd, old)?;
        self.tree.rename(id, new)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn mov(&mut self, name: &str, destination: &str) -> ApplicationResult<()> {
        self.tree.move_node(self.cwd, name, destination)?;
        Ok(())
    }

    /// Remove an entry and everything below it, asking first unless
    /// `confirm_removals` is off.
    #[instrument(level = "debug", skip(self))]
    pub fn rm(&mut self, name: &str) -> ApplicationResult<RemoveOutcome> {
        self.tree.lookup(self.cwd, name)?;
        let confirmed = !self.settings.confirm_removals
            || self
                .prompter
                .confirm(&format!("Remove '{}' and everything below it?", name));
        Ok(self.tree.remove_subtree(self.cwd, name, confirmed)?)
    }

    pub fn sort_by(&mut self, key: SortKey) -> ApplicationResult<()> {
        Ok(self.tree.sort(self.cwd, key)?)
    }

    /// Merge the contents of directory `src` into directory `dest`, both
    /// looked up in the current directory.
    #[instrument(level = "debug", skip(self))]
    pub fn merge(&mut self, src: &str, dest: &str) -> ApplicationResult<MergeReport> {
        let src_id = self.tree.resolve(self.tree.lookup(self.cwd, src)?)?;
        let dest_id = self.tree.resolve(self.tree.lookup(self.cwd, dest)?)?;
        let prompter = Arc::clone(&self.prompter);
        let report = self
            .tree
            .merge(dest_id, src_id, |name| prompter.resolve_conflict(name))?;
        debug!(
            "merge: {} moved, {} skipped, {} renamed, {} overwritten",
            report.moved.len(),
            report.skipped.len(),
            report.renamed.len(),
            report.overwritten.len()
        );
        Ok(report)
    }

    // ------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------

    pub fn save(&self, path: &Path) -> ApplicationResult<()> {
        self.snapshots.save(&self.tree, path)
    }

    /// Replace the session tree with the snapshot at `path`.
    /// On failure the current tree and directory are kept.
    pub fn load(&mut self, path: &Path) -> ApplicationResult<()> {
        let loaded = self.snapshots.load(&self.tree, path)?;
        self.tree.replace_with(loaded);
        self.cwd = self.tree.root();
        Ok(())
    }

    /// Write the configured autosave snapshot, if any. Returns the path written.
    pub fn autosave(&self) -> ApplicationResult<Option<&Path>> {
        match self.settings.autosave.as_deref() {
            Some(path) => {
                self.save(path)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

/// Render a unix timestamp in local time with a strftime format.
/// An invalid format falls back to the raw number.
pub(crate) fn format_timestamp(secs: i64, format: &str) -> String {
    let Some(utc) = DateTime::from_timestamp(secs, 0) else {
        return secs.to_string();
    };
    let mut out = String::new();
    match write!(out, "{}", utc.with_timezone(&Local).format(format)) {
        Ok(()) => out,
        Err(_) => secs.to_string(),
    }
}
