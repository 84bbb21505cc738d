//! Domain entities: decisions and reports exchanged with the tree engine

/// Ordering criterion for `sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Byte-wise lexicographic order of names
    Name,
    /// Oldest `modified_at` first, ties keep their prior order
    ModifiedTime,
}

impl SortKey {
    /// Parse the shell spelling (`name` / `date`).
    pub fn parse(criterion: &str) -> Option<Self> {
        match criterion {
            "name" => Some(Self::Name),
            "date" | "time" | "mtime" => Some(Self::ModifiedTime),
            _ => None,
        }
    }
}

/// Answer to a name collision (the conflict protocol).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Leave the incoming entry where it is
    Skip,
    /// Give the incoming entry a new name, then place it
    Rename(String),
    /// Destroy the existing entry, then place the incoming one
    Overwrite,
}

/// Outcome of `remove_subtree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Confirmation was declined; nothing changed
    Cancelled,
    /// Subtree destroyed
    Removed {
        /// Nodes freed, including the removed entry itself
        nodes: usize,
        /// File nodes among them
        files: usize,
    },
}

/// What a merge did, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entries moved without a conflict
    pub moved: Vec<String>,
    /// Entries left in the source directory
    pub skipped: Vec<String>,
    /// `(old, new)` names of entries moved under a new name
    pub renamed: Vec<(String, String)>,
    /// Entries that replaced an existing destination entry
    pub overwritten: Vec<String>,
    /// Set when an unrecognized conflict answer stopped the merge at this entry
    pub aborted_at: Option<String>,
}

impl MergeReport {
    pub fn is_complete(&self) -> bool {
        self.aborted_at.is_none()
    }
}
