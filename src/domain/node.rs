//! Node model of the namespace tree.

use std::fmt;

use generational_arena::Index;

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node inside a [`crate::domain::NamespaceTree`].
///
/// Handles of destroyed nodes never alias new nodes (generational index).
pub type NodeId = Index;

/// Kind of a namespace entry. The discriminant is the persisted encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File = 0,
    Directory = 1,
    Symlink = 2,
}

impl NodeKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::File),
            1 => Some(Self::Directory),
            2 => Some(Self::Symlink),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A file, directory or symbolic link.
///
/// Payload fields are read through accessors; structural links are owned by
/// the tree and only changed through its operations.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    pub(crate) item_count: usize,
    pub(crate) size: u64,
    pub(crate) modified_at: i64,
    pub(crate) content: Option<String>,
    pub(crate) symlink_target: Option<String>,

    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) previous: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, name: String, modified_at: i64) -> Self {
        Self {
            kind,
            name,
            item_count: 0,
            size: 0,
            modified_at,
            content: None,
            symlink_target: None,
            parent: None,
            first_child: None,
            previous: None,
            next: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of direct children (0 for files and symlinks).
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified_at(&self) -> i64 {
        self.modified_at
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn symlink_target(&self) -> Option<&str> {
        self.symlink_target.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.previous
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == NodeKind::Symlink
    }
}

/// Names are single whitespace-free tokens so they survive the text format.
/// `/`, `.` and `..` are reserved for path display and navigation.
pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.chars().any(char::is_whitespace)
    {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(NodeKind::File))]
    #[case(1, Some(NodeKind::Directory))]
    #[case(2, Some(NodeKind::Symlink))]
    #[case(3, None)]
    fn test_kind_from_code(#[case] code: u8, #[case] expected: Option<NodeKind>) {
        assert_eq!(NodeKind::from_code(code), expected);
        if let Some(kind) = expected {
            assert_eq!(kind.code(), code);
        }
    }

    #[rstest]
    #[case("a.txt", true)]
    #[case("", false)]
    #[case("two words", false)]
    #[case("tab\tname", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    fn test_validate_name(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(validate_name(name).is_ok(), ok);
    }
}
