//! Line-oriented text format for namespace snapshots.
//!
//! ```text
//! <kind> <name> <size> <modified_at>
//! CONTENT:<text>        (files with content)
//! TARGET:<name>         (symlinks)
//! ...child blocks...
//! END
//! ```
//!
//! Kinds are encoded as 0 (file), 1 (directory), 2 (symlink). Names cannot
//! contain whitespace and content cannot contain newlines.

use std::fmt;
use std::io::{self, BufRead, Lines, Write};

use tracing::{debug, instrument};

use crate::domain::arena::NamespaceTree;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{validate_name, Node, NodeId, NodeKind};

pub const END_MARKER: &str = "END";
pub const CONTENT_PREFIX: &str = "CONTENT:";
pub const TARGET_PREFIX: &str = "TARGET:";

/// Header line of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: NodeKind,
    pub name: String,
    pub size: u64,
    pub modified_at: i64,
}

impl Record {
    /// Decode a header line, validating field count, kind range and numbers.
    pub fn parse(line: &str, line_no: usize) -> DomainResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [kind, name, size, modified_at] = fields.as_slice() else {
            return Err(DomainError::corrupt(
                line_no,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        };

        let kind = kind
            .parse::<u8>()
            .ok()
            .and_then(NodeKind::from_code)
            .ok_or_else(|| DomainError::corrupt(line_no, format!("unknown kind '{}'", kind)))?;
        validate_name(name)
            .map_err(|_| DomainError::corrupt(line_no, format!("invalid name '{}'", name)))?;
        let size = size
            .parse::<u64>()
            .map_err(|_| DomainError::corrupt(line_no, format!("invalid size '{}'", size)))?;
        let modified_at = modified_at.parse::<i64>().map_err(|_| {
            DomainError::corrupt(line_no, format!("invalid timestamp '{}'", modified_at))
        })?;

        Ok(Self {
            kind,
            name: name.to_string(),
            size,
            modified_at,
        })
    }
}

impl From<&Node> for Record {
    fn from(node: &Node) -> Self {
        Self {
            kind: node.kind(),
            name: node.name().to_string(),
            size: node.size(),
            modified_at: node.modified_at(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.kind.code(),
            self.name,
            self.size,
            self.modified_at
        )
    }
}

// ------------------------------------------------------------
// Writing
// ------------------------------------------------------------

/// Write `node` as a child list terminated by `END`.
///
/// The root itself has no record: its children are written instead, so the
/// output of `serialize(root)` loads back with `deserialize(.., root)`.
/// Nesting depth is not limited by the call stack.
#[instrument(level = "debug", skip(tree, sink))]
pub fn serialize<W: Write>(tree: &NamespaceTree, node: NodeId, sink: &mut W) -> DomainResult<()> {
    tree.node(node)?;
    let mut stack: Vec<(NodeId, bool)> = if node == tree.root() {
        let children: Vec<NodeId> = tree.children(node).collect();
        children.into_iter().rev().map(|child| (child, false)).collect()
    } else {
        vec![(node, false)]
    };

    while let Some((id, opened)) = stack.pop() {
        if opened {
            writeln!(sink, "{}", END_MARKER)?;
            continue;
        }
        write_header(tree.node(id)?, sink)?;
        stack.push((id, true));
        let children: Vec<NodeId> = tree.children(id).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, false)));
    }
    writeln!(sink, "{}", END_MARKER)?;
    Ok(())
}

/// Record line plus the CONTENT / TARGET line of one node.
fn write_header<W: Write>(node: &Node, sink: &mut W) -> DomainResult<()> {
    writeln!(sink, "{}", Record::from(node))?;
    match node.kind() {
        NodeKind::File => {
            if let Some(content) = node.content() {
                writeln!(sink, "{}{}", CONTENT_PREFIX, content)?;
            }
        }
        NodeKind::Symlink => {
            writeln!(sink, "{}{}", TARGET_PREFIX, node.symlink_target().unwrap_or_default())?;
        }
        NodeKind::Directory => {}
    }
    Ok(())
}

/// Serialize into a string.
pub fn to_text(tree: &NamespaceTree, node: NodeId) -> DomainResult<String> {
    let mut buf = Vec::new();
    serialize(tree, node, &mut buf)?;
    String::from_utf8(buf).map_err(|e| DomainError::IoFailure(e.to_string()))
}

// ------------------------------------------------------------
// Reading
// ------------------------------------------------------------

struct LineReader<R> {
    lines: Lines<R>,
    peeked: Option<String>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(source: R) -> Self {
        Self {
            lines: source.lines(),
            peeked: None,
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> DomainResult<Option<String>> {
        let line = match self.peeked.take() {
            Some(line) => Some(line),
            None => self.read_raw()?,
        };
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    fn peek(&mut self) -> DomainResult<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.read_raw()?;
        }
        Ok(self.peeked.as_deref())
    }

    /// Pull one line from the source. Undecodable bytes are corrupt data,
    /// reported at the line that would have been read next.
    fn read_raw(&mut self) -> DomainResult<Option<String>> {
        self.lines.next().transpose().map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                DomainError::corrupt(self.line_no + 1, "invalid UTF-8")
            } else {
                DomainError::from(e)
            }
        })
    }

    /// Consume the next line if it starts with `prefix`, returning the rest.
    fn take_prefixed(&mut self, prefix: &str) -> DomainResult<Option<String>> {
        match self.peek()? {
            Some(line) if line.starts_with(prefix) => {}
            _ => return Ok(None),
        }
        let line = self.next_line()?.unwrap_or_default();
        Ok(Some(line[prefix.len()..].to_string()))
    }
}

/// Read child blocks into `parent` until the closing `END`.
///
/// Returns the number of nodes created. Each node is fully populated before
/// it is linked at the tail of its parent. On error every block still open
/// is freed; blocks linked before the failure remain. Open directories are
/// kept on an explicit stack, so deep nesting cannot exhaust the call stack.
#[instrument(level = "debug", skip(tree, source))]
pub fn deserialize<R: BufRead>(
    tree: &mut NamespaceTree,
    source: R,
    parent: NodeId,
) -> DomainResult<usize> {
    let dir = tree.node(parent)?;
    if !dir.is_dir() {
        return Err(DomainError::WrongKind {
            name: dir.name().to_string(),
            expected: "directory",
        });
    }

    let mut reader = LineReader::new(source);
    let loaded = read_children(tree, &mut reader, parent)?;
    while let Some(line) = reader.next_line()? {
        if !line.trim().is_empty() {
            return Err(DomainError::corrupt(
                reader.line_no,
                "unexpected data after the final END",
            ));
        }
    }
    debug!("deserialized {} nodes", loaded);
    Ok(loaded)
}

/// Parse a snapshot string into a fresh tree sharing `template`'s clock.
pub fn from_text(template: &NamespaceTree, text: &str) -> DomainResult<NamespaceTree> {
    from_reader(template, text.as_bytes())
}

/// Decode raw snapshot bytes into a fresh tree sharing `template`'s clock.
pub fn from_reader<R: BufRead>(template: &NamespaceTree, source: R) -> DomainResult<NamespaceTree> {
    let mut tree = NamespaceTree::with_clock(template.clock());
    let root = tree.root();
    deserialize(&mut tree, source, root)?;
    Ok(tree)
}

/// A directory whose block is still open: its children are being linked to
/// it, but it is not yet linked to its own parent.
struct Pending {
    id: NodeId,
    line_no: usize,
    loaded: usize,
}

fn read_children<R: BufRead>(
    tree: &mut NamespaceTree,
    reader: &mut LineReader<R>,
    parent: NodeId,
) -> DomainResult<usize> {
    let mut open = Vec::new();
    let result = read_blocks(tree, reader, parent, &mut open);
    if result.is_err() {
        // pending directories are detached, each one owns what it has linked so far
        for pending in open.into_iter().rev() {
            tree.destroy(pending.id);
        }
    }
    result
}

fn read_blocks<R: BufRead>(
    tree: &mut NamespaceTree,
    reader: &mut LineReader<R>,
    parent: NodeId,
    open: &mut Vec<Pending>,
) -> DomainResult<usize> {
    let mut loaded = 0;
    loop {
        let Some(line) = reader.next_line()? else {
            return Err(DomainError::corrupt(
                reader.line_no,
                "unexpected end of input, missing END",
            ));
        };

        if line == END_MARKER {
            let Some(done) = open.pop() else {
                return Ok(loaded);
            };
            let dir = open.last().map_or(parent, |p| p.id);
            if let Err(e) = link(tree, dir, done.id, done.line_no) {
                tree.destroy(done.id);
                return Err(e);
            }
            credit(open, &mut loaded, done.loaded + 1);
            continue;
        }

        let line_no = reader.line_no;
        let record = Record::parse(&line, line_no)?;
        let node = decode_payload(&record, reader, line_no)?;
        let id = tree.insert_detached(node);
        if record.kind == NodeKind::Directory {
            open.push(Pending {
                id,
                line_no,
                loaded: 0,
            });
            continue;
        }

        let dir = open.last().map_or(parent, |p| p.id);
        if let Err(e) = expect_end(reader, &record).and_then(|_| link(tree, dir, id, line_no)) {
            tree.destroy(id);
            return Err(e);
        }
        credit(open, &mut loaded, 1);
    }
}

/// Link a completed node at the tail of `dir`.
fn link(tree: &mut NamespaceTree, dir: NodeId, id: NodeId, line_no: usize) -> DomainResult<()> {
    tree.attach_checked(dir, id).map_err(|e| match e {
        DomainError::AlreadyExists(name) => {
            DomainError::corrupt(line_no, format!("duplicate name '{}'", name))
        }
        other => other,
    })
}

fn credit(open: &mut [Pending], loaded: &mut usize, count: usize) {
    match open.last_mut() {
        Some(pending) => pending.loaded += count,
        None => *loaded += count,
    }
}

/// Build the node for `record`, consuming its CONTENT / TARGET line.
fn decode_payload<R: BufRead>(
    record: &Record,
    reader: &mut LineReader<R>,
    line_no: usize,
) -> DomainResult<Node> {
    let mut node = Node::new(record.kind, record.name.clone(), record.modified_at);
    match record.kind {
        NodeKind::File => {
            node.content = reader.take_prefixed(CONTENT_PREFIX)?;
            let actual = node.content.as_deref().map_or(0, |c| c.len() as u64);
            if actual != record.size {
                return Err(DomainError::corrupt(
                    line_no,
                    format!(
                        "size {} of '{}' does not match content length {}",
                        record.size, record.name, actual
                    ),
                ));
            }
            node.size = record.size;
        }
        NodeKind::Directory | NodeKind::Symlink if record.size != 0 => {
            return Err(DomainError::corrupt(
                line_no,
                format!("{} '{}' must have size 0", record.kind, record.name),
            ));
        }
        NodeKind::Directory => {}
        NodeKind::Symlink => {
            let target = reader.take_prefixed(TARGET_PREFIX)?.ok_or_else(|| {
                DomainError::corrupt(line_no, format!("symlink '{}' has no TARGET line", record.name))
            })?;
            validate_name(&target).map_err(|_| {
                DomainError::corrupt(line_no, format!("invalid symlink target '{}'", target))
            })?;
            node.symlink_target = Some(target);
        }
    }
    Ok(node)
}

fn expect_end<R: BufRead>(reader: &mut LineReader<R>, record: &Record) -> DomainResult<()> {
    match reader.next_line()? {
        Some(line) if line == END_MARKER => Ok(()),
        Some(_) => Err(DomainError::corrupt(
            reader.line_no,
            format!("{} '{}' cannot have children", record.kind, record.name),
        )),
        None => Err(DomainError::corrupt(
            reader.line_no,
            "unexpected end of input, missing END",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0 a.txt 5 1700000000", NodeKind::File)]
    #[case("1 docs 0 1700000000", NodeKind::Directory)]
    #[case("2 link 0 -1", NodeKind::Symlink)]
    fn test_record_parse_valid(#[case] line: &str, #[case] kind: NodeKind) {
        let record = Record::parse(line, 1).unwrap();
        assert_eq!(record.kind, kind);
        assert_eq!(record.to_string(), line);
    }

    #[rstest]
    #[case("")]
    #[case("0 a.txt 5")]
    #[case("0 a.txt 5 1 extra")]
    #[case("3 a.txt 0 0")]
    #[case("x a.txt 0 0")]
    #[case("0 a.txt -5 0")]
    #[case("0 a.txt 0 soon")]
    fn test_record_parse_rejects(#[case] line: &str) {
        assert!(matches!(
            Record::parse(line, 7),
            Err(DomainError::CorruptData { line: 7, .. })
        ));
    }

    #[test]
    fn given_empty_tree_when_serialized_then_single_end() {
        let tree = NamespaceTree::new();
        assert_eq!(to_text(&tree, tree.root()).unwrap(), "END\n");
    }

    #[test]
    fn given_file_without_content_when_serialized_then_no_content_line() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let f = tree.make_file(root, "empty").unwrap();
        let mtime = tree.node(f).unwrap().modified_at();
        assert_eq!(
            to_text(&tree, root).unwrap(),
            format!("0 empty 0 {}\nEND\nEND\n", mtime)
        );
    }

    #[test]
    fn given_crlf_line_endings_when_deserialized_then_terminators_stripped() {
        let text = "0 a.txt 5 10\r\nCONTENT:hello\r\nEND\r\nEND\r\n";
        let tree = from_text(&NamespaceTree::new(), text).unwrap();
        let a = tree.lookup(tree.root(), "a.txt").unwrap();
        assert_eq!(tree.node(a).unwrap().content(), Some("hello"));
    }

    #[test]
    fn given_nested_failure_when_deserialized_then_partial_node_is_freed() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let text = "1 ok 0 1\nEND\n1 broken 0 1\n0 child 3 1\nCONTENT:abc\nEND\n9 bad 0 0\n";
        let err = deserialize(&mut tree, text.as_bytes(), root).unwrap_err();
        assert!(matches!(err, DomainError::CorruptData { line: 7, .. }));
        // the first block was linked, the broken one was released entirely
        assert_eq!(tree.len(), 2);
        assert!(tree.find(root, "ok", None).is_some());
        tree.verify().unwrap();
    }

    #[test]
    fn given_invalid_utf8_in_later_line_when_deserialized_then_corrupt_at_that_line() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let bytes: &[u8] = b"1 docs 0 1\n0 a 1 0\nCONTENT:\xff\nEND\nEND\nEND\n";
        let err = deserialize(&mut tree, bytes, root).unwrap_err();
        assert!(matches!(err, DomainError::CorruptData { line: 3, .. }), "{err:?}");
        assert_eq!(tree.len(), 1);
    }
}
