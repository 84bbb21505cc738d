/*
Rendering goes through a trait so that callers holding only a tree reference
can ask for a termtree without knowing how nodes are linked.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::NamespaceTree;
use crate::domain::node::{Node, NodeId, NodeKind};

pub trait ToTermTree {
    fn to_term_tree(&self, from: NodeId) -> Tree<String>;
}

/// Label of one entry: `name/` for directories, `name -> target` for links.
pub fn entry_label(node: &Node) -> String {
    match node.kind() {
        NodeKind::Directory => format!("{}/", node.name().trim_end_matches('/')),
        NodeKind::Symlink => format!(
            "{} -> {}",
            node.name(),
            node.symlink_target().unwrap_or_default()
        ),
        NodeKind::File => node.name().to_string(),
    }
}

impl ToTermTree for NamespaceTree {
    #[instrument(level = "debug", skip(self))]
    fn to_term_tree(&self, from: NodeId) -> Tree<String> {
        let Some(node) = self.get_node(from) else {
            return Tree::new("Empty tree".to_string());
        };
        let root_label = if from == self.root() {
            "/".to_string()
        } else {
            entry_label(node)
        };
        let mut stack = vec![(Tree::new(root_label), self.children(from))];
        while let Some((_, children)) = stack.last_mut() {
            if let Some(child_idx) = children.next() {
                if let Some(child) = self.get_node(child_idx) {
                    stack.push((Tree::new(entry_label(child)), self.children(child_idx)));
                }
                continue;
            }
            if let Some((done, _)) = stack.pop() {
                match stack.last_mut() {
                    Some((parent, _)) => {
                        parent.push(done);
                    }
                    None => return done,
                }
            }
        }
        Tree::new("Empty tree".to_string())
    }
}

/// Render the subtree below `from` as text.
pub fn render(tree: &NamespaceTree, from: NodeId) -> String {
    let term_tree = tree.to_term_tree(from);
    let text = term_tree.to_string();
    release(term_tree);
    text
}

/// Drop a rendered tree level by level instead of recursively.
pub fn release(tree: Tree<String>) {
    let mut pending = vec![tree];
    while let Some(mut current) = pending.pop() {
        pending.append(&mut current.leaves);
    }
}
