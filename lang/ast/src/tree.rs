use std::fmt;

use moonc_lang_miette_util::codespan::Span;

use crate::kind::NodeKind;
use crate::token::Token;

/// Index of a node in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

/// Index of a symbol table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

/// Information attached to a node by the semantic passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meta {
    /// The record declared or referenced by this node.
    pub record: Option<RecordId>,
    /// The scope owned by this node.
    pub table: Option<TableId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Option<Token>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub left_sibling: Option<NodeId>,
    pub right_sibling: Option<NodeId>,
    pub meta: Meta,
}

/// An arena-allocated syntax tree.
///
/// Children are owned through `children`; `parent` and the sibling links
/// are plain indices and only ever read during traversals.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind, token: Option<Token>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            token,
            parent: None,
            children: Vec::new(),
            left_sibling: None,
            right_sibling: None,
            meta: Meta::default(),
        });
        id
    }

    /// Append `children` to the children of `parent`, keeping sibling links consistent.
    pub fn adopt(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            let left = self.nodes[parent.index()].children.last().copied();
            if let Some(left) = left {
                self.nodes[left.index()].right_sibling = Some(child);
            }
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.left_sibling = left;
            node.right_sibling = None;
            self.nodes[parent.index()].children.push(child);
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        self.get(id).token.as_ref()
    }

    /// The lexeme of the node's token, or the empty string.
    pub fn lexeme(&self, id: NodeId) -> &str {
        self.token(id).map(|token| token.lexeme.as_str()).unwrap_or("")
    }

    /// The line of the node's own token, or of the first token below it.
    pub fn line(&self, id: NodeId) -> u32 {
        self.first_token(id).map(|token| token.line).unwrap_or(0)
    }

    /// The span covering all tokens below `id`.
    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.preorder(id)
            .filter_map(|node| self.token(node).map(|token| token.span))
            .reduce(Span::merge)
    }

    pub fn first_token(&self, id: NodeId) -> Option<&Token> {
        self.preorder(id).find_map(|node| self.token(node))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.children(id).get(n).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn meta(&self, id: NodeId) -> Meta {
        self.get(id).meta
    }

    pub fn meta_mut(&mut self, id: NodeId) -> &mut Meta {
        &mut self.get_mut(id).meta
    }

    /// Walk from `id` up to the root, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |node| self.parent(*node))
    }

    /// All nodes of the subtree rooted at `id` in pre-order.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder { ast: self, stack: vec![id] }
    }

    /// Check that parent and sibling links agree with the children lists.
    pub fn links_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(idx, node)| {
            let id = NodeId(idx as u32);
            let parent_ok = match node.parent {
                Some(parent) => self.children(parent).contains(&id),
                None => true,
            };
            let children_ok = node.children.iter().enumerate().all(|(pos, child)| {
                let c = self.get(*child);
                c.parent == Some(id)
                    && c.left_sibling == pos.checked_sub(1).map(|p| node.children[p])
                    && c.right_sibling == node.children.get(pos + 1).copied()
            });
            parent_ok && children_ok
        })
    }

    /// The kinds of the subtree as a nested structure, ignoring tokens.
    pub fn shape(&self, id: NodeId) -> Shape {
        Shape {
            kind: self.kind(id),
            children: self.children(id).iter().map(|child| self.shape(*child)).collect(),
        }
    }
}

pub struct Preorder<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack.extend(self.ast.children(next).iter().rev());
        Some(next)
    }
}

/// The kind structure of a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub kind: NodeKind,
    pub children: Vec<Shape>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn adopt_links_siblings() {
        let mut ast = Ast::new();
        let parent = ast.alloc(NodeKind::IndexList, None);
        let a = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "1", 1, 1)));
        let b = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "2", 1, 4)));
        let c = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "3", 1, 7)));
        ast.adopt(parent, [a, b]);
        ast.adopt(parent, [c]);

        assert_eq!(ast.children(parent), &[a, b, c]);
        assert_eq!(ast.get(b).left_sibling, Some(a));
        assert_eq!(ast.get(b).right_sibling, Some(c));
        assert_eq!(ast.get(c).left_sibling, Some(b));
        assert!(ast.links_consistent());
    }

    #[test]
    fn preorder_visits_parent_first() {
        let mut ast = Ast::new();
        let root = ast.alloc(NodeKind::Factor, None);
        let inner = ast.alloc(NodeKind::Not, None);
        let leaf = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "7", 2, 3)));
        ast.adopt(inner, [leaf]);
        ast.adopt(root, [inner]);

        let kinds: Vec<_> = ast.preorder(root).map(|id| ast.kind(id)).collect();
        assert_eq!(kinds, vec![NodeKind::Factor, NodeKind::Not, NodeKind::IntNum]);
        assert_eq!(ast.line(root), 2);
        assert_eq!(ast.ancestors(leaf).count(), 3);
    }
}
