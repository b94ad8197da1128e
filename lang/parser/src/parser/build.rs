use moonc_lang_ast::{Ast, NodeId, Token};

use crate::grammar::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Mark,
    Node(NodeId),
}

/// The AST-build stack driven by the actions of the grammar.
///
/// Error recovery may drop actions, so every action takes what it finds on
/// the stack instead of insisting on a particular shape.
#[derive(Debug, Default)]
pub struct AstBuilder {
    ast: Ast,
    stack: Vec<Entry>,
}

impl AstBuilder {
    pub fn apply(&mut self, action: Action, last: Option<&Token>) {
        match action {
            Action::Mark => self.stack.push(Entry::Mark),
            Action::Leaf(kind) => {
                let id = self.ast.alloc(kind, last.cloned());
                self.stack.push(Entry::Node(id));
            }
            Action::Node(kind, n) => {
                let mut children = Vec::with_capacity(n);
                while children.len() < n {
                    match self.stack.last() {
                        Some(Entry::Node(id)) => {
                            children.push(*id);
                            self.stack.pop();
                        }
                        _ => break,
                    }
                }
                children.reverse();
                self.push_family(kind, children);
            }
            Action::List(kind) => {
                let mut children = Vec::new();
                while let Some(entry) = self.stack.pop() {
                    match entry {
                        Entry::Node(id) => children.push(id),
                        Entry::Mark => break,
                    }
                }
                children.reverse();
                self.push_family(kind, children);
            }
            Action::Adopt(2) => {
                let Some(right) = self.pop_node() else { return };
                let Some(op) = self.pop_node() else {
                    self.stack.push(Entry::Node(right));
                    return;
                };
                match self.pop_node() {
                    Some(left) => self.ast.adopt(op, [left, right]),
                    None => self.ast.adopt(op, [right]),
                }
                self.stack.push(Entry::Node(op));
            }
            Action::Adopt(_) => {
                let Some(child) = self.pop_node() else { return };
                if let Some(Entry::Node(parent)) = self.stack.last() {
                    self.ast.adopt(*parent, [child]);
                } else {
                    self.stack.push(Entry::Node(child));
                }
            }
        }
    }

    fn pop_node(&mut self) -> Option<NodeId> {
        match self.stack.last() {
            Some(Entry::Node(id)) => {
                let id = *id;
                self.stack.pop();
                Some(id)
            }
            _ => None,
        }
    }

    fn push_family(&mut self, kind: moonc_lang_ast::NodeKind, children: Vec<NodeId>) {
        let id = self.ast.alloc(kind, None);
        self.ast.adopt(id, children);
        self.stack.push(Entry::Node(id));
    }

    /// The finished tree, rooted at the single node left on the stack.
    pub fn finish(mut self) -> Option<Ast> {
        match self.stack.as_slice() {
            [Entry::Node(root)] => {
                self.ast.set_root(*root);
                Some(self.ast)
            }
            _ => None,
        }
    }
}
