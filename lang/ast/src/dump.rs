use std::fmt;

use crate::tree::{Ast, NodeId};

/// Renders the tree one node per line, prefixed with `| ` per level of depth.
///
/// Leaves that carry a token show it as `Kind: lexeme`.
pub struct Dump<'a> {
    ast: &'a Ast,
}

impl Ast {
    pub fn dump(&self) -> Dump<'_> {
        Dump { ast: self }
    }
}

impl Dump<'_> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("| ")?;
        }
        write!(f, "{}", self.ast.kind(id))?;
        if let Some(token) = self.ast.token(id) {
            write!(f, ": {}", token.lexeme)?;
        }
        writeln!(f)?;
        for child in self.ast.children(id) {
            self.write_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ast.root() {
            Some(root) => self.write_node(f, root, 0),
            None => Ok(()),
        }
    }
}
