use crate::kind::NodeKind;
use crate::tree::{Ast, NodeId};

/// A pre-order walk over the AST with one hook per node kind of interest.
///
/// Every hook defaults to visiting the children, so an implementation only
/// overrides the kinds it cares about. A hook that overrides the default
/// decides itself whether and in which order the children are visited.
pub trait Visitor {
    fn visit(&mut self, ast: &mut Ast, id: NodeId) {
        use NodeKind::*;
        match ast.kind(id) {
            Prog => self.visit_prog(ast, id),
            StructDecl => self.visit_struct_decl(ast, id),
            ImplDef => self.visit_impl_def(ast, id),
            Member => self.visit_member(ast, id),
            FuncDecl => self.visit_func_decl(ast, id),
            FuncDef => self.visit_func_def(ast, id),
            FuncDefParam => self.visit_func_def_param(ast, id),
            VarDecl => self.visit_var_decl(ast, id),
            Assign => self.visit_assign(ast, id),
            If => self.visit_if(ast, id),
            While => self.visit_while(ast, id),
            Read => self.visit_read(ast, id),
            Write => self.visit_write(ast, id),
            Return => self.visit_return(ast, id),
            FuncCall => self.visit_func_call(ast, id),
            Variable => self.visit_variable(ast, id),
            Factor => self.visit_factor(ast, id),
            Not => self.visit_not(ast, id),
            Sign => self.visit_sign(ast, id),
            IntNum => self.visit_int_num(ast, id),
            FloatNum => self.visit_float_num(ast, id),
            kind if kind.is_binary_op() => self.visit_binary_op(ast, id),
            _ => self.visit_children(ast, id),
        }
    }

    fn visit_children(&mut self, ast: &mut Ast, id: NodeId) {
        for child in ast.children(id).to_vec() {
            self.visit(ast, child);
        }
    }

    fn visit_prog(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_struct_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_impl_def(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_member(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_func_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_func_def_param(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_var_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_assign(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_if(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_while(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_read(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_write(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_return(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_func_call(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_variable(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_factor(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_not(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_sign(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_int_num(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_float_num(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }

    fn visit_binary_op(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    #[derive(Default)]
    struct CountLiterals {
        ints: usize,
        ops: usize,
    }

    impl Visitor for CountLiterals {
        fn visit_int_num(&mut self, _ast: &mut Ast, _id: NodeId) {
            self.ints += 1;
        }

        fn visit_binary_op(&mut self, ast: &mut Ast, id: NodeId) {
            self.ops += 1;
            self.visit_children(ast, id);
        }
    }

    #[test]
    fn default_hooks_recurse() {
        let mut ast = Ast::new();
        let expr = ast.alloc(NodeKind::ArithExpr, None);
        let plus = ast.alloc(NodeKind::Plus, Some(Token::new(TokenKind::Plus, "+", 1, 3)));
        let left = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "1", 1, 1)));
        let right = ast.alloc(NodeKind::IntNum, Some(Token::new(TokenKind::IntNum, "5", 1, 5)));
        ast.adopt(plus, [left, right]);
        ast.adopt(expr, [plus]);

        let mut counter = CountLiterals::default();
        counter.visit(&mut ast, expr);
        assert_eq!(counter.ints, 2);
        assert_eq!(counter.ops, 1);
    }
}
