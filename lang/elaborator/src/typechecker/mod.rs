//! Second pass: resolve identifiers and type every statement and expression.

mod expr;

use log::debug;

use moonc_lang_ast::{Ast, NodeId, RecordId, TableId, Visitor};
use moonc_lang_miette_util::ToMiette;

use crate::result::SemanticError;
use crate::symbol_table::{SymbolTables, Type};

/// Type-check the program in `ast`, whose symbol tables have already been built.
///
/// Errors are appended to `errors` in visiting order.
pub fn check_types(ast: &mut Ast, tables: &mut SymbolTables, errors: &mut Vec<SemanticError>) {
    let global = tables.global();
    let mut checker = TypeChecker { tables, errors, scope: global, function: None };
    if let Some(root) = ast.root() {
        checker.visit(ast, root);
    }
}

pub(crate) struct TypeChecker<'a> {
    tables: &'a mut SymbolTables,
    errors: &'a mut Vec<SemanticError>,
    /// The innermost scope of the node being visited.
    scope: TableId,
    /// The function whose body is being visited.
    function: Option<RecordId>,
}

impl Visitor for TypeChecker<'_> {
    fn visit_func_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.check_return_type(ast, id);
        self.visit_children(ast, id);
    }

    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) {
        let meta = ast.meta(id);
        // Duplicates were reported by the symbol table pass and own no scope.
        let Some(scope) = meta.table else { return };
        debug!("Checking {}", self.tables.table(scope).name);
        self.check_return_type(ast, id);

        let outer = (self.scope, self.function);
        self.scope = scope;
        self.function = meta.record;
        self.visit_children(ast, id);
        (self.scope, self.function) = outer;
    }

    fn visit_func_def_param(&mut self, ast: &mut Ast, id: NodeId) {
        self.check_declared_type(ast, id);
    }

    fn visit_var_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.check_declared_type(ast, id);
    }

    fn visit_assign(&mut self, ast: &mut Ast, id: NodeId) {
        let (Some(lhs), Some(rhs)) = (ast.child(id, 0), ast.child(id, 1)) else { return };
        let left = self.type_of(ast, lhs);
        let right = self.type_of(ast, rhs);
        if let (Some(left), Some(right)) = (left, right) {
            if !left.equals_no_privacy(&right) {
                self.errors.push(SemanticError::TypeMismatch {
                    context: "assignment".to_owned(),
                    left: left.to_string(),
                    right: right.to_string(),
                    line: ast.line(id),
                    span: ast.span(id).to_miette(),
                });
            }
        }
    }

    fn visit_return(&mut self, ast: &mut Ast, id: NodeId) {
        let Some(expr) = ast.child(id, 0) else { return };
        let actual = self.type_of(ast, expr);
        let Some(function) = self.function else { return };
        let function = self.tables.record(function);
        if let Some(actual) = actual {
            if !actual.equals_no_privacy(&function.ty) {
                self.errors.push(SemanticError::MismatchedReturnType {
                    func: function.name.clone(),
                    expected: function.ty.to_string(),
                    actual: actual.to_string(),
                    line: ast.line(id),
                    span: ast.span(id).to_miette(),
                });
            }
        }
    }

    fn visit_if(&mut self, ast: &mut Ast, id: NodeId) {
        self.check_branches(ast, id);
    }

    fn visit_while(&mut self, ast: &mut Ast, id: NodeId) {
        self.check_branches(ast, id);
    }

    fn visit_read(&mut self, ast: &mut Ast, id: NodeId) {
        if let Some(target) = ast.child(id, 0) {
            self.type_of(ast, target);
        }
    }

    fn visit_write(&mut self, ast: &mut Ast, id: NodeId) {
        if let Some(expr) = ast.child(id, 0) {
            self.type_of(ast, expr);
        }
    }

    fn visit_func_call(&mut self, ast: &mut Ast, id: NodeId) {
        self.type_of(ast, id);
    }
}

impl TypeChecker<'_> {
    /// Type the predicate, then visit the blocks.
    fn check_branches(&mut self, ast: &mut Ast, id: NodeId) {
        let children = ast.children(id).to_vec();
        let Some((predicate, blocks)) = children.split_first() else { return };
        self.type_of(ast, *predicate);
        for block in blocks {
            self.visit(ast, *block);
        }
    }

    /// A declared struct type must name a struct. Patches the record's type table.
    fn check_declared_type(&mut self, ast: &mut Ast, id: NodeId) {
        let ty = match ast.meta(id).record {
            Some(record) => self.tables.record(record).ty.clone(),
            None => Type::from_decl(ast, id),
        };
        let table = self.resolve_struct(ast, id, &ty);
        if let (Some(record), Some(table)) = (ast.meta(id).record, table) {
            self.tables.record_mut(record).type_table = Some(table);
        }
    }

    fn check_return_type(&mut self, ast: &mut Ast, id: NodeId) {
        let Some(ret) = ast.child(id, 2) else { return };
        let ty = Type::from_decl(ast, ret);
        self.resolve_struct(ast, ret, &ty);
    }

    fn resolve_struct(&mut self, ast: &Ast, id: NodeId, ty: &Type) -> Option<TableId> {
        let name = ty.struct_name()?;
        let table = self.tables.struct_table(name);
        if table.is_none() {
            self.errors.push(SemanticError::MalformedCustomType {
                name: name.to_owned(),
                line: ast.line(id),
                span: ast.span(id).to_miette(),
            });
        }
        table
    }

    /// The struct whose method is being checked.
    fn current_struct(&self) -> Option<TableId> {
        self.tables.enclosing_struct(self.scope)
    }
}
