//! Expression typing: literals, operators, variables, calls and member chains.

use log::trace;
use miette::SourceSpan;

use moonc_lang_ast::{Ast, NodeId, NodeKind, RecordId, TableId, TokenKind};
use moonc_lang_miette_util::ToMiette;

use super::TypeChecker;
use crate::result::SemanticError;
use crate::symbol_table::{Privacy, Type, signature};

impl TypeChecker<'_> {
    /// The type of an expression, or `None` if it could not be typed. In that
    /// case an error has already been reported for the offending part.
    pub(super) fn type_of(&mut self, ast: &mut Ast, id: NodeId) -> Option<Type> {
        match ast.kind(id) {
            NodeKind::ArithExpr | NodeKind::RelExpr | NodeKind::Factor | NodeKind::Not | NodeKind::Sign => {
                let inner = ast.child(id, 0)?;
                self.type_of(ast, inner)
            }
            NodeKind::IntNum => Some(Type::integer()),
            NodeKind::FloatNum => Some(Type::float()),
            NodeKind::Variable => self.variable_type(ast, id),
            NodeKind::FuncCall => self.call_type(ast, id),
            kind if kind.is_binary_op() => self.operator_type(ast, id),
            kind => {
                trace!("No type for {kind}");
                None
            }
        }
    }

    fn operator_type(&mut self, ast: &mut Ast, id: NodeId) -> Option<Type> {
        let (left, right) = (ast.child(id, 0)?, ast.child(id, 1)?);
        let left = self.type_of(ast, left);
        let right = self.type_of(ast, right);
        let (left, right) = (left?, right?);
        if !left.equals_no_privacy(&right) {
            self.errors.push(SemanticError::TypeMismatch {
                context: format!("operator '{}'", ast.lexeme(id)),
                left: left.to_string(),
                right: right.to_string(),
                line: ast.line(id),
                span: ast.span(id).to_miette(),
            });
            return None;
        }
        if ast.kind(id).is_rel_op() { Some(Type::integer()) } else { Some(left) }
    }

    /// The struct table of the value a member chain continues from, if there is
    /// a subject at all. `Err(())` when the subject is not a struct scalar.
    fn subject_table(&mut self, ast: &mut Ast, id: NodeId, member: &str) -> Result<Option<TableId>, ()> {
        let Some(subject) = ast.child(id, 0).and_then(|subject| ast.child(subject, 0)) else {
            return Ok(None);
        };
        let ty = self.type_of(ast, subject).ok_or(())?;
        match ty.struct_name() {
            Some(name) if ty.is_scalar() => self.tables.struct_table(name).map(Some).ok_or(()),
            _ => {
                self.errors.push(SemanticError::FieldAccessOnNonStruct {
                    name: member.to_owned(),
                    ty: ty.to_string(),
                    line: ast.line(id),
                    span: ast.span(id).to_miette(),
                });
                Err(())
            }
        }
    }

    /// Private members are only visible inside the methods of their struct.
    fn check_privacy(&mut self, ast: &Ast, id: NodeId, record: RecordId) {
        let record = self.tables.record(record);
        if record.privacy != Privacy::Private || self.current_struct() == Some(record.parent) {
            return;
        }
        self.errors.push(SemanticError::PrivateMemberAccess {
            structure: self.tables.table(record.parent).name.clone(),
            name: record.name.clone(),
            line: ast.line(id),
            span: ast.span(id).to_miette(),
        });
    }

    fn variable_type(&mut self, ast: &mut Ast, id: NodeId) -> Option<Type> {
        let name_node = ast.child(id, 1)?;
        let name = ast.lexeme(name_node).to_owned();
        let line = ast.line(id);
        let span = ast.span(id).to_miette();
        let indices = ast.child(id, 2).map(|list| ast.children(list).to_vec()).unwrap_or_default();
        for (position, index) in indices.iter().enumerate() {
            let Some(ty) = self.type_of(ast, *index) else { continue };
            if !ty.equals_no_privacy(&Type::integer()) {
                self.errors.push(SemanticError::NonIntegerIndex {
                    name: name.clone(),
                    position: position + 1,
                    ty: ty.to_string(),
                    line,
                    span,
                });
            }
        }

        let is_self = ast.token(name_node).is_some_and(|token| token.kind == TokenKind::SelfKw);
        let record = match self.subject_table(ast, id, &name).ok()? {
            Some(table) => {
                let found = self.tables.find_variable(table, &name);
                if let Some(record) = found {
                    self.check_privacy(ast, id, record);
                }
                found.ok_or_else(|| format!("{}::{name}", self.tables.table(table).name))
            }
            None if is_self => {
                let Some(table) = self.current_struct() else {
                    self.errors.push(SemanticError::SelfOutsideMethod { line, span });
                    return None;
                };
                let ty = Type::named(self.tables.table(table).name.clone());
                return self.subscripted(&name, ty, &indices, line, span);
            }
            None => self.tables.lookup_variable(self.scope, &name).ok_or_else(|| name.clone()),
        };
        let record = match record {
            Ok(record) => record,
            Err(name) => {
                self.errors.push(SemanticError::UndeclaredIdentifier { name, line, span });
                return None;
            }
        };
        ast.meta_mut(id).record = Some(record);
        let declared = self.tables.record(record).ty.clone();
        self.subscripted(&name, declared, &indices, line, span)
    }

    /// Reduce the dimensions of `declared` by the number of subscripts.
    fn subscripted(
        &mut self,
        name: &str,
        declared: Type,
        indices: &[NodeId],
        line: u32,
        span: Option<SourceSpan>,
    ) -> Option<Type> {
        if indices.len() > declared.dims.len() {
            self.errors.push(SemanticError::SubscriptArity {
                name: name.to_owned(),
                declared: declared.dims.len(),
                supplied: indices.len(),
                line,
                span,
            });
            return None;
        }
        Some(declared.indexed(indices.len()))
    }

    fn call_type(&mut self, ast: &mut Ast, id: NodeId) -> Option<Type> {
        let name_node = ast.child(id, 1)?;
        let name = ast.lexeme(name_node).to_owned();
        let line = ast.line(id);
        let span = ast.span(id).to_miette();
        let args = ast.child(id, 2).map(|list| ast.children(list).to_vec()).unwrap_or_default();
        let arg_types: Vec<Option<Type>> = args.iter().map(|arg| self.type_of(ast, *arg)).collect();

        let candidates: Vec<RecordId> = match self.subject_table(ast, id, &name).ok()? {
            Some(table) => self
                .tables
                .with_ancestors(table)
                .into_iter()
                .flat_map(|t| self.tables.functions(t, &name))
                .collect(),
            None => self.tables.lookup_functions(self.scope, &name),
        };
        if candidates.is_empty() {
            self.errors.push(SemanticError::UndeclaredIdentifier { name, line, span });
            return None;
        }
        let arg_types: Vec<Type> = arg_types.into_iter().collect::<Option<_>>()?;

        let chosen = candidates.into_iter().find(|candidate| {
            let params = &self.tables.record(*candidate).params;
            params.len() == arg_types.len() && params.iter().zip(&arg_types).all(|(p, a)| p.matches_param(a))
        });
        let Some(chosen) = chosen else {
            self.errors.push(SemanticError::NoMatchingOverload {
                call: signature(&name, &arg_types),
                name,
                line,
                span,
            });
            return None;
        };
        self.check_privacy(ast, id, chosen);
        ast.meta_mut(id).record = Some(chosen);
        trace!("Resolved {name} to {}", self.tables.record(chosen).signature());
        Some(self.tables.record(chosen).ty.clone())
    }
}
