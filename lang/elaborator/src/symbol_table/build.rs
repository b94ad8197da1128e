//! First pass: enter every declaration into the symbol tables.
//!
//! A struct and its impl may come in either order. Whichever comes first
//! creates a partial struct table, the second one completes it by matching
//! method declarations with method definitions.

use log::debug;
use miette::SourceSpan;

use moonc_lang_ast::{Ast, HashSet, Meta, NodeId, NodeKind, RecordId, TableId, Visitor};
use moonc_lang_miette_util::{FromMiette, ToMiette};

use super::{Privacy, Record, RecordKind, StructState, SymbolTables, TableKind, Type, invalid_dims, signature};
use crate::result::{SemanticError, Warning};

pub fn build_symbol_tables(ast: &mut Ast) -> (SymbolTables, Vec<SemanticError>) {
    let mut builder = SymbolTableBuilder::default();
    if let Some(root) = ast.root() {
        builder.visit(ast, root);
    }
    (builder.tables, builder.errors)
}

#[derive(Default)]
struct SymbolTableBuilder {
    tables: SymbolTables,
    errors: Vec<SemanticError>,
}

/// The parts of a function header needed before its scope exists.
struct Header {
    name: String,
    params: Vec<Type>,
    ret: Type,
    line: u32,
    span: Option<SourceSpan>,
}

impl Header {
    fn read(ast: &Ast, id: NodeId) -> Header {
        let (name, line, span) = name_of(ast, id);
        let params = param_nodes(ast, id).iter().map(|param| Type::from_decl(ast, *param)).collect();
        let ret = ast.child(id, 2).map(|ret| Type::from_decl(ast, ret)).unwrap_or_else(Type::void);
        Header { name, params, ret, line, span }
    }

    fn signature(&self) -> String {
        signature(&self.name, &self.params)
    }
}

fn name_of(ast: &Ast, id: NodeId) -> (String, u32, Option<SourceSpan>) {
    match ast.child(id, 0) {
        Some(name) => (ast.lexeme(name).to_owned(), ast.line(name), ast.span(name).to_miette()),
        None => (String::new(), ast.line(id), ast.span(id).to_miette()),
    }
}

fn param_nodes(ast: &Ast, func: NodeId) -> Vec<NodeId> {
    ast.child(func, 1).map(|params| ast.children(params).to_vec()).unwrap_or_default()
}

fn local_decls(ast: &Ast, func: NodeId) -> Vec<NodeId> {
    ast.child(func, 3)
        .map(|body| {
            ast.children(body).iter().copied().filter(|s| ast.kind(*s) == NodeKind::VarDecl).collect()
        })
        .unwrap_or_default()
}

impl Visitor for SymbolTableBuilder {
    fn visit_prog(&mut self, ast: &mut Ast, id: NodeId) {
        ast.meta_mut(id).table = Some(self.tables.global());
        self.visit_children(ast, id);
        self.check_completion();
        self.resolve_inheritance();
        self.warn_shadowed_members();
        self.warn_overloads();
    }

    fn visit_struct_decl(&mut self, ast: &mut Ast, id: NodeId) {
        let (name, line, span) = name_of(ast, id);
        debug!("Entering struct {name}");
        let Some((record, table)) = self.struct_entry(&name, RecordKind::StructDecl, line, span) else {
            return;
        };
        self.tables.record_mut(record).node = Some(id);
        *ast.meta_mut(id) = Meta { record: Some(record), table: Some(table) };

        let inherits = ast
            .child(id, 1)
            .map(|list| ast.children(list).iter().map(|p| ast.lexeme(*p).to_owned()).collect())
            .unwrap_or_default();
        let implemented = {
            let state = self.state_mut(table);
            state.declared = true;
            state.inherits = inherits;
            state.implemented
        };

        let members = ast.child(id, 2).map(|list| ast.children(list).to_vec()).unwrap_or_default();
        let mut matched = HashSet::default();
        for member in members {
            let privacy = match ast.child(member, 0).map(|vis| ast.kind(vis)) {
                Some(NodeKind::Private) => Privacy::Private,
                _ => Privacy::Public,
            };
            let Some(decl) = ast.child(member, 1) else { continue };
            let record = match ast.kind(decl) {
                NodeKind::VarDecl => self.data_member(ast, decl, table, privacy),
                NodeKind::FuncDecl => {
                    self.method_decl(ast, decl, table, &name, privacy, implemented, &mut matched)
                }
                _ => None,
            };
            ast.meta_mut(member).record = record;
        }

        if implemented {
            let unmatched: Vec<RecordId> = self
                .tables
                .entries(table)
                .filter(|(rec_id, rec)| rec.kind == RecordKind::FuncDef && !matched.contains(rec_id))
                .map(|(rec_id, _)| rec_id)
                .collect();
            for def in unmatched {
                let def = self.tables.record(def);
                self.errors.push(SemanticError::StructMissingMethodFromImpl {
                    structure: name.clone(),
                    sig: def.signature(),
                    line: def.line,
                    span: def.span.to_miette(),
                });
            }
            self.state_mut(table).complete = true;
        } else {
            let has_methods = self.tables.entries(table).any(|(_, rec)| rec.kind.is_function());
            self.state_mut(table).complete = !has_methods;
        }
    }

    fn visit_impl_def(&mut self, ast: &mut Ast, id: NodeId) {
        let (name, line, span) = name_of(ast, id);
        debug!("Entering impl {name}");
        let Some((record, table)) = self.struct_entry(&name, RecordKind::ImplDef, line, span) else {
            return;
        };
        *ast.meta_mut(id) = Meta { record: Some(record), table: Some(table) };
        let declared = {
            let state = self.state_mut(table);
            state.implemented = true;
            state.declared
        };

        let defs = ast.child(id, 1).map(|list| ast.children(list).to_vec()).unwrap_or_default();
        for def in defs {
            if ast.kind(def) != NodeKind::FuncDef {
                self.errors.push(SemanticError::ImplMayOnlyContainFuncDefs {
                    name: name.clone(),
                    line: ast.line(def),
                    span: ast.span(def).to_miette(),
                });
                continue;
            }
            self.method_def(ast, def, table, &name, declared);
        }

        if declared {
            let missing: Vec<RecordId> = self
                .tables
                .entries(table)
                .filter(|(_, rec)| rec.kind == RecordKind::FuncDecl)
                .map(|(rec_id, _)| rec_id)
                .collect();
            for decl in missing {
                let decl = self.tables.record(decl);
                self.errors.push(SemanticError::ImplMissingMethodFromStruct {
                    structure: name.clone(),
                    sig: decl.signature(),
                    line: decl.line,
                    span: decl.span.to_miette(),
                });
            }
        }
        self.state_mut(table).complete = declared;
    }

    /// Free functions. Methods are entered by their struct or impl.
    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) {
        let header = Header::read(ast, id);
        let global = self.tables.global();
        if let Some(first) = self.same_signature(global, &header, RecordKind::FuncDef) {
            self.duplicate(&header.name, first, header.line, header.span);
            return;
        }
        let scope_name = header.signature();
        let scope = self.tables.add_table(scope_name, TableKind::Function, global);
        self.enter_function(ast, id, &header, global, None, RecordKind::FuncDef, Privacy::None, scope);
    }
}

impl SymbolTableBuilder {
    fn state_mut(&mut self, table: TableId) -> &mut StructState {
        match self.tables.table_mut(table).struct_state_mut() {
            Some(state) => state,
            None => unreachable!("struct records always link to struct tables"),
        }
    }

    fn duplicate(&mut self, name: &str, first: RecordId, line: u32, span: Option<SourceSpan>) {
        let first_line = self.tables.record(first).line;
        self.errors.push(SemanticError::DuplicateIdentifier { name: name.to_owned(), first_line, line, span });
    }

    /// The global record and table for a struct, creating them for the first
    /// of its declaration and impl. `None` if this part was already seen.
    fn struct_entry(
        &mut self,
        name: &str,
        kind: RecordKind,
        line: u32,
        span: Option<SourceSpan>,
    ) -> Option<(RecordId, TableId)> {
        let global = self.tables.global();
        let existing = self.tables.entries(global).find(|(_, rec)| rec.kind.is_struct() && rec.name == name);
        match existing.map(|(id, rec)| (id, rec.link)) {
            Some((record, Some(table))) => {
                let state = self.state_mut(table);
                let seen = match kind {
                    RecordKind::StructDecl => state.declared,
                    _ => state.implemented,
                };
                if seen {
                    self.duplicate(name, record, line, span);
                    return None;
                }
                if kind == RecordKind::StructDecl {
                    let rec = self.tables.record_mut(record);
                    rec.kind = RecordKind::StructDecl;
                    rec.line = line;
                    rec.span = span.from_miette();
                }
                Some((record, table))
            }
            _ => {
                let table = self.tables.add_table(name, TableKind::Struct(StructState::default()), global);
                let mut rec = Record::new(name, kind, Type::named(name));
                rec.link = Some(table);
                rec.line = line;
                rec.span = span.from_miette();
                let record = self.tables.add_record(global, rec);
                Some((record, table))
            }
        }
    }

    fn same_signature(&self, table: TableId, header: &Header, kind: RecordKind) -> Option<RecordId> {
        self.tables
            .entries(table)
            .find(|(_, rec)| {
                rec.kind == kind
                    && rec.name == header.name
                    && rec.params.len() == header.params.len()
                    && rec.params.iter().zip(&header.params).all(|(a, b)| a.equals_no_privacy(b))
            })
            .map(|(id, _)| id)
    }

    fn variable(&self, ast: &Ast, id: NodeId, kind: RecordKind, privacy: Privacy) -> Record {
        let (name, line, span) = name_of(ast, id);
        let mut record = Record::new(name, kind, Type::from_decl(ast, id));
        record.privacy = privacy;
        record.node = Some(id);
        record.line = line;
        record.span = span.from_miette();
        record
    }

    /// Enter a variable into `table` unless another variable has the same name.
    fn enter_variable(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        table: TableId,
        at: Option<usize>,
        kind: RecordKind,
        privacy: Privacy,
    ) -> Option<RecordId> {
        let record = self.variable(ast, id, kind, privacy);
        for dim in invalid_dims(ast, id) {
            self.errors.push(SemanticError::InvalidDimension {
                name: record.name.clone(),
                dim: ast.lexeme(dim).to_owned(),
                line: ast.line(dim),
                span: ast.span(dim).to_miette(),
            });
        }
        let existing = self.tables.entries(table).find(|(_, rec)| rec.kind.is_variable() && rec.name == record.name);
        if let Some((first, _)) = existing {
            self.duplicate(&record.name, first, record.line, record.span.to_miette());
            return None;
        }
        let rec_id = match at {
            Some(at) => self.tables.insert_record(table, at, record),
            None => self.tables.add_record(table, record),
        };
        ast.meta_mut(id).record = Some(rec_id);
        Some(rec_id)
    }

    /// Data members come before methods, whichever part of the struct was seen first.
    fn data_member(&mut self, ast: &mut Ast, id: NodeId, table: TableId, privacy: Privacy) -> Option<RecordId> {
        let at = self.tables.entries(table).take_while(|(_, rec)| rec.kind.is_variable()).count();
        self.enter_variable(ast, id, table, Some(at), RecordKind::VarDecl, privacy)
    }

    #[allow(clippy::too_many_arguments)]
    fn enter_function(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        header: &Header,
        table: TableId,
        at: Option<usize>,
        kind: RecordKind,
        privacy: Privacy,
        scope: TableId,
    ) -> RecordId {
        let mut record = Record::new(header.name.clone(), kind, header.ret.clone());
        record.params = header.params.clone();
        record.privacy = privacy;
        record.link = Some(scope);
        record.node = Some(id);
        record.line = header.line;
        record.span = header.span.from_miette();
        let rec_id = match at {
            Some(at) => self.tables.insert_record(table, at, record),
            None => self.tables.add_record(table, record),
        };
        *ast.meta_mut(id) = Meta { record: Some(rec_id), table: Some(scope) };

        for param in param_nodes(ast, id) {
            self.enter_variable(ast, param, scope, None, RecordKind::FuncDefParam, Privacy::None);
        }
        for local in local_decls(ast, id) {
            self.enter_variable(ast, local, scope, None, RecordKind::VarDecl, Privacy::None);
        }
        rec_id
    }

    #[allow(clippy::too_many_arguments)]
    fn method_decl(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        table: TableId,
        structure: &str,
        privacy: Privacy,
        implemented: bool,
        matched: &mut HashSet<RecordId>,
    ) -> Option<RecordId> {
        let header = Header::read(ast, id);
        if let Some(first) = self.same_signature(table, &header, RecordKind::FuncDecl) {
            self.duplicate(&header.name, first, header.line, header.span);
            return None;
        }
        if implemented {
            if let Some(def) = self.same_signature(table, &header, RecordKind::FuncDef) {
                self.check_method_types(structure, &header, def);
                self.tables.record_mut(def).privacy = privacy;
                matched.insert(def);
                ast.meta_mut(id).record = Some(def);
                return Some(def);
            }
            self.errors.push(SemanticError::ImplMissingMethodFromStruct {
                structure: structure.to_owned(),
                sig: header.signature(),
                line: header.line,
                span: header.span,
            });
        }
        let scope = self.tables.add_table(format!("{structure}::{}", header.signature()), TableKind::Function, table);
        Some(self.enter_function(ast, id, &header, table, None, RecordKind::FuncDecl, privacy, scope))
    }

    fn method_def(&mut self, ast: &mut Ast, id: NodeId, table: TableId, structure: &str, declared: bool) {
        let header = Header::read(ast, id);
        if let Some(first) = self.same_signature(table, &header, RecordKind::FuncDef) {
            self.duplicate(&header.name, first, header.line, header.span);
            return;
        }
        let decl = if declared { self.same_signature(table, &header, RecordKind::FuncDecl) } else { None };
        match decl {
            Some(decl) => {
                self.check_method_types(structure, &header, decl);
                let (privacy, scope) = {
                    let decl = self.tables.record(decl);
                    (decl.privacy, decl.link)
                };
                let at = self.tables.table(table).entries.iter().position(|e| *e == decl);
                self.tables.unlink(decl);
                let scope = match scope {
                    Some(scope) => {
                        self.tables.table_mut(scope).entries.clear();
                        scope
                    }
                    None => self.method_scope(table, structure, &header),
                };
                self.enter_function(ast, id, &header, table, at, RecordKind::FuncDef, privacy, scope);
            }
            None => {
                if declared {
                    self.errors.push(SemanticError::StructMissingMethodFromImpl {
                        structure: structure.to_owned(),
                        sig: header.signature(),
                        line: header.line,
                        span: header.span,
                    });
                }
                let scope = self.method_scope(table, structure, &header);
                self.enter_function(ast, id, &header, table, None, RecordKind::FuncDef, Privacy::Public, scope);
            }
        }
    }

    fn method_scope(&mut self, table: TableId, structure: &str, header: &Header) -> TableId {
        self.tables.add_table(format!("{structure}::{}", header.signature()), TableKind::Function, table)
    }

    fn check_method_types(&mut self, structure: &str, header: &Header, other: RecordId) {
        let other = self.tables.record(other);
        if !other.ty.equals_no_privacy(&header.ret) {
            let (declared, implemented) = match other.kind {
                RecordKind::FuncDecl => (other.ty.to_string(), header.ret.to_string()),
                _ => (header.ret.to_string(), other.ty.to_string()),
            };
            self.errors.push(SemanticError::MethodMismatch {
                structure: structure.to_owned(),
                struct_sig: header.signature(),
                declared,
                implemented,
                line: header.line,
                span: header.span,
            });
        }
    }

    fn check_completion(&mut self) {
        for table in self.tables.struct_tables() {
            let Some(state) = self.tables.table(table).struct_state() else { continue };
            if state.complete {
                continue;
            }
            let name = self.tables.table(table).name.clone();
            let (line, span) = self.struct_position(&name);
            let err = if !state.declared {
                SemanticError::ImplMissingStruct { name, line, span }
            } else {
                SemanticError::StructMissingImpl { name, line, span }
            };
            self.errors.push(err);
        }
    }

    fn struct_position(&self, name: &str) -> (u32, Option<SourceSpan>) {
        let global = self.tables.global();
        self.tables
            .entries(global)
            .find(|(_, rec)| rec.kind.is_struct() && rec.name == name)
            .map(|(_, rec)| (rec.line, rec.span.to_miette()))
            .unwrap_or((0, None))
    }

    fn resolve_inheritance(&mut self) {
        let structs = self.tables.struct_tables();
        for table in &structs {
            let name = self.tables.table(*table).name.clone();
            let inherits = self.tables.table(*table).struct_state().map(|s| s.inherits.clone()).unwrap_or_default();
            let mut inherited = Vec::new();
            for parent in inherits {
                match self.tables.struct_table(&parent) {
                    Some(parent) => inherited.push(parent),
                    None => {
                        let (line, span) = self.struct_position(&name);
                        self.errors.push(SemanticError::UndeclaredIdentifier { name: parent, line, span });
                    }
                }
            }
            self.state_mut(*table).inherited = inherited;
        }
        for table in structs {
            let parents = self.tables.table(table).struct_state().map(|s| s.inherited.clone()).unwrap_or_default();
            if parents.iter().any(|p| self.tables.with_ancestors(*p).contains(&table)) {
                let name = self.tables.table(table).name.clone();
                let (line, span) = self.struct_position(&name);
                self.errors.push(SemanticError::CyclicInheritance { name, line, span });
            }
        }
    }

    fn warn_shadowed_members(&mut self) {
        for table in self.tables.struct_tables() {
            let ancestors = self.tables.with_ancestors(table);
            let structure = self.tables.table(table).name.clone();
            let own: Vec<RecordId> =
                self.tables.entries(table).filter(|(_, r)| r.kind == RecordKind::VarDecl).map(|(id, _)| id).collect();
            for member in own {
                let member = self.tables.record(member);
                let shadowed = ancestors[1..].iter().find(|ancestor| {
                    self.tables
                        .entries(**ancestor)
                        .any(|(_, rec)| rec.kind == RecordKind::VarDecl && rec.name == member.name)
                });
                if let Some(parent) = shadowed {
                    let warning = Warning::ShadowedInheritedMember {
                        structure: structure.clone(),
                        name: member.name.clone(),
                        parent: self.tables.table(*parent).name.clone(),
                        line: member.line,
                        span: member.span.to_miette(),
                    };
                    self.errors.push(warning.into());
                }
            }
        }
    }

    fn warn_overloads(&mut self) {
        let mut scopes = vec![self.tables.global()];
        scopes.extend(self.tables.struct_tables());
        for table in scopes {
            let mut names: Vec<&str> = Vec::new();
            for (_, rec) in self.tables.entries(table) {
                if rec.kind.is_function() && !names.contains(&rec.name.as_str()) {
                    names.push(&rec.name);
                }
            }
            let mut warnings = Vec::new();
            for name in names {
                let overloads = self.tables.functions(table, name);
                if overloads.len() < 2 {
                    continue;
                }
                let signatures: Vec<String> =
                    overloads.iter().map(|rec| self.tables.record(*rec).signature()).collect();
                let qualified = match self.tables.table(table).kind {
                    TableKind::Struct(_) => format!("{}::{name}", self.tables.table(table).name),
                    _ => name.to_owned(),
                };
                warnings.push(Warning::OverloadNotice {
                    name: qualified,
                    count: overloads.len(),
                    signatures: signatures.join(", "),
                    span: self.tables.record(overloads[0]).span.to_miette(),
                });
            }
            self.errors.extend(warnings.into_iter().map(SemanticError::from));
        }
    }
}
