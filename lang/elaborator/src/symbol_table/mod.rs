//! Symbol tables: an arena of scopes and the records they contain.

pub mod build;
pub mod render;
mod ty;

use std::fmt;

use moonc_lang_ast::{NodeId, RecordId, TableId};
use moonc_lang_miette_util::codespan::Span;

pub use ty::{BaseType, Type, invalid_dims, signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privacy {
    Public,
    Private,
    /// Locals, parameters and free functions.
    None,
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privacy::Public => f.write_str("public"),
            Privacy::Private => f.write_str("private"),
            Privacy::None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    VarDecl,
    FuncDecl,
    FuncDef,
    FuncDefParam,
    StructDecl,
    ImplDef,
}

impl RecordKind {
    pub fn is_function(self) -> bool {
        matches!(self, RecordKind::FuncDecl | RecordKind::FuncDef)
    }

    pub fn is_variable(self) -> bool {
        matches!(self, RecordKind::VarDecl | RecordKind::FuncDefParam)
    }

    pub fn is_struct(self) -> bool {
        matches!(self, RecordKind::StructDecl | RecordKind::ImplDef)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::VarDecl => "var",
            RecordKind::FuncDecl => "func decl",
            RecordKind::FuncDef => "func",
            RecordKind::FuncDefParam => "param",
            RecordKind::StructDecl => "struct",
            RecordKind::ImplDef => "impl",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub kind: RecordKind,
    /// Declared type of a variable, return type of a function.
    pub ty: Type,
    pub params: Vec<Type>,
    pub privacy: Privacy,
    /// The scope this record owns.
    pub link: Option<TableId>,
    /// The table this record is entered in.
    pub parent: TableId,
    /// The struct table of a variable of struct type, set by the type checker.
    pub type_table: Option<TableId>,
    pub size: Option<u32>,
    pub offset: Option<u32>,
    pub node: Option<NodeId>,
    pub line: u32,
    pub span: Option<Span>,
}

impl Record {
    pub fn new(name: impl Into<String>, kind: RecordKind, ty: Type) -> Self {
        Record {
            name: name.into(),
            kind,
            ty,
            params: Vec::new(),
            privacy: Privacy::None,
            link: None,
            parent: TableId(0),
            type_table: None,
            size: None,
            offset: None,
            node: None,
            line: 0,
            span: None,
        }
    }

    pub fn signature(&self) -> String {
        signature(&self.name, &self.params)
    }

    /// Same name and parameter types.
    pub fn same_signature(&self, other: &Record) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self.params.iter().zip(&other.params).all(|(a, b)| a.equals_no_privacy(b))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructState {
    /// All methods are matched between the declaration and the impl.
    pub complete: bool,
    pub declared: bool,
    pub implemented: bool,
    /// Parent names as written.
    pub inherits: Vec<String>,
    /// Resolved parents.
    pub inherited: Vec<TableId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKind {
    Global,
    Struct(StructState),
    Function,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    pub parent: Option<TableId>,
    pub entries: Vec<RecordId>,
}

impl Table {
    pub fn struct_state(&self) -> Option<&StructState> {
        match &self.kind {
            TableKind::Struct(state) => Some(state),
            _ => None,
        }
    }

    pub fn struct_state_mut(&mut self) -> Option<&mut StructState> {
        match &mut self.kind {
            TableKind::Struct(state) => Some(state),
            _ => None,
        }
    }
}

/// All scopes of a program. Table `0` is the global scope.
#[derive(Debug, Clone)]
pub struct SymbolTables {
    tables: Vec<Table>,
    records: Vec<Record>,
}

impl Default for SymbolTables {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTables {
    pub fn new() -> Self {
        let global =
            Table { name: "Global".to_owned(), kind: TableKind::Global, parent: None, entries: Vec::new() };
        SymbolTables { tables: vec![global], records: Vec::new() }
    }

    pub fn global(&self) -> TableId {
        TableId(0)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0 as usize]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.tables[id.0 as usize]
    }

    pub fn tables(&self) -> impl Iterator<Item = TableId> + use<> {
        (0..self.tables.len() as u32).map(TableId)
    }

    pub fn record(&self, id: RecordId) -> &Record {
        &self.records[id.0 as usize]
    }

    pub fn record_mut(&mut self, id: RecordId) -> &mut Record {
        &mut self.records[id.0 as usize]
    }

    pub fn add_table(&mut self, name: impl Into<String>, kind: TableKind, parent: TableId) -> TableId {
        let id = TableId(self.tables.len() as u32);
        self.tables.push(Table { name: name.into(), kind, parent: Some(parent), entries: Vec::new() });
        id
    }

    /// Enter a record at the end of `table`.
    pub fn add_record(&mut self, table: TableId, record: Record) -> RecordId {
        let len = self.table(table).entries.len();
        self.insert_record(table, len, record)
    }

    pub fn insert_record(&mut self, table: TableId, at: usize, mut record: Record) -> RecordId {
        let id = RecordId(self.records.len() as u32);
        record.parent = table;
        self.records.push(record);
        self.table_mut(table).entries.insert(at, id);
        id
    }

    /// Remove `record` from the entries of its table. The record itself stays in the arena.
    pub fn unlink(&mut self, record: RecordId) {
        let parent = self.record(record).parent;
        self.table_mut(parent).entries.retain(|entry| *entry != record);
    }

    pub fn entries(&self, table: TableId) -> impl Iterator<Item = (RecordId, &Record)> + '_ {
        self.table(table).entries.iter().map(move |id| (*id, self.record(*id)))
    }

    /// The first record named `name` in `table` itself.
    pub fn find(&self, table: TableId, name: &str) -> Option<RecordId> {
        self.entries(table).find(|(_, rec)| rec.name == name).map(|(id, _)| id)
    }

    /// All functions named `name` in `table` itself, in declaration order.
    pub fn functions(&self, table: TableId, name: &str) -> Vec<RecordId> {
        self.entries(table)
            .filter(|(_, rec)| rec.kind.is_function() && rec.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// The table of the struct called `name`.
    pub fn struct_table(&self, name: &str) -> Option<TableId> {
        self.entries(self.global())
            .find(|(_, rec)| rec.kind.is_struct() && rec.name == name)
            .and_then(|(_, rec)| rec.link)
    }

    /// The struct table a method scope belongs to.
    pub fn enclosing_struct(&self, table: TableId) -> Option<TableId> {
        let mut current = Some(table);
        while let Some(id) = current {
            if self.table(id).struct_state().is_some() {
                return Some(id);
            }
            current = self.table(id).parent;
        }
        None
    }

    /// `table` followed by all structs it inherits from, transitively and in
    /// declaration order. Each table appears once, so cycles are harmless.
    pub fn with_ancestors(&self, table: TableId) -> Vec<TableId> {
        let mut seen = vec![table];
        let mut idx = 0;
        while idx < seen.len() {
            let current = seen[idx];
            if let Some(state) = self.table(current).struct_state() {
                for parent in &state.inherited {
                    if !seen.contains(parent) {
                        seen.push(*parent);
                    }
                }
            }
            idx += 1;
        }
        seen
    }

    /// Find `name` in a struct or any struct it inherits from.
    pub fn find_member(&self, table: TableId, name: &str) -> Option<RecordId> {
        self.with_ancestors(table).into_iter().find_map(|t| self.find(t, name))
    }

    /// Find `name` starting at `table`: the table itself, the structs it
    /// inherits from, then the enclosing tables up to the global scope.
    pub fn lookup(&self, table: TableId, name: &str) -> Option<RecordId> {
        let mut current = Some(table);
        while let Some(id) = current {
            if let Some(found) = self.find_member(id, name) {
                return Some(found);
            }
            current = self.table(id).parent;
        }
        None
    }

    /// The first variable named `name` in a struct or any struct it inherits from.
    pub fn find_variable(&self, table: TableId, name: &str) -> Option<RecordId> {
        self.with_ancestors(table).into_iter().find_map(|t| {
            self.entries(t).find(|(_, rec)| rec.kind.is_variable() && rec.name == name).map(|(id, _)| id)
        })
    }

    /// Like [`SymbolTables::lookup`], but only variables and parameters are considered.
    pub fn lookup_variable(&self, table: TableId, name: &str) -> Option<RecordId> {
        let mut current = Some(table);
        while let Some(id) = current {
            if let Some(found) = self.find_variable(id, name) {
                return Some(found);
            }
            current = self.table(id).parent;
        }
        None
    }

    /// The overloads of `name` visible from `table`: those of the innermost
    /// scope (including inherited structs) that has any.
    pub fn lookup_functions(&self, table: TableId, name: &str) -> Vec<RecordId> {
        let mut current = Some(table);
        while let Some(id) = current {
            let found: Vec<RecordId> =
                self.with_ancestors(id).into_iter().flat_map(|t| self.functions(t, name)).collect();
            if !found.is_empty() {
                return found;
            }
            current = self.table(id).parent;
        }
        Vec::new()
    }

    /// Struct tables in creation order.
    pub fn struct_tables(&self) -> Vec<TableId> {
        self.tables().filter(|id| self.table(*id).struct_state().is_some()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn struct_table(tables: &mut SymbolTables, name: &str) -> TableId {
        let global = tables.global();
        let table = tables.add_table(name, TableKind::Struct(StructState::default()), global);
        let mut rec = Record::new(name, RecordKind::StructDecl, Type::named(name));
        rec.link = Some(table);
        tables.add_record(global, rec);
        table
    }

    #[test]
    fn lookup_walks_inheritance_then_parents() {
        let mut tables = SymbolTables::new();
        let a = struct_table(&mut tables, "A");
        let b = struct_table(&mut tables, "B");
        tables.add_record(a, Record::new("x", RecordKind::VarDecl, Type::integer()));
        tables.table_mut(b).struct_state_mut().unwrap().inherited.push(a);
        let method = tables.add_table("B::f()", TableKind::Function, b);
        tables.add_record(method, Record::new("y", RecordKind::VarDecl, Type::float()));

        let x = tables.lookup(method, "x").unwrap();
        assert_eq!(tables.record(x).parent, a);
        assert!(tables.lookup(method, "y").is_some());
        assert_eq!(tables.lookup(method, "A"), tables.find(tables.global(), "A"));
        assert_eq!(tables.lookup(method, "z"), None);
        assert_eq!(tables.enclosing_struct(method), Some(b));
    }

    #[test]
    fn inheritance_cycles_terminate() {
        let mut tables = SymbolTables::new();
        let a = struct_table(&mut tables, "A");
        let b = struct_table(&mut tables, "B");
        tables.table_mut(a).struct_state_mut().unwrap().inherited.push(b);
        tables.table_mut(b).struct_state_mut().unwrap().inherited.push(a);
        assert_eq!(tables.with_ancestors(a), vec![a, b]);
        assert_eq!(tables.lookup(a, "missing"), None);
    }

    #[test]
    fn unlink_keeps_the_record() {
        let mut tables = SymbolTables::new();
        let global = tables.global();
        let f = tables.add_record(global, Record::new("f", RecordKind::FuncDecl, Type::void()));
        tables.unlink(f);
        assert_eq!(tables.find(global, "f"), None);
        assert_eq!(tables.record(f).name, "f");
    }
}
