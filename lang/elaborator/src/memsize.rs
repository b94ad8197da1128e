//! Third pass: byte sizes of variables and structs, offsets of struct fields.
//!
//! Scalars take one word. A struct holds the fields of every struct it
//! inherits from, parents in declaration order, followed by its own fields.

use log::debug;

use moonc_lang_ast::{Ast, HashMap, HashSet, NodeId, RecordId, TableId, Visitor};
use moonc_lang_miette_util::ToMiette;

use crate::result::SemanticError;
use crate::symbol_table::{BaseType, Record, RecordKind, SymbolTables, Type};

pub const WORD: u32 = 4;

pub fn compute_sizes(ast: &mut Ast, tables: &mut SymbolTables, errors: &mut Vec<SemanticError>) {
    let mut pass = MemSize {
        tables,
        errors,
        layouts: HashMap::default(),
        visiting: Vec::new(),
        reported: HashSet::default(),
    };
    if let Some(root) = ast.root() {
        pass.visit(ast, root);
    }
}

struct MemSize<'a> {
    tables: &'a mut SymbolTables,
    errors: &'a mut Vec<SemanticError>,
    /// Finished struct sizes, `None` for structs that cannot be laid out.
    layouts: HashMap<TableId, Option<u32>>,
    /// Structs whose layout is being computed.
    visiting: Vec<TableId>,
    reported: HashSet<TableId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Edge {
    Field,
    Parent,
}

impl Visitor for MemSize<'_> {
    fn visit_prog(&mut self, ast: &mut Ast, id: NodeId) {
        for table in self.tables.struct_tables() {
            self.struct_size(table, Edge::Field);
        }
        self.visit_children(ast, id);
    }

    /// Fields were sized with their struct's layout.
    fn visit_struct_decl(&mut self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) {
        self.visit_children(ast, id);
        let meta = ast.meta(id);
        let (Some(record), Some(scope)) = (meta.record, meta.table) else { return };
        let frame = self
            .tables
            .entries(scope)
            .filter(|(_, rec)| rec.kind.is_variable())
            .filter_map(|(_, rec)| rec.size)
            .try_fold(0, u32::checked_add);
        if frame.is_none() {
            self.overflow(record);
        }
        self.tables.record_mut(record).size = frame;
    }

    fn visit_func_def_param(&mut self, ast: &mut Ast, id: NodeId) {
        self.size_record(ast, id);
    }

    fn visit_var_decl(&mut self, ast: &mut Ast, id: NodeId) {
        self.size_record(ast, id);
    }
}

impl MemSize<'_> {
    fn size_record(&mut self, ast: &Ast, id: NodeId) {
        let Some(record) = ast.meta(id).record else { return };
        let size = self.record_size(record);
        self.tables.record_mut(record).size = size;
    }

    /// The size of a variable's type. Overflows are reported on the variable.
    fn record_size(&mut self, record: RecordId) -> Option<u32> {
        let ty = self.tables.record(record).ty.clone();
        match self.size_of(&ty) {
            Ok(size) => size,
            Err(Overflow) => {
                self.overflow(record);
                None
            }
        }
    }

    fn size_of(&mut self, ty: &Type) -> Result<Option<u32>, Overflow> {
        let base = match &ty.base {
            BaseType::Integer | BaseType::Float => WORD,
            BaseType::Void => 0,
            BaseType::Named(name) => {
                let Some(table) = self.tables.struct_table(name) else { return Ok(None) };
                let Some(size) = self.struct_size(table, Edge::Field) else { return Ok(None) };
                size
            }
        };
        ty.dims.iter().try_fold(base, |size, dim| size.checked_mul((*dim).max(1))).map(Some).ok_or(Overflow)
    }

    fn overflow(&mut self, record: RecordId) {
        let rec = self.tables.record(record);
        debug!("{} does not fit in memory", rec.name);
        self.errors.push(SemanticError::SizeOverflow {
            name: rec.name.clone(),
            line: rec.line,
            span: rec.span.to_miette(),
        });
    }

    fn struct_size(&mut self, table: TableId, edge: Edge) -> Option<u32> {
        if let Some(size) = self.layouts.get(&table) {
            return *size;
        }
        if self.visiting.contains(&table) {
            // Pure inheritance cycles have been reported while resolving parents.
            if edge == Edge::Field && self.reported.insert(table) {
                let name = self.tables.table(table).name.clone();
                let (line, span) = self
                    .tables
                    .struct_record(table)
                    .map(|rec| (rec.line, rec.span.to_miette()))
                    .unwrap_or((0, None));
                self.errors.push(SemanticError::CyclicStructSize { name, line, span });
            }
            return None;
        }
        self.visiting.push(table);
        let size = match self.layout(table) {
            Ok(size) => size,
            Err(Overflow) => {
                if let Some(record) = self.tables.struct_record_id(table) {
                    self.overflow(record);
                }
                None
            }
        };
        self.visiting.pop();
        self.layouts.insert(table, size);

        debug!("Struct {} has size {size:?}", self.tables.table(table).name);
        if let Some(record) = self.tables.struct_record_id(table) {
            self.tables.record_mut(record).size = size;
        }
        size
    }

    fn layout(&mut self, table: TableId) -> Result<Option<u32>, Overflow> {
        let parents = self.tables.table(table).struct_state().map(|s| s.inherited.clone()).unwrap_or_default();
        let mut size = Some(0);
        for parent in parents {
            let parent = self.struct_size(parent, Edge::Parent);
            size = add(size, parent)?;
        }
        let fields: Vec<RecordId> = self
            .tables
            .entries(table)
            .filter(|(_, rec)| rec.kind == RecordKind::VarDecl)
            .map(|(id, _)| id)
            .collect();
        for field in fields {
            let field_size = self.record_size(field);
            let rec = self.tables.record_mut(field);
            rec.size = field_size;
            rec.offset = size;
            size = add(size, field_size)?;
        }
        Ok(size)
    }
}

/// A size that does not fit in `u32`.
struct Overflow;

/// Unknown sizes stay unknown.
fn add(total: Option<u32>, size: Option<u32>) -> Result<Option<u32>, Overflow> {
    match (total, size) {
        (Some(total), Some(size)) => total.checked_add(size).map(Some).ok_or(Overflow),
        _ => Ok(None),
    }
}

impl SymbolTables {
    /// The global record of the struct owning `table`.
    pub fn struct_record_id(&self, table: TableId) -> Option<RecordId> {
        let global = self.global();
        self.entries(global).find(|(_, rec)| rec.kind.is_struct() && rec.link == Some(table)).map(|(id, _)| id)
    }

    pub fn struct_record(&self, table: TableId) -> Option<&Record> {
        self.struct_record_id(table).map(|id| self.record(id))
    }

    /// The size of a struct as computed by the memory pass.
    pub fn struct_size(&self, table: TableId) -> Option<u32> {
        self.struct_record(table).and_then(|rec| rec.size)
    }

    /// The byte offset of `field` inside a value of the struct `table`,
    /// following inheritance to where the field is declared.
    pub fn field_offset(&self, table: TableId, field: RecordId) -> Option<u32> {
        self.field_offset_guarded(table, field, &mut Vec::new())
    }

    fn field_offset_guarded(&self, table: TableId, field: RecordId, seen: &mut Vec<TableId>) -> Option<u32> {
        let record = self.record(field);
        if record.parent == table {
            return record.offset;
        }
        if seen.contains(&table) {
            return None;
        }
        seen.push(table);
        let parents = self.table(table).struct_state().map(|s| s.inherited.clone()).unwrap_or_default();
        let mut base = 0;
        for parent in parents {
            if let Some(offset) = self.field_offset_guarded(parent, field, seen) {
                return Some(base + offset);
            }
            base = base.checked_add(self.struct_size(parent)?)?;
        }
        None
    }
}
