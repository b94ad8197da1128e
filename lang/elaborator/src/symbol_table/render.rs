//! The `.outsymboltables` listing: one ASCII box per table, nested tables
//! indented under the record that owns them.

use std::fmt::{self, Write};

use moonc_lang_ast::TableId;

use super::{RecordKind, SymbolTables, TableKind};

const WIDTH: usize = 96;
const INDENT: &str = "|    ";

pub struct Render<'a> {
    tables: &'a SymbolTables,
}

impl SymbolTables {
    pub fn render(&self) -> Render<'_> {
        Render { tables: self }
    }
}

impl Render<'_> {
    fn table(&self, out: &mut String, id: TableId, depth: usize) -> fmt::Result {
        let prefix = INDENT.repeat(depth);
        let rule = format!("{prefix}{}", "=".repeat(WIDTH.saturating_sub(prefix.len())));
        let table = self.tables.table(id);

        writeln!(out, "{rule}")?;
        write!(out, "{prefix}| table: {}", table.name)?;
        if let TableKind::Struct(state) = &table.kind {
            if !state.inherits.is_empty() {
                write!(out, "  inherits: {}", state.inherits.join(", "))?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{rule}")?;

        for (_, record) in self.tables.entries(id) {
            let ty = match record.kind {
                RecordKind::FuncDecl | RecordKind::FuncDef => {
                    let params: Vec<String> = record.params.iter().map(ToString::to_string).collect();
                    format!("({}): {}", params.join(", "), record.ty)
                }
                RecordKind::StructDecl | RecordKind::ImplDef => String::new(),
                RecordKind::VarDecl | RecordKind::FuncDefParam => record.ty.to_string(),
            };
            write!(
                out,
                "{prefix}| {:<10}| {:<16}| {:<24}| {:<8}",
                record.kind.to_string(),
                record.name,
                ty,
                record.privacy.to_string()
            )?;
            if let Some(size) = record.size {
                write!(out, "| size {size:<6}")?;
            }
            if let Some(offset) = record.offset {
                write!(out, "| offset {offset}")?;
            }
            writeln!(out)?;
            if let Some(link) = record.link {
                self.table(out, link, depth + 1)?;
            }
        }
        writeln!(out, "{rule}")
    }
}

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.table(&mut out, self.tables.global(), 0)?;
        f.write_str(&out)
    }
}
