//! Semantic analysis of a parsed program.
//!
//! [`elaborate`] runs the passes in order: symbol tables, type checking and
//! memory sizes. Every pass records its errors and carries on, so a single
//! run reports as much as possible.

pub mod memsize;
mod result;
pub mod symbol_table;
pub mod typechecker;

use log::debug;

use moonc_lang_ast::Ast;

pub use result::*;
pub use symbol_table::SymbolTables;

/// The annotated symbol tables together with everything reported on the way.
#[derive(Debug)]
pub struct Elaboration {
    pub tables: SymbolTables,
    /// Errors and warnings in the order they were found.
    pub errors: Vec<SemanticError>,
}

impl Elaboration {
    /// Whether any error other than a warning was reported.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|err| !err.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SemanticError> {
        self.errors.iter().filter(|err| err.is_warning())
    }
}

pub fn elaborate(ast: &mut Ast) -> Elaboration {
    debug!("Building symbol tables");
    let (mut tables, mut errors) = symbol_table::build::build_symbol_tables(ast);
    debug!("Checking types");
    typechecker::check_types(ast, &mut tables, &mut errors);
    debug!("Computing memory sizes");
    memsize::compute_sizes(ast, &mut tables, &mut errors);
    Elaboration { tables, errors }
}
