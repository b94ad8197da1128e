//! Tags-based code generation.
//!
//! Every value lives in a named cell of the data section. Expressions leave
//! the tag holding their value on the tag pool's active stack, and registers
//! are only borrowed for the duration of a single operation. No register is
//! live across a call, so functions need not save any.

mod expr;

use log::debug;

use moonc_lang_ast::{Ast, HashMap, NodeId, NodeKind, RecordId};
use moonc_lang_elaborator::SymbolTables;
use moonc_lang_elaborator::symbol_table::{BaseType, Type};
use moonc_lang_miette_util::ToMiette;

use crate::emit::Program;
use crate::registers::{Register, RegisterPool};
use crate::result::{BackendError, BackendResult};
use crate::tags::TagPool;

/// Bytes reserved for the string `intstr` writes.
const BUFFER_SIZE: u32 = 20;
const BUFFER: &str = "buf";

/// Generate the MOON program for a checked AST.
pub fn generate(ast: &Ast, tables: &SymbolTables) -> BackendResult<Program> {
    let mut codegen = CodeGen::new(ast, tables);
    codegen.program()?;
    codegen.regs.check_all_free()?;
    if !codegen.tags.is_balanced() {
        return Err(BackendError::Impossible("unconsumed expression results".to_owned()));
    }
    Ok(codegen.out)
}

/// The static activation record of a function other than `main`.
#[derive(Debug, Clone)]
struct Frame {
    label: String,
    ret: String,
    link: String,
}

pub(crate) struct CodeGen<'a> {
    ast: &'a Ast,
    tables: &'a SymbolTables,
    out: Program,
    regs: RegisterPool,
    tags: TagPool,
    /// Tags of declared variables and parameters.
    vars: HashMap<RecordId, String>,
    frames: HashMap<RecordId, Frame>,
    /// The function being generated, `None` inside `main`.
    current: Option<RecordId>,
}

impl<'a> CodeGen<'a> {
    fn new(ast: &'a Ast, tables: &'a SymbolTables) -> Self {
        CodeGen {
            ast,
            tables,
            out: Program::default(),
            regs: RegisterPool::default(),
            tags: TagPool::default(),
            vars: HashMap::default(),
            frames: HashMap::default(),
            current: None,
        }
    }

    fn unsupported(&self, what: impl Into<String>, id: NodeId) -> BackendError {
        BackendError::Unsupported { what: what.into(), line: self.ast.line(id), span: self.ast.span(id).to_miette() }
    }

    fn program(&mut self) -> BackendResult {
        let root = self.ast.root().ok_or(BackendError::MissingMain)?;
        let functions: Vec<NodeId> = self
            .ast
            .child(root, 0)
            .map(|list| self.ast.children(list).to_vec())
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.ast.kind(*id) == NodeKind::FuncDef)
            .collect();
        let (main, others): (Vec<NodeId>, Vec<NodeId>) =
            functions.into_iter().partition(|id| self.ast.child(*id, 0).is_some_and(|name| self.ast.lexeme(name) == "main"));
        let Some(main) = main.first().copied() else {
            return Err(BackendError::MissingMain);
        };

        self.out.reserve_word(BUFFER, BUFFER_SIZE);
        for function in &others {
            self.declare_function(*function)?;
        }

        self.out.comment("main");
        self.out.instr("entry");
        self.out.addi(Register::STACK, Register::ZERO, "topaddr");
        self.body(main)?;
        self.out.instr("hlt");

        for function in others {
            self.function(function)?;
        }
        Ok(())
    }

    /// Reserve the activation record of a function so that calls may precede its definition.
    fn declare_function(&mut self, id: NodeId) -> BackendResult {
        let record_id = self.ast.meta(id).record.ok_or_else(|| BackendError::Impossible("unresolved function".to_owned()))?;
        let record = self.tables.record(record_id);
        if !matches!(record.ty.base, BaseType::Integer | BaseType::Void) || !record.ty.is_scalar() {
            return Err(self.unsupported(format!("Returning '{}'", record.ty), id));
        }
        let label = self.tags.named(&record.name);
        let frame = Frame { ret: format!("{label}_ret"), link: format!("{label}_link"), label };
        self.out.reserve_word(&frame.ret, 4);
        self.out.reserve_word(&frame.link, 4);

        let params = self.ast.child(id, 1).map(|list| self.ast.children(list).to_vec()).unwrap_or_default();
        for param in params {
            let Some(param_record) = self.ast.meta(param).record else { continue };
            let ty = &self.tables.record(param_record).ty;
            if !is_integer_scalar(ty) {
                return Err(self.unsupported(format!("Parameter of type '{ty}'"), param));
            }
            self.declare_variable(param_record);
        }
        self.frames.insert(record_id, frame);
        Ok(())
    }

    fn declare_variable(&mut self, record: RecordId) -> String {
        let record_ref = self.tables.record(record);
        let tag = self.tags.named(&record_ref.name);
        self.out.reserve_word(&tag, record_ref.size.unwrap_or(4).max(4));
        self.vars.insert(record, tag.clone());
        tag
    }

    fn function(&mut self, id: NodeId) -> BackendResult {
        let Some(record) = self.ast.meta(id).record else { return Ok(()) };
        let Some(frame) = self.frames.get(&record).cloned() else { return Ok(()) };
        debug!("Generating {}", frame.label);
        self.current = Some(record);
        self.out.comment(self.tables.record(record).signature());
        self.out.labeled(&frame.label, format!("sw {}(r0), {}", frame.link, Register::LINK));
        self.body(id)?;
        self.function_exit(&frame);
        self.current = None;
        Ok(())
    }

    fn function_exit(&mut self, frame: &Frame) {
        self.out.lw(Register::LINK, &frame.link, Register::ZERO);
        self.out.jr(Register::LINK);
    }

    fn body(&mut self, function: NodeId) -> BackendResult {
        let items = self.ast.child(function, 3).map(|body| self.ast.children(body).to_vec()).unwrap_or_default();
        for item in items {
            if self.ast.kind(item) == NodeKind::VarDecl {
                if let Some(record) = self.ast.meta(item).record {
                    self.declare_variable(record);
                }
                continue;
            }
            self.statement(item)?;
        }
        Ok(())
    }

    fn statement(&mut self, id: NodeId) -> BackendResult {
        match self.ast.kind(id) {
            NodeKind::Assign => self.assign(id),
            NodeKind::If => self.if_statement(id),
            NodeKind::While => self.while_statement(id),
            NodeKind::Read => self.read(id),
            NodeKind::Write => self.write(id),
            NodeKind::Return => self.return_statement(id),
            NodeKind::FuncCall => {
                if self.call(id)? {
                    self.tags.pop()?;
                }
                Ok(())
            }
            NodeKind::StatBlock => {
                for child in self.ast.children(id).to_vec() {
                    self.statement(child)?;
                }
                Ok(())
            }
            kind => Err(BackendError::Impossible(format!("{kind} is not a statement"))),
        }
    }

    fn child(&self, id: NodeId, n: usize) -> BackendResult<NodeId> {
        self.ast
            .child(id, n)
            .ok_or_else(|| BackendError::Impossible(format!("{} without child {n}", self.ast.kind(id))))
    }

    fn assign(&mut self, id: NodeId) -> BackendResult {
        let (target, value) = (self.child(id, 0)?, self.child(id, 1)?);
        self.expr(value)?;
        let value = self.tags.pop()?;
        self.store(target, &value)
    }

    /// Store the value in `value` into the variable `target`.
    fn store(&mut self, target: NodeId, value: &str) -> BackendResult {
        self.check_scalar(target)?;
        let indices = self.indices(target)?;
        let address = self.address(target, &mut indices.into_iter())?;
        let reg = self.regs.claim()?;
        self.out.lw(reg, value, Register::ZERO);
        self.out.sw(&address.tag, address.base(), reg);
        self.regs.free(reg)?;
        address.release(&mut self.regs)
    }

    /// Evaluate a predicate and branch to `target` if it is zero.
    fn branch_unless(&mut self, predicate: NodeId, target: &str) -> BackendResult {
        self.expr(predicate)?;
        let tag = self.tags.pop()?;
        let reg = self.regs.claim()?;
        self.out.lw(reg, &tag, Register::ZERO);
        self.out.bz(reg, target);
        self.regs.free(reg)
    }

    fn if_statement(&mut self, id: NodeId) -> BackendResult {
        let n = self.tags.next_id();
        let (else_label, end_label) = (format!("else{n}"), format!("endif{n}"));
        let (predicate, then_block, else_block) = (self.child(id, 0)?, self.child(id, 1)?, self.child(id, 2)?);
        self.branch_unless(predicate, &else_label)?;
        self.statement(then_block)?;
        self.out.j(&end_label);
        self.out.label(&else_label);
        self.statement(else_block)?;
        self.out.label(&end_label);
        Ok(())
    }

    fn while_statement(&mut self, id: NodeId) -> BackendResult {
        let n = self.tags.next_id();
        let (loop_label, end_label) = (format!("while{n}"), format!("endwhile{n}"));
        let (predicate, block) = (self.child(id, 0)?, self.child(id, 1)?);
        self.out.label(&loop_label);
        self.branch_unless(predicate, &end_label)?;
        self.statement(block)?;
        self.out.j(&loop_label);
        self.out.label(&end_label);
        Ok(())
    }

    fn read(&mut self, id: NodeId) -> BackendResult {
        let target = self.child(id, 0)?;
        if self.ast.kind(target) != NodeKind::Variable {
            return Err(self.unsupported("Reading into a call result", target));
        }
        self.out.jl("getint");
        let tag = self.tags.temp();
        self.out.reserve_word(&tag, 4);
        self.out.sw(&tag, Register::ZERO, Register::INPUT);
        let tag = self.tags.pop()?;
        self.store(target, &tag)
    }

    fn write(&mut self, id: NodeId) -> BackendResult {
        let value = self.child(id, 0)?;
        self.expr(value)?;
        let tag = self.tags.pop()?;
        let reg = self.regs.claim()?;
        self.out.lw(reg, &tag, Register::ZERO);
        self.out.sw(-8, Register::STACK, reg);
        self.out.addi(reg, Register::ZERO, BUFFER);
        self.out.sw(-12, Register::STACK, reg);
        self.regs.free(reg)?;
        self.out.jl("intstr");
        self.out.sw(-8, Register::STACK, Register::RESULT);
        self.out.jl("putstr");

        let reg = self.regs.claim()?;
        self.out.addi(reg, Register::ZERO, 10);
        self.out.instr(format!("putc {reg}"));
        self.regs.free(reg)
    }

    fn return_statement(&mut self, id: NodeId) -> BackendResult {
        let value = self.child(id, 0)?;
        self.expr(value)?;
        let tag = self.tags.pop()?;
        let Some(frame) = self.current.and_then(|record| self.frames.get(&record)).cloned() else {
            self.out.instr("hlt");
            return Ok(());
        };
        let reg = self.regs.claim()?;
        self.out.lw(reg, &tag, Register::ZERO);
        self.out.sw(&frame.ret, Register::ZERO, reg);
        self.regs.free(reg)?;
        self.function_exit(&frame);
        Ok(())
    }
}

fn is_integer_scalar(ty: &Type) -> bool {
    ty.base == BaseType::Integer && ty.is_scalar()
}

#[cfg(test)]
mod tests;
