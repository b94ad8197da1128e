//! Expressions, calls and the addresses of subscripted variables and fields.

use moonc_lang_ast::{NodeId, NodeKind, TokenKind};
use moonc_lang_elaborator::memsize::WORD;
use moonc_lang_elaborator::symbol_table::{BaseType, RecordKind, Type};

use super::{CodeGen, is_integer_scalar};
use crate::registers::{Register, RegisterPool};
use crate::result::{BackendError, BackendResult};

/// Where a variable lives: a tag plus, for elements and fields, a register
/// holding the byte offset from that tag.
pub(super) struct Address {
    pub tag: String,
    offset: Option<Register>,
}

impl Address {
    pub fn base(&self) -> Register {
        self.offset.unwrap_or(Register::ZERO)
    }

    pub fn release(self, regs: &mut RegisterPool) -> BackendResult {
        match self.offset {
            Some(reg) => regs.free(reg),
            None => Ok(()),
        }
    }
}

fn opcode(kind: NodeKind) -> Option<&'static str> {
    use NodeKind::*;
    let op = match kind {
        Plus => "add",
        Minus => "sub",
        Mult => "mul",
        Div => "div",
        And => "and",
        Or => "or",
        Eq => "ceq",
        Neq => "cne",
        Lt => "clt",
        Leq => "cle",
        Gt => "cgt",
        Geq => "cge",
        _ => return None,
    };
    Some(op)
}

impl CodeGen<'_> {
    /// Evaluate an expression, leaving the tag of its value on the active stack.
    pub(super) fn expr(&mut self, id: NodeId) -> BackendResult {
        match self.ast.kind(id) {
            NodeKind::ArithExpr | NodeKind::RelExpr | NodeKind::Factor => self.expr(self.child(id, 0)?),
            NodeKind::IntNum => {
                let Ok(literal) = self.ast.lexeme(id).parse::<i32>() else {
                    return Err(self.unsupported("Integer literal outside the 32-bit range", id));
                };
                let tag = self.tags.temp();
                self.out.reserve_word(&tag, 4);
                let reg = self.regs.claim()?;
                self.out.addi(reg, Register::ZERO, literal);
                self.out.sw(&tag, Register::ZERO, reg);
                self.regs.free(reg)
            }
            NodeKind::FloatNum => Err(self.unsupported("Float value", id)),
            NodeKind::Not => self.unary(id, "not"),
            NodeKind::Sign if self.ast.token(id).is_some_and(|token| token.kind == TokenKind::Minus) => {
                self.unary(id, "sub")
            }
            NodeKind::Sign => self.expr(self.child(id, 0)?),
            NodeKind::Variable => self.load(id),
            NodeKind::FuncCall => {
                if self.call(id)? {
                    Ok(())
                } else {
                    Err(self.unsupported("Using the result of a void function", id))
                }
            }
            kind => match opcode(kind) {
                Some(op) => self.binary(id, op),
                None => Err(BackendError::Impossible(format!("{kind} is not an expression"))),
            },
        }
    }

    fn binary(&mut self, id: NodeId, op: &str) -> BackendResult {
        self.expr(self.child(id, 0)?)?;
        self.expr(self.child(id, 1)?)?;
        let (left_tag, right_tag) = self.tags.pop2()?;
        let left = self.regs.claim()?;
        let right = self.regs.claim()?;
        let result = self.regs.claim()?;
        self.out.lw(left, &left_tag, Register::ZERO);
        self.out.lw(right, &right_tag, Register::ZERO);
        self.out.op(op, result, left, right);
        let tag = self.tags.temp();
        self.out.reserve_word(&tag, 4);
        self.out.sw(&tag, Register::ZERO, result);
        self.regs.free(result)?;
        self.regs.free(right)?;
        self.regs.free(left)
    }

    /// `not` is logical negation, `sub` negates by subtracting from zero.
    fn unary(&mut self, id: NodeId, op: &str) -> BackendResult {
        self.expr(self.child(id, 0)?)?;
        let operand_tag = self.tags.pop()?;
        let operand = self.regs.claim()?;
        let result = self.regs.claim()?;
        self.out.lw(operand, &operand_tag, Register::ZERO);
        match op {
            "not" => self.out.instr(format!("not {result}, {operand}")),
            _ => self.out.op(op, result, Register::ZERO, operand),
        }
        let tag = self.tags.temp();
        self.out.reserve_word(&tag, 4);
        self.out.sw(&tag, Register::ZERO, result);
        self.regs.free(result)?;
        self.regs.free(operand)
    }

    /// A plain scalar variable is its own tag. Elements and fields are copied
    /// into a temporary.
    fn load(&mut self, id: NodeId) -> BackendResult {
        self.check_scalar(id)?;
        let indices = self.indices(id)?;
        let address = self.address(id, &mut indices.into_iter())?;
        if address.offset.is_none() {
            self.tags.push(address.tag);
            return Ok(());
        }
        let reg = self.regs.claim()?;
        self.out.lw(reg, &address.tag, address.base());
        let tag = self.tags.temp();
        self.out.reserve_word(&tag, 4);
        self.out.sw(&tag, Register::ZERO, reg);
        self.regs.free(reg)?;
        address.release(&mut self.regs)
    }

    /// Only integer scalars are read and written as values.
    pub(super) fn check_scalar(&self, id: NodeId) -> BackendResult {
        let ty = self.variable_type(id)?;
        if is_integer_scalar(&ty) {
            return Ok(());
        }
        let what = if ty.base == BaseType::Float { "Float value" } else { "Whole array or struct value" };
        Err(self.unsupported(what, id))
    }

    /// The type of a variable node after its subscripts.
    fn variable_type(&self, id: NodeId) -> BackendResult<Type> {
        let record = self.ast.meta(id).record.ok_or_else(|| self.unresolved(id))?;
        let subscripts = self.ast.child(id, 2).map(|list| self.ast.children(list).len()).unwrap_or(0);
        Ok(self.tables.record(record).ty.indexed(subscripts))
    }

    fn unresolved(&self, id: NodeId) -> BackendError {
        let name = self.ast.child(id, 1).map(|name| self.ast.lexeme(name)).unwrap_or_default();
        BackendError::Impossible(format!("'{name}' was not resolved"))
    }

    /// Evaluate every subscript of a chain, innermost subject first, so that
    /// no register is held while a subscript calls a function.
    pub(super) fn indices(&mut self, id: NodeId) -> BackendResult<Vec<String>> {
        let mut tags = match self.subject(id) {
            Some(subject) if self.ast.kind(subject) == NodeKind::Variable => self.indices(subject)?,
            _ => Vec::new(),
        };
        let list = self.ast.child(id, 2).map(|list| self.ast.children(list).to_vec()).unwrap_or_default();
        for index in list {
            self.expr(index)?;
            tags.push(self.tags.pop()?);
        }
        Ok(tags)
    }

    fn subject(&self, id: NodeId) -> Option<NodeId> {
        self.ast.child(id, 0).and_then(|subject| self.ast.child(subject, 0))
    }

    /// The address of a variable, consuming the subscript values computed by
    /// [`CodeGen::indices`] in the same order.
    pub(super) fn address(&mut self, id: NodeId, indices: &mut impl Iterator<Item = String>) -> BackendResult<Address> {
        let tables = self.tables;
        let record_id = self.ast.meta(id).record.ok_or_else(|| self.unresolved(id))?;
        let record = tables.record(record_id);

        let mut address = match self.subject(id) {
            None => {
                let name = self.ast.child(id, 1).and_then(|name| self.ast.token(name));
                if name.is_some_and(|token| token.kind == TokenKind::SelfKw) {
                    return Err(self.unsupported("'self'", id));
                }
                match self.vars.get(&record_id) {
                    Some(tag) => Address { tag: tag.clone(), offset: None },
                    None => return Err(self.unsupported("Member access inside a method", id)),
                }
            }
            Some(subject) if self.ast.kind(subject) == NodeKind::Variable => {
                let structure = self.variable_type(subject)?;
                let table = structure.struct_name().and_then(|name| tables.struct_table(name));
                let offset = table
                    .and_then(|table| tables.field_offset(table, record_id))
                    .ok_or_else(|| BackendError::Impossible(format!("no layout for field '{}'", record.name)))?;
                let mut address = self.address(subject, indices)?;
                self.add_offset(&mut address, offset)?;
                address
            }
            Some(subject) => return Err(self.unsupported("Member access on a call result", subject)),
        };

        let subscripts = self.ast.child(id, 2).map(|list| self.ast.children(list).len()).unwrap_or(0);
        if subscripts == 0 {
            return Ok(address);
        }
        let strides = self.strides(id, &record.ty)?;
        for stride in strides.into_iter().take(subscripts) {
            let index = indices.next().ok_or_else(|| BackendError::Impossible("missing subscript value".to_owned()))?;
            let reg = self.regs.claim()?;
            self.out.lw(reg, &index, Register::ZERO);
            self.out.muli(reg, reg, stride);
            match address.offset {
                Some(offset) => {
                    self.out.op("add", offset, offset, reg);
                    self.regs.free(reg)?;
                }
                None => address.offset = Some(reg),
            }
        }
        Ok(address)
    }

    fn add_offset(&mut self, address: &mut Address, offset: u32) -> BackendResult {
        if offset == 0 {
            return Ok(());
        }
        match address.offset {
            Some(reg) => self.out.addi(reg, reg, offset),
            None => {
                let reg = self.regs.claim()?;
                self.out.addi(reg, Register::ZERO, offset);
                address.offset = Some(reg);
            }
        }
        Ok(())
    }

    /// Byte distance between consecutive elements of each dimension, row-major.
    fn strides(&self, id: NodeId, ty: &Type) -> BackendResult<Vec<u32>> {
        if ty.dims.contains(&0) {
            return Err(self.unsupported("Array of unknown size", id));
        }
        let element = match &ty.base {
            BaseType::Named(name) => self
                .tables
                .struct_table(name)
                .and_then(|table| self.tables.struct_size(table))
                .ok_or_else(|| BackendError::Impossible(format!("no size for struct '{name}'")))?,
            _ => WORD,
        };
        let mut strides = vec![element; ty.dims.len()];
        for i in (0..ty.dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1]
                .checked_mul(ty.dims[i + 1])
                .ok_or_else(|| self.unsupported("Array larger than the address space", id))?;
        }
        Ok(strides)
    }

    /// Call a free function. Returns whether a result tag was pushed.
    pub(super) fn call(&mut self, id: NodeId) -> BackendResult<bool> {
        if self.subject(id).is_some() {
            return Err(self.unsupported("Method call", id));
        }
        let record = self.ast.meta(id).record.ok_or_else(|| self.unresolved(id))?;
        let Some(frame) = self.frames.get(&record).cloned() else {
            return Err(self.unsupported("Calling 'main' or a method", id));
        };

        let args = self.ast.child(id, 2).map(|list| self.ast.children(list).to_vec()).unwrap_or_default();
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            self.expr(arg)?;
            values.push(self.tags.pop()?);
        }
        let tables = self.tables;
        let callee = tables.record(record);
        let params: Vec<String> = callee
            .link
            .map(|scope| {
                tables
                    .entries(scope)
                    .filter(|(_, rec)| rec.kind == RecordKind::FuncDefParam)
                    .filter_map(|(param, _)| self.vars.get(&param).cloned())
                    .collect()
            })
            .unwrap_or_default();
        for (param, value) in params.iter().zip(&values) {
            let reg = self.regs.claim()?;
            self.out.lw(reg, value, Register::ZERO);
            self.out.sw(param, Register::ZERO, reg);
            self.regs.free(reg)?;
        }
        self.out.jl(&frame.label);

        if callee.ty.base == BaseType::Void {
            return Ok(false);
        }
        let tag = self.tags.temp();
        self.out.reserve_word(&tag, 4);
        let reg = self.regs.claim()?;
        self.out.lw(reg, &frame.ret, Register::ZERO);
        self.out.sw(&tag, Register::ZERO, reg);
        self.regs.free(reg)?;
        Ok(true)
    }
}
