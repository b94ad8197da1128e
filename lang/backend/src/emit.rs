//! The two output streams of a MOON program and the instructions written to them.

use std::fmt;

use crate::registers::Register;

/// Labels are padded to this width, followed by at least one space.
const LABEL_WIDTH: usize = 11;

/// An emitted program: code lines followed by data reservations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<String>,
    pub data: Vec<String>,
}

impl Program {
    fn line(&mut self, label: Option<&str>, instr: String) {
        self.code.push(format!("{:<LABEL_WIDTH$} {instr}", label.unwrap_or("")));
    }

    pub fn comment(&mut self, text: impl fmt::Display) {
        self.code.push(format!("% {text}"));
    }

    pub fn instr(&mut self, instr: impl Into<String>) {
        self.line(None, instr.into());
    }

    /// `<label> nop`
    pub fn label(&mut self, label: &str) {
        self.line(Some(label), "nop".to_owned());
    }

    pub fn labeled(&mut self, label: &str, instr: impl Into<String>) {
        self.line(Some(label), instr.into());
    }

    pub fn addi(&mut self, dst: Register, src: Register, value: impl fmt::Display) {
        self.instr(format!("addi {dst}, {src}, {value}"));
    }

    pub fn muli(&mut self, dst: Register, src: Register, value: u32) {
        self.instr(format!("muli {dst}, {src}, {value}"));
    }

    /// A three-register instruction such as `add`, `clt` or `and`.
    pub fn op(&mut self, op: &str, dst: Register, left: Register, right: Register) {
        self.instr(format!("{op} {dst}, {left}, {right}"));
    }

    pub fn lw(&mut self, dst: Register, tag: impl fmt::Display, base: Register) {
        self.instr(format!("lw {dst}, {tag}({base})"));
    }

    pub fn sw(&mut self, tag: impl fmt::Display, base: Register, src: Register) {
        self.instr(format!("sw {tag}({base}), {src}"));
    }

    pub fn bz(&mut self, reg: Register, label: &str) {
        self.instr(format!("bz {reg}, {label}"));
    }

    pub fn j(&mut self, label: &str) {
        self.instr(format!("j {label}"));
    }

    pub fn jl(&mut self, label: &str) {
        self.instr(format!("jl {}, {label}", Register::LINK));
    }

    pub fn jr(&mut self, reg: Register) {
        self.instr(format!("jr {reg}"));
    }

    /// `<tag> res <bytes>` on the data stream.
    pub fn reserve_word(&mut self, tag: &str, bytes: u32) {
        self.data.push(format!("{tag:<LABEL_WIDTH$} res {bytes}"));
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "% Main:")?;
        for line in &self.code {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "% Data:")?;
        for line in &self.data {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
