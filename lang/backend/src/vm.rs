//! A small MOON interpreter for testing generated programs.
//!
//! It understands the instructions the code generator emits and implements
//! the library routines `getint`, `intstr` and `putstr` natively.

use std::collections::{HashMap, VecDeque};

use crate::emit::Program;

const MEMORY: usize = 16 * 1024;
const MAX_STEPS: usize = 1_000_000;

struct Instr {
    op: String,
    args: Vec<String>,
}

pub(crate) struct Vm {
    mem: Vec<u8>,
    regs: [i32; 16],
    code: Vec<Instr>,
    labels: HashMap<String, usize>,
    tags: HashMap<String, i32>,
    input: VecDeque<i32>,
    output: String,
}

impl Vm {
    pub fn load(program: &Program) -> Vm {
        let mut vm = Vm {
            mem: vec![0; MEMORY],
            regs: [0; 16],
            code: Vec::new(),
            labels: HashMap::new(),
            tags: HashMap::new(),
            input: VecDeque::new(),
            output: String::new(),
        };
        for line in program.code.iter().filter(|line| !line.starts_with('%')) {
            let (label, instr) = split_label(line);
            if let Some(label) = label {
                vm.labels.insert(label.to_owned(), vm.code.len());
            }
            let (op, args) = instr.split_once(' ').unwrap_or((instr, ""));
            let args = args.split(',').map(|arg| arg.trim().to_owned()).filter(|arg| !arg.is_empty()).collect();
            vm.code.push(Instr { op: op.to_owned(), args });
        }
        let mut next = 0;
        for line in &program.data {
            let (tag, reservation) = split_label(line);
            let bytes: i32 = reservation.trim_start_matches("res").trim().parse().expect("res size");
            vm.tags.insert(tag.expect("data tag").to_owned(), next);
            next += (bytes + 3) / 4 * 4;
        }
        vm
    }

    pub fn with_input(mut self, input: &[i32]) -> Vm {
        self.input.extend(input);
        self
    }

    pub fn run(mut self) -> String {
        let mut pc = 0;
        for _ in 0..MAX_STEPS {
            let instr = &self.code[pc];
            let mut next = pc + 1;
            let (op, args) = (instr.op.clone(), instr.args.clone());
            match op.as_str() {
                "entry" | "nop" => {}
                "hlt" => return self.output,
                "addi" | "muli" => {
                    let value = self.reg(&args[1]);
                    let imm = self.value(&args[2]);
                    let result = if op == "addi" { value + imm } else { value * imm };
                    self.set(&args[0], result);
                }
                "add" | "sub" | "mul" | "div" | "and" | "or" | "ceq" | "cne" | "clt" | "cle" | "cgt" | "cge" => {
                    let (a, b) = (self.reg(&args[1]), self.reg(&args[2]));
                    let result = match op.as_str() {
                        "add" => a + b,
                        "sub" => a - b,
                        "mul" => a * b,
                        "div" => a / b,
                        "and" => (a != 0 && b != 0) as i32,
                        "or" => (a != 0 || b != 0) as i32,
                        "ceq" => (a == b) as i32,
                        "cne" => (a != b) as i32,
                        "clt" => (a < b) as i32,
                        "cle" => (a <= b) as i32,
                        "cgt" => (a > b) as i32,
                        _ => (a >= b) as i32,
                    };
                    self.set(&args[0], result);
                }
                "not" => {
                    let value = (self.reg(&args[1]) == 0) as i32;
                    self.set(&args[0], value);
                }
                "lw" => {
                    let addr = self.address(&args[1]);
                    let value = self.word(addr);
                    self.set(&args[0], value);
                }
                "sw" => {
                    let addr = self.address(&args[0]);
                    let value = self.reg(&args[1]);
                    self.store(addr, value);
                }
                "bz" => {
                    if self.reg(&args[0]) == 0 {
                        next = self.labels[&args[1]];
                    }
                }
                "j" => next = self.labels[&args[0]],
                "jl" => match self.labels.get(&args[1]).copied() {
                    Some(target) => {
                        self.set(&args[0], next as i32);
                        next = target;
                    }
                    None => self.library(&args[1]),
                },
                "jr" => next = self.reg(&args[0]) as usize,
                "putc" => {
                    let c = self.reg(&args[0]) as u8 as char;
                    self.output.push(c);
                }
                other => panic!("unknown instruction {other}"),
            }
            self.regs[0] = 0;
            pc = next;
        }
        panic!("program did not halt")
    }

    fn library(&mut self, routine: &str) {
        let sp = self.regs[14];
        match routine {
            "getint" => self.regs[1] = self.input.pop_front().expect("input"),
            "intstr" => {
                let value = self.word(sp - 8);
                let buffer = self.word(sp - 12);
                let text = value.to_string();
                for (i, byte) in text.bytes().chain([0]).enumerate() {
                    self.mem[buffer as usize + i] = byte;
                }
                self.regs[13] = buffer;
            }
            "putstr" => {
                let mut addr = self.word(sp - 8) as usize;
                while self.mem[addr] != 0 {
                    self.output.push(self.mem[addr] as char);
                    addr += 1;
                }
            }
            other => panic!("unknown routine {other}"),
        }
    }

    fn reg(&self, name: &str) -> i32 {
        self.regs[register(name)]
    }

    fn set(&mut self, name: &str, value: i32) {
        self.regs[register(name)] = value;
    }

    /// An immediate: a number, a tag or `topaddr`.
    fn value(&self, operand: &str) -> i32 {
        if operand == "topaddr" {
            return MEMORY as i32;
        }
        operand.parse().unwrap_or_else(|_| self.tags[operand])
    }

    /// `K(Rj)`
    fn address(&self, operand: &str) -> i32 {
        let (offset, base) = operand.trim_end_matches(')').split_once('(').expect("K(Rj) operand");
        self.value(offset) + self.reg(base)
    }

    fn word(&self, addr: i32) -> i32 {
        let addr = addr as usize;
        i32::from_le_bytes([self.mem[addr], self.mem[addr + 1], self.mem[addr + 2], self.mem[addr + 3]])
    }

    fn store(&mut self, addr: i32, value: i32) {
        let addr = addr as usize;
        self.mem[addr..addr + 4].copy_from_slice(&value.to_le_bytes());
    }
}

fn split_label(line: &str) -> (Option<&str>, &str) {
    if line.starts_with(' ') {
        return (None, line.trim());
    }
    match line.split_once(char::is_whitespace) {
        Some((label, rest)) => (Some(label), rest.trim()),
        None => (Some(line), ""),
    }
}

fn register(name: &str) -> usize {
    name.strip_prefix('r').and_then(|n| n.parse().ok()).expect("register operand")
}

/// Generate code for `source` and run it.
pub(crate) fn run_source(source: &str, input: &[i32]) -> String {
    let mut ast = moonc_lang_parser::parse_source(source).ast.expect("parsed");
    let elaboration = moonc_lang_elaborator::elaborate(&mut ast);
    assert!(!elaboration.has_errors(), "{:?}", elaboration.errors);
    let program = crate::generate(&ast, &elaboration.tables).expect("generated");
    Vm::load(&program).with_input(input).run()
}
