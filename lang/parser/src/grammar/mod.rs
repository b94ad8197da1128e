//! The text grammar and its in-memory form.

pub mod table;

use std::fmt;

use thiserror::Error;

use moonc_lang_ast::{HashMap, NodeKind, TokenKind};

pub use table::{Conflict, ParseTable, TABLE};

/// An interned nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonTerminal(pub u16);

impl NonTerminal {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An AST building step embedded in a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Push the sentinel that bounds a following `List`.
    Mark,
    /// Push a node carrying the last matched token.
    Leaf(NodeKind),
    /// Pop up to `n` nodes and make them the children of a new node.
    Node(NodeKind, usize),
    /// Pop every node above the sentinel into a new node.
    List(NodeKind),
    /// Attach one (unary) or two (binary) operands to an operator node.
    Adopt(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Mark => write!(f, "#mark"),
            Action::Leaf(kind) => write!(f, "#leaf:{kind}"),
            Action::Node(kind, n) => write!(f, "#node:{kind}/{n}"),
            Action::List(kind) => write!(f, "#list:{kind}"),
            Action::Adopt(n) => write!(f, "#adopt:{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
    Action(Action),
    Epsilon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: NonTerminal,
    pub rhs: Vec<Symbol>,
}

impl Rule {
    /// The grammar symbols of the right-hand side, without actions.
    pub fn grammar_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.rhs.iter().copied().filter(|sym| matches!(sym, Symbol::Terminal(_) | Symbol::NonTerminal(_)))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("line {line}: expected `<nonterminal> ::=`")]
    MissingHead { line: usize },
    #[error("line {line}: alternative without a preceding rule")]
    DanglingAlternative { line: usize },
    #[error("line {line}: unknown terminal `{name}`")]
    UnknownTerminal { line: usize, name: String },
    #[error("line {line}: malformed action `{action}`")]
    MalformedAction { line: usize, action: String },
    #[error("nonterminal <{name}> is used but never defined")]
    Undefined { name: String },
    #[error("the grammar has no rules")]
    Empty,
}

/// A context-free grammar with embedded actions. The first rule's head is the start symbol.
#[derive(Debug, Clone)]
pub struct Grammar {
    names: Vec<String>,
    rules: Vec<Rule>,
}

impl Grammar {
    pub fn parse(text: &str) -> Result<Grammar, GrammarError> {
        let mut builder = Builder::default();
        let mut current: Option<NonTerminal> = None;
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (lhs, rest) = match trimmed.strip_prefix('|') {
                Some(rest) => (current.ok_or(GrammarError::DanglingAlternative { line })?, rest),
                None => {
                    let (head, rest) =
                        trimmed.split_once("::=").ok_or(GrammarError::MissingHead { line })?;
                    let name = head
                        .trim()
                        .strip_prefix('<')
                        .and_then(|h| h.strip_suffix('>'))
                        .ok_or(GrammarError::MissingHead { line })?;
                    let lhs = builder.intern(name);
                    builder.defined.push(lhs);
                    current = Some(lhs);
                    (lhs, rest)
                }
            };
            builder.alternatives(lhs, rest, line)?;
        }
        builder.finish()
    }

    pub fn start(&self) -> NonTerminal {
        NonTerminal(0)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, idx: usize) -> &Rule {
        &self.rules[idx]
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        (0..self.names.len() as u16).map(NonTerminal)
    }

    pub fn name(&self, nt: NonTerminal) -> &str {
        &self.names[nt.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<NonTerminal> {
        self.names.iter().position(|n| n == name).map(|idx| NonTerminal(idx as u16))
    }

    /// `<lhs> ::= <rhs symbols>` with actions left out.
    pub fn display_rule(&self, idx: usize) -> String {
        let rule = &self.rules[idx];
        let rhs: Vec<String> = rule
            .grammar_symbols()
            .map(|sym| match sym {
                Symbol::Terminal(t) => t.name().to_owned(),
                Symbol::NonTerminal(nt) => format!("<{}>", self.name(nt)),
                Symbol::Action(_) | Symbol::Epsilon => unreachable!(),
            })
            .collect();
        let rhs = if rhs.is_empty() { "EPSILON".to_owned() } else { rhs.join(" ") };
        format!("<{}> ::= {}", self.name(rule.lhs), rhs)
    }
}

#[derive(Default)]
struct Builder {
    names: Vec<String>,
    index: HashMap<String, NonTerminal>,
    defined: Vec<NonTerminal>,
    rules: Vec<Rule>,
}

impl Builder {
    fn intern(&mut self, name: &str) -> NonTerminal {
        if let Some(nt) = self.index.get(name) {
            return *nt;
        }
        let nt = NonTerminal(self.names.len() as u16);
        self.names.push(name.to_owned());
        self.index.insert(name.to_owned(), nt);
        nt
    }

    fn alternatives(&mut self, lhs: NonTerminal, text: &str, line: usize) -> Result<(), GrammarError> {
        for alternative in text.split('|') {
            let rhs = alternative
                .split_whitespace()
                .map(|word| self.symbol(word, line))
                .collect::<Result<Vec<_>, _>>()?;
            self.rules.push(Rule { lhs, rhs });
        }
        Ok(())
    }

    fn symbol(&mut self, word: &str, line: usize) -> Result<Symbol, GrammarError> {
        if word == "EPSILON" {
            return Ok(Symbol::Epsilon);
        }
        if let Some(name) = word.strip_prefix('<').and_then(|w| w.strip_suffix('>')) {
            return Ok(Symbol::NonTerminal(self.intern(name)));
        }
        if let Some(action) = word.strip_prefix('#') {
            return parse_action(action)
                .map(Symbol::Action)
                .ok_or_else(|| GrammarError::MalformedAction { line, action: word.to_owned() });
        }
        word.parse::<TokenKind>()
            .map(Symbol::Terminal)
            .map_err(|_| GrammarError::UnknownTerminal { line, name: word.to_owned() })
    }

    fn finish(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        let undefined = (0..self.names.len() as u16)
            .map(NonTerminal)
            .find(|nt| !self.defined.contains(nt));
        if let Some(nt) = undefined {
            return Err(GrammarError::Undefined { name: self.names[nt.index()].clone() });
        }
        Ok(Grammar { names: self.names, rules: self.rules })
    }
}

fn parse_action(text: &str) -> Option<Action> {
    if text == "mark" {
        return Some(Action::Mark);
    }
    let (name, arg) = text.split_once(':')?;
    match name {
        "leaf" => arg.parse().ok().map(Action::Leaf),
        "list" => arg.parse().ok().map(Action::List),
        "node" => {
            let (kind, n) = arg.split_once('/')?;
            Some(Action::Node(kind.parse().ok()?, n.parse().ok()?))
        }
        "adopt" => match arg {
            "1" => Some(Action::Adopt(1)),
            "2" => Some(Action::Adopt(2)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_and_actions() {
        let grammar = Grammar::parse(
            "# comment\n<a> ::= id #leaf:Id <b> #node:Variable/2\n    | EPSILON\n<b> ::= #mark semi #list:Body\n",
        )
        .unwrap();
        assert_eq!(grammar.rules().len(), 3);
        assert_eq!(grammar.name(grammar.start()), "a");
        let b = grammar.lookup("b").unwrap();
        assert_eq!(
            grammar.rule(0).rhs,
            vec![
                Symbol::Terminal(TokenKind::Id),
                Symbol::Action(Action::Leaf(NodeKind::Id)),
                Symbol::NonTerminal(b),
                Symbol::Action(Action::Node(NodeKind::Variable, 2)),
            ]
        );
        assert_eq!(grammar.display_rule(0), "<a> ::= id <b>");
        assert_eq!(grammar.display_rule(1), "<a> ::= EPSILON");
        assert_eq!(grammar.display_rule(2), "<b> ::= semi");
    }

    #[test]
    fn rejects_bad_grammars() {
        assert_eq!(Grammar::parse("<a> ::= <b>").unwrap_err(), GrammarError::Undefined { name: "b".into() });
        assert!(matches!(Grammar::parse("<a> ::= bogus"), Err(GrammarError::UnknownTerminal { .. })));
        assert!(matches!(Grammar::parse("<a> ::= #adopt:3"), Err(GrammarError::MalformedAction { .. })));
        assert!(matches!(Grammar::parse("| id"), Err(GrammarError::DanglingAlternative { line: 1 })));
        assert!(matches!(Grammar::parse("a ::= id"), Err(GrammarError::MissingHead { line: 1 })));
    }
}
