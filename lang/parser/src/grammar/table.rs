//! FIRST and FOLLOW sets and the LL(1) predict table.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use moonc_lang_ast::{HashMap, TokenKind};

use super::{Grammar, NonTerminal, Symbol};

/// The table for the built-in grammar, computed on first use.
pub static TABLE: LazyLock<ParseTable> = LazyLock::new(|| {
    let grammar = match Grammar::parse(include_str!("moon.grm")) {
        Ok(grammar) => grammar,
        Err(err) => panic!("built-in grammar is malformed: {err}"),
    };
    let table = ParseTable::new(grammar);
    if let Some(conflict) = table.conflicts().first() {
        panic!("built-in grammar is not LL(1): {}", conflict.describe(table.grammar()));
    }
    table
});

/// Two productions of `nonterminal` predicted by the same `terminal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub nonterminal: NonTerminal,
    pub terminal: TokenKind,
    pub rules: (usize, usize),
}

impl Conflict {
    pub fn describe(&self, grammar: &Grammar) -> String {
        format!(
            "<{}> on {}: `{}` and `{}`",
            grammar.name(self.nonterminal),
            self.terminal,
            grammar.display_rule(self.rules.0),
            grammar.display_rule(self.rules.1)
        )
    }
}

type TerminalSet = BTreeSet<TokenKind>;

pub struct ParseTable {
    grammar: Grammar,
    nullable: Vec<bool>,
    first: Vec<TerminalSet>,
    follow: Vec<TerminalSet>,
    predict: HashMap<(NonTerminal, TokenKind), usize>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn new(grammar: Grammar) -> Self {
        let count = grammar.nonterminals().count();
        let mut table = ParseTable {
            grammar,
            nullable: vec![false; count],
            first: vec![TerminalSet::new(); count],
            follow: vec![TerminalSet::new(); count],
            predict: HashMap::default(),
            conflicts: Vec::new(),
        };
        table.compute_first();
        table.compute_follow();
        table.compute_predict();
        table
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn is_nullable(&self, nt: NonTerminal) -> bool {
        self.nullable[nt.index()]
    }

    pub fn first(&self, nt: NonTerminal) -> &TerminalSet {
        &self.first[nt.index()]
    }

    pub fn follow(&self, nt: NonTerminal) -> &TerminalSet {
        &self.follow[nt.index()]
    }

    /// The production to expand `nt` with when `lookahead` is next.
    pub fn predict(&self, nt: NonTerminal, lookahead: TokenKind) -> Option<usize> {
        self.predict.get(&(nt, lookahead)).copied()
    }

    /// The terminals that may appear where `nt` is expected.
    pub fn expected(&self, nt: NonTerminal) -> TerminalSet {
        let mut set = self.first(nt).clone();
        if self.is_nullable(nt) {
            set.extend(self.follow(nt));
        }
        set
    }

    /// FIRST of a symbol sequence and whether the whole sequence is nullable.
    fn first_of(&self, symbols: &[Symbol]) -> (TerminalSet, bool) {
        let mut set = TerminalSet::new();
        for sym in symbols {
            match sym {
                Symbol::Terminal(t) => {
                    set.insert(*t);
                    return (set, false);
                }
                Symbol::NonTerminal(nt) => {
                    set.extend(self.first(*nt));
                    if !self.is_nullable(*nt) {
                        return (set, false);
                    }
                }
                Symbol::Action(_) | Symbol::Epsilon => {}
            }
        }
        (set, true)
    }

    fn compute_first(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in self.grammar.rules() {
                let (set, nullable) = self.first_of(&rule.rhs);
                let lhs = rule.lhs.index();
                if nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
                let before = self.first[lhs].len();
                self.first[lhs].extend(set);
                changed |= self.first[lhs].len() != before;
            }
        }
    }

    fn compute_follow(&mut self) {
        self.follow[self.grammar.start().index()].insert(TokenKind::Eof);
        let mut changed = true;
        while changed {
            changed = false;
            for rule in self.grammar.rules() {
                for (pos, sym) in rule.rhs.iter().enumerate() {
                    let Symbol::NonTerminal(nt) = sym else { continue };
                    let (mut set, nullable) = self.first_of(&rule.rhs[pos + 1..]);
                    if nullable {
                        set.extend(self.follow[rule.lhs.index()].iter().copied());
                    }
                    let before = self.follow[nt.index()].len();
                    self.follow[nt.index()].extend(set);
                    changed |= self.follow[nt.index()].len() != before;
                }
            }
        }
    }

    fn compute_predict(&mut self) {
        for (idx, rule) in self.grammar.rules().iter().enumerate() {
            let (mut set, nullable) = self.first_of(&rule.rhs);
            if nullable {
                set.extend(self.follow(rule.lhs));
            }
            for terminal in set {
                match self.predict.get(&(rule.lhs, terminal)) {
                    Some(&other) if other != idx => self.conflicts.push(Conflict {
                        nonterminal: rule.lhs,
                        terminal,
                        rules: (other, idx),
                    }),
                    Some(_) => {}
                    None => {
                        self.predict.insert((rule.lhs, terminal), idx);
                    }
                }
            }
        }
    }
}
