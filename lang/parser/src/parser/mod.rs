//! Table-driven predictive parser.

mod build;
mod recovery;

use std::mem;

use log::trace;

use moonc_lang_ast::{Ast, Token, TokenKind};

use crate::grammar::{ParseTable, Symbol, TABLE};
use crate::result::ParseError;

use build::AstBuilder;
use recovery::Recovery;

/// Everything a parse produces. The tree is only present if no error was recorded.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub ast: Option<Ast>,
    /// Every applied production, in order.
    pub derivation: Vec<String>,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.ast.is_some()
    }
}

/// Parse a comment-free token stream with the built-in grammar.
pub fn parse(tokens: impl IntoIterator<Item = Token>) -> ParseOutcome {
    Parser::new(&TABLE, tokens.into_iter()).run()
}

pub struct Parser<'t, I> {
    table: &'t ParseTable,
    input: I,
    lookahead: Token,
    /// The most recently matched token.
    previous: Option<Token>,
    stack: Vec<Symbol>,
    builder: AstBuilder,
    derivation: Vec<String>,
    errors: Vec<ParseError>,
}

impl<'t, I: Iterator<Item = Token>> Parser<'t, I> {
    pub fn new(table: &'t ParseTable, mut input: I) -> Self {
        let lookahead = input.next().unwrap_or_else(|| Token::eof(1, 1, 0));
        Parser {
            table,
            input,
            lookahead,
            previous: None,
            stack: vec![Symbol::NonTerminal(table.grammar().start())],
            builder: AstBuilder::default(),
            derivation: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Move to the next token. Past the end, the lookahead stays at `$`.
    fn advance(&mut self) {
        if self.lookahead.kind == TokenKind::Eof {
            return;
        }
        let next = match self.input.next() {
            Some(token) => token,
            None => {
                let last = &self.lookahead;
                let width = last.lexeme.chars().count() as u32;
                Token::eof(last.line, last.column + width, last.span.end().0)
            }
        };
        self.previous = Some(mem::replace(&mut self.lookahead, next));
    }

    pub fn run(mut self) -> ParseOutcome {
        let mut aborted = false;
        while let Some(&top) = self.stack.last() {
            let step = match top {
                Symbol::Action(action) => {
                    self.stack.pop();
                    self.builder.apply(action, self.previous.as_ref());
                    Recovery::Resume
                }
                Symbol::Epsilon => {
                    self.stack.pop();
                    Recovery::Resume
                }
                Symbol::Terminal(expected) if expected == self.lookahead.kind => {
                    self.stack.pop();
                    self.advance();
                    Recovery::Resume
                }
                Symbol::Terminal(expected) => self.recover_terminal(expected),
                Symbol::NonTerminal(nt) => match self.table.predict(nt, self.lookahead.kind) {
                    Some(rule) => {
                        self.stack.pop();
                        let line = self.table.grammar().display_rule(rule);
                        trace!("{line}");
                        self.derivation.push(line);
                        self.stack.extend(self.table.grammar().rule(rule).rhs.iter().rev());
                        Recovery::Resume
                    }
                    None => self.recover_nonterminal(nt),
                },
            };
            if step == Recovery::Abort {
                aborted = true;
                break;
            }
        }

        if !aborted && self.lookahead.kind != TokenKind::Eof {
            self.errors.push(ParseError::unexpected(TokenKind::Eof, &self.lookahead));
        }

        let ast = if self.errors.is_empty() { self.builder.finish() } else { None };
        ParseOutcome { ast, derivation: self.derivation, errors: self.errors }
    }
}

#[cfg(test)]
mod tests {
    use moonc_lang_ast::NodeKind;

    use super::*;
    use crate::lexer::lex;
    use crate::scanner::TeeExt;

    fn parse_text(text: &str) -> ParseOutcome {
        parse(lex(text).into_iter().without_comments(None))
    }

    fn dump(text: &str) -> String {
        let outcome = parse_text(text);
        assert!(outcome.errors.is_empty(), "{:#?}", outcome.errors);
        outcome.ast.unwrap().dump().to_string()
    }

    #[test]
    fn assignment_in_function() {
        assert_eq!(
            dump("func other() -> void { id3 = 12; }"),
            "Prog
| StructOrImplOrFuncList
| | FuncDef
| | | Id: other
| | | ParamList
| | | ReturnType
| | | | Void: void
| | | Body
| | | | Assign
| | | | | Variable
| | | | | | Subject
| | | | | | Id: id3
| | | | | | IndexList
| | | | | ArithExpr
| | | | | | Factor
| | | | | | | IntNum: 12
"
        );
    }

    #[test]
    fn empty_program() {
        assert_eq!(dump(""), "Prog\n| StructOrImplOrFuncList\n");
        assert_eq!(dump("// only a comment"), "Prog\n| StructOrImplOrFuncList\n");
    }

    #[test]
    fn struct_with_members() {
        assert_eq!(
            dump("struct B inherits A, C { public let x: integer[2][]; private func f(a: float) -> B; };"),
            "Prog
| StructOrImplOrFuncList
| | StructDecl
| | | Id: B
| | | InheritList
| | | | Id: A
| | | | Id: C
| | | MemberList
| | | | Member
| | | | | Public: public
| | | | | VarDecl
| | | | | | Id: x
| | | | | | Type
| | | | | | | Integer: integer
| | | | | | DimList
| | | | | | | IntNum: 2
| | | | | | | EmptyDim
| | | | Member
| | | | | Private: private
| | | | | FuncDecl
| | | | | | Id: f
| | | | | | ParamList
| | | | | | | FuncDefParam
| | | | | | | | Id: a
| | | | | | | | Type
| | | | | | | | | Float: float
| | | | | | | | DimList
| | | | | | ReturnType
| | | | | | | Id: B
"
        );
    }

    #[test]
    fn chained_access_nests_to_the_left() {
        assert_eq!(
            dump("func main() -> void { a[1].b.f(2).c = -x * 3 + 4 < 5; }"),
            "Prog
| StructOrImplOrFuncList
| | FuncDef
| | | Id: main
| | | ParamList
| | | ReturnType
| | | | Void: void
| | | Body
| | | | Assign
| | | | | Variable
| | | | | | Subject
| | | | | | | FuncCall
| | | | | | | | Subject
| | | | | | | | | Variable
| | | | | | | | | | Subject
| | | | | | | | | | | Variable
| | | | | | | | | | | | Subject
| | | | | | | | | | | | Id: a
| | | | | | | | | | | | IndexList
| | | | | | | | | | | | | ArithExpr
| | | | | | | | | | | | | | Factor
| | | | | | | | | | | | | | | IntNum: 1
| | | | | | | | | | Id: b
| | | | | | | | | | IndexList
| | | | | | | | Id: f
| | | | | | | | ArgList
| | | | | | | | | ArithExpr
| | | | | | | | | | Factor
| | | | | | | | | | | IntNum: 2
| | | | | | Id: c
| | | | | | IndexList
| | | | | RelExpr
| | | | | | Lt: <
| | | | | | | ArithExpr
| | | | | | | | Plus: +
| | | | | | | | | Mult: *
| | | | | | | | | | Factor
| | | | | | | | | | | Sign: -
| | | | | | | | | | | | Factor
| | | | | | | | | | | | | Variable
| | | | | | | | | | | | | | Subject
| | | | | | | | | | | | | | Id: x
| | | | | | | | | | | | | | IndexList
| | | | | | | | | | Factor
| | | | | | | | | | | IntNum: 3
| | | | | | | | | Factor
| | | | | | | | | | IntNum: 4
| | | | | | | ArithExpr
| | | | | | | | Factor
| | | | | | | | | IntNum: 5
"
        );
    }

    #[test]
    fn control_flow_and_io() {
        let outcome = parse_text(
            "func main() -> void {
                let i: integer;
                read(i);
                while (i > 0) { write(i); i = i - 1; };
                if (i == 0) then write(1); else ;
                return (i);
            }",
        );
        assert!(outcome.errors.is_empty(), "{:#?}", outcome.errors);
        let ast = outcome.ast.unwrap();
        let root = ast.root().unwrap();
        let body: Vec<NodeKind> = ast
            .preorder(root)
            .find(|id| ast.kind(*id) == NodeKind::Body)
            .map(|body| ast.children(body).iter().map(|c| ast.kind(*c)).collect())
            .unwrap();
        assert_eq!(
            body,
            vec![NodeKind::VarDecl, NodeKind::Read, NodeKind::While, NodeKind::If, NodeKind::Return]
        );
        assert!(ast.links_consistent());
    }

    #[test]
    fn derivation_lists_productions() {
        let outcome = parse_text("");
        assert_eq!(
            outcome.derivation,
            vec!["<prog> ::= <structOrImplOrFuncList>", "<structOrImplOrFuncList> ::= EPSILON"]
        );
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let outcome = parse_text("func f() -> void { } }");
        assert!(outcome.ast.is_none());
        assert!(matches!(
            outcome.errors.as_slice(),
            [ParseError::NoRule { found: TokenKind::CloseCubr, .. }, ..]
                | [ParseError::UnexpectedToken { expected: TokenKind::Eof, .. }]
        ));
    }
}
