use pretty::DocAllocator;

use moonc_lang_printer::theme::ThemeExt;
use moonc_lang_printer::tokens::*;
use moonc_lang_printer::util::{ParensExt, comma_separated};
use moonc_lang_printer::{Alloc, Builder, Print, PrintCfg};

use crate::kind::NodeKind;
use crate::token::TokenKind;
use crate::tree::{Ast, NodeId};

/// Prints the tree back as source text.
impl Print for Ast {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self.root() {
            Some(root) => Printer { ast: self, cfg, alloc }.node(root),
            None => alloc.nil(),
        }
    }
}

struct Printer<'a, 'c> {
    ast: &'a Ast,
    cfg: &'c PrintCfg,
    alloc: &'a Alloc<'a>,
}

impl<'a> Printer<'a, '_> {
    fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.ast.children(id).iter().copied()
    }

    fn child(&self, id: NodeId, n: usize) -> Builder<'a> {
        match self.ast.child(id, n) {
            Some(child) => self.node(child),
            None => self.alloc.nil(),
        }
    }

    fn lexeme(&self, id: NodeId) -> &'a str {
        self.ast.lexeme(id)
    }

    fn block(&self, items: Vec<Builder<'a>>) -> Builder<'a> {
        let alloc = self.alloc;
        if items.is_empty() {
            return alloc.text("{ }");
        }
        let body = alloc.intersperse(items, alloc.hardline());
        alloc
            .text("{")
            .append(alloc.hardline().append(body).nest(self.cfg.indent))
            .append(alloc.hardline())
            .append("}")
    }

    fn node(&self, id: NodeId) -> Builder<'a> {
        use NodeKind::*;
        let alloc = self.alloc;
        match self.ast.kind(id) {
            Prog => self.child(id, 0),
            StructOrImplOrFuncList => {
                let sep = if self.cfg.omit_decl_sep {
                    alloc.hardline()
                } else {
                    alloc.hardline().append(alloc.hardline())
                };
                alloc.intersperse(self.children(id).map(|decl| self.node(decl)), sep)
            }
            StructDecl => {
                let inherits: Vec<_> = self
                    .ast
                    .child(id, 1)
                    .map(|list| self.children(list).collect())
                    .unwrap_or_default();
                let head = alloc.keyword(STRUCT).append(alloc.space()).append(self.child(id, 0));
                let head = if inherits.is_empty() {
                    head
                } else {
                    head.append(alloc.space())
                        .append(alloc.keyword(INHERITS))
                        .append(alloc.space())
                        .append(comma_separated(alloc, inherits.into_iter().map(|i| self.node(i))))
                };
                let members = self
                    .ast
                    .child(id, 2)
                    .map(|list| self.children(list).map(|m| self.node(m)).collect())
                    .unwrap_or_default();
                head.append(alloc.space()).append(self.block(members)).append(SEMI)
            }
            Member => self.child(id, 0).append(alloc.space()).append(self.child(id, 1)),
            Public | Private => alloc.keyword(self.lexeme(id)),
            ImplDef => {
                let funcs = self
                    .ast
                    .child(id, 1)
                    .map(|list| self.children(list).map(|f| self.node(f)).collect())
                    .unwrap_or_default();
                alloc
                    .keyword(IMPL)
                    .append(alloc.space())
                    .append(self.child(id, 0))
                    .append(alloc.space())
                    .append(self.block(funcs))
            }
            FuncDecl => self.func_head(id).append(SEMI),
            FuncDef => {
                let body = self
                    .ast
                    .child(id, 3)
                    .map(|body| self.children(body).map(|item| self.node(item)).collect())
                    .unwrap_or_default();
                self.func_head(id).append(alloc.space()).append(self.block(body))
            }
            ParamList | ArgList => {
                comma_separated(alloc, self.children(id).map(|p| self.node(p))).parens_group()
            }
            FuncDefParam => self
                .child(id, 0)
                .append(COLON)
                .append(alloc.space())
                .append(self.child(id, 1))
                .append(self.child(id, 2)),
            VarDecl => alloc
                .keyword(LET)
                .append(alloc.space())
                .append(self.child(id, 0))
                .append(COLON)
                .append(alloc.space())
                .append(self.child(id, 1))
                .append(self.child(id, 2))
                .append(SEMI),
            Type | ReturnType => self.child(id, 0),
            Integer | Float | Void => alloc.typ(self.lexeme(id)),
            DimList => alloc.concat(self.children(id).map(|dim| self.node(dim))),
            EmptyDim => alloc.text("[]"),
            Id => match self.ast.token(id).map(|token| token.kind) {
                Some(TokenKind::Id) => alloc.ident(self.lexeme(id)),
                _ => alloc.keyword(self.lexeme(id)),
            },
            IntNum | FloatNum => alloc.literal(self.lexeme(id)),
            Body | StatBlock => self.block(self.children(id).map(|s| self.node(s)).collect()),
            Assign => self
                .child(id, 0)
                .append(alloc.space())
                .append(alloc.op(ASSIGN))
                .append(alloc.space())
                .append(self.child(id, 1))
                .append(SEMI),
            If => {
                let then_block = self.stat_block(id, 1);
                let else_block = self.stat_block(id, 2);
                alloc
                    .keyword(IF)
                    .append(alloc.space())
                    .append(self.child(id, 0).parens_group())
                    .append(alloc.space())
                    .append(alloc.keyword(THEN))
                    .append(then_block)
                    .append(alloc.space())
                    .append(alloc.keyword(ELSE))
                    .append(else_block)
                    .append(SEMI)
            }
            While => alloc
                .keyword(WHILE)
                .append(alloc.space())
                .append(self.child(id, 0).parens_group())
                .append(self.stat_block(id, 1))
                .append(SEMI),
            Read => self.keyword_call(READ, id),
            Write => self.keyword_call(WRITE, id),
            Return => self.keyword_call(RETURN, id),
            FuncCall => {
                let call = self.chain(id).append(self.child(id, 2));
                if self.is_statement(id) { call.append(SEMI) } else { call }
            }
            Variable => {
                let indices = self
                    .ast
                    .child(id, 2)
                    .map(|list| {
                        alloc.concat(self.children(list).map(|index| {
                            self.node(index).enclose("[", "]")
                        }))
                    })
                    .unwrap_or_else(|| alloc.nil());
                self.chain(id).append(indices)
            }
            Subject => match self.ast.child(id, 0) {
                Some(inner) => self.node(inner).append(DOT),
                None => alloc.nil(),
            },
            ArithExpr | RelExpr => self.child(id, 0),
            Factor => match self.ast.child(id, 0) {
                Some(inner) if self.ast.kind(inner) == ArithExpr => self.node(inner).parens_group(),
                Some(inner) => self.node(inner),
                None => alloc.nil(),
            },
            Not => alloc.op(NOT).append(self.child(id, 0)),
            Sign => alloc.op(self.lexeme(id)).append(self.child(id, 0)),
            kind if kind.is_binary_op() => self
                .child(id, 0)
                .append(alloc.space())
                .append(alloc.op(self.lexeme(id)))
                .append(alloc.space())
                .append(self.child(id, 1)),
            InheritList | MemberList | FuncDefList | IndexList => {
                alloc.concat(self.children(id).map(|c| self.node(c)))
            }
            _ => alloc.nil(),
        }
    }

    fn func_head(&self, id: NodeId) -> Builder<'a> {
        let alloc = self.alloc;
        alloc
            .keyword(FUNC)
            .append(alloc.space())
            .append(self.child(id, 0))
            .append(self.child(id, 1))
            .append(alloc.space())
            .append(ARROW)
            .append(alloc.space())
            .append(self.child(id, 2))
    }

    fn chain(&self, id: NodeId) -> Builder<'a> {
        self.child(id, 0).append(self.child(id, 1))
    }

    fn keyword_call(&self, keyword: &'static str, id: NodeId) -> Builder<'a> {
        self.alloc.keyword(keyword).append(self.child(id, 0).parens_group()).append(SEMI)
    }

    /// An empty block is printed as nothing, which parses back as an empty `StatBlock`.
    fn stat_block(&self, id: NodeId, n: usize) -> Builder<'a> {
        match self.ast.child(id, n) {
            Some(block) if !self.ast.children(block).is_empty() => {
                self.alloc.space().append(self.node(block))
            }
            _ => self.alloc.nil(),
        }
    }

    fn is_statement(&self, id: NodeId) -> bool {
        self.ast
            .parent(id)
            .map(|parent| matches!(self.ast.kind(parent), NodeKind::Body | NodeKind::StatBlock))
            .unwrap_or(false)
    }
}
