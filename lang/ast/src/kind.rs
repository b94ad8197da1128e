use std::fmt;
use std::str::FromStr;

macro_rules! node_kinds {
    ($($variant:ident),* $(,)?) => {
        /// The label of an AST node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($variant),*
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

node_kinds! {
    Prog,
    StructOrImplOrFuncList,
    StructDecl,
    InheritList,
    MemberList,
    Member,
    Public,
    Private,
    ImplDef,
    FuncDefList,
    FuncDecl,
    FuncDef,
    ParamList,
    FuncDefParam,
    ReturnType,
    Type,
    Integer,
    Float,
    Void,
    Id,
    VarDecl,
    DimList,
    IntNum,
    FloatNum,
    EmptyDim,
    Body,
    StatBlock,
    Assign,
    If,
    While,
    Read,
    Write,
    Return,
    FuncCall,
    Variable,
    Subject,
    IndexList,
    ArgList,
    ArithExpr,
    RelExpr,
    Factor,
    Not,
    Sign,
    Plus,
    Minus,
    Or,
    Mult,
    Div,
    And,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

impl NodeKind {
    /// Operators of arithmetic expressions: `+ - | * / &`.
    pub fn is_arith_op(self) -> bool {
        use NodeKind::*;
        matches!(self, Plus | Minus | Or | Mult | Div | And)
    }

    /// Relational operators: `== <> < <= > >=`.
    pub fn is_rel_op(self) -> bool {
        use NodeKind::*;
        matches!(self, Eq | Neq | Lt | Leq | Gt | Geq)
    }

    pub fn is_binary_op(self) -> bool {
        self.is_arith_op() || self.is_rel_op()
    }

    /// Statement nodes that may occur in a `Body` or `StatBlock`.
    pub fn is_statement(self) -> bool {
        use NodeKind::*;
        matches!(self, Assign | If | While | Read | Write | Return | FuncCall)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown node kind `{s}`"))
    }
}
