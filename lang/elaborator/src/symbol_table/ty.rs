use std::fmt;

use derivative::Derivative;

use moonc_lang_ast::{Ast, NodeId, NodeKind};
use moonc_lang_miette_util::codespan::Span;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Integer,
    Float,
    Void,
    /// A struct type.
    Named(String),
}

/// A base type with array dimensions. A dimension of `0` stands for `[]`.
///
/// Equality ignores where the type was written.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub dims: Vec<u32>,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub span: Option<Span>,
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type { base, dims: Vec::new(), span: None }
    }

    pub fn integer() -> Self {
        Type::new(BaseType::Integer)
    }

    pub fn float() -> Self {
        Type::new(BaseType::Float)
    }

    pub fn void() -> Self {
        Type::new(BaseType::Void)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::new(BaseType::Named(name.into()))
    }

    pub fn with_dims(mut self, dims: Vec<u32>) -> Self {
        self.dims = dims;
        self
    }

    /// Read the type of a `VarDecl` or `FuncDefParam` (`Id`, `Type`, `DimList`),
    /// or of a bare `Type`/`ReturnType` node.
    ///
    /// Invalid extents are read as `[]` and reported by [`invalid_dims`].
    pub fn from_decl(ast: &Ast, id: NodeId) -> Type {
        match ast.kind(id) {
            NodeKind::Type | NodeKind::ReturnType => {
                let Some(leaf) = ast.child(id, 0) else {
                    return Type::void();
                };
                let base = match ast.kind(leaf) {
                    NodeKind::Integer => BaseType::Integer,
                    NodeKind::Float => BaseType::Float,
                    NodeKind::Void => BaseType::Void,
                    _ => BaseType::Named(ast.lexeme(leaf).to_owned()),
                };
                Type { base, dims: Vec::new(), span: ast.span(id) }
            }
            _ => {
                let base = ast.child(id, 1).map(|ty| Type::from_decl(ast, ty)).unwrap_or_else(Type::void);
                let dims = ast
                    .child(id, 2)
                    .map(|dims| {
                        ast.children(dims).iter().map(|dim| dimension(ast, *dim).unwrap_or(0)).collect()
                    })
                    .unwrap_or_default();
                base.with_dims(dims)
            }
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.base, BaseType::Named(_))
    }

    pub fn struct_name(&self) -> Option<&str> {
        match &self.base {
            BaseType::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Equality without privacy or position information. Privacy is kept on
    /// the `Record`, so this is plain equality ignoring the span.
    pub fn equals_no_privacy(&self, other: &Type) -> bool {
        self == other
    }

    /// Whether an argument of type `arg` may be passed for a parameter of this type.
    /// A parameter dimension written `[]` accepts any extent.
    pub fn matches_param(&self, arg: &Type) -> bool {
        self.base == arg.base
            && self.dims.len() == arg.dims.len()
            && self.dims.iter().zip(&arg.dims).all(|(param, arg)| *param == 0 || param == arg)
    }

    /// Drop the first `n` dimensions, as indexing does.
    pub fn indexed(&self, n: usize) -> Type {
        Type { base: self.base.clone(), dims: self.dims[n.min(self.dims.len())..].to_vec(), span: self.span }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Integer => f.write_str("integer"),
            BaseType::Float => f.write_str("float"),
            BaseType::Void => f.write_str("void"),
            BaseType::Named(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for dim in &self.dims {
            match dim {
                0 => write!(f, "[]")?,
                n => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

/// The extent of an `IntNum` or `EmptyDim` dimension, `0` for `[]`.
/// `None` if the extent is zero or does not fit in `u32`.
fn dimension(ast: &Ast, dim: NodeId) -> Option<u32> {
    match ast.kind(dim) {
        NodeKind::EmptyDim => Some(0),
        _ => ast.lexeme(dim).parse().ok().filter(|extent| *extent > 0),
    }
}

/// The dimensions of a `VarDecl` or `FuncDefParam` without a valid extent.
pub fn invalid_dims(ast: &Ast, decl: NodeId) -> Vec<NodeId> {
    ast.child(decl, 2)
        .map(|dims| ast.children(dims).iter().copied().filter(|dim| dimension(ast, *dim).is_none()).collect())
        .unwrap_or_default()
}

/// `name(t1, t2)`
pub fn signature(name: &str, params: &[Type]) -> String {
    let params: Vec<String> = params.iter().map(Type::to_string).collect();
    format!("{name}({})", params.join(", "))
}
