//! Top-level items as produced by the parser.

use super::{Block, FuncSig, Param};
use crate::{ExprId, Name, Span, TypeExprId};

/// One line of a `const` or `var` block: `a, b T = x, y`.
///
/// In a const block a spec with no values repeats the previous spec's
/// type and values; the loader resolves that.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueSpec {
    pub names: Box<[Name]>,
    pub ty: Option<TypeExprId>,
    pub values: Box<[ExprId]>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    pub name: Name,
    pub ty: TypeExprId,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    pub span: Span,
}

/// Function, method or (pre-expanded) macro declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FuncDecl {
    pub name: Name,
    pub recv: Option<Param>,
    pub sig: FuncSig,
    /// `None` for body-less (external) declarations.
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImportSpec {
    pub path: Name,
    pub alias: Option<Name>,
    pub span: Span,
}

/// Top-level item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Item {
    Const(Box<[ValueSpec]>),
    Var(Box<[ValueSpec]>),
    Type(TypeSpec),
    Func(FuncDecl),
    Macro(FuncDecl),
    Import(ImportSpec),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Const(specs) | Item::Var(specs) => specs
                .iter()
                .map(|s| s.span)
                .reduce(Span::merge)
                .unwrap_or(Span::DUMMY),
            Item::Type(spec) => spec.span,
            Item::Func(decl) | Item::Macro(decl) => decl.span,
            Item::Import(spec) => spec.span,
        }
    }
}
