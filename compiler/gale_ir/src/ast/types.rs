//! Type expressions.

use crate::{ExprId, Name, Span, TypeExprId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExprKind {
    /// `int`, `Point`, ...
    Named(Name),
    /// `pkg.Name`
    Qualified { package: Name, name: Name },
    /// `[]T`
    Slice(TypeExprId),
    /// `[N]T`; the length is a constant expression.
    Array { len: ExprId, elem: TypeExprId },
    /// `map[K]V`
    Map { key: TypeExprId, value: TypeExprId },
    /// `*T`
    Pointer(TypeExprId),
    /// `func(...) ...`
    Func(FuncSig),
    Struct(Box<[FieldDecl]>),
    Interface(Box<[MethodSpec]>),
}

/// Function signature: parameters, results and the variadic marker.
///
/// When `variadic` is set, the last parameter's type is the element type `T`
/// of the implicit `[]T` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Box<[Param]>,
    pub results: Box<[Param]>,
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Option<Name>,
    pub ty: TypeExprId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: TypeExprId,
    pub embedded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSpec {
    pub name: Name,
    pub sig: FuncSig,
}
