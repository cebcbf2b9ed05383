//! Gale IR - syntax tree and identifiers shared by every compiler stage.
//!
//! This crate contains the data structures the parser hands to the core:
//! - Spans for source locations
//! - Names for interned identifiers
//! - A flat arena of expressions, statements and type expressions
//! - Top-level items (const/var blocks, types, funcs, methods, imports)
//! - A builder for constructing trees without a parser
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers are `Name(u32)`
//! - **Flatten Everything**: children are `ExprId`/`StmtId`/`TypeExprId` indices
//! - Float literals are stored as `u64` bits so syntax nodes stay `Eq + Hash`

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
mod builder;
mod ids;
mod interner;
mod name;
mod span;
pub mod visitor;

pub use arena::{SharedArena, SyntaxArena};
pub use ast::{
    BinaryOp, Block, CompositeElem, Expr, ExprKind, FieldDecl, FuncDecl, FuncSig, ImportSpec,
    Item, MethodSpec, Param, Stmt, StmtKind, TypeExpr, TypeExprKind, TypeSpec, UnaryOp,
    ValueSpec,
};
pub use builder::AstBuilder;
pub use ids::{ExprId, StmtId, TypeExprId};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{ExprId, Name, Span};
    static_assert_size!(Name, 4);
    static_assert_size!(ExprId, 4);
    static_assert_size!(Span, 8);
}
