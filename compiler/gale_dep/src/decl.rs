//! Declarations: one named top-level entity plus its syntax and dependencies.

use gale_ir::{
    ExprId, FuncDecl, ImportSpec, Name, SharedArena, Span, TypeExprId, TypeSpec, ValueSpec,
};
use std::sync::{Arc, OnceLock};

use crate::deps::{self, DepSet};
use crate::kind::Kind;

/// Syntax owned by a single declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnedNode {
    Import(ImportSpec),
    Type(TypeSpec),
    /// Function, method or macro.
    Func(FuncDecl),
    /// Single-name value spec, with implicit const repetition already applied.
    Value(ValueSpec),
}

/// One name of a grouped value spec such as `const a, b = 1, 2`.
///
/// The value spec is shared between the declarations of all its names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extra {
    pub ident: Name,
    /// Position of `ident` within the value spec.
    pub index: usize,
    pub spec: Arc<ValueSpec>,
}

impl Extra {
    pub fn ty(&self) -> Option<TypeExprId> {
        self.spec.ty
    }

    pub fn value(&self) -> Option<ExprId> {
        self.spec.values.get(self.index).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclNode {
    Owned(OwnedNode),
    Grouped(Extra),
    /// `var a, b = f()`: several names bound by one multi-valued initializer.
    Tuple(Arc<ValueSpec>),
    /// Synthetic type forward declaration; has no syntax of its own.
    Forward,
}

#[derive(Debug)]
pub struct Decl {
    kind: Kind,
    name: Name,
    node: DeclNode,
    span: Span,
    iota: Option<u32>,
    /// Const or var block the declaration came from.
    group: Option<u32>,
    /// Insertion order within the scope.
    seq: u32,
    arena: SharedArena,
    deps: OnceLock<DepSet>,
}

impl Decl {
    pub(crate) fn new(
        kind: Kind,
        name: Name,
        node: DeclNode,
        span: Span,
        arena: SharedArena,
    ) -> Self {
        Decl {
            kind,
            name,
            node,
            span,
            iota: None,
            group: None,
            seq: 0,
            arena,
            deps: OnceLock::new(),
        }
    }

    pub(crate) fn with_block(mut self, group: u32, iota: Option<u32>) -> Self {
        self.group = Some(group);
        self.iota = iota;
        self
    }

    pub(crate) fn set_seq(&mut self, seq: u32) {
        self.seq = seq;
    }

    /// Forward declaration standing in for type `ty` ahead of a cycle.
    pub(crate) fn forward(ty: &Decl) -> Self {
        Decl {
            kind: Kind::TypeForward,
            name: ty.name,
            node: DeclNode::Forward,
            span: ty.span,
            iota: None,
            group: None,
            seq: ty.seq,
            arena: ty.arena.clone(),
            deps: OnceLock::from(DepSet::default()),
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Scope key: methods are keyed `Recv.Method`, blanks and `init` are gensyms.
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    pub fn node(&self) -> &DeclNode {
        &self.node
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Ordinal within the const block, for constants.
    pub fn iota(&self) -> Option<u32> {
        self.iota
    }

    pub fn group(&self) -> Option<u32> {
        self.group
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }

    /// Names referenced by the declaration, excluding locally bound names.
    pub fn deps(&self) -> &[Name] {
        &self.dep_set().names
    }

    /// Selector names (`x.M`) used by the declaration.
    pub fn method_deps(&self) -> &[Name] {
        &self.dep_set().methods
    }

    fn dep_set(&self) -> &DepSet {
        self.deps
            .get_or_init(|| deps::collect(&self.node, &self.arena))
    }

    /// Declared names: every name bound by a tuple declaration, otherwise
    /// the declaration's own name.
    pub fn bound_names(&self) -> Vec<Name> {
        match &self.node {
            DeclNode::Tuple(spec) => spec.names.to_vec(),
            _ => vec![self.name],
        }
    }

    /// Type expression of a const or var declaration.
    pub fn value_type(&self) -> Option<TypeExprId> {
        match &self.node {
            DeclNode::Owned(OwnedNode::Value(spec)) => spec.ty,
            DeclNode::Grouped(extra) => extra.ty(),
            DeclNode::Tuple(spec) => spec.ty,
            _ => None,
        }
    }

    /// Initializer of a single-name const or var declaration.
    pub fn value(&self) -> Option<ExprId> {
        match &self.node {
            DeclNode::Owned(OwnedNode::Value(spec)) => spec.values.first().copied(),
            DeclNode::Grouped(extra) => extra.value(),
            _ => None,
        }
    }

    pub fn func(&self) -> Option<&FuncDecl> {
        match &self.node {
            DeclNode::Owned(OwnedNode::Func(decl)) => Some(decl),
            _ => None,
        }
    }

    pub fn type_spec(&self) -> Option<&TypeSpec> {
        match &self.node {
            DeclNode::Owned(OwnedNode::Type(spec)) => Some(spec),
            _ => None,
        }
    }

    pub fn import(&self) -> Option<&ImportSpec> {
        match &self.node {
            DeclNode::Owned(OwnedNode::Import(spec)) => Some(spec),
            _ => None,
        }
    }
}
