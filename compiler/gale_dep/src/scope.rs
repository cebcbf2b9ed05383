//! Declaration scope and the loader that fills it from syntax items.

use gale_ir::{
    FuncDecl, Item, Name, SharedArena, SharedInterner, Span, TypeExprKind, ValueSpec,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

use crate::decl::{Decl, DeclNode, Extra, OwnedNode};
use crate::error::SortError;
use crate::kind::Kind;

/// Named declarations of one package scope.
///
/// Keeps insertion order (the fallback order for independent
/// declarations) and an index from method name to the methods of that name.
#[derive(Debug)]
pub struct Scope {
    interner: SharedInterner,
    arena: SharedArena,
    decls: Vec<Arc<Decl>>,
    by_name: FxHashMap<Name, usize>,
    methods_by_name: FxHashMap<Name, Vec<usize>>,
    outer: Weak<Scope>,
    gensym: u32,
    next_group: u32,
}

impl Scope {
    pub fn new(interner: SharedInterner, arena: SharedArena) -> Self {
        Scope {
            interner,
            arena,
            decls: Vec::new(),
            by_name: FxHashMap::default(),
            methods_by_name: FxHashMap::default(),
            outer: Weak::new(),
            gensym: 0,
            next_group: 0,
        }
    }

    /// Nested scope; names not found locally are looked up in `outer`.
    pub fn with_outer(interner: SharedInterner, arena: SharedArena, outer: &Arc<Scope>) -> Self {
        Scope {
            outer: Arc::downgrade(outer),
            ..Scope::new(interner, arena)
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }

    /// Declarations in insertion order.
    pub fn decls(&self) -> &[Arc<Decl>] {
        &self.decls
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn get(&self, name: Name) -> Option<&Arc<Decl>> {
        self.by_name.get(&name).map(|&i| &self.decls[i])
    }

    pub(crate) fn index_of(&self, name: Name) -> Option<usize> {
        self.by_name.get(&name).copied()
    }

    /// Local lookup falling back to the outer scope.
    pub fn lookup(&self, name: Name) -> Option<Arc<Decl>> {
        if let Some(decl) = self.get(name) {
            return Some(Arc::clone(decl));
        }
        self.outer.upgrade().and_then(|outer| outer.lookup(name))
    }

    /// Methods named `method` (unqualified), in insertion order.
    pub(crate) fn method_indices(&self, method: Name) -> &[usize] {
        self.methods_by_name
            .get(&method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Fresh unique name derived from `base`.
    pub fn gensym(&mut self, base: &str) -> Name {
        loop {
            let candidate = format!("{base}#{}", self.gensym);
            self.gensym += 1;
            let name = self.interner.intern(&candidate);
            if !self.by_name.contains_key(&name) {
                return name;
            }
        }
    }

    /// Add a declaration, failing if its name is taken.
    pub fn insert(&mut self, decl: Decl) -> Result<Arc<Decl>, SortError> {
        self.insert_bound(decl, None)
    }

    /// Insert `decl`, registering it under `aliases` too (tuple declarations).
    fn insert_bound(
        &mut self,
        mut decl: Decl,
        aliases: Option<&[Name]>,
    ) -> Result<Arc<Decl>, SortError> {
        let names: Vec<Name> = aliases.map_or_else(|| vec![decl.name()], <[Name]>::to_vec);
        for &name in &names {
            if let Some(previous) = self.get(name) {
                return Err(SortError::Redeclared {
                    name: self.interner.lookup(name).to_owned(),
                    span: decl.span(),
                    previous: previous.span(),
                });
            }
        }

        let index = self.decls.len();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a scope never holds 2^32 declarations"
        )]
        decl.set_seq(index as u32);
        if decl.kind() == Kind::Method {
            if let Some(method) = decl.func().map(|f| f.name) {
                self.methods_by_name.entry(method).or_default().push(index);
            }
        }
        for name in names {
            self.by_name.insert(name, index);
        }
        let decl = Arc::new(decl);
        self.decls.push(Arc::clone(&decl));
        Ok(decl)
    }

    /// Load every item in order.
    pub fn load_all<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a Item>,
    ) -> Result<(), SortError> {
        for item in items {
            self.load(item)?;
        }
        Ok(())
    }

    /// Create the declarations for one top-level item.
    pub fn load(&mut self, item: &Item) -> Result<(), SortError> {
        match item {
            Item::Import(spec) => {
                let name = spec.alias.unwrap_or_else(|| {
                    let path = self.interner.lookup(spec.path);
                    let last = path.rsplit('/').next().unwrap_or(path);
                    self.interner.intern(last)
                });
                let node = DeclNode::Owned(OwnedNode::Import(spec.clone()));
                self.insert(Decl::new(Kind::Import, name, node, spec.span, self.arena.clone()))?;
            }
            Item::Type(spec) => {
                let name = self.blank_or(spec.name);
                let node = DeclNode::Owned(OwnedNode::Type(spec.clone()));
                self.insert(Decl::new(Kind::Type, name, node, spec.span, self.arena.clone()))?;
            }
            Item::Func(decl) => self.load_func(decl, false)?,
            Item::Macro(decl) => self.load_func(decl, true)?,
            Item::Const(specs) => self.load_values(Kind::Const, specs)?,
            Item::Var(specs) => self.load_values(Kind::Var, specs)?,
        }
        Ok(())
    }

    /// Blank names become gensyms so every declaration has a unique key.
    fn blank_or(&mut self, name: Name) -> Name {
        if self.interner.lookup(name) == "_" {
            self.gensym("_")
        } else {
            name
        }
    }

    fn load_func(&mut self, decl: &FuncDecl, is_macro: bool) -> Result<(), SortError> {
        let name_str = self.interner.lookup(decl.name);
        let (kind, name) = if let Some(recv) = &decl.recv {
            let Some(recv_name) = self.receiver_type_name(recv.ty) else {
                return Err(SortError::BadReceiver {
                    method: name_str.to_owned(),
                    span: decl.span,
                });
            };
            let key = format!("{}.{name_str}", self.interner.lookup(recv_name));
            (Kind::Method, self.interner.intern(&key))
        } else if is_macro {
            tracing::warn!(name = name_str, "macro declaration reached the core unexpanded");
            (Kind::Macro, self.blank_or(decl.name))
        } else if name_str == "init" {
            // Every init function runs; keep them all.
            (Kind::Func, self.gensym("init"))
        } else {
            (Kind::Func, self.blank_or(decl.name))
        };
        let node = DeclNode::Owned(OwnedNode::Func(decl.clone()));
        self.insert(Decl::new(kind, name, node, decl.span, self.arena.clone()))?;
        Ok(())
    }

    /// `T` or `*T` receiver base type name.
    fn receiver_type_name(&self, ty: gale_ir::TypeExprId) -> Option<Name> {
        match &self.arena.type_expr(ty).kind {
            TypeExprKind::Named(name) => Some(*name),
            TypeExprKind::Pointer(inner) => match &self.arena.type_expr(*inner).kind {
                TypeExprKind::Named(name) => Some(*name),
                _ => None,
            },
            _ => None,
        }
    }

    fn load_values(&mut self, kind: Kind, specs: &[ValueSpec]) -> Result<(), SortError> {
        let group = self.next_group;
        self.next_group += 1;
        let mut previous: Option<&ValueSpec> = None;

        for (iota, spec) in specs.iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "const blocks never hold 2^32 specs"
            )]
            let iota = (kind == Kind::Const).then_some(iota as u32);

            // A const spec without values repeats the previous spec's type and values.
            let resolved = match previous {
                Some(prev) if kind == Kind::Const && spec.values.is_empty() => ValueSpec {
                    names: spec.names.clone(),
                    ty: prev.ty,
                    values: prev.values.clone(),
                    span: spec.span,
                },
                _ => spec.clone(),
            };
            if kind == Kind::Const {
                if resolved.values.is_empty() {
                    let name = spec.names.first().map_or("", |n| self.interner.lookup(*n));
                    return Err(SortError::MissingConstValue {
                        name: name.to_owned(),
                        span: spec.span,
                    });
                }
                previous = Some(if spec.values.is_empty() {
                    previous.unwrap_or(spec)
                } else {
                    spec
                });
            }

            self.load_value_spec(kind, group, iota, resolved)?;
        }
        Ok(())
    }

    fn load_value_spec(
        &mut self,
        kind: Kind,
        group: u32,
        iota: Option<u32>,
        spec: ValueSpec,
    ) -> Result<(), SortError> {
        let names: Vec<Name> = spec.names.iter().map(|&n| self.blank_or(n)).collect();
        let span = spec.span;
        let (n_names, n_values) = (names.len(), spec.values.len());

        let spec = ValueSpec {
            names: names.clone().into_boxed_slice(),
            ..spec
        };

        if n_values > 0 && n_values != n_names {
            if let (Kind::Var, 1, Some(&first)) = (kind, n_values, names.first()) {
                let node = DeclNode::Tuple(Arc::new(spec));
                let decl = Decl::new(kind, first, node, span, self.arena.clone())
                    .with_block(group, iota);
                self.insert_bound(decl, Some(&names))?;
                return Ok(());
            }
            return Err(SortError::ValueCount {
                names: n_names,
                values: n_values,
                span,
            });
        }

        if let [name] = names[..] {
            let node = DeclNode::Owned(OwnedNode::Value(spec));
            let decl = Decl::new(kind, name, node, span, self.arena.clone()).with_block(group, iota);
            self.insert(decl)?;
            return Ok(());
        }

        let spec = Arc::new(spec);
        for (index, &ident) in names.iter().enumerate() {
            let node = DeclNode::Grouped(Extra {
                ident,
                index,
                spec: Arc::clone(&spec),
            });
            let decl = Decl::new(kind, ident, node, span, self.arena.clone()).with_block(group, iota);
            self.insert(decl)?;
        }
        Ok(())
    }

    /// Span of the declaration named `name`, or a dummy span.
    pub fn span_of(&self, name: Name) -> Span {
        self.get(name).map_or(Span::DUMMY, |d| d.span())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
