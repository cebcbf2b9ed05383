//! Static type representation.
//!
//! `TypeData` is the compiler-side view of a type. Composite variants hold
//! [`Type`] handles, so equality and hashing are structural; named types
//! compare by identity.

use parking_lot::RwLock;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::kind::Kind;
use crate::Type;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    Basic(Kind),
    Slice(Type),
    Array { len: u64, elem: Type },
    Map { key: Type, value: Type },
    Pointer(Type),
    Struct(Box<[Field]>),
    /// Method set, sorted by name.
    Interface(Box<[Method]>),
    Func(Signature),
    Named(NamedRef),
}

/// Function signature. The receiver of a method is kept apart from `params`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub recv: Option<Type>,
    pub params: Box<[Type]>,
    pub results: Box<[Type]>,
    /// The last parameter is a slice `[]T` collecting trailing `T` arguments.
    pub variadic: bool,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Arc<str>,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: Arc<str>,
    /// Function type; for methods of named types this includes the receiver.
    pub ty: Type,
}

static NEXT_NAMED_ID: AtomicU64 = AtomicU64::new(1);

/// Declared type: identity, name, underlying type and method table.
pub struct NamedType {
    id: u64,
    name: Arc<str>,
    package: Option<Arc<str>>,
    pub(crate) underlying: OnceLock<Type>,
    pub(crate) methods: RwLock<Vec<Method>>,
}

impl NamedType {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// `None` while the type is only forward declared.
    pub fn underlying(&self) -> Option<&Type> {
        self.underlying.get()
    }

    pub fn method(&self, name: &str) -> Option<Type> {
        self.methods
            .read()
            .iter()
            .find(|m| &*m.name == name)
            .map(|m| m.ty.clone())
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> Vec<Method> {
        self.methods.read().clone()
    }
}

/// Shared handle to a [`NamedType`]; equality is identity.
#[derive(Clone)]
pub struct NamedRef(pub(crate) Arc<NamedType>);

impl NamedRef {
    pub(crate) fn new(name: Arc<str>, package: Option<Arc<str>>) -> Self {
        NamedRef(Arc::new(NamedType {
            id: NEXT_NAMED_ID.fetch_add(1, Ordering::Relaxed),
            name,
            package,
            underlying: OnceLock::new(),
            methods: RwLock::new(Vec::new()),
        }))
    }
}

impl std::ops::Deref for NamedRef {
    type Target = NamedType;

    fn deref(&self) -> &NamedType {
        &self.0
    }
}

impl PartialEq for NamedRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NamedRef {}

impl Hash for NamedRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
