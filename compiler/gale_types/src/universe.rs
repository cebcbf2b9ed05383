//! Type universe: the cache pairing static types with runtime descriptors.
//!
//! Types are interned in sharded maps. Lookups take a shard read lock;
//! first-time construction takes the shard write lock and re-checks, so two
//! compilations racing to build the same type get the same instance.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::data::{Field, Method, NamedRef, Signature, TypeData};
use crate::error::TypeError;
use crate::kind::Kind;
use crate::rtype::{RField, RType, RTypeNode};
use crate::Type;

/// Number of shards for type interning.
const NUM_SHARDS: usize = 16;

static NEXT_UNIVERSE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct UniverseInner {
    id: u64,
    shards: [RwLock<FxHashMap<TypeData, Type>>; NUM_SHARDS],
    /// Reverse map from runtime descriptor to static type.
    by_rtype: RwLock<FxHashMap<RType, Type>>,
}

/// Handle to a type universe; clones share the same caches.
#[derive(Clone)]
pub struct Universe(Arc<UniverseInner>);

impl Universe {
    pub fn new() -> Self {
        Universe(Arc::new(UniverseInner {
            id: NEXT_UNIVERSE_ID.fetch_add(1, Ordering::Relaxed),
            shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            by_rtype: RwLock::new(FxHashMap::default()),
        }))
    }

    pub(crate) fn from_inner(inner: Arc<UniverseInner>) -> Self {
        Universe(inner)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn ptr_eq(&self, other: &Universe) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of types constructed by this universe.
    pub fn len(&self) -> usize {
        self.0.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn shard_for(data: &TypeData) -> usize {
        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "truncation is fine for hash-based shard selection"
        )]
        let hash_usize = hasher.finish() as usize;
        hash_usize % NUM_SHARDS
    }

    fn intern(&self, data: TypeData) -> Type {
        let shard = &self.0.shards[Self::shard_for(&data)];

        if let Some(ty) = shard.read().get(&data) {
            return ty.clone();
        }

        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(ty) = guard.get(&data) {
            return ty.clone();
        }

        let rtype = build_rtype(&data);
        let ty = Type::new(data.clone(), rtype.clone(), Arc::downgrade(&self.0));
        guard.insert(data, ty.clone());
        self.0
            .by_rtype
            .write()
            .entry(rtype)
            .or_insert_with(|| ty.clone());
        ty
    }

    /// Static type paired with a runtime descriptor built by this universe.
    pub fn type_of_rtype(&self, rtype: &RType) -> Option<Type> {
        self.0.by_rtype.read().get(rtype).cloned()
    }

    /// Predeclared basic type; non-basic kinds give the `invalid` type.
    pub fn basic(&self, kind: Kind) -> Type {
        let kind = if kind.is_basic() { kind } else { Kind::Invalid };
        self.intern(TypeData::Basic(kind))
    }

    /// Basic type by predeclared name (`int`, `byte`, `float64`, ...).
    pub fn lookup_basic(&self, name: &str) -> Option<Type> {
        Kind::from_basic_name(name).map(|kind| self.basic(kind))
    }

    pub fn slice_of(&self, elem: Type) -> Type {
        self.intern(TypeData::Slice(elem))
    }

    pub fn array_of(&self, len: u64, elem: Type) -> Type {
        self.intern(TypeData::Array { len, elem })
    }

    pub fn map_of(&self, key: Type, value: Type) -> Result<Type, TypeError> {
        if !key.is_comparable() {
            return Err(TypeError::NotComparable {
                ty: key.to_string(),
            });
        }
        Ok(self.intern(TypeData::Map { key, value }))
    }

    pub fn pointer_to(&self, elem: Type) -> Type {
        self.intern(TypeData::Pointer(elem))
    }

    pub fn struct_of(&self, fields: Vec<Field>) -> Result<Type, TypeError> {
        for (i, field) in fields.iter().enumerate() {
            if &*field.name != "_" && fields[..i].iter().any(|f| f.name == field.name) {
                return Err(TypeError::DuplicateField {
                    name: field.name.to_string(),
                });
            }
        }
        Ok(self.intern(TypeData::Struct(fields.into_boxed_slice())))
    }

    /// Interface with the given method set; methods are sorted by name.
    pub fn interface_of(&self, mut methods: Vec<Method>) -> Result<Type, TypeError> {
        for method in &methods {
            if method.ty.underlying().kind() != Kind::Func {
                return Err(TypeError::not_func("Method", &method.ty));
            }
        }
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(dup) = methods.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(TypeError::DuplicateMethod {
                ty: "interface".to_owned(),
                name: dup[0].name.to_string(),
            });
        }
        Ok(self.intern(TypeData::Interface(methods.into_boxed_slice())))
    }

    /// Function type `func(ins...) (outs...)`.
    pub fn func_of(&self, ins: Vec<Type>, outs: Vec<Type>, variadic: bool) -> Result<Type, TypeError> {
        self.signature_type(None, ins, outs, variadic)
    }

    /// Method type with receiver `recv`.
    ///
    /// The static signature keeps `recv` apart from `ins`; the runtime
    /// descriptor takes it as its first parameter.
    pub fn method_of(
        &self,
        recv: Type,
        ins: Vec<Type>,
        outs: Vec<Type>,
        variadic: bool,
    ) -> Result<Type, TypeError> {
        tracing::debug!(
            universe = self.id(),
            recv = %recv,
            num_in = ins.len(),
            num_out = outs.len(),
            variadic,
            "method_of"
        );
        self.signature_type(Some(recv), ins, outs, variadic)
    }

    fn signature_type(
        &self,
        recv: Option<Type>,
        ins: Vec<Type>,
        outs: Vec<Type>,
        variadic: bool,
    ) -> Result<Type, TypeError> {
        if variadic {
            match ins.last() {
                Some(last) if last.underlying().kind() == Kind::Slice => {}
                Some(last) => {
                    return Err(TypeError::VariadicNotSlice {
                        ty: last.to_string(),
                    })
                }
                None => {
                    return Err(TypeError::VariadicNotSlice {
                        ty: "no parameters".to_owned(),
                    })
                }
            }
        }
        Ok(self.intern(TypeData::Func(Signature {
            recv,
            params: ins.into_boxed_slice(),
            results: outs.into_boxed_slice(),
            variadic,
        })))
    }

    /// Fresh named type; its underlying type is set later with
    /// [`set_underlying`](Self::set_underlying), which permits recursive types.
    pub fn named_of(&self, name: &str, package: Option<&str>) -> Type {
        self.intern(TypeData::Named(NamedRef::new(
            Arc::from(name),
            package.map(Arc::from),
        )))
    }

    pub fn set_underlying(&self, named: &Type, underlying: &Type) -> Result<(), TypeError> {
        let Some(info) = named.named() else {
            return Err(TypeError::NotNamed {
                ty: named.to_string(),
            });
        };
        let resolved = underlying.underlying();
        if resolved.is_named() || resolved.rtype().contains_by_value(info.id()) {
            return Err(TypeError::InvalidRecursive {
                name: info.name().to_owned(),
            });
        }
        if info.underlying.set(resolved.clone()).is_err() {
            return Err(TypeError::AlreadyDefined {
                name: info.name().to_owned(),
            });
        }
        named.rtype().set_underlying(resolved.rtype().clone());
        tracing::debug!(name = info.name(), underlying = %resolved, "defined named type");
        Ok(())
    }

    /// Attach method `name` to a named type. `func` must be a method type
    /// whose receiver is the named type or a pointer to it.
    pub fn add_method(&self, named: &Type, name: &str, func: Type) -> Result<(), TypeError> {
        let Some(info) = named.named() else {
            return Err(TypeError::NotNamed {
                ty: named.to_string(),
            });
        };
        if func.recv().ok().flatten().is_none() {
            return Err(TypeError::NotMethod {
                ty: func.to_string(),
            });
        }
        let mut methods = info.methods.write();
        if methods.iter().any(|m| &*m.name == name) {
            return Err(TypeError::DuplicateMethod {
                ty: info.name().to_owned(),
                name: name.to_owned(),
            });
        }
        methods.push(Method {
            name: Arc::from(name),
            ty: func,
        });
        Ok(())
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Universe({}, {} types)", self.0.id, self.len())
    }
}

fn build_rtype(data: &TypeData) -> RType {
    RType::new(match data {
        TypeData::Basic(kind) => RTypeNode::Basic(*kind),
        TypeData::Slice(elem) => RTypeNode::Slice(elem.rtype().clone()),
        TypeData::Array { len, elem } => RTypeNode::Array {
            len: *len,
            elem: elem.rtype().clone(),
        },
        TypeData::Map { key, value } => RTypeNode::Map {
            key: key.rtype().clone(),
            value: value.rtype().clone(),
        },
        TypeData::Pointer(elem) => RTypeNode::Pointer(elem.rtype().clone()),
        TypeData::Struct(fields) => RTypeNode::Struct {
            fields: fields
                .iter()
                .map(|f| RField {
                    name: f.name.clone(),
                    ty: f.ty.rtype().clone(),
                })
                .collect(),
            layout: OnceLock::new(),
        },
        TypeData::Interface(methods) => RTypeNode::Interface {
            methods: methods
                .iter()
                .map(|m| (m.name.clone(), m.ty.rtype().clone()))
                .collect(),
        },
        TypeData::Func(sig) => RTypeNode::Func {
            // Receivers are the implicit first runtime parameter.
            ins: sig
                .recv
                .iter()
                .chain(sig.params.iter())
                .map(|t| t.rtype().clone())
                .collect(),
            outs: sig.results.iter().map(|t| t.rtype().clone()).collect(),
            variadic: sig.variadic,
        },
        TypeData::Named(named) => RTypeNode::Named {
            id: named.id(),
            name: Arc::from(named.name()),
            underlying: OnceLock::new(),
        },
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
