//! The `Type` handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::data::{Field, NamedRef, TypeData};
use crate::flags::TypeFlags;
use crate::kind::{Category, Kind};
use crate::rtype::RType;
use crate::universe::{Universe, UniverseInner};

/// Static type paired with its runtime descriptor.
///
/// Cheap to clone. Equality is structural over [`TypeData`], so types
/// built by different universes compare equal when they describe the
/// same type.
#[derive(Clone)]
pub struct Type(Arc<TypeInner>);

struct TypeInner {
    data: TypeData,
    rtype: RType,
    flags: TypeFlags,
    universe: Weak<UniverseInner>,
}

impl Type {
    pub(crate) fn new(data: TypeData, rtype: RType, universe: Weak<UniverseInner>) -> Self {
        let flags = TypeFlags::compute(&data);
        Type(Arc::new(TypeInner {
            data,
            rtype,
            flags,
            universe,
        }))
    }

    #[inline]
    pub fn data(&self) -> &TypeData {
        &self.0.data
    }

    /// Runtime descriptor paired with this type.
    #[inline]
    pub fn rtype(&self) -> &RType {
        &self.0.rtype
    }

    /// Universe that constructed this type, if it is still alive.
    pub fn universe(&self) -> Option<Universe> {
        self.0.universe.upgrade().map(Universe::from_inner)
    }

    /// Same cached instance (stronger than `==`).
    pub fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Flags of the type; named types add the flags of their underlying type.
    pub fn flags(&self) -> TypeFlags {
        match &self.0.data {
            TypeData::Named(named) => named
                .underlying()
                .map_or(self.0.flags, |u| self.0.flags | u.flags()),
            _ => self.0.flags,
        }
    }

    pub fn kind(&self) -> Kind {
        match &self.0.data {
            TypeData::Basic(kind) => *kind,
            TypeData::Slice(_) => Kind::Slice,
            TypeData::Array { .. } => Kind::Array,
            TypeData::Map { .. } => Kind::Map,
            TypeData::Pointer(_) => Kind::Pointer,
            TypeData::Struct(_) => Kind::Struct,
            TypeData::Interface(_) => Kind::Interface,
            TypeData::Func(_) => Kind::Func,
            TypeData::Named(named) => named.underlying().map_or(Kind::Invalid, Type::kind),
        }
    }

    #[inline]
    pub fn category(&self) -> Category {
        self.kind().category()
    }

    /// Underlying type: `self` for unnamed and forward-declared types.
    pub fn underlying(&self) -> Type {
        match &self.0.data {
            TypeData::Named(named) => named.underlying().cloned().unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }

    pub fn named(&self) -> Option<&NamedRef> {
        match &self.0.data {
            TypeData::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.named().map(|n| n.name())
    }

    pub fn is_named(&self) -> bool {
        self.named().is_some()
    }

    /// Element type of slices, arrays and pointers; value type of maps.
    pub fn elem(&self) -> Option<Type> {
        match self.underlying().data() {
            TypeData::Slice(elem) | TypeData::Pointer(elem) | TypeData::Array { elem, .. } => {
                Some(elem.clone())
            }
            TypeData::Map { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<Type> {
        match self.underlying().data() {
            TypeData::Map { key, .. } => Some(key.clone()),
            _ => None,
        }
    }

    pub fn array_len(&self) -> Option<u64> {
        match self.underlying().data() {
            TypeData::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn num_field(&self) -> usize {
        match self.underlying().data() {
            TypeData::Struct(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn field(&self, i: usize) -> Option<Field> {
        match self.underlying().data() {
            TypeData::Struct(fields) => fields.get(i).cloned(),
            _ => None,
        }
    }

    /// Field index and descriptor by name.
    pub fn field_by_name(&self, name: &str) -> Option<(usize, Field)> {
        match self.underlying().data() {
            TypeData::Struct(fields) => fields
                .iter()
                .position(|f| &*f.name == name)
                .map(|i| (i, fields[i].clone())),
            _ => None,
        }
    }

    /// Forward-declared named types are assumed comparable until defined.
    pub fn is_comparable(&self) -> bool {
        match &self.0.data {
            TypeData::Named(named) => named.underlying().is_none_or(Type::is_comparable),
            _ => self.0.flags.contains(TypeFlags::COMPARABLE),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.flags().contains(TypeFlags::IS_INTERFACE)
    }

    /// Method by name: the method table of a named type, or the method set
    /// of an interface.
    pub fn method(&self, name: &str) -> Option<Type> {
        if let Some(found) = self.named().and_then(|n| n.method(name)) {
            return Some(found);
        }
        match self.underlying().data() {
            TypeData::Interface(methods) => methods
                .iter()
                .find(|m| &*m.name == name)
                .map(|m| m.ty.clone()),
            _ => None,
        }
    }

    /// True if every method of interface `iface` is provided by `self`
    /// with an identical signature (ignoring receivers).
    pub fn implements(&self, iface: &Type) -> bool {
        let iface = iface.underlying();
        let TypeData::Interface(required) = iface.data() else {
            return false;
        };
        required.iter().all(|m| {
            self.method(&m.name)
                .is_some_and(|found| same_signature(&found, &m.ty))
        })
    }

    /// Declared or predeclared type, as opposed to a type literal.
    fn is_defined(&self) -> bool {
        matches!(self.0.data, TypeData::Named(_) | TypeData::Basic(_))
    }

    /// Go assignability: identical types, identical underlying types when
    /// at least one side is a type literal, or an interface target
    /// implemented by `self`.
    pub fn assignable_to(&self, target: &Type) -> bool {
        if self == target {
            return true;
        }
        if target.is_interface() {
            return self.implements(target);
        }
        (!self.is_defined() || !target.is_defined()) && self.underlying() == target.underlying()
    }
}

fn same_signature(a: &Type, b: &Type) -> bool {
    match (a.underlying().data(), b.underlying().data()) {
        (TypeData::Func(x), TypeData::Func(y)) => {
            x.params == y.params && x.results == y.results && x.variadic == y.variadic
        }
        _ => false,
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.data == other.0.data
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.data.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            TypeData::Basic(kind) => f.write_str(kind.name()),
            TypeData::Slice(elem) => write!(f, "[]{elem}"),
            TypeData::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeData::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeData::Pointer(elem) => write!(f, "*{elem}"),
            TypeData::Struct(fields) => {
                if fields.is_empty() {
                    return f.write_str("struct {}");
                }
                f.write_str("struct { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                f.write_str(" }")
            }
            TypeData::Interface(methods) => {
                if methods.is_empty() {
                    return f.write_str("interface {}");
                }
                f.write_str("interface { ")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    // Strip the leading "func" of the method's signature.
                    let sig = method.ty.to_string();
                    write!(f, "{}{}", method.name, sig.trim_start_matches("func"))?;
                }
                f.write_str(" }")
            }
            TypeData::Func(sig) => {
                if let Some(recv) = &sig.recv {
                    write!(f, "({recv}) ")?;
                }
                f.write_str("func(")?;
                let last = sig.params.len().checked_sub(1);
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match param.data() {
                        TypeData::Slice(elem) if sig.variadic && Some(i) == last => {
                            write!(f, "...{elem}")?;
                        }
                        _ => write!(f, "{param}")?,
                    }
                }
                f.write_str(")")?;
                match &*sig.results {
                    [] => Ok(()),
                    [single] => write!(f, " {single}"),
                    results => {
                        f.write_str(" (")?;
                        for (i, result) in results.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{result}")?;
                        }
                        f.write_str(")")
                    }
                }
            }
            TypeData::Named(named) => match named.package() {
                Some(package) => write!(f, "{package}.{}", named.name()),
                None => f.write_str(named.name()),
            },
        }
    }
}
