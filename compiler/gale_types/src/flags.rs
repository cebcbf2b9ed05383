//! Pre-computed type metadata flags.
//!
//! Computed once when a type is interned so category checks on hot
//! compile paths never walk the type structure.

use bitflags::bitflags;

use crate::data::TypeData;
use crate::kind::{Category, Kind};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u32 {
        // === Category Flags (bits 0-7) ===

        /// Predeclared basic type.
        const IS_BASIC = 1 << 0;
        /// Any integer, float or complex type.
        const IS_NUMERIC = 1 << 1;
        const IS_INTEGER = 1 << 2;
        const IS_UNSIGNED = 1 << 3;
        const IS_FLOAT = 1 << 4;
        const IS_COMPLEX = 1 << 5;
        const IS_STRING = 1 << 6;

        // === Shape Flags (bits 8-15) ===

        /// Function-shaped type (plain function or method).
        const IS_FUNC = 1 << 8;
        /// Function type carrying a receiver.
        const IS_METHOD = 1 << 9;
        const IS_VARIADIC = 1 << 10;
        /// Declared (nominal) type.
        const IS_NAMED = 1 << 11;
        const IS_INTERFACE = 1 << 12;
        /// Slice, array or map.
        const IS_CONTAINER = 1 << 13;

        // === Capability Flags (bits 16-23) ===

        /// Usable as a map key and with `==`.
        const COMPARABLE = 1 << 16;
        /// Zero value is `nil`.
        const NILABLE = 1 << 17;
    }
}

impl TypeFlags {
    /// Compute flags for freshly interned type data.
    ///
    /// Named types only carry `IS_NAMED`; their remaining flags come from the
    /// underlying type once it is set (see `Type::flags`).
    pub(crate) fn compute(data: &TypeData) -> Self {
        match data {
            TypeData::Basic(kind) => Self::for_basic(*kind),
            TypeData::Slice(_) => Self::IS_CONTAINER | Self::NILABLE,
            TypeData::Array { elem, .. } => {
                let mut flags = Self::IS_CONTAINER;
                if elem.is_comparable() {
                    flags |= Self::COMPARABLE;
                }
                flags
            }
            TypeData::Map { .. } => Self::IS_CONTAINER | Self::NILABLE,
            TypeData::Pointer(_) => Self::COMPARABLE | Self::NILABLE,
            TypeData::Struct(fields) => {
                if fields.iter().all(|f| f.ty.is_comparable()) {
                    Self::COMPARABLE
                } else {
                    Self::empty()
                }
            }
            TypeData::Interface(_) => Self::IS_INTERFACE | Self::COMPARABLE | Self::NILABLE,
            TypeData::Func(sig) => {
                let mut flags = Self::IS_FUNC | Self::NILABLE;
                if sig.recv.is_some() {
                    flags |= Self::IS_METHOD;
                }
                if sig.variadic {
                    flags |= Self::IS_VARIADIC;
                }
                flags
            }
            TypeData::Named(_) => Self::IS_NAMED,
        }
    }

    fn for_basic(kind: Kind) -> Self {
        let mut flags = Self::IS_BASIC | Self::COMPARABLE;
        match kind.category() {
            Category::Int => flags |= Self::IS_NUMERIC | Self::IS_INTEGER,
            Category::Uint => flags |= Self::IS_NUMERIC | Self::IS_INTEGER | Self::IS_UNSIGNED,
            Category::Float => flags |= Self::IS_NUMERIC | Self::IS_FLOAT,
            Category::Complex => flags |= Self::IS_NUMERIC | Self::IS_COMPLEX,
            Category::String => flags |= Self::IS_STRING,
            Category::Bool | Category::Func | Category::Unknown => {}
        }
        flags
    }
}
