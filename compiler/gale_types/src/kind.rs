//! Type kinds and assignment categories.

use std::fmt;

/// Reflection-level kind of a type. Named types report their underlying kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Named type whose underlying type is not set yet.
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Slice,
    Array,
    Map,
    Pointer,
    Struct,
    Interface,
    Func,
}

impl Kind {
    /// All basic kinds, in declaration order.
    pub const BASIC: [Kind; 17] = [
        Kind::Bool,
        Kind::Int,
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::Uint,
        Kind::Uint8,
        Kind::Uint16,
        Kind::Uint32,
        Kind::Uint64,
        Kind::Uintptr,
        Kind::Float32,
        Kind::Float64,
        Kind::Complex64,
        Kind::Complex128,
        Kind::String,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Uintptr => "uintptr",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::String => "string",
            Kind::Slice => "slice",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Pointer => "ptr",
            Kind::Struct => "struct",
            Kind::Interface => "interface",
            Kind::Func => "func",
        }
    }

    /// Basic kind named by a predeclared type identifier (`byte` and `rune` included).
    pub fn from_basic_name(name: &str) -> Option<Kind> {
        match name {
            "byte" => Some(Kind::Uint8),
            "rune" => Some(Kind::Int32),
            _ => Kind::BASIC.into_iter().find(|k| k.name() == name),
        }
    }

    pub const fn is_basic(self) -> bool {
        matches!(self.category(), Category::Bool | Category::Int | Category::Uint)
            || matches!(
                self,
                Kind::Float32 | Kind::Float64 | Kind::Complex64 | Kind::Complex128 | Kind::String
            )
    }

    pub const fn category(self) -> Category {
        match self {
            Kind::Bool => Category::Bool,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => Category::Int,
            Kind::Uint
            | Kind::Uint8
            | Kind::Uint16
            | Kind::Uint32
            | Kind::Uint64
            | Kind::Uintptr => Category::Uint,
            Kind::Float32 | Kind::Float64 => Category::Float,
            Kind::Complex64 | Kind::Complex128 => Category::Complex,
            Kind::String => Category::String,
            Kind::Func => Category::Func,
            Kind::Invalid
            | Kind::Slice
            | Kind::Array
            | Kind::Map
            | Kind::Pointer
            | Kind::Struct
            | Kind::Interface => Category::Unknown,
        }
    }

    /// Storage width in bits for numeric kinds, 0 otherwise.
    pub const fn bits(self) -> u32 {
        match self {
            Kind::Int8 | Kind::Uint8 => 8,
            Kind::Int16 | Kind::Uint16 => 16,
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => 32,
            Kind::Int | Kind::Int64 | Kind::Uint | Kind::Uint64 | Kind::Uintptr => 64,
            Kind::Float64 | Kind::Complex64 => 64,
            Kind::Complex128 => 128,
            _ => 0,
        }
    }

    /// Size and alignment of a value of this kind, for kinds whose layout
    /// does not depend on element types.
    pub(crate) const fn layout(self) -> Option<(usize, usize)> {
        Some(match self {
            Kind::Bool | Kind::Int8 | Kind::Uint8 => (1, 1),
            Kind::Int16 | Kind::Uint16 => (2, 2),
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => (4, 4),
            Kind::Int
            | Kind::Int64
            | Kind::Uint
            | Kind::Uint64
            | Kind::Uintptr
            | Kind::Float64
            | Kind::Map
            | Kind::Pointer
            | Kind::Func => (8, 8),
            Kind::Complex64 => (8, 4),
            Kind::Complex128 | Kind::String | Kind::Interface => (16, 8),
            Kind::Slice => (24, 8),
            Kind::Invalid | Kind::Array | Kind::Struct => return None,
        })
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assignment category: selects the typed storage path used when compiling
/// stores into a location of this type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Bool,
    /// Signed integers.
    Int,
    /// Unsigned integers.
    Uint,
    Float,
    Complex,
    String,
    Func,
    /// Composite, interface and not-yet-defined named types.
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Bool => "bool",
            Category::Int => "int",
            Category::Uint => "uint",
            Category::Float => "float",
            Category::Complex => "complex",
            Category::String => "string",
            Category::Func => "func",
            Category::Unknown => "unknown",
        })
    }
}

#[cfg(test)]
mod tests;
