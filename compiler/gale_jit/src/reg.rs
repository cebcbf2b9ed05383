//! Soft (virtual) registers.

use std::fmt;

use crate::kind::Kind;

/// Soft register number, unique among the registers live at one point
/// of a code buffer. Freed numbers are reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SoftRegId(u32);

impl SoftRegId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SoftRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A virtual register: id plus the kind of value it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoftReg {
    id: SoftRegId,
    kind: Kind,
}

impl SoftReg {
    #[inline]
    pub const fn new(id: SoftRegId, kind: Kind) -> Self {
        SoftReg { id, kind }
    }

    #[inline]
    pub const fn id(self) -> SoftRegId {
        self.id
    }

    #[inline]
    pub const fn kind(self) -> Kind {
        self.kind
    }
}

impl fmt::Display for SoftReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.kind)
    }
}
