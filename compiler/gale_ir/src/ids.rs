//! Arena indices for the flat syntax tree.
//!
//! `ExprId(u32)` instead of `Box<Expr>`: 4 bytes, O(1) equality, and
//! children live in one contiguous vector per node family.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Invalid ID (sentinel value).
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Index into the owning arena vector.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}::INVALID", stringify!($name))
                }
            }
        }
    };
}

arena_id!(
    /// Index into the expression arena.
    ExprId
);
arena_id!(
    /// Index into the statement arena.
    StmtId
);
arena_id!(
    /// Index into the type expression arena.
    TypeExprId
);
