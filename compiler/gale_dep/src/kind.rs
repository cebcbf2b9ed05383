//! Declaration kinds.

use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Const,
    Func,
    Import,
    Macro,
    Method,
    Type,
    /// Synthetic forward declaration emitted ahead of a type cycle.
    TypeForward,
    Var,
}

impl Kind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::Const => "Const",
            Kind::Func => "Func",
            Kind::Import => "Import",
            Kind::Macro => "Macro",
            Kind::Method => "Method",
            Kind::Type => "Type",
            Kind::TypeForward => "TypeFwd",
            Kind::Var => "Var",
        }
    }

    /// Kinds whose mutual references are legal.
    pub const fn may_cycle(self) -> bool {
        matches!(
            self,
            Kind::Func | Kind::Method | Kind::Macro | Kind::TypeForward | Kind::Type
        )
    }

    /// Kinds that hold an initializer evaluated at load time.
    pub const fn is_value(self) -> bool {
        matches!(self, Kind::Const | Kind::Var)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
