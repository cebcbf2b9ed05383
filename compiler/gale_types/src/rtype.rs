//! Runtime type descriptors.
//!
//! An `RType` is what executing code sees: kind, layout, element types and,
//! for functions, a flat parameter list in which a method's receiver is the
//! first entry. Every `RType` is paired with exactly one static [`Type`](crate::Type).

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::kind::Kind;

#[derive(Clone)]
pub struct RType(Arc<RTypeNode>);

pub(crate) enum RTypeNode {
    Basic(Kind),
    Slice(RType),
    Array {
        len: u64,
        elem: RType,
    },
    Map {
        key: RType,
        value: RType,
    },
    Pointer(RType),
    Struct {
        fields: Box<[RField]>,
        /// Field offsets, size and alignment; computed on first use so
        /// fields of forward-declared named types can be completed first.
        layout: OnceLock<StructLayout>,
    },
    Interface {
        /// Method names with their function descriptors, sorted by name.
        methods: Box<[(Arc<str>, RType)]>,
    },
    Func {
        ins: Box<[RType]>,
        outs: Box<[RType]>,
        variadic: bool,
    },
    Named {
        id: u64,
        name: Arc<str>,
        underlying: OnceLock<RType>,
    },
}

#[derive(Clone)]
pub struct RField {
    pub name: Arc<str>,
    pub ty: RType,
}

pub(crate) struct StructLayout {
    offsets: Box<[usize]>,
    size: usize,
    align: usize,
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

impl RType {
    pub(crate) fn new(node: RTypeNode) -> Self {
        RType(Arc::new(node))
    }

    pub(crate) fn node(&self) -> &RTypeNode {
        &self.0
    }

    /// Named descriptors resolve to their underlying descriptor once set.
    fn resolved(&self) -> &RType {
        let mut rt = self;
        while let RTypeNode::Named { underlying, .. } = &*rt.0 {
            match underlying.get() {
                Some(u) => rt = u,
                None => break,
            }
        }
        rt
    }

    pub fn kind(&self) -> Kind {
        match self.resolved().node() {
            RTypeNode::Basic(kind) => *kind,
            RTypeNode::Slice(_) => Kind::Slice,
            RTypeNode::Array { .. } => Kind::Array,
            RTypeNode::Map { .. } => Kind::Map,
            RTypeNode::Pointer(_) => Kind::Pointer,
            RTypeNode::Struct { .. } => Kind::Struct,
            RTypeNode::Interface { .. } => Kind::Interface,
            RTypeNode::Func { .. } => Kind::Func,
            RTypeNode::Named { .. } => Kind::Invalid,
        }
    }

    /// Declared name for named descriptors.
    pub fn name(&self) -> Option<&str> {
        match self.node() {
            RTypeNode::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn size(&self) -> usize {
        self.size_align().0
    }

    pub fn align(&self) -> usize {
        self.size_align().1
    }

    fn size_align(&self) -> (usize, usize) {
        let rt = self.resolved();
        if let Some(layout) = rt.kind().layout() {
            return layout;
        }
        match rt.node() {
            RTypeNode::Array { len, elem } => {
                let (size, align) = elem.size_align();
                let len = usize::try_from(*len).unwrap_or(usize::MAX);
                (size.saturating_mul(len), align)
            }
            RTypeNode::Struct { .. } => rt
                .struct_layout()
                .map_or((0, 1), |layout| (layout.size, layout.align)),
            _ => (0, 1),
        }
    }

    fn struct_layout(&self) -> Option<&StructLayout> {
        let RTypeNode::Struct { fields, layout } = self.resolved().node() else {
            return None;
        };
        Some(layout.get_or_init(|| {
            let mut offset = 0;
            let mut max_align = 1;
            let offsets = fields
                .iter()
                .map(|field| {
                    let (size, align) = field.ty.size_align();
                    offset = align_up(offset, align);
                    let at = offset;
                    offset += size;
                    max_align = max_align.max(align);
                    at
                })
                .collect();
            StructLayout {
                offsets,
                size: align_up(offset, max_align),
                align: max_align,
            }
        }))
    }

    pub fn elem(&self) -> Option<&RType> {
        match self.resolved().node() {
            RTypeNode::Slice(elem) | RTypeNode::Pointer(elem) | RTypeNode::Array { elem, .. } => {
                Some(elem)
            }
            RTypeNode::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&RType> {
        match self.resolved().node() {
            RTypeNode::Map { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn num_field(&self) -> usize {
        match self.resolved().node() {
            RTypeNode::Struct { fields, .. } => fields.len(),
            _ => 0,
        }
    }

    pub fn field(&self, i: usize) -> Option<&RField> {
        match self.resolved().node() {
            RTypeNode::Struct { fields, .. } => fields.get(i),
            _ => None,
        }
    }

    /// Byte offset of field `i` within the struct.
    pub fn field_offset(&self, i: usize) -> Option<usize> {
        self.struct_layout()
            .and_then(|layout| layout.offsets.get(i).copied())
    }

    /// Runtime parameter count; includes the receiver for methods.
    pub fn num_in(&self) -> usize {
        match self.resolved().node() {
            RTypeNode::Func { ins, .. } => ins.len(),
            _ => 0,
        }
    }

    pub fn in_(&self, i: usize) -> Option<&RType> {
        match self.resolved().node() {
            RTypeNode::Func { ins, .. } => ins.get(i),
            _ => None,
        }
    }

    pub fn num_out(&self) -> usize {
        match self.resolved().node() {
            RTypeNode::Func { outs, .. } => outs.len(),
            _ => 0,
        }
    }

    pub fn out(&self, i: usize) -> Option<&RType> {
        match self.resolved().node() {
            RTypeNode::Func { outs, .. } => outs.get(i),
            _ => None,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.resolved().node(),
            RTypeNode::Func { variadic: true, .. }
        )
    }

    /// True if the named type `named_id` is stored inline in `self`
    /// through arrays or struct fields.
    pub(crate) fn contains_by_value(&self, named_id: u64) -> bool {
        match self.node() {
            RTypeNode::Named { id, underlying, .. } => {
                *id == named_id
                    || underlying
                        .get()
                        .is_some_and(|u| u.contains_by_value(named_id))
            }
            RTypeNode::Array { elem, .. } => elem.contains_by_value(named_id),
            RTypeNode::Struct { fields, .. } => {
                fields.iter().any(|f| f.ty.contains_by_value(named_id))
            }
            _ => false,
        }
    }

    pub(crate) fn set_underlying(&self, rtype: RType) -> bool {
        match self.node() {
            RTypeNode::Named { underlying, .. } => underlying.set(rtype).is_ok(),
            _ => false,
        }
    }
}

impl PartialEq for RType {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.node(), other.node()) {
            (RTypeNode::Basic(a), RTypeNode::Basic(b)) => a == b,
            (RTypeNode::Slice(a), RTypeNode::Slice(b))
            | (RTypeNode::Pointer(a), RTypeNode::Pointer(b)) => a == b,
            (
                RTypeNode::Array { len: la, elem: ea },
                RTypeNode::Array { len: lb, elem: eb },
            ) => la == lb && ea == eb,
            (
                RTypeNode::Map { key: ka, value: va },
                RTypeNode::Map { key: kb, value: vb },
            ) => ka == kb && va == vb,
            (RTypeNode::Struct { fields: fa, .. }, RTypeNode::Struct { fields: fb, .. }) => {
                fa.len() == fb.len()
                    && fa
                        .iter()
                        .zip(fb.iter())
                        .all(|(a, b)| a.name == b.name && a.ty == b.ty)
            }
            (RTypeNode::Interface { methods: a }, RTypeNode::Interface { methods: b }) => a == b,
            (
                RTypeNode::Func {
                    ins: ia,
                    outs: oa,
                    variadic: va,
                },
                RTypeNode::Func {
                    ins: ib,
                    outs: ob,
                    variadic: vb,
                },
            ) => va == vb && ia == ib && oa == ob,
            (RTypeNode::Named { id: a, .. }, RTypeNode::Named { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for RType {}

impl Hash for RType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self.node()).hash(state);
        match self.node() {
            RTypeNode::Basic(kind) => kind.hash(state),
            RTypeNode::Slice(elem) | RTypeNode::Pointer(elem) => elem.hash(state),
            RTypeNode::Array { len, elem } => {
                len.hash(state);
                elem.hash(state);
            }
            RTypeNode::Map { key, value } => {
                key.hash(state);
                value.hash(state);
            }
            RTypeNode::Struct { fields, .. } => {
                for field in fields {
                    field.name.hash(state);
                    field.ty.hash(state);
                }
            }
            RTypeNode::Interface { methods } => methods.hash(state),
            RTypeNode::Func {
                ins,
                outs,
                variadic,
            } => {
                ins.hash(state);
                outs.hash(state);
                variadic.hash(state);
            }
            RTypeNode::Named { id, .. } => id.hash(state),
        }
    }
}

impl std::fmt::Debug for RType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node() {
            RTypeNode::Named { name, .. } => write!(f, "RType({name})"),
            _ => write!(f, "RType({})", self.kind()),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
