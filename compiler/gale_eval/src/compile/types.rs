//! Type expressions and signatures.

use std::sync::Arc;

use gale_ir::{ExprId, ExprKind, FuncSig, Name, TypeExprId, TypeExprKind};
use gale_types::{Field, Method, Signature, Type, TypeData};

use super::{Compiler, Operand, Resolved};
use crate::errors::{not_a_type, not_constant, undefined, unsupported, CompileError};

/// Parameter list of a signature with optional names.
pub(crate) type Params = Vec<(Option<Name>, Type)>;

/// Resolved signature: named parameters and results.
pub(crate) struct SigTypes {
    pub params: Params,
    pub results: Params,
    pub variadic: bool,
}

impl SigTypes {
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn result_types(&self) -> Vec<Type> {
        self.results.iter().map(|(_, t)| t.clone()).collect()
    }
}

/// Function signature of `ty`, looking through named types.
pub(crate) fn signature_of(ty: &Type) -> Option<Signature> {
    match ty.underlying().data() {
        TypeData::Func(sig) => Some(sig.clone()),
        _ => None,
    }
}

impl Compiler<'_> {
    pub(crate) fn resolve_type(&mut self, id: TypeExprId) -> Result<Type, CompileError> {
        let arena = self.arena.clone();
        let node = arena.type_expr(id);
        self.type_kind(&node.kind).map_err(|e| e.with_span(node.span))
    }

    fn type_kind(&mut self, kind: &TypeExprKind) -> Result<Type, CompileError> {
        match kind {
            TypeExprKind::Named(name) => self.named_type(*name),
            TypeExprKind::Qualified { package, name } => Err(undefined(&format!(
                "{}.{}",
                self.name_str(*package),
                self.name_str(*name)
            ))),
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type(*elem)?;
                Ok(self.universe.slice_of(elem))
            }
            TypeExprKind::Array { len, elem } => {
                let len = self.array_len(*len)?;
                let elem = self.resolve_type(*elem)?;
                Ok(self.universe.array_of(len, elem))
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type(*key)?;
                let value = self.resolve_type(*value)?;
                Ok(self.universe.map_of(key, value)?)
            }
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type(*elem)?;
                Ok(self.universe.pointer_to(elem))
            }
            TypeExprKind::Func(sig) => self.func_type(sig),
            TypeExprKind::Struct(decls) => {
                let mut fields = Vec::with_capacity(decls.len());
                for decl in decls.iter() {
                    fields.push(Field {
                        name: Arc::from(self.name_str(decl.name)),
                        ty: self.resolve_type(decl.ty)?,
                        embedded: decl.embedded,
                    });
                }
                Ok(self.universe.struct_of(fields)?)
            }
            TypeExprKind::Interface(specs) => {
                let mut methods = Vec::with_capacity(specs.len());
                for spec in specs.iter() {
                    methods.push(Method {
                        name: Arc::from(self.name_str(spec.name)),
                        ty: self.func_type(&spec.sig)?,
                    });
                }
                Ok(self.universe.interface_of(methods)?)
            }
        }
    }

    fn named_type(&self, name: Name) -> Result<Type, CompileError> {
        match self.resolve_or_err(name)? {
            Resolved::Type(ty) => Ok(ty),
            _ => Err(not_a_type(self.name_str(name))),
        }
    }

    fn array_len(&mut self, len: ExprId) -> Result<u64, CompileError> {
        match self.expr(len)? {
            Operand::Const { value, .. } => value
                .as_int()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| unsupported(format!("array length {value}"))),
            _ => Err(not_constant("array length")),
        }
    }

    /// Parameters and results of a syntax signature. A variadic last
    /// parameter `T` becomes `[]T`.
    pub(crate) fn signature(&mut self, sig: &FuncSig) -> Result<SigTypes, CompileError> {
        let mut params = Vec::with_capacity(sig.params.len());
        for (i, param) in sig.params.iter().enumerate() {
            let mut ty = self.resolve_type(param.ty)?;
            if sig.variadic && i + 1 == sig.params.len() {
                ty = self.universe.slice_of(ty);
            }
            params.push((param.name, ty));
        }
        let mut results = Vec::with_capacity(sig.results.len());
        for param in sig.results.iter() {
            results.push((param.name, self.resolve_type(param.ty)?));
        }
        Ok(SigTypes {
            params,
            results,
            variadic: sig.variadic,
        })
    }

    pub(crate) fn func_type(&mut self, sig: &FuncSig) -> Result<Type, CompileError> {
        let sig = self.signature(sig)?;
        Ok(self
            .universe
            .func_of(sig.param_types(), sig.result_types(), sig.variadic)?)
    }

    /// The type an expression names, if it names one: `T`, `(T)` or a
    /// type operand such as `[]int`.
    pub(crate) fn type_of_expr(&mut self, id: ExprId) -> Result<Option<Type>, CompileError> {
        let arena = self.arena.clone();
        match &arena.expr(id).kind {
            ExprKind::Ident(name) => Ok(match self.resolve(*name) {
                Some(Resolved::Type(ty)) => Some(ty),
                _ => None,
            }),
            ExprKind::Paren(inner) => self.type_of_expr(*inner),
            ExprKind::Type(ty) => self.resolve_type(*ty).map(Some),
            _ => Ok(None),
        }
    }
}
