use super::*;
use gale_ir::AstBuilder;
use pretty_assertions::assert_eq;

fn scope_of(b: AstBuilder, items: &[Item]) -> Result<Scope, SortError> {
    let interner = b.interner().clone();
    let mut scope = Scope::new(interner, b.finish());
    scope.load_all(items)?;
    Ok(scope)
}

fn name_of(scope: &Scope, decl: &Decl) -> String {
    scope.interner().lookup(decl.name()).to_owned()
}

#[test]
fn const_block_repeats_values_with_own_iota() {
    let mut b = AstBuilder::default();
    let iota = b.ident("iota");
    let first = b.value_spec(&["A"], None, vec![iota]);
    let second = b.value_spec(&["B"], None, vec![]);
    let third = b.value_spec(&["C"], None, vec![]);
    let block = b.const_block(vec![first, second, third]);

    let scope = scope_of(b, &[block]).unwrap();
    let iotas: Vec<_> = scope.decls().iter().map(|d| d.iota()).collect();
    assert_eq!(iotas, vec![Some(0), Some(1), Some(2)]);
    // Repeated specs share the first spec's initializer expression.
    assert_eq!(scope.decls()[1].value(), scope.decls()[0].value());
    assert!(scope.decls().iter().all(|d| d.kind() == Kind::Const));
}

#[test]
fn first_const_spec_needs_values() {
    let mut b = AstBuilder::default();
    let spec = b.value_spec(&["A"], None, vec![]);
    let block = b.const_block(vec![spec]);
    let err = scope_of(b, &[block]).unwrap_err();
    assert!(matches!(err, SortError::MissingConstValue { ref name, .. } if name == "A"));
}

#[test]
fn grouped_spec_shares_one_node() {
    let mut b = AstBuilder::default();
    let one = b.int(1);
    let two = b.int(2);
    let spec = b.value_spec(&["a", "b"], None, vec![one, two]);
    let block = b.var_block(vec![spec]);

    let scope = scope_of(b, &[block]).unwrap();
    let [a, second] = scope.decls() else {
        panic!("expected two declarations");
    };
    let (DeclNode::Grouped(ea), DeclNode::Grouped(eb)) = (a.node(), second.node()) else {
        panic!("expected grouped nodes");
    };
    assert!(Arc::ptr_eq(&ea.spec, &eb.spec));
    assert_eq!(ea.value(), Some(one));
    assert_eq!(eb.value(), Some(two));
    assert_eq!(a.group(), second.group());
}

#[test]
fn tuple_spec_is_one_decl_under_every_name() {
    let mut b = AstBuilder::default();
    let call = b.call_named("pair", []);
    let spec = b.value_spec(&["x", "y"], None, vec![call]);
    let block = b.var_block(vec![spec]);
    let interner = b.interner().clone();

    let scope = scope_of(b, &[block]).unwrap();
    assert_eq!(scope.len(), 1);
    let x = scope.get(interner.intern("x")).unwrap();
    let y = scope.get(interner.intern("y")).unwrap();
    assert!(Arc::ptr_eq(x, y));
    assert!(matches!(x.node(), DeclNode::Tuple(_)));
    assert_eq!(x.bound_names().len(), 2);
}

#[test]
fn mismatched_const_values_are_rejected() {
    let mut b = AstBuilder::default();
    let one = b.int(1);
    let spec = b.value_spec(&["a", "b"], None, vec![one]);
    let block = b.const_block(vec![spec]);
    let err = scope_of(b, &[block]).unwrap_err();
    assert!(matches!(
        err,
        SortError::ValueCount {
            names: 2,
            values: 1,
            ..
        }
    ));
}

#[test]
fn blanks_and_init_get_gensyms() {
    let mut b = AstBuilder::default();
    let one = b.int(1);
    let two = b.int(2);
    let blank1 = b.var_decl("_", None, Some(one));
    let blank2 = b.var_decl("_", None, Some(two));
    let sig = b.sig(&[], &[]);
    let body = b.block([]);
    let init1 = b.func_decl("init", sig.clone(), body.clone());
    let init2 = b.func_decl("init", sig, body);

    let scope = scope_of(b, &[blank1, blank2, init1, init2]).unwrap();
    let names: Vec<String> = scope.decls().iter().map(|d| name_of(&scope, d)).collect();
    assert_eq!(names, vec!["_#0", "_#1", "init#2", "init#3"]);
}

#[test]
fn redeclaration_is_an_error() {
    let mut b = AstBuilder::default();
    let one = b.int(1);
    let two = b.int(2);
    let first = b.var_decl("x", None, Some(one));
    let second = b.const_decl("x", two);
    let err = scope_of(b, &[first, second]).unwrap_err();
    assert!(matches!(err, SortError::Redeclared { ref name, .. } if name == "x"));
    assert_eq!(err.to_string(), "x redeclared in this block");
}

#[test]
fn methods_are_keyed_by_receiver() {
    let mut b = AstBuilder::default();
    let point = b.ty("Point");
    let ptr = b.pointer_to(point);
    let sig = b.sig(&[], &[]);
    let body = b.block([]);
    let method = b.method_decl(("p", ptr), "Scale", sig, body);
    let interner = b.interner().clone();

    let scope = scope_of(b, &[method]).unwrap();
    let decl = scope.get(interner.intern("Point.Scale")).unwrap();
    assert_eq!(decl.kind(), Kind::Method);
    assert_eq!(scope.method_indices(interner.intern("Scale")), &[0]);
    assert_eq!(decl.deps(), &[interner.intern("Point")]);
}

#[test]
fn imports_are_named_by_last_path_segment() {
    let mut b = AstBuilder::default();
    let plain = b.import("encoding/json", None);
    let aliased = b.import("math/rand", Some("r"));
    let interner = b.interner().clone();

    let scope = scope_of(b, &[plain, aliased]).unwrap();
    assert!(scope.get(interner.intern("json")).is_some());
    assert!(scope.get(interner.intern("r")).is_some());
    assert!(scope.decls().iter().all(|d| d.kind() == Kind::Import));
}

#[test]
fn lookup_falls_back_to_outer_scope() {
    let mut b = AstBuilder::default();
    let one = b.int(1);
    let item = b.const_decl("Outer", one);
    let interner = b.interner().clone();
    let arena = b.finish();

    let mut outer = Scope::new(interner.clone(), arena.clone());
    outer.load(&item).unwrap();
    let outer = Arc::new(outer);
    let inner = Scope::with_outer(interner.clone(), arena, &outer);

    let name = interner.intern("Outer");
    assert!(inner.get(name).is_none());
    assert!(inner.lookup(name).is_some());
}
