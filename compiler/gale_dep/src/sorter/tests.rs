use super::*;
use gale_ir::{AstBuilder, BinaryOp, Item};
use pretty_assertions::assert_eq;

struct Fixture {
    scope: Scope,
}

impl Fixture {
    fn new(b: AstBuilder, items: &[Item]) -> Self {
        let interner = b.interner().clone();
        let mut scope = Scope::new(interner, b.finish());
        scope.load_all(items).unwrap();
        Fixture { scope }
    }

    fn label(&self, decl: &Decl) -> String {
        let name = self.scope.interner().lookup(decl.name());
        match decl.kind() {
            Kind::TypeForward => format!("fwd {name}"),
            _ => name.to_owned(),
        }
    }

    fn order(&self) -> Vec<String> {
        Sorter::new(&self.scope)
            .unwrap()
            .all()
            .iter()
            .map(|d| self.label(d))
            .collect()
    }

    fn batches(&self) -> Vec<Vec<String>> {
        let mut sorter = Sorter::new(&self.scope).unwrap();
        let mut out = Vec::new();
        while let Some(batch) = sorter.some() {
            out.push(batch.iter().map(|d| self.label(d)).collect());
        }
        out
    }
}

/// `func name() { callee() }` for each callee.
fn func_calling(b: &mut AstBuilder, name: &str, callees: &[&str]) -> Item {
    let stmts: Vec<_> = callees
        .iter()
        .map(|c| {
            let call = b.call_named(c, []);
            b.expr_stmt(call)
        })
        .collect();
    let body = b.block(stmts);
    let sig = b.sig(&[], &[]);
    b.func_decl(name, sig, body)
}

/// `var name = dep1 + dep2 + ...` (or `= 0` without deps).
fn var_using(b: &mut AstBuilder, name: &str, deps: &[&str]) -> Item {
    let mut value = None;
    for dep in deps {
        let id = b.ident(dep);
        value = Some(match value {
            Some(acc) => b.binary(BinaryOp::Add, acc, id),
            None => id,
        });
    }
    let value = match value {
        Some(v) => v,
        None => b.int(0),
    };
    b.var_decl(name, None, Some(value))
}

#[test]
fn dependencies_are_emitted_first() {
    let mut b = AstBuilder::default();
    let c = var_using(&mut b, "c", &["b"]);
    let bb = var_using(&mut b, "b", &["a"]);
    let a = var_using(&mut b, "a", &[]);
    let fixture = Fixture::new(b, &[c, bb, a]);
    assert_eq!(fixture.order(), vec!["a", "b", "c"]);
}

#[test]
fn independent_declarations_keep_source_order() {
    let mut b = AstBuilder::default();
    let z = var_using(&mut b, "z", &[]);
    let y = var_using(&mut b, "y", &[]);
    let x = var_using(&mut b, "x", &[]);
    let fixture = Fixture::new(b, &[z, y, x]);
    assert_eq!(fixture.order(), vec!["z", "y", "x"]);
}

#[test]
fn mutually_recursive_functions_share_a_batch() {
    let mut b = AstBuilder::default();
    let even = func_calling(&mut b, "even", &["odd"]);
    let odd = func_calling(&mut b, "odd", &["even"]);
    let main = func_calling(&mut b, "main", &["even"]);
    let fixture = Fixture::new(b, &[main, odd, even]);
    assert_eq!(
        fixture.batches(),
        vec![vec!["odd".to_owned(), "even".to_owned()], vec!["main".to_owned()]]
    );
}

#[test]
fn variable_cycle_reports_the_path() {
    let mut b = AstBuilder::default();
    let a = var_using(&mut b, "a", &["b"]);
    let bb = var_using(&mut b, "b", &["a"]);
    let fixture = Fixture::new(b, &[a, bb]);

    let err = Sorter::new(&fixture.scope).unwrap_err();
    assert_eq!(
        err,
        SortError::Cycle {
            names: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
            span: fixture.scope.decls()[0].span(),
        }
    );
    assert_eq!(err.to_string(), "initialization cycle: a -> b -> a");
}

#[test]
fn variable_cycle_through_function_is_an_error() {
    let mut b = AstBuilder::default();
    let x = var_using(&mut b, "x", &["f"]);
    let f = func_calling(&mut b, "f", &["x"]);
    let fixture = Fixture::new(b, &[x, f]);

    let err = Sorter::new(&fixture.scope).unwrap_err();
    assert_eq!(err.to_string(), "initialization cycle: x -> f -> x");
}

#[test]
fn self_referential_type_gets_a_forward_declaration() {
    let mut b = AstBuilder::default();
    // type Node struct { next *Node }
    let node_ref = b.ty("Node");
    let ptr = b.pointer_to(node_ref);
    let body = b.struct_type(&[("next", ptr)]);
    let node = b.type_decl("Node", body);
    let fixture = Fixture::new(b, &[node]);

    assert_eq!(
        fixture.batches(),
        vec![vec!["fwd Node".to_owned()], vec!["Node".to_owned()]]
    );
}

#[test]
fn mutually_recursive_types_are_forward_declared() {
    let mut b = AstBuilder::default();
    let b_ref = b.ty("B");
    let b_ptr = b.pointer_to(b_ref);
    let a_body = b.struct_type(&[("b", b_ptr)]);
    let a = b.type_decl("A", a_body);
    let a_ref = b.ty("A");
    let a_slice = b.slice_of(a_ref);
    let b_body = b.struct_type(&[("as", a_slice)]);
    let bt = b.type_decl("B", b_body);
    let fixture = Fixture::new(b, &[a, bt]);

    assert_eq!(fixture.order(), vec!["fwd A", "fwd B", "A", "B"]);
}

#[test]
fn value_depending_on_type_cycle_is_not_an_error() {
    let mut b = AstBuilder::default();
    // type T struct { next *T; size [N]int }; const N = 4
    let t_ref = b.ty("T");
    let t_ptr = b.pointer_to(t_ref);
    let n = b.ident("N");
    let int = b.ty("int");
    let arr = b.array_of(n, int);
    let t_body = b.struct_type(&[("next", t_ptr), ("size", arr)]);
    let t = b.type_decl("T", t_body);
    let four = b.int(4);
    let n_const = b.const_decl("N", four);
    let fixture = Fixture::new(b, &[t, n_const]);

    assert_eq!(fixture.order(), vec!["N", "fwd T", "T"]);
}

#[test]
fn callers_follow_methods_of_the_selected_name() {
    let mut b = AstBuilder::default();
    // func main() { p.Area() } ; func (s Shape) Area() {}
    let p = b.ident("p");
    let sel = b.selector(p, "Area");
    let call = b.call(sel, []);
    let stmt = b.expr_stmt(call);
    let body = b.block([stmt]);
    let sig = b.sig(&[], &[]);
    let main = b.func_decl("main", sig, body);

    let shape = b.ty("Shape");
    let sig = b.sig(&[], &[]);
    let body = b.block([]);
    let area = b.method_decl(("s", shape), "Area", sig, body);

    let int = b.ty("int");
    let shape_decl = b.type_decl("Shape", int);
    let fixture = Fixture::new(b, &[main, area, shape_decl]);

    assert_eq!(fixture.order(), vec!["Shape", "Shape.Area", "main"]);
}

#[test]
fn const_block_members_return_to_source_order() {
    let mut b = AstBuilder::default();
    // const ( A = iota; B; C ) ; all independent of each other
    let iota = b.ident("iota");
    let first = b.value_spec(&["A"], None, vec![iota]);
    let second = b.value_spec(&["B"], None, vec![]);
    let third = b.value_spec(&["C"], None, vec![]);
    let block = b.const_block(vec![first, second, third]);
    let fixture = Fixture::new(b, &[block]);

    let order = Sorter::new(&fixture.scope).unwrap().all();
    let iotas: Vec<_> = order.iter().map(|d| d.iota()).collect();
    assert_eq!(iotas, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn dependencies_win_over_block_order() {
    let mut b = AstBuilder::default();
    // const ( A = B + 1; B = 2 )
    let b_ref = b.ident("B");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, b_ref, one);
    let a_spec = b.value_spec(&["A"], None, vec![sum]);
    let two = b.int(2);
    let b_spec = b.value_spec(&["B"], None, vec![two]);
    let block = b.const_block(vec![a_spec, b_spec]);
    let fixture = Fixture::new(b, &[block]);

    let order = Sorter::new(&fixture.scope).unwrap().all();
    let labels: Vec<_> = order.iter().map(|d| fixture.label(d)).collect();
    assert_eq!(labels, vec!["B", "A"]);
    // Each member keeps the iota of its own spec.
    assert_eq!(order[0].iota(), Some(1));
    assert_eq!(order[1].iota(), Some(0));
}

#[test]
fn grouped_members_are_reassembled_around_other_declarations() {
    let mut b = AstBuilder::default();
    // var ( x = y; z = 1 ) ; var y = 2
    let y_ref = b.ident("y");
    let x_spec = b.value_spec(&["x"], None, vec![y_ref]);
    let one = b.int(1);
    let z_spec = b.value_spec(&["z"], None, vec![one]);
    let block = b.var_block(vec![x_spec, z_spec]);
    let y = var_using(&mut b, "y", &[]);
    let fixture = Fixture::new(b, &[block, y]);

    // x must wait for y; z is free to stay behind x.
    assert_eq!(fixture.order(), vec!["y", "x", "z"]);
}

#[test]
fn unresolved_names_are_treated_as_satisfied() {
    let mut b = AstBuilder::default();
    let v = var_using(&mut b, "v", &["fmt", "undefined"]);
    let fixture = Fixture::new(b, &[v]);
    assert_eq!(fixture.order(), vec!["v"]);
}

#[test]
fn some_hands_out_batches_one_at_a_time() {
    let mut b = AstBuilder::default();
    let a = var_using(&mut b, "a", &[]);
    let c = var_using(&mut b, "c", &["a"]);
    let fixture = Fixture::new(b, &[a, c]);

    let mut sorter = Sorter::new(&fixture.scope).unwrap();
    assert_eq!(sorter.remaining(), 2);
    let first = sorter.some().unwrap();
    assert_eq!(fixture.label(&first[0]), "a");
    let rest = sorter.all();
    assert_eq!(rest.len(), 1);
}
