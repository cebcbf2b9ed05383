use super::*;
use pretty_assertions::assert_eq;

#[test]
fn nodes_get_increasing_spans() {
    let mut b = AstBuilder::default();
    let x = b.ident("x");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, x, one);

    let arena = b.finish();
    assert!(arena.expr(x).span.start < arena.expr(one).span.start);
    assert!(arena.expr(one).span.start < arena.expr(sum).span.start);
    assert_eq!(
        arena.expr(sum).kind,
        ExprKind::Binary {
            op: BinaryOp::Add,
            left: x,
            right: one,
        }
    );
}

#[test]
fn float_literals_keep_their_bits() {
    let mut b = AstBuilder::default();
    let f = b.float(2.5);
    let arena = b.finish();
    let ExprKind::Float(bits) = arena.expr(f).kind else {
        panic!("expected a float literal");
    };
    assert_eq!(f64::from_bits(bits), 2.5);
}

#[test]
fn method_decl_records_receiver() {
    let mut b = AstBuilder::default();
    let recv_ty = b.ty("Point");
    let sig = b.sig(&[], &[]);
    let body = b.block([]);
    let item = b.method_decl(("p", recv_ty), "Norm", sig, body);

    let Item::Func(decl) = item else {
        panic!("expected a func item");
    };
    let recv = decl.recv.as_ref().map(|p| p.ty);
    assert_eq!(recv, Some(recv_ty));
    assert_eq!(b.interner().lookup(decl.name), "Norm");
}

#[test]
fn const_block_keeps_spec_order() {
    let mut b = AstBuilder::default();
    let iota = b.ident("iota");
    let first = b.value_spec(&["A"], None, vec![iota]);
    let second = b.value_spec(&["B"], None, vec![]);
    let item = b.const_block(vec![first, second]);

    let Item::Const(specs) = &item else {
        panic!("expected a const block");
    };
    assert_eq!(specs.len(), 2);
    assert!(specs[1].values.is_empty());
    assert_eq!(item.span(), specs[0].span.merge(specs[1].span));
}
