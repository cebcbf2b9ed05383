use super::*;
use crate::Kind;
use pretty_assertions::assert_eq;

#[test]
fn func_of_counts_declared_inputs() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);
    let boolean = u.basic(Kind::Bool);

    let f = u.func_of(vec![int.clone()], vec![boolean.clone()], false).unwrap();
    assert_eq!(f.num_in(), Ok(1));
    assert_eq!(f.in_(0), Ok(int));
    assert_eq!(f.num_out(), Ok(1));
    assert_eq!(f.out(0), Ok(boolean));
    assert_eq!(f.recv(), Ok(None));
    assert_eq!(f.is_method(), Ok(false));
    assert_eq!(f.to_string(), "func(int) bool");
}

#[test]
fn method_of_excludes_receiver_from_declared_count() {
    let u = Universe::new();
    let recv = u.named_of("Counter", None);
    u.set_underlying(&recv, &u.basic(Kind::Int)).unwrap();
    let int = u.basic(Kind::Int);

    let m = u.method_of(recv.clone(), vec![int.clone()], vec![], false).unwrap();
    assert_eq!(m.num_in(), Ok(1));
    assert_eq!(m.rtype().num_in(), 2);
    assert_eq!(m.in_(0), Ok(int));
    assert_eq!(m.recv(), Ok(Some(recv)));
    assert_eq!(m.is_method(), Ok(true));
}

#[test]
fn in_returns_the_declared_interface() {
    let u = Universe::new();
    let returning = |kind| {
        let sig = u.func_of(vec![], vec![u.basic(kind)], false).unwrap();
        u.interface_of(vec![crate::Method {
            name: std::sync::Arc::from("M"),
            ty: sig,
        }])
        .unwrap()
    };
    let ints = returning(Kind::Int);
    let strings = returning(Kind::String);

    let f = u.func_of(vec![strings.clone()], vec![], false).unwrap();
    let param = f.in_(0).unwrap();
    assert!(param.ptr_eq(&strings));
    assert!(!param.ptr_eq(&ints));
    assert_eq!(param.to_string(), "interface { M() string }");
}

#[test]
fn accessors_reject_non_func_types() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);

    assert_eq!(
        int.num_in(),
        Err(TypeError::NotFunc {
            op: "NumIn",
            ty: "int".to_owned()
        })
    );
    assert!(matches!(int.in_(0), Err(TypeError::NotFunc { op: "In", .. })));
    assert!(matches!(int.out(0), Err(TypeError::NotFunc { .. })));
    assert!(matches!(int.recv(), Err(TypeError::NotFunc { .. })));
    assert!(matches!(int.is_variadic(), Err(TypeError::NotFunc { .. })));
    assert!(matches!(int.is_method(), Err(TypeError::NotFunc { .. })));
    assert_eq!(
        int.num_out().map_err(|e| e.to_string()),
        Err("NumOut of non-func type int".to_owned())
    );
}

#[test]
fn index_accessors_check_bounds() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);
    let f = u.func_of(vec![int.clone()], vec![], false).unwrap();

    assert_eq!(
        f.in_(1),
        Err(TypeError::IndexOutOfRange {
            op: "In",
            index: 1,
            len: 1
        })
    );
    assert_eq!(
        f.out(0),
        Err(TypeError::IndexOutOfRange {
            op: "Out",
            index: 0,
            len: 0
        })
    );
}

#[test]
fn named_func_types_expose_their_signature() {
    let u = Universe::new();
    let handler = u.named_of("Handler", None);
    let sig = u
        .func_of(vec![u.basic(Kind::String)], vec![], false)
        .unwrap();
    u.set_underlying(&handler, &sig).unwrap();

    assert_eq!(handler.num_in(), Ok(1));
    assert_eq!(handler.in_(0), Ok(u.basic(Kind::String)));
}

#[test]
fn variadic_requires_trailing_slice() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);
    let ints = u.slice_of(int.clone());

    let ok = u.func_of(vec![ints], vec![], true).unwrap();
    assert_eq!(ok.is_variadic(), Ok(true));
    assert_eq!(ok.to_string(), "func(...int)");

    assert_eq!(
        u.func_of(vec![int], vec![], true),
        Err(TypeError::VariadicNotSlice {
            ty: "int".to_owned()
        })
    );
}

#[test]
fn owning_universe_prefers_receiver_then_inputs_then_outputs() {
    let default = Universe::new();
    let recv_u = Universe::new();
    let in_u = Universe::new();
    let out_u = Universe::new();

    let recv = recv_u.named_of("R", None);
    let input = in_u.basic(Kind::Int);
    let output = out_u.basic(Kind::Bool);

    let pick = |recv: Option<&Type>, ins: &[Type], outs: &[Type]| {
        owning_universe(&default, recv, ins, outs)
    };

    let both = [input.clone()];
    let outs = [output.clone()];
    assert!(pick(Some(&recv), &both, &outs).ptr_eq(&recv_u));
    assert!(pick(None, &both, &outs).ptr_eq(&in_u));
    assert!(pick(None, &[], &outs).ptr_eq(&out_u));
    assert!(pick(None, &[], &[]).ptr_eq(&default));
}

#[test]
fn free_constructors_build_in_the_owning_universe() {
    let default = Universe::new();
    let other = Universe::new();
    let int = other.basic(Kind::Int);

    let f = func_of(&default, vec![int.clone()], vec![], false).unwrap();
    assert!(f.universe().is_some_and(|u| u.ptr_eq(&other)));
    assert!(default.is_empty());

    let m = method_of(&default, int.clone(), vec![], vec![int], false).unwrap();
    assert!(m.universe().is_some_and(|u| u.ptr_eq(&other)));
}

#[test]
fn types_from_different_universes_compare_equal() {
    let a = Universe::new();
    let b = Universe::new();

    let fa = a.func_of(vec![a.basic(Kind::Int)], vec![], false).unwrap();
    let fb = b.func_of(vec![b.basic(Kind::Int)], vec![], false).unwrap();
    assert_eq!(fa, fb);
    assert!(!fa.ptr_eq(&fb));

    // Mixed components still hit the cache entry built from local ones.
    let mixed = a.func_of(vec![b.basic(Kind::Int)], vec![], false).unwrap();
    assert!(mixed.ptr_eq(&fa));
}
