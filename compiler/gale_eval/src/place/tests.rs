use std::sync::Arc;

use gale_types::{Field, Universe};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;
use crate::env::{run, Code};
use crate::errors::CompileErrorKind;

fn exec(stmts: Vec<Stmt>, slots: &[Value]) -> Result<Arc<Env>, EvalError> {
    let env = Env::new(Arc::new(Code::new(stmts)), slots.len(), None, slots);
    run(&env)?;
    Ok(env)
}

fn value_of(v: Value) -> Fun<Value> {
    fun(move |_| Ok(v.clone()))
}

#[test]
fn int8_stores_are_narrowed() {
    let u = Universe::new();
    let place = Place::var(0, 0, u.basic(Kind::Int8));
    let stmt = set_place_expr(&place, ExprFun::Int(fun(|_| Ok(200)))).unwrap();
    let env = exec(vec![stmt], &[Value::Int(0)]).unwrap();
    assert_eq!(env.get(0), Value::Int(-56));
}

#[test]
fn constants_are_checked_when_compiled() {
    let u = Universe::new();
    let place = Place::var(0, 0, u.basic(Kind::Int8));
    let err = set_place_const(&place, &Constant::Int(300)).err().unwrap();
    assert_eq!(err.to_string(), "constant 300 overflows int8");

    let place = Place::var(0, 0, u.basic(Kind::Float32));
    let stmt = set_place_const(&place, &Constant::Int(3)).unwrap();
    let env = exec(vec![stmt], &[Value::Float(0.0)]).unwrap();
    assert_eq!(env.get(0), Value::Float(3.0));
}

#[test]
fn constant_stores_convert_once_per_category() {
    let u = Universe::new();
    let any = u.interface_of(Vec::new()).unwrap();
    let cases = [
        (u.basic(Kind::Bool), Constant::Bool(true), Value::Bool(true)),
        (u.basic(Kind::Int16), Constant::Int(-3), Value::Int(-3)),
        (u.basic(Kind::Uint32), Constant::Int(7), Value::Uint(7)),
        (u.basic(Kind::Float64), Constant::Float(1.5), Value::Float(1.5)),
        (
            u.basic(Kind::Complex128),
            Constant::Complex(1.0, 2.0),
            Value::Complex(1.0, 2.0),
        ),
        (u.basic(Kind::String), Constant::Str(Arc::from("hi")), Value::str("hi")),
        (any.clone(), Constant::Int(5), Value::Int(5)),
        (any, Constant::Nil, Value::Nil),
    ];
    for (ty, c, want) in cases {
        let place = Place::var(0, 0, ty.clone());
        let stmt = set_place_const(&place, &c).unwrap();
        let env = exec(vec![stmt], &[Value::Int(-1)]).unwrap();
        assert_eq!(env.get(0), want, "storing {c} into {ty}");
    }
}

#[test]
fn map_stores_evaluate_container_key_value_in_order() {
    let u = Universe::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let m = MapValue::new();

    let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let map = m.clone();
    let place = Place::map_entry(
        fun(move |_| {
            l1.lock().push("container");
            Ok(Value::Map(map.clone()))
        }),
        fun(move |_| {
            l2.lock().push("key");
            Ok(Value::str("k"))
        }),
        u.basic(Kind::Int),
    );
    let value = ExprFun::Int(fun(move |_| {
        l3.lock().push("value");
        Ok(7)
    }));
    let stmt = set_place_expr(&place, value).unwrap();
    exec(vec![stmt], &[]).unwrap();

    assert_eq!(*log.lock(), vec!["container", "key", "value"]);
    assert_eq!(m.get(&Value::str("k")).unwrap(), Some(Value::Int(7)));
}

#[test]
fn storing_into_a_nil_map_fails() {
    let u = Universe::new();
    let place = Place::map_entry(value_of(Value::Nil), value_of(Value::str("k")), u.basic(Kind::Int));
    let stmt = set_place_const(&place, &Constant::Int(1)).unwrap();
    let err = exec(vec![stmt], &[]).unwrap_err();
    assert_eq!(err.to_string(), "assignment to entry in nil map");
}

#[test]
fn slice_stores_check_bounds() {
    let u = Universe::new();
    let s = SliceValue::from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let place = Place::slice_elem(
        value_of(Value::Slice(s.clone())),
        value_of(Value::Int(5)),
        u.basic(Kind::Int),
    );
    let stmt = set_place_const(&place, &Constant::Int(0)).unwrap();
    assert_eq!(
        exec(vec![stmt], &[]).unwrap_err().to_string(),
        "index out of range: 5 not in 0...2"
    );

    let place = Place::slice_elem(value_of(Value::Nil), value_of(Value::Int(0)), u.basic(Kind::Int));
    let stmt = set_place_const(&place, &Constant::Int(0)).unwrap();
    assert_eq!(
        exec(vec![stmt], &[]).unwrap_err().to_string(),
        "index out of range: 0, slice is empty"
    );

    let place = Place::slice_elem(value_of(Value::Slice(s.clone())), value_of(Value::Int(1)), u.basic(Kind::Int));
    let stmt = set_place_const(&place, &Constant::Int(20)).unwrap();
    exec(vec![stmt], &[]).unwrap();
    assert_eq!(Value::Slice(s).to_string(), "[1 20 3]");
}

#[test]
fn unknown_category_stores_check_at_run_time() {
    let u = Universe::new();
    let ints = u.slice_of(u.basic(Kind::Int));
    let place = Place::var(0, 0, ints.clone());

    let stmt = set_place_expr(&place, ExprFun::Any(value_of(Value::Nil))).unwrap();
    let env = exec(vec![stmt], &[Value::Int(9)]).unwrap();
    assert_eq!(env.get(0), Value::Nil);

    let stmt = set_place_expr(&place, ExprFun::Any(value_of(Value::Int(1)))).unwrap();
    let err = exec(vec![stmt], &[Value::Nil]).unwrap_err();
    assert_eq!(err.to_string(), "cannot convert int to []int");

    let any = u.interface_of(Vec::new()).unwrap();
    let place = Place::var(0, 0, any);
    let stmt = set_place_expr(&place, ExprFun::Str(fun(|_| Ok(Arc::from("s"))))).unwrap();
    let env = exec(vec![stmt], &[Value::Nil]).unwrap();
    assert_eq!(env.get(0), Value::str("s"));
}

#[test]
fn nil_constant_stores_the_zero_value() {
    let u = Universe::new();
    let map = u.map_of(u.basic(Kind::String), u.basic(Kind::Int)).unwrap();
    let place = Place::var(0, 0, map);
    let stmt = set_place_const(&place, &Constant::Nil).unwrap();
    let env = exec(vec![stmt], &[Value::Map(MapValue::new())]).unwrap();
    assert_eq!(env.get(0), Value::Nil);
}

#[test]
fn pointer_locations_are_rejected_at_compile_time() {
    let u = Universe::new();
    let place = Place::var(0, 0, u.pointer_to(u.basic(Kind::Int)));
    let err = set_place_expr(&place, ExprFun::Any(value_of(Value::Nil))).err().unwrap();
    assert!(matches!(
        err.kind,
        CompileErrorKind::UnsupportedCategory {
            op: "set_place_expr",
            category: Category::Unknown,
            ..
        }
    ));
    assert!(set_place_const(&place, &Constant::Nil).is_err());
}

#[test]
fn mismatched_expression_category_is_rejected() {
    let u = Universe::new();
    let place = Place::var(0, 0, u.basic(Kind::String));
    let err = set_place_expr(&place, ExprFun::Int(fun(|_| Ok(1)))).err().unwrap();
    assert_eq!(err.to_string(), "cannot use int as string value");
}

#[test]
fn compound_assignment_reads_missing_entries_as_zero() {
    let u = Universe::new();
    let m = MapValue::new();
    let place = Place::map_entry(
        value_of(Value::Map(m.clone())),
        value_of(Value::str("hits")),
        u.basic(Kind::Int),
    );
    let add = set_place_op(&place, BinaryOp::Add, ExprFun::Int(fun(|_| Ok(5)))).unwrap();
    let add_again = set_place_op(&place, BinaryOp::Add, ExprFun::Int(fun(|_| Ok(5)))).unwrap();
    exec(vec![add, add_again], &[]).unwrap();
    assert_eq!(m.get(&Value::str("hits")).unwrap(), Some(Value::Int(10)));
}

#[test]
fn compound_assignment_checks_operators() {
    let u = Universe::new();
    let place = Place::var(0, 0, u.basic(Kind::String));
    assert!(set_place_op(&place, BinaryOp::Sub, ExprFun::Str(fun(|_| Ok(Arc::from("x"))))).is_err());

    let place = Place::var(0, 0, u.basic(Kind::Uint8));
    let shl = set_place_op(&place, BinaryOp::Shl, ExprFun::Int(fun(|_| Ok(9)))).unwrap();
    let env = exec(vec![shl], &[Value::Uint(1)]).unwrap();
    assert_eq!(env.get(0), Value::Uint(0));
}

#[test]
fn outer_variables_are_reached_by_depth() {
    let u = Universe::new();
    let globals = Env::new(Arc::default(), 1, None, &[Value::Int(0)]);
    let place = Place::var(1, 0, u.basic(Kind::Int));
    let stmt = set_place_const(&place, &Constant::Int(4)).unwrap();
    let env = Env::new(Arc::new(Code::new(vec![stmt])), 0, Some(Arc::clone(&globals)), &[]);
    run(&env).unwrap();
    assert_eq!(globals.get(0), Value::Int(4));
}

#[test]
fn field_stores_write_the_struct_back() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);
    let point = u
        .struct_of(vec![
            Field {
                name: Arc::from("X"),
                ty: int.clone(),
                embedded: false,
            },
            Field {
                name: Arc::from("Y"),
                ty: int.clone(),
                embedded: false,
            },
        ])
        .unwrap();
    let origin = Value::Struct(StructValue::new(vec![Value::Int(0), Value::Int(0)]));
    let s = SliceValue::from_vec(vec![origin.clone(), origin.clone()]);

    // s[1].Y = 9
    let elem = Place::slice_elem(value_of(Value::Slice(s.clone())), value_of(Value::Int(1)), point);
    let field = Place::field(&elem, 1, int);
    let stmt = set_place_const(&field, &Constant::Int(9)).unwrap();
    exec(vec![stmt], &[]).unwrap();

    assert_eq!(s.get(0).unwrap(), origin);
    assert_eq!(
        s.get(1).unwrap(),
        Value::Struct(StructValue::new(vec![Value::Int(0), Value::Int(9)]))
    );
}
