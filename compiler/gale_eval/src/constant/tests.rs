use gale_types::{Kind, Universe};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn integer_division_truncates() {
    let q = Constant::binary(BinaryOp::Div, &Constant::Int(7), &Constant::Int(2)).unwrap();
    assert_eq!(q, Constant::Int(3));
}

#[test]
fn mixed_operands_promote_to_float() {
    let sum = Constant::binary(BinaryOp::Add, &Constant::Int(1), &Constant::Float(0.5)).unwrap();
    assert_eq!(sum, Constant::Float(1.5));
    let lt = Constant::binary(BinaryOp::Lt, &Constant::Int(1), &Constant::Float(1.5)).unwrap();
    assert_eq!(lt, Constant::Bool(true));
}

#[test]
fn division_by_constant_zero_is_rejected() {
    let err = Constant::binary(BinaryOp::Rem, &Constant::Int(1), &Constant::Int(0)).unwrap_err();
    assert_eq!(err.to_string(), "division by zero");
}

#[test]
fn shifts_fold_and_detect_overflow() {
    let v = Constant::binary(BinaryOp::Shl, &Constant::Int(1), &Constant::Int(10)).unwrap();
    assert_eq!(v, Constant::Int(1024));
    assert!(Constant::binary(BinaryOp::Shl, &Constant::Int(1), &Constant::Int(200)).is_err());
}

#[test]
fn strings_concatenate_and_compare() {
    let a = Constant::Str("ab".into());
    let b = Constant::Str("c".into());
    assert_eq!(
        Constant::binary(BinaryOp::Add, &a, &b).unwrap(),
        Constant::Str("abc".into())
    );
    assert_eq!(
        Constant::binary(BinaryOp::Gt, &a, &b).unwrap(),
        Constant::Bool(false)
    );
}

#[test]
fn representation_checks_the_range() {
    let u = Universe::new();
    let int8 = u.basic(Kind::Int8);
    assert_eq!(Constant::Int(127).represent(&int8).unwrap(), Constant::Int(127));
    assert_eq!(
        Constant::Int(300).represent(&int8).unwrap_err().to_string(),
        "constant 300 overflows int8"
    );
    assert_eq!(
        Constant::Int(-1)
            .represent(&u.basic(Kind::Uint))
            .unwrap_err()
            .to_string(),
        "constant -1 overflows uint"
    );
    assert_eq!(
        Constant::Float(2.5)
            .represent(&u.basic(Kind::Int))
            .unwrap_err()
            .to_string(),
        "constant 2.5 truncated to int"
    );
    assert_eq!(
        Constant::Float(3.0).to_value(&u.basic(Kind::Int64)).unwrap(),
        Value::Int(3)
    );
}

#[test]
fn unsigned_constants_become_unsigned_values() {
    let u = Universe::new();
    let max = Constant::Int(u64::MAX.into());
    assert_eq!(
        max.to_value(&u.basic(Kind::Uint64)).unwrap(),
        Value::Uint(u64::MAX)
    );
}

#[test]
fn float32_rounds() {
    let u = Universe::new();
    let v = Constant::Float(0.1).to_value(&u.basic(Kind::Float32)).unwrap();
    assert_eq!(v, Value::Float(f64::from(0.1f32)));
    assert!(Constant::Float(1e300).represent(&u.basic(Kind::Float32)).is_err());
}

#[test]
fn nil_needs_a_nilable_type() {
    let u = Universe::new();
    let ints = u.slice_of(u.basic(Kind::Int));
    assert_eq!(Constant::Nil.to_value(&ints).unwrap(), Value::Nil);
    assert_eq!(
        Constant::Nil
            .represent(&u.basic(Kind::String))
            .unwrap_err()
            .to_string(),
        "cannot use nil as string value"
    );
}

#[test]
fn interfaces_take_the_default_representation() {
    let u = Universe::new();
    let any = u.interface_of(Vec::new()).unwrap();
    assert_eq!(Constant::Int(4).to_value(&any).unwrap(), Value::Int(4));
    assert_eq!(
        Constant::Str("hi".into()).default_type(&u),
        Some(u.basic(Kind::String))
    );
}
