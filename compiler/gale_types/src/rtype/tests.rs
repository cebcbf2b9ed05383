use crate::{Field, Kind, Universe};
use std::sync::Arc;

fn field(name: &str, ty: crate::Type) -> Field {
    Field {
        name: Arc::from(name),
        ty,
        embedded: false,
    }
}

#[test]
fn struct_offsets_respect_alignment() {
    let u = Universe::new();
    let s = u
        .struct_of(vec![
            field("a", u.basic(Kind::Int8)),
            field("b", u.basic(Kind::Int64)),
            field("c", u.basic(Kind::Int16)),
        ])
        .unwrap();
    let rt = s.rtype();
    assert_eq!(rt.field_offset(0), Some(0));
    assert_eq!(rt.field_offset(1), Some(8));
    assert_eq!(rt.field_offset(2), Some(16));
    assert_eq!(rt.size(), 24);
    assert_eq!(rt.align(), 8);
}

#[test]
fn array_size_scales_with_length() {
    let u = Universe::new();
    let arr = u.array_of(4, u.basic(Kind::Int32));
    assert_eq!(arr.rtype().size(), 16);
    assert_eq!(arr.rtype().kind(), Kind::Array);
}

#[test]
fn named_descriptor_resolves_after_definition() {
    let u = Universe::new();
    let celsius = u.named_of("Celsius", None);
    assert_eq!(celsius.rtype().kind(), Kind::Invalid);

    u.set_underlying(&celsius, &u.basic(Kind::Float64)).unwrap();
    assert_eq!(celsius.rtype().kind(), Kind::Float64);
    assert_eq!(celsius.rtype().size(), 8);
    assert_eq!(celsius.rtype().name(), Some("Celsius"));
}

#[test]
fn method_descriptor_takes_receiver_first() {
    let u = Universe::new();
    let point = u.named_of("Point", None);
    let int = u.basic(Kind::Int);
    let m = u.method_of(point.clone(), vec![int.clone()], vec![], false).unwrap();

    assert_eq!(m.rtype().num_in(), 2);
    assert_eq!(m.rtype().in_(0), Some(point.rtype()));
    assert_eq!(m.rtype().in_(1), Some(int.rtype()));
}
