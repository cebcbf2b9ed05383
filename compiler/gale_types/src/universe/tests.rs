use super::*;
use crate::{Category, TypeFlags};
use pretty_assertions::assert_eq;
use rayon::prelude::*;

fn field(name: &str, ty: Type) -> Field {
    Field {
        name: Arc::from(name),
        ty,
        embedded: false,
    }
}

#[test]
fn construction_is_cached() {
    let u = Universe::new();
    let a = u.slice_of(u.basic(Kind::String));
    let b = u.slice_of(u.basic(Kind::String));
    assert!(a.ptr_eq(&b));
    assert_eq!(a.to_string(), "[]string");
}

#[test]
fn reverse_lookup_maps_descriptor_to_type() {
    let u = Universe::new();
    let m = u.map_of(u.basic(Kind::String), u.basic(Kind::Int)).unwrap();
    let found = u.type_of_rtype(m.rtype()).unwrap();
    assert!(found.ptr_eq(&m));
    assert_eq!(found.to_string(), "map[string]int");
}

#[test]
fn interfaces_differing_in_method_signature_stay_distinct() {
    let u = Universe::new();
    let returning = |kind| {
        let sig = u.func_of(vec![], vec![u.basic(kind)], false).unwrap();
        u.interface_of(vec![Method {
            name: Arc::from("M"),
            ty: sig,
        }])
        .unwrap()
    };
    let ints = returning(Kind::Int);
    let strings = returning(Kind::String);

    assert!(ints.rtype() != strings.rtype());
    assert!(u.type_of_rtype(ints.rtype()).unwrap().ptr_eq(&ints));
    assert!(u.type_of_rtype(strings.rtype()).unwrap().ptr_eq(&strings));
}

#[test]
fn map_keys_must_be_comparable() {
    let u = Universe::new();
    let ints = u.slice_of(u.basic(Kind::Int));
    assert_eq!(
        u.map_of(ints, u.basic(Kind::Int)),
        Err(TypeError::NotComparable {
            ty: "[]int".to_owned()
        })
    );
}

#[test]
fn named_types_are_nominal() {
    let u = Universe::new();
    let a = u.named_of("Meters", None);
    let b = u.named_of("Meters", None);
    assert_ne!(a, b);

    let float = u.basic(Kind::Float64);
    u.set_underlying(&a, &float).unwrap();
    assert_eq!(a.kind(), Kind::Float64);
    assert_eq!(a.category(), Category::Float);
    assert_eq!(a.underlying(), float);
    assert!(a.flags().contains(TypeFlags::IS_NAMED | TypeFlags::IS_FLOAT));
    assert_eq!(
        u.set_underlying(&a, &float),
        Err(TypeError::AlreadyDefined {
            name: "Meters".to_owned()
        })
    );
}

#[test]
fn recursive_types_through_pointers_are_allowed() {
    let u = Universe::new();
    let node = u.named_of("Node", None);
    let next = u.pointer_to(node.clone());
    let body = u
        .struct_of(vec![field("value", u.basic(Kind::Int)), field("next", next)])
        .unwrap();
    u.set_underlying(&node, &body).unwrap();

    assert_eq!(node.kind(), Kind::Struct);
    assert_eq!(node.rtype().size(), 16);
    assert_eq!(node.field_by_name("next").map(|(i, _)| i), Some(1));
    assert_eq!(body.to_string(), "struct { value int; next *Node }");
}

#[test]
fn recursive_types_by_value_are_rejected() {
    let u = Universe::new();
    let node = u.named_of("Loop", None);
    let body = u.struct_of(vec![field("inner", node.clone())]).unwrap();
    assert_eq!(
        u.set_underlying(&node, &body),
        Err(TypeError::InvalidRecursive {
            name: "Loop".to_owned()
        })
    );
}

#[test]
fn methods_are_attached_to_named_types() {
    let u = Universe::new();
    let counter = u.named_of("Counter", None);
    u.set_underlying(&counter, &u.basic(Kind::Int)).unwrap();
    let get = u
        .method_of(counter.clone(), vec![], vec![u.basic(Kind::Int)], false)
        .unwrap();

    u.add_method(&counter, "Get", get.clone()).unwrap();
    assert_eq!(counter.method("Get"), Some(get.clone()));
    assert!(matches!(
        u.add_method(&counter, "Get", get),
        Err(TypeError::DuplicateMethod { .. })
    ));

    let plain = u.func_of(vec![], vec![], false).unwrap();
    assert!(matches!(
        u.add_method(&counter, "Reset", plain),
        Err(TypeError::NotMethod { .. })
    ));
}

#[test]
fn interface_satisfaction_ignores_receivers() {
    let u = Universe::new();
    let string = u.basic(Kind::String);
    let sig = u.func_of(vec![], vec![string.clone()], false).unwrap();
    let stringer = u
        .interface_of(vec![Method {
            name: Arc::from("String"),
            ty: sig,
        }])
        .unwrap();
    assert_eq!(stringer.to_string(), "interface { String() string }");

    let name = u.named_of("Name", None);
    u.set_underlying(&name, &string).unwrap();
    assert!(!name.assignable_to(&stringer));

    let method = u.method_of(name.clone(), vec![], vec![string.clone()], false).unwrap();
    u.add_method(&name, "String", method).unwrap();
    assert!(name.implements(&stringer));
    assert!(name.assignable_to(&stringer));
    assert!(!string.assignable_to(&name));
}

#[test]
fn unnamed_values_assign_to_named_with_same_underlying() {
    let u = Universe::new();
    let ints = u.slice_of(u.basic(Kind::Int));
    let list = u.named_of("List", None);
    u.set_underlying(&list, &ints).unwrap();
    assert!(ints.assignable_to(&list));
    assert!(list.assignable_to(&ints));
}

#[test]
fn racing_construction_yields_one_instance() {
    let u = Universe::new();
    let int = u.basic(Kind::Int);
    let boolean = u.basic(Kind::Bool);

    let built: Vec<Type> = (0..64)
        .into_par_iter()
        .map(|_| {
            u.func_of(vec![int.clone(), int.clone()], vec![boolean.clone()], false)
                .unwrap()
        })
        .collect();

    assert!(built.iter().all(|t| t.ptr_eq(&built[0])));
    assert!(u.type_of_rtype(built[0].rtype()).is_some());
}
