use super::*;

#[test]
fn byte_and_rune_are_aliases() {
    assert_eq!(Kind::from_basic_name("byte"), Some(Kind::Uint8));
    assert_eq!(Kind::from_basic_name("rune"), Some(Kind::Int32));
    assert_eq!(Kind::from_basic_name("float32"), Some(Kind::Float32));
    assert_eq!(Kind::from_basic_name("Point"), None);
}

#[test]
fn categories_group_integer_families() {
    assert_eq!(Kind::Int16.category(), Category::Int);
    assert_eq!(Kind::Uintptr.category(), Category::Uint);
    assert_eq!(Kind::Complex64.category(), Category::Complex);
    assert_eq!(Kind::Map.category(), Category::Unknown);
    assert_eq!(Kind::Func.category(), Category::Func);
}

#[test]
fn every_basic_kind_is_basic() {
    for kind in Kind::BASIC {
        assert!(kind.is_basic(), "{kind} should be basic");
        assert!(kind.layout().is_some());
    }
    assert!(!Kind::Slice.is_basic());
}

#[test]
fn widths_match_names() {
    assert_eq!(Kind::Int8.bits(), 8);
    assert_eq!(Kind::Uint32.bits(), 32);
    assert_eq!(Kind::Int.bits(), 64);
    assert_eq!(Kind::String.bits(), 0);
}
