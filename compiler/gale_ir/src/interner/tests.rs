use super::*;

#[test]
fn intern_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("counter");
    let b = interner.intern("counter");
    assert_eq!(a, b);
    assert_eq!(interner.lookup(a), "counter");
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    assert_ne!(interner.intern("x"), interner.intern("y"));
}

#[test]
fn empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn predeclared_identifiers_are_known() {
    let interner = StringInterner::new();
    assert!(interner.get("iota").is_some());
    assert!(interner.get("float64").is_some());
    assert!(interner.get("definitely_not_interned").is_none());
}

#[test]
fn shared_interner_clones_share_storage() {
    let shared = SharedInterner::new();
    let other = shared.clone();
    let name = shared.intern("shared");
    assert_eq!(other.get("shared"), Some(name));
}
