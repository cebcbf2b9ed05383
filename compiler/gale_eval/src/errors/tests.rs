use super::*;

#[test]
fn index_messages_name_the_valid_range() {
    assert_eq!(
        index_out_of_range(5, 3).to_string(),
        "index out of range: 5 not in 0...2"
    );
    assert_eq!(
        index_out_of_range(0, 0).to_string(),
        "index out of range: 0, slice is empty"
    );
}

#[test]
fn factories_fill_kind_and_message() {
    let err = nil_map_store();
    assert_eq!(err.kind, EvalErrorKind::NilMapStore);
    assert_eq!(err.message, "assignment to entry in nil map");

    let err = conversion_failed("string", "[]int");
    assert_eq!(err.to_string(), "cannot convert string to []int");
}

#[test]
fn compile_errors_keep_the_first_span() {
    let err = undefined("x")
        .with_span(Span::new(1, 2))
        .with_span(Span::new(7, 9));
    assert_eq!(err.span, Some(Span::new(1, 2)));
    assert_eq!(err.to_string(), "undefined: x");
}

#[test]
fn unsupported_category_names_the_type() {
    let err = unsupported_category("set_place_expr", Category::Unknown, &"*T");
    assert_eq!(
        err.to_string(),
        "set_place_expr: unsupported category unknown of type *T"
    );
}
