use gale_dep::Scope;
use gale_ir::{AstBuilder, BinaryOp, ExprId, FuncDecl, FuncSig, Item, Param, Span, StmtId};
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::{CompileErrorKind, EvalErrorKind};
use crate::host::{fmt_package, panic_func, PrintHandler};
use crate::value::StructValue;

fn build_with(
    b: AstBuilder,
    items: &[Item],
    options: &CompileOptions,
    register: impl FnOnce(&Universe, &mut Hosts),
) -> (Result<Package, CompileError>, PrintHandler) {
    let universe = Universe::new();
    let out = PrintHandler::buffer();
    let mut hosts = Hosts::new();
    hosts.register_package(fmt_package(&universe, &out).unwrap());
    hosts.register_func(panic_func(&universe).unwrap());
    register(&universe, &mut hosts);

    let interner = b.interner().clone();
    let arena = b.finish();
    let mut scope = Scope::new(interner, arena);
    scope.load_all(items).unwrap();
    (compile(&scope, &universe, &hosts, options), out)
}

fn build(b: AstBuilder, items: &[Item]) -> (Package, PrintHandler) {
    let (package, out) = build_with(b, items, &CompileOptions::default(), |_, _| {});
    (package.unwrap(), out)
}

fn compile_err(b: AstBuilder, items: &[Item]) -> CompileError {
    build_with(b, items, &CompileOptions::default(), |_, _| {})
        .0
        .unwrap_err()
}

/// `func main() T { return value }`
fn main_returning(b: &mut AstBuilder, ty: &str, stmts: Vec<StmtId>, value: ExprId) -> Item {
    let ty = b.ty(ty);
    let sig = b.sig(&[], &[ty]);
    let ret = b.ret(vec![value]);
    let body = b.block(stmts.into_iter().chain([ret]));
    b.func_decl("main", sig, body)
}

// ── Functions and control flow ──────────────────────────────────────

#[test]
fn recursive_function() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let sig = b.sig(&[("n", int)], &[int]);

    // if n <= 1 { return 1 }
    let (n, one) = (b.ident("n"), b.int(1));
    let cond = b.binary(BinaryOp::LtEq, n, one);
    let one = b.int(1);
    let early = b.ret(vec![one]);
    let then = b.block([early]);
    let base = b.if_stmt(cond, then, None);

    // return n * fact(n - 1)
    let (n, n2, one) = (b.ident("n"), b.ident("n"), b.int(1));
    let sub = b.binary(BinaryOp::Sub, n2, one);
    let rec = b.call_named("fact", [sub]);
    let prod = b.binary(BinaryOp::Mul, n, rec);
    let ret = b.ret(vec![prod]);
    let body = b.block([base, ret]);
    let fact = b.func_decl("fact", sig, body);

    let (package, _) = build(b, &[fact]);
    assert_eq!(
        package.call("fact", &[Value::Int(10)]).unwrap(),
        vec![Value::Int(3_628_800)]
    );
}

#[test]
fn for_loop_with_break_and_continue() {
    let mut b = AstBuilder::default();

    // t := 0
    let zero = b.int(0);
    let init_t = b.define(&["t"], vec![zero]);

    // for i := 0; i < 100; i++ { if i == 5 { break }; if i % 2 == 0 { continue }; t += i }
    let zero = b.int(0);
    let init = b.define(&["i"], vec![zero]);
    let (i, hundred) = (b.ident("i"), b.int(100));
    let cond = b.binary(BinaryOp::Lt, i, hundred);
    let i = b.ident("i");
    let post = b.inc(i);

    let (i, five) = (b.ident("i"), b.int(5));
    let is_five = b.binary(BinaryOp::Eq, i, five);
    let brk = b.break_stmt();
    let then = b.block([brk]);
    let stop = b.if_stmt(is_five, then, None);

    let (i, two) = (b.ident("i"), b.int(2));
    let rem = b.binary(BinaryOp::Rem, i, two);
    let zero = b.int(0);
    let even = b.binary(BinaryOp::Eq, rem, zero);
    let cont = b.continue_stmt();
    let then = b.block([cont]);
    let skip = b.if_stmt(even, then, None);

    let (t, i) = (b.ident("t"), b.ident("i"));
    let add = b.op_assign(BinaryOp::Add, t, i);
    let body = b.block([stop, skip, add]);
    let lp = b.for_stmt(Some(init), Some(cond), Some(post), body);

    let t = b.ident("t");
    let main = main_returning(&mut b, "int", vec![init_t, lp], t);

    let (package, _) = build(b, &[main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(1 + 3)]);
}

#[test]
fn if_else_chains() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let string = b.ty("string");
    let sig = b.sig(&[("n", int)], &[string]);

    // if n < 0 { return "neg" } else if n == 0 { return "zero" } else { return "pos" }
    let (n, zero) = (b.ident("n"), b.int(0));
    let neg = b.binary(BinaryOp::Lt, n, zero);
    let (n, zero) = (b.ident("n"), b.int(0));
    let is_zero = b.binary(BinaryOp::Eq, n, zero);
    let s = b.string("neg");
    let r = b.ret(vec![s]);
    let neg_block = b.block([r]);
    let s = b.string("zero");
    let r = b.ret(vec![s]);
    let zero_block = b.block([r]);
    let s = b.string("pos");
    let r = b.ret(vec![s]);
    let pos_block = b.block([r]);
    let pos = b.block_stmt(pos_block);
    let inner = b.if_stmt(is_zero, zero_block, Some(pos));
    let outer = b.if_stmt(neg, neg_block, Some(inner));
    let body = b.block([outer]);
    let sign = b.func_decl("sign", sig, body);

    let (package, _) = build(b, &[sign]);
    for (n, want) in [(-3, "neg"), (0, "zero"), (8, "pos")] {
        assert_eq!(package.call("sign", &[Value::Int(n)]).unwrap(), vec![Value::str(want)]);
    }
}

#[test]
fn closures_share_captured_variables() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");

    // func counter() func() int { n := 0; return func() int { n++; return n } }
    let lit_sig = b.sig(&[], &[int]);
    let n = b.ident("n");
    let inc = b.inc(n);
    let n = b.ident("n");
    let ret = b.ret(vec![n]);
    let lit_body = b.block([inc, ret]);
    let lit = b.func_lit(lit_sig, lit_body);
    let zero = b.int(0);
    let define = b.define(&["n"], vec![zero]);
    let ret = b.ret(vec![lit]);
    let body = b.block([define, ret]);
    let func_sig = b.sig(&[], &[int]);
    let func_ty = b.func_type(func_sig);
    let sig = b.sig(&[], &[func_ty]);
    let counter = b.func_decl("counter", sig, body);

    // next := counter(); next(); next(); return next()
    let call = b.call_named("counter", []);
    let define = b.define(&["next"], vec![call]);
    let first = b.call_named("next", []);
    let first = b.expr_stmt(first);
    let second = b.call_named("next", []);
    let second = b.expr_stmt(second);
    let third = b.call_named("next", []);
    let main = main_returning(&mut b, "int", vec![define, first, second], third);

    let (package, _) = build(b, &[counter, main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(3)]);
}

#[test]
fn named_results_and_multiple_values() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");

    // func divmod(a, b int) (q, r int) { q = a / b; r = a % b; return }
    let sig = FuncSig {
        params: [("a", int), ("b", int)]
            .into_iter()
            .map(|(n, ty)| Param {
                name: Some(b.name(n)),
                ty,
            })
            .collect(),
        results: ["q", "r"]
            .into_iter()
            .map(|n| Param {
                name: Some(b.name(n)),
                ty: int,
            })
            .collect(),
        variadic: false,
    };
    let (q, a, bb) = (b.ident("q"), b.ident("a"), b.ident("b"));
    let div = b.binary(BinaryOp::Div, a, bb);
    let set_q = b.assign1(q, div);
    let (r, a, bb) = (b.ident("r"), b.ident("a"), b.ident("b"));
    let rem = b.binary(BinaryOp::Rem, a, bb);
    let set_r = b.assign1(r, rem);
    let bare = b.ret(vec![]);
    let body = b.block([set_q, set_r, bare]);
    let divmod = b.func_decl("divmod", sig, body);

    // q, r := divmod(17, 5); return q*10 + r
    let (x, y) = (b.int(17), b.int(5));
    let call = b.call_named("divmod", [x, y]);
    let define = b.define(&["q", "r"], vec![call]);
    let (q, ten) = (b.ident("q"), b.int(10));
    let scaled = b.binary(BinaryOp::Mul, q, ten);
    let r = b.ident("r");
    let sum = b.binary(BinaryOp::Add, scaled, r);
    let main = main_returning(&mut b, "int", vec![define], sum);

    let (package, _) = build(b, &[divmod, main]);
    assert_eq!(
        package.call("divmod", &[Value::Int(7), Value::Int(2)]).unwrap(),
        vec![Value::Int(3), Value::Int(1)]
    );
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(32)]);
}

#[test]
fn parallel_assignment_swaps() {
    let mut b = AstBuilder::default();
    // a, b := 1, 2; a, b = b, a; return a*10 + b
    let (one, two) = (b.int(1), b.int(2));
    let define = b.define(&["a", "b"], vec![one, two]);
    let (a, bb) = (b.ident("a"), b.ident("b"));
    let (a2, b2) = (b.ident("a"), b.ident("b"));
    let swap = b.assign(vec![a, bb], vec![b2, a2]);
    let (a, ten) = (b.ident("a"), b.int(10));
    let scaled = b.binary(BinaryOp::Mul, a, ten);
    let bb = b.ident("b");
    let sum = b.binary(BinaryOp::Add, scaled, bb);
    let main = main_returning(&mut b, "int", vec![define, swap], sum);

    let (package, _) = build(b, &[main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(21)]);
}

#[test]
fn variadic_arguments_are_packed() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let mut sig = b.sig(&[("xs", int)], &[int]);
    sig.variadic = true;

    // t := 0; for i := 0; i < len(xs); i++ { t += xs[i] }; return t
    let zero = b.int(0);
    let init_t = b.define(&["t"], vec![zero]);
    let zero = b.int(0);
    let init = b.define(&["i"], vec![zero]);
    let i = b.ident("i");
    let xs = b.ident("xs");
    let len = b.call_named("len", [xs]);
    let cond = b.binary(BinaryOp::Lt, i, len);
    let i = b.ident("i");
    let post = b.inc(i);
    let (xs, i) = (b.ident("xs"), b.ident("i"));
    let elem = b.index(xs, i);
    let t = b.ident("t");
    let add = b.op_assign(BinaryOp::Add, t, elem);
    let body = b.block([add]);
    let lp = b.for_stmt(Some(init), Some(cond), Some(post), body);
    let t = b.ident("t");
    let ret = b.ret(vec![t]);
    let body = b.block([init_t, lp, ret]);
    let sum = b.func_decl("sum", sig, body);

    // return sum(1, 2, 3) + sum()
    let (x, y, z) = (b.int(1), b.int(2), b.int(3));
    let some = b.call_named("sum", [x, y, z]);
    let none = b.call_named("sum", []);
    let total = b.binary(BinaryOp::Add, some, none);
    let main = main_returning(&mut b, "int", vec![], total);

    let (package, _) = build(b, &[sum, main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(6)]);
}

// ── Composite values ────────────────────────────────────────────────

#[test]
fn maps_and_slices() {
    let mut b = AstBuilder::default();
    let string = b.ty("string");
    let int = b.ty("int");
    let map_ty = b.map_of(string, int);
    let slice_ty = b.slice_of(int);

    // m := map[string]int{"a": 1}
    let (k, v) = (b.string("a"), b.int(1));
    let lit = b.composite(map_ty, [(Some(k), v)]);
    let define_m = b.define(&["m"], vec![lit]);
    // m["b"] = 2
    let (m, k, two) = (b.ident("m"), b.string("b"), b.int(2));
    let entry = b.index(m, k);
    let store = b.assign1(entry, two);
    // m["a"] += 10
    let (m, k, ten) = (b.ident("m"), b.string("a"), b.int(10));
    let entry = b.index(m, k);
    let bump = b.op_assign(BinaryOp::Add, entry, ten);
    // delete(m, "b")
    let (m, k) = (b.ident("m"), b.string("b"));
    let del = b.call_named("delete", [m, k]);
    let del = b.expr_stmt(del);
    // s := make([]int, 0, 2); s = append(s, 5, 6, 7)
    let ty = b.type_operand(slice_ty);
    let (len, cap) = (b.int(0), b.int(2));
    let make = b.call_named("make", [ty, len, cap]);
    let define_s = b.define(&["s"], vec![make]);
    let (s, s2) = (b.ident("s"), b.ident("s"));
    let (x, y, z) = (b.int(5), b.int(6), b.int(7));
    let app = b.call_named("append", [s2, x, y, z]);
    let grow = b.assign1(s, app);

    // return m["a"] + len(s) + s[2] + len(m)
    let (m, k) = (b.ident("m"), b.string("a"));
    let a = b.index(m, k);
    let s = b.ident("s");
    let len_s = b.call_named("len", [s]);
    let (s, two) = (b.ident("s"), b.int(2));
    let third = b.index(s, two);
    let m = b.ident("m");
    let len_m = b.call_named("len", [m]);
    let sum = b.binary(BinaryOp::Add, a, len_s);
    let sum = b.binary(BinaryOp::Add, sum, third);
    let sum = b.binary(BinaryOp::Add, sum, len_m);
    let main = main_returning(
        &mut b,
        "int",
        vec![define_m, store, bump, del, define_s, grow],
        sum,
    );

    let (package, _) = build(b, &[main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(11 + 3 + 7 + 1)]);
}

#[test]
fn struct_fields_and_methods() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let fields = b.struct_type(&[("X", int), ("Y", int)]);
    let point = b.type_decl("Point", fields);

    // func (p Point) Sum() int { return p.X + p.Y }
    let recv_ty = b.ty("Point");
    let sig = b.sig(&[], &[int]);
    let (p, p2) = (b.ident("p"), b.ident("p"));
    let (x, y) = (b.selector(p, "X"), b.selector(p2, "Y"));
    let sum = b.binary(BinaryOp::Add, x, y);
    let ret = b.ret(vec![sum]);
    let body = b.block([ret]);
    let method = b.method_decl(("p", recv_ty), "Sum", sig, body);

    // p := Point{X: 3, Y: 4}; p.X = 10; return p.Sum()
    let lit_ty = b.ty("Point");
    let (kx, ky) = (b.ident("X"), b.ident("Y"));
    let (three, four) = (b.int(3), b.int(4));
    let lit = b.composite(lit_ty, [(Some(kx), three), (Some(ky), four)]);
    let define = b.define(&["p"], vec![lit]);
    let p = b.ident("p");
    let px = b.selector(p, "X");
    let ten = b.int(10);
    let store = b.assign1(px, ten);
    let p = b.ident("p");
    let callee = b.selector(p, "Sum");
    let call = b.call(callee, []);
    let main = main_returning(&mut b, "int", vec![define, store], call);

    let (package, _) = build(b, &[point, method, main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(14)]);

    let recv = Value::Struct(StructValue::new(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(package.call("Point.Sum", &[recv]).unwrap(), vec![Value::Int(3)]);
}

// ── Package-level declarations ──────────────────────────────────────

#[test]
fn globals_initialize_in_dependency_order() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");

    // var total = double(base); var base = 21
    let base = b.ident("base");
    let call = b.call_named("double", [base]);
    let total = b.var_decl("total", None, Some(call));
    let value = b.int(21);
    let base = b.var_decl("base", None, Some(value));

    // func double(x int) int { return x * 2 }
    let sig = b.sig(&[("x", int)], &[int]);
    let (x, two) = (b.ident("x"), b.int(2));
    let prod = b.binary(BinaryOp::Mul, x, two);
    let ret = b.ret(vec![prod]);
    let body = b.block([ret]);
    let double = b.func_decl("double", sig, body);

    let (package, _) = build(b, &[total, base, double]);
    assert_eq!(package.var("total"), Some(Value::Int(0)));
    package.run_init().unwrap();
    assert_eq!(package.var("total"), Some(Value::Int(42)));
    assert_eq!(package.var("base"), Some(Value::Int(21)));
}

#[test]
fn init_functions_run_after_variables() {
    let mut b = AstBuilder::default();
    let ten = b.int(10);
    let x = b.var_decl("x", None, Some(ten));
    let mut inits = Vec::new();
    for step in [1, 2] {
        let sig = b.sig(&[], &[]);
        let (x, n) = (b.ident("x"), b.int(step));
        let add = b.op_assign(BinaryOp::Add, x, n);
        let body = b.block([add]);
        inits.push(b.func_decl("init", sig, body));
    }
    let mut items = vec![x];
    items.extend(inits);

    let (package, _) = build(b, &items);
    assert!(package.func("init").is_none());
    package.run_init().unwrap();
    assert_eq!(package.var("x"), Some(Value::Int(13)));
}

#[test]
fn iota_counts_within_a_const_block() {
    let mut b = AstBuilder::default();
    let iota = b.ident("iota");
    let a = b.value_spec(&["A"], None, vec![iota]);
    let bb = b.value_spec(&["B"], None, vec![]);
    let c = b.value_spec(&["C"], None, vec![]);
    let consts = b.const_block(vec![a, bb, c]);

    // return A*100 + B*10 + C
    let (a, hundred) = (b.ident("A"), b.int(100));
    let a = b.binary(BinaryOp::Mul, a, hundred);
    let (bb, ten) = (b.ident("B"), b.int(10));
    let bb = b.binary(BinaryOp::Mul, bb, ten);
    let c = b.ident("C");
    let sum = b.binary(BinaryOp::Add, a, bb);
    let sum = b.binary(BinaryOp::Add, sum, c);
    let main = main_returning(&mut b, "int", vec![], sum);

    let (package, _) = build(b, &[consts, main]);
    assert_eq!(package.call("main", &[]).unwrap(), vec![Value::Int(12)]);
}

#[test]
fn imported_fmt_prints_to_the_handler() {
    let mut b = AstBuilder::default();
    let import = b.import("fmt", None);

    // fmt.Println("hi", 42); fmt.Print("a", "b", 1, 2)
    let fmt = b.ident("fmt");
    let println = b.selector(fmt, "Println");
    let (hi, n) = (b.string("hi"), b.int(42));
    let call = b.call(println, [hi, n]);
    let first = b.expr_stmt(call);
    let fmt = b.ident("fmt");
    let print = b.selector(fmt, "Print");
    let (x, y, one, two) = (b.string("a"), b.string("b"), b.int(1), b.int(2));
    let call = b.call(print, [x, y, one, two]);
    let second = b.expr_stmt(call);
    let sig = b.sig(&[], &[]);
    let body = b.block([first, second]);
    let main = b.func_decl("main", sig, body);

    let (package, out) = build(b, &[import, main]);
    assert_eq!(package.call("main", &[]).unwrap(), Vec::<Value>::new());
    assert_eq!(out.output(), "hi 42\nab1 2");
}

#[test]
fn bodyless_functions_bind_to_host_functions() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let sig = b.sig(&[("x", int)], &[int]);
    let name = b.name("triple");
    let decl = Item::Func(FuncDecl {
        name,
        recv: None,
        sig,
        body: None,
        span: Span::DUMMY,
    });
    let seven = b.int(7);
    let call = b.call_named("triple", [seven]);
    let main = main_returning(&mut b, "int", vec![], call);

    let (package, _) = build_with(b, &[decl, main], &CompileOptions::default(), |u, hosts| {
        let int = u.basic(Kind::Int);
        let ty = u.func_of(vec![int.clone()], vec![int], false).unwrap();
        hosts.register_func(HostFunc::new("triple", ty, |args| match args {
            [Value::Int(x)] => Ok(vec![Value::Int(x * 3)]),
            _ => Err(EvalError::new("triple wants one int")),
        }));
    });
    assert_eq!(package.unwrap().call("main", &[]).unwrap(), vec![Value::Int(21)]);
}

// ── Native lowering ─────────────────────────────────────────────────

#[test]
fn eligible_functions_are_lowered() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let string = b.ty("string");

    let sig = b.sig(&[("a", int), ("b", int)], &[int]);
    let (x, y) = (b.ident("a"), b.ident("b"));
    let sum = b.binary(BinaryOp::Add, x, y);
    let ret = b.ret(vec![sum]);
    let body = b.block([ret]);
    let add = b.func_decl("add", sig, body);

    let sig = b.sig(&[("s", string)], &[string]);
    let s = b.ident("s");
    let ret = b.ret(vec![s]);
    let body = b.block([ret]);
    let echo = b.func_decl("echo", sig, body);

    let options = CompileOptions::default().lower_native(true);
    let (package, _) = build_with(b, &[add, echo], &options, |_, _| {});
    let package = package.unwrap();
    assert!(package.lowered("add").is_some());
    assert!(package.lowered("echo").is_none());
    assert_eq!(package.lowered_names().collect::<Vec<_>>(), vec!["add"]);
    // The threaded code still runs.
    assert_eq!(
        package.call("add", &[Value::Int(2), Value::Int(3)]).unwrap(),
        vec![Value::Int(5)]
    );
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn undefined_names_are_reported_with_a_span() {
    let mut b = AstBuilder::default();
    let y = b.ident("y");
    let main = main_returning(&mut b, "int", vec![], y);
    let err = compile_err(b, &[main]);
    assert_eq!(err.kind, CompileErrorKind::Undefined { name: "y".into() });
    assert!(err.span.is_some());
}

#[test]
fn mismatched_operand_types_are_rejected() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let string = b.ty("string");
    let sig = b.sig(&[("a", int), ("s", string)], &[int]);
    let (a, s) = (b.ident("a"), b.ident("s"));
    let sum = b.binary(BinaryOp::Add, a, s);
    let ret = b.ret(vec![sum]);
    let body = b.block([ret]);
    let f = b.func_decl("f", sig, body);

    let err = compile_err(b, &[f]);
    assert_eq!(err.message, "invalid operation: + (mismatched types int and string)");
}

#[test]
fn constant_overflow_is_a_compile_error() {
    let mut b = AstBuilder::default();
    let int8 = b.ty("int8");
    let big = b.int(300);
    let var = b.var_decl("small", Some(int8), Some(big));
    let err = compile_err(b, &[var]);
    assert_eq!(err.message, "constant 300 overflows int8");
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let mut b = AstBuilder::default();
    let sig = b.sig(&[], &[]);
    let brk = b.break_stmt();
    let body = b.block([brk]);
    let f = b.func_decl("f", sig, body);
    let err = compile_err(b, &[f]);
    assert_eq!(err.kind, CompileErrorKind::BranchOutsideLoop { keyword: "break" });
}

#[test]
fn runtime_errors_propagate_to_the_caller() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let slice_ty = b.slice_of(int);

    // s := []int{1}; return s[i]
    let sig = b.sig(&[("i", int)], &[int]);
    let one = b.int(1);
    let lit = b.composite(slice_ty, [(None, one)]);
    let define = b.define(&["s"], vec![lit]);
    let (s, i) = (b.ident("s"), b.ident("i"));
    let elem = b.index(s, i);
    let ret = b.ret(vec![elem]);
    let body = b.block([define, ret]);
    let at = b.func_decl("at", sig, body);

    // return a / b
    let sig = b.sig(&[("a", int), ("b", int)], &[int]);
    let (x, y) = (b.ident("a"), b.ident("b"));
    let quo = b.binary(BinaryOp::Div, x, y);
    let ret = b.ret(vec![quo]);
    let body = b.block([ret]);
    let div = b.func_decl("div", sig, body);

    // panic("boom")
    let sig = b.sig(&[], &[]);
    let msg = b.string("boom");
    let call = b.call_named("panic", [msg]);
    let stmt = b.expr_stmt(call);
    let body = b.block([stmt]);
    let fail = b.func_decl("fail", sig, body);

    let (package, _) = build(b, &[at, div, fail]);
    assert_eq!(package.call("at", &[Value::Int(0)]).unwrap(), vec![Value::Int(1)]);
    assert_eq!(
        package.call("at", &[Value::Int(3)]).unwrap_err().kind,
        EvalErrorKind::IndexOutOfRange { index: 3, len: 1 }
    );
    assert_eq!(
        package.call("div", &[Value::Int(1), Value::Int(0)]).unwrap_err().kind,
        EvalErrorKind::DivisionByZero
    );
    assert_eq!(package.call("fail", &[]).unwrap_err().message, "panic: boom");
}

#[test]
fn storing_into_a_nil_global_map_fails() {
    let mut b = AstBuilder::default();
    let (string, int) = (b.ty("string"), b.ty("int"));
    let map_ty = b.map_of(string, int);
    let var = b.var_decl("m", Some(map_ty), None);
    let sig = b.sig(&[], &[]);
    let (m, k, one) = (b.ident("m"), b.string("a"), b.int(1));
    let entry = b.index(m, k);
    let store = b.assign1(entry, one);
    let body = b.block([store]);
    let set = b.func_decl("set", sig, body);

    let (package, _) = build(b, &[var, set]);
    assert_eq!(
        package.call("set", &[]).unwrap_err().kind,
        EvalErrorKind::NilMapStore
    );
}

#[test]
fn unbounded_recursion_hits_the_call_depth_limit() {
    let mut b = AstBuilder::default();
    let int = b.ty("int");
    let sig = b.sig(&[("n", int)], &[int]);
    let (n, one) = (b.ident("n"), b.int(1));
    let next = b.binary(BinaryOp::Add, n, one);
    let rec = b.call_named("spin", [next]);
    let ret = b.ret(vec![rec]);
    let body = b.block([ret]);
    let spin = b.func_decl("spin", sig, body);

    let options = CompileOptions::default().max_call_depth(Some(50));
    let (package, _) = build_with(b, &[spin], &options, |_, _| {});
    assert_eq!(
        package.unwrap().call("spin", &[Value::Int(0)]).unwrap_err().kind,
        EvalErrorKind::CallDepthExceeded { limit: 50 }
    );
}
