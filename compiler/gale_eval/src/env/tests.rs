use super::*;

#[test]
fn statements_run_in_order() {
    let code = Code::new(vec![
        stmt(|env| {
            env.set(0, Value::Int(1));
            Ok(env.advance())
        }),
        stmt(|env| {
            let Value::Int(x) = env.get(0) else {
                return Err(EvalError::new("not an int"));
            };
            env.set(0, Value::Int(x * 10));
            Ok(env.advance())
        }),
    ]);
    let env = Env::new(Arc::new(code), 1, None, &[]);
    run(&env).unwrap();
    assert_eq!(env.get(0), Value::Int(10));
}

#[test]
fn backward_jump_loops_without_recursion() {
    // slot 0 counts down from 100_000; statement 0 jumps to itself.
    let top = Label::new();
    top.bind(0);
    let code = Code::new(vec![stmt(move |env| {
        let Value::Int(n) = env.get(0) else {
            return Err(EvalError::new("not an int"));
        };
        if n == 0 {
            return Ok(env.advance());
        }
        env.set(0, Value::Int(n - 1));
        Ok(env.jump(&top))
    })]);
    let env = Env::new(Arc::new(code), 1, None, &[Value::Int(100_000)]);
    run(&env).unwrap();
    assert_eq!(env.get(0), Value::Int(0));
}

#[test]
fn errors_stop_execution() {
    let code = Code::new(vec![
        stmt(|_| Err(EvalError::new("boom"))),
        stmt(|env| {
            env.set(0, Value::Bool(true));
            Ok(env.advance())
        }),
    ]);
    let env = Env::new(Arc::new(code), 1, None, &[]);
    assert_eq!(run(&env).unwrap_err().to_string(), "boom");
    assert_eq!(env.get(0), Value::Nil);
}

#[test]
fn ancestors_walk_outward() {
    let globals = Env::new(Arc::default(), 0, None, &[]);
    let slot = globals.push_slot(Value::Int(42));
    let inner = Env::new(Arc::default(), 0, Some(Arc::clone(&globals)), &[]);
    assert_eq!(inner.ancestor(1).unwrap().get(slot), Value::Int(42));
    assert!(inner.ancestor(2).is_err());
}

#[test]
fn unbound_labels_stop() {
    let label = Label::new();
    let env = Env::new(Arc::new(Code::new(Vec::new())), 0, None, &[]);
    assert!(matches!(env.jump(&label), Step::Stop));
}
