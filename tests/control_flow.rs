mod common;

use common::*;
use jsexec::{BinaryOp, Expr, JSError, Statement, Value, lock, value_to_json};

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn while_visits_body_once_per_true_test() {
    let program = vec![
        let_("x", num(0.0)),
        while_(lt(ident("x"), num(5.0)), block(vec![expr_stmt(inc(ident("x")))])),
        expr_stmt(ident("x")),
    ];
    let result = run_value(&program).unwrap();
    assert_eq!(as_number(&result), 5.0);
}

#[test]
fn do_while_runs_body_before_test() {
    let program = vec![
        let_("x", num(10.0)),
        do_while(block(vec![expr_stmt(inc(ident("x")))]), lt(ident("x"), num(5.0))),
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 11.0);
}

#[test]
fn do_while_break_stops_at_three() {
    let program = vec![
        let_("x", num(0.0)),
        do_while(
            block(vec![
                expr_stmt(inc(ident("x"))),
                if_(eq(ident("x"), num(3.0)), brk(None)),
            ]),
            lt(ident("x"), num(5.0)),
        ),
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 3.0);
}

#[test]
fn do_while_continue_skips_push() {
    let (_realm, out) = run_with_out(&[
        let_("i", num(0.0)),
        do_while(
            block(vec![
                expr_stmt(inc(ident("i"))),
                if_(eq(ident("i"), num(2.0)), cont(None)),
                push_out(ident("i")),
            ]),
            lt(ident("i"), num(5.0)),
        ),
    ]);
    assert_eq!(out_json(&out), serde_json::json!([1, 3, 4, 5]));
}

#[test]
fn for_loop_sums_zero_to_four() {
    let program = vec![
        let_("sum", num(0.0)),
        for_(
            Some(let_("i", num(0.0))),
            Some(lt(ident("i"), num(5.0))),
            Some(inc(ident("i"))),
            block(vec![expr_stmt(add_assign(ident("sum"), ident("i")))]),
        ),
        expr_stmt(ident("sum")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 10.0);
}

#[test]
fn for_loop_continue_still_runs_update() {
    let program = vec![
        let_("sum", num(0.0)),
        for_(
            Some(let_("i", num(0.0))),
            Some(lt(ident("i"), num(5.0))),
            Some(inc(ident("i"))),
            block(vec![
                if_(eq(ident("i"), num(2.0)), cont(None)),
                expr_stmt(add_assign(ident("sum"), ident("i"))),
            ]),
        ),
        expr_stmt(ident("sum")),
    ];
    // 0 + 1 + 3 + 4
    assert_eq!(as_number(&run_value(&program).unwrap()), 8.0);
}

#[test]
fn for_loop_without_test_breaks_manually() {
    let program = vec![
        let_("x", num(0.0)),
        for_(
            Some(let_("i", num(0.0))),
            None,
            Some(inc(ident("i"))),
            block(vec![
                expr_stmt(inc(ident("x"))),
                if_(eq(ident("i"), num(4.0)), brk(None)),
            ]),
        ),
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 5.0);
}

#[test]
fn return_exits_loop_through_function_boundary() {
    let program = vec![
        fn_decl(
            "test",
            vec![],
            vec![
                for_(
                    Some(let_("i", num(0.0))),
                    Some(lt(ident("i"), num(5.0))),
                    Some(inc(ident("i"))),
                    block(vec![if_(eq(ident("i"), num(2.0)), ret(Some(ident("i"))))]),
                ),
                ret(Some(num(0.0))),
            ],
        ),
        expr_stmt(call(ident("test"), vec![])),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn block_scoping_shadows_without_leaking() {
    let (_realm, out) = run_with_out(&[
        let_("x", num(0.0)),
        block(vec![let_("x", num(1.0)), push_out(ident("x"))]),
        push_out(ident("x")),
    ]);
    assert_eq!(out_json(&out), serde_json::json!([1, 0]));
}

#[test]
fn var_is_function_scoped_across_blocks() {
    let program = vec![
        fn_decl(
            "test",
            vec![],
            vec![block(vec![var_("x", num(42.0))]), ret(Some(ident("x")))],
        ),
        expr_stmt(call(ident("test"), vec![])),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 42.0);
}

#[test]
fn let_loop_variable_is_captured_per_iteration() {
    let (realm, out) = run_with_out(&[for_(
        Some(let_("i", num(0.0))),
        Some(lt(ident("i"), num(5.0))),
        Some(inc(ident("i"))),
        block(vec![push_out(closure(vec![ret(Some(ident("i")))]))]),
    )]);

    let Value::Object(arr) = &out else { panic!("out is not an object") };
    let closures: Vec<Value> = match &lock(arr).kind {
        jsexec::ObjectKind::Array(elements) => elements.clone(),
        _ => panic!("out is not an array"),
    };
    assert_eq!(closures.len(), 5);
    let captured: Vec<f64> = closures
        .iter()
        .map(|f| as_number(&realm.call(f, Value::Undefined, &[]).unwrap()))
        .collect();
    assert_eq!(captured, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn if_without_branch_completes_normally() {
    let program = vec![
        let_("x", num(1.0)),
        if_(eq(ident("x"), num(2.0)), expr_stmt(assign(ident("x"), num(9.0)))),
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 1.0);
}

#[test]
fn if_else_takes_alternate() {
    let program = vec![
        let_("r", num(0.0)),
        if_else(
            boolean(false),
            expr_stmt(assign(ident("r"), num(1.0))),
            expr_stmt(assign(ident("r"), num(2.0))),
        ),
        expr_stmt(ident("r")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn top_level_break_is_a_runtime_error() {
    let result = run_value(&[brk(None)]);
    assert!(matches!(result, Err(JSError::RuntimeError { .. })), "got {result:?}");
}

#[test]
fn continue_without_loop_inside_function_is_a_runtime_error() {
    let result = run_value(&[
        fn_decl("test", vec![], vec![cont(None)]),
        expr_stmt(call(ident("test"), vec![])),
    ]);
    assert!(matches!(result, Err(JSError::RuntimeError { .. })), "got {result:?}");
}

#[test]
fn runtime_control_flow_error_is_not_catchable() {
    // a stray break is a host-level error, not an interpreted exception
    let result = run_value(&[
        fn_decl(
            "test",
            vec![],
            vec![try_catch(vec![brk(None)], Some(pat("e")), vec![ret(Some(num(1.0)))])],
        ),
        expr_stmt(call(ident("test"), vec![])),
    ]);
    assert!(matches!(result, Err(JSError::RuntimeError { .. })), "got {result:?}");
}

#[test]
fn program_result_is_last_statement_value() {
    let program = vec![let_("x", num(3.0)), expr_stmt(binary(BinaryOp::Mul, ident("x"), num(4.0)))];
    assert_eq!(as_number(&run_value(&program).unwrap()), 12.0);
}

#[test]
fn nested_function_kinds_do_not_inherit_suspension() {
    // a plain function inside a generator cannot yield
    let result = run_value(&[
        gen_decl(
            "g",
            vec![],
            vec![
                fn_decl("inner", vec![], vec![expr_stmt(yield_(num(1.0)))]),
                expr_stmt(call(ident("inner"), vec![])),
            ],
        ),
        let_("it", call(ident("g"), vec![])),
        expr_stmt(method(ident("it"), "next", vec![])),
    ]);
    assert!(matches!(result, Err(JSError::SyntaxError { .. })), "got {result:?}");
}

#[test]
fn empty_and_debugger_statements_are_inert() {
    let program = vec![
        Statement::Empty,
        Statement::Debugger,
        let_("x", num(1.0)),
        Statement::Empty,
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 1.0);
}

#[test]
fn program_values_round_trip_to_json() {
    let (_realm, out) = run_with_out(&[
        push_out(str_("a")),
        push_out(num(1.5)),
        push_out(boolean(true)),
        push_out(Expr::Null),
    ]);
    assert_eq!(value_to_json(&out), serde_json::json!(["a", 1.5, true, null]));
}
