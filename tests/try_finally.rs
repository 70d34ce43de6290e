mod common;

use common::*;
use jsexec::{JSError, Pattern, Statement, VarKind, value_to_string};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn catch_binds_the_thrown_value() {
    let program = vec![
        let_("a", num(0.0)),
        try_catch(vec![throw(num(1.0))], Some(pat("err")), vec![expr_stmt(assign(ident("a"), ident("err")))]),
        expr_stmt(ident("a")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 1.0);
}

#[test]
fn catch_without_parameter_still_recovers() {
    let program = vec![
        let_("b", num(0.0)),
        try_catch(vec![throw(num(1.0))], None, vec![expr_stmt(assign(ident("b"), num(2.0)))]),
        expr_stmt(ident("b")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn finally_return_overrides_try_and_catch_returns() {
    // try { return 1 } catch { return 2 } finally { return 3 }  ->  3
    let program = vec![
        fn_decl(
            "c",
            vec![],
            vec![try_catch_finally(
                vec![ret(Some(num(1.0)))],
                None,
                vec![ret(Some(num(2.0)))],
                vec![ret(Some(num(3.0)))],
            )],
        ),
        expr_stmt(call(ident("c"), vec![])),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 3.0);
}

#[test]
fn finally_break_overrides_continue_in_loop() {
    // for (const i of [4,5,6]) { try { d = i; continue } finally { break } }
    let program = vec![
        let_("d", num(0.0)),
        for_of(
            VarKind::Const,
            "i",
            array(vec![num(4.0), num(5.0), num(6.0)]),
            block(vec![Statement::Try {
                block: vec![expr_stmt(assign(ident("d"), ident("i"))), cont(None)],
                handler: None,
                finalizer: Some(vec![brk(None)]),
            }]),
        ),
        expr_stmt(ident("d")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 4.0);
}

#[test]
fn finally_runs_on_the_normal_path() {
    let (_realm, out) = run_with_out(&[
        try_finally(vec![push_out(str_("try"))], vec![push_out(str_("finally"))]),
        push_out(str_("after")),
    ]);
    assert_eq!(out_json(&out), serde_json::json!(["try", "finally", "after"]));
}

#[test]
fn finally_runs_while_a_throw_unwinds() {
    let realm = jsexec::Realm::new();
    let out = jsexec::Value::Object(jsexec::new_array(vec![]));
    realm.define_global("out", out.clone());
    let result = realm.evaluate_program(&[
        try_finally(vec![throw(str_("boom"))], vec![push_out(str_("cleanup"))]),
        push_out(str_("unreached")),
    ]);
    assert!(matches!(result, Err(JSError::Throw { .. })));
    assert_eq!(out_json(&out), serde_json::json!(["cleanup"]));
}

#[test]
fn quiet_finally_leaves_pending_throw_standing() {
    let program = vec![
        let_("r", num(0.0)),
        try_catch(
            vec![try_finally(vec![throw(num(9.0))], vec![expr_stmt(inc(ident("r")))])],
            Some(pat("e")),
            vec![expr_stmt(add_assign(ident("r"), ident("e")))],
        ),
        expr_stmt(ident("r")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 10.0);
}

#[test]
fn finally_throw_replaces_original_throw() {
    let result = run_value(&[try_finally(vec![throw(str_("original"))], vec![throw(str_("replacement"))])]);
    match result {
        Err(JSError::Throw { value }) => assert_eq!(value_to_string(&value), "replacement"),
        other => panic!("expected thrown value, got {other:?}"),
    }
}

#[test]
fn catch_supports_object_destructuring() {
    // catch ({ code, message })
    let thrown = object(vec![prop("code", num(404.0)), prop("message", str_("Not Found"))]);
    let (_realm, out) = run_with_out(&[try_catch(
        vec![throw(thrown)],
        Some(Pattern::Object {
            properties: vec![
                jsexec::ObjectPatternProp { key: "code".to_string(), value: None },
                jsexec::ObjectPatternProp { key: "message".to_string(), value: None },
            ],
        }),
        vec![push_out(ident("code")), push_out(ident("message"))],
    )]);
    assert_eq!(out_json(&out), serde_json::json!([404, "Not Found"]));
}

#[test]
fn catch_supports_array_destructuring() {
    let (_realm, out) = run_with_out(&[try_catch(
        vec![throw(array(vec![num(1.0), num(2.0), num(3.0)]))],
        Some(Pattern::Array {
            elements: vec![Some(pat("a")), Some(pat("b")), Some(pat("c"))],
        }),
        vec![push_out(ident("a")), push_out(ident("b")), push_out(ident("c"))],
    )]);
    assert_eq!(out_json(&out), serde_json::json!([1, 2, 3]));
}

#[test]
fn rethrow_from_catch_reaches_outer_catch() {
    let program = vec![
        let_("r", num(0.0)),
        try_catch(
            vec![try_catch(
                vec![throw(num(1.0))],
                Some(pat("e")),
                vec![throw(add(ident("e"), num(1.0)))],
            )],
            Some(pat("e2")),
            vec![expr_stmt(assign(ident("r"), ident("e2")))],
        ),
        expr_stmt(ident("r")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn protocol_errors_are_catchable_with_error_objects() {
    // iterating a number raises a TypeError-class interpreted exception
    let (_realm, out) = run_with_out(&[try_catch(
        vec![for_of(VarKind::Const, "x", num(42.0), block(vec![]))],
        Some(pat("e")),
        vec![push_out(member(ident("e"), "name"))],
    )]);
    assert_eq!(out_json(&out), serde_json::json!(["TypeError"]));
}

#[test]
fn reference_errors_are_catchable() {
    let (_realm, out) = run_with_out(&[try_catch(
        vec![expr_stmt(ident("no_such_name"))],
        Some(pat("e")),
        vec![push_out(member(ident("e"), "name"))],
    )]);
    assert_eq!(out_json(&out), serde_json::json!(["ReferenceError"]));
}

#[test]
fn uncaught_throw_surfaces_to_the_host() {
    let result = run_value(&[throw(str_("unhandled"))]);
    match result {
        Err(JSError::Throw { value }) => assert_eq!(value_to_string(&value), "unhandled"),
        other => panic!("expected thrown value, got {other:?}"),
    }
}

#[test]
fn labeled_try_with_continue_inside_loop() {
    let (_realm, out) = run_with_out(&[
        let_("i", num(0.0)),
        while_(
            lt(ident("i"), num(5.0)),
            block(vec![
                expr_stmt(inc(ident("i"))),
                labeled(
                    "label",
                    try_catch(vec![if_(eq(ident("i"), num(2.0)), cont(None))], None, vec![]),
                ),
                push_out(ident("i")),
            ]),
        ),
    ]);
    assert_eq!(out_json(&out), serde_json::json!([1, 3, 4, 5]));
}
