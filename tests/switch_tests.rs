mod common;

use common::*;
use jsexec::{JSError, VarKind};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn fall_through_runs_following_cases_until_break() {
    // switch(1){case 1: r++; case 2: r++; case 3: r++; break; default: r=0}
    let program = vec![
        let_("r", num(0.0)),
        switch(
            num(1.0),
            vec![
                case(num(1.0), vec![expr_stmt(inc(ident("r")))]),
                case(num(2.0), vec![expr_stmt(inc(ident("r")))]),
                case(num(3.0), vec![expr_stmt(inc(ident("r"))), brk(None)]),
                default_case(vec![expr_stmt(assign(ident("r"), num(0.0)))]),
            ],
        ),
        expr_stmt(ident("r")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 3.0);
}

#[test]
fn matching_is_strict_equality() {
    let program = vec![
        let_("r", num(0.0)),
        switch(
            str_("1"),
            vec![
                case(num(1.0), vec![expr_stmt(assign(ident("r"), num(1.0))), brk(None)]),
                case(str_("1"), vec![expr_stmt(assign(ident("r"), num(2.0))), brk(None)]),
            ],
        ),
        expr_stmt(ident("r")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn default_is_selected_only_after_all_tests_fail() {
    // default sits in the middle; it is selected when nothing matches,
    // and falls through into the cases after it in source order
    let (_realm, out) = run_with_out(&[switch(
        num(5.0),
        vec![
            case(num(1.0), vec![push_out(str_("one"))]),
            default_case(vec![push_out(str_("default"))]),
            case(num(2.0), vec![push_out(str_("two")), brk(None)]),
            case(num(3.0), vec![push_out(str_("three"))]),
        ],
    )]);
    assert_eq!(out_json(&out), serde_json::json!(["default", "two"]));
}

#[test]
fn default_in_middle_is_skipped_when_a_case_matches() {
    let (_realm, out) = run_with_out(&[switch(
        num(2.0),
        vec![
            case(num(1.0), vec![push_out(str_("one"))]),
            default_case(vec![push_out(str_("default"))]),
            case(num(2.0), vec![push_out(str_("two")), brk(None)]),
        ],
    )]);
    assert_eq!(out_json(&out), serde_json::json!(["two"]));
}

#[test]
fn no_match_and_no_default_does_nothing() {
    let (_realm, out) = run_with_out(&[switch(
        num(9.0),
        vec![
            case(num(1.0), vec![push_out(str_("one"))]),
            case(num(2.0), vec![push_out(str_("two"))]),
        ],
    )]);
    assert_eq!(out_json(&out), serde_json::json!([]));
}

#[test]
fn break_in_switch_does_not_break_enclosing_loop() {
    let program = vec![
        let_("a", num(0.0)),
        while_(
            lt(ident("a"), num(10.0)),
            block(vec![
                expr_stmt(inc(ident("a"))),
                switch(num(2.0), vec![case(num(2.0), vec![brk(None)])]),
            ]),
        ),
        expr_stmt(ident("a")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 10.0);
}

#[test]
fn bare_continue_in_switch_continues_the_enclosing_while() {
    // i counts 1..5; case 2 continues the while, case 3 records
    let (_realm, out) = run_with_out(&[
        let_("i", num(0.0)),
        while_(
            lt(ident("i"), num(5.0)),
            block(vec![
                expr_stmt(inc(ident("i"))),
                switch(
                    ident("i"),
                    vec![
                        case(num(2.0), vec![cont(None)]),
                        case(num(3.0), vec![push_out(ident("i"))]),
                    ],
                ),
            ]),
        ),
    ]);
    assert_eq!(out_json(&out), serde_json::json!([3]));
}

#[test]
fn return_propagates_through_switch() {
    let program = vec![
        fn_decl(
            "test",
            vec![],
            vec![switch(
                num(1.0),
                vec![
                    case(num(1.0), vec![ret(Some(num(42.0)))]),
                    default_case(vec![ret(Some(num(0.0)))]),
                ],
            )],
        ),
        expr_stmt(call(ident("test"), vec![])),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 42.0);
}

#[test]
fn labeled_break_escapes_nested_switches() {
    let program = vec![
        let_("x", num(0.0)),
        labeled(
            "outer",
            switch(
                num(1.0),
                vec![case(
                    num(1.0),
                    vec![
                        expr_stmt(inc(ident("x"))),
                        switch(
                            num(2.0),
                            vec![case(num(2.0), vec![expr_stmt(inc(ident("x"))), brk(Some("outer"))])],
                        ),
                        expr_stmt(inc(ident("x"))),
                    ],
                )],
            ),
        ),
        expr_stmt(ident("x")),
    ];
    assert_eq!(as_number(&run_value(&program).unwrap()), 2.0);
}

#[test]
fn throw_in_case_propagates() {
    let result = run_value(&[switch(
        num(1.0),
        vec![case(num(1.0), vec![throw(str_("boom"))])],
    )]);
    match result {
        Err(JSError::Throw { value }) => assert_eq!(jsexec::value_to_string(&value), "boom"),
        other => panic!("expected thrown value, got {other:?}"),
    }
}

#[test]
fn case_declarations_share_the_switch_scope() {
    let (_realm, out) = run_with_out(&[switch(
        num(1.0),
        vec![
            case(num(1.0), vec![let_("shared", num(7.0))]),
            case(num(2.0), vec![push_out(ident("shared")), brk(None)]),
        ],
    )]);
    assert_eq!(out_json(&out), serde_json::json!([7]));
}

#[test]
fn for_of_over_switch_selected_values() {
    // fall-through interacts with an enclosing for-of's continue
    let (_realm, out) = run_with_out(&[for_of(
        VarKind::Const,
        "v",
        array(vec![num(1.0), num(2.0), num(3.0)]),
        block(vec![
            switch(
                ident("v"),
                vec![case(num(2.0), vec![cont(None)])],
            ),
            push_out(ident("v")),
        ]),
    )]);
    assert_eq!(out_json(&out), serde_json::json!([1, 3]));
}
