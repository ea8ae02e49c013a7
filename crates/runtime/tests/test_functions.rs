//! Function calls: user functions, refinements (in and out of order),
//! revocation, quoting classes, variadics, specialization, apply.

mod common;

use common::*;
use lith_core::{Context, ErrorKind, FuncBody, Function, Value};
use lith_runtime::{Emit, Evaluator, make_function};
use std::rc::Rc;

#[test]
fn test_user_function_with_one_arg() {
    let mut ev = Evaluator::new();
    let out = run(
        &mut ev,
        vec![
            sw("sq"),
            w("func"),
            blk(vec![w("n")]),
            blk(vec![w("n"), w("*"), w("n")]),
            w("sq"),
            int(6),
        ],
    )
    .unwrap();
    assert_eq!(out, int(36));
}

#[test]
fn test_refinement_changes_semantics() {
    // [append/only [a b] [c d]] keeps the block nested.
    let mut ev = Evaluator::new();
    let out = run(
        &mut ev,
        vec![
            path(vec![w("append"), w("only")]),
            blk(vec![w("a"), w("b")]),
            blk(vec![w("c"), w("d")]),
        ],
    )
    .unwrap();
    assert_eq!(
        out,
        blk(vec![w("a"), w("b"), blk(vec![w("c"), w("d")])])
    );

    // Without /only the block splices.
    let mut ev = Evaluator::new();
    let out = run(
        &mut ev,
        vec![
            w("append"),
            blk(vec![w("a"), w("b")]),
            blk(vec![w("c"), w("d")]),
        ],
    )
    .unwrap();
    assert_eq!(out, blk(vec![w("a"), w("b"), w("c"), w("d")]));
}

#[test]
fn test_out_of_order_refinements_map_positionally() {
    // F [a /b c /d e], called F/d/b A B C: a=A, c=C (pickup), e=B.
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("f"),
            w("func"),
            blk(vec![w("a"), refn("b"), w("c"), refn("d"), w("e")]),
            blk(vec![
                w("reduce"),
                blk(vec![w("a"), w("b"), w("c"), w("d"), w("e")]),
            ]),
        ],
    )
    .unwrap();
    let out = run(
        &mut ev,
        vec![
            path(vec![w("f"), w("d"), w("b")]),
            int(1),
            int(2),
            int(3),
        ],
    )
    .unwrap();
    // b and d hold their refinement words; e took the second callsite
    // argument because /d was requested before /b.
    assert_eq!(out, blk(vec![int(1), w("b"), int(3), w("d"), int(2)]));
}

#[test]
fn test_unused_refinement_reads_none_and_unset_args() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("g"),
            w("func"),
            blk(vec![refn("only"), w("v")]),
            blk(vec![
                w("reduce"),
                blk(vec![w("only"), w("unset?"), gw("v")]),
            ]),
        ],
    )
    .unwrap();
    let out = run(&mut ev, vec![w("g")]).unwrap();
    assert_eq!(out, blk(vec![Value::None, Value::Logic(true)]));
}

#[test]
fn test_legacy_mode_fills_unused_refinement_args_with_none() {
    let mut ev = Evaluator::with_config(
        lith_runtime::EvalConfig::new().with_legacy_refinement_none(true),
    );
    run(
        &mut ev,
        vec![
            sw("g"),
            w("func"),
            blk(vec![refn("only"), w("v")]),
            blk(vec![w("none?"), gw("v")]),
        ],
    )
    .unwrap();
    let out = run(&mut ev, vec![w("g")]).unwrap();
    assert_eq!(out, Value::Logic(true));
}

#[test]
fn test_refinement_revocation_by_unset_first_arg() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("rv"),
            w("func"),
            blk(vec![w("a"), refn("b"), w("c")]),
            blk(vec![
                w("reduce"),
                blk(vec![w("a"), w("b"), w("unset?"), gw("c")]),
            ]),
        ],
    )
    .unwrap();

    // Unset first arg revokes /b.
    let out = run(
        &mut ev,
        vec![path(vec![w("rv"), w("b")]), int(1), grp(vec![])],
    )
    .unwrap();
    assert_eq!(out, blk(vec![int(1), Value::None, Value::Logic(true)]));

    // A set arg keeps it active.
    let out = run(
        &mut ev,
        vec![path(vec![w("rv"), w("b")]), int(1), int(2)],
    )
    .unwrap();
    assert_eq!(out, blk(vec![int(1), w("b"), Value::Logic(false)]));
}

#[test]
fn test_inconsistent_revocation_is_an_error() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("r2"),
            w("func"),
            blk(vec![refn("b"), w("c"), w("d")]),
            blk(vec![w("true")]),
        ],
    )
    .unwrap();
    let err = run(
        &mut ev,
        vec![path(vec![w("r2"), w("b")]), grp(vec![]), int(5)],
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BadRefineRevoke(_)));
}

#[test]
fn test_unknown_refinement() {
    let mut ev = Evaluator::new();
    let err = run(
        &mut ev,
        vec![path(vec![w("append"), w("fast")]), blk(vec![]), int(1)],
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BadRefine(_)));
}

#[test]
fn test_hard_quote_takes_source_literally() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("hq"),
            w("func"),
            blk(vec![gw("v")]),
            blk(vec![w("v")]),
        ],
    )
    .unwrap();
    let out = run(&mut ev, vec![w("hq"), grp(vec![int(1), w("+"), int(2)])]).unwrap();
    assert_eq!(out, grp(vec![int(1), w("+"), int(2)]));
}

#[test]
fn test_soft_quote_honors_escapes() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("sq2"),
            w("func"),
            blk(vec![lw("v")]),
            blk(vec![w("v")]),
            sw("x"),
            int(9),
        ],
    )
    .unwrap();
    // A plain word is taken literally...
    let out = run(&mut ev, vec![w("sq2"), w("foo")]).unwrap();
    assert_eq!(out, w("foo"));
    // ...but GROUP! and GET-WORD! escape into evaluation.
    let out = run(&mut ev, vec![w("sq2"), grp(vec![int(1), w("+"), int(2)])]).unwrap();
    assert_eq!(out, int(3));
    let out = run(&mut ev, vec![w("sq2"), gw("x")]).unwrap();
    assert_eq!(out, int(9));
}

#[test]
fn test_typeset_restriction_rejects_wrong_kind() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("tf"),
            w("func"),
            blk(vec![w("n"), blk(vec![w("integer!")])]),
            blk(vec![w("n")]),
        ],
    )
    .unwrap();
    let err = run(&mut ev, vec![w("tf"), Value::text("nope")]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExpectArg { .. }));
}

#[test]
fn test_missing_argument_at_end_of_stream() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![w("add"), int(1)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoArg { .. }));
}

#[test]
fn test_pure_locals_stay_in_the_frame() {
    let mut ev = Evaluator::new();
    let out = run(
        &mut ev,
        vec![
            sw("lf"),
            w("func"),
            blk(vec![w("a"), refn("local"), w("t")]),
            blk(vec![sw("t"), w("a"), w("*"), int(2), w("t")]),
            w("lf"),
            int(5),
        ],
    )
    .unwrap();
    assert_eq!(out, int(10));
    // The lib slot "t" (created by test binding) was never written.
    assert_eq!(ev.lib_get("t"), Some(Value::Unset));
}

#[test]
fn test_variadic_parameter_pulls_from_callsite() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("vf"),
            w("func"),
            blk(vec![w("a"), w("rest"), blk(vec![w("variadic")])]),
            blk(vec![
                w("reduce"),
                blk(vec![
                    w("a"),
                    w("take"),
                    w("rest"),
                    w("take"),
                    w("rest"),
                    w("take"),
                    w("rest"),
                ]),
            ]),
        ],
    )
    .unwrap();
    let out = run(&mut ev, vec![w("vf"), int(1), int(2), int(3)]).unwrap();
    // Two pulls drain the callsite; the third answers NONE.
    assert_eq!(out, blk(vec![int(1), int(2), int(3), Value::None]));
}

#[test]
fn test_variadic_pull_evaluates_expressions() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("v1"),
            w("func"),
            blk(vec![w("rest"), blk(vec![w("variadic")])]),
            blk(vec![w("take"), w("rest")]),
        ],
    )
    .unwrap();
    let out = run(&mut ev, vec![w("v1"), int(2), w("*"), int(21)]).unwrap();
    assert_eq!(out, int(42));
}

#[test]
fn test_apply_only_passes_literals() {
    let mut ev = Evaluator::new();
    let Some(Value::Function(add)) = ev.lib_get("add") else {
        panic!("add missing");
    };
    match ev.apply_only(Value::Function(add), &[int(1), int(2)]).unwrap() {
        Emit::Value(v) => assert_eq!(v, int(3)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_apply_only_rejects_surplus() {
    let mut ev = Evaluator::new();
    let Some(Value::Function(add)) = ev.lib_get("add") else {
        panic!("add missing");
    };
    let err = ev
        .apply_only(Value::Function(add), &[int(1), int(2), int(3)])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ApplyTooMany));
}

#[test]
fn test_specialize_prefills_refinement() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("ao"),
            w("specialize"),
            gw("append"),
            blk(vec![sw("only"), w("true")]),
        ],
    )
    .unwrap();
    let out = run(
        &mut ev,
        vec![w("ao"), blk(vec![w("a")]), blk(vec![w("b")])],
    )
    .unwrap();
    assert_eq!(out, blk(vec![w("a"), blk(vec![w("b")])]));
}

#[test]
fn test_specialize_of_specialization_flattens() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("a1"),
            w("specialize"),
            gw("append"),
            blk(vec![sw("only"), w("true")]),
            sw("a2"),
            w("specialize"),
            gw("a1"),
            blk(vec![sw("value"), blk(vec![int(9)])]),
        ],
    )
    .unwrap();
    let Some(Value::Function(a2)) = ev.lib_get("a2") else {
        panic!("a2 missing");
    };
    let FuncBody::Specialized { base, .. } = &a2.body else {
        panic!("a2 is not specialized");
    };
    assert!(!matches!(base.body, FuncBody::Specialized { .. }));
    // Both layers apply: /only on, value pre-filled.
    let out = run(&mut ev, vec![w("a2"), blk(vec![w("x")])]).unwrap();
    assert_eq!(out, blk(vec![w("x"), blk(vec![int(9)])]));
}

#[test]
fn test_specialized_refinement_slot_must_not_be_unset() {
    let mut ev = Evaluator::new();
    let Some(Value::Function(append)) = ev.lib_get("append") else {
        panic!("append missing");
    };
    let frame = Context::frame(
        append.clone(),
        vec![Value::Bar, Value::Bar, Value::Unset],
    );
    let spec = Function::new(
        append.name,
        append.params.clone(),
        append.flags,
        FuncBody::Specialized {
            base: append,
            frame,
        },
    );
    let err = ev
        .apply_only(Value::Function(spec), &[blk(vec![]), int(1)])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoRefine { .. }));
}

#[test]
fn test_specializing_a_pure_local_is_rejected() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("pl"),
            w("func"),
            blk(vec![w("a"), refn("local"), w("t")]),
            blk(vec![w("a")]),
        ],
    )
    .unwrap();
    let Some(Value::Function(pl)) = ev.lib_get("pl") else {
        panic!("pl missing");
    };
    // Slots: a, t (local), return (hidden local).
    let frame = Context::frame(
        pl.clone(),
        vec![Value::Bar, int(5), Value::Bar],
    );
    let spec = Function::new(
        pl.name,
        pl.params.clone(),
        pl.flags,
        FuncBody::Specialized { base: pl, frame },
    );
    let err = ev.apply_only(Value::Function(spec), &[int(1)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LocalInjection { .. }));
}

#[test]
fn test_user_infix_function_binds_left_argument() {
    let mut ev = Evaluator::new();
    let spec = blk(vec![w("a"), w("b")]);
    let body = blk(vec![w("a"), w("+"), w("b"), w("+"), int(100)]);
    let (Value::Block(spec), Value::Block(body)) = (spec, body) else {
        unreachable!();
    };
    // The body references lib's +, so bind it before construction.
    let lib = ev.lib.clone();
    lith_runtime::bind::bind_block(&body.array, &lib, false);
    let func = make_function(
        &spec,
        &body,
        false,
        lith_core::INFIX | lith_core::HAS_RETURN,
    )
    .unwrap();
    ev.lib_set("plus100", Value::Function(func));

    let out = run(&mut ev, vec![int(1), w("plus100"), int(2)]).unwrap();
    assert_eq!(out, int(103));
}

#[test]
fn test_call_frames_balance_through_nested_calls() {
    let mut ev = Evaluator::new();
    run(
        &mut ev,
        vec![
            sw("inner"),
            w("func"),
            blk(vec![w("n")]),
            blk(vec![w("n"), w("+"), int(1)]),
            sw("outer"),
            w("func"),
            blk(vec![w("n")]),
            blk(vec![w("inner"), w("inner"), w("n")]),
            w("outer"),
            int(40),
        ],
    )
    .unwrap();
    assert_eq!(ev.frame_depth(), 0);
    assert_eq!(ev.live_chunks(), 0);
    assert_eq!(ev.data_stack_depth(), 0);
}
