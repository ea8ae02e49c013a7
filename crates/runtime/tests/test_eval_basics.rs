//! Core evaluation: literals, words, infix lookahead, groups, set-words,
//! balance invariants, and source-mutation tolerance.

mod common;

use common::*;
use lith_core::{Array, ErrorKind, Value};
use lith_runtime::{DoFlags, DoResult, Emit, Evaluator, VaResult};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_left_to_right_no_precedence() {
    // [1 + 2 * 3] is ((1 + 2) * 3).
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![int(1), w("+"), int(2), w("*"), int(3)]).unwrap();
    assert_eq!(out, int(9));
}

#[test]
fn test_set_word_assigns_and_yields() {
    // [x: 10 x + 5] is 15, with x left bound to 10.
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![sw("x"), int(10), w("x"), w("+"), int(5)]).unwrap();
    assert_eq!(out, int(15));
    assert_eq!(ev.lib_get("x"), Some(int(10)));
}

#[test]
fn test_set_word_right_side_sees_infix() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![sw("y"), int(1), w("+"), int(2), w("y")]).unwrap();
    assert_eq!(out, int(3));
}

#[test]
fn test_infix_needs_left_hand() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![w("+"), int(1), int(2)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoOpArg(_)));
}

#[test]
fn test_infix_typechecks_left_argument() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![Value::text("a"), w("+"), int(1)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExpectArg { .. }));
}

#[test]
fn test_prefix_natives_take_evaluated_args() {
    // [add 1 multiply 2 3] is 7: argument gathering recurses.
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![w("add"), int(1), w("multiply"), int(2), int(3)]).unwrap();
    assert_eq!(out, int(7));
}

#[test]
fn test_argument_gathering_honors_infix() {
    // [add 1 + 1 3] is 5: the first argument is (1 + 1).
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![w("add"), int(1), w("+"), int(1), int(3)]).unwrap();
    assert_eq!(out, int(5));
}

#[test]
fn test_group_evaluates_to_last_value() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![grp(vec![int(1), int(2), w("+"), int(3)])]).unwrap();
    assert_eq!(out, int(5));
}

#[test]
fn test_empty_group_is_unset() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![w("unset?"), grp(vec![])]).unwrap();
    assert_eq!(out, Value::Logic(true));
}

#[test]
fn test_lit_word_and_lit_path_produce_quoted_forms() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![lw("foo")]).unwrap();
    assert_eq!(out, w("foo"));

    let out = run(&mut ev, vec![Value::LitPath(series_of(vec![w("a"), w("b")]))]).unwrap();
    assert_eq!(out.kind(), lith_core::Kind::Path);
}

fn series_of(cells: Vec<Value>) -> lith_core::Series {
    lith_core::Series::new(Array::rc(cells), 0)
}

#[test]
fn test_get_word_allows_unset() {
    let mut ev = Evaluator::new();
    // u is added by binding but never set.
    let out = run(&mut ev, vec![w("unset?"), gw("u")]).unwrap();
    assert_eq!(out, Value::Logic(true));
}

#[test]
fn test_word_with_no_value_errors() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![w("undefined-thing")]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoValue(_)));
}

#[test]
fn test_set_word_rejects_unset() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![sw("x"), grp(vec![])]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NeedValue(_)));
}

#[test]
fn test_bar_is_an_argument_barrier() {
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![w("add"), int(1), Value::Bar, int(2)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExpressionBarrier));
}

#[test]
fn test_bar_between_expressions_is_fine() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![int(1), Value::Bar, int(2)]).unwrap();
    assert_eq!(out, int(2));
}

#[test]
fn test_balance_after_success() {
    let mut ev = Evaluator::new();
    run(&mut ev, vec![w("add"), int(1), w("multiply"), int(2), int(3)]).unwrap();
    assert_eq!(ev.data_stack_depth(), 0);
    assert_eq!(ev.frame_depth(), 0);
    assert_eq!(ev.live_chunks(), 0);
}

#[test]
fn test_balance_after_error() {
    let mut ev = Evaluator::new();
    let _ = run(&mut ev, vec![w("append"), path(vec![w("x"), w("y")]), int(1)]);
    assert_eq!(ev.data_stack_depth(), 0);
    assert_eq!(ev.frame_depth(), 0);
    assert_eq!(ev.live_chunks(), 0);
}

#[test]
fn test_recursion_guard_trips() {
    let mut ev = Evaluator::with_config(lith_runtime::EvalConfig::new().with_recursion_limit(48));
    let err = run(
        &mut ev,
        vec![sw("f"), w("func"), blk(vec![]), blk(vec![w("f")]), w("f")],
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow));
    assert_eq!(ev.frame_depth(), 0);
    assert_eq!(ev.live_chunks(), 0);
}

#[test]
fn test_source_truncation_reads_as_end() {
    // A host command chops the running array out from under the
    // evaluator; the next fetch is end-of-stream, not a crash.
    let mut ev = Evaluator::new();
    let array = Array::rc(vec![w("chop!"), int(1), int(2), int(3)]);
    let victim = array.clone();
    let called = Rc::new(Cell::new(false));
    let flag = called.clone();
    ev.register_command(
        "chop!",
        vec![],
        Rc::new(move |_ev| {
            victim.truncate(1);
            flag.set(true);
            Ok(Emit::Value(Value::Unset))
        }),
    );
    let lib = ev.lib.clone();
    lith_runtime::bind::bind_block(&array, &lib, true);
    let out = ev.do_array(array, 0, DoFlags::TO_END).unwrap();
    assert_eq!(out, DoResult::Done(Value::Unset));
    assert!(called.get());
}

#[test]
fn test_do_variadic_incomplete_flag() {
    let mut ev = Evaluator::new();
    match ev.do_variadic(vec![int(1), int(2)], DoFlags::NEXT).unwrap() {
        VaResult::Next(v) => assert_eq!(v, int(1)),
        other => panic!("expected Next, got {:?}", other),
    }
    match ev.do_variadic(vec![int(9)], DoFlags::NEXT).unwrap() {
        VaResult::Done(v) => assert_eq!(v, int(9)),
        other => panic!("expected Done, got {:?}", other),
    }
}

#[test]
fn test_variadic_error_reifies_for_near_text() {
    let mut ev = Evaluator::new();
    let err = ev
        .do_variadic(vec![w("no-such-word"), int(1)], DoFlags::TO_END)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotBound(_)));
    let near = err.near.expect("near text");
    assert!(near.contains("no-such-word"), "near was {:?}", near);
}

#[test]
fn test_eval_retriggers_value() {
    // [eval quote (1 + 2)] re-dispatches the group: 3.
    let mut ev = Evaluator::new();
    let out = run(
        &mut ev,
        vec![w("eval"), w("quote"), grp(vec![int(1), w("+"), int(2)])],
    )
    .unwrap();
    assert_eq!(out, int(3));
}

#[test]
fn test_eval_only_suppresses_argument_evaluation() {
    let mut ev = Evaluator::new();
    // f returns its single argument.
    let setup = vec![
        sw("f"),
        w("func"),
        blk(vec![w("v")]),
        blk(vec![w("v")]),
        sw("y"),
        int(5),
    ];
    run(&mut ev, setup).unwrap();

    let out = run(&mut ev, vec![w("eval"), gw("f"), w("y")]).unwrap();
    assert_eq!(out, int(5));

    let out = run(
        &mut ev,
        vec![path(vec![w("eval"), w("only")]), gw("f"), w("y")],
    )
    .unwrap();
    assert_eq!(out, w("y"));
}

#[test]
fn test_do_of_block_and_scalars() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![w("do"), blk(vec![int(1), w("+"), int(2)])]).unwrap();
    assert_eq!(out, int(3));
    let out = run(&mut ev, vec![w("do"), int(42)]).unwrap();
    assert_eq!(out, int(42));
}

#[test]
fn test_do_of_function_is_rejected() {
    // The legacy DO-reevaluates-functions behavior is gone; EVAL does it.
    let mut ev = Evaluator::new();
    let err = run(&mut ev, vec![w("do"), gw("add")]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Misc(_)));
}

#[test]
fn test_frame_literal_executes_with_prefilled_args() {
    let mut ev = Evaluator::new();
    let Some(Value::Function(add)) = ev.lib_get("add") else {
        panic!("add missing");
    };
    let frame = lith_core::Context::frame(add, vec![int(30), int(12)]);
    match ev
        .do_variadic(vec![Value::Frame(frame)], DoFlags::TO_END)
        .unwrap()
    {
        VaResult::Done(v) => assert_eq!(v, int(42)),
        other => panic!("expected Done, got {:?}", other),
    }
}

#[test]
fn test_varless_quote_pulls_from_source() {
    let mut ev = Evaluator::new();
    let out = run(&mut ev, vec![w("quote"), w("anything")]).unwrap();
    assert_eq!(out, w("anything"));
    // Comment consumes and vanishes; the block's value is what follows.
    let out = run(&mut ev, vec![w("comment"), blk(vec![int(1)]), int(7)]).unwrap();
    assert_eq!(out, int(7));
}

#[test]
fn test_registered_routine_is_callable() {
    let mut ev = Evaluator::new();
    ev.register_routine(
        "host-answer",
        vec![],
        Rc::new(|_ev| Ok(Emit::Value(int(42)))),
    );
    let out = run(&mut ev, vec![w("host-answer")]).unwrap();
    assert_eq!(out, int(42));
}
