//! Cooperative signals: halt, interrupt/breakpoint, and recycle. These
//! touch the process-wide signal mask, so they run serialized.

mod common;

use common::*;
use lith_core::Value;
use lith_runtime::{
    EvalConfig, Evaluator, SIG_HALT, SIG_INTERRUPT, SIG_RECYCLE, clear_signal, set_signal,
};
use serial_test::serial;
use std::cell::Cell;
use std::rc::Rc;

fn eager_ev() -> Evaluator {
    // Poll every expression so one pending signal is seen immediately.
    Evaluator::with_config(EvalConfig::new().with_poll_period(0))
}

#[test]
#[serial]
fn test_halt_unwinds_to_the_entry() {
    clear_signal(u32::MAX);
    let mut ev = eager_ev();
    set_signal(SIG_HALT);
    let err = run(&mut ev, vec![int(1), int(2), int(3)]).unwrap_err();
    assert!(err.is_halt());
    assert_eq!(ev.frame_depth(), 0);
    assert_eq!(ev.live_chunks(), 0);
    clear_signal(u32::MAX);
}

#[test]
#[serial]
fn test_interrupt_enters_breakpoint_and_resumes() {
    clear_signal(u32::MAX);
    let mut ev = eager_ev();
    let hits = Rc::new(Cell::new(0u32));
    let counter = hits.clone();
    ev.set_breakpoint_hook(Box::new(move |_ev| {
        counter.set(counter.get() + 1);
        Ok(Value::Unset)
    }));
    set_signal(SIG_INTERRUPT);
    let out = run(&mut ev, vec![int(1), int(2)]).unwrap();
    assert_eq!(out, int(2));
    assert_eq!(hits.get(), 1);
    clear_signal(u32::MAX);
}

#[test]
#[serial]
fn test_breakpoint_must_resume_with_unset() {
    clear_signal(u32::MAX);
    let mut ev = eager_ev();
    ev.set_breakpoint_hook(Box::new(|_ev| Ok(int(99))));
    set_signal(SIG_INTERRUPT);
    let err = run(&mut ev, vec![int(1)]).unwrap_err();
    assert!(matches!(
        err.kind,
        lith_core::ErrorKind::BadSysFunc(_)
    ));
    clear_signal(u32::MAX);
}

#[test]
#[serial]
fn test_recycle_runs_collector_once_between_expressions() {
    clear_signal(u32::MAX);
    let mut ev = eager_ev();
    let cycles = Rc::new(Cell::new(0u32));
    let counter = cycles.clone();
    ev.set_collector(Box::new(move |roots| {
        counter.set(counter.get() + 1);
        // The hook only ever runs at expression boundaries: never while
        // a frame is mid-gathering.
        assert!(roots.frames.iter().all(|f| {
            !matches!(f.mode, lith_runtime::FrameMode::Gathering)
        }));
    }));
    set_signal(SIG_RECYCLE);
    run(&mut ev, vec![w("add"), int(1), int(2), int(3), int(4)]).unwrap();
    // One request, one cycle, even though many expressions polled.
    assert_eq!(cycles.get(), 1);
    clear_signal(u32::MAX);
}

#[test]
#[serial]
fn test_signals_wait_for_the_poll_boundary() {
    clear_signal(u32::MAX);
    // A long poll period: the request stays pending over a short run.
    let mut ev = Evaluator::with_config(EvalConfig::new().with_poll_period(1000));
    set_signal(SIG_HALT);
    let out = run(&mut ev, vec![int(7)]);
    // The very first poll (countdown started full) never fired.
    assert_eq!(out.unwrap(), int(7));
    assert_ne!(lith_runtime::pending_signals() & SIG_HALT, 0);
    clear_signal(u32::MAX);
}

#[test]
#[serial]
fn test_breakpoint_hook_can_reenter_the_evaluator() {
    clear_signal(u32::MAX);
    let mut ev = eager_ev();
    ev.set_breakpoint_hook(Box::new(|ev| {
        // A nested session: evaluate something, then resume with unset.
        let nested = ev.do_variadic(vec![int(42)], lith_runtime::DoFlags::TO_END)?;
        match nested {
            lith_runtime::VaResult::Done(v) => assert_eq!(v, int(42)),
            other => panic!("nested evaluation failed: {:?}", other),
        }
        Ok(Value::Unset)
    }));
    set_signal(SIG_INTERRUPT);
    let out = run(&mut ev, vec![int(5)]).unwrap();
    assert_eq!(out, int(5));
    clear_signal(u32::MAX);
}
