//! Shared builders for the evaluator tests: no lexer exists in the core,
//! so source blocks are assembled by hand and bound into the evaluator's
//! lib context before running.

// Each test binary compiles this module; not all of them use every helper.
#![allow(dead_code)]

use lith_core::{Array, Error, Series, Symbol, Value, Word};
use lith_runtime::{DoFlags, DoResult, Evaluator, bind};
use std::rc::Rc;

pub fn int(n: i64) -> Value {
    Value::Integer(n)
}

pub fn w(name: &str) -> Value {
    Value::word(name)
}

pub fn sw(name: &str) -> Value {
    Value::SetWord(Word::unbound(Symbol::intern(name)))
}

pub fn gw(name: &str) -> Value {
    Value::GetWord(Word::unbound(Symbol::intern(name)))
}

pub fn lw(name: &str) -> Value {
    Value::LitWord(Word::unbound(Symbol::intern(name)))
}

pub fn refn(name: &str) -> Value {
    Value::Refinement(Word::unbound(Symbol::intern(name)))
}

pub fn blk(cells: Vec<Value>) -> Value {
    Value::block(cells)
}

pub fn grp(cells: Vec<Value>) -> Value {
    Value::group(cells)
}

pub fn path(parts: Vec<Value>) -> Value {
    Value::Path(Series::new(Array::rc(parts), 0))
}

pub fn setpath(parts: Vec<Value>) -> Value {
    Value::SetPath(Series::new(Array::rc(parts), 0))
}

pub fn getpath(parts: Vec<Value>) -> Value {
    Value::GetPath(Series::new(Array::rc(parts), 0))
}

/// Bind `cells` into lib (adding missing words) and evaluate to the end.
/// Panics on a throw reaching top level; use `run_catch` for those.
pub fn run(ev: &mut Evaluator, cells: Vec<Value>) -> Result<Value, Error> {
    match run_result(ev, cells)? {
        DoResult::Done(v) => Ok(v),
        DoResult::Threw(t) => panic!("uncaught throw surfaced: {:?}", t),
        DoResult::Next { .. } => unreachable!("to-end evaluation answered Next"),
    }
}

/// As `run`, but hand back the raw result so tests can inspect throws.
pub fn run_result(ev: &mut Evaluator, cells: Vec<Value>) -> Result<DoResult, Error> {
    let array = Array::rc(cells);
    let lib = ev.lib.clone();
    bind::bind_block(&array, &lib, true);
    ev.do_array(array, 0, DoFlags::TO_END)
}

/// Bound array for tests that drive `do_array` themselves.
pub fn bound_block(ev: &Evaluator, cells: Vec<Value>) -> Rc<Array> {
    let array = Array::rc(cells);
    let lib = ev.lib.clone();
    bind::bind_block(&array, &lib, true);
    array
}
