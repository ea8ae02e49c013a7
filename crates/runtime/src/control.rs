//! Control-flow natives
//!
//! DO/EVAL, conditionals, the loop family with their named throws, CATCH
//! and THROW, HALT, the two varless natives (QUOTE, COMMENT), and the
//! BREAKPOINT entry.
//!
//! EVAL deserves a note: the function registered here is the marker the
//! core loop special-cases: when the evaluator sees a call to it, the
//! next DO/NEXT result is spliced back in as the current value instead of
//! this body running. The body below serves only indirect invocations
//! (APPLY and the like), where there is no source stream to retrigger.

use crate::eval::{Emit, Evaluator, Feed};
use crate::natives::{hard, param, param_any_type, param_of, refine};
use lith_core::{
    Error, ErrorKind, FuncBody, Kind, Symbol, Throw, Value,
};

pub(crate) fn install(ev: &mut Evaluator) {
    ev.register_native("do", vec![param_any_type("value")], 0, native_do);

    let eval = ev.register_native(
        "eval",
        vec![param_any_type("value"), refine("only")],
        0,
        native_eval,
    );
    if let FuncBody::Native(id) = eval.body {
        ev.eval_id = Some(id);
    }

    ev.register_native(
        "either",
        vec![
            param("condition"),
            param_any_type("true-branch"),
            param_any_type("false-branch"),
        ],
        0,
        native_either,
    );
    ev.register_native(
        "if",
        vec![param("condition"), param_any_type("then-branch")],
        0,
        native_if,
    );
    ev.register_native(
        "loop",
        vec![param_of("count", &[Kind::Integer]), param_of("body", &[Kind::Block])],
        0,
        native_loop,
    );
    ev.register_native(
        "break",
        vec![refine("return"), param_any_type("value")],
        0,
        native_break,
    );
    ev.register_native("continue", vec![], 0, native_continue);
    ev.register_native(
        "catch",
        vec![
            param_of("block", &[Kind::Block]),
            refine("name"),
            param_of("word", &[Kind::Word]),
        ],
        0,
        native_catch,
    );
    ev.register_native(
        "throw",
        vec![param("value"), refine("name"), param_of("word", &[Kind::Word])],
        0,
        native_throw,
    );
    ev.register_native("halt", vec![], 0, native_halt);

    let quote = ev.register_native("quote", vec![hard("value")], lith_core::VARLESS, native_quote);
    ev.register_varless(&quote, varless_quote);
    let comment = ev.register_native(
        "comment",
        vec![hard("value")],
        lith_core::VARLESS,
        native_comment,
    );
    ev.register_varless(&comment, varless_comment);

    ev.register_native("breakpoint", vec![], 0, native_breakpoint);
}

fn native_do(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    match &value {
        Value::Block(s) | Value::Group(s) => {
            let series = s.clone();
            ev.do_block(&series)
        }
        // The legacy re-evaluation of functions by DO is gone; EVAL is
        // the way to retrigger a function value.
        Value::Function(_) => Err(Error::misc("do does not run functions; use eval")),
        Value::Text(_) => Err(Error::misc("do of a string needs the loader, which the \
                                           evaluator core does not include")),
        other => Ok(Emit::Value(other.clone())),
    }
}

fn native_eval(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    ev.do_value(&value)
}

fn branch(ev: &mut Evaluator, v: &Value) -> Result<Emit, Error> {
    match v {
        Value::Block(s) => {
            let series = s.clone();
            ev.do_block(&series)
        }
        other => Ok(Emit::Value(other.clone())),
    }
}

fn native_either(ev: &mut Evaluator) -> Result<Emit, Error> {
    let cond = ev.arg(0);
    let picked = if cond.is_truthy() { ev.arg(1) } else { ev.arg(2) };
    branch(ev, &picked)
}

fn native_if(ev: &mut Evaluator) -> Result<Emit, Error> {
    let cond = ev.arg(0);
    if cond.is_truthy() {
        let then = ev.arg(1);
        branch(ev, &then)
    } else {
        Ok(Emit::Value(Value::None))
    }
}

fn native_loop(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Integer(count) = ev.arg(0) else {
        return Err(Error::misc("loop count must be an integer"));
    };
    let Value::Block(body) = ev.arg(1) else {
        return Err(Error::misc("loop body must be a block"));
    };
    let mut last = Value::None;
    let mut n = 0i64;
    while n < count {
        match ev.do_block(&body)? {
            Emit::Value(v) => last = v,
            Emit::Threw(t) => {
                if t.is_exit() {
                    return Ok(Emit::Threw(t));
                }
                if t.is_named(Symbol::intern("break")) {
                    return Ok(Emit::Value(t.payload));
                }
                if t.is_named(Symbol::intern("continue")) {
                    n += 1;
                    continue;
                }
                return Ok(Emit::Threw(t));
            }
        }
        n += 1;
    }
    Ok(Emit::Value(last))
}

fn native_break(ev: &mut Evaluator) -> Result<Emit, Error> {
    let payload = if ev.arg_is(0) { ev.arg(1) } else { Value::None };
    Ok(Emit::Threw(Throw::named(Symbol::intern("break"), payload)))
}

fn native_continue(_ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Threw(Throw::named(
        Symbol::intern("continue"),
        Value::Unset,
    )))
}

fn native_catch(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Block(body) = ev.arg(0) else {
        return Err(Error::misc("catch needs a block"));
    };
    let name = if ev.arg_is(1) {
        match ev.arg(2) {
            Value::Word(w) => Some(w.sym),
            _ => return Err(Error::misc("catch/name needs a word")),
        }
    } else {
        None
    };
    match ev.do_block(&body)? {
        Emit::Value(v) => Ok(Emit::Value(v)),
        Emit::Threw(t) => {
            // Exit-bearing throws are caught by identity at frames, never
            // here.
            if t.is_exit() {
                return Ok(Emit::Threw(t));
            }
            let caught = match name {
                Some(sym) => t.is_named(sym),
                None => matches!(t.name, Value::None),
            };
            if caught {
                Ok(Emit::Value(t.payload))
            } else {
                Ok(Emit::Threw(t))
            }
        }
    }
}

fn native_throw(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    if ev.arg_is(1) {
        match ev.arg(2) {
            Value::Word(w) => Ok(Emit::Threw(Throw::named(w.sym, value))),
            _ => Err(Error::misc("throw/name needs a word")),
        }
    } else {
        Ok(Emit::Threw(Throw::plain(value)))
    }
}

fn native_halt(_ev: &mut Evaluator) -> Result<Emit, Error> {
    Err(Error::halt())
}

fn native_quote(ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(ev.arg(0)))
}

/// Frameless QUOTE: the next source cell, literally.
fn varless_quote(_ev: &mut Evaluator, feed: &Feed) -> Result<Emit, Error> {
    let next = feed.borrow_mut().prefetch();
    match next {
        None => Err(ErrorKind::NoArg {
            func: Symbol::intern("quote"),
            param: Symbol::intern("value"),
        }
        .into()),
        Some(v) => {
            feed.borrow_mut().fetch_next();
            Ok(Emit::Value(v))
        }
    }
}

fn native_comment(_ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(Value::Unset))
}

/// Frameless COMMENT: consume the next cell, produce nothing.
fn varless_comment(_ev: &mut Evaluator, feed: &Feed) -> Result<Emit, Error> {
    let next = feed.borrow_mut().prefetch();
    match next {
        None => Err(ErrorKind::NoArg {
            func: Symbol::intern("comment"),
            param: Symbol::intern("value"),
        }
        .into()),
        Some(_) => {
            feed.borrow_mut().fetch_next();
            Ok(Emit::Value(Value::Unset))
        }
    }
}

fn native_breakpoint(ev: &mut Evaluator) -> Result<Emit, Error> {
    let resumed = ev.enter_breakpoint()?;
    Ok(Emit::Value(resumed))
}
