//! Variable resolution and binding
//!
//! Two binding shapes reach storage:
//! - Context bindings index straight into a materialized context.
//! - Relative bindings name a parameter of a function; they resolve by
//!   walking the frame stack for the most recent *running* invocation of
//!   that function (a frame still gathering arguments is not visible).
//!
//! The bind utilities walk arrays and rewrite word bindings in place.
//! Binding is maintenance, not mutation of content, so it is allowed on
//! locked arrays.

use crate::eval::Evaluator;
use crate::frame::FrameMode;
use lith_core::{
    Array, Binding, Context, Error, ErrorKind, ParamList, Series, Value, Word,
};
use std::rc::Rc;

impl Evaluator {
    /// Resolve a word to its stored value. No unset check: callers decide
    /// whether unset is an error (word evaluation) or fine (get-word).
    pub fn get_var(&self, word: &Word) -> Result<Value, Error> {
        match &word.binding {
            Binding::Unbound => Err(ErrorKind::NotBound(word.sym).into()),
            Binding::Context { ctx, index } => ctx
                .get(*index)
                .ok_or_else(|| Error::misc(format!("{} binding is out of range", word.sym))),
            Binding::Relative { params, index } => {
                for frame in self.frames.iter().rev() {
                    if frame.mode == FrameMode::Running
                        && Rc::ptr_eq(&frame.func.params, params)
                    {
                        return frame.args.get(*index).ok_or_else(|| {
                            Error::misc(format!("{} binding is out of range", word.sym))
                        });
                    }
                }
                Err(Error::misc(format!(
                    "{} is bound to a function not currently running",
                    word.sym
                )))
            }
        }
    }

    /// Write through a word's binding.
    pub fn set_var(&mut self, word: &Word, value: Value) -> Result<(), Error> {
        match &word.binding {
            Binding::Unbound => Err(ErrorKind::NotBound(word.sym).into()),
            Binding::Context { ctx, index } => ctx.set(*index, value),
            Binding::Relative { params, index } => {
                let found = self.frames.iter().rposition(|frame| {
                    frame.mode == FrameMode::Running && Rc::ptr_eq(&frame.func.params, params)
                });
                match found {
                    Some(fidx) => self.frames[fidx].args.set(*index, value),
                    None => Err(Error::misc(format!(
                        "{} is bound to a function not currently running",
                        word.sym
                    ))),
                }
            }
        }
    }
}

fn rebound_into(value: &Value, ctx: &Rc<Context>, add_missing: bool) -> Option<Value> {
    let rebind = |w: &Word| -> Option<Word> {
        let index = if add_missing {
            ctx.find_or_append(w.sym)
        } else {
            ctx.find(w.sym)?
        };
        Some(Word::bound(w.sym, ctx.clone(), index))
    };
    match value {
        Value::Word(w) => rebind(w).map(Value::Word),
        Value::SetWord(w) => rebind(w).map(Value::SetWord),
        Value::GetWord(w) => rebind(w).map(Value::GetWord),
        Value::LitWord(w) => rebind(w).map(Value::LitWord),
        Value::Refinement(w) => rebind(w).map(Value::Refinement),
        _ => None,
    }
}

/// Bind every word in `array` (deeply, through nested blocks, groups, and
/// paths) into `ctx`. With `add_missing`, unknown words get fresh slots;
/// without it they are left as they were.
pub fn bind_block(array: &Rc<Array>, ctx: &Rc<Context>, add_missing: bool) {
    for i in 0..array.len() {
        let Some(cell) = array.get(i) else { break };
        if let Some(rebound) = rebound_into(&cell, ctx, add_missing) {
            array.update_binding(i, rebound);
        } else if let Some(series) = cell.as_series() {
            bind_block(&series.array, ctx, add_missing);
        }
    }
}

fn relative_word(value: &Value, params: &Rc<ParamList>) -> Option<Value> {
    let rebind = |w: &Word| -> Option<Word> {
        let index = params.find(w.sym)?;
        Some(Word::relative(w.sym, params.clone(), index))
    };
    match value {
        Value::Word(w) => rebind(w).map(Value::Word),
        Value::SetWord(w) => rebind(w).map(Value::SetWord),
        Value::GetWord(w) => rebind(w).map(Value::GetWord),
        Value::LitWord(w) => rebind(w).map(Value::LitWord),
        _ => None,
    }
}

/// Bind a function body's parameter references relatively to `params`.
/// Runs once at function creation; the bindings resolve per-invocation
/// against the frame stack.
pub fn bind_body(body: &Rc<Array>, params: &Rc<ParamList>) {
    for i in 0..body.len() {
        let Some(cell) = body.get(i) else { break };
        if let Some(rebound) = relative_word(&cell, params) {
            body.update_binding(i, rebound);
        } else if let Some(series) = cell.as_series() {
            bind_body(&series.array, params);
        }
    }
}

/// Deep-copy a body, converting relative bindings against `params` into
/// context bindings on `frame`. This is the durable-frame (closure) path:
/// each invocation gets its own copy wired to its own heap frame.
pub fn copy_bound_to_frame(
    body: &Rc<Array>,
    params: &Rc<ParamList>,
    frame: &Rc<Context>,
) -> Rc<Array> {
    let cells = (0..body.len())
        .filter_map(|i| body.get(i))
        .map(|cell| copy_cell(&cell, params, frame))
        .collect();
    Array::rc(cells)
}

fn copy_cell(cell: &Value, params: &Rc<ParamList>, frame: &Rc<Context>) -> Value {
    let reword = |w: &Word| -> Word {
        match &w.binding {
            Binding::Relative { params: p, index } if Rc::ptr_eq(p, params) => {
                Word::bound(w.sym, frame.clone(), *index)
            }
            _ => w.clone(),
        }
    };
    match cell {
        Value::Word(w) => Value::Word(reword(w)),
        Value::SetWord(w) => Value::SetWord(reword(w)),
        Value::GetWord(w) => Value::GetWord(reword(w)),
        Value::LitWord(w) => Value::LitWord(reword(w)),
        Value::Block(s) => Value::Block(copy_series(s, params, frame)),
        Value::Group(s) => Value::Group(copy_series(s, params, frame)),
        Value::Path(s) => Value::Path(copy_series(s, params, frame)),
        Value::SetPath(s) => Value::SetPath(copy_series(s, params, frame)),
        Value::GetPath(s) => Value::GetPath(copy_series(s, params, frame)),
        Value::LitPath(s) => Value::LitPath(copy_series(s, params, frame)),
        other => other.clone(),
    }
}

fn copy_series(series: &Series, params: &Rc<ParamList>, frame: &Rc<Context>) -> Series {
    Series::new(copy_bound_to_frame(&series.array, params, frame), series.index)
}
