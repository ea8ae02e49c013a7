//! Reducers and composers
//!
//! Three drivers built on the evaluator, sharing the data-stack
//! accumulation discipline: evaluate or copy elements onto the stack,
//! then drain the run into an array (or splice it /into a target). A
//! throw from any element drops the accumulated run before propagating.
//!
//! CONSTRUCT is deliberately not an evaluator client: it interprets a
//! block with no function calls at all, for security-sensitive header
//! parsing.

use crate::eval::{DoFlags, Emit, Evaluator, Feed, Step};
use crate::natives::{param_any_type, param_of, refine};
use lith_core::{Array, Context, Error, Kind, Series, Source, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Options for `reduce`.
#[derive(Debug, Default)]
pub struct ReduceOpts {
    /// /only: words and paths listed here pass through unevaluated.
    pub only_words: Option<Vec<Value>>,
    /// /no-set: set-words pass through unevaluated (error construction).
    pub no_set: bool,
    /// /into: splice the results here instead of building a new block.
    pub into: Option<Series>,
}

pub(crate) fn install(ev: &mut Evaluator) {
    ev.register_native(
        "reduce",
        vec![
            param_any_type("value"),
            refine("only"),
            param_of("words", &[Kind::Block, Kind::None]),
            refine("no-set"),
            refine("into"),
            param_of("target", &[Kind::Block, Kind::Group]),
        ],
        0,
        native_reduce,
    );
    ev.register_native(
        "compose",
        vec![
            param_any_type("value"),
            refine("deep"),
            refine("only"),
            refine("into"),
            param_of("target", &[Kind::Block, Kind::Group]),
        ],
        0,
        native_compose,
    );
    ev.register_native(
        "construct",
        vec![param_of("spec", &[Kind::Block])],
        0,
        native_construct,
    );
}

impl Evaluator {
    /// Evaluate each top-level expression of `series`, collecting results
    /// into a fresh block (or /into a target).
    pub fn reduce(&mut self, series: &Series, opts: ReduceOpts) -> Result<Emit, Error> {
        let entry = self.ds.depth();
        let feed: Feed = Rc::new(RefCell::new(Source::from_series(series.clone())));
        loop {
            let next = feed.borrow_mut().prefetch();
            let Some(cell) = next else { break };

            let literal = (opts.no_set && matches!(cell, Value::SetWord(_)))
                || (matches!(cell, Value::Word(_) | Value::Path(_))
                    && opts
                        .only_words
                        .as_ref()
                        .is_some_and(|skip| skip.iter().any(|w| *w == cell)));
            if literal {
                feed.borrow_mut().fetch_next();
                self.ds.push(cell);
                continue;
            }

            match self.do_next(&feed, None, DoFlags::NEXT) {
                Ok(Step::End) => break,
                Ok(Step::Value(v)) => self.ds.push(v),
                Ok(Step::Threw(t)) => {
                    self.ds.drop_to(entry);
                    return Ok(Emit::Threw(t));
                }
                Err(e) => {
                    self.ds.drop_to(entry);
                    return Err(e);
                }
            }
        }
        self.finish_run(entry, opts.into)
    }

    /// Copy `series` with GROUP!s evaluated: block results splice (unless
    /// /only), unset results vanish, and /deep recurses into nested
    /// blocks as shallow copies.
    pub fn compose(
        &mut self,
        series: &Series,
        deep: bool,
        only: bool,
        into: Option<Series>,
    ) -> Result<Emit, Error> {
        let entry = self.ds.depth();
        for cell in series.cells() {
            match &cell {
                Value::Group(g) => match self.guarded_block(g, entry)? {
                    Emit::Threw(t) => return Ok(Emit::Threw(t)),
                    Emit::Value(Value::Unset) => {}
                    Emit::Value(Value::Block(b)) if !only => {
                        for spliced in b.cells() {
                            self.ds.push(spliced);
                        }
                    }
                    Emit::Value(v) => self.ds.push(v),
                },
                Value::Block(b) if deep => match self.compose(b, deep, only, None)? {
                    Emit::Value(v) => self.ds.push(v),
                    Emit::Threw(t) => {
                        self.ds.drop_to(entry);
                        return Ok(Emit::Threw(t));
                    }
                },
                other => self.ds.push(other.clone()),
            }
        }
        self.finish_run(entry, into)
    }

    /// Minimal, function-free evaluation of a spec block into an object:
    /// runs of set-words all take the interpreted value of the expression
    /// that ends the run; a trailing run takes NONE.
    pub fn construct(&mut self, series: &Series) -> Result<Rc<Context>, Error> {
        let ctx = Context::object();
        let entry = self.ds.depth();
        for cell in series.cells() {
            match cell {
                Value::SetWord(w) => self.ds.push(Value::SetWord(w)),
                other => {
                    let v = construct_value(&other);
                    for pending in self.ds.take_from(entry) {
                        if let Value::SetWord(w) = pending {
                            ctx.set_by_sym(w.sym, v.clone())?;
                        }
                    }
                }
            }
        }
        for pending in self.ds.take_from(entry) {
            if let Value::SetWord(w) = pending {
                ctx.set_by_sym(w.sym, Value::None)?;
            }
        }
        Ok(ctx)
    }

    /// Group evaluation that keeps the accumulation balanced on throw.
    fn guarded_block(&mut self, series: &Series, entry: usize) -> Result<Emit, Error> {
        match self.do_block(series) {
            Ok(Emit::Threw(t)) => {
                self.ds.drop_to(entry);
                Ok(Emit::Threw(t))
            }
            Ok(ok) => Ok(ok),
            Err(e) => {
                self.ds.drop_to(entry);
                Err(e)
            }
        }
    }

    /// Drain the accumulated run into a fresh block, or splice it into
    /// the /into target (answering the position past the splice).
    fn finish_run(&mut self, entry: usize, into: Option<Series>) -> Result<Emit, Error> {
        let values = self.ds.take_from(entry);
        match into {
            None => Ok(Emit::Value(Value::Block(Series::new(Array::rc(values), 0)))),
            Some(target) => {
                let count = values.len();
                target.array.insert(target.index, values)?;
                Ok(Emit::Value(Value::Block(Series::new(
                    target.array.clone(),
                    target.index + count,
                ))))
            }
        }
    }
}

/// The CONSTRUCT value interpretation: quoted forms unquote, the literal
/// logic words read as their values, everything else is itself.
fn construct_value(v: &Value) -> Value {
    match v {
        Value::LitWord(w) => Value::Word(w.clone()),
        Value::LitPath(s) => Value::Path(s.clone()),
        Value::Word(w) => {
            let name = w.sym.canon().as_str();
            match name.as_str() {
                "none" => Value::None,
                "true" | "on" | "yes" => Value::Logic(true),
                "false" | "off" | "no" => Value::Logic(false),
                _ => Value::Word(w.clone()),
            }
        }
        other => other.clone(),
    }
}

fn native_reduce(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    let Value::Block(series) = &value else {
        // Reduce of a non-block is the value itself.
        return Ok(Emit::Value(value));
    };
    let only_words = if ev.arg_is(1) {
        match ev.arg(2) {
            Value::Block(words) => Some(words.cells()),
            _ => Some(Vec::new()),
        }
    } else {
        None
    };
    let opts = ReduceOpts {
        only_words,
        no_set: ev.arg_is(3),
        into: if ev.arg_is(4) {
            ev.arg(5).as_series().cloned()
        } else {
            None
        },
    };
    let series = series.clone();
    ev.reduce(&series, opts)
}

fn native_compose(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    let Value::Block(series) = &value else {
        return Ok(Emit::Value(value));
    };
    let deep = ev.arg_is(1);
    let only = ev.arg_is(2);
    let into = if ev.arg_is(3) {
        ev.arg(4).as_series().cloned()
    } else {
        None
    };
    let series = series.clone();
    ev.compose(&series, deep, only, into)
}

fn native_construct(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Block(series) = ev.arg(0) else {
        return Err(Error::misc("construct needs a block"));
    };
    let ctx = ev.construct(&series)?;
    Ok(Emit::Value(Value::Object(ctx)))
}
