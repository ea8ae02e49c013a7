//! Actions and data natives
//!
//! Actions are type-generic: one function record per operation, dispatched
//! on the first argument's kind at call time. The data natives (SET, GET,
//! TYPE-OF, the predicates, BINDING-OF) round out the surface the
//! evaluator's own tests and a minimal bootstrap need.

use crate::eval::{Emit, Evaluator};
use crate::natives::{param, param_any_type, param_of, refine};
use lith_core::{
    ActionKind, Binding, Error, ErrorKind, Kind, Series, Symbol, Value,
};

pub(crate) fn install(ev: &mut Evaluator) {
    let series_kinds = &[Kind::Block, Kind::Group, Kind::Text];

    ev.register_action(
        "append",
        ActionKind::Append,
        vec![
            param_of("series", &[Kind::Block, Kind::Group]),
            param("value"),
            refine("only"),
        ],
    );
    ev.register_action(
        "pick",
        ActionKind::Pick,
        vec![
            param_of("series", series_kinds),
            param_of("index", &[Kind::Integer]),
        ],
    );
    ev.register_action(
        "poke",
        ActionKind::Poke,
        vec![
            param_of("series", &[Kind::Block, Kind::Group]),
            param_of("index", &[Kind::Integer]),
            param("value"),
        ],
    );
    ev.register_action("first", ActionKind::First, vec![param_of("series", series_kinds)]);
    ev.register_action(
        "length?",
        ActionKind::Length,
        vec![param_of("series", series_kinds)],
    );

    ev.register_native(
        "set",
        vec![param_of("target", &[Kind::Word, Kind::Block]), param("value")],
        0,
        native_set,
    );
    ev.register_native(
        "get",
        vec![param_of("word", &[Kind::Word]), refine("any")],
        0,
        native_get,
    );
    ev.register_native("type-of", vec![param_any_type("value")], 0, native_type_of);
    ev.register_native("unset?", vec![param_any_type("value")], 0, native_unset_q);
    ev.register_native("none?", vec![param_any_type("value")], 0, native_none_q);
    ev.register_native(
        "value?",
        vec![param_of("word", &[Kind::Word])],
        0,
        native_value_q,
    );
    ev.register_native(
        "binding-of",
        vec![param_of("word", &[Kind::Word])],
        0,
        native_binding_of,
    );
}

impl Evaluator {
    /// Type-generic dispatch on the first argument.
    pub(crate) fn run_action(&mut self, kind: ActionKind) -> Result<Emit, Error> {
        match kind {
            ActionKind::Append => self.action_append(),
            ActionKind::Pick => self.action_pick(),
            ActionKind::Poke => self.action_poke(),
            ActionKind::First => self.action_first(),
            ActionKind::Length => self.action_length(),
        }
    }

    fn action_append(&mut self) -> Result<Emit, Error> {
        let series = self.arg(0);
        let value = self.arg(1);
        let only = self.arg_is(2);
        match &series {
            Value::Block(s) | Value::Group(s) => {
                match &value {
                    // Block content splices unless /only keeps it nested.
                    Value::Block(b) if !only => s.array.insert(s.array.len(), b.cells())?,
                    v => s.array.insert(s.array.len(), vec![(*v).clone()])?,
                }
                // Append answers the series at its head.
                Ok(Emit::Value(head_of(&series, s)))
            }
            other => Err(action_mismatch("append", other)),
        }
    }

    fn action_pick(&mut self) -> Result<Emit, Error> {
        let series = self.arg(0);
        let Value::Integer(index) = self.arg(1) else {
            return Err(Error::misc("pick needs an integer index"));
        };
        match &series {
            Value::Block(s) | Value::Group(s) => Ok(Emit::Value(pick_at(s, index))),
            Value::Text(t) => {
                let picked = (index >= 1)
                    .then(|| t.chars().nth((index - 1) as usize))
                    .flatten()
                    .map(|c| Value::text(&c.to_string()))
                    .unwrap_or(Value::None);
                Ok(Emit::Value(picked))
            }
            other => Err(action_mismatch("pick", other)),
        }
    }

    fn action_poke(&mut self) -> Result<Emit, Error> {
        let series = self.arg(0);
        let Value::Integer(index) = self.arg(1) else {
            return Err(Error::misc("poke needs an integer index"));
        };
        let value = self.arg(2);
        match &series {
            Value::Block(s) | Value::Group(s) => {
                if index >= 1 && ((index - 1) as usize) < s.len() {
                    s.array.set(s.index + (index - 1) as usize, value.clone())?;
                    Ok(Emit::Value(value))
                } else {
                    Err(ErrorKind::BadPathRange(Value::Integer(index)).into())
                }
            }
            other => Err(action_mismatch("poke", other)),
        }
    }

    fn action_first(&mut self) -> Result<Emit, Error> {
        let series = self.arg(0);
        match &series {
            Value::Block(s) | Value::Group(s) => Ok(Emit::Value(pick_at(s, 1))),
            Value::Text(t) => Ok(Emit::Value(
                t.chars()
                    .next()
                    .map(|c| Value::text(&c.to_string()))
                    .unwrap_or(Value::None),
            )),
            other => Err(action_mismatch("first", other)),
        }
    }

    fn action_length(&mut self) -> Result<Emit, Error> {
        let series = self.arg(0);
        match &series {
            Value::Block(s) | Value::Group(s) => Ok(Emit::Value(Value::Integer(s.len() as i64))),
            Value::Text(t) => Ok(Emit::Value(Value::Integer(t.chars().count() as i64))),
            other => Err(action_mismatch("length?", other)),
        }
    }
}

fn head_of(original: &Value, series: &Series) -> Value {
    let head = Series::new(series.array.clone(), 0);
    match original {
        Value::Group(_) => Value::Group(head),
        _ => Value::Block(head),
    }
}

fn pick_at(series: &Series, index: i64) -> Value {
    if index >= 1 {
        series.at((index - 1) as usize).unwrap_or(Value::None)
    } else {
        Value::None
    }
}

fn action_mismatch(action: &str, value: &Value) -> Error {
    ErrorKind::ExpectArg {
        func: Symbol::intern(action),
        param: Symbol::intern("series"),
        kind: value.kind(),
    }
    .into()
}

fn native_set(ev: &mut Evaluator) -> Result<Emit, Error> {
    let target = ev.arg(0);
    let value = ev.arg(1);
    match &target {
        Value::Word(w) => {
            let w = w.clone();
            ev.set_var(&w, value.clone())?;
        }
        Value::Block(words) => match &value {
            // Pairwise: block of words gets a block of values.
            Value::Block(values) => {
                for (n, cell) in words.cells().into_iter().enumerate() {
                    let Value::Word(w) = cell else {
                        return Err(Error::misc("set block must hold words"));
                    };
                    let v = values.at(n).unwrap_or(Value::None);
                    ev.set_var(&w, v)?;
                }
            }
            single => {
                for cell in words.cells() {
                    let Value::Word(w) = cell else {
                        return Err(Error::misc("set block must hold words"));
                    };
                    ev.set_var(&w, (*single).clone())?;
                }
            }
        },
        _ => return Err(Error::misc("set needs a word or block of words")),
    }
    Ok(Emit::Value(value))
}

fn native_get(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Word(w) = ev.arg(0) else {
        return Err(Error::misc("get needs a word"));
    };
    let any = ev.arg_is(1);
    let v = ev.get_var(&w)?;
    if v.is_unset() && !any {
        return Err(ErrorKind::NoValue(w.sym).into());
    }
    Ok(Emit::Value(v))
}

fn native_type_of(ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(Value::word(ev.arg(0).kind().name())))
}

fn native_unset_q(ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(Value::Logic(ev.arg(0).is_unset())))
}

fn native_none_q(ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(Value::Logic(ev.arg(0).is_none())))
}

fn native_value_q(ev: &mut Evaluator) -> Result<Emit, Error> {
    let result = match ev.arg(0) {
        Value::Word(w) => matches!(ev.get_var(&w), Ok(v) if !v.is_unset()),
        v => !v.is_unset(),
    };
    Ok(Emit::Value(Value::Logic(result)))
}

fn native_binding_of(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Word(w) = ev.arg(0) else {
        return Err(Error::misc("binding-of needs a word"));
    };
    let v = match &w.binding {
        Binding::Unbound | Binding::Relative { .. } => Value::None,
        Binding::Context { ctx, .. } => match ctx.kind() {
            lith_core::ContextKind::Frame => Value::Frame(ctx.clone()),
            _ => Value::Object(ctx.clone()),
        },
    };
    Ok(Emit::Value(v))
}
