//! Function construction and definitional exits
//!
//! FUNC/PROC/CLOSURE build user functions from a spec dialect:
//!
//! - `word`: normal argument (any set value unless a type block follows)
//! - `'word`: soft-quoted argument
//! - `:word`: hard-quoted argument
//! - `/name`: refinement; following words are its arguments
//! - `/local`: everything after is a pure local
//! - `[type! ...]`: typeset restriction for the preceding argument; the
//!   word `variadic` in the block makes the parameter variadic
//! - `return: [type! ...]`: return typeset
//! - strings are documentation and are skipped
//!
//! FUNC carries a definitional RETURN and PROC a definitional LEAVE in a
//! reserved pure-local slot; the dispatcher injects the exit cell with the
//! invocation's identity at call time. CLOSURE is FUNC with a durable
//! frame: a heap context per call, body copied and rebound to it.

use crate::eval::{Emit, Evaluator};
use crate::natives::{param_any_type, param_of, refine};
use lith_core::{
    Array, Context, Error, ErrorKind, ExitTarget, FuncBody, Function, HAS_LEAVE, HAS_RETURN, Kind,
    ParamClass, ParamList, Series, Symbol, Throw, TypeSet, Value,
};
use std::rc::Rc;

const ALL_KINDS: &[Kind] = &[
    Kind::Unset,
    Kind::None,
    Kind::Logic,
    Kind::Integer,
    Kind::Decimal,
    Kind::Text,
    Kind::Block,
    Kind::Group,
    Kind::Path,
    Kind::SetPath,
    Kind::GetPath,
    Kind::LitPath,
    Kind::Word,
    Kind::SetWord,
    Kind::GetWord,
    Kind::LitWord,
    Kind::Refinement,
    Kind::Bar,
    Kind::LitBar,
    Kind::Function,
    Kind::Frame,
    Kind::Object,
    Kind::Varargs,
];

pub(crate) fn install(ev: &mut Evaluator) {
    let spec_body = || {
        vec![
            param_of("spec", &[Kind::Block]),
            param_of("body", &[Kind::Block]),
        ]
    };
    ev.register_native("func", spec_body(), 0, native_func);
    ev.register_native("proc", spec_body(), 0, native_proc);
    ev.register_native("closure", spec_body(), 0, native_closure);
    ev.register_native(
        "specialize",
        vec![
            param_of("target", &[Kind::Function, Kind::Word]),
            param_of("def", &[Kind::Block]),
        ],
        0,
        native_specialize,
    );

    let ret = ev.register_native("return", vec![param_any_type("value")], 0, native_return);
    ev.return_native = Some(ret);
    let leave = ev.register_native("leave", vec![], 0, native_leave);
    ev.leave_native = Some(leave);

    ev.register_native(
        "exit",
        vec![
            refine("from"),
            param_of("target", &[Kind::Function, Kind::Frame, Kind::Integer]),
            refine("with"),
            param_any_type("value"),
        ],
        0,
        native_exit,
    );

    ev.register_native(
        "take",
        vec![param_of("vararg", &[Kind::Varargs])],
        0,
        native_take,
    );
}

/// Parse a spec block and build a user function over `body`.
pub fn make_function(
    spec: &Series,
    body: &Series,
    durable: bool,
    flags: u8,
) -> Result<Rc<Function>, Error> {
    let mut params: Vec<TypeSet> = Vec::new();
    let mut locals_mode = false;
    let mut return_types: Option<TypeSet> = None;
    let mut pending_return_types = false;

    for cell in spec.cells() {
        match cell {
            Value::Text(_) => {}
            Value::Word(w) => {
                let class = if locals_mode {
                    ParamClass::PureLocal
                } else {
                    ParamClass::Normal
                };
                params.push(TypeSet::any_value().named(w.sym).classed(class));
            }
            Value::LitWord(w) => {
                params.push(
                    TypeSet::any_value()
                        .named(w.sym)
                        .classed(ParamClass::SoftQuote),
                );
            }
            Value::GetWord(w) => {
                params.push(
                    TypeSet::any_value()
                        .named(w.sym)
                        .classed(ParamClass::HardQuote),
                );
            }
            Value::Refinement(w) => {
                if w.sym.eq_fold(Symbol::intern("local")) {
                    locals_mode = true;
                } else {
                    params.push(
                        TypeSet::of(&[Kind::Word, Kind::None])
                            .named(w.sym)
                            .classed(ParamClass::Refinement),
                    );
                }
            }
            Value::SetWord(w) if w.sym.eq_fold(Symbol::intern("return")) => {
                pending_return_types = true;
            }
            Value::Block(types) => {
                let ts = parse_typeset(&types)?;
                if pending_return_types {
                    return_types = Some(ts);
                    pending_return_types = false;
                } else {
                    match params.last_mut() {
                        Some(last)
                            if matches!(
                                last.class,
                                ParamClass::Normal
                                    | ParamClass::HardQuote
                                    | ParamClass::SoftQuote
                            ) =>
                        {
                            last.bits = ts.bits;
                            if ts.class == ParamClass::Variadic {
                                last.class = ParamClass::Variadic;
                            }
                        }
                        _ => {
                            return Err(Error::misc(
                                "type block in spec must follow an argument",
                            ));
                        }
                    }
                }
            }
            other => {
                return Err(Error::misc(format!("invalid spec element {}", other)));
            }
        }
    }

    if flags & HAS_RETURN != 0 {
        let ts = return_types.unwrap_or_else(TypeSet::any_type);
        params.push(
            ts.named(Symbol::intern("return"))
                .classed(ParamClass::PureLocal),
        );
    }
    if flags & HAS_LEAVE != 0 {
        params.push(
            TypeSet::any_type()
                .named(Symbol::intern("leave"))
                .classed(ParamClass::PureLocal),
        );
    }
    if params.len() > 255 {
        return Err(ErrorKind::TooLong("function spec".into()).into());
    }

    let paramlist = ParamList::new(params);
    let body_array = body.array.clone();
    crate::bind::bind_body(&body_array, &paramlist);
    Ok(Function::new(
        crate::eval::anonymous(),
        paramlist,
        flags,
        FuncBody::User {
            body: body_array,
            durable,
        },
    ))
}

/// Typeset block: datatype words, `any-type!` for everything, `variadic`
/// to mark the parameter variadic.
fn parse_typeset(types: &Series) -> Result<TypeSet, Error> {
    let mut ts = TypeSet::of(&[]);
    for cell in types.cells() {
        let Value::Word(w) = &cell else {
            return Err(Error::misc(format!("invalid type {}", cell)));
        };
        let name = w.sym.canon().as_str();
        if name == "any-type!" {
            ts.bits = TypeSet::any_type().bits;
            continue;
        }
        if name == "any-value!" {
            ts.bits |= TypeSet::any_value().bits;
            continue;
        }
        if name == "variadic" {
            ts.class = ParamClass::Variadic;
            ts.bits = TypeSet::any_value().bits;
            continue;
        }
        match ALL_KINDS.iter().find(|k| k.name() == name) {
            Some(kind) => ts.add(*kind),
            None => return Err(Error::misc(format!("unknown datatype {}", name))),
        }
    }
    Ok(ts)
}

fn two_blocks(ev: &Evaluator) -> Result<(Series, Series), Error> {
    let Value::Block(spec) = ev.arg(0) else {
        return Err(Error::misc("spec must be a block"));
    };
    let Value::Block(body) = ev.arg(1) else {
        return Err(Error::misc("body must be a block"));
    };
    Ok((spec, body))
}

fn native_func(ev: &mut Evaluator) -> Result<Emit, Error> {
    let (spec, body) = two_blocks(ev)?;
    let func = make_function(&spec, &body, false, HAS_RETURN)?;
    Ok(Emit::Value(Value::Function(func)))
}

fn native_proc(ev: &mut Evaluator) -> Result<Emit, Error> {
    let (spec, body) = two_blocks(ev)?;
    let func = make_function(&spec, &body, false, HAS_LEAVE)?;
    Ok(Emit::Value(Value::Function(func)))
}

fn native_closure(ev: &mut Evaluator) -> Result<Emit, Error> {
    let (spec, body) = two_blocks(ev)?;
    let func = make_function(&spec, &body, true, HAS_RETURN)?;
    Ok(Emit::Value(Value::Function(func)))
}

fn native_specialize(ev: &mut Evaluator) -> Result<Emit, Error> {
    let target = match ev.arg(0) {
        Value::Function(f) => f,
        Value::Word(w) => match ev.get_var(&w)? {
            Value::Function(f) => f,
            other => {
                return Err(Error::misc(format!(
                    "cannot specialize {} ({})",
                    w.sym,
                    other.kind().name()
                )));
            }
        },
        other => return Err(Error::misc(format!("cannot specialize {}", other))),
    };
    let Value::Block(def) = ev.arg(1) else {
        return Err(Error::misc("specialize needs a block"));
    };

    // Flatten: specializing a specialization overlays the same underlying
    // frame, so dispatch only ever unwraps one level.
    let underlying = target.underlying();
    let seed = match &target.body {
        FuncBody::Specialized { frame, .. } => frame.vars_vec(),
        _ => vec![Value::Bar; underlying.params.len()],
    };
    let frame = Context::frame(underlying.clone(), seed);

    // The def block runs with its words bound into the frame; set-words
    // fill slots, everything else is ordinary evaluation.
    let def_copy = Array::rc(def.cells());
    crate::bind::bind_block(&def_copy, &frame, false);
    match ev.do_block(&Series::new(def_copy, 0))? {
        Emit::Value(_) => {}
        Emit::Threw(t) => return Ok(Emit::Threw(t)),
    }

    let func = Function::new(
        underlying.name,
        underlying.params.clone(),
        underlying.flags,
        FuncBody::Specialized {
            base: underlying,
            frame,
        },
    );
    Ok(Emit::Value(Value::Function(func)))
}

fn native_return(ev: &mut Evaluator) -> Result<Emit, Error> {
    let value = ev.arg(0);
    match ev.frame_func().and_then(|f| f.exit_target.clone()) {
        Some(target) => Ok(Emit::Threw(Throw::exit(
            Symbol::intern("return"),
            value,
            target,
        ))),
        None => Err(Error::misc("return used outside of a function")),
    }
}

fn native_leave(ev: &mut Evaluator) -> Result<Emit, Error> {
    match ev.frame_func().and_then(|f| f.exit_target.clone()) {
        Some(target) => Ok(Emit::Threw(Throw::exit(
            Symbol::intern("leave"),
            Value::Unset,
            target,
        ))),
        None => Err(Error::misc("leave used outside of a procedure")),
    }
}

fn native_exit(ev: &mut Evaluator) -> Result<Emit, Error> {
    let payload = if ev.arg_is(2) { ev.arg(3) } else { Value::Unset };
    let target = if ev.arg_is(0) {
        match ev.arg(1) {
            Value::Function(f) => ExitTarget::Function(f.underlying().params.clone()),
            Value::Frame(ctx) => ExitTarget::Frame(ctx),
            Value::Integer(n) => {
                if n < 1 {
                    return Err(Error::misc("exit depth must be 1 or more"));
                }
                // Depth counts every completing call, starting at EXIT's
                // caller; one extra covers EXIT's own frame.
                ExitTarget::Depth(n as u32 + 1)
            }
            other => {
                return Err(Error::misc(format!("cannot exit from {}", other)));
            }
        }
    } else {
        match nearest_user_frame(ev) {
            Some(target) => target,
            None => return Err(Error::misc("exit used with no function on the stack")),
        }
    };
    Ok(Emit::Threw(Throw::exit(
        Symbol::intern("exit"),
        payload,
        target,
    )))
}

/// The identity of the nearest enclosing user-function invocation,
/// skipping EXIT's own frame and any natives between.
fn nearest_user_frame(ev: &Evaluator) -> Option<ExitTarget> {
    for frame in ev.frames.iter().rev().skip(1) {
        if matches!(frame.func.body, FuncBody::User { .. }) {
            return Some(match frame.args.context() {
                Some(ctx) => ExitTarget::Frame(ctx.clone()),
                None => ExitTarget::Function(frame.func.params.clone()),
            });
        }
    }
    None
}

fn native_take(ev: &mut Evaluator) -> Result<Emit, Error> {
    let Value::Varargs(handle) = ev.arg(0) else {
        return Err(Error::misc("take needs a varargs handle"));
    };
    ev.take_vararg(&handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(cells: Vec<Value>) -> Series {
        Series::new(Array::rc(cells), 0)
    }

    #[test]
    fn test_spec_dialect_classes() {
        let spec = series_of(vec![
            Value::word("a"),
            Value::LitWord(lith_core::Word::unbound(Symbol::intern("b"))),
            Value::GetWord(lith_core::Word::unbound(Symbol::intern("c"))),
            Value::Refinement(lith_core::Word::unbound(Symbol::intern("only"))),
            Value::word("extra"),
            Value::Refinement(lith_core::Word::unbound(Symbol::intern("local"))),
            Value::word("tmp"),
        ]);
        let body = series_of(vec![]);
        let func = make_function(&spec, &body, false, HAS_RETURN).unwrap();
        let classes: Vec<ParamClass> =
            func.params.params.iter().map(|p| p.class).collect();
        assert_eq!(
            classes,
            vec![
                ParamClass::Normal,
                ParamClass::SoftQuote,
                ParamClass::HardQuote,
                ParamClass::Refinement,
                ParamClass::Normal,
                ParamClass::PureLocal,
                ParamClass::PureLocal, // the hidden return slot
            ]
        );
        assert!(func.has_return());
    }

    #[test]
    fn test_spec_type_blocks_restrict() {
        let spec = series_of(vec![
            Value::word("n"),
            Value::block(vec![Value::word("integer!"), Value::word("decimal!")]),
        ]);
        let body = series_of(vec![]);
        let func = make_function(&spec, &body, false, HAS_RETURN).unwrap();
        let n = &func.params.params[0];
        assert!(n.accepts(Kind::Integer));
        assert!(n.accepts(Kind::Decimal));
        assert!(!n.accepts(Kind::Block));
    }

    #[test]
    fn test_spec_rejects_unknown_type() {
        let spec = series_of(vec![
            Value::word("n"),
            Value::block(vec![Value::word("gizmo!")]),
        ]);
        let body = series_of(vec![]);
        assert!(make_function(&spec, &body, false, HAS_RETURN).is_err());
    }

    #[test]
    fn test_variadic_marker() {
        let spec = series_of(vec![
            Value::word("rest"),
            Value::block(vec![Value::word("variadic")]),
        ]);
        let body = series_of(vec![]);
        let func = make_function(&spec, &body, false, HAS_RETURN).unwrap();
        assert_eq!(func.params.params[0].class, ParamClass::Variadic);
    }

    #[test]
    fn test_return_typeset_recorded() {
        let spec = series_of(vec![
            Value::SetWord(lith_core::Word::unbound(Symbol::intern("return"))),
            Value::block(vec![Value::word("integer!")]),
        ]);
        let body = series_of(vec![]);
        let func = make_function(&spec, &body, false, HAS_RETURN).unwrap();
        let ret = func
            .params
            .find(Symbol::intern("return"))
            .expect("return slot");
        assert!(func.params.params[ret].accepts(Kind::Integer));
        assert!(!func.params.params[ret].accepts(Kind::Text));
    }
}
