//! Native registry and lib bootstrap
//!
//! Natives are plain Rust functions reached through a dispatch table; a
//! function record stores only its table index, keeping the core crate
//! free of evaluator types. Registration happens once at evaluator
//! construction, in `install`, which each domain module extends with its
//! own entries (operators, control flow, function construction, series
//! and data natives, reducers).

use crate::eval::{Emit, Evaluator, Feed};
use lith_core::{Error, Kind, ParamClass, Symbol, TypeSet};

/// A framed native: arguments are gathered into the frame first.
pub type NativeFn = fn(&mut Evaluator) -> Result<Emit, Error>;

/// A frameless native: pulls its arguments straight from the source
/// stream. Must follow the same throw protocol as a framed call.
pub type VarlessFn = fn(&mut Evaluator, &Feed) -> Result<Emit, Error>;

#[derive(Clone)]
pub struct NativeDef {
    pub name: Symbol,
    pub f: NativeFn,
    pub varless: Option<VarlessFn>,
}

impl std::fmt::Debug for NativeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDef")
            .field("name", &self.name.as_str())
            .field("varless", &self.varless.is_some())
            .finish()
    }
}

/// Build the lib context: the literal constants, then every native,
/// action, and operator.
pub(crate) fn install(ev: &mut Evaluator) {
    use lith_core::Value;
    ev.lib_set("true", Value::Logic(true));
    ev.lib_set("false", Value::Logic(false));
    ev.lib_set("yes", Value::Logic(true));
    ev.lib_set("no", Value::Logic(false));
    ev.lib_set("on", Value::Logic(true));
    ev.lib_set("off", Value::Logic(false));
    ev.lib_set("none", Value::None);

    crate::ops::install(ev);
    crate::control::install(ev);
    crate::funcs::install(ev);
    crate::series::install(ev);
    crate::reduce::install(ev);
}

// ---------------------------------------------------------------------
//                      parameter spec shorthands
// ---------------------------------------------------------------------

/// Normal parameter taking any set value.
pub fn param(name: &str) -> TypeSet {
    TypeSet::any_value().named(Symbol::intern(name))
}

/// Normal parameter restricted to the listed kinds.
pub fn param_of(name: &str, kinds: &[Kind]) -> TypeSet {
    TypeSet::of(kinds).named(Symbol::intern(name))
}

/// Normal parameter accepting anything, unset included.
pub fn param_any_type(name: &str) -> TypeSet {
    TypeSet::any_type().named(Symbol::intern(name))
}

/// Hard-quoted parameter: the literal next cell.
pub fn hard(name: &str) -> TypeSet {
    TypeSet::any_value()
        .named(Symbol::intern(name))
        .classed(ParamClass::HardQuote)
}

/// Soft-quoted parameter: literal, with caller-side escapes.
pub fn soft(name: &str) -> TypeSet {
    TypeSet::any_value()
        .named(Symbol::intern(name))
        .classed(ParamClass::SoftQuote)
}

/// Refinement parameter.
pub fn refine(name: &str) -> TypeSet {
    TypeSet::of(&[Kind::Word, Kind::None, Kind::Logic])
        .named(Symbol::intern(name))
        .classed(ParamClass::Refinement)
}

/// Pure local.
pub fn local(name: &str) -> TypeSet {
    TypeSet::any_type()
        .named(Symbol::intern(name))
        .classed(ParamClass::PureLocal)
}
