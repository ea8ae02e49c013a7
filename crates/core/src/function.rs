//! Function records
//!
//! A function is immutable once built: a parameter list, flags, and a body.
//! The parameter list is behind its own `Rc` because its pointer identity
//! IS the function's identity: relative word bindings and EXIT-FROM
//! targets both compare paramlist pointers, which is how wrappers that
//! share a paramlist (specializations) share an identity with their base.
//!
//! Native and action bodies are table indices rather than function
//! pointers: the dispatch tables live in the runtime crate, which keeps
//! this crate free of evaluator types.

use crate::array::Array;
use crate::context::Context;
use crate::symbol::Symbol;
use crate::throw::ExitTarget;
use crate::typeset::{ParamClass, TypeSet};
use std::rc::Rc;

/// Index into the runtime's native dispatch table.
pub type NativeId = usize;

/// Type-generic operations dispatched on the first argument's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Append,
    Pick,
    Poke,
    First,
    Length,
}

/// Function flags.
pub const INFIX: u8 = 1 << 0;
/// Eligible for frameless dispatch, pulling args straight from the source.
pub const VARLESS: u8 = 1 << 1;
/// Carries a definitional RETURN in a reserved pure-local slot.
pub const HAS_RETURN: u8 = 1 << 2;
/// Carries a definitional LEAVE; output is forced to unset.
pub const HAS_LEAVE: u8 = 1 << 3;

#[derive(Debug, PartialEq)]
pub struct ParamList {
    pub params: Vec<TypeSet>,
}

impl ParamList {
    pub fn new(params: Vec<TypeSet>) -> Rc<ParamList> {
        Rc::new(ParamList { params })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Slot of the parameter named `sym` (case-insensitive).
    pub fn find(&self, sym: Symbol) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.sym.is_some_and(|s| s.eq_fold(sym)))
    }

    /// First parameter that consumes a callsite value (the slot an infix
    /// left-hand argument lands in).
    pub fn first_consumed(&self) -> Option<(usize, &TypeSet)> {
        self.params.iter().enumerate().find(|(_, p)| {
            matches!(
                p.class,
                ParamClass::Normal | ParamClass::HardQuote | ParamClass::SoftQuote
            )
        })
    }
}

#[derive(Debug, Clone)]
pub enum FuncBody {
    /// Native Rust implementation, by dispatch-table index.
    Native(NativeId),
    /// Type-generic action.
    Action(ActionKind),
    /// Host-registered command, by registry index.
    Command(usize),
    /// Host-registered routine (foreign call shim), by registry index.
    Routine(usize),
    /// User function: a body array. Durable bodies get a fresh heap frame
    /// context per call (the closure class); plain bodies run on the chunk
    /// stack with relative word binding.
    User { body: Rc<Array>, durable: bool },
    /// Partially pre-filled frame over a backing function.
    Specialized { base: Rc<Function>, frame: Rc<Context> },
}

#[derive(Debug, Clone)]
pub struct Function {
    /// Primary name, for labels and error text. Anonymous functions carry
    /// a placeholder symbol.
    pub name: Symbol,
    pub params: Rc<ParamList>,
    pub flags: u8,
    pub body: FuncBody,
    /// Set only on the synthesized RETURN/LEAVE cells injected into a
    /// frame's reserved local: the identity their throw must exit from.
    pub exit_target: Option<ExitTarget>,
}

impl Function {
    pub fn new(name: Symbol, params: Rc<ParamList>, flags: u8, body: FuncBody) -> Rc<Function> {
        Rc::new(Function {
            name,
            params,
            flags,
            body,
            exit_target: None,
        })
    }

    pub fn is_infix(&self) -> bool {
        self.flags & INFIX != 0
    }

    pub fn is_varless(&self) -> bool {
        self.flags & VARLESS != 0
    }

    pub fn has_return(&self) -> bool {
        self.flags & HAS_RETURN != 0
    }

    pub fn has_leave(&self) -> bool {
        self.flags & HAS_LEAVE != 0
    }

    /// A copy of this function carrying an exit target, for injection into
    /// a frame's RETURN/LEAVE slot.
    pub fn with_exit_target(&self, target: ExitTarget) -> Rc<Function> {
        Rc::new(Function {
            name: self.name,
            params: self.params.clone(),
            flags: self.flags,
            body: self.body.clone(),
            exit_target: Some(target),
        })
    }

    /// The function whose paramlist gives this one its identity: a
    /// specialization answers with its base's underlying function.
    pub fn underlying(self: &Rc<Function>) -> Rc<Function> {
        match &self.body {
            FuncBody::Specialized { base, .. } => base.underlying(),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    fn param(name: &str) -> TypeSet {
        TypeSet::any_value().named(Symbol::intern(name))
    }

    #[test]
    fn test_paramlist_find_folds_case() {
        let params = ParamList::new(vec![param("Series"), param("value")]);
        assert_eq!(params.find(Symbol::intern("series")), Some(0));
        assert_eq!(params.find(Symbol::intern("VALUE")), Some(1));
        assert_eq!(params.find(Symbol::intern("missing")), None);
    }

    #[test]
    fn test_first_consumed_skips_refinements() {
        let params = ParamList::new(vec![
            param("only").classed(ParamClass::Refinement),
            param("value").classed(ParamClass::Normal),
        ]);
        let (i, p) = params.first_consumed().unwrap();
        assert_eq!(i, 1);
        assert!(p.accepts(Kind::Integer));
    }

    #[test]
    fn test_flags() {
        let f = Function::new(
            Symbol::intern("f"),
            ParamList::new(vec![]),
            INFIX | HAS_RETURN,
            FuncBody::Native(0),
        );
        assert!(f.is_infix());
        assert!(f.has_return());
        assert!(!f.is_varless());
        assert!(!f.has_leave());
    }

    #[test]
    fn test_underlying_unwraps_specializations() {
        let base = Function::new(
            Symbol::intern("base"),
            ParamList::new(vec![param("a")]),
            0,
            FuncBody::Native(0),
        );
        let spec = Function::new(
            Symbol::intern("spec"),
            base.params.clone(),
            0,
            FuncBody::Specialized {
                base: base.clone(),
                frame: Context::frame(base.clone(), vec![crate::value::Value::Bar]),
            },
        );
        assert!(Rc::ptr_eq(&spec.underlying(), &base));
    }
}
