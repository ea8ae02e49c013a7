//! Throws: the cooperative non-local control channel
//!
//! A throw is a name plus a payload, optionally tagged with an exit target.
//! Unlike errors, throws are ordinary data that unwind one frame at a time:
//! each completing call inspects a passing throw and either catches it
//! (exit-target identity match, or a CATCH/LOOP native matching by name)
//! or hands it to its own caller.

use crate::context::Context;
use crate::function::ParamList;
use crate::symbol::Symbol;
use crate::value::Value;
use std::rc::Rc;

/// Which in-flight call an exit-bearing throw terminates.
#[derive(Debug, Clone)]
pub enum ExitTarget {
    /// Most recent invocation of the function with this paramlist.
    Function(Rc<ParamList>),
    /// The call whose argument storage is exactly this context.
    Frame(Rc<Context>),
    /// The n-th enclosing call, counting down one per completion.
    Depth(u32),
}

impl PartialEq for ExitTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExitTarget::Function(a), ExitTarget::Function(b)) => Rc::ptr_eq(a, b),
            (ExitTarget::Frame(a), ExitTarget::Frame(b)) => Rc::ptr_eq(a, b),
            (ExitTarget::Depth(a), ExitTarget::Depth(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Throw {
    /// Name cell: a word for named throws (break, return, and the rest), NONE for a
    /// plain THROW.
    pub name: Value,
    pub payload: Value,
    pub target: Option<ExitTarget>,
}

impl Throw {
    /// A named throw (break, continue, quit).
    pub fn named(name: Symbol, payload: Value) -> Throw {
        Throw {
            name: Value::Word(crate::value::Word::unbound(name)),
            payload,
            target: None,
        }
    }

    /// An unnamed THROW.
    pub fn plain(payload: Value) -> Throw {
        Throw {
            name: Value::None,
            payload,
            target: None,
        }
    }

    /// An exit-bearing throw (return/leave/exit).
    pub fn exit(name: Symbol, payload: Value, target: ExitTarget) -> Throw {
        Throw {
            name: Value::Word(crate::value::Word::unbound(name)),
            payload,
            target: Some(target),
        }
    }

    pub fn is_exit(&self) -> bool {
        self.target.is_some()
    }

    /// Does this throw's name match `sym`?
    pub fn is_named(&self, sym: Symbol) -> bool {
        match &self.name {
            Value::Word(w) => w.sym.eq_fold(sym),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_matching() {
        let t = Throw::named(Symbol::intern("break"), Value::None);
        assert!(t.is_named(Symbol::intern("BREAK")));
        assert!(!t.is_named(Symbol::intern("continue")));
        assert!(!t.is_exit());
    }

    #[test]
    fn test_plain_throw_has_no_name() {
        let t = Throw::plain(Value::Integer(3));
        assert_eq!(t.name, Value::None);
        assert!(!t.is_named(Symbol::intern("anything")));
    }

    #[test]
    fn test_exit_target_identity() {
        let plist = ParamList::new(vec![]);
        let a = ExitTarget::Function(plist.clone());
        let b = ExitTarget::Function(plist.clone());
        assert_eq!(a, b);
        let other = ExitTarget::Function(ParamList::new(vec![]));
        assert_ne!(a, other);
        assert_eq!(ExitTarget::Depth(2), ExitTarget::Depth(2));
        assert_ne!(ExitTarget::Depth(2), ExitTarget::Depth(1));
    }
}
