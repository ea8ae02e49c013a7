//! Contexts: keys + vars storage for words
//!
//! A context pairs a key list (typesets carrying symbols) with a var list
//! (cells) of equal length. The lib context, user objects, and durable
//! function frames are all contexts; a frame context additionally remembers
//! which function owns it, which is what EXIT-FROM matches against.

use crate::error::Error;
use crate::function::Function;
use crate::symbol::Symbol;
use crate::typeset::TypeSet;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Object,
    Lib,
    Frame,
}

#[derive(Debug)]
pub struct Context {
    kind: ContextKind,
    keys: RefCell<Vec<TypeSet>>,
    vars: RefCell<Vec<Value>>,
    /// Owning function, for Frame contexts.
    func: RefCell<Option<Rc<Function>>>,
}

impl Context {
    pub fn new(kind: ContextKind) -> Rc<Context> {
        Rc::new(Context {
            kind,
            keys: RefCell::new(Vec::new()),
            vars: RefCell::new(Vec::new()),
            func: RefCell::new(None),
        })
    }

    pub fn object() -> Rc<Context> {
        Context::new(ContextKind::Object)
    }

    pub fn lib() -> Rc<Context> {
        Context::new(ContextKind::Lib)
    }

    /// A frame context for one invocation of `func`, seeded with `vars`
    /// (which must parallel the function's parameter list).
    pub fn frame(func: Rc<Function>, vars: Vec<Value>) -> Rc<Context> {
        let keys = func.params.params.clone();
        Rc::new(Context {
            kind: ContextKind::Frame,
            keys: RefCell::new(keys),
            vars: RefCell::new(vars),
            func: RefCell::new(Some(func)),
        })
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn owner(&self) -> Option<Rc<Function>> {
        self.func.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.keys.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot index of `sym`, matching case-insensitively.
    pub fn find(&self, sym: Symbol) -> Option<usize> {
        self.keys
            .borrow()
            .iter()
            .position(|k| k.sym.is_some_and(|s| s.eq_fold(sym)))
    }

    /// Append a new key with an unset var, returning its slot index.
    pub fn append(&self, sym: Symbol) -> usize {
        let mut keys = self.keys.borrow_mut();
        let mut vars = self.vars.borrow_mut();
        keys.push(TypeSet::any_type().named(sym));
        vars.push(Value::Unset);
        keys.len() - 1
    }

    /// Find-or-append, for binding with new-word addition.
    pub fn find_or_append(&self, sym: Symbol) -> usize {
        match self.find(sym) {
            Some(i) => i,
            None => self.append(sym),
        }
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.vars.borrow().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) -> Result<(), Error> {
        let mut vars = self.vars.borrow_mut();
        match vars.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::misc("context slot out of range")),
        }
    }

    pub fn key(&self, index: usize) -> Option<TypeSet> {
        self.keys.borrow().get(index).cloned()
    }

    pub fn key_sym(&self, index: usize) -> Option<Symbol> {
        self.keys.borrow().get(index).and_then(|k| k.sym)
    }

    /// All key symbols, in slot order.
    pub fn words(&self) -> Vec<Symbol> {
        self.keys.borrow().iter().filter_map(|k| k.sym).collect()
    }

    /// Snapshot of the var list.
    pub fn vars_vec(&self) -> Vec<Value> {
        self.vars.borrow().clone()
    }

    /// Resolve a symbol straight to its value.
    pub fn get_by_sym(&self, sym: Symbol) -> Option<Value> {
        self.find(sym).and_then(|i| self.get(i))
    }

    /// Set a symbol's slot, appending the word if missing.
    pub fn set_by_sym(&self, sym: Symbol, value: Value) -> Result<(), Error> {
        let index = self.find_or_append(sym);
        self.set(index, value)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_find() {
        let ctx = Context::object();
        let x = Symbol::intern("x");
        let i = ctx.append(x);
        assert_eq!(ctx.find(x), Some(i));
        assert_eq!(ctx.get(i), Some(Value::Unset));
        ctx.set(i, Value::Integer(7)).unwrap();
        assert_eq!(ctx.get_by_sym(x), Some(Value::Integer(7)));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let ctx = Context::object();
        ctx.append(Symbol::intern("Foo"));
        assert!(ctx.find(Symbol::intern("foo")).is_some());
        assert!(ctx.find(Symbol::intern("FOO")).is_some());
        assert!(ctx.find(Symbol::intern("bar")).is_none());
    }

    #[test]
    fn test_set_by_sym_appends() {
        let ctx = Context::object();
        ctx.set_by_sym(Symbol::intern("n"), Value::Integer(1)).unwrap();
        assert_eq!(ctx.len(), 1);
        ctx.set_by_sym(Symbol::intern("n"), Value::Integer(2)).unwrap();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get_by_sym(Symbol::intern("n")), Some(Value::Integer(2)));
    }
}
