//! Call frames
//!
//! One `CallFrame` is pushed for each function invocation and popped when
//! the call completes (normally, by throw, or by error unwind). The frame
//! stack is the basis for relative word resolution, EXIT-FROM identity
//! matching, the diagnostics report, and root publication to the collector
//! hook.

use lith_core::{Context, Error, Function, Symbol, Value};
use std::rc::Rc;

/// Where a call's argument cells live.
#[derive(Debug)]
pub enum ArgStore {
    /// Cells on loan from the chunk stack. Fast, not reifiable.
    Chunk(Vec<Value>),
    /// A heap frame context: durable frames (closures) and executed
    /// FRAME! values. Survives the call if anything still holds the
    /// context.
    Context(Rc<Context>),
}

impl ArgStore {
    pub fn len(&self) -> usize {
        match self {
            ArgStore::Chunk(cells) => cells.len(),
            ArgStore::Context(ctx) => ctx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ArgStore::Chunk(cells) => cells.get(index).cloned(),
            ArgStore::Context(ctx) => ctx.get(index),
        }
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), Error> {
        match self {
            ArgStore::Chunk(cells) => match cells.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::misc("argument slot out of range")),
            },
            ArgStore::Context(ctx) => ctx.set(index, value),
        }
    }

    /// The frame context, if this storage is one.
    pub fn context(&self) -> Option<&Rc<Context>> {
        match self {
            ArgStore::Chunk(_) => None,
            ArgStore::Context(ctx) => Some(ctx),
        }
    }
}

/// Frame phases. Relative words resolve only against Running frames; a
/// frame still gathering its arguments is not yet visible to its own body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Gathering,
    Running,
}

#[derive(Debug)]
pub struct CallFrame {
    pub func: Rc<Function>,
    /// Label for trace and error text: the word the call came through, or
    /// an anonymous placeholder.
    pub label: Symbol,
    pub args: ArgStore,
    pub mode: FrameMode,
    /// Expression counter at call entry, for the diagnostics report.
    pub tick: u64,
    /// Data-stack depth on entry; the call must restore it.
    pub ds_entry: usize,
}

impl CallFrame {
    /// Class name for trace/report output.
    pub fn class_name(&self) -> &'static str {
        use lith_core::FuncBody::*;
        match &self.func.body {
            Native(_) => "native",
            Action(_) => "action",
            Command(_) => "command",
            Routine(_) => "routine",
            User { durable: false, .. } => "function",
            User { durable: true, .. } => "closure",
            Specialized { .. } => "specialized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lith_core::{FuncBody, ParamList, TypeSet};

    #[test]
    fn test_chunk_store_get_set() {
        let mut store = ArgStore::Chunk(vec![Value::Bar, Value::Bar]);
        assert_eq!(store.len(), 2);
        store.set(1, Value::Integer(5)).unwrap();
        assert_eq!(store.get(1), Some(Value::Integer(5)));
        assert_eq!(store.get(0), Some(Value::Bar));
        assert!(store.get(2).is_none());
        assert!(store.set(2, Value::None).is_err());
    }

    #[test]
    fn test_context_store_shares_storage() {
        let func = Function::new(
            Symbol::intern("f"),
            ParamList::new(vec![TypeSet::any_value().named(Symbol::intern("a"))]),
            0,
            FuncBody::Native(0),
        );
        let ctx = Context::frame(func, vec![Value::Integer(1)]);
        let mut store = ArgStore::Context(ctx.clone());
        store.set(0, Value::Integer(9)).unwrap();
        // The write is visible through the shared context.
        assert_eq!(ctx.get(0), Some(Value::Integer(9)));
        assert!(store.context().is_some());
    }
}
