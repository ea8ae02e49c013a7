//! Lith Core: the value model of the Lith evaluator
//!
//! This crate holds the data the evaluator works on, with none of the
//! evaluation machinery: the runtime crate layers the evaluator on top.
//!
//! Key design principles:
//! - Value: what the language talks about, one exhaustive tagged enum
//! - Shared storage (arrays, contexts, functions) behind `Rc`; identity
//!   comparisons are pointer comparisons
//! - Throws are data, errors are `Result`; no flag bits on cells
//!
//! # Modules
//!
//! - `symbol`: interned, case-insensitively canonized spellings
//! - `value`: the tagged cell (`Value`, `Word`, `Series`, `Kind`)
//! - `array`: shared cell sequences with evaluation-safety flags
//! - `context`: keys + vars storage (lib, objects, durable frames)
//! - `typeset`: parameter descriptors and the type-check predicate
//! - `function`: immutable function records with paramlist identity
//! - `source`: the two source-stream shapes and reification
//! - `stack`: the shared data stack with balance discipline
//! - `chunk`: size-segregated argument-frame allocator
//! - `throw`: throw records and exit-target identities
//! - `error`: the closed error taxonomy

pub mod array;
pub mod chunk;
pub mod context;
pub mod error;
pub mod function;
pub mod source;
pub mod stack;
pub mod symbol;
pub mod throw;
pub mod typeset;
pub mod value;

pub use array::{Array, FIXED_SIZE, LOCKED, VARLIST, VOIDS_LEGAL};
pub use chunk::ChunkStack;
pub use context::{Context, ContextKind};
pub use error::{Error, ErrorKind};
pub use function::{
    ActionKind, FuncBody, Function, HAS_LEAVE, HAS_RETURN, INFIX, NativeId, ParamList, VARLESS,
};
pub use source::{OPTIMIZED_OUT, Source};
pub use stack::DataStack;
pub use symbol::Symbol;
pub use throw::{ExitTarget, Throw};
pub use typeset::{ParamClass, TypeSet};
pub use value::{Binding, Kind, Series, Value, Varargs, Word};
