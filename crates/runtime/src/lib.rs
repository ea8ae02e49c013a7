//! Lith Runtime: the expression evaluator
//!
//! One evaluator instance per task consumes a linear stream of values one
//! expression at a time: dispatch by kind, argument frames with full type
//! checking, definitional exits caught by invocation identity, and
//! cooperative signal handling between expressions.
//!
//! # Modules
//!
//! - `eval`: the core loop, entry wrappers, and `Evaluator` itself
//! - `bind`: variable resolution and the binding utilities
//! - `path`: path traversal with mid-expression sub-evaluation
//! - `args`: argument gathering (refinements, quoting, revocation,
//!   variadics, pickups)
//! - `dispatch`: function invocation by class and exit arbitration
//! - `frame`: call records and argument storage
//! - `signal`: the cooperative signal mask and poller
//! - `reduce`: REDUCE / COMPOSE / CONSTRUCT drivers
//! - `trace`: depth-indented expression/call tracing
//! - `report`: diagnostics snapshots of the running evaluator
//! - `config`: host-tunable evaluator configuration
//! - `natives`, `ops`, `control`, `funcs`, `series`: the built-in surface
//!
//! # Example
//!
//! ```rust
//! use lith_core::{Array, Value};
//! use lith_runtime::{DoFlags, DoResult, Evaluator};
//!
//! let mut ev = Evaluator::new();
//! let block = Array::rc(vec![Value::Integer(40)]);
//! match ev.do_array(block, 0, DoFlags::TO_END).unwrap() {
//!     DoResult::Done(v) => assert_eq!(v, Value::Integer(40)),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod args;
pub mod bind;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod eval;
pub mod frame;
pub mod funcs;
pub mod natives;
pub mod ops;
pub mod path;
pub mod reduce;
pub mod report;
pub mod series;
pub mod signal;
pub mod trace;

pub use config::EvalConfig;
pub use eval::{DoFlags, DoResult, Emit, Evaluator, HostFn, VaResult};
pub use frame::{ArgStore, CallFrame, FrameMode};
pub use funcs::make_function;
pub use natives::{NativeDef, NativeFn, VarlessFn};
pub use reduce::ReduceOpts;
pub use report::{FrameSnapshot, Report};
pub use signal::{
    BreakpointHook, CollectorHook, Roots, SIG_HALT, SIG_INTERRUPT, SIG_RECYCLE, clear_signal,
    pending_signals, set_signal,
};
#[cfg(all(unix, feature = "signals"))]
pub use signal::wire_sigint;

// The value model, re-exported for embedders.
pub use lith_core as core;
pub use lith_core::{
    Array, Binding, Context, ContextKind, Error, ErrorKind, ExitTarget, FuncBody, Function, Kind,
    ParamClass, ParamList, Series, Source, Symbol, Throw, TypeSet, Value, Varargs, Word,
};
