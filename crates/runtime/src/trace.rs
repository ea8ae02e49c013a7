//! Trace hook
//!
//! Depth-indented logging of each expression step and each call
//! entry/return, routed through the `tracing` crate so hosts choose the
//! subscriber. Tracing is off unless `EvalConfig::trace` is set; the
//! guards below keep the cost of the disabled case to one branch.

use crate::eval::Evaluator;
use lith_core::{Symbol, Value};
use tracing::trace;

impl Evaluator {
    fn indent(&self) -> String {
        "    ".repeat(self.frames.len().min(16))
    }

    /// One expression is about to evaluate.
    pub(crate) fn trace_step(&self, value: &Value, index: Option<usize>) {
        if !self.config.trace {
            return;
        }
        match index {
            Some(i) => trace!(tick = self.tick, "{}{}: {}", self.indent(), i, value),
            None => trace!(tick = self.tick, "{}--: {}", self.indent(), value),
        }
    }

    /// Entering a function call.
    pub(crate) fn trace_call(&self, label: Symbol) {
        if !self.config.trace {
            return;
        }
        trace!(tick = self.tick, "{}--> {}", self.indent(), label);
    }

    /// A call returned normally with `value`.
    pub(crate) fn trace_return(&self, label: Symbol, value: &Value) {
        if !self.config.trace {
            return;
        }
        trace!(tick = self.tick, "{}<-- {} == {}", self.indent(), label, value);
    }

    /// A call is unwinding with a throw.
    pub(crate) fn trace_throw(&self, label: Symbol) {
        if !self.config.trace {
            return;
        }
        trace!(tick = self.tick, "{}<-- {} (threw)", self.indent(), label);
    }
}
