//! Source streams
//!
//! The evaluator consumes values from one of two stream shapes: a position
//! in a shared array (random access, re-peekable), or a forward-only
//! sequence of values handed in by the host (the variadic entry point).
//! Both expose the same three operations: prefetch (peek the current cell
//! without consuming), fetch-next (consume exactly one cell), and reify
//! (materialize a variadic remainder into an owned array).
//!
//! Prefetch may be called any number of times between advances. In array
//! mode the backing array may shrink out from under the index; that reads
//! as end-of-stream on the next prefetch, never as a fault.

use crate::array::Array;
use crate::symbol::Symbol;
use crate::value::{Series, Value};
use std::rc::Rc;

/// Marker prepended by truncated reification, standing in for the cells
/// that were already consumed and cannot be recovered.
pub const OPTIMIZED_OUT: &str = "--optimized-out--";

#[derive(Debug)]
pub enum Source {
    /// Random-access stream over a shared array.
    Array { series: Series },
    /// Forward-only stream with a one-cell peek buffer.
    Variadic {
        iter: std::vec::IntoIter<Value>,
        pending: Option<Value>,
    },
}

impl Source {
    pub fn from_series(series: Series) -> Source {
        Source::Array { series }
    }

    pub fn from_values(values: Vec<Value>) -> Source {
        Source::Variadic {
            iter: values.into_iter(),
            pending: None,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Source::Variadic { .. })
    }

    /// Current position for error reports; None for variadic streams that
    /// have not been reified.
    pub fn index(&self) -> Option<usize> {
        match self {
            Source::Array { series } => Some(series.index),
            Source::Variadic { .. } => None,
        }
    }

    /// Peek the current cell without consuming it.
    pub fn prefetch(&mut self) -> Option<Value> {
        match self {
            Source::Array { series } => series.at(0),
            Source::Variadic { iter, pending } => {
                if pending.is_none() {
                    *pending = iter.next();
                }
                pending.clone()
            }
        }
    }

    /// Consume exactly one cell.
    pub fn fetch_next(&mut self) {
        match self {
            Source::Array { series } => series.index += 1,
            Source::Variadic { iter, pending } => {
                if pending.take().is_none() {
                    let _ = iter.next();
                }
            }
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.prefetch().is_none()
    }

    /// Materialize the remainder into an owned, locked array and switch to
    /// array mode from this point on. Idempotent: an array stream returns
    /// its own position. With `truncated` set, a marker word records that
    /// a consumed prefix is missing.
    pub fn reify(&mut self, truncated: bool) -> Series {
        match self {
            Source::Array { series } => series.clone(),
            Source::Variadic { iter, pending } => {
                let mut cells = Vec::new();
                if truncated {
                    cells.push(Value::word(OPTIMIZED_OUT));
                }
                let start = cells.len();
                if let Some(v) = pending.take() {
                    cells.push(v);
                }
                cells.extend(iter.by_ref());
                let array = Array::rc(cells);
                array.lock();
                let series = Series::new(array, start);
                *self = Source::Array {
                    series: series.clone(),
                };
                series
            }
        }
    }
}

/// Intern the reification marker's symbol (exposed for debug output).
pub fn optimized_out_sym() -> Symbol {
    Symbol::intern(OPTIMIZED_OUT)
}
