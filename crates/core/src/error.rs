//! Evaluator errors
//!
//! Errors are the "fail" channel: they abort the current expression and
//! propagate to the nearest host trap (in Rust terms, `Err` rides `?` out of
//! the entry wrapper). They are distinct from throws, which are ordinary
//! values with a name/payload that unwind cooperatively frame by frame and
//! can be caught by identity (see `throw`).
//!
//! The taxonomy is closed; `Misc` is the only free-form escape hatch.

use crate::symbol::Symbol;
use crate::value::{Kind, Value};
use std::fmt;

#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Word resolves to an unset variable.
    NoValue(Symbol),
    /// Word has no binding at all.
    NotBound(Symbol),
    /// Source stream ended before a required argument.
    NoArg { func: Symbol, param: Symbol },
    /// A specialized refinement slot held unset.
    NoRefine { func: Symbol, refine: Symbol },
    /// Refinement name not among the function's parameters.
    BadRefine(Symbol),
    /// A set argument under a refinement that was already revoked.
    BadRefineRevoke(Symbol),
    /// Path selector not found in the target.
    BadPath(Value),
    /// Leftmost path value cannot be picked from at all.
    BadPathType { path: Value, kind: Kind },
    /// Target kind refuses set-path assignment.
    BadPathSet(Value),
    /// The selected field refused the assigned value.
    BadFieldSet { field: Symbol, kind: Kind },
    /// Numeric path selector out of range.
    BadPathRange(Value),
    /// Argument failed its parameter's typeset.
    ExpectArg { func: Symbol, param: Symbol, kind: Kind },
    /// Set-word or set-path with nothing (or unset) on the right.
    NeedValue(Value),
    /// Infix function referenced with no left-hand value.
    NoOpArg(Symbol),
    /// Specialization tried to inject a value into a pure local.
    LocalInjection { func: Symbol, param: Symbol },
    /// An expression barrier appeared where an argument was required.
    ExpressionBarrier,
    /// Apply given more arguments than the function takes.
    ApplyTooMany,
    /// A spec or frame exceeded a fixed limit.
    TooLong(String),
    /// Evaluator recursion guard tripped.
    StackOverflow,
    /// Host hook misuse or a bad registered command/routine index.
    BadSysFunc(String),
    /// Mutation of a locked or fixed-size series.
    Locked,
    /// Cooperative halt requested via the signal mask.
    Halt,
    Misc(String),
}

/// An evaluator error, optionally annotated with "near" source text from
/// the expression that was in flight when it was raised.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub near: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Error {
        Error { kind, near: None }
    }

    pub fn halt() -> Error {
        Error::new(ErrorKind::Halt)
    }

    pub fn misc(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Misc(msg.into()))
    }

    pub fn is_halt(&self) -> bool {
        matches!(self.kind, ErrorKind::Halt)
    }

    /// Attach near-text if none was recorded deeper in the call.
    pub fn with_near(mut self, near: String) -> Error {
        if self.near.is_none() {
            self.near = Some(near);
        }
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NoValue(w) => write!(f, "{} has no value", w),
            ErrorKind::NotBound(w) => write!(f, "{} is not bound to a context", w),
            ErrorKind::NoArg { func, param } => {
                write!(f, "{} is missing its {} argument", func, param)
            }
            ErrorKind::NoRefine { func, refine } => {
                write!(f, "{} has no value for its /{} refinement", func, refine)
            }
            ErrorKind::BadRefine(w) => write!(f, "incompatible or invalid refinement /{}", w),
            ErrorKind::BadRefineRevoke(w) => {
                write!(f, "inconsistent revocation of refinement /{}", w)
            }
            ErrorKind::BadPath(sel) => write!(f, "cannot find {} in path", sel),
            ErrorKind::BadPathType { path, kind } => {
                write!(f, "path {} is not valid for {} values", path, kind.name())
            }
            ErrorKind::BadPathSet(path) => write!(f, "cannot set {} in path", path),
            ErrorKind::BadFieldSet { field, kind } => {
                write!(f, "field {} refuses {} values", field, kind.name())
            }
            ErrorKind::BadPathRange(sel) => write!(f, "path index {} out of range", sel),
            ErrorKind::ExpectArg { func, param, kind } => {
                write!(f, "{} does not allow {} for its {} argument", func, kind.name(), param)
            }
            ErrorKind::NeedValue(target) => write!(f, "{} needs a value", target),
            ErrorKind::NoOpArg(w) => {
                write!(f, "infix function {} has no left-hand argument", w)
            }
            ErrorKind::LocalInjection { func, param } => {
                write!(f, "cannot specialize pure local {} of {}", param, func)
            }
            ErrorKind::ExpressionBarrier => write!(f, "barrier hit while gathering arguments"),
            ErrorKind::ApplyTooMany => write!(f, "too many arguments for apply"),
            ErrorKind::TooLong(what) => write!(f, "{} is too long", what),
            ErrorKind::StackOverflow => write!(f, "evaluation stack overflow"),
            ErrorKind::BadSysFunc(what) => write!(f, "invalid system function: {}", what),
            ErrorKind::Locked => write!(f, "series is locked (read-only)"),
            ErrorKind::Halt => write!(f, "halted by request"),
            ErrorKind::Misc(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(near) = &self.near {
            write!(f, " ({})", near)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
