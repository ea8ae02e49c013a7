//! Value: the tagged cell of the evaluator
//!
//! Every unit of source and every evaluation result is one `Value`: an
//! exhaustive enum, so the evaluator's dispatch is a `match` the compiler
//! checks for us.
//!
//! Values that reference shared storage (blocks, contexts, functions) hold
//! `Rc` payloads: cloning a value is O(1) and never copies the series. The
//! evaluator is single-threaded by design, so `Rc` (not `Arc`) is the right
//! ownership tool.
//!
//! Two states that are deliberately NOT values:
//! - there is no "end" variant; source streams yield `Option<Value>`,
//! - there is no "thrown" flag; throw state travels in a separate sum
//!   (`Step`/`Emit` in the runtime crate carry a `Throw` alongside `Value`).

use crate::array::Array;
use crate::context::Context;
use crate::function::{Function, ParamList};
use crate::source::Source;
use crate::symbol::Symbol;
use crate::typeset::TypeSet;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Type tag for a value. At most 64 kinds so a typeset is one `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Unset,
    None,
    Logic,
    Integer,
    Decimal,
    Text,
    Block,
    Group,
    Path,
    SetPath,
    GetPath,
    LitPath,
    Word,
    SetWord,
    GetWord,
    LitWord,
    Refinement,
    Bar,
    LitBar,
    Function,
    Frame,
    Object,
    Varargs,
}

impl Kind {
    /// Datatype name, in the traditional `name!` spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Unset => "unset!",
            Kind::None => "none!",
            Kind::Logic => "logic!",
            Kind::Integer => "integer!",
            Kind::Decimal => "decimal!",
            Kind::Text => "string!",
            Kind::Block => "block!",
            Kind::Group => "group!",
            Kind::Path => "path!",
            Kind::SetPath => "set-path!",
            Kind::GetPath => "get-path!",
            Kind::LitPath => "lit-path!",
            Kind::Word => "word!",
            Kind::SetWord => "set-word!",
            Kind::GetWord => "get-word!",
            Kind::LitWord => "lit-word!",
            Kind::Refinement => "refinement!",
            Kind::Bar => "bar!",
            Kind::LitBar => "lit-bar!",
            Kind::Function => "function!",
            Kind::Frame => "frame!",
            Kind::Object => "object!",
            Kind::Varargs => "varargs!",
        }
    }
}

/// Where a word's storage lives.
///
/// Context bindings point at a slot of a materialized context (lib, object,
/// or a durable frame). Relative bindings name a parameter of a function;
/// they resolve against the most recent running invocation of that function
/// on the frame stack.
#[derive(Debug, Clone)]
pub enum Binding {
    Unbound,
    Context { ctx: Rc<Context>, index: usize },
    Relative { params: Rc<ParamList>, index: usize },
}

/// Symbol + binding: the payload of all the word kinds.
#[derive(Debug, Clone)]
pub struct Word {
    pub sym: Symbol,
    pub binding: Binding,
}

impl Word {
    pub fn unbound(sym: Symbol) -> Word {
        Word {
            sym,
            binding: Binding::Unbound,
        }
    }

    pub fn bound(sym: Symbol, ctx: Rc<Context>, index: usize) -> Word {
        Word {
            sym,
            binding: Binding::Context { ctx, index },
        }
    }

    pub fn relative(sym: Symbol, params: Rc<ParamList>, index: usize) -> Word {
        Word {
            sym,
            binding: Binding::Relative { params, index },
        }
    }
}

// Word equality is spelling equality (case-folded); bindings are invisible
// to EQUAL?-style comparison.
impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.sym.eq_fold(other.sym)
    }
}

/// A position inside a shared array: the payload of blocks, groups, and
/// all the path kinds.
#[derive(Debug, Clone)]
pub struct Series {
    pub array: Rc<Array>,
    pub index: usize,
}

impl Series {
    pub fn new(array: Rc<Array>, index: usize) -> Series {
        Series { array, index }
    }

    /// Remaining length from this position. Zero when the backing array has
    /// been truncated behind the index.
    pub fn len(&self) -> usize {
        self.array.len().saturating_sub(self.index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at offset `n` from this position, or None past the tail.
    pub fn at(&self, n: usize) -> Option<Value> {
        self.array.get(self.index + n)
    }

    /// The remaining cells, cloned out.
    pub fn cells(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|n| self.at(n)).collect()
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.array, &other.array) && self.index == other.index {
            return true;
        }
        self.cells() == other.cells()
    }
}

/// Handle installed for a variadic parameter: refers back to the calling
/// frame's source stream so the function body can keep pulling values from
/// the callsite after the ordinary arguments are gathered.
#[derive(Debug, Clone)]
pub struct Varargs {
    pub source: Rc<RefCell<Source>>,
    pub param: Rc<TypeSet>,
}

impl PartialEq for Varargs {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}

/// The tagged cell.
#[derive(Debug, Clone)]
pub enum Value {
    Unset,
    None,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Text(Rc<str>),
    Block(Series),
    Group(Series),
    Path(Series),
    SetPath(Series),
    GetPath(Series),
    LitPath(Series),
    Word(Word),
    SetWord(Word),
    GetWord(Word),
    LitWord(Word),
    Refinement(Word),
    Bar,
    LitBar,
    Function(Rc<Function>),
    Frame(Rc<Context>),
    Object(Rc<Context>),
    Varargs(Varargs),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Unset => Kind::Unset,
            Value::None => Kind::None,
            Value::Logic(_) => Kind::Logic,
            Value::Integer(_) => Kind::Integer,
            Value::Decimal(_) => Kind::Decimal,
            Value::Text(_) => Kind::Text,
            Value::Block(_) => Kind::Block,
            Value::Group(_) => Kind::Group,
            Value::Path(_) => Kind::Path,
            Value::SetPath(_) => Kind::SetPath,
            Value::GetPath(_) => Kind::GetPath,
            Value::LitPath(_) => Kind::LitPath,
            Value::Word(_) => Kind::Word,
            Value::SetWord(_) => Kind::SetWord,
            Value::GetWord(_) => Kind::GetWord,
            Value::LitWord(_) => Kind::LitWord,
            Value::Refinement(_) => Kind::Refinement,
            Value::Bar => Kind::Bar,
            Value::LitBar => Kind::LitBar,
            Value::Function(_) => Kind::Function,
            Value::Frame(_) => Kind::Frame,
            Value::Object(_) => Kind::Object,
            Value::Varargs(_) => Kind::Varargs,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Conditional truth: everything except NONE and false is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::None | Value::Logic(false))
    }

    /// Shorthand: an unbound word value.
    pub fn word(name: &str) -> Value {
        Value::Word(Word::unbound(Symbol::intern(name)))
    }

    /// Shorthand: a block over a fresh array.
    pub fn block(cells: Vec<Value>) -> Value {
        Value::Block(Series::new(Array::rc(cells), 0))
    }

    /// Shorthand: a group over a fresh array.
    pub fn group(cells: Vec<Value>) -> Value {
        Value::Group(Series::new(Array::rc(cells), 0))
    }

    /// Shorthand: a text value.
    pub fn text(s: &str) -> Value {
        Value::Text(Rc::from(s))
    }

    /// The word payload of any word-kind value.
    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Value::Word(w)
            | Value::SetWord(w)
            | Value::GetWord(w)
            | Value::LitWord(w)
            | Value::Refinement(w) => Some(w),
            _ => None,
        }
    }

    /// The series payload of any array-kind value.
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Block(s)
            | Value::Group(s)
            | Value::Path(s)
            | Value::SetPath(s)
            | Value::GetPath(s)
            | Value::LitPath(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Unset, Unset) | (None, None) | (Bar, Bar) | (LitBar, LitBar) => true,
            (Logic(a), Logic(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Integer(a), Decimal(b)) | (Decimal(b), Integer(a)) => *a as f64 == *b,
            (Text(a), Text(b)) => a == b,
            (Block(a), Block(b))
            | (Group(a), Group(b))
            | (Path(a), Path(b))
            | (SetPath(a), SetPath(b))
            | (GetPath(a), GetPath(b))
            | (LitPath(a), LitPath(b)) => a == b,
            (Word(a), Word(b))
            | (SetWord(a), SetWord(b))
            | (GetWord(a), GetWord(b))
            | (LitWord(a), LitWord(b))
            | (Refinement(a), Refinement(b)) => a == b,
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Frame(a), Frame(b)) | (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            (Varargs(a), Varargs(b)) => a == b,
            _ => false,
        }
    }
}

fn fmt_series(f: &mut fmt::Formatter<'_>, s: &Series, sep: &str) -> fmt::Result {
    let cells = s.cells();
    for (i, v) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => write!(f, "#[unset!]"),
            Value::None => write!(f, "none"),
            Value::Logic(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Block(s) => {
                write!(f, "[")?;
                fmt_series(f, s, " ")?;
                write!(f, "]")
            }
            Value::Group(s) => {
                write!(f, "(")?;
                fmt_series(f, s, " ")?;
                write!(f, ")")
            }
            Value::Path(s) => fmt_series(f, s, "/"),
            Value::SetPath(s) => {
                fmt_series(f, s, "/")?;
                write!(f, ":")
            }
            Value::GetPath(s) => {
                write!(f, ":")?;
                fmt_series(f, s, "/")
            }
            Value::LitPath(s) => {
                write!(f, "'")?;
                fmt_series(f, s, "/")
            }
            Value::Word(w) => write!(f, "{}", w.sym),
            Value::SetWord(w) => write!(f, "{}:", w.sym),
            Value::GetWord(w) => write!(f, ":{}", w.sym),
            Value::LitWord(w) => write!(f, "'{}", w.sym),
            Value::Refinement(w) => write!(f, "/{}", w.sym),
            Value::Bar => write!(f, "|"),
            Value::LitBar => write!(f, "'|"),
            Value::Function(func) => write!(f, "#[function! {}]", func.name),
            Value::Frame(_) => write!(f, "#[frame!]"),
            Value::Object(_) => write!(f, "#[object!]"),
            Value::Varargs(_) => write!(f, "#[varargs!]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(Value::Integer(1).kind(), Kind::Integer);
        assert_eq!(Value::word("x").kind(), Kind::Word);
        assert_eq!(Value::block(vec![]).kind(), Kind::Block);
        assert_eq!(Value::Bar.kind(), Kind::Bar);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::text("").is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(!Value::Logic(false).is_truthy());
        assert!(Value::Logic(true).is_truthy());
    }

    #[test]
    fn test_word_equality_folds_case() {
        let a = Value::word("Foo");
        let b = Value::word("foo");
        assert_eq!(a, b);
        assert_ne!(a, Value::word("bar"));
    }

    #[test]
    fn test_block_equality_is_structural() {
        let a = Value::block(vec![Value::Integer(1), Value::word("x")]);
        let b = Value::block(vec![Value::Integer(1), Value::word("x")]);
        assert_eq!(a, b);
        let c = Value::block(vec![Value::Integer(2)]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_mold_basics() {
        let v = Value::block(vec![
            Value::Integer(1),
            Value::word("x"),
            Value::SetWord(Word::unbound(Symbol::intern("y"))),
        ]);
        assert_eq!(v.to_string(), "[1 x y:]");
    }
}
