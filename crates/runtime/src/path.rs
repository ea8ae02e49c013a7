//! Path traversal
//!
//! Walks an any-path cell component by component. The head resolves
//! through the variable resolver; every later component is a selector,
//! where GROUP! components evaluate (and may throw) and GET-WORD!s
//! dereference. Selection itself dispatches on the current value's kind.
//!
//! When the walk lands on a function and the caller said it is ready for
//! refinements, traversal stops and the remaining components are canonized
//! refinement words, pushed to the data stack in reverse so the argument
//! gatherer pops them in callsite order.

use crate::eval::{Emit, Evaluator, path_label};
use lith_core::{
    Context, Error, ErrorKind, Function, Kind, Series, Symbol, Throw, Value,
};
use std::rc::Rc;

/// What a path walk produced.
#[derive(Debug)]
pub(crate) enum PathEmit {
    Value(Value),
    Threw(Throw),
    /// The path reached a function; its refinements (if any) are on the
    /// data stack.
    Function { func: Rc<Function>, label: Symbol },
}

impl Evaluator {
    /// Walk `series` as a path. With `setval`, the final component is
    /// assigned instead of selected. With `collect_refines`, a function
    /// encountered during the walk ends traversal and the rest of the
    /// path becomes refinements for the coming call.
    pub(crate) fn eval_path(
        &mut self,
        series: &Series,
        mut setval: Option<Value>,
        collect_refines: bool,
    ) -> Result<PathEmit, Error> {
        let elems = series.cells();
        if elems.is_empty() {
            return Err(Error::misc("empty path"));
        }
        let label = path_label(series);

        let mut current = match &elems[0] {
            Value::Word(w) => {
                let v = self.get_var(w)?;
                if v.is_unset() {
                    return Err(ErrorKind::NoValue(w.sym).into());
                }
                v
            }
            Value::GetWord(w) => self.get_var(w)?,
            other => other.clone(),
        };

        let mut idx = 1;
        while idx < elems.len() {
            if let Value::Function(func) = &current {
                if !collect_refines {
                    return Err(ErrorKind::BadPathType {
                        path: Value::Path(series.clone()),
                        kind: Kind::Function,
                    }
                    .into());
                }
                return match self.collect_refinements(&elems[idx..])? {
                    Some(t) => Ok(PathEmit::Threw(t)),
                    None => Ok(PathEmit::Function {
                        func: func.clone(),
                        label,
                    }),
                };
            }

            let selector = match &elems[idx] {
                Value::Group(s) => match self.do_block(s)? {
                    Emit::Value(v) => v,
                    Emit::Threw(t) => return Ok(PathEmit::Threw(t)),
                },
                Value::GetWord(w) => self.get_var(w)?,
                other => other.clone(),
            };

            let is_last = idx == elems.len() - 1;
            if is_last && let Some(v) = setval.take() {
                self.path_set(&current, &selector, v.clone())?;
                return Ok(PathEmit::Value(v));
            }
            current = self.path_select(&current, &selector, series)?;
            idx += 1;
        }

        if collect_refines && let Value::Function(func) = &current {
            return Ok(PathEmit::Function {
                func: func.clone(),
                label,
            });
        }
        Ok(PathEmit::Value(current))
    }

    /// Per-kind selection.
    fn path_select(
        &mut self,
        current: &Value,
        selector: &Value,
        path: &Series,
    ) -> Result<Value, Error> {
        match current {
            Value::Object(ctx) | Value::Frame(ctx) => match selector.as_word() {
                Some(w) => ctx
                    .get_by_sym(w.sym)
                    .ok_or_else(|| ErrorKind::BadPath(selector.clone()).into()),
                None => Err(ErrorKind::BadPath(selector.clone()).into()),
            },
            Value::Block(s) | Value::Group(s) => match selector {
                // Numeric pick is one-based; out of range reads as NONE.
                Value::Integer(n) => {
                    if *n >= 1 {
                        Ok(s.at((*n - 1) as usize).unwrap_or(Value::None))
                    } else {
                        Ok(Value::None)
                    }
                }
                // Word selection finds the element and answers its
                // follower, SELECT-style.
                sel if sel.as_word().is_some() => {
                    let cells = s.cells();
                    let found = cells.iter().position(|c| c == sel);
                    match found {
                        Some(at) => Ok(cells.get(at + 1).cloned().unwrap_or(Value::None)),
                        None => Ok(Value::None),
                    }
                }
                other => Err(ErrorKind::BadPath(other.clone()).into()),
            },
            other => Err(ErrorKind::BadPathType {
                path: Value::Path(path.clone()),
                kind: other.kind(),
            }
            .into()),
        }
    }

    /// Per-kind assignment for the final set-path component.
    fn path_set(&mut self, current: &Value, selector: &Value, v: Value) -> Result<(), Error> {
        match current {
            Value::Object(ctx) | Value::Frame(ctx) => match selector.as_word() {
                Some(w) => set_context_field(ctx, w.sym, v),
                None => Err(ErrorKind::BadPath(selector.clone()).into()),
            },
            Value::Block(s) | Value::Group(s) => match selector {
                Value::Integer(n) => {
                    if *n >= 1 && ((*n - 1) as usize) < s.len() {
                        s.array.set(s.index + (*n - 1) as usize, v)
                    } else {
                        Err(ErrorKind::BadPathRange(selector.clone()).into())
                    }
                }
                sel if sel.as_word().is_some() => {
                    let cells = s.cells();
                    match cells.iter().position(|c| c == sel) {
                        Some(at) if at + 1 < cells.len() => {
                            s.array.set(s.index + at + 1, v)
                        }
                        _ => Err(ErrorKind::BadPath(sel.clone()).into()),
                    }
                }
                other => Err(ErrorKind::BadPath(other.clone()).into()),
            },
            other => Err(ErrorKind::BadPathSet(other.clone()).into()),
        }
    }

    /// Canonize the function-tail components into refinement words and
    /// push them reversed. A throw from a GROUP! component propagates with
    /// nothing left on the stack.
    fn collect_refinements(&mut self, elems: &[Value]) -> Result<Option<Throw>, Error> {
        let mut syms: Vec<Symbol> = Vec::new();
        for elem in elems {
            let v = match elem {
                Value::Group(s) => match self.do_block(s)? {
                    Emit::Value(v) => v,
                    Emit::Threw(t) => return Ok(Some(t)),
                },
                Value::GetWord(w) => self.get_var(w)?,
                other => other.clone(),
            };
            match &v {
                Value::Word(w) | Value::Refinement(w) | Value::LitWord(w) => {
                    syms.push(w.sym.canon());
                }
                // NONE from a group simply contributes nothing.
                Value::None => {}
                other => {
                    return Err(Error::misc(format!(
                        "invalid refinement {} in path",
                        other
                    )));
                }
            }
        }
        for sym in syms.iter().rev() {
            self.ds
                .push(Value::Refinement(lith_core::Word::unbound(*sym)));
        }
        Ok(None)
    }
}

/// Frame fields are typed by their parameter; object fields take anything.
fn set_context_field(ctx: &Rc<Context>, sym: Symbol, v: Value) -> Result<(), Error> {
    let Some(index) = ctx.find(sym) else {
        return Err(ErrorKind::BadPath(Value::word(&sym.as_str())).into());
    };
    if let Some(key) = ctx.key(index)
        && !key.accepts(v.kind())
    {
        return Err(ErrorKind::BadFieldSet {
            field: sym,
            kind: v.kind(),
        }
        .into());
    }
    ctx.set(index, v)
}
