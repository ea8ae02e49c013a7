//! Argument gathering
//!
//! Fills the top call frame's argument slots from the callsite, walking
//! the parameter list and the slots in parallel. Slots start seeded: BAR
//! means "acquire from the callsite"; anything else is a specialized value
//! that stays (the execute-frame mode). One pass runs in parameter order;
//! refinements requested out of declaration order are left as pickups and
//! completed by jumping the cursor back in a second pass, so refinement
//! arguments always map positionally to their own refinement no matter
//! what order the path named them in.
//!
//! Revocation: a refinement whose first argument evaluates to unset is
//! retroactively turned off (its slot becomes NONE); every later argument
//! under it must then also be unset.

use crate::eval::{DoFlags, Emit, Evaluator, Feed, Step};
use lith_core::{
    Error, ErrorKind, Kind, ParamClass, Symbol, Throw, TypeSet, Value, Varargs, Word,
};
use std::rc::Rc;

/// Refinement cursor, driving how argument slots after a refinement
/// parameter are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refine {
    /// Before any refinement: ordinary required arguments.
    Bare,
    /// Refinement absent: its arguments are skipped (unset).
    Skip,
    /// Refinement present; the index is its own slot, for revocation.
    Active(usize),
    /// Refinement requested out of order: skip its arguments now, a
    /// pickup pass will come back for them.
    Pickup,
    /// Refinement revoked by an unset first argument; remaining arguments
    /// must be unset too.
    Revoking(usize),
}

enum Fulfilled {
    Value(Value),
    Threw(Throw),
}

impl Evaluator {
    /// Fill the top frame's slots. Returns `Ok(Some(throw))` when a
    /// sub-evaluation threw; the caller unwinds the call.
    pub(crate) fn gather_args(
        &mut self,
        feed: &Feed,
        args_evaluate: bool,
        execute_frame: bool,
        mut infix_left: Option<Value>,
    ) -> Result<Option<Throw>, Error> {
        let fidx = self.frames.len() - 1;
        let func = self.frames[fidx].func.clone();
        let params = func.params.clone();
        let n = params.params.len();
        let fname = func.name;
        let ds_entry = self.frames[fidx].ds_entry;
        let legacy_none = self.config.legacy_refinement_none;
        // An infix function's remaining arguments must not look ahead, or
        // evaluation would stop being left-to-right.
        let sub_lookahead = !func.is_infix();

        let mut refine = Refine::Bare;
        let mut pickups: Vec<usize> = Vec::new();
        let mut in_pickup = false;
        let mut i = 0usize;

        'fill: loop {
            while i < n {
                let param = params.params[i].clone();
                let seeded = self.frames[fidx].args.get(i).unwrap_or(Value::Bar);
                let prefilled = execute_frame && !matches!(seeded, Value::Bar);

                match param.class {
                    ParamClass::PureLocal => {
                        if prefilled {
                            if !seeded.is_unset() {
                                self.ds.drop_to(ds_entry);
                                return Err(ErrorKind::LocalInjection {
                                    func: fname,
                                    param: param.name(),
                                }
                                .into());
                            }
                        } else {
                            self.set_arg(fidx, i, Value::Unset)?;
                        }
                    }

                    ParamClass::Refinement => {
                        if in_pickup {
                            // End of the picked-up refinement's argument
                            // run; hand control back to the pickup queue.
                            break;
                        }
                        if prefilled {
                            if seeded.is_unset() {
                                self.ds.drop_to(ds_entry);
                                return Err(ErrorKind::NoRefine {
                                    func: fname,
                                    refine: param.name(),
                                }
                                .into());
                            }
                            if seeded.is_truthy() {
                                self.set_arg(fidx, i, refinement_word(param.name()))?;
                                refine = Refine::Active(i);
                            } else {
                                self.set_arg(fidx, i, Value::None)?;
                                refine = Refine::Skip;
                            }
                        } else {
                            refine =
                                self.match_refinement(fidx, i, param.name(), ds_entry, &mut pickups)?;
                        }
                    }

                    ParamClass::Variadic => {
                        if !prefilled {
                            let handle = Value::Varargs(Varargs {
                                source: feed.clone(),
                                param: Rc::new(param.clone()),
                            });
                            self.set_arg(fidx, i, handle)?;
                        }
                    }

                    ParamClass::Normal | ParamClass::HardQuote | ParamClass::SoftQuote => {
                        match refine {
                            Refine::Skip => {
                                if !prefilled {
                                    let fill =
                                        if legacy_none { Value::None } else { Value::Unset };
                                    self.set_arg(fidx, i, fill)?;
                                }
                                i += 1;
                                continue;
                            }
                            Refine::Pickup => {
                                // Left seeded; the pickup pass fills it.
                                i += 1;
                                continue;
                            }
                            _ => {}
                        }

                        let fetched = if prefilled {
                            seeded
                        } else if let Some(left) = infix_left.take() {
                            left
                        } else {
                            match self.fulfill_one(feed, &param, args_evaluate, sub_lookahead, fname)
                            {
                                Ok(Fulfilled::Value(v)) => v,
                                Ok(Fulfilled::Threw(t)) => {
                                    self.ds.drop_to(ds_entry);
                                    return Ok(Some(t));
                                }
                                Err(e) => {
                                    self.ds.drop_to(ds_entry);
                                    return Err(e);
                                }
                            }
                        };

                        match refine {
                            Refine::Active(r) => {
                                if fetched.is_unset() {
                                    // First unset under an active refinement
                                    // revokes it.
                                    self.set_arg(fidx, r, Value::None)?;
                                    self.set_arg(fidx, i, Value::Unset)?;
                                    refine = Refine::Revoking(r);
                                } else {
                                    if let Err(e) = typecheck(&param, &fetched, fname) {
                                        self.ds.drop_to(ds_entry);
                                        return Err(e);
                                    }
                                    self.set_arg(fidx, i, fetched)?;
                                }
                            }
                            Refine::Revoking(r) => {
                                if fetched.is_unset() {
                                    self.set_arg(fidx, i, Value::Unset)?;
                                } else {
                                    self.ds.drop_to(ds_entry);
                                    return Err(ErrorKind::BadRefineRevoke(
                                        params.params[r].name(),
                                    )
                                    .into());
                                }
                            }
                            _ => {
                                if let Err(e) = typecheck(&param, &fetched, fname) {
                                    self.ds.drop_to(ds_entry);
                                    return Err(e);
                                }
                                self.set_arg(fidx, i, fetched)?;
                            }
                        }
                    }
                }
                i += 1;
            }

            // First pass (or a pickup segment) is done; resume any
            // refinement noted for out-of-order pickup.
            match pickups.pop() {
                Some(p) => {
                    let sym = params.params[p].name();
                    self.claim_refinement(ds_entry, sym)?;
                    self.set_arg(fidx, p, refinement_word(sym))?;
                    refine = Refine::Active(p);
                    in_pickup = true;
                    i = p + 1;
                    continue 'fill;
                }
                None => break,
            }
        }

        // Anything still pushed names a refinement the function lacks.
        if self.ds.depth() > ds_entry {
            let extra = self.ds.top().cloned();
            self.ds.drop_to(ds_entry);
            let sym = extra
                .as_ref()
                .and_then(|v| v.as_word().map(|w| w.sym))
                .unwrap_or_else(|| Symbol::intern("?"));
            return Err(ErrorKind::BadRefine(sym).into());
        }
        Ok(None)
    }

    /// Match one unspecialized refinement parameter against the pending
    /// run pushed by the path evaluator.
    fn match_refinement(
        &mut self,
        fidx: usize,
        slot: usize,
        sym: Symbol,
        ds_entry: usize,
        pickups: &mut Vec<usize>,
    ) -> Result<Refine, Error> {
        if self.ds.depth() == ds_entry {
            self.set_arg(fidx, slot, Value::None)?;
            return Ok(Refine::Skip);
        }
        // In-order case: the next requested refinement is this parameter.
        if let Some(Value::Refinement(w)) = self.ds.top()
            && w.sym.eq_fold(sym)
        {
            self.ds.pop();
            self.set_arg(fidx, slot, refinement_word(sym))?;
            return Ok(Refine::Active(slot));
        }
        // Out-of-order: requested, but not next. Note the slot and leave
        // the marker for the pickup pass to claim.
        for d in ds_entry..self.ds.depth() {
            if let Some(Value::Refinement(w)) = self.ds.get(d)
                && w.sym.eq_fold(sym)
            {
                pickups.push(slot);
                return Ok(Refine::Pickup);
            }
        }
        // Not requested at all.
        self.set_arg(fidx, slot, Value::None)?;
        Ok(Refine::Skip)
    }

    /// Remove a pickup's marker from the pending run.
    fn claim_refinement(&mut self, ds_entry: usize, sym: Symbol) -> Result<(), Error> {
        for d in ds_entry..self.ds.depth() {
            if let Some(Value::Refinement(w)) = self.ds.get(d)
                && w.sym.eq_fold(sym)
            {
                self.ds.remove(d);
                return Ok(());
            }
        }
        Err(Error::misc(format!("lost pickup refinement /{}", sym)))
    }

    /// Acquire one argument from the source per the parameter's class.
    fn fulfill_one(
        &mut self,
        feed: &Feed,
        param: &TypeSet,
        args_evaluate: bool,
        sub_lookahead: bool,
        fname: Symbol,
    ) -> Result<Fulfilled, Error> {
        let next = feed.borrow_mut().prefetch();

        // A bar is an expression barrier: it never feeds an argument,
        // except into a hard quote that asks for BAR! by type.
        if matches!(next, Some(Value::Bar)) {
            if param.class == ParamClass::HardQuote && param.accepts(Kind::Bar) {
                feed.borrow_mut().fetch_next();
                return Ok(Fulfilled::Value(Value::Bar));
            }
            return Err(ErrorKind::ExpressionBarrier.into());
        }

        match param.class {
            ParamClass::HardQuote => match next {
                None => end_of_stream(param, fname),
                Some(v) => {
                    feed.borrow_mut().fetch_next();
                    Ok(Fulfilled::Value(v))
                }
            },
            ParamClass::SoftQuote => match next {
                None => end_of_stream(param, fname),
                Some(v @ (Value::Group(_) | Value::GetWord(_) | Value::GetPath(_)))
                    if args_evaluate =>
                {
                    feed.borrow_mut().fetch_next();
                    match self.do_value(&v)? {
                        Emit::Value(v) => Ok(Fulfilled::Value(v)),
                        Emit::Threw(t) => Ok(Fulfilled::Threw(t)),
                    }
                }
                Some(v) => {
                    feed.borrow_mut().fetch_next();
                    Ok(Fulfilled::Value(v))
                }
            },
            ParamClass::Normal => {
                if args_evaluate {
                    let flags = DoFlags {
                        to_end: false,
                        lookahead: sub_lookahead,
                        args_evaluate: true,
                    };
                    match self.do_next(feed, None, flags)? {
                        Step::End => end_of_stream(param, fname),
                        Step::Value(v) => Ok(Fulfilled::Value(v)),
                        Step::Threw(t) => Ok(Fulfilled::Threw(t)),
                    }
                } else {
                    match next {
                        None => end_of_stream(param, fname),
                        Some(v) => {
                            feed.borrow_mut().fetch_next();
                            Ok(Fulfilled::Value(v))
                        }
                    }
                }
            }
            _ => Err(Error::misc("parameter class cannot be fulfilled")),
        }
    }

    pub(crate) fn set_arg(&mut self, fidx: usize, index: usize, value: Value) -> Result<(), Error> {
        self.frames[fidx].args.set(index, value)
    }

    /// Pull one value through a variadic handle, honoring the parameter's
    /// class and typeset. Exhausted callsites answer NONE.
    pub(crate) fn take_vararg(&mut self, handle: &Varargs) -> Result<Emit, Error> {
        let feed = handle.source.clone();
        let fname = self
            .frames
            .last()
            .map(|f| f.func.name)
            .unwrap_or_else(|| Symbol::intern("take"));
        if feed.borrow_mut().at_end() {
            return Ok(Emit::Value(Value::None));
        }
        // Pulled values evaluate like normal arguments; the handle's
        // typeset still applies.
        let pull = (*handle.param).clone().classed(ParamClass::Normal);
        match self.fulfill_one(&feed, &pull, true, true, fname) {
            Ok(Fulfilled::Value(v)) => {
                typecheck(&pull, &v, fname)?;
                Ok(Emit::Value(v))
            }
            Ok(Fulfilled::Threw(t)) => Ok(Emit::Threw(t)),
            Err(e) => Err(e),
        }
    }
}

fn refinement_word(sym: Symbol) -> Value {
    Value::Word(Word::unbound(sym))
}

fn typecheck(param: &TypeSet, v: &Value, fname: Symbol) -> Result<(), Error> {
    if param.accepts(v.kind()) {
        return Ok(());
    }
    Err(ErrorKind::ExpectArg {
        func: fname,
        param: param.name(),
        kind: v.kind(),
    }
    .into())
}

fn end_of_stream(param: &TypeSet, fname: Symbol) -> Result<Fulfilled, Error> {
    if param.allows_unset() {
        Ok(Fulfilled::Value(Value::Unset))
    } else {
        Err(ErrorKind::NoArg {
            func: fname,
            param: param.name(),
        }
        .into())
    }
}
