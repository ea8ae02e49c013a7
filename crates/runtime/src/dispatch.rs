//! Function dispatch
//!
//! Once the evaluator knows it is calling a function it comes here:
//! allocate argument storage (chunk for ordinary calls, heap context for
//! durable ones), push the call frame, gather arguments, inject the
//! definitional RETURN/LEAVE cells, invoke the body by class, release the
//! storage, and arbitrate any throw passing through by exit-target
//! identity. Every path out of this module pops the frame it pushed and
//! releases the chunk it acquired.

use crate::eval::{Emit, Evaluator, Feed};
use crate::frame::{ArgStore, CallFrame, FrameMode};
use lith_core::{
    Context, Error, ErrorKind, ExitTarget, FuncBody, Function, Series, Symbol, Throw, Value,
};
use std::rc::Rc;

impl Evaluator {
    /// Dispatch one call. `infix_left` carries a lookahead result into the
    /// first consuming slot; `frame_ctx` executes an existing FRAME!'s
    /// storage in place.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn dispatch_call(
        &mut self,
        func: Rc<Function>,
        label: Symbol,
        feed: &Feed,
        args_evaluate: bool,
        ds_entry: usize,
        infix_left: Option<Value>,
        frame_ctx: Option<Rc<Context>>,
    ) -> Result<Emit, Error> {
        self.trace_call(label);

        // Varless fast path: no frame at all, the native pulls straight
        // from the source. Only when nothing special is in flight.
        if func.is_varless()
            && args_evaluate
            && !self.config.trace
            && self.ds.depth() == ds_entry
            && infix_left.is_none()
            && frame_ctx.is_none()
            && let FuncBody::Native(id) = func.body
        {
            let varless = self.natives.get(id).and_then(|def| def.varless);
            if let Some(varless) = varless {
                let emit = varless(self, feed)?;
                if let Emit::Value(v) = &emit {
                    self.trace_return(label, v);
                }
                return Ok(emit);
            }
        }

        // One level of specialization unwraps here; SPECIALIZE flattens
        // chains at construction so the base is never itself specialized.
        let (live, prefill) = match &func.body {
            FuncBody::Specialized { base, frame } => (base.clone(), Some(frame.clone())),
            _ => (func.clone(), None),
        };
        let params = live.params.clone();
        let n = params.params.len();
        if n > 255 {
            self.ds.drop_to(ds_entry);
            return Err(ErrorKind::TooLong("argument frame".into()).into());
        }

        let execute_frame = prefill.is_some() || frame_ctx.is_some();
        let durable = matches!(&live.body, FuncBody::User { durable: true, .. });

        let store = match frame_ctx {
            Some(ctx) => {
                if ctx.len() != n {
                    self.ds.drop_to(ds_entry);
                    return Err(ErrorKind::BadSysFunc(
                        "frame does not match its function".into(),
                    )
                    .into());
                }
                ArgStore::Context(ctx)
            }
            None => {
                let seed: Vec<Value> = match &prefill {
                    Some(frame) => {
                        if frame.len() != n {
                            self.ds.drop_to(ds_entry);
                            return Err(ErrorKind::BadSysFunc(
                                "specialization frame does not match its function".into(),
                            )
                            .into());
                        }
                        frame.vars_vec()
                    }
                    None => vec![Value::Bar; n],
                };
                if durable {
                    ArgStore::Context(Context::frame(live.clone(), seed))
                } else {
                    let mut chunk = self.chunks.acquire(n);
                    chunk.extend(seed);
                    ArgStore::Chunk(chunk)
                }
            }
        };

        self.frames.push(CallFrame {
            func: live.clone(),
            label,
            args: store,
            mode: FrameMode::Gathering,
            tick: self.tick,
            ds_entry,
        });

        let result = self.run_call(feed, args_evaluate, execute_frame, infix_left);

        // Unwind bookkeeping happens on every path: pop the frame, give
        // the chunk back, restore the data stack. A frame context that was
        // captured as a FRAME! value stays alive through its other owners.
        let Some(frame) = self.frames.pop() else {
            return Err(Error::misc("frame stack underflow"));
        };
        let frame_identity = frame.args.context().cloned();
        if let ArgStore::Chunk(chunk) = frame.args {
            self.chunks.release(chunk);
        }
        self.ds.drop_to(ds_entry);

        let emit = match result {
            Ok(emit) => emit,
            Err(e) => {
                self.trace_throw(label);
                return Err(e);
            }
        };

        let out = match emit {
            Emit::Value(v) => v,
            Emit::Threw(throw) => {
                match self.arbitrate_exit(throw, &live, frame_identity.as_ref()) {
                    Ok(caught_payload) => caught_payload,
                    Err(passing) => {
                        self.trace_throw(label);
                        return Ok(Emit::Threw(passing));
                    }
                }
            }
        };

        // Output discipline for the definitional-exit classes.
        let out = if live.has_leave() { Value::Unset } else { out };
        if live.has_return()
            && let Some(ret) = params.find(Symbol::intern("return"))
            && !params.params[ret].accepts(out.kind())
        {
            return Err(ErrorKind::ExpectArg {
                func: live.name,
                param: Symbol::intern("return"),
                kind: out.kind(),
            }
            .into());
        }

        self.trace_return(label, &out);
        Ok(Emit::Value(out))
    }

    /// Match a passing throw against this frame. `Ok(payload)` means it
    /// was caught here; `Err(throw)` hands it (possibly with a counted
    /// depth decremented) back to the caller.
    fn arbitrate_exit(
        &self,
        mut throw: Throw,
        live: &Rc<Function>,
        frame_identity: Option<&Rc<Context>>,
    ) -> Result<Value, Throw> {
        let Some(target) = &throw.target else {
            // Named and plain throws pass through; CATCH and the loop
            // natives handle them above.
            return Err(throw);
        };
        let caught = match target {
            ExitTarget::Function(plist) => Rc::ptr_eq(plist, &live.params),
            ExitTarget::Frame(ctx) => frame_identity.is_some_and(|id| Rc::ptr_eq(id, ctx)),
            ExitTarget::Depth(depth) => *depth == 1,
        };
        if caught {
            return Ok(throw.payload);
        }
        if let Some(ExitTarget::Depth(depth)) = throw.target {
            throw.target = Some(ExitTarget::Depth(depth - 1));
        }
        Err(throw)
    }

    /// Gather arguments, switch to running, install definitional exits,
    /// and invoke the body by class.
    fn run_call(
        &mut self,
        feed: &Feed,
        args_evaluate: bool,
        execute_frame: bool,
        infix_left: Option<Value>,
    ) -> Result<Emit, Error> {
        if let Some(throw) = self.gather_args(feed, args_evaluate, execute_frame, infix_left)? {
            return Ok(Emit::Threw(throw));
        }

        let fidx = self.frames.len() - 1;
        self.frames[fidx].mode = FrameMode::Running;
        self.install_exit_cells(fidx)?;

        let func = self.frames[fidx].func.clone();
        match &func.body {
            FuncBody::Native(id) => {
                let Some(def) = self.natives.get(*id) else {
                    return Err(ErrorKind::BadSysFunc(format!("native #{}", id)).into());
                };
                (def.f)(self)
            }
            FuncBody::Action(kind) => self.run_action(*kind),
            FuncBody::Command(idx) => {
                let Some(command) = self.commands.get(*idx).cloned() else {
                    return Err(ErrorKind::BadSysFunc(format!("command #{}", idx)).into());
                };
                command(self)
            }
            FuncBody::Routine(idx) => {
                let Some(routine) = self.routines.get(*idx).cloned() else {
                    return Err(ErrorKind::BadSysFunc(format!("routine #{}", idx)).into());
                };
                routine(self)
            }
            FuncBody::User { body, durable } => {
                if *durable {
                    let Some(ctx) = self.frames[fidx].args.context().cloned() else {
                        return Err(Error::misc("durable frame without context storage"));
                    };
                    let body = crate::bind::copy_bound_to_frame(body, &func.params, &ctx);
                    self.do_block(&Series::new(body, 0))
                } else {
                    self.do_block(&Series::new(body.clone(), 0))
                }
            }
            FuncBody::Specialized { .. } => {
                Err(Error::misc("specialization was not flattened before dispatch"))
            }
        }
    }

    /// Write the RETURN/LEAVE magic cells into their reserved locals,
    /// carrying the identity a matching throw must exit from: the
    /// paramlist for chunk frames, the context for durable ones.
    fn install_exit_cells(&mut self, fidx: usize) -> Result<(), Error> {
        let func = self.frames[fidx].func.clone();
        if !func.has_return() && !func.has_leave() {
            return Ok(());
        }
        let target = match self.frames[fidx].args.context() {
            Some(ctx) => ExitTarget::Frame(ctx.clone()),
            None => ExitTarget::Function(func.params.clone()),
        };
        if func.has_return()
            && let Some(proto) = self.return_native.clone()
            && let Some(slot) = func.params.find(Symbol::intern("return"))
        {
            let cell = Value::Function(proto.with_exit_target(target.clone()));
            self.frames[fidx].args.set(slot, cell)?;
        }
        if func.has_leave()
            && let Some(proto) = self.leave_native.clone()
            && let Some(slot) = func.params.find(Symbol::intern("leave"))
        {
            let cell = Value::Function(proto.with_exit_target(target));
            self.frames[fidx].args.set(slot, cell)?;
        }
        Ok(())
    }
}
