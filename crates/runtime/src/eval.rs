//! The evaluator core
//!
//! One routine does the work: `do_next` consumes exactly one expression
//! from a source stream, dispatches it by kind, and writes one result.
//! Everything else here is the state the loop needs (the lib context, the
//! data and chunk stacks, the frame stack, counters and hooks) and the
//! public entry wrappers that set up a stream and delegate.
//!
//! Dispatch is an explicit loop whose single mutable binding is the value
//! being evaluated: every pass around the loop either produces an `Emit`
//! or re-enters with a new current value (the EVAL retrigger).

use crate::config::EvalConfig;
use crate::frame::CallFrame;
use crate::natives::NativeDef;
use crate::path::PathEmit;
use crate::signal::{BreakpointHook, CollectorHook, Roots};
use lith_core::{
    Array, ChunkStack, Context, DataStack, Error, ErrorKind, FuncBody, Function, NativeId, Series,
    Source, Symbol, Throw, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// A source stream shared between a frame and any variadic handles that
/// refer back into it.
pub(crate) type Feed = Rc<RefCell<Source>>;

/// Host-registered command/routine implementation.
pub type HostFn = Rc<dyn Fn(&mut Evaluator) -> Result<Emit, Error>>;

/// Result of one completed evaluation: a value, or a throw in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    Value(Value),
    Threw(Throw),
}

/// Result of one DO/NEXT attempt: as `Emit`, or end-of-stream before any
/// expression was found.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Value(Value),
    Threw(Throw),
    End,
}

/// Evaluation flags for the entry wrappers: the three pairwise-exclusive
/// public switches, as plain booleans.
#[derive(Debug, Clone, Copy)]
pub struct DoFlags {
    /// Evaluate to end-of-stream rather than one expression.
    pub to_end: bool,
    /// Permit infix lookahead after each expression.
    pub lookahead: bool,
    /// Evaluate arguments (off for APPLY-style literal calls).
    pub args_evaluate: bool,
}

impl DoFlags {
    pub const NEXT: DoFlags = DoFlags {
        to_end: false,
        lookahead: true,
        args_evaluate: true,
    };

    pub const TO_END: DoFlags = DoFlags {
        to_end: true,
        lookahead: true,
        args_evaluate: true,
    };

    /// Same flags, one step at a time.
    fn step(self) -> DoFlags {
        DoFlags {
            to_end: false,
            ..self
        }
    }
}

/// Outcome of `do_array`.
#[derive(Debug, Clone, PartialEq)]
pub enum DoResult {
    /// Reached end of stream; value is the last expression's result
    /// (unset if the stream held none).
    Done(Value),
    /// One expression evaluated; index is the next position.
    Next { value: Value, index: usize },
    Threw(Throw),
}

/// Outcome of `do_variadic`. `Next` is the incomplete-stream flag: one
/// expression evaluated with values still pending.
#[derive(Debug, Clone, PartialEq)]
pub enum VaResult {
    Done(Value),
    Next(Value),
    Threw(Throw),
}

pub struct Evaluator {
    /// The lib context: where the natives live and where tests bind.
    pub lib: Rc<Context>,
    pub config: EvalConfig,
    pub(crate) ds: DataStack,
    pub(crate) chunks: ChunkStack,
    pub(crate) frames: Vec<CallFrame>,
    /// Expression counter (the do-count tick of debug output).
    pub(crate) tick: u64,
    pub(crate) sig_countdown: u32,
    pub(crate) depth: usize,
    pub(crate) natives: Vec<NativeDef>,
    pub(crate) commands: Vec<HostFn>,
    pub(crate) routines: Vec<HostFn>,
    pub(crate) collector: Option<CollectorHook>,
    pub(crate) breakpoint: Option<BreakpointHook>,
    /// The EVAL native's table slot, special-cased by the loop.
    pub(crate) eval_id: Option<NativeId>,
    /// Prototypes for the definitional RETURN/LEAVE cells.
    pub(crate) return_native: Option<Rc<Function>>,
    pub(crate) leave_native: Option<Rc<Function>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Evaluator {
        let sig_countdown = config.poll_period;
        let mut ev = Evaluator {
            lib: Context::lib(),
            config,
            ds: DataStack::new(),
            chunks: ChunkStack::new(),
            frames: Vec::new(),
            tick: 0,
            sig_countdown,
            depth: 0,
            natives: Vec::new(),
            commands: Vec::new(),
            routines: Vec::new(),
            collector: None,
            breakpoint: None,
            eval_id: None,
            return_native: None,
            leave_native: None,
        };
        crate::natives::install(&mut ev);
        ev
    }

    // ------------------------------------------------------------------
    //                       public entry wrappers
    // ------------------------------------------------------------------

    /// Evaluate from an array source. One expression per call unless
    /// `flags.to_end`.
    pub fn do_array(
        &mut self,
        array: Rc<Array>,
        index: usize,
        flags: DoFlags,
    ) -> Result<DoResult, Error> {
        let feed: Feed = Rc::new(RefCell::new(Source::from_series(Series::new(array, index))));
        if flags.to_end {
            let mut last = Value::Unset;
            loop {
                match self.do_next(&feed, None, flags.step())? {
                    Step::End => return Ok(DoResult::Done(last)),
                    Step::Value(v) => last = v,
                    Step::Threw(t) => return Ok(DoResult::Threw(t)),
                }
            }
        } else {
            match self.do_next(&feed, None, flags)? {
                Step::End => Ok(DoResult::Done(Value::Unset)),
                Step::Value(value) => {
                    let index = feed.borrow().index().unwrap_or(0);
                    Ok(DoResult::Next { value, index })
                }
                Step::Threw(t) => Ok(DoResult::Threw(t)),
            }
        }
    }

    /// Evaluate from a forward-only sequence of values.
    pub fn do_variadic(&mut self, values: Vec<Value>, flags: DoFlags) -> Result<VaResult, Error> {
        let feed: Feed = Rc::new(RefCell::new(Source::from_values(values)));
        if flags.to_end {
            let mut last = Value::Unset;
            loop {
                match self.do_next(&feed, None, flags.step())? {
                    Step::End => return Ok(VaResult::Done(last)),
                    Step::Value(v) => last = v,
                    Step::Threw(t) => return Ok(VaResult::Threw(t)),
                }
            }
        } else {
            match self.do_next(&feed, None, flags)? {
                Step::End => Ok(VaResult::Done(Value::Unset)),
                Step::Value(v) => {
                    if feed.borrow_mut().at_end() {
                        Ok(VaResult::Done(v))
                    } else {
                        Ok(VaResult::Next(v))
                    }
                }
                Step::Threw(t) => Ok(VaResult::Threw(t)),
            }
        }
    }

    /// Call `applicand` with exactly the given literal arguments: one
    /// DO/NEXT with argument evaluation off. Surplus arguments are an
    /// error.
    pub fn apply_only(&mut self, applicand: Value, args: &[Value]) -> Result<Emit, Error> {
        let feed: Feed = Rc::new(RefCell::new(Source::from_values(args.to_vec())));
        let flags = DoFlags {
            to_end: false,
            lookahead: true,
            args_evaluate: false,
        };
        match self.do_next(&feed, Some(applicand), flags)? {
            Step::End => Ok(Emit::Value(Value::Unset)),
            Step::Value(v) => {
                if !feed.borrow_mut().at_end() {
                    return Err(ErrorKind::ApplyTooMany.into());
                }
                Ok(Emit::Value(v))
            }
            Step::Threw(t) => Ok(Emit::Threw(t)),
        }
    }

    /// Single-value evaluation: the escape used for GROUP!/GET-WORD!/
    /// GET-PATH! under a soft-quoted parameter.
    pub fn do_value(&mut self, value: &Value) -> Result<Emit, Error> {
        match value {
            Value::Group(s) => self.do_block(s),
            Value::GetWord(w) => Ok(Emit::Value(self.get_var(w)?)),
            Value::GetPath(s) => match self.eval_path(s, None, false)? {
                PathEmit::Value(v) => Ok(Emit::Value(v)),
                PathEmit::Threw(t) => Ok(Emit::Threw(t)),
                PathEmit::Function { func, .. } => Ok(Emit::Value(Value::Function(func))),
            },
            other => Ok(Emit::Value(other.clone())),
        }
    }

    /// Evaluate a whole nested block (groups, function bodies).
    pub(crate) fn do_block(&mut self, series: &Series) -> Result<Emit, Error> {
        let feed: Feed = Rc::new(RefCell::new(Source::from_series(series.clone())));
        let mut last = Value::Unset;
        loop {
            match self.do_next(&feed, None, DoFlags::NEXT)? {
                Step::End => return Ok(Emit::Value(last)),
                Step::Value(v) => last = v,
                Step::Threw(t) => return Ok(Emit::Threw(t)),
            }
        }
    }

    // ------------------------------------------------------------------
    //                            the core
    // ------------------------------------------------------------------

    /// Evaluate exactly one expression from `feed`. `first` preloads the
    /// current value without consuming from the stream (the APPLY seed).
    pub(crate) fn do_next(
        &mut self,
        feed: &Feed,
        first: Option<Value>,
        flags: DoFlags,
    ) -> Result<Step, Error> {
        if self.depth >= self.config.recursion_limit {
            return Err(ErrorKind::StackOverflow.into());
        }
        let expr_index = feed.borrow().index();
        self.depth += 1;
        let result = self.do_next_inner(feed, first, flags);
        self.depth -= 1;
        result.map_err(|e| self.annotate(e, feed, expr_index))
    }

    fn do_next_inner(
        &mut self,
        feed: &Feed,
        first: Option<Value>,
        flags: DoFlags,
    ) -> Result<Step, Error> {
        // Signals are handled strictly between expressions.
        self.poll_signals()?;
        self.tick = self.tick.wrapping_add(1);
        let expr_index = feed.borrow().index();

        let seeded = first.is_some();
        let current = match first {
            Some(v) => Some(v),
            None => feed.borrow_mut().prefetch(),
        };
        let Some(first_value) = current else {
            return Ok(Step::End);
        };
        if !seeded {
            feed.borrow_mut().fetch_next();
        }
        self.trace_step(&first_value, expr_index);

        let mut args_evaluate = flags.args_evaluate;
        let mut value = first_value;

        let emit = 'reevaluate: loop {
            match value {
                // ---- self-evaluating kinds ----
                v @ (Value::Unset
                | Value::None
                | Value::Logic(_)
                | Value::Integer(_)
                | Value::Decimal(_)
                | Value::Text(_)
                | Value::Block(_)
                | Value::Object(_)
                | Value::Refinement(_)
                | Value::Varargs(_)) => break 'reevaluate Emit::Value(v),

                // A bar between expressions evaluates to nothing; as a
                // consumable argument the gatherer rejects it.
                Value::Bar => break 'reevaluate Emit::Value(Value::Unset),
                Value::LitBar => break 'reevaluate Emit::Value(Value::Bar),

                Value::LitWord(w) => break 'reevaluate Emit::Value(Value::Word(w)),
                Value::LitPath(s) => break 'reevaluate Emit::Value(Value::Path(s)),

                Value::GetWord(ref w) => break 'reevaluate Emit::Value(self.get_var(w)?),

                Value::Group(ref s) => break 'reevaluate self.do_block(s)?,

                Value::Word(w) => {
                    let stored = self.get_var(&w)?;
                    match stored {
                        Value::Unset => return Err(ErrorKind::NoValue(w.sym).into()),
                        Value::Function(func) => {
                            if func.is_infix() {
                                // Infix is triggered only by lookahead; a
                                // prefix reference has no left argument.
                                return Err(ErrorKind::NoOpArg(w.sym).into());
                            }
                            if self.is_eval_native(&func) {
                                match self.retrigger(feed, flags)? {
                                    Step::Value(v) => {
                                        value = v;
                                        continue 'reevaluate;
                                    }
                                    Step::Threw(t) => break 'reevaluate Emit::Threw(t),
                                    Step::End => {
                                        return Err(ErrorKind::NoArg {
                                            func: func.name,
                                            param: Symbol::intern("value"),
                                        }
                                        .into());
                                    }
                                }
                            }
                            let ds_entry = self.ds.depth();
                            break 'reevaluate self.dispatch_call(
                                func,
                                w.sym,
                                feed,
                                args_evaluate,
                                ds_entry,
                                None,
                                None,
                            )?;
                        }
                        other => break 'reevaluate Emit::Value(other),
                    }
                }

                Value::SetWord(w) => {
                    let step = if args_evaluate {
                        self.do_next(feed, None, flags.step())?
                    } else {
                        match feed.borrow_mut().prefetch() {
                            None => Step::End,
                            Some(v) => {
                                feed.borrow_mut().fetch_next();
                                Step::Value(v)
                            }
                        }
                    };
                    match step {
                        Step::End => {
                            return Err(ErrorKind::NeedValue(Value::SetWord(w)).into());
                        }
                        Step::Threw(t) => break 'reevaluate Emit::Threw(t),
                        Step::Value(v) => {
                            if v.is_unset() {
                                return Err(ErrorKind::NeedValue(Value::SetWord(w)).into());
                            }
                            self.set_var(&w, v.clone())?;
                            break 'reevaluate Emit::Value(v);
                        }
                    }
                }

                Value::Path(ref s) => {
                    let ds_entry = self.ds.depth();
                    match self.eval_path(s, None, true)? {
                        PathEmit::Value(v) => {
                            if v.is_unset() {
                                return Err(ErrorKind::NoValue(path_label(s)).into());
                            }
                            break 'reevaluate Emit::Value(v);
                        }
                        PathEmit::Threw(t) => break 'reevaluate Emit::Threw(t),
                        PathEmit::Function { func, label } => {
                            if func.is_infix() {
                                self.ds.drop_to(ds_entry);
                                return Err(ErrorKind::NoOpArg(label).into());
                            }
                            if self.is_eval_native(&func) {
                                let only = self.take_eval_only(ds_entry)?;
                                match self.retrigger(feed, flags)? {
                                    Step::Value(v) => {
                                        if only {
                                            args_evaluate = false;
                                        }
                                        value = v;
                                        continue 'reevaluate;
                                    }
                                    Step::Threw(t) => break 'reevaluate Emit::Threw(t),
                                    Step::End => {
                                        return Err(ErrorKind::NoArg {
                                            func: func.name,
                                            param: Symbol::intern("value"),
                                        }
                                        .into());
                                    }
                                }
                            }
                            break 'reevaluate self.dispatch_call(
                                func,
                                label,
                                feed,
                                args_evaluate,
                                ds_entry,
                                None,
                                None,
                            )?;
                        }
                    }
                }

                Value::GetPath(ref s) => match self.eval_path(s, None, false)? {
                    PathEmit::Value(v) => break 'reevaluate Emit::Value(v),
                    PathEmit::Threw(t) => break 'reevaluate Emit::Threw(t),
                    PathEmit::Function { func, .. } => {
                        break 'reevaluate Emit::Value(Value::Function(func));
                    }
                },

                Value::SetPath(ref s) => {
                    // Known wart, kept deliberately: the right-hand side
                    // evaluates BEFORE the path's own groups run.
                    let step = if args_evaluate {
                        self.do_next(feed, None, flags.step())?
                    } else {
                        match feed.borrow_mut().prefetch() {
                            None => Step::End,
                            Some(v) => {
                                feed.borrow_mut().fetch_next();
                                Step::Value(v)
                            }
                        }
                    };
                    let rhs = match step {
                        Step::End => {
                            return Err(ErrorKind::NeedValue(value.clone()).into());
                        }
                        Step::Threw(t) => break 'reevaluate Emit::Threw(t),
                        Step::Value(v) => v,
                    };
                    if rhs.is_unset() {
                        return Err(ErrorKind::NeedValue(value.clone()).into());
                    }
                    match self.eval_path(s, Some(rhs.clone()), false)? {
                        PathEmit::Threw(t) => break 'reevaluate Emit::Threw(t),
                        _ => break 'reevaluate Emit::Value(rhs),
                    }
                }

                Value::Function(func) => {
                    if self.is_eval_native(&func) {
                        match self.retrigger(feed, flags)? {
                            Step::Value(v) => {
                                value = v;
                                continue 'reevaluate;
                            }
                            Step::Threw(t) => break 'reevaluate Emit::Threw(t),
                            Step::End => {
                                return Err(ErrorKind::NoArg {
                                    func: func.name,
                                    param: Symbol::intern("value"),
                                }
                                .into());
                            }
                        }
                    }
                    let ds_entry = self.ds.depth();
                    let label = anonymous();
                    break 'reevaluate self.dispatch_call(
                        func,
                        label,
                        feed,
                        args_evaluate,
                        ds_entry,
                        None,
                        None,
                    )?;
                }

                Value::Frame(ctx) => {
                    let Some(func) = ctx.owner() else {
                        return Err(Error::misc("frame value has no owning function"));
                    };
                    let ds_entry = self.ds.depth();
                    let label = func.name;
                    break 'reevaluate self.dispatch_call(
                        func,
                        label,
                        feed,
                        args_evaluate,
                        ds_entry,
                        None,
                        Some(ctx),
                    )?;
                }
            }
        };

        let mut out = match emit {
            Emit::Value(v) => v,
            Emit::Threw(t) => return Ok(Step::Threw(t)),
        };

        // ---- infix lookahead ----
        // One peek at the next cell after each completed expression. A word
        // bound to an infix function restarts dispatch with `out` as the
        // left-hand argument; anything else belongs to the next expression.
        if flags.lookahead {
            loop {
                let next = feed.borrow_mut().prefetch();
                let Some(Value::Word(w)) = next else { break };
                let Ok(Value::Function(func)) = self.get_var(&w) else {
                    break;
                };
                if !func.is_infix() {
                    break;
                }
                let Some((_, first_param)) = func.params.first_consumed() else {
                    return Err(Error::misc(format!(
                        "infix function {} takes no arguments",
                        func.name
                    )));
                };
                if !first_param.accepts(out.kind()) {
                    return Err(ErrorKind::ExpectArg {
                        func: func.name,
                        param: first_param.name(),
                        kind: out.kind(),
                    }
                    .into());
                }
                feed.borrow_mut().fetch_next();
                let ds_entry = self.ds.depth();
                match self.dispatch_call(
                    func,
                    w.sym,
                    feed,
                    args_evaluate,
                    ds_entry,
                    Some(out),
                    None,
                )? {
                    Emit::Value(v) => out = v,
                    Emit::Threw(t) => return Ok(Step::Threw(t)),
                }
            }
        }

        Ok(Step::Value(out))
    }

    /// The EVAL special case: consume one more DO/NEXT and splice the
    /// result back as the current value without advancing past it. The
    /// /ONLY suppression applies to the retriggered dispatch, not to this
    /// consumption.
    fn retrigger(&mut self, feed: &Feed, flags: DoFlags) -> Result<Step, Error> {
        self.do_next(feed, None, flags.step())
    }

    /// Pop EVAL's pushed path refinements: /only is honored, anything else
    /// is unknown.
    fn take_eval_only(&mut self, ds_entry: usize) -> Result<bool, Error> {
        let mut only = false;
        while self.ds.depth() > ds_entry {
            let Some(v) = self.ds.pop() else { break };
            match v.as_word() {
                Some(w) if w.sym.eq_fold(Symbol::intern("only")) => only = true,
                Some(w) => {
                    let sym = w.sym;
                    self.ds.drop_to(ds_entry);
                    return Err(ErrorKind::BadRefine(sym).into());
                }
                None => {
                    self.ds.drop_to(ds_entry);
                    return Err(Error::misc("invalid refinement for eval"));
                }
            }
        }
        Ok(only)
    }

    pub(crate) fn is_eval_native(&self, func: &Function) -> bool {
        matches!(func.body, FuncBody::Native(id) if Some(id) == self.eval_id)
    }

    /// Attach near-text from the failing expression's position. Reifies a
    /// variadic source so the position is visible at all.
    fn annotate(&mut self, e: Error, feed: &Feed, expr_index: Option<usize>) -> Error {
        if e.is_halt() || e.near.is_some() {
            return e;
        }
        let series = feed.borrow_mut().reify(true);
        let start = expr_index.unwrap_or(series.index);
        let stop = (start + 4).min(series.array.len());
        let text: Vec<String> = (start..stop)
            .filter_map(|i| series.array.get(i))
            .map(|v| v.to_string())
            .collect();
        e.with_near(format!("near: [{}]", text.join(" ")))
    }

    // ------------------------------------------------------------------
    //                      registration and access
    // ------------------------------------------------------------------

    /// Install a native and bind it in lib. Returns the function record.
    pub fn register_native(
        &mut self,
        name: &str,
        params: Vec<lith_core::TypeSet>,
        flags: u8,
        f: crate::natives::NativeFn,
    ) -> Rc<Function> {
        let id = self.natives.len();
        let sym = Symbol::intern(name);
        self.natives.push(NativeDef {
            name: sym,
            f,
            varless: None,
        });
        let func = Function::new(
            sym,
            lith_core::ParamList::new(params),
            flags,
            FuncBody::Native(id),
        );
        self.lib_set(name, Value::Function(func.clone()));
        func
    }

    /// Attach a frameless fast path to the most recently registered native.
    pub fn register_varless(&mut self, func: &Rc<Function>, f: crate::natives::VarlessFn) {
        if let FuncBody::Native(id) = func.body
            && let Some(def) = self.natives.get_mut(id)
        {
            def.varless = Some(f);
        }
    }

    /// Install a type-generic action and bind it in lib.
    pub fn register_action(
        &mut self,
        name: &str,
        kind: lith_core::ActionKind,
        params: Vec<lith_core::TypeSet>,
    ) -> Rc<Function> {
        let sym = Symbol::intern(name);
        let func = Function::new(sym, lith_core::ParamList::new(params), 0, FuncBody::Action(kind));
        self.lib_set(name, Value::Function(func.clone()));
        func
    }

    /// Register a host command.
    pub fn register_command(
        &mut self,
        name: &str,
        params: Vec<lith_core::TypeSet>,
        f: HostFn,
    ) -> Rc<Function> {
        let idx = self.commands.len();
        self.commands.push(f);
        let sym = Symbol::intern(name);
        let func = Function::new(sym, lith_core::ParamList::new(params), 0, FuncBody::Command(idx));
        self.lib_set(name, Value::Function(func.clone()));
        func
    }

    /// Register a host routine (foreign-call shim).
    pub fn register_routine(
        &mut self,
        name: &str,
        params: Vec<lith_core::TypeSet>,
        f: HostFn,
    ) -> Rc<Function> {
        let idx = self.routines.len();
        self.routines.push(f);
        let sym = Symbol::intern(name);
        let func = Function::new(sym, lith_core::ParamList::new(params), 0, FuncBody::Routine(idx));
        self.lib_set(name, Value::Function(func.clone()));
        func
    }

    pub fn lib_set(&self, name: &str, value: Value) {
        // Appending to lib cannot fail; the result is discarded by design.
        let _ = self.lib.set_by_sym(Symbol::intern(name), value);
    }

    pub fn lib_get(&self, name: &str) -> Option<Value> {
        self.lib.get_by_sym(Symbol::intern(name))
    }

    pub fn set_collector(&mut self, hook: CollectorHook) {
        self.collector = Some(hook);
    }

    pub fn set_breakpoint_hook(&mut self, hook: BreakpointHook) {
        self.breakpoint = Some(hook);
    }

    /// Root publication for an external collector.
    pub fn roots(&self) -> Roots<'_> {
        Roots {
            frames: &self.frames,
            data_stack: self.ds.as_slice(),
            tick: self.tick,
        }
    }

    // Counters, for hosts and balance-invariant tests.

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn data_stack_depth(&self) -> usize {
        self.ds.depth()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn live_chunks(&self) -> usize {
        self.chunks.live()
    }

    // ------------------------------------------------------------------
    //                  argument access for natives
    // ------------------------------------------------------------------

    /// Argument cell `index` of the running call. Absent slots read as
    /// unset, which is also what revoked and skipped slots hold.
    pub fn arg(&self, index: usize) -> Value {
        self.frames
            .last()
            .and_then(|f| f.args.get(index))
            .unwrap_or(Value::Unset)
    }

    /// Conditional truth of an argument (refinement presence checks).
    pub fn arg_is(&self, index: usize) -> bool {
        let v = self.arg(index);
        !v.is_unset() && v.is_truthy()
    }

    /// The running call's function.
    pub fn frame_func(&self) -> Option<Rc<Function>> {
        self.frames.last().map(|f| f.func.clone())
    }

    /// The running call's label symbol.
    pub fn frame_label(&self) -> Option<Symbol> {
        self.frames.last().map(|f| f.label)
    }
}

/// Label for functions reached without a word.
pub(crate) fn anonymous() -> Symbol {
    Symbol::intern("anonymous")
}

/// Error label for a path: its first word, if it has one.
pub(crate) fn path_label(series: &Series) -> Symbol {
    series
        .at(0)
        .as_ref()
        .and_then(|v| v.as_word().map(|w| w.sym))
        .unwrap_or_else(anonymous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_self_evaluate() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![Value::Integer(1), Value::text("hi")]);
        match ev.do_array(block, 0, DoFlags::TO_END).unwrap() {
            DoResult::Done(v) => assert_eq!(v, Value::text("hi")),
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[test]
    fn test_do_next_advances_index() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![Value::Integer(1), Value::Integer(2)]);
        match ev.do_array(block.clone(), 0, DoFlags::NEXT).unwrap() {
            DoResult::Next { value, index } => {
                assert_eq!(value, Value::Integer(1));
                assert_eq!(index, 1);
            }
            other => panic!("expected Next, got {:?}", other),
        }
        match ev.do_array(block, 1, DoFlags::NEXT).unwrap() {
            DoResult::Next { value, index } => {
                assert_eq!(value, Value::Integer(2));
                assert_eq!(index, 2);
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_stream_is_end() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![]);
        assert_eq!(
            ev.do_array(block, 0, DoFlags::NEXT).unwrap(),
            DoResult::Done(Value::Unset)
        );
    }

    #[test]
    fn test_bar_evaluates_to_unset_between_expressions() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![Value::Integer(5), Value::Bar]);
        assert_eq!(
            ev.do_array(block, 0, DoFlags::TO_END).unwrap(),
            DoResult::Done(Value::Unset)
        );
    }

    #[test]
    fn test_lit_bar_evaluates_to_bar() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![Value::LitBar]);
        assert_eq!(
            ev.do_array(block, 0, DoFlags::TO_END).unwrap(),
            DoResult::Done(Value::Bar)
        );
    }

    #[test]
    fn test_unbound_word_errors() {
        let mut ev = Evaluator::new();
        let block = Array::rc(vec![Value::word("nonesuch")]);
        let err = ev.do_array(block, 0, DoFlags::NEXT).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotBound(_)));
        // The error carries near-text for the host to display.
        assert!(err.near.is_some());
    }
}
