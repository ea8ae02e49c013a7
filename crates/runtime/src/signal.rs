//! Cooperative signals
//!
//! A process-wide atomic bitmask carries recycle / interrupt / halt
//! requests. Anything may set bits (another thread, a Unix signal
//! handler, the host), but they are only ever acted on by the evaluator at
//! DO/NEXT boundaries, every `poll_period` expressions. Handling takes the
//! whole mask at once (swap to zero), so a signal raised while another is
//! being handled waits for the next boundary rather than reentering.
//!
//! Only atomic flag operations happen outside the evaluator; all real work
//! runs on the evaluator's own thread. This is the same flag-then-poll
//! shape the rest of the system uses for Unix signals.

use crate::eval::Evaluator;
use crate::frame::CallFrame;
use lith_core::{Error, ErrorKind, Value};
use std::sync::atomic::{AtomicU32, Ordering};

/// Request a garbage-collection cycle at the next boundary.
pub const SIG_RECYCLE: u32 = 1 << 0;
/// Request the interactive breakpoint at the next boundary.
pub const SIG_INTERRUPT: u32 = 1 << 1;
/// Request a halt unwind at the next boundary.
pub const SIG_HALT: u32 = 1 << 2;

static SIGNAL_MASK: AtomicU32 = AtomicU32::new(0);

/// Raise signal bits. Safe from any thread and from signal handlers.
pub fn set_signal(bits: u32) {
    SIGNAL_MASK.fetch_or(bits, Ordering::SeqCst);
}

/// Clear signal bits without handling them.
pub fn clear_signal(bits: u32) {
    SIGNAL_MASK.fetch_and(!bits, Ordering::SeqCst);
}

/// Currently pending bits.
pub fn pending_signals() -> u32 {
    SIGNAL_MASK.load(Ordering::SeqCst)
}

/// Atomically take every pending bit, masking further delivery of the
/// same requests while they are handled.
fn take_signals() -> u32 {
    SIGNAL_MASK.swap(0, Ordering::SeqCst)
}

/// Root snapshot passed to the collector hook: everything the evaluator
/// holds live at a suspension point.
pub struct Roots<'a> {
    pub frames: &'a [CallFrame],
    pub data_stack: &'a [Value],
    pub tick: u64,
}

/// Host hook run for SIG_RECYCLE.
pub type CollectorHook = Box<dyn FnMut(&Roots<'_>)>;

/// Host hook run for SIG_INTERRUPT (and the BREAKPOINT native). Returns
/// the resume value; a signal-driven entry must resume with unset.
pub type BreakpointHook = Box<dyn FnMut(&mut Evaluator) -> Result<Value, Error>>;

impl Evaluator {
    /// Countdown one expression; on zero, handle any pending signals.
    /// Called only between expressions, never inside one.
    pub(crate) fn poll_signals(&mut self) -> Result<(), Error> {
        if self.sig_countdown > 0 {
            self.sig_countdown -= 1;
            return Ok(());
        }
        self.sig_countdown = self.config.poll_period;

        let sigs = take_signals();
        if sigs == 0 {
            return Ok(());
        }

        if sigs & SIG_RECYCLE != 0 {
            self.run_collector();
        }

        if sigs & SIG_INTERRUPT != 0 {
            let resumed = self.enter_breakpoint()?;
            if !resumed.is_unset() {
                return Err(ErrorKind::BadSysFunc(
                    "breakpoint hook must resume with unset".into(),
                )
                .into());
            }
        }

        if sigs & SIG_HALT != 0 {
            return Err(Error::halt());
        }

        Ok(())
    }

    fn run_collector(&mut self) {
        // The hook is taken out for the call so it can receive a root view
        // borrowed from the evaluator.
        let Some(mut hook) = self.collector.take() else {
            return;
        };
        {
            let roots = Roots {
                frames: &self.frames,
                data_stack: self.ds.as_slice(),
                tick: self.tick,
            };
            hook(&roots);
        }
        self.collector = Some(hook);
    }

    /// Enter the host breakpoint, a recursive re-entry of the evaluator
    /// under the host's trap. Without a hook installed this is a no-op
    /// resume.
    pub(crate) fn enter_breakpoint(&mut self) -> Result<Value, Error> {
        let Some(mut hook) = self.breakpoint.take() else {
            return Ok(Value::Unset);
        };
        let result = hook(self);
        self.breakpoint = Some(hook);
        result
    }
}

/// Route SIGINT to the interrupt bit, so a Ctrl-C lands at the next
/// expression boundary instead of killing the process. The handler only
/// touches the atomic mask, which is async-signal-safe.
#[cfg(all(unix, feature = "signals"))]
pub fn wire_sigint() -> Result<(), Error> {
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            set_signal(SIG_INTERRUPT);
        })
    }
    .map(|_| ())
    .map_err(|e| Error::misc(format!("cannot install SIGINT handler: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests that drive the poller are serialized; this one
    // only exercises the mask primitives and fully unwinds them.
    #[test]
    fn test_set_take_clear() {
        clear_signal(u32::MAX);
        set_signal(SIG_RECYCLE | SIG_HALT);
        assert_eq!(pending_signals() & SIG_RECYCLE, SIG_RECYCLE);
        assert_eq!(take_signals() & SIG_HALT, SIG_HALT);
        assert_eq!(pending_signals(), 0);
    }
}
