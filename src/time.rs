//! The injectable "now" used by every `at: Option<f64>` parameter in the
//! public API. The crate never reads the wall clock directly outside of
//! this module, so tests can pin time the same way `gaugetest.py` patches
//! `time.time`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

type ClockFn = Rc<dyn Fn() -> f64>;

fn system_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_secs_f64()
}

thread_local! {
    static DEFAULT_CLOCK: RefCell<ClockFn> = RefCell::new(Rc::new(system_clock));
}

/// Reads the process-wide default clock.
pub fn now() -> f64 {
    DEFAULT_CLOCK.with(|cell| (cell.borrow())())
}

/// Installs a new process-wide default clock, permanently.
///
/// Prefer [`ClockOverride::install`] in tests, which restores the previous
/// clock on drop.
pub fn set_default_clock(clock: impl Fn() -> f64 + 'static) {
    DEFAULT_CLOCK.with(|cell| *cell.borrow_mut() = Rc::new(clock));
}

/// Resolves an optional time argument against the default clock.
pub fn at_or_now(at: Option<f64>) -> f64 {
    at.unwrap_or_else(now)
}

/// RAII guard that overrides the default clock for its lifetime, restoring
/// whatever clock was installed before it. Mirrors the `t(timestamp)`
/// context manager used throughout the original test suite to freeze time.
pub struct ClockOverride {
    previous: ClockFn,
}

impl ClockOverride {
    pub fn install(clock: impl Fn() -> f64 + 'static) -> Self {
        let previous = DEFAULT_CLOCK.with(|cell| cell.borrow().clone());
        DEFAULT_CLOCK.with(|cell| *cell.borrow_mut() = Rc::new(clock));
        ClockOverride { previous }
    }

    /// Convenience for the common case of pinning a single fixed instant.
    pub fn fixed(at: f64) -> Self {
        Self::install(move || at)
    }
}

impl Drop for ClockOverride {
    fn drop(&mut self) {
        let previous = self.previous.clone();
        DEFAULT_CLOCK.with(|cell| *cell.borrow_mut() = previous);
    }
}
