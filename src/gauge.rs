//! The public handle type: a scalar that evolves deterministically under
//! its attached momenta, clamped between a `max` and `min` that may
//! themselves be other gauges.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::boundary::Side;
use crate::determination::Determination;
use crate::error::GaugeError;
use crate::line::Line;
use crate::momentum::{momentum_events, Momentum, MomentumEvent, MomentumSpec};
use crate::time::{self, at_or_now};

/// How a mutator should behave when the requested change would leave the
/// gauge outside of its current range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Reject the mutation and leave the gauge untouched.
    Error,
    /// Apply the mutation regardless of the resulting value.
    Ok,
    /// `Ok` if the gauge is currently in range, `Error` otherwise.
    Once,
    /// Pull the requested value back to whichever bound it would have
    /// crossed, never moving further past a bound already exceeded.
    Clamp,
}

/// A gauge's `max` or `min`: either fixed, or tracking another gauge's
/// value at every instant.
#[derive(Clone)]
pub enum Limit {
    Const(f64),
    Gauge(Gauge),
}

impl From<f64> for Limit {
    fn from(value: f64) -> Self {
        Limit::Const(value)
    }
}

impl From<Gauge> for Limit {
    fn from(gauge: Gauge) -> Self {
        Limit::Gauge(gauge)
    }
}

impl Limit {
    fn base_time_floor(&self, at: f64) -> f64 {
        match self {
            Limit::Const(_) => at,
            Limit::Gauge(g) => at.min(g.base_time()),
        }
    }

    /// The limit's shape across all time, as a stream of [`Line`] pieces:
    /// a single flat line for a constant, or the dependee's own
    /// determination re-expressed as segments with a flat extension before
    /// its first point and after its last. The sweep skips past whatever
    /// prefix it doesn't need on its own.
    fn lines(&self) -> Box<dyn Iterator<Item = Line>> {
        match self {
            Limit::Const(value) => {
                Box::new(std::iter::once(Line::Horizon { since: f64::NEG_INFINITY, until: f64::INFINITY, value: *value }))
            }
            Limit::Gauge(gauge) => {
                let det = gauge.determination();
                let points = det.points().to_vec();
                let first = points[0];
                let last = *points.last().expect("a determination always has a point");
                let mut lines = Vec::with_capacity(points.len() + 1);
                lines.push(Line::Horizon { since: f64::NEG_INFINITY, until: first.0, value: first.1 });
                for pair in points.windows(2) {
                    lines.push(Line::Segment { since: pair[0].0, until: pair[1].0, value: pair[0].1, end_value: pair[1].1 });
                }
                lines.push(Line::Horizon { since: last.0, until: f64::INFINITY, value: last.1 });
                Box::new(lines.into_iter())
            }
        }
    }
}

/// Overridable momentum constructor, the Rust stand-in for the original's
/// protected `make_momentum` hook: a caller may supply one to attach
/// auxiliary bookkeeping to every momentum a gauge creates through
/// `add_momentum`/`remove_momentum`. The core uses whatever it returns
/// verbatim and keys equality off it, exactly as the original specifies.
type MomentumFactory = Rc<dyn Fn(f64, f64, f64) -> Result<Momentum, GaugeError>>;

struct GaugeState {
    base: (f64, f64),
    momenta: Vec<Momentum>,
    max: Limit,
    min: Limit,
    /// Gauges that use this one as (part of) their own `max` or `min`.
    /// Weak so that a limit-gauge's lifetime never keeps its dependents
    /// alive, and so a dropped dependent prunes itself out naturally.
    limited_gauges: Vec<Weak<RefCell<GaugeState>>>,
    determination: Option<Determination>,
    clock: Option<Rc<dyn Fn() -> f64>>,
    momentum_factory: Option<MomentumFactory>,
}

/// A scalar whose value evolves deterministically over continuous time.
///
/// Cloning a `Gauge` clones the handle, not the state: both clones observe
/// and mutate the same underlying gauge. This mirrors the original's
/// reference-typed objects, and is why the type is `!Send`/`!Sync` — a
/// gauge (and any hyper-gauge DAG built from it) is meant to be owned by a
/// single thread of control.
#[derive(Clone)]
pub struct Gauge(Rc<RefCell<GaugeState>>);

impl Gauge {
    pub fn new(value: f64, max: impl Into<Limit>, min: impl Into<Limit>, at: Option<f64>) -> Gauge {
        let at = at_or_now(at);
        let state = GaugeState {
            base: (at, value),
            momenta: Vec::new(),
            max: max.into(),
            min: min.into(),
            limited_gauges: Vec::new(),
            determination: None,
            clock: None,
            momentum_factory: None,
        };
        let gauge = Gauge(Rc::new(RefCell::new(state)));
        gauge.register_as_dependent();
        gauge
    }

    /// Convenience for the common case of a zero-floored gauge.
    pub fn bounded(value: f64, max: impl Into<Limit>, at: Option<f64>) -> Gauge {
        Gauge::new(value, max, 0.0, at)
    }

    /// Builder form of [`Gauge::set_clock`], for constructing a gauge with
    /// its own clock in one expression.
    pub fn with_clock(self, clock: impl Fn() -> f64 + 'static) -> Gauge {
        self.set_clock(clock);
        self
    }

    /// Installs the `make_momentum` extensibility hook (§6): every
    /// momentum this gauge creates from a bare velocity or interval (not
    /// one already built as a [`Momentum`] handle) is routed through
    /// `factory` instead of [`Momentum::new`]/[`Momentum::permanent`].
    pub fn with_momentum_factory(
        self,
        factory: impl Fn(f64, f64, f64) -> Result<Momentum, GaugeError> + 'static,
    ) -> Gauge {
        self.0.borrow_mut().momentum_factory = Some(Rc::new(factory));
        self
    }

    fn make_momentum(&self, velocity: f64, since: f64, until: f64) -> Result<Momentum, GaugeError> {
        let factory = self.0.borrow().momentum_factory.clone();
        match factory {
            Some(f) => f(velocity, since, until),
            None => Momentum::new(velocity, since, until),
        }
    }

    fn register_as_dependent(&self) {
        let weak = Rc::downgrade(&self.0);
        let (max, min) = {
            let state = self.0.borrow();
            (state.max.clone(), state.min.clone())
        };
        if let Limit::Gauge(g) = &max {
            g.0.borrow_mut().limited_gauges.push(weak.clone());
        }
        if let Limit::Gauge(g) = &min {
            g.0.borrow_mut().limited_gauges.push(weak);
        }
    }

    /// Overrides the clock this one gauge consults when `at` is omitted.
    /// Most callers should reach for [`crate::time::ClockOverride`]
    /// instead; this exists for gauges that must keep a clock distinct
    /// from the process default even while other clocks are overridden.
    pub fn set_clock(&self, clock: impl Fn() -> f64 + 'static) {
        self.0.borrow_mut().clock = Some(Rc::new(clock));
    }

    fn now(&self) -> f64 {
        match &self.0.borrow().clock {
            Some(c) => c(),
            None => time::now(),
        }
    }

    fn resolve_at(&self, at: Option<f64>) -> f64 {
        at.unwrap_or_else(|| self.now())
    }

    pub fn base_time(&self) -> f64 {
        self.0.borrow().base.0
    }

    pub fn base_value(&self) -> f64 {
        self.0.borrow().base.1
    }

    pub fn momenta(&self) -> Vec<Momentum> {
        self.0.borrow().momenta.clone()
    }

    pub fn max_limit(&self) -> Limit {
        self.0.borrow().max.clone()
    }

    pub fn min_limit(&self) -> Limit {
        self.0.borrow().min.clone()
    }

    /// The cached piecewise-linear trajectory, computing it first if this
    /// is the first time it has been asked for since the last mutation.
    pub fn determination(&self) -> Determination {
        if let Some(det) = self.0.borrow().determination.clone() {
            return det;
        }
        let (base, momenta, max, min) = {
            let state = self.0.borrow();
            (state.base, state.momenta.clone(), state.max.clone(), state.min.clone())
        };
        let events = momentum_events(base.0, &momenta);
        let ceiling = max.lines();
        let floor = min.lines();
        let det = Determination::sweep(base, events, ceiling, floor);
        self.0.borrow_mut().determination = Some(det.clone());
        det
    }

    /// The chronological add/remove event stream the sweep consumes: a
    /// synthetic start marker at the base time, each currently-live
    /// momentum's edges, then a synthetic end marker at `+inf`.
    pub fn momentum_events(&self) -> Vec<MomentumEvent> {
        let state = self.0.borrow();
        momentum_events(state.base.0, &state.momenta)
    }

    fn range_at(&self, at: f64) -> (f64, f64) {
        let (max, min) = {
            let state = self.0.borrow();
            (state.max.clone(), state.min.clone())
        };
        let max_value = match max {
            Limit::Const(v) => v,
            Limit::Gauge(g) => g.get(Some(at)),
        };
        let min_value = match min {
            Limit::Const(v) => v,
            Limit::Gauge(g) => g.get(Some(at)),
        };
        (max_value, min_value)
    }

    pub fn max(&self, at: Option<f64>) -> f64 {
        self.range_at(self.resolve_at(at)).0
    }

    pub fn min(&self, at: Option<f64>) -> f64 {
        self.range_at(self.resolve_at(at)).1
    }

    /// The value at `at` (default: now), clamped into range for every
    /// instant from which the gauge has stayed continuously in range.
    pub fn get(&self, at: Option<f64>) -> f64 {
        let at = self.resolve_at(at);
        let det = self.determination();
        let value = det.value_at(at);
        if det.in_range_at(at) {
            let (max_value, min_value) = self.range_at(at);
            value.min(max_value).max(min_value)
        } else {
            value
        }
    }

    pub fn velocity(&self, at: Option<f64>) -> f64 {
        let at = self.resolve_at(at);
        self.determination().velocity_at(at)
    }

    /// The value the gauge's trajectory eventually settles at.
    pub fn goal(&self) -> f64 {
        self.determination().goal()
    }

    pub fn in_range(&self, at: Option<f64>) -> bool {
        let at = self.resolve_at(at);
        self.determination().in_range_at(at)
    }

    fn apply_delta(&self, delta: f64, outbound: Outbound, at: Option<f64>) -> Result<f64, GaugeError> {
        let at = self.resolve_at(at);
        let current = self.get(Some(at));
        let (max_value, min_value) = self.range_at(at);
        let currently_in_range = min_value <= current && current <= max_value;
        let mut next = current + delta;

        let check_bounds = |next: f64| -> Result<(), GaugeError> {
            if next > max_value || next < min_value {
                Err(GaugeError::OutOfRange)
            } else {
                Ok(())
            }
        };

        match outbound {
            Outbound::Error => check_bounds(next)?,
            Outbound::Once => {
                if !currently_in_range {
                    check_bounds(next)?;
                }
            }
            Outbound::Ok => {}
            Outbound::Clamp => {
                if delta > 0.0 {
                    next = if current >= max_value { current } else { next.min(max_value) };
                } else if delta < 0.0 {
                    next = if current <= min_value { current } else { next.max(min_value) };
                }
            }
        }

        self.forget_past(Some(next), Some(at))?;
        Ok(next)
    }

    pub fn incr(&self, delta: f64, outbound: Outbound, at: Option<f64>) -> Result<f64, GaugeError> {
        self.apply_delta(delta, outbound, at)
    }

    pub fn decr(&self, delta: f64, outbound: Outbound, at: Option<f64>) -> Result<f64, GaugeError> {
        self.apply_delta(-delta, outbound, at)
    }

    pub fn set(&self, value: f64, outbound: Outbound, at: Option<f64>) -> Result<f64, GaugeError> {
        let at = self.resolve_at(at);
        let current = self.get(Some(at));
        self.apply_delta(value - current, outbound, Some(at))
    }

    /// Clamps the current value into range without touching momenta,
    /// returning the (possibly unchanged) result. Equivalent to
    /// `set(get(at).clamp(min, max), Outbound::Ok, at)` but without the
    /// rebase `set` performs when already in range.
    pub fn clamp(&self, at: Option<f64>) -> f64 {
        let at = self.resolve_at(at);
        let current = self.get(Some(at));
        let (max_value, min_value) = self.range_at(at);
        let clamped = current.min(max_value).max(min_value);
        if clamped != current {
            let _ = self.forget_past(Some(clamped), Some(at));
        }
        clamped
    }

    pub fn add_momentum(&self, spec: impl Into<MomentumSpec>) -> Result<Momentum, GaugeError> {
        let momentum = match spec.into() {
            MomentumSpec::Velocity(v) => self.make_momentum(v, f64::NEG_INFINITY, f64::INFINITY)?,
            MomentumSpec::Interval(v, since, until) => self.make_momentum(v, since, until)?,
            MomentumSpec::Handle(m) => m,
        };
        self.0.borrow_mut().momenta.push(momentum);
        invalidate(&self.0);
        Ok(momentum)
    }

    pub fn remove_momentum(&self, spec: impl Into<MomentumSpec>) -> Result<(), GaugeError> {
        let target = match spec.into() {
            MomentumSpec::Velocity(v) => Momentum::permanent(v),
            MomentumSpec::Interval(v, since, until) => Momentum::new(v, since, until)?,
            MomentumSpec::Handle(m) => m,
        };
        let mut state = self.0.borrow_mut();
        let pos = state.momenta.iter().position(|m| *m == target).ok_or(GaugeError::MomentumNotPresent)?;
        state.momenta.remove(pos);
        drop(state);
        invalidate(&self.0);
        Ok(())
    }

    /// Drops every momentum and rebases at `(at, value)`, `value`
    /// defaulting to the gauge's current value there.
    pub fn clear_momenta(&self, value: Option<f64>, at: Option<f64>) {
        let at = self.resolve_at(at);
        let value = value.unwrap_or_else(|| self.get(Some(at)));
        {
            let mut state = self.0.borrow_mut();
            state.momenta.clear();
            state.base = (at, value);
        }
        invalidate_and_propagate(&self.0);
    }

    /// Drops momenta that have already expired as of `at` and rebases the
    /// gauge at `(at, value)`, `value` defaulting to `get(at)` under the
    /// state as it stood before the rebase. Errs if `at` precedes the
    /// gauge's current base time — rebasing into the gauge's own past
    /// would silently discard history no one asked to forget.
    pub fn forget_past(&self, value: Option<f64>, at: Option<f64>) -> Result<(), GaugeError> {
        let at = self.resolve_at(at);
        if at < self.base_time() {
            return Err(GaugeError::PastRebase);
        }
        let value = match value {
            Some(v) => v,
            None => self.get(Some(at)),
        };
        {
            let mut state = self.0.borrow_mut();
            state.momenta.retain(|m| m.until >= at);
            state.base = (at, value);
        }
        invalidate_and_propagate(&self.0);
        Ok(())
    }

    fn relink_limit(&self, is_max: bool, new_limit: Limit) {
        let weak = Rc::downgrade(&self.0);
        let old = {
            let mut state = self.0.borrow_mut();
            if is_max {
                std::mem::replace(&mut state.max, new_limit.clone())
            } else {
                std::mem::replace(&mut state.min, new_limit.clone())
            }
        };
        if let Limit::Gauge(g) = &old {
            g.0.borrow_mut().limited_gauges.retain(|w| !Weak::ptr_eq(w, &weak));
        }
        if let Limit::Gauge(g) = &new_limit {
            g.0.borrow_mut().limited_gauges.push(weak);
        }
        invalidate(&self.0);
    }

    pub fn set_max(&self, max: impl Into<Limit>, at: Option<f64>) -> Result<(), GaugeError> {
        let at = self.resolve_at(at);
        let max = max.into();
        let cutoff = max.base_time_floor(at);
        self.relink_limit(true, max);
        self.forget_past(None, Some(cutoff))
    }

    pub fn set_min(&self, min: impl Into<Limit>, at: Option<f64>) -> Result<(), GaugeError> {
        let at = self.resolve_at(at);
        let min = min.into();
        let cutoff = min.base_time_floor(at);
        self.relink_limit(false, min);
        self.forget_past(None, Some(cutoff))
    }

    pub fn set_range(&self, max: Option<impl Into<Limit>>, min: Option<impl Into<Limit>>, at: Option<f64>) -> Result<(), GaugeError> {
        let at = self.resolve_at(at);
        let mut cutoff = at;
        if let Some(max) = max {
            let max = max.into();
            cutoff = cutoff.min(max.base_time_floor(at));
            self.relink_limit(true, max);
        }
        if let Some(min) = min {
            let min = min.into();
            cutoff = cutoff.min(min.base_time_floor(at));
            self.relink_limit(false, min);
        }
        self.forget_past(None, Some(cutoff))
    }

    /// The earliest instant at which the trajectory reaches `value`, after
    /// skipping the first `after` such instants.
    pub fn when(&self, value: f64, after: usize) -> Result<f64, GaugeError> {
        self.determination().crossings(value).into_iter().nth(after).ok_or(GaugeError::Unreachable)
    }

    /// Every instant at which the trajectory reaches `value`, in order.
    pub fn whenever(&self, value: f64) -> Vec<f64> {
        self.determination().crossings(value)
    }
}

/// Discards this gauge's cached determination and does the same,
/// recursively, for every live gauge that depends on it as a limit —
/// skipping a dependent whose cache is already clear, since its own
/// dependents have necessarily already been visited too.
fn invalidate(state_rc: &Rc<RefCell<GaugeState>>) {
    let had_cache = state_rc.borrow_mut().determination.take().is_some();
    if !had_cache {
        return;
    }
    let dependents: Vec<Rc<RefCell<GaugeState>>> = {
        let mut state = state_rc.borrow_mut();
        state.limited_gauges.retain(|w| w.strong_count() > 0);
        state.limited_gauges.iter().filter_map(Weak::upgrade).collect()
    };
    for dependent in dependents {
        invalidate(&dependent);
    }
}

/// Like [`invalidate`], but additionally gives every dependent a chance to
/// forget its own past: a gauge whose limit has just been rebased cannot
/// let that rebase retroactively change history the dependent already
/// settled into, so the dependent is nudged to rebase itself at whichever
/// is later of "now" and its own base time, its value clamped to the
/// limit's new shape.
fn invalidate_and_propagate(state_rc: &Rc<RefCell<GaugeState>>) {
    invalidate(state_rc);
    let dependents: Vec<Rc<RefCell<GaugeState>>> = {
        let state = state_rc.borrow();
        state.limited_gauges.iter().filter_map(Weak::upgrade).collect()
    };
    for dependent in dependents {
        let gauge = Gauge(dependent);
        let now = gauge.now();
        let at = now.max(gauge.base_time());
        let current = gauge.get(Some(at));
        let (max_value, min_value) = gauge.range_at(at);
        let clamped = current.min(max_value).max(min_value);
        let _ = gauge.forget_past(Some(clamped), Some(at));
    }
}
