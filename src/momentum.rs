//! Time-bounded linear momenta: the forces that move a gauge's value.

use crate::error::GaugeError;

/// A constant velocity active on the half-open-at-infinity interval
/// `[since, until]`. `since == -inf` and/or `until == +inf` mean the
/// momentum has always been, or will always be, in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    pub velocity: f64,
    pub since: f64,
    pub until: f64,
}

impl Momentum {
    /// Builds a momentum, rejecting an empty or inverted interval. `since`
    /// and `until` may each independently be infinite; only a finite pair
    /// with `since >= until` is invalid.
    pub fn new(velocity: f64, since: f64, until: f64) -> Result<Momentum, GaugeError> {
        if since.is_finite() && until.is_finite() && since >= until {
            return Err(GaugeError::BadMomentum);
        }
        Ok(Momentum { velocity, since, until })
    }

    pub fn permanent(velocity: f64) -> Momentum {
        Momentum { velocity, since: f64::NEG_INFINITY, until: f64::INFINITY }
    }

    pub fn is_active_at(&self, at: f64) -> bool {
        self.since <= at && at < self.until
    }
}

/// Why a [`MomentumEvent`] appears in the sweep's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Synthetic marker: sweep start or sweep end, carries no momentum.
    None,
    /// A momentum's `since` has been reached; it joins the active set.
    Add,
    /// A momentum's `until` has been reached; it leaves the active set.
    Remove,
}

/// One entry in the sweep's chronological event stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumEvent {
    pub time: f64,
    pub kind: EventKind,
    pub momentum: Option<Momentum>,
}

/// Builds the sweep's event stream for the momenta currently attached to a
/// gauge: a synthetic start marker at `base_time`, every still-live
/// momentum's add/remove events in chronological order, then a synthetic
/// end marker at `+inf`. Momenta with `until == +inf` never generate a
/// remove event — they simply persist to the end of the sweep.
pub fn momentum_events(base_time: f64, momenta: &[Momentum]) -> Vec<MomentumEvent> {
    let mut body: Vec<MomentumEvent> = Vec::with_capacity(momenta.len() * 2);
    for momentum in momenta {
        body.push(MomentumEvent { time: momentum.since, kind: EventKind::Add, momentum: Some(*momentum) });
        if momentum.until.is_finite() {
            body.push(MomentumEvent { time: momentum.until, kind: EventKind::Remove, momentum: Some(*momentum) });
        }
    }
    body.sort_by(|a, b| a.time.partial_cmp(&b.time).expect("event time is NaN"));

    let mut events = Vec::with_capacity(body.len() + 2);
    events.push(MomentumEvent { time: base_time, kind: EventKind::None, momentum: None });
    events.extend(body);
    events.push(MomentumEvent { time: f64::INFINITY, kind: EventKind::None, momentum: None });
    events
}

/// User-facing shorthand for specifying which momentum an operation means:
/// a bare velocity (permanent), a velocity with an explicit window, or a
/// previously-obtained handle. Lets `add_momentum`/`remove_momentum` accept
/// any of the three without the keyword-argument overloading the interval
/// form relies on elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MomentumSpec {
    Velocity(f64),
    Interval(f64, f64, f64),
    Handle(Momentum),
}

impl From<f64> for MomentumSpec {
    fn from(velocity: f64) -> Self {
        MomentumSpec::Velocity(velocity)
    }
}

impl From<Momentum> for MomentumSpec {
    fn from(momentum: Momentum) -> Self {
        MomentumSpec::Handle(momentum)
    }
}

impl From<(f64, f64, f64)> for MomentumSpec {
    fn from((velocity, since, until): (f64, f64, f64)) -> Self {
        MomentumSpec::Interval(velocity, since, until)
    }
}
