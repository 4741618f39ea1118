//! A structural snapshot of a gauge (and, recursively, of whatever other
//! gauges it uses as limits), for serialization. Reconstructing a `Gauge`
//! from a `GaugeSnapshot` reproduces the same determination as the
//! original, provided the same clock (or an explicit `at`) is used.

use serde::{Deserialize, Serialize};

use crate::gauge::{Gauge, Limit};
use crate::momentum::{Momentum, MomentumSpec};

/// A gauge's `max` or `min`, as captured for serialization: either a plain
/// number, or the full snapshot of the gauge it tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LimitSnapshot {
    Const(f64),
    Gauge(Box<GaugeSnapshot>),
}

/// The serializable shape of a [`Gauge`]: its base point, its momenta as
/// plain `(velocity, since, until)` tuples, and its two limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    pub base: (f64, f64),
    pub momenta: Vec<(f64, f64, f64)>,
    pub max: LimitSnapshot,
    pub min: LimitSnapshot,
}

impl Limit {
    fn snapshot(&self) -> LimitSnapshot {
        match self {
            Limit::Const(v) => LimitSnapshot::Const(*v),
            Limit::Gauge(g) => LimitSnapshot::Gauge(Box::new(g.snapshot())),
        }
    }

    fn from_snapshot(snapshot: &LimitSnapshot) -> Limit {
        match snapshot {
            LimitSnapshot::Const(v) => Limit::Const(*v),
            LimitSnapshot::Gauge(s) => Limit::Gauge(Gauge::from_snapshot(s)),
        }
    }
}

impl Gauge {
    /// Captures this gauge's current state, following limit gauges
    /// recursively. The cached determination itself is not part of the
    /// snapshot — it is cheap to recompute and tying the format to its
    /// internal representation would make the format fragile.
    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            base: (self.base_time(), self.base_value()),
            momenta: self.momenta().iter().map(|m| (m.velocity, m.since, m.until)).collect(),
            max: self.max_limit().snapshot(),
            min: self.min_limit().snapshot(),
        }
    }

    /// Rebuilds a gauge (and, recursively, any limit gauges it references)
    /// from a snapshot taken with [`Gauge::snapshot`]. Back-references from
    /// limit gauges to their dependents are re-established as each
    /// dependent gauge is constructed.
    pub fn from_snapshot(snapshot: &GaugeSnapshot) -> Gauge {
        let max = Limit::from_snapshot(&snapshot.max);
        let min = Limit::from_snapshot(&snapshot.min);
        let gauge = Gauge::new(snapshot.base.1, max, min, Some(snapshot.base.0));
        for &(velocity, since, until) in &snapshot.momenta {
            gauge
                .add_momentum(MomentumSpec::Handle(
                    Momentum::new(velocity, since, until).expect("a recorded momentum was valid when captured"),
                ))
                .expect("reconstructing a captured momentum cannot fail");
        }
        gauge
    }
}
