//! The cached, piecewise-linear trajectory of a gauge: where a sweep over
//! the gauge's momenta and its boundaries' shapes is turned into a list of
//! `(time, value)` break-points plus the longest trailing run during which
//! the value stayed within range.

use crate::boundary::{Boundary, Side};
use crate::line::Line;
use crate::momentum::{EventKind, MomentumEvent};

/// A piecewise-linear trajectory, and the point past which it has stayed
/// continuously within both boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Determination {
    points: Vec<(f64, f64)>,
    in_range_since: Option<f64>,
}

impl Determination {
    fn new() -> Determination {
        Determination { points: Vec::new(), in_range_since: None }
    }

    /// Appends a break-point, unless one already exists at this instant.
    /// Tracks the start of the current in-range run as it goes.
    fn push(&mut self, time: f64, value: f64, in_range: bool) {
        if let Some(last) = self.points.last() {
            if last.0 == time {
                return;
            }
        }
        self.points.push((time, value));
        if in_range {
            if self.in_range_since.is_none() {
                self.in_range_since = Some(time);
            }
        } else {
            self.in_range_since = None;
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn in_range_since(&self) -> Option<f64> {
        self.in_range_since
    }

    pub fn in_range_at(&self, at: f64) -> bool {
        self.in_range_since.map_or(false, |since| since <= at)
    }

    /// The final resting value the trajectory approaches — the value of
    /// its last break-point, which is always either a steady state or the
    /// value at `+inf`.
    pub fn goal(&self) -> f64 {
        self.points.last().expect("a determination always has at least one point").1
    }

    pub fn value_at(&self, at: f64) -> f64 {
        let points = &self.points;
        let last = points.len() - 1;
        if at <= points[0].0 {
            return points[0].1;
        }
        if at >= points[last].0 {
            return points[last].1;
        }
        match points.binary_search_by(|(t, _)| t.partial_cmp(&at).expect("break-point time is NaN")) {
            Ok(i) => points[i].1,
            Err(i) => {
                let (t1, v1) = points[i - 1];
                let (t2, v2) = points[i];
                v1 + (v2 - v1) * (at - t1) / (t2 - t1)
            }
        }
    }

    pub fn velocity_at(&self, at: f64) -> f64 {
        let points = &self.points;
        let last = points.len() - 1;
        if at <= points[0].0 || at >= points[last].0 {
            return 0.0;
        }
        let i = match points.binary_search_by(|(t, _)| t.partial_cmp(&at).expect("break-point time is NaN")) {
            Ok(i) if i + 1 <= last => i + 1,
            Ok(i) => i,
            Err(i) => i,
        };
        let (t1, v1) = points[i - 1];
        let (t2, v2) = points[i];
        (v2 - v1) / (t2 - t1)
    }

    /// Every instant at which the trajectory equals `value`, including its
    /// very first point. Each breakpoint only counts once: a segment's
    /// left end is claimed by the segment before it (or by the trajectory's
    /// start), its right end by itself.
    pub fn crossings(&self, value: f64) -> Vec<f64> {
        let mut out = Vec::new();
        let points = &self.points;
        if points[0].1 == value {
            out.push(points[0].0);
        }
        for pair in points.windows(2) {
            let (t1, v1) = pair[0];
            let (t2, v2) = pair[1];
            if v1 == v2 {
                if v1 == value {
                    out.push(t2);
                }
                continue;
            }
            let crosses = if v2 > v1 { value > v1 && value <= v2 } else { value < v1 && value >= v2 };
            if crosses {
                out.push(t1 + (value - v1) / (v2 - v1) * (t2 - t1));
            }
        }
        out
    }

    /// Runs the sweep: walks the momentum event stream while lazily
    /// pulling boundary pieces, assembling the trajectory one trial
    /// segment at a time. `ceiling` and `floor` must each start at or
    /// before `base.0`.
    pub fn sweep(
        base: (f64, f64),
        events: Vec<MomentumEvent>,
        ceiling: Box<dyn Iterator<Item = Line>>,
        floor: Box<dyn Iterator<Item = Line>>,
    ) -> Determination {
        let mut det = Determination::new();
        let (base_time, base_value) = base;

        let mut boundaries = [Boundary::new(Side::Ceiling, ceiling), Boundary::new(Side::Floor, floor)];
        for boundary in boundaries.iter_mut() {
            while boundary.line.until() <= base_time {
                if !boundary.walk() {
                    break;
                }
            }
        }

        let mut since = base_time;
        let mut value = base_value;
        let mut velocities: Vec<f64> = Vec::new();
        let mut bound: Option<usize> = None;
        let mut overlapped = false;

        for b in 0..2 {
            let guess = boundaries[b].line.guess(since);
            if boundaries[b].exceeds(value, guess) {
                bound = Some(b);
                overlapped = false;
            }
        }
        // The initial point is emitted by the first event's own `since ==
        // until == base_time` iteration below (its "in range" flag follows
        // the same `bound.is_none() || overlapped` rule as every later
        // point), rather than being pushed here as an unconditional `true`.

        for event in events {
            let until = event.time.max(base_time);
            let mut again = true;

            while since < until {
                let walked: Vec<usize> = if again {
                    again = false;
                    vec![0, 1]
                } else if boundaries[0].line.until() >= until && boundaries[1].line.until() >= until {
                    break;
                } else {
                    let idx = if boundaries[0].line.until() <= boundaries[1].line.until() { 0 } else { 1 };
                    boundaries[idx].walk();
                    vec![idx]
                };

                let velocity = match bound {
                    Some(b) if overlapped => {
                        boundaries[b].best(velocities.iter().sum(), boundaries[b].line.velocity())
                    }
                    Some(b) => velocities.iter().copied().filter(|v| boundaries[b].approaches(*v)).sum(),
                    None => velocities.iter().sum(),
                };

                if let Some(b) = bound {
                    if overlapped && boundaries[b].releases(velocity, boundaries[b].line.velocity()) {
                        bound = None;
                        overlapped = false;
                        again = true;
                        continue;
                    }
                }

                let trial = Line::Ray { since, until, value, velocity };

                if overlapped {
                    let b = bound.expect("overlapped implies a bound is set");
                    let release_at = boundaries[b].line.until().min(until);
                    if release_at == f64::INFINITY {
                        break;
                    }
                    since = release_at;
                    value = boundaries[b].line.get(release_at);
                    det.push(since, value, true);
                    continue;
                }

                // `overlapped` is false here, but `bound` may already be
                // `Some` from a still-unresolved initial overflow (the
                // gauge started past this boundary and hasn't touched it
                // yet). The forced-touch fallback below only applies to a
                // free-running trial that drifts past a boundary it was
                // never pressed against; an already-overflowing trial must
                // keep trying to find a genuine intersection (or wait for
                // more boundary to be walked) instead.
                let already_overflowing = bound.is_some();

                let mut advanced = false;
                for &b in &walked {
                    if let Some((t, v)) = trial.intersect(&boundaries[b].line) {
                        if t <= since || t > until {
                            continue;
                        }
                        bound = Some(b);
                        overlapped = true;
                        since = t;
                        value = boundaries[b].best(v, boundaries[b].line.guess(t));
                        det.push(since, value, true);
                        advanced = true;
                        break;
                    }
                }
                if advanced {
                    continue;
                }

                if already_overflowing {
                    continue;
                }

                // No true intersection found within this window, but a boundary
                // piece ends before `until` and the free-running trial already
                // sits past it there: force a touch at that piece's edge.
                let mut forced = false;
                for &b in &walked {
                    let edge = boundaries[b].line.until().min(until);
                    if edge == f64::INFINITY || edge < since {
                        continue;
                    }
                    let edge_value = boundaries[b].line.get(edge);
                    if !boundaries[b].exceeds(trial.get(edge), edge_value) {
                        continue;
                    }
                    bound = Some(b);
                    overlapped = true;
                    since = edge;
                    value = edge_value;
                    det.push(since, value, true);
                    forced = true;
                    break;
                }
                if forced {
                    continue;
                }

                break;
            }

            if until == f64::INFINITY {
                break;
            }

            let velocity = match bound {
                Some(b) if overlapped => boundaries[b].best(velocities.iter().sum(), boundaries[b].line.velocity()),
                Some(b) => velocities.iter().copied().filter(|v| boundaries[b].approaches(*v)).sum(),
                None => velocities.iter().sum(),
            };
            value += velocity * (until - since);
            det.push(until, value, bound.is_none() || overlapped);

            match event.kind {
                EventKind::Add => velocities.push(event.momentum.expect("add event carries a momentum").velocity),
                EventKind::Remove => {
                    let v = event.momentum.expect("remove event carries a momentum").velocity;
                    if let Some(pos) = velocities.iter().position(|x| *x == v) {
                        velocities.remove(pos);
                    }
                }
                EventKind::None => {}
            }
            since = until;
        }

        det
    }
}
