//! The three shapes a trajectory segment can take. A tagged enum rather
//! than a trait object: there are exactly three variants, each carries
//! different fields, and the sweep needs to match on which kind it has
//! (for intersection-reliability ordering) far more often than it needs
//! to treat them uniformly.

/// A piece of a trajectory, valid on `[since, until]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Line {
    /// A constant value, e.g. a `Limit::Const` boundary.
    Horizon { since: f64, until: f64, value: f64 },
    /// A value moving at a fixed velocity from a known starting point.
    Ray { since: f64, until: f64, value: f64, velocity: f64 },
    /// A line fixed at both ends; velocity is derived from the two points.
    Segment { since: f64, until: f64, value: f64, end_value: f64 },
}

/// Reliability used to break ties when two candidate crossings land on the
/// same instant: a flat line is the most certain, a two-point segment the
/// least (its velocity is itself derived, hence doubly approximate).
fn reliability(line: &Line) -> u8 {
    match line {
        Line::Horizon { .. } => 3,
        Line::Ray { .. } => 2,
        Line::Segment { .. } => 1,
    }
}

impl Line {
    pub fn since(&self) -> f64 {
        match *self {
            Line::Horizon { since, .. } => since,
            Line::Ray { since, .. } => since,
            Line::Segment { since, .. } => since,
        }
    }

    pub fn until(&self) -> f64 {
        match *self {
            Line::Horizon { until, .. } => until,
            Line::Ray { until, .. } => until,
            Line::Segment { until, .. } => until,
        }
    }

    pub fn velocity(&self) -> f64 {
        match *self {
            Line::Horizon { .. } => 0.0,
            Line::Ray { velocity, .. } => velocity,
            Line::Segment { since, until, value, end_value } => (end_value - value) / (until - since),
        }
    }

    /// The value at `since`, i.e. where this line starts.
    pub fn intercept(&self) -> f64 {
        match *self {
            Line::Horizon { value, .. } => value,
            Line::Ray { value, .. } => value,
            Line::Segment { value, .. } => value,
        }
    }

    /// The value at `at`, which must lie within `[since, until]`.
    pub fn get(&self, at: f64) -> f64 {
        debug_assert!(at >= self.since() && at <= self.until());
        self.guess(at)
    }

    /// The value the line's equation predicts at `at`, even outside of
    /// `[since, until]` — used when projecting a trial `Ray` against a
    /// boundary line that doesn't span the same window yet.
    pub fn guess(&self, at: f64) -> f64 {
        match *self {
            Line::Horizon { value, .. } => value,
            Line::Ray { since, value, velocity, .. } => value + velocity * (at - since),
            Line::Segment { since, until, value, end_value } => {
                if since == until {
                    value
                } else {
                    value + (end_value - value) / (until - since) * (at - since)
                }
            }
        }
    }

    /// The earliest instant at or after `max(self.since, other.since)`
    /// where the two lines' equations agree, if any, along with the value
    /// there. Parallel (or coincident) lines never intersect; a solved `t`
    /// outside the overlap `[max(since), min(until)]` — including a
    /// zero-length overlap — doesn't count either.
    pub fn intersect(&self, other: &Line) -> Option<(f64, f64)> {
        let v1 = self.velocity();
        let v2 = other.velocity();
        let dv = v1 - v2;
        if dv == 0.0 {
            return None;
        }
        let overlap_since = self.since().max(other.since());
        let overlap_until = self.until().min(other.until());
        if overlap_since >= overlap_until {
            return None;
        }
        // Anchor both lines' equations at whichever operand is the more
        // reliable (simpler) shape, since its own `since` is where its
        // equation is least extrapolated and hence most numerically
        // trustworthy. Fall back to `0.0` when that anchor is infinite (a
        // permanent Horizon's bounding Rays do not actually depend on it,
        // but `0.0 * infinity` would poison the arithmetic if we used it).
        let anchor = Line::more_reliable(self, other).since();
        let anchor = if anchor.is_finite() { anchor } else { 0.0 };
        let a = self.guess(anchor);
        let b = other.guess(anchor);
        let t = anchor + (b - a) / dv;
        if !t.is_finite() || t < overlap_since || t > overlap_until {
            return None;
        }
        Some((t, self.guess(t)))
    }

    /// Picks whichever of two simultaneous candidate lines is the more
    /// reliable kind, per [`reliability`]. Ties keep the first argument.
    pub fn more_reliable<'a>(a: &'a Line, b: &'a Line) -> &'a Line {
        if reliability(b) > reliability(a) {
            b
        } else {
            a
        }
    }
}
