//! Error type shared by every fallible gauge operation.

/// Failure modes surfaced by the public API. `NoIntersection` from the
/// sweep algorithm never reaches here: it is resolved internally by the
/// boundary-release fallback before a determination is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeError {
    /// An `Outbound::Error` or `Outbound::Once` mutation would have left
    /// (or found) the gauge outside of its current range.
    OutOfRange,
    /// A momentum's `since` is not strictly before its `until` (both finite).
    BadMomentum,
    /// `remove_momentum` was asked to remove a momentum the gauge doesn't hold.
    MomentumNotPresent,
    /// `when` asked for a crossing that the determination never reaches.
    Unreachable,
    /// `forget_past` (or a mutator built on it) was asked to rebase at a
    /// time before the gauge's current base time.
    PastRebase,
}
