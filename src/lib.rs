//! A scalar whose value evolves deterministically over continuous time
//! under time-bounded linear momenta, clamped inside a range that may
//! itself be constant or tracking another gauge.
//!
//! The public surface is [`Gauge`] plus its supporting types
//! ([`Momentum`], [`Outbound`], [`Limit`]) and the structural
//! [`GaugeSnapshot`] used for serialization. Everything else in this
//! crate (the [`Line`][line::Line] family, [`boundary`], the
//! [`determination`] sweep) is the machinery a `Gauge` drives internally.

pub mod boundary;
pub mod determination;
pub mod error;
pub mod gauge;
pub mod line;
pub mod momentum;
pub mod snapshot;
pub mod time;

pub use determination::Determination;
pub use error::GaugeError;
pub use gauge::{Gauge, Limit, Outbound};
pub use momentum::{Momentum, MomentumSpec};
pub use snapshot::{GaugeSnapshot, LimitSnapshot};
pub use time::{set_default_clock, ClockOverride};
