//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per host frame, no wall clock
//! - Timers and frames only through the `Scheduler` trait
//! - No rendering or platform dependencies

pub mod arena;
pub mod coverage;
pub mod state;
pub mod step;
pub mod tick;
pub mod trajectory;

pub use arena::Arena;
pub use coverage::Coverage;
pub use state::{Background, Deferred, FloodEndReason, Mode, Phase, Session, SimEvent};
pub use step::{Body, FrameContact, step_body};
pub use trajectory::{InstantOutcome, Shot, predicts_corner_hit, resolve_instant};
