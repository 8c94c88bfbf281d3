//! Platform abstraction layer
//!
//! The simulation never owns a clock. It asks its host for:
//! - the next display frame (one `Session::frame` per request)
//! - a fixed-interval countdown (`Session::countdown_tick` per period)
//! - one-shot delayed work (`Session::run_deferred`)
//!
//! The browser host maps these onto requestAnimationFrame, setInterval and
//! setTimeout. `ManualScheduler` runs them on a virtual clock.

mod manual;

pub use manual::ManualScheduler;

use crate::sim::Deferred;

/// Host-side timing services used by a `Session`
pub trait Scheduler {
    /// Run `Session::frame` once on the next display refresh
    fn request_frame(&mut self);
    /// Start (or restart) the countdown interval
    fn start_countdown(&mut self, period_ms: u32);
    /// Stop the countdown interval; no further ticks are delivered
    fn cancel_countdown(&mut self);
    /// Deliver `task` to `Session::run_deferred` after `delay_ms`
    fn defer(&mut self, delay_ms: u32, task: Deferred);
}
