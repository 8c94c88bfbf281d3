//! Virtual-clock scheduler
//!
//! Time only moves when `advance` is called. Within one advance, due
//! countdown ticks and deferred tasks fire in timestamp order (countdown
//! first on ties), then at most one requested frame runs.

use super::Scheduler;
use crate::sim::{Deferred, Session};

#[derive(Debug, Clone, Copy)]
struct Interval {
    period_ms: u32,
    next_due: u64,
}

/// Deterministic scheduler for tests and the headless runner
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    frame_requested: bool,
    countdown: Option<Interval>,
    /// (due time, insertion order, task)
    deferred: Vec<(u64, u64, Deferred)>,
    next_seq: u64,
    frames_run: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_requested
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn deferred_pending(&self) -> usize {
        self.deferred.len()
    }

    /// Frames delivered so far
    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// Nothing left to run: no frame, countdown or deferred task
    pub fn is_idle(&self) -> bool {
        !self.frame_requested && self.countdown.is_none() && self.deferred.is_empty()
    }

    /// Earliest timer (countdown or deferred) due at or before `until`
    fn next_timer(&self, until: u64) -> Option<u64> {
        let countdown = self.countdown.map(|c| c.next_due);
        let deferred = self.deferred.iter().map(|(due, _, _)| *due).min();
        [countdown, deferred]
            .into_iter()
            .flatten()
            .filter(|due| *due <= until)
            .min()
    }

    /// Move the clock forward by `ms`, then deliver one frame if requested
    pub fn advance(&mut self, session: &mut Session, ms: u64) {
        let until = self.now_ms + ms;

        while let Some(due) = self.next_timer(until) {
            self.now_ms = due;

            if let Some(interval) = self.countdown.as_mut() {
                if interval.next_due == due {
                    interval.next_due += interval.period_ms.max(1) as u64;
                    session.countdown_tick(self);
                    continue;
                }
            }

            let earliest = self
                .deferred
                .iter()
                .enumerate()
                .filter(|(_, (d, _, _))| *d == due)
                .min_by_key(|(_, (_, seq, _))| *seq)
                .map(|(i, _)| i);
            if let Some(i) = earliest {
                let (_, _, task) = self.deferred.remove(i);
                session.run_deferred(task);
            }
        }

        self.now_ms = until;
        if self.frame_requested {
            self.frame_requested = false;
            self.frames_run += 1;
            session.frame(self);
        }
    }

    /// Advance in `frame_ms` steps until idle or `max_ms` has elapsed
    pub fn run_until_idle(&mut self, session: &mut Session, frame_ms: u64, max_ms: u64) {
        let deadline = self.now_ms + max_ms;
        while !self.is_idle() && self.now_ms < deadline {
            self.advance(session, frame_ms.max(1));
        }
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    fn start_countdown(&mut self, period_ms: u32) {
        self.countdown = Some(Interval {
            period_ms,
            next_due: self.now_ms + period_ms.max(1) as u64,
        });
    }

    fn cancel_countdown(&mut self) {
        self.countdown = None;
    }

    fn defer(&mut self, delay_ms: u32, task: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.deferred.push((self.now_ms + delay_ms as u64, seq, task));
    }
}
