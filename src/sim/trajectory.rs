//! Closed-form trajectory walking
//!
//! Instead of stepping frame by frame, jump straight from wall to wall:
//! from the current position compute the time to the next vertical wall and
//! to the next horizontal wall, advance by the smaller one, and flip the
//! velocity component(s) of whichever wall was reached. Reaching both walls
//! in one advance is a corner hit.
//!
//! All positions here are logo centers.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use crate::consts::{CORNER_TOLERANCE, MAX_REFLECTIONS};

/// Immutable launch snapshot captured on release
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Logo center at release
    pub start: DVec2,
    /// Base velocity (pixels per frame at 1x)
    pub vel: DVec2,
}

impl Shot {
    pub fn new(start: DVec2, vel: DVec2) -> Self {
        Self { start, vel }
    }
}

/// Result of resolving a shot without animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstantOutcome {
    /// Logo center where the walk stopped
    pub final_pos: DVec2,
    /// Wall contacts, a corner counting as two
    pub bounces: u32,
    pub corner_hit: bool,
}

/// A single wall arrival
#[derive(Debug, Clone, Copy)]
struct Contact {
    pos: DVec2,
    /// Velocity after reflection
    vel: DVec2,
    vertical: bool,
    horizontal: bool,
}

impl Contact {
    fn is_corner(&self) -> bool {
        self.vertical && self.horizontal
    }
}

/// Time until `p` moving at `v` reaches the wall it is heading for.
///
/// A stationary axis never reaches a wall.
fn time_to_wall(p: f64, v: f64, lo: f64, hi: f64) -> Option<f64> {
    if v == 0.0 {
        return None;
    }
    let t = if v > 0.0 { (hi - p) / v } else { (lo - p) / v };
    t.is_finite().then_some(t)
}

#[inline]
fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < CORNER_TOLERANCE
}

/// Wall-to-wall walker, bounded by `MAX_REFLECTIONS` advances
struct Reflections<'a> {
    arena: &'a Arena,
    pos: DVec2,
    vel: DVec2,
    steps: usize,
}

impl<'a> Reflections<'a> {
    fn new(shot: &Shot, arena: &'a Arena) -> Self {
        Self {
            arena,
            pos: shot.start,
            vel: shot.vel,
            steps: 0,
        }
    }
}

impl Iterator for Reflections<'_> {
    type Item = Contact;

    fn next(&mut self) -> Option<Contact> {
        if self.steps >= MAX_REFLECTIONS {
            return None;
        }
        self.steps += 1;

        let min = self.arena.min();
        let max = self.arena.max();

        let tx = time_to_wall(self.pos.x, self.vel.x, min.x, max.x);
        let ty = time_to_wall(self.pos.y, self.vel.y, min.y, max.y);
        let t = match (tx, ty) {
            (None, None) => return None,
            (Some(tx), Some(ty)) => tx.min(ty),
            (Some(t), None) | (None, Some(t)) => t,
        };
        // Already on (or past) the target wall: degenerate, stop
        if t <= 0.0 {
            return None;
        }

        self.pos += self.vel * t;

        // An axis at rest never touches its walls, however close it sits
        let vertical =
            self.vel.x != 0.0 && (near(self.pos.x, min.x) || near(self.pos.x, max.x));
        let horizontal =
            self.vel.y != 0.0 && (near(self.pos.y, min.y) || near(self.pos.y, max.y));
        if vertical {
            self.vel.x = -self.vel.x;
        }
        if horizontal {
            self.vel.y = -self.vel.y;
        }

        Some(Contact {
            pos: self.pos,
            vel: self.vel,
            vertical,
            horizontal,
        })
    }
}

/// Whether continued reflection ever reaches a corner within the step bound
pub fn predicts_corner_hit(shot: &Shot, arena: &Arena) -> bool {
    let hit = Reflections::new(shot, arena).any(|c| c.is_corner());
    log::debug!(
        "Prediction from ({:.1}, {:.1}) vel ({:.2}, {:.2}): corner={}",
        shot.start.x,
        shot.start.y,
        shot.vel.x,
        shot.vel.y,
        hit
    );
    hit
}

/// Walk the shot to its first corner (or the step bound) counting bounces
pub fn resolve_instant(shot: &Shot, arena: &Arena) -> InstantOutcome {
    let mut outcome = InstantOutcome {
        final_pos: shot.start,
        bounces: 0,
        corner_hit: false,
    };

    for contact in Reflections::new(shot, arena) {
        outcome.final_pos = contact.pos;
        outcome.bounces += contact.vertical as u32 + contact.horizontal as u32;
        if contact.is_corner() {
            outcome.corner_hit = true;
            break;
        }
    }

    outcome
}
