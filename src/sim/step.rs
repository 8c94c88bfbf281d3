//! Per-frame stepping
//!
//! One display frame moves the logo by one velocity step. No sub-stepping:
//! a fast logo can overshoot a wall by up to one step, gets clamped back for
//! rendering, and is already heading away on the next frame.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;

/// The moving logo (top-left space)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// Rendered top-left corner
    pub pos: DVec2,
    /// Base velocity, sign flipped on wall contact
    pub vel: DVec2,
}

/// Walls reached during one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContact {
    /// Left or right wall
    pub vertical: bool,
    /// Top or bottom wall
    pub horizontal: bool,
}

impl FrameContact {
    pub fn is_corner(&self) -> bool {
        self.vertical && self.horizontal
    }

    /// Bounce counter increment for this frame
    pub fn bounces(&self) -> u32 {
        self.vertical as u32 + self.horizontal as u32
    }
}

/// Advance the body one frame at `multiplier` times its base velocity
pub fn step_body(body: &mut Body, arena: &Arena, multiplier: f64) -> FrameContact {
    let next = body.pos + body.vel * multiplier;
    let max = arena.max_top_left();

    let contact = FrameContact {
        vertical: next.x <= 0.0 || next.x >= max.x,
        horizontal: next.y <= 0.0 || next.y >= max.y,
    };
    if contact.vertical {
        body.vel.x = -body.vel.x;
    }
    if contact.horizontal {
        body.vel.y = -body.vel.y;
    }

    body.pos = arena.clamp_top_left(next);
    contact
}
