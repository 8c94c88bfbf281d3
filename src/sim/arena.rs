//! Arena geometry
//!
//! The arena is the viewport shrunk by the logo's own size. Two coordinate
//! spaces are in play:
//! - center space: the logo's center, bounded by `min()..=max()`
//! - top-left space: the logo's rendered corner, bounded by `0..=max_top_left()`

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Reflection boundaries for one viewport/logo size combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Viewport size in pixels
    pub viewport: DVec2,
    /// Rendered logo size in pixels
    pub body_size: DVec2,
}

impl Arena {
    pub fn new(viewport: DVec2, body_size: DVec2) -> Self {
        Self {
            viewport,
            body_size,
        }
    }

    /// Lowest center position (wMin, hMin)
    #[inline]
    pub fn min(&self) -> DVec2 {
        self.body_size / 2.0
    }

    /// Highest center position (wMax, hMax)
    #[inline]
    pub fn max(&self) -> DVec2 {
        self.viewport - self.body_size / 2.0
    }

    /// Highest top-left position
    #[inline]
    pub fn max_top_left(&self) -> DVec2 {
        (self.viewport - self.body_size).max(DVec2::ZERO)
    }

    /// Viewport center (the launch anchor)
    #[inline]
    pub fn center(&self) -> DVec2 {
        self.viewport / 2.0
    }

    /// Top-left position that centers the logo
    #[inline]
    pub fn centered_top_left(&self) -> DVec2 {
        self.center_to_top_left(self.center())
    }

    #[inline]
    pub fn top_left_to_center(&self, top_left: DVec2) -> DVec2 {
        top_left + self.body_size / 2.0
    }

    #[inline]
    pub fn center_to_top_left(&self, center: DVec2) -> DVec2 {
        center - self.body_size / 2.0
    }

    /// Clamp a top-left position into the arena
    #[inline]
    pub fn clamp_top_left(&self, top_left: DVec2) -> DVec2 {
        top_left.clamp(DVec2::ZERO, self.max_top_left())
    }
}
