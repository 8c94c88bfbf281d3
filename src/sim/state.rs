//! Session state and core simulation types
//!
//! A `Session` is the single simulation context: one logo, one active mode,
//! at most one shot in flight. Input handlers and the frame/timer callbacks
//! all live in `tick.rs`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::coverage::{Coverage, DEFAULT_CELL_SIZE};
use super::step::Body;
use super::trajectory::Shot;
use crate::settings::{InfinityStyle, Settings};

/// Play mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Land the logo in a corner
    Classic,
    /// Paint as much of the screen as possible
    Flood,
    /// Bounce forever
    Infinity,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Flood => "flood",
            Mode::Infinity => "infinity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Some(Mode::Classic),
            "flood" => Some(Mode::Flood),
            "infinity" => Some(Mode::Infinity),
            _ => None,
        }
    }
}

/// Shot lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    /// Logo at rest, waiting for a grab
    Idle,
    /// Logo held by the pointer; `grab` is the pointer offset from the top-left
    Dragging { grab: DVec2 },
    /// Per-frame stepping in progress
    Animating,
    /// Classic corner hit, waiting to recenter
    Celebrating,
    /// Flood run over, waiting to wipe coverage
    Ended,
}

/// Why a flood run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloodEndReason {
    CornerHit,
    TimeUp,
}

impl FloodEndReason {
    pub fn message(&self) -> &'static str {
        match self {
            FloodEndReason::CornerHit => "Corner hit!",
            FloodEndReason::TimeUp => "Time up!",
        }
    }
}

/// Delayed work handed to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferred {
    /// Put the logo back in the middle after a celebration
    Recenter { generation: u64 },
    /// Wipe flood paint and recenter after a run ends
    ResetFlood { generation: u64 },
}

impl Deferred {
    pub fn generation(&self) -> u64 {
        match self {
            Deferred::Recenter { generation } | Deferred::ResetFlood { generation } => *generation,
        }
    }
}

/// Things the rendering collaborator should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Bounce counter changed
    BounceCount(u32),
    /// Dashed aim line from the viewport center to the logo center
    AimLine { from: DVec2, to: DVec2 },
    AimCleared,
    /// Fading trail mark at the logo's top-left
    Trail { top_left: DVec2, size: DVec2, hue: u16 },
    /// Flood paint at the logo's footprint
    Paint { top_left: DVec2, size: DVec2, hue: u16 },
    /// Corner hit: flash and particle burst at the logo center
    Celebrate { center: DVec2 },
    /// Transient message
    Warning(String),
    /// Flood paint wiped
    CoverageCleared,
    /// Flood coverage percentage changed
    Coverage(f64),
    FloodEnded { reason: FloodEndReason, coverage: f64 },
    /// Logo moved back to the middle
    Recentered,
}

/// Page background requested by the current mode/style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    Black,
    /// HSL background at 100% saturation, 10% lightness
    Hue(u16),
}

/// The simulation context for one page session
#[derive(Debug, Clone)]
pub struct Session {
    /// Active mode (`None` while the menu is showing)
    pub(crate) mode: Option<Mode>,
    pub(crate) phase: Phase,
    pub(crate) arena: Arena,
    pub(crate) body: Body,
    /// Snapshot of the last release
    pub(crate) shot: Option<Shot>,
    pub(crate) bounces: u32,
    pub(crate) coverage: Coverage,
    /// Flood countdown remaining (ms), present while a timer run is live
    pub(crate) countdown_ms: Option<u32>,
    /// Logo hue in degrees
    pub(crate) hue: u16,
    pub(crate) settings: Settings,
    /// Bumped whenever a shot is abandoned so stale deferred work is dropped
    pub(crate) generation: u64,
    pub(crate) events: Vec<SimEvent>,
}

impl Session {
    /// Create a session for the given viewport and logo size
    pub fn new(viewport: DVec2, body_size: DVec2) -> Self {
        let arena = Arena::new(viewport, body_size);
        Self {
            mode: None,
            phase: Phase::Idle,
            arena,
            body: Body {
                pos: arena.centered_top_left(),
                vel: DVec2::ZERO,
            },
            shot: None,
            bounces: 0,
            coverage: Coverage::new(viewport, DEFAULT_CELL_SIZE),
            countdown_ms: None,
            hue: 0,
            settings: Settings::default(),
            generation: 0,
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether per-frame stepping is live (the shared "still running" flag)
    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_center(&self) -> DVec2 {
        self.arena.top_left_to_center(self.body.pos)
    }

    pub fn shot(&self) -> Option<&Shot> {
        self.shot.as_ref()
    }

    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn countdown_ms(&self) -> Option<u32> {
        self.countdown_ms
    }

    pub fn hue(&self) -> u16 {
        self.hue
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Page background for the current mode and hue
    pub fn background(&self) -> Background {
        match (self.mode, self.settings.infinity_style) {
            (Some(Mode::Infinity), InfinityStyle::RainbowOpposites) => {
                Background::Hue((self.hue + 180) % 360)
            }
            _ => Background::Black,
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}
