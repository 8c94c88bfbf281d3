//! DVD Corner - aim the bouncing logo and land it in a corner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (reflection math, prediction, mode state machines)
//! - `effects`: Short-lived visual effects fed by simulation events
//! - `platform`: Frame/timer scheduling abstraction
//! - `settings`: Speed, flood and infinity options

pub mod effects;
pub mod platform;
pub mod settings;
pub mod sim;

pub use effects::EffectPool;
pub use platform::{ManualScheduler, Scheduler};
pub use settings::{FloodEndMode, InfinityStyle, Settings, SettingsError, SpeedSetting};
pub use sim::{Arena, Mode, Phase, Session, SimEvent};

/// Game configuration constants
pub mod consts {
    /// Launch velocity per pixel of pull-back from the viewport center
    pub const LAUNCH_SCALE: f64 = 0.15;

    /// Reflection steps examined before a shot is declared hopeless
    pub const MAX_REFLECTIONS: usize = 2000;
    /// Distance within which both walls count as reached together
    pub const CORNER_TOLERANCE: f64 = 0.5;

    /// Delay before the logo recenters after a corner celebration
    pub const CELEBRATION_RECENTER_MS: u32 = 600;
    /// Delay before flood coverage is wiped after a run ends
    pub const FLOOD_RESET_MS: u32 = 800;
    /// Flood countdown resolution
    pub const COUNTDOWN_PERIOD_MS: u32 = 100;
    /// Hue advances one degree per color tick
    pub const COLOR_TICK_MS: u32 = 40;

    /// Warning shown when a shot can never align with a corner
    pub const NEVER_HITS_CORNER: &str = "This shot will never hit a corner.";
}

/// Format an HSL color string for the given hue
#[inline]
pub fn hsl(hue: u16, saturation: u8, lightness: u8) -> String {
    format!("hsl({}, {}%, {}%)", hue % 360, saturation, lightness)
}
