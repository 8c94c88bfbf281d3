//! Shot settings and mode options
//!
//! Values arrive as raw strings from the UI (select boxes and free-text
//! inputs). Invalid custom values fall back to the selected preset.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Speed presets offered in the classic speed selector
pub const SPEED_PRESETS: [&str; 5] = ["0.5", "1", "2", "4", "instant"];

/// Timer presets (seconds) offered for flood timer mode
pub const TIMER_PRESETS: [f64; 3] = [10.0, 30.0, 60.0];

/// Timer duration used when neither custom value nor preset is usable
pub const DEFAULT_TIMER_SECS: f64 = 30.0;

/// Errors from parsing a raw settings value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("not a number: {0:?}")]
    InvalidNumber(String),
    #[error("value must be positive, got {0}")]
    NonPositive(f64),
    #[error("unknown {field} option: {value:?}")]
    UnknownOption { field: &'static str, value: String },
}

/// Parse a strictly positive, finite number
fn parse_positive(s: &str) -> Result<f64, SettingsError> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidNumber(s.to_string()))?;
    if !value.is_finite() {
        return Err(SettingsError::InvalidNumber(s.to_string()));
    }
    if value <= 0.0 {
        return Err(SettingsError::NonPositive(value));
    }
    Ok(value)
}

/// Classic mode speed selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpeedSetting {
    /// Scale applied to the base velocity every frame
    Multiplier(f64),
    /// Skip animation and resolve the shot immediately
    Instant,
}

impl Default for SpeedSetting {
    fn default() -> Self {
        SpeedSetting::Multiplier(1.0)
    }
}

impl SpeedSetting {
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        if s.trim().eq_ignore_ascii_case("instant") {
            return Ok(SpeedSetting::Instant);
        }
        parse_positive(s).map(SpeedSetting::Multiplier)
    }

    /// Resolve the effective speed from the custom input and the preset select.
    ///
    /// A valid positive custom number always wins, even over an "instant" preset.
    pub fn resolve(custom: &str, preset: &str) -> Self {
        if !custom.trim().is_empty() {
            match parse_positive(custom) {
                Ok(multiplier) => return SpeedSetting::Multiplier(multiplier),
                Err(e) => log::warn!("Ignoring custom speed: {}", e),
            }
        }
        match Self::parse(preset) {
            Ok(speed) => speed,
            Err(e) => {
                log::warn!("Bad speed preset ({}), using 1x", e);
                SpeedSetting::default()
            }
        }
    }

    /// Replace a zero, negative or non-finite multiplier with 1x
    pub fn validated(self) -> Self {
        match self {
            SpeedSetting::Multiplier(m) if !is_valid_multiplier(m) => {
                log::warn!("Speed multiplier {} is not positive, using 1x", m);
                SpeedSetting::default()
            }
            other => other,
        }
    }

    /// Multiplier for frame stepping, `None` for instant
    pub fn multiplier(&self) -> Option<f64> {
        match self {
            SpeedSetting::Multiplier(m) if is_valid_multiplier(*m) => Some(*m),
            SpeedSetting::Multiplier(_) => Some(1.0),
            SpeedSetting::Instant => None,
        }
    }
}

fn is_valid_multiplier(m: f64) -> bool {
    m.is_finite() && m > 0.0
}

fn deserialize_speed<'de, D>(deserializer: D) -> Result<SpeedSetting, D::Error>
where
    D: Deserializer<'de>,
{
    SpeedSetting::deserialize(deserializer).map(SpeedSetting::validated)
}

/// How a flood run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FloodEndMode {
    /// First simultaneous double-wall contact
    #[default]
    Corner,
    /// Countdown reaching zero
    Timer,
}

impl FloodEndMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodEndMode::Corner => "corner",
            FloodEndMode::Timer => "timer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "corner" => Some(FloodEndMode::Corner),
            "timer" => Some(FloodEndMode::Timer),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        Self::from_str(s).ok_or_else(|| SettingsError::UnknownOption {
            field: "flood end mode",
            value: s.to_string(),
        })
    }
}

/// Resolve the flood timer duration in seconds
pub fn resolve_timer_secs(custom: &str, preset: &str) -> f64 {
    if !custom.trim().is_empty() {
        match parse_positive(custom) {
            Ok(secs) => return secs,
            Err(e) => log::warn!("Ignoring custom timer: {}", e),
        }
    }
    match parse_positive(preset) {
        Ok(secs) => secs,
        Err(e) => {
            log::warn!("Bad timer preset ({}), using {}s", e, DEFAULT_TIMER_SECS);
            DEFAULT_TIMER_SECS
        }
    }
}

/// Infinity mode background style (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InfinityStyle {
    /// Plain black background
    #[default]
    Solid,
    /// Background hue sits opposite the logo hue
    RainbowOpposites,
}

impl InfinityStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfinityStyle::Solid => "solid",
            InfinityStyle::RainbowOpposites => "rainbowOpposites",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "solid" | "normal" => Some(InfinityStyle::Solid),
            "rainbowOpposites" => Some(InfinityStyle::RainbowOpposites),
            _ => None,
        }
    }
}

/// Options read by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Classic speed (re-read every frame)
    #[serde(deserialize_with = "deserialize_speed")]
    pub speed: SpeedSetting,
    /// Flood termination rule
    pub flood_end: FloodEndMode,
    /// Flood countdown length in seconds
    pub timer_secs: f64,
    /// Infinity background style
    pub infinity_style: InfinityStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: SpeedSetting::default(),
            flood_end: FloodEndMode::Corner,
            timer_secs: DEFAULT_TIMER_SECS,
            infinity_style: InfinityStyle::Solid,
        }
    }
}

impl Settings {
    /// Countdown length in whole milliseconds
    pub fn timer_ms(&self) -> u32 {
        let secs = if self.timer_secs.is_finite() && self.timer_secs > 0.0 {
            self.timer_secs
        } else {
            DEFAULT_TIMER_SECS
        };
        (secs * 1000.0).round().min(u32::MAX as f64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_parse() {
        assert_eq!(SpeedSetting::parse("2"), Ok(SpeedSetting::Multiplier(2.0)));
        assert_eq!(SpeedSetting::parse("Instant"), Ok(SpeedSetting::Instant));
        assert_eq!(
            SpeedSetting::parse("fast"),
            Err(SettingsError::InvalidNumber("fast".to_string()))
        );
        assert_eq!(SpeedSetting::parse("-1"), Err(SettingsError::NonPositive(-1.0)));
        assert!(SpeedSetting::parse("inf").is_err());
    }

    #[test]
    fn test_speed_resolve_custom_overrides_preset() {
        assert_eq!(SpeedSetting::resolve("3", "1"), SpeedSetting::Multiplier(3.0));
        assert_eq!(SpeedSetting::resolve("3", "instant"), SpeedSetting::Multiplier(3.0));
    }

    #[test]
    fn test_speed_resolve_falls_back() {
        assert_eq!(SpeedSetting::resolve("", "instant"), SpeedSetting::Instant);
        assert_eq!(SpeedSetting::resolve("abc", "4"), SpeedSetting::Multiplier(4.0));
        assert_eq!(SpeedSetting::resolve("0", "0.5"), SpeedSetting::Multiplier(0.5));
        assert_eq!(SpeedSetting::resolve("", "bogus"), SpeedSetting::Multiplier(1.0));
    }

    #[test]
    fn test_timer_resolve() {
        assert_eq!(resolve_timer_secs("5", "30"), 5.0);
        assert_eq!(resolve_timer_secs("-5", "10"), 10.0);
        assert_eq!(resolve_timer_secs("", "60"), 60.0);
        assert_eq!(resolve_timer_secs("x", "y"), DEFAULT_TIMER_SECS);
    }

    #[test]
    fn test_flood_end_mode_strings() {
        for mode in [FloodEndMode::Corner, FloodEndMode::Timer] {
            assert_eq!(FloodEndMode::from_str(mode.as_str()), Some(mode));
        }
        assert!(matches!(
            FloodEndMode::parse("never"),
            Err(SettingsError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_timer_ms() {
        let settings = Settings {
            timer_secs: 5.0,
            ..Default::default()
        };
        assert_eq!(settings.timer_ms(), 5000);

        let settings = Settings {
            timer_secs: f64::NAN,
            ..Default::default()
        };
        assert_eq!(settings.timer_ms(), 30_000);
    }

    #[test]
    fn test_bad_multiplier_falls_back_to_1x() {
        for m in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert_eq!(SpeedSetting::Multiplier(m).validated(), SpeedSetting::Multiplier(1.0));
            assert_eq!(SpeedSetting::Multiplier(m).multiplier(), Some(1.0));
        }
        assert_eq!(SpeedSetting::Multiplier(2.5).validated(), SpeedSetting::Multiplier(2.5));
        assert_eq!(SpeedSetting::Instant.validated(), SpeedSetting::Instant);
    }

    #[test]
    fn test_settings_json_rejects_zero_speed() {
        let settings: Settings = serde_json::from_str(r#"{"speed":{"Multiplier":0.0}}"#).unwrap();
        assert_eq!(settings.speed, SpeedSetting::Multiplier(1.0));

        let settings: Settings = serde_json::from_str(r#"{"speed":{"Multiplier":-3.0}}"#).unwrap();
        assert_eq!(settings.speed, SpeedSetting::Multiplier(1.0));

        let settings: Settings = serde_json::from_str(r#"{"timer_secs":10.0}"#).unwrap();
        assert_eq!(settings.speed, SpeedSetting::default());
    }

    #[test]
    fn test_settings_json() {
        let settings = Settings {
            speed: SpeedSetting::Instant,
            flood_end: FloodEndMode::Timer,
            timer_secs: 12.5,
            infinity_style: InfinityStyle::RainbowOpposites,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.speed, SpeedSetting::Instant);
        assert_eq!(back.flood_end, FloodEndMode::Timer);
        assert_eq!(back.infinity_style, InfinityStyle::RainbowOpposites);
    }
}
