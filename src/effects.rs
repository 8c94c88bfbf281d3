//! Visual effects pool
//!
//! Presentation-only state fed by `SimEvent`s: fading trail marks, the
//! corner celebration burst, the screen flash and the warning banner.
//! Nothing here feeds back into the simulation.

use std::collections::VecDeque;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::SimEvent;

/// Frames a trail mark stays visible
pub const TRAIL_TTL: u32 = 25;
/// Starting trail opacity
pub const TRAIL_OPACITY: f32 = 0.4;
/// Maximum live trail marks (oldest evicted first)
pub const MAX_TRAILS: usize = 256;

/// Particles spawned per celebration
pub const BURST_PARTICLES: usize = 40;
/// Maximum live particles (oldest evicted first)
pub const MAX_PARTICLES: usize = 256;
/// Downward acceleration per frame
pub const PARTICLE_GRAVITY: f64 = 0.2;
/// Particle edge length in pixels
pub const PARTICLE_SIZE: f64 = 6.0;

/// Flash opacity lost per frame (~0.5 s fade at 60 fps)
const FLASH_DECAY: f32 = 1.0 / 30.0;
/// Frames the warning banner stays up (1.5 s at 60 fps)
pub const WARNING_TTL: u32 = 90;

/// A fading copy of the logo
#[derive(Debug, Clone)]
pub struct TrailMark {
    pub top_left: DVec2,
    pub size: DVec2,
    pub hue: u16,
    pub ttl: u32,
}

impl TrailMark {
    pub fn opacity(&self) -> f32 {
        TRAIL_OPACITY * self.ttl as f32 / TRAIL_TTL as f32
    }
}

/// A celebration spark
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    pub hue: u16,
    /// Frames left
    pub life: u32,
}

/// Banner text with remaining display time
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub ttl: u32,
}

/// Bounded pool of live visual effects
#[derive(Debug, Clone)]
pub struct EffectPool {
    /// Oldest first
    pub trails: VecDeque<TrailMark>,
    pub particles: Vec<Particle>,
    /// Full-screen flash opacity (0-1)
    pub flash: f32,
    pub banner: Option<Banner>,
    rng: Pcg32,
}

impl EffectPool {
    pub fn new(seed: u64) -> Self {
        Self {
            trails: VecDeque::with_capacity(MAX_TRAILS),
            particles: Vec::with_capacity(MAX_PARTICLES),
            flash: 0.0,
            banner: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// React to one simulation event
    pub fn apply(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Trail {
                top_left,
                size,
                hue,
            } => {
                if self.trails.len() >= MAX_TRAILS {
                    self.trails.pop_front();
                }
                self.trails.push_back(TrailMark {
                    top_left: *top_left,
                    size: *size,
                    hue: *hue,
                    ttl: TRAIL_TTL,
                });
            }
            SimEvent::Celebrate { center } => self.burst(*center),
            SimEvent::Warning(text) => {
                self.banner = Some(Banner {
                    text: text.clone(),
                    ttl: WARNING_TTL,
                });
            }
            _ => {}
        }
    }

    fn burst(&mut self, center: DVec2) {
        self.flash = 1.0;

        let overflow = (self.particles.len() + BURST_PARTICLES).saturating_sub(MAX_PARTICLES);
        self.particles.drain(..overflow.min(self.particles.len()));

        for _ in 0..BURST_PARTICLES {
            let angle: f64 = self.rng.random_range(0.0..std::f64::consts::TAU);
            let speed: f64 = self.rng.random_range(4.0..10.0);
            self.particles.push(Particle {
                pos: center,
                vel: DVec2::from_angle(angle) * speed,
                hue: self.rng.random_range(0..360),
                life: self.rng.random_range(30..50),
            });
        }
    }

    /// Age everything by one frame
    pub fn tick(&mut self) {
        for trail in &mut self.trails {
            trail.ttl = trail.ttl.saturating_sub(1);
        }
        self.trails.retain(|t| t.ttl > 0);

        for particle in &mut self.particles {
            particle.pos += particle.vel;
            particle.vel.y += PARTICLE_GRAVITY;
            particle.life = particle.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);

        self.flash = (self.flash - FLASH_DECAY).max(0.0);

        if let Some(banner) = self.banner.as_mut() {
            banner.ttl = banner.ttl.saturating_sub(1);
            if banner.ttl == 0 {
                self.banner = None;
            }
        }
    }

    /// Drop everything (mode exit)
    pub fn clear(&mut self) {
        self.trails.clear();
        self.particles.clear();
        self.flash = 0.0;
        self.banner = None;
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty() && self.particles.is_empty() && self.flash == 0.0 && self.banner.is_none()
    }
}
