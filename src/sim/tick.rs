//! Mode state machines
//!
//! Input handlers, the per-frame step and the timer callbacks for all three
//! modes. Every callback first checks that the session is still in the state
//! it expects, so a frame or countdown tick that arrives after a shot was
//! abandoned does nothing.

use glam::DVec2;

use super::arena::Arena;
use super::state::{Deferred, FloodEndReason, Mode, Phase, Session, SimEvent};
use super::step::step_body;
use super::trajectory::{Shot, predicts_corner_hit, resolve_instant};
use crate::consts::*;
use crate::platform::Scheduler;
use crate::settings::{FloodEndMode, SpeedSetting};

impl Session {
    /// Leave the menu (or another mode) and enter `mode`
    pub fn enter_mode(&mut self, mode: Mode, sched: &mut dyn Scheduler) {
        self.reset_all(sched);
        self.mode = Some(mode);
        log::info!("Entered {} mode", mode.as_str());
    }

    /// Stop everything and show the menu
    pub fn return_to_menu(&mut self, sched: &mut dyn Scheduler) {
        self.reset_all(sched);
        if let Some(mode) = self.mode.take() {
            log::info!("Left {} mode", mode.as_str());
        }
    }

    fn reset_all(&mut self, sched: &mut dyn Scheduler) {
        self.abandon_shot(sched);
        self.phase = Phase::Idle;
        self.clear_coverage();
        self.emit(SimEvent::AimCleared);
        self.recenter();
    }

    /// Stop the frame loop and countdown and invalidate pending deferred work
    fn abandon_shot(&mut self, sched: &mut dyn Scheduler) {
        sched.cancel_countdown();
        self.countdown_ms = None;
        self.generation += 1;
        if matches!(
            self.phase,
            Phase::Animating | Phase::Celebrating | Phase::Ended
        ) {
            self.phase = Phase::Idle;
        }
    }

    fn clear_coverage(&mut self) {
        self.coverage.reset();
        self.emit(SimEvent::CoverageCleared);
        self.emit(SimEvent::Coverage(0.0));
    }

    fn recenter(&mut self) {
        self.body.pos = self.arena.centered_top_left();
        self.body.vel = DVec2::ZERO;
        self.emit(SimEvent::Recentered);
    }

    /// Viewport or logo size changed
    pub fn resize(&mut self, viewport: DVec2, body_size: DVec2) {
        let old = self.arena;
        self.arena = Arena::new(viewport, body_size);
        if old.viewport != viewport {
            self.coverage.resize(viewport);
            self.emit(SimEvent::CoverageCleared);
            self.emit(SimEvent::Coverage(0.0));
        }
        if self.phase == Phase::Idle {
            self.recenter();
        } else {
            self.body.pos = self.arena.clamp_top_left(self.body.pos);
        }
        log::debug!(
            "Arena resized to {}x{} (logo {}x{})",
            viewport.x,
            viewport.y,
            body_size.x,
            body_size.y
        );
    }

    /// Whether `pointer` lands on the logo
    pub fn grabs(&self, pointer: DVec2) -> bool {
        let min = self.body.pos;
        let max = self.body.pos + self.arena.body_size;
        pointer.cmpge(min).all() && pointer.cmple(max).all()
    }

    /// Grab the logo. Returns false when no mode is active or the pointer missed.
    pub fn pointer_down(&mut self, pointer: DVec2, sched: &mut dyn Scheduler) -> bool {
        let Some(mode) = self.mode else {
            return false;
        };
        if !self.grabs(pointer) {
            return false;
        }

        self.abandon_shot(sched);
        self.phase = Phase::Dragging {
            grab: pointer - self.body.pos,
        };
        self.bounces = 0;
        self.emit(SimEvent::BounceCount(0));

        if mode == Mode::Flood {
            self.clear_coverage();
        }
        true
    }

    /// Drag the held logo
    pub fn pointer_move(&mut self, pointer: DVec2) {
        let Phase::Dragging { grab } = self.phase else {
            return;
        };
        self.body.pos = pointer - grab;

        if self.mode == Some(Mode::Classic) {
            let from = self.arena.center();
            let to = self.body_center();
            self.emit(SimEvent::AimLine { from, to });
        } else {
            self.emit(SimEvent::AimCleared);
        }
    }

    /// Release the logo and launch it toward (and past) the viewport center
    pub fn pointer_up(&mut self, sched: &mut dyn Scheduler) {
        if !matches!(self.phase, Phase::Dragging { .. }) {
            return;
        }
        let Some(mode) = self.mode else {
            return;
        };
        self.phase = Phase::Idle;
        self.emit(SimEvent::AimCleared);

        let start = self.body_center();
        let shot = Shot::new(start, (self.arena.center() - start) * LAUNCH_SCALE);
        self.shot = Some(shot);
        log::info!(
            "Released in {} mode at ({:.0}, {:.0}) with velocity ({:.2}, {:.2})",
            mode.as_str(),
            shot.start.x,
            shot.start.y,
            shot.vel.x,
            shot.vel.y
        );

        match mode {
            Mode::Classic => match self.settings.speed {
                SpeedSetting::Instant => self.run_instant(sched),
                SpeedSetting::Multiplier(_) => {
                    if !predicts_corner_hit(&shot, &self.arena) {
                        self.emit(SimEvent::Warning(NEVER_HITS_CORNER.to_string()));
                    }
                    self.launch(shot.vel, sched);
                }
            },
            Mode::Flood => {
                self.launch(shot.vel, sched);
                if self.settings.flood_end == FloodEndMode::Timer {
                    let ms = self.settings.timer_ms();
                    self.countdown_ms = Some(ms);
                    sched.start_countdown(COUNTDOWN_PERIOD_MS);
                    log::info!("Flood countdown started: {} ms", ms);
                }
            }
            Mode::Infinity => self.launch(shot.vel, sched),
        }
    }

    fn launch(&mut self, vel: DVec2, sched: &mut dyn Scheduler) {
        self.body.vel = vel;
        self.phase = Phase::Animating;
        sched.request_frame();
    }

    /// Change the classic speed. Switching to instant mid-flight resolves at once.
    pub fn set_speed(&mut self, speed: SpeedSetting, sched: &mut dyn Scheduler) {
        let speed = speed.validated();
        self.settings.speed = speed;
        if speed == SpeedSetting::Instant
            && self.mode == Some(Mode::Classic)
            && self.is_animating()
        {
            self.run_instant(sched);
        }
    }

    /// Aim from the current position and resolve without animation
    fn run_instant(&mut self, sched: &mut dyn Scheduler) {
        self.phase = Phase::Idle;

        let start = self.body_center();
        let shot = Shot::new(start, (self.arena.center() - start) * LAUNCH_SCALE);
        self.shot = Some(shot);

        if !predicts_corner_hit(&shot, &self.arena) {
            self.emit(SimEvent::Warning(NEVER_HITS_CORNER.to_string()));
            self.recenter();
            return;
        }

        let outcome = resolve_instant(&shot, &self.arena);
        self.bounces = outcome.bounces;
        self.emit(SimEvent::BounceCount(outcome.bounces));

        if outcome.corner_hit {
            self.body.pos = self.arena.center_to_top_left(outcome.final_pos);
            self.body.vel = DVec2::ZERO;
            self.celebrate(sched);
        } else {
            self.emit(SimEvent::Warning(NEVER_HITS_CORNER.to_string()));
            self.recenter();
        }
    }

    fn celebrate(&mut self, sched: &mut dyn Scheduler) {
        self.phase = Phase::Celebrating;
        let center = self.body_center();
        self.emit(SimEvent::Celebrate { center });
        sched.defer(
            CELEBRATION_RECENTER_MS,
            Deferred::Recenter {
                generation: self.generation,
            },
        );
        log::info!("Corner hit after {} bounces", self.bounces);
    }

    fn emit_trail(&mut self) {
        self.emit(SimEvent::Trail {
            top_left: self.body.pos,
            size: self.arena.body_size,
            hue: self.hue,
        });
    }

    /// One display frame
    pub fn frame(&mut self, sched: &mut dyn Scheduler) {
        if !self.is_animating() {
            return;
        }
        let Some(mode) = self.mode else {
            return;
        };

        match mode {
            Mode::Classic => {
                // Speed is re-read every frame so changes apply mid-flight
                let Some(multiplier) = self.settings.speed.multiplier() else {
                    self.run_instant(sched);
                    return;
                };
                self.emit_trail();
                let contact = step_body(&mut self.body, &self.arena, multiplier);
                if contact.bounces() > 0 {
                    self.bounces += contact.bounces();
                    self.emit(SimEvent::BounceCount(self.bounces));
                }
                if contact.is_corner() {
                    self.celebrate(sched);
                    return;
                }
            }
            Mode::Flood => {
                let contact = step_body(&mut self.body, &self.arena, 1.0);

                let before = self.coverage.percentage();
                self.coverage.paint(self.body.pos, self.arena.body_size);
                self.emit(SimEvent::Paint {
                    top_left: self.body.pos,
                    size: self.arena.body_size,
                    hue: self.hue,
                });
                let after = self.coverage.percentage();
                if after != before {
                    self.emit(SimEvent::Coverage(after));
                }

                if self.settings.flood_end == FloodEndMode::Corner && contact.is_corner() {
                    self.end_flood(FloodEndReason::CornerHit, sched);
                    return;
                }
            }
            Mode::Infinity => {
                self.emit_trail();
                step_body(&mut self.body, &self.arena, 1.0);
            }
        }

        sched.request_frame();
    }

    /// One countdown period elapsed
    pub fn countdown_tick(&mut self, sched: &mut dyn Scheduler) {
        if self.mode != Some(Mode::Flood) || !self.is_animating() {
            return;
        }
        let Some(remaining) = self.countdown_ms else {
            return;
        };

        let remaining = remaining.saturating_sub(COUNTDOWN_PERIOD_MS);
        self.countdown_ms = Some(remaining);
        if remaining == 0 {
            self.end_flood(FloodEndReason::TimeUp, sched);
        }
    }

    fn end_flood(&mut self, reason: FloodEndReason, sched: &mut dyn Scheduler) {
        self.phase = Phase::Ended;
        sched.cancel_countdown();
        self.countdown_ms = None;

        let coverage = self.coverage.percentage();
        self.emit(SimEvent::FloodEnded { reason, coverage });
        self.emit(SimEvent::Warning(format!(
            "{} Coverage: {:.1}%",
            reason.message(),
            coverage
        )));
        log::info!("Flood run ended ({:?}) at {:.1}% coverage", reason, coverage);

        sched.defer(
            FLOOD_RESET_MS,
            Deferred::ResetFlood {
                generation: self.generation,
            },
        );
    }

    /// Delayed work scheduled by an earlier shot
    pub fn run_deferred(&mut self, task: Deferred) {
        if task.generation() != self.generation {
            log::debug!("Dropping stale {:?}", task);
            return;
        }
        match task {
            Deferred::Recenter { .. } => {
                if self.phase == Phase::Celebrating {
                    self.phase = Phase::Idle;
                }
                self.recenter();
            }
            Deferred::ResetFlood { .. } => {
                if self.phase == Phase::Ended {
                    self.phase = Phase::Idle;
                }
                self.clear_coverage();
                self.recenter();
            }
        }
    }

    /// Advance the color cycle by one degree
    pub fn color_tick(&mut self) {
        self.hue = (self.hue + 1) % 360;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualScheduler;
    use crate::settings::InfinityStyle;
    use crate::sim::Background;

    const FRAME_MS: u64 = 16;

    /// 40x40 logo in a 440x440 viewport: top-left range [0, 400]^2
    fn square_session() -> Session {
        Session::new(DVec2::new(440.0, 440.0), DVec2::new(40.0, 40.0))
    }

    /// Grab the logo at its center, drag its top-left to `top_left`, release
    fn fling(session: &mut Session, sched: &mut ManualScheduler, top_left: DVec2) {
        let grab = session.body_center();
        assert!(session.pointer_down(grab, sched));
        session.pointer_move(grab + (top_left - session.body().pos));
        session.pointer_up(sched);
    }

    fn has_warning(events: &[SimEvent]) -> bool {
        events.iter().any(|e| matches!(e, SimEvent::Warning(_)))
    }

    #[test]
    fn test_input_ignored_without_mode() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        let center = session.body_center();
        assert!(!session.pointer_down(center, &mut sched));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_pointer_must_hit_logo() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        assert!(!session.pointer_down(DVec2::new(5.0, 5.0), &mut sched));
        assert!(session.pointer_down(DVec2::new(210.0, 230.0), &mut sched));
    }

    #[test]
    fn test_drag_emits_aim_line_in_classic() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.drain_events();

        let grab = session.body_center();
        session.pointer_down(grab, &mut sched);
        session.pointer_move(grab + DVec2::new(50.0, 0.0));
        let events = session.drain_events();
        assert!(events.contains(&SimEvent::AimLine {
            from: DVec2::new(220.0, 220.0),
            to: DVec2::new(270.0, 220.0),
        }));
        assert_eq!(session.body().pos, DVec2::new(250.0, 200.0));
    }

    #[test]
    fn test_classic_frame_corner_hit() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);

        // Center (320, 320) -> velocity (-15, -15), both walls after 20 frames
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        assert_eq!(session.shot().map(|s| s.vel), Some(DVec2::new(-15.0, -15.0)));
        assert!(session.is_animating());
        assert!(!has_warning(&session.drain_events()));

        for _ in 0..19 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert!(session.is_animating());
        assert_eq!(session.bounces(), 0);

        sched.advance(&mut session, FRAME_MS);
        assert_eq!(session.phase(), Phase::Celebrating);
        assert_eq!(session.bounces(), 2);
        assert_eq!(session.body().pos, DVec2::ZERO);
        assert_eq!(sched.frames_run(), 20);
        let events = session.drain_events();
        assert!(events.contains(&SimEvent::Celebrate {
            center: DVec2::new(20.0, 20.0)
        }));
        assert!(events.contains(&SimEvent::BounceCount(2)));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SimEvent::Trail { .. }))
                .count(),
            20
        );

        sched.advance(&mut session, CELEBRATION_RECENTER_MS as u64);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
        assert!(sched.is_idle());
    }

    #[test]
    fn test_classic_speed_multiplier_applies_live() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));

        for _ in 0..4 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert_eq!(session.body().pos, DVec2::new(240.0, 240.0));

        session.set_speed(SpeedSetting::Multiplier(2.0), &mut sched);
        sched.advance(&mut session, FRAME_MS);
        assert_eq!(session.body().pos, DVec2::new(210.0, 210.0));
        // Base velocity is untouched by the multiplier
        assert_eq!(session.body().vel, DVec2::new(-15.0, -15.0));
    }

    #[test]
    fn test_unusable_speed_runs_at_1x() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);

        session.set_speed(SpeedSetting::Multiplier(0.0), &mut sched);
        assert_eq!(session.settings().speed, SpeedSetting::Multiplier(1.0));

        // Written straight into the settings, bypassing set_speed
        session.settings_mut().speed = SpeedSetting::Multiplier(f64::NAN);
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        for _ in 0..4 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert_eq!(session.body().pos, DVec2::new(240.0, 240.0));

        for _ in 0..16 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert_eq!(session.phase(), Phase::Celebrating);
    }

    #[test]
    fn test_instant_while_idle_waits_for_release() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.drain_events();

        session.set_speed(SpeedSetting::Instant, &mut sched);
        assert_eq!(session.settings().speed, SpeedSetting::Instant);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.drain_events().is_empty());
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
        assert!(sched.is_idle());

        // Also untouched while the logo is held
        let grab = session.body_center();
        session.pointer_down(grab, &mut sched);
        session.set_speed(SpeedSetting::Instant, &mut sched);
        assert!(matches!(session.phase(), Phase::Dragging { .. }));

        session.pointer_move(grab + DVec2::new(100.0, 100.0));
        session.pointer_up(&mut sched);
        assert_eq!(session.phase(), Phase::Celebrating);
    }

    #[test]
    fn test_classic_warns_when_corner_unreachable() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.drain_events();

        // Velocity (-15, -7.5) never lines up with a corner in this arena
        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));
        let events = session.drain_events();
        assert!(events.contains(&SimEvent::Warning(NEVER_HITS_CORNER.to_string())));
        assert!(session.is_animating());
    }

    #[test]
    fn test_classic_instant_corner() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.set_speed(SpeedSetting::Instant, &mut sched);

        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        assert_eq!(session.phase(), Phase::Celebrating);
        assert_eq!(session.bounces(), 2);
        assert_eq!(session.body().pos, DVec2::ZERO);
        assert!(!sched.frame_pending());

        sched.advance(&mut session, CELEBRATION_RECENTER_MS as u64);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
    }

    #[test]
    fn test_classic_instant_unreachable_recenters() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.set_speed(SpeedSetting::Instant, &mut sched);
        session.drain_events();

        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));
        let events = session.drain_events();
        assert!(has_warning(&events));
        assert!(events.contains(&SimEvent::Recentered));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
        assert!(sched.is_idle());
    }

    #[test]
    fn test_switch_to_instant_mid_flight() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        for _ in 0..5 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert_eq!(session.body().pos, DVec2::new(225.0, 225.0));

        // Re-aims from (245, 245): diagonal into the top-left corner
        session.set_speed(SpeedSetting::Instant, &mut sched);
        assert_eq!(session.phase(), Phase::Celebrating);
        assert_eq!(session.body().pos, DVec2::ZERO);
        assert_eq!(session.bounces(), 2);
    }

    #[test]
    fn test_flood_corner_end() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Flood, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        assert!(!sched.countdown_active());

        for _ in 0..20 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert_eq!(session.phase(), Phase::Ended);
        let events = session.drain_events();
        let ended = events.iter().find_map(|e| match e {
            SimEvent::FloodEnded { reason, coverage } => Some((*reason, *coverage)),
            _ => None,
        });
        let (reason, coverage) = ended.expect("flood run should end");
        assert_eq!(reason, FloodEndReason::CornerHit);
        assert!(coverage > 0.0);
        assert_eq!(session.bounces(), 0);

        sched.advance(&mut session, FLOOD_RESET_MS as u64);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.coverage().percentage(), 0.0);
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
    }

    #[test]
    fn test_flood_timer_end() {
        // 40x20 logo in 440x320: top-left range [0, 400] x [0, 300]
        let mut session = Session::new(DVec2::new(440.0, 320.0), DVec2::new(40.0, 20.0));
        let mut sched = ManualScheduler::new();
        session.settings_mut().flood_end = FloodEndMode::Timer;
        session.settings_mut().timer_secs = 5.0;
        session.enter_mode(Mode::Flood, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));
        assert!(sched.countdown_active());
        assert_eq!(session.countdown_ms(), Some(5000));

        for _ in 0..490 {
            sched.advance(&mut session, 10);
        }
        assert!(session.is_animating());
        assert_eq!(session.countdown_ms(), Some(100));

        for _ in 0..10 {
            sched.advance(&mut session, 10);
        }
        assert!(!session.is_animating());
        assert_eq!(session.phase(), Phase::Ended);
        assert!(!sched.countdown_active());

        let events = session.drain_events();
        let end_index = events
            .iter()
            .position(|e| matches!(e, SimEvent::FloodEnded { .. }))
            .expect("flood run should end");
        let SimEvent::FloodEnded { reason, coverage } = events[end_index].clone() else {
            unreachable!()
        };
        assert_eq!(reason, FloodEndReason::TimeUp);

        let last_painted = events[..end_index]
            .iter()
            .rev()
            .find_map(|e| match e {
                SimEvent::Coverage(pct) => Some(*pct),
                _ => None,
            })
            .expect("coverage reported while running");
        assert_eq!(coverage, last_painted);
        assert_eq!(coverage, session.coverage().percentage());

        // Coverage only grows during the run
        let reported: Vec<f64> = events[..end_index]
            .iter()
            .filter_map(|e| match e {
                SimEvent::Coverage(pct) => Some(*pct),
                _ => None,
            })
            .collect();
        assert!(reported.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_flood_coverage_resets_on_new_shot() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Flood, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));
        for _ in 0..10 {
            sched.advance(&mut session, FRAME_MS);
        }
        assert!(session.coverage().percentage() > 0.0);

        let grab = session.body_center();
        assert!(session.pointer_down(grab, &mut sched));
        assert_eq!(session.coverage().percentage(), 0.0);
        assert!(!session.is_animating());
    }

    #[test]
    fn test_mode_switch_cancels_countdown_and_loop() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.settings_mut().flood_end = FloodEndMode::Timer;
        session.enter_mode(Mode::Flood, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));
        sched.advance(&mut session, FRAME_MS);
        assert!(sched.countdown_active());

        session.enter_mode(Mode::Classic, &mut sched);
        assert!(!sched.countdown_active());
        assert_eq!(session.countdown_ms(), None);
        assert_eq!(session.phase(), Phase::Idle);

        // A frame already requested by the old loop does nothing
        sched.advance(&mut session, FRAME_MS);
        assert_eq!(session.body().pos, DVec2::new(200.0, 200.0));
        assert!(sched.is_idle());
    }

    #[test]
    fn test_stale_recenter_is_dropped() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Classic, &mut sched);
        session.set_speed(SpeedSetting::Instant, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 300.0));
        assert_eq!(session.phase(), Phase::Celebrating);

        // Grab the logo from the corner before the recenter fires
        assert!(session.pointer_down(DVec2::new(10.0, 10.0), &mut sched));
        session.pointer_move(DVec2::new(110.0, 110.0));
        sched.advance(&mut session, 1000);
        assert_eq!(sched.deferred_pending(), 0);
        assert_eq!(session.body().pos, DVec2::new(100.0, 100.0));
        assert!(matches!(session.phase(), Phase::Dragging { .. }));
    }

    #[test]
    fn test_infinity_runs_until_exit() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Infinity, &mut sched);
        fling(&mut session, &mut sched, DVec2::new(300.0, 250.0));

        for _ in 0..1000 {
            sched.advance(&mut session, FRAME_MS);
            session.color_tick();
        }
        assert!(session.is_animating());
        let pos = session.body().pos;
        assert!(pos.cmpge(DVec2::ZERO).all() && pos.cmple(DVec2::splat(400.0)).all());
        assert_eq!(session.body().vel.abs(), DVec2::new(15.0, 7.5));
        assert_eq!(session.hue(), 1000 % 360);

        session.return_to_menu(&mut sched);
        assert_eq!(session.mode(), None);
        assert!(!session.is_animating());
        sched.advance(&mut session, FRAME_MS);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_rainbow_background_in_infinity() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.settings_mut().infinity_style = InfinityStyle::RainbowOpposites;
        session.enter_mode(Mode::Infinity, &mut sched);
        for _ in 0..10 {
            session.color_tick();
        }
        assert_eq!(session.background(), Background::Hue(190));

        session.enter_mode(Mode::Classic, &mut sched);
        assert_eq!(session.background(), Background::Black);
    }

    #[test]
    fn test_resize_recenters_idle_logo() {
        let mut session = square_session();
        let mut sched = ManualScheduler::new();
        session.enter_mode(Mode::Flood, &mut sched);
        session.resize(DVec2::new(1000.0, 800.0), DVec2::new(100.0, 50.0));
        assert_eq!(session.body().pos, DVec2::new(450.0, 375.0));
        assert_eq!(session.coverage().total_cells(), 800_000);
        assert_eq!(session.arena().max_top_left(), DVec2::new(900.0, 750.0));
    }
}
