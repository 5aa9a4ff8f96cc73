//! Frame scheduler: run state, tick/spawn timers and entity backpressure
//!
//! Two logical timers drive the session while it is `Running`: a fast tick
//! timer (integration, particles, blade trail) and a slow spawn timer. The
//! host calls [`FrameScheduler::pump`] with the current time from its own
//! frame callback and the scheduler fires whatever is due, in due-time
//! order. Outside `Running` both timers are disarmed, so no backlog builds
//! up while paused or hidden.
//!
//! ```text
//! Idle --start--> Running <--toggle--> Paused
//!                    |                   |
//!               tab hidden            resume
//!                    v                   |
//!                Suspended --resume------+--> Running (or Suspended if still hidden)
//! ```

use super::events::EventSink;
use super::session::SimulationSession;
use super::state::RunState;
use crate::consts::{MAX_CATCH_UP_MS, MAX_TICKS_PER_PUMP};

/// A periodic logical timer
#[derive(Debug, Clone, Copy)]
struct Timer {
    period_ms: f64,
    next_due: Option<f64>,
}

impl Timer {
    fn new(period_ms: f64) -> Self {
        Self {
            period_ms,
            next_due: None,
        }
    }

    /// Arm one period from `now` unless already armed
    fn arm(&mut self, now_ms: f64) {
        if self.next_due.is_none() {
            self.next_due = Some(now_ms + self.period_ms);
        }
    }

    fn disarm(&mut self) {
        self.next_due = None;
    }

    fn due(&self, now_ms: f64) -> Option<f64> {
        self.next_due.filter(|&t| t <= now_ms)
    }

    fn advance(&mut self) {
        if let Some(t) = self.next_due.as_mut() {
            *t += self.period_ms;
        }
    }

    /// Forget any backlog; next fire is one period from `now`
    fn skip_to(&mut self, now_ms: f64) -> f64 {
        let dropped = self.next_due.map_or(0.0, |t| (now_ms - t).max(0.0));
        self.next_due = Some(now_ms + self.period_ms);
        dropped
    }
}

/// What a single pump did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PumpReport {
    pub ticks: u32,
    pub spawns: u32,
    /// Entities removed by backpressure trims
    pub trimmed: usize,
    /// Tokens reported missed
    pub missed: u32,
    /// Backlog discarded instead of replayed (ms)
    pub dropped_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fire {
    Tick(f64),
    Spawn,
}

/// Owns the session and decides when it advances
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    session: SimulationSession,
    tick_timer: Timer,
    spawn_timer: Timer,
    max_ticks_per_pump: u32,
    max_catch_up_ms: f64,
}

impl FrameScheduler {
    pub fn new(session: SimulationSession) -> Self {
        let config = session.config();
        let tick_timer = Timer::new(config.tick_period_ms);
        let spawn_timer = Timer::new(config.spawn_period_ms);
        Self {
            session,
            tick_timer,
            spawn_timer,
            max_ticks_per_pump: MAX_TICKS_PER_PUMP,
            max_catch_up_ms: MAX_CATCH_UP_MS,
        }
    }

    pub fn session(&self) -> &SimulationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SimulationSession {
        &mut self.session
    }

    pub fn state(&self) -> RunState {
        self.session.run_state()
    }

    fn cancel_timers(&mut self) {
        self.tick_timer.disarm();
        self.spawn_timer.disarm();
    }

    fn enter(&mut self, state: RunState) {
        if state != RunState::Running {
            self.cancel_timers();
        }
        self.session.set_run_state(state);
    }

    /// Reset all session state and start running
    pub fn start_session(&mut self) {
        self.session.clear();
        self.cancel_timers();
        let state = if self.session.is_visible() {
            RunState::Running
        } else {
            RunState::Suspended
        };
        self.enter(state);
        log::info!("Session started ({:?})", state);
    }

    /// Stop timers and clear all session state
    pub fn end_session(&mut self) {
        self.enter(RunState::Idle);
        self.session.clear();
        log::info!("Session ended");
    }

    /// Player pause button
    pub fn toggle_pause(&mut self) {
        match self.state() {
            RunState::Running => {
                self.enter(RunState::Paused);
                log::info!("Paused");
            }
            RunState::Paused | RunState::Suspended => self.resume(),
            RunState::Idle => {}
        }
    }

    /// Leave Paused/Suspended. Stays Suspended while the tab is hidden.
    pub fn resume(&mut self) {
        if !matches!(self.state(), RunState::Paused | RunState::Suspended) {
            return;
        }
        if self.session.is_visible() {
            self.enter(RunState::Running);
            log::info!("Resumed");
        } else {
            self.enter(RunState::Suspended);
        }
    }

    /// Tab visibility changed. Hiding a running session suspends it;
    /// showing it again does not resume on its own.
    pub fn set_visibility(&mut self, visible: bool) {
        self.session.set_visible(visible);
        if !visible && self.state() == RunState::Running {
            self.enter(RunState::Suspended);
            log::info!("Auto-paused (tab hidden)");
        }
    }

    /// Fire every timer due at `now_ms`, in due-time order
    pub fn pump(&mut self, now_ms: f64, sink: &mut dyn EventSink) -> PumpReport {
        let mut report = PumpReport::default();
        self.session.update_stroke(now_ms);
        if self.state() != RunState::Running {
            return report;
        }

        self.tick_timer.arm(now_ms);
        self.spawn_timer.arm(now_ms);
        for timer in [&mut self.tick_timer, &mut self.spawn_timer] {
            if timer
                .due(now_ms)
                .is_some_and(|t| now_ms - t > self.max_catch_up_ms)
            {
                report.dropped_ms += timer.skip_to(now_ms);
            }
        }
        if report.dropped_ms > 0.0 {
            log::debug!("Dropped {:.0}ms of timer backlog", report.dropped_ms);
        }

        while let Some(fire) = self.next_fire(now_ms) {
            match fire {
                Fire::Tick(at) => {
                    let tick = self.session.tick(at, sink);
                    report.ticks += 1;
                    report.missed += tick.missed;
                    self.tick_timer.advance();
                    if report.ticks >= self.max_ticks_per_pump && self.tick_timer.due(now_ms).is_some() {
                        report.dropped_ms += self.tick_timer.skip_to(now_ms);
                    }
                }
                Fire::Spawn => {
                    if self.session.spawn().is_some() {
                        report.spawns += 1;
                    }
                    self.spawn_timer.advance();
                }
            }
            report.trimmed += self.session.trim_excess();
        }
        report
    }

    fn next_fire(&self, now_ms: f64) -> Option<Fire> {
        match (self.tick_timer.due(now_ms), self.spawn_timer.due(now_ms)) {
            (Some(tick), Some(spawn)) if spawn < tick => Some(Fire::Spawn),
            (Some(tick), _) => Some(Fire::Tick(tick)),
            (None, Some(_)) => Some(Fire::Spawn),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::SimEvent;
    use crate::sim::state::{EntityKind, Playfield};
    use crate::tuning::SimConfig;
    use glam::Vec2;

    fn scheduler() -> FrameScheduler {
        let session = SimulationSession::new(SimConfig::default(), Playfield::new(800.0, 600.0), 7);
        FrameScheduler::new(session)
    }

    /// Pump every 16ms from `from` to `to` inclusive
    fn run(s: &mut FrameScheduler, from: f64, to: f64, events: &mut Vec<SimEvent>) -> PumpReport {
        let mut total = PumpReport::default();
        let mut now = from;
        while now <= to {
            let r = s.pump(now, events);
            total.ticks += r.ticks;
            total.spawns += r.spawns;
            total.trimmed += r.trimmed;
            total.missed += r.missed;
            now += 16.0;
        }
        total
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut s = scheduler();
        let r = run(&mut s, 0.0, 5000.0, &mut Vec::new());
        assert_eq!(r, PumpReport::default());
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_tick_scenario() {
        let mut s = scheduler();
        s.start_session();
        let id = s
            .session_mut()
            .place_entity(EntityKind::Token, Vec2::new(100.0, -40.0), Vec2::new(0.0, 5.0))
            .expect("token in default table");
        let mut events = Vec::new();
        let r = run(&mut s, 0.0, 28.0 * 16.0, &mut events);
        assert_eq!(r.ticks, 28);
        let y = s.session().entity(id).map(|e| e.pos.y).unwrap_or(f32::NAN);
        assert!((y - 100.0).abs() < 1e-4);

        let session = s.session_mut();
        session.start_stroke(Vec2::new(100.0, 90.0), 450.0);
        assert_eq!(session.add_point(Vec2::new(100.0, 100.0), 455.0, &mut events), 1);
        assert_eq!(events.first(), Some(&SimEvent::ScoreDelta { points: 10 }));

        // Consumed on the next tick
        s.pump(464.0, &mut events);
        assert!(s.session().entity(id).is_none());
    }

    #[test]
    fn test_spawn_timer_period() {
        let mut s = scheduler();
        s.start_session();
        let r = run(&mut s, 0.0, 1199.0, &mut Vec::new());
        assert_eq!(r.spawns, 0);
        let r = run(&mut s, 1200.0, 2400.0, &mut Vec::new());
        assert_eq!(r.spawns, 2);
        assert_eq!(s.session().entities().len(), 2);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut s = scheduler();
        s.start_session();
        run(&mut s, 0.0, 2500.0, &mut Vec::new());
        let before: Vec<Vec2> = s.session().entities().iter().map(|e| e.pos).collect();
        assert!(!before.is_empty());

        s.toggle_pause();
        assert_eq!(s.state(), RunState::Paused);
        let r = run(&mut s, 2516.0, 10_000.0, &mut Vec::new());
        assert_eq!(r, PumpReport::default());
        let after: Vec<Vec2> = s.session().entities().iter().map(|e| e.pos).collect();
        assert_eq!(before, after);

        s.toggle_pause();
        assert_eq!(s.state(), RunState::Running);
        // Timers re-arm from the resume pump: nothing queued fires immediately
        let r = s.pump(10_016.0, &mut Vec::new());
        assert_eq!(r.ticks, 0);
        let r = s.pump(10_032.0, &mut Vec::new());
        assert_eq!(r.ticks, 1);
    }

    #[test]
    fn test_hidden_tab_suspends_without_auto_resume() {
        let mut s = scheduler();
        s.start_session();
        s.set_visibility(false);
        assert_eq!(s.state(), RunState::Suspended);
        s.set_visibility(true);
        assert_eq!(s.state(), RunState::Suspended);
        s.resume();
        assert_eq!(s.state(), RunState::Running);
    }

    #[test]
    fn test_hidden_while_paused_stays_paused() {
        let mut s = scheduler();
        s.start_session();
        s.toggle_pause();
        s.set_visibility(false);
        assert_eq!(s.state(), RunState::Paused);
        // Resuming while hidden only gets as far as Suspended
        s.resume();
        assert_eq!(s.state(), RunState::Suspended);
    }

    #[test]
    fn test_stroke_clears_while_paused() {
        let mut s = scheduler();
        s.start_session();
        s.pump(0.0, &mut Vec::new());
        let session = s.session_mut();
        session.start_stroke(Vec2::new(100.0, 100.0), 10.0);
        session.add_point(Vec2::new(120.0, 100.0), 20.0, &mut Vec::new());
        session.end_stroke(30.0);
        assert!(!s.session().gesture_trail().is_empty());

        s.toggle_pause();
        let mut now = 32.0;
        while now <= 5000.0 {
            let r = s.pump(now, &mut Vec::new());
            assert_eq!(r.ticks, 0);
            now += 16.0;
        }
        assert_eq!(s.state(), RunState::Paused);
        assert!(s.session().gesture_trail().is_empty());
    }

    #[test]
    fn test_stroke_clears_while_hidden() {
        let mut s = scheduler();
        s.start_session();
        let session = s.session_mut();
        session.start_stroke(Vec2::new(100.0, 100.0), 0.0);
        session.add_point(Vec2::new(120.0, 100.0), 5.0, &mut Vec::new());
        session.end_stroke(10.0);
        s.set_visibility(false);
        s.pump(200.0, &mut Vec::new());
        assert_eq!(s.state(), RunState::Suspended);
        assert!(s.session().gesture_trail().is_empty());
    }

    #[test]
    fn test_backpressure_trim() {
        let mut s = scheduler();
        s.start_session();
        for _ in 0..16 {
            s.session_mut()
                .place_entity(EntityKind::Bomb, Vec2::new(100.0, 100.0), Vec2::ZERO);
        }
        s.pump(0.0, &mut Vec::new());
        let r = s.pump(16.0, &mut Vec::new());
        assert_eq!(r.trimmed, 4);
        assert_eq!(s.session().entities().len(), 12);
    }

    #[test]
    fn test_long_stall_drops_backlog() {
        let mut s = scheduler();
        s.start_session();
        s.pump(0.0, &mut Vec::new());
        let r = s.pump(5000.0, &mut Vec::new());
        assert!(r.ticks <= MAX_TICKS_PER_PUMP);
        assert!(r.dropped_ms > 0.0);
    }

    #[test]
    fn test_bounded_catch_up() {
        let mut s = scheduler();
        s.start_session();
        s.pump(0.0, &mut Vec::new());
        // 200ms late: within the catch-up window, but capped per pump
        let r = s.pump(216.0, &mut Vec::new());
        assert_eq!(r.ticks, MAX_TICKS_PER_PUMP);
    }

    #[test]
    fn test_start_resets_and_end_clears() {
        let mut s = scheduler();
        s.start_session();
        run(&mut s, 0.0, 3000.0, &mut Vec::new());
        assert!(!s.session().entities().is_empty());
        s.start_session();
        assert!(s.session().entities().is_empty());

        run(&mut s, 3016.0, 6000.0, &mut Vec::new());
        s.end_session();
        assert_eq!(s.state(), RunState::Idle);
        assert!(s.session().entities().is_empty());
        assert!(s.session().particles().is_empty());
    }
}
