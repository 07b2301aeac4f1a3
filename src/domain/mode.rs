/// Global scatter/chase schedule and the frightened window.
///
/// ## Schedule (seconds)
/// ┌──────┬─────────┬───────┐
/// │ Step │ Scatter │ Chase │
/// ├──────┼─────────┼───────┤
/// │ 0    │ 7       │ 20    │
/// │ 1    │ 7       │ 20    │
/// │ 2    │ 5       │ 20    │
/// │ 3    │ 5       │ ∞     │
/// └──────┴─────────┴───────┘
///
/// The phase timer is frozen while a frightened window is open, so a
/// power pellet eaten mid-chase hands the ghosts back to that same chase
/// with the same time left on it.
///
/// Only ghosts out in the maze follow the phase (`Ghost::follows_phase`).
/// Pen ghosts pick it up when they leave; frightened ones when the window
/// closes; eyes when they come back out.

use tracing::debug;

use super::ghost::{Ghost, Mode};
use super::rules::ghost_points;
use super::timer::Countdown;

const SCATTER_SECS: [f32; 4] = [7.0, 7.0, 5.0, 5.0];
const CHASE_SECS: [f32; 4] = [20.0, 20.0, 20.0, f32::INFINITY];
const LAST_STEP: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SchedulePhase {
    Scatter,
    Chase,
}

#[derive(Clone, Debug)]
pub struct ModeScheduler {
    step: usize,
    phase: SchedulePhase,
    phase_timer: Countdown,
    frightened: Countdown,
    frightened_secs: f32,
    blink_secs: f32,
    /// Ghosts caught in the current frightened window.
    ghosts_eaten: u32,
}

impl ModeScheduler {
    pub fn new(frightened_secs: f32, blink_secs: f32) -> Self {
        ModeScheduler {
            step: 0,
            phase: SchedulePhase::Scatter,
            phase_timer: Countdown::armed(SCATTER_SECS[0]),
            frightened: Countdown::IDLE,
            frightened_secs,
            blink_secs,
            ghosts_eaten: 0,
        }
    }

    /// Back to step 0 scatter with no frightened window.
    pub fn reset(&mut self) {
        *self = ModeScheduler::new(self.frightened_secs, self.blink_secs);
    }

    pub fn phase(&self) -> SchedulePhase {
        self.phase
    }

    pub fn phase_mode(&self) -> Mode {
        match self.phase {
            SchedulePhase::Scatter => Mode::Scatter,
            SchedulePhase::Chase => Mode::Chase,
        }
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened.is_running()
    }

    /// Inside the last stretch of the frightened window.
    pub fn blinking(&self) -> bool {
        self.is_frightened() && self.frightened.remaining() <= self.blink_secs
    }

    pub fn phase_remaining(&self) -> f32 {
        self.phase_timer.remaining()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Advance the phase timer. On a flip every phase-following ghost adopts
    /// the new mode and reverses. Returns `true` on a flip.
    pub fn advance(&mut self, dt: f32, ghosts: &mut [Ghost]) -> bool {
        if self.is_frightened() || !self.phase_timer.tick(dt) {
            return false;
        }

        match self.phase {
            SchedulePhase::Scatter => {
                self.phase = SchedulePhase::Chase;
                self.phase_timer.arm(CHASE_SECS[self.step]);
            }
            SchedulePhase::Chase => {
                self.step = (self.step + 1).min(LAST_STEP);
                self.phase = SchedulePhase::Scatter;
                self.phase_timer.arm(SCATTER_SECS[self.step]);
            }
        }
        debug!(step = self.step, phase = ?self.phase, "mode phase flip");

        let mode = self.phase_mode();
        for g in ghosts.iter_mut().filter(|g| g.follows_phase()) {
            g.set_mode(mode);
            g.reverse();
        }
        true
    }

    /// Power pellet: open (or restart) the frightened window. Ghosts out in
    /// the maze turn frightened and reverse; eyes and pen ghosts are left alone.
    pub fn activate_frightened(&mut self, ghosts: &mut [Ghost]) {
        self.frightened.arm(self.frightened_secs);
        self.ghosts_eaten = 0;
        for g in ghosts.iter_mut() {
            if g.is_frightened() {
                g.set_blinking(false);
            } else if g.follows_phase() {
                g.set_mode(Mode::Frightened);
            }
        }
    }

    /// Run the frightened countdown and push the blink flag to ghosts.
    /// On expiry frightened ghosts revert to the current phase.
    /// Returns `true` on the tick the window closes.
    pub fn tick_frightened(&mut self, dt: f32, ghosts: &mut [Ghost]) -> bool {
        if !self.is_frightened() {
            return false;
        }
        if self.frightened.tick(dt) {
            let mode = self.phase_mode();
            for g in ghosts.iter_mut().filter(|g| g.is_frightened()) {
                g.set_mode(mode);
            }
            self.ghosts_eaten = 0;
            return true;
        }
        let blink = self.blinking();
        for g in ghosts.iter_mut() {
            g.set_blinking(blink);
        }
        false
    }

    /// Score for the next caught ghost in this window; bumps the ladder.
    pub fn award_ghost(&mut self) -> u32 {
        let points = ghost_points(self.ghosts_eaten);
        self.ghosts_eaten += 1;
        points
    }
}
