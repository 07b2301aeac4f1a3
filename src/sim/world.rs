/// WorldState: the complete snapshot of a running game.
///
/// ## Phases
///
///   PressStart → Startup → Ready → Playing ⇄ Paused
///   Playing → GhostEaten → Playing
///   Playing → PreDeath → Death → Ready | GameOver
///   Playing → LevelClear → Ready (next level)
///   GameOver → Startup (restart)
///
/// `phase_timer` is armed by `set_phase` for the timed phases; `phase_elapsed`
/// counts up in every phase (Startup needs a minimum dwell).
///
/// ## Round vs. life
///
///   - `start_level`: new round: pellets come back, speeds follow the level.
///   - `reset_positions`: after a lost life: agents and the mode schedule
///     restart, eaten pellets stay eaten.

use tracing::info;

use crate::config::TimingConfig;
use crate::domain::ghost::{Ghost, Personality};
use crate::domain::maze::Maze;
use crate::domain::mode::ModeScheduler;
use crate::domain::nav::Position;
use crate::domain::player::Player;
use crate::domain::rules::{self, BonusKind};
use crate::domain::timer::{Countdown, Repeat};

use super::event::SirenState;
use super::ports::HighScoreStore;

/// Floating score label lifetime.
pub const POPUP_SECS: f32 = 1.0;
/// Maze flash toggle during LevelClear, and the attract prompt blink.
const FLASH_SECS: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    PressStart,
    Startup,
    Ready,
    Playing,
    Paused,
    GhostEaten,
    PreDeath,
    Death,
    LevelClear,
    GameOver,
}

#[derive(Clone, Debug)]
pub struct Bonus {
    pub kind: BonusKind,
    pub pos: Position,
    pub timer: Countdown,
}

#[derive(Clone, Debug)]
pub struct Popup {
    pub points: u32,
    pub pos: Position,
    pub life: Countdown,
}

pub struct WorldState {
    // ── Board ──
    pub maze: Maze,
    pub player: Player,
    pub ghosts: [Ghost; 4],
    pub scheduler: ModeScheduler,

    // ── Meta ──
    pub phase: Phase,
    pub score: u32,
    pub high_score: u32,
    pub lives: u32,
    pub level: u32,
    pub tick: u64,
    /// High score on record when the current game started.
    pub record_at_start: u32,
    pub record_beaten: bool,

    // ── Bonus item / popups ──
    pub bonus: Option<Bonus>,
    /// How many of `BONUS_THRESHOLDS` were already offered this round.
    pub bonus_offered: usize,
    pub popups: Vec<Popup>,
    /// Hidden while the GhostEaten freeze shows its score.
    pub eaten_ghost: Option<usize>,

    // ── Timers ──
    pub phase_timer: Countdown,
    pub phase_elapsed: f32,
    /// Visible half of a blink: maze flash on LevelClear, prompt on PressStart.
    pub flash_on: bool,
    flash: Repeat,

    // ── Audio state ──
    pub siren: SirenState,

    // ── Config ──
    pub timing: TimingConfig,
    pub starting_lives: u32,
}

// ── Construction ──

impl WorldState {
    /// The high score is read once, here.
    pub fn new(
        maze: Maze,
        timing: TimingConfig,
        starting_lives: u32,
        store: &dyn HighScoreStore,
    ) -> Self {
        let high_score = store.load_high_score();
        info!(high_score, "high score loaded");
        WorldState {
            maze,
            player: Player::new(),
            ghosts: Personality::ALL.map(Ghost::new),
            scheduler: ModeScheduler::new(timing.frightened_secs, timing.frightened_blink_secs),
            phase: Phase::PressStart,
            score: 0,
            high_score,
            lives: starting_lives,
            level: 1,
            tick: 0,
            record_at_start: high_score,
            record_beaten: false,
            bonus: None,
            bonus_offered: 0,
            popups: vec![],
            eaten_ghost: None,
            phase_timer: Countdown::IDLE,
            phase_elapsed: 0.0,
            flash_on: true,
            flash: Repeat::new(FLASH_SECS),
            siren: SirenState::Off,
            timing,
            starting_lives,
        }
    }
}

// ── Phase / round control ──

impl WorldState {
    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, level = self.level, "phase");
        }
        self.phase = phase;
        self.phase_elapsed = 0.0;
        self.flash_on = true;
        self.flash.reset();
        let t = &self.timing;
        let secs = match phase {
            Phase::Ready => Some(t.ready_secs),
            Phase::GhostEaten => Some(t.ghost_eaten_freeze_secs),
            Phase::PreDeath => Some(t.pre_death_freeze_secs),
            Phase::LevelClear => Some(t.level_clear_secs),
            _ => None,
        };
        match secs {
            Some(s) => self.phase_timer.arm(s),
            None => self.phase_timer.clear(),
        }
    }

    /// Advance the per-phase clocks. Returns `true` on the tick `phase_timer` runs out.
    pub fn tick_phase(&mut self, dt: f32) -> bool {
        self.phase_elapsed += dt;
        if self.flash.tick(dt) % 2 == 1 {
            self.flash_on = !self.flash_on;
        }
        self.phase_timer.tick(dt)
    }

    /// Fresh game at level 1. Does not change phase.
    pub fn start_game(&mut self) {
        self.score = 0;
        self.lives = self.starting_lives;
        self.level = 1;
        self.record_at_start = self.high_score;
        self.record_beaten = false;
        self.start_level();
        info!(lives = self.lives, "new game");
    }

    /// Full maze, speeds for the current level, everyone on their marks.
    pub fn start_level(&mut self) {
        self.maze.reset_round();
        self.bonus_offered = 0;
        self.player.speed_scale = rules::player_speed_scale(self.level);
        let ghost_scale = rules::ghost_speed_scale(self.level);
        for g in self.ghosts.iter_mut() {
            g.speed_scale = ghost_scale;
        }
        self.reset_positions();
        info!(level = self.level, pellets = self.maze.total(), "level start");
    }

    /// Agents back to their start, schedule from the top. Pellets stay as they are.
    pub fn reset_positions(&mut self) {
        self.player.reset();
        for g in self.ghosts.iter_mut() {
            g.reset();
        }
        self.scheduler.reset();
        self.bonus = None;
        self.popups.clear();
        self.eaten_ghost = None;
    }

    pub fn spawn_popup(&mut self, points: u32, pos: Position) {
        self.popups.push(Popup { points, pos, life: Countdown::armed(POPUP_SECS) });
    }

    pub fn age_popups(&mut self, dt: f32) {
        for p in self.popups.iter_mut() {
            p.life.tick(dt);
        }
        self.popups.retain(|p| p.life.is_running());
    }
}
