/// The player agent.
///
/// State machine: Alive → Dying → Dead. `Dying` runs a fixed 12-frame
/// animation (0.1 s per frame); the orchestrator waits for `Dead` before
/// taking a life.
///
/// While alive, decisions happen only on tile centers: take the buffered
/// direction if it is legal right now, else keep going if possible, else
/// stop. Pellets are bitten on centers too, which raises a one-tick flag
/// and slows the player for that tick.

use super::maze::Maze;
use super::nav::{self, Direction, Position, TilePos};
use super::rules::{BASE_SPEED, PLAYER_EATING_SPEED, PLAYER_FRIGHT_SPEED, PLAYER_SPEED};
use super::timer::Repeat;

pub const START_TILE: TilePos = TilePos::new(14, 22);

pub const DEATH_FRAMES: u32 = 12;
const DEATH_FRAME_SECS: f32 = 0.1;

pub const MOUTH_FRAMES: u32 = 5;
const MOUTH_FRAME_SECS: f32 = 0.05;

/// Upper bound on center-to-center hops in one tick.
const MAX_HOPS: usize = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Alive,
    Dying,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub dir: Direction,
    /// Buffered input; committed on the next center where it is legal.
    pub desired: Direction,
    pub state: PlayerState,
    /// Per-tick events, cleared at the start of every `update`.
    pub ate_pellet: bool,
    pub ate_power: bool,
    /// Level speed curve factor.
    pub speed_scale: f32,
    pub mouth_frame: u32,
    pub death_frame: u32,
    mouth: Repeat,
    death: Repeat,
}

impl Player {
    pub fn new() -> Self {
        Player {
            pos: Position::of_tile(START_TILE),
            dir: Direction::Left,
            desired: Direction::Left,
            state: PlayerState::Alive,
            ate_pellet: false,
            ate_power: false,
            speed_scale: 1.0,
            mouth_frame: 0,
            death_frame: 0,
            mouth: Repeat::new(MOUTH_FRAME_SECS),
            death: Repeat::new(DEATH_FRAME_SECS),
        }
    }

    /// Back to the start tile, alive. Keeps the level speed.
    pub fn reset(&mut self) {
        let scale = self.speed_scale;
        *self = Player::new();
        self.speed_scale = scale;
    }

    pub fn tile(&self) -> TilePos {
        self.pos.tile()
    }

    pub fn is_alive(&self) -> bool {
        self.state == PlayerState::Alive
    }

    /// Illegal requests are not rejected here; they simply never commit.
    pub fn set_desired(&mut self, dir: Direction) {
        if dir != Direction::None {
            self.desired = dir;
        }
    }

    pub fn ate_something(&self) -> bool {
        self.ate_pellet || self.ate_power
    }

    pub fn update(&mut self, dt: f32, maze: &mut Maze, ghosts_frightened: bool) {
        self.ate_pellet = false;
        self.ate_power = false;
        if self.state != PlayerState::Alive {
            return;
        }

        if self.pos.is_tile_centered() {
            self.on_center(maze);
        }

        let fraction = if self.ate_something() {
            PLAYER_EATING_SPEED
        } else if ghosts_frightened {
            PLAYER_FRIGHT_SPEED
        } else {
            PLAYER_SPEED
        };
        let mut budget = BASE_SPEED * fraction * self.speed_scale * dt;

        for _ in 0..MAX_HOPS {
            if budget <= 0.0 || self.dir == Direction::None {
                break;
            }
            budget = nav::advance(&mut self.pos, self.dir, budget);
            nav::wrap_tunnel(&mut self.pos);
            if self.pos.is_tile_centered() {
                self.on_center(maze);
            }
        }

        if self.dir == Direction::None {
            self.mouth_frame = 0;
            self.mouth.reset();
        } else {
            self.mouth_frame = (self.mouth_frame + self.mouth.tick(dt)) % MOUTH_FRAMES;
        }
    }

    fn on_center(&mut self, maze: &mut Maze) {
        self.pos.snap();
        let here = self.tile();

        if nav::can_move(maze, here, self.desired, false) {
            self.dir = self.desired;
        } else if !nav::can_move(maze, here, self.dir, false) {
            self.dir = Direction::None;
        }

        if maze.consume_pellet(here) {
            self.ate_pellet = true;
        } else if maze.consume_power_pellet(here) {
            self.ate_power = true;
        }
    }

    pub fn die(&mut self) {
        self.state = PlayerState::Dying;
        self.dir = Direction::None;
        self.death_frame = 0;
        self.death.reset();
    }

    /// Advance the death animation. Returns `true` on the tick it completes.
    pub fn update_death(&mut self, dt: f32) -> bool {
        if self.state != PlayerState::Dying {
            return false;
        }
        self.death_frame += self.death.tick(dt);
        if self.death_frame >= DEATH_FRAMES {
            self.death_frame = DEATH_FRAMES - 1;
            self.state = PlayerState::Dead;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run(p: &mut Player, maze: &mut Maze, secs: f32) {
        let ticks = (secs / DT).round() as usize;
        for _ in 0..ticks {
            p.update(DT, maze, false);
        }
    }

    #[test]
    fn starts_on_row_22_facing_left() {
        let p = Player::new();
        assert_eq!(p.tile(), TilePos::new(14, 22));
        assert!(p.pos.is_tile_centered());
        assert_eq!(p.dir, Direction::Left);
    }

    #[test]
    fn eats_start_tile_and_slows() {
        let mut maze = Maze::classic().unwrap();
        let mut p = Player::new();
        p.update(DT, &mut maze, false);
        assert!(p.ate_pellet);
        assert_eq!(maze.remaining(), 239);
        let eating_step = 112.0 - p.pos.x;

        let mut q = Player::new();
        let mut empty = Maze::classic().unwrap();
        empty.consume_pellet(START_TILE);
        q.update(DT, &mut empty, false);
        assert!(!q.ate_pellet);
        let normal_step = 112.0 - q.pos.x;
        assert!(eating_step < normal_step);

        p.update(DT, &mut maze, false);
        assert!(!p.ate_pellet, "flag lasts one tick");
    }

    #[test]
    fn stops_at_wall() {
        let mut maze = Maze::classic().unwrap();
        let mut p = Player::new();
        // Row 22 runs left from col 14 to col 6 before the wall at col 5.
        run(&mut p, &mut maze, 3.0);
        assert_eq!(p.tile(), TilePos::new(6, 22));
        assert_eq!(p.dir, Direction::None);
        assert_eq!(p.mouth_frame, 0);
    }

    #[test]
    fn buffered_turn_commits_at_corner() {
        let mut maze = Maze::classic().unwrap();
        let mut p = Player::new();
        // Col 12 opens upward from row 22 (row 21 col 12 is a pellet).
        p.set_desired(Direction::Up);
        run(&mut p, &mut maze, 0.4);
        assert_eq!(p.pos.x, 12.0 * 8.0, "turned exactly on the column center");
        assert!(p.pos.y < 22.0 * 8.0);
        assert_eq!(p.dir, Direction::Up);
    }

    #[test]
    fn illegal_request_is_ignored() {
        let mut maze = Maze::classic().unwrap();
        let mut p = Player::new();
        p.set_desired(Direction::Down); // row 23 col 14 is wall
        p.update(DT, &mut maze, false);
        assert_eq!(p.dir, Direction::Left);
    }

    #[test]
    fn runs_through_the_tunnel() {
        let mut maze = Maze::classic().unwrap();
        let mut p = Player::new();
        p.pos = Position::of_tile(TilePos::new(2, 14));
        p.dir = Direction::Left;
        p.desired = Direction::Left;
        run(&mut p, &mut maze, 1.0);
        assert!(p.pos.x > 150.0, "came out on the right side, x = {}", p.pos.x);
        assert_eq!(p.tile().y, 14);
    }

    #[test]
    fn death_runs_twelve_frames() {
        let mut p = Player::new();
        p.die();
        assert_eq!(p.state, PlayerState::Dying);
        let mut done_at = None;
        for i in 1..=100 {
            if p.update_death(DT) {
                done_at = Some(i);
                break;
            }
        }
        // 12 frames × 0.1 s = 1.2 s = 72 ticks
        let ticks = done_at.unwrap();
        assert!((71..=73).contains(&ticks), "completed after {ticks} ticks");
        assert_eq!(p.state, PlayerState::Dead);
        assert!(!p.update_death(DT));
    }
}
