/// Ghosts: four fixed personalities sharing one motion model.
///
/// Each ghost carries exactly one `GhostState`, so combinations like
/// "frightened while still in the pen" cannot be expressed:
///
///   Home(Waiting → Centering → Rising) ──release──▶ Scattering / Chasing / Frightened
///   Scattering ⇄ Chasing                (global phase flips, with a reversal)
///   Scattering | Chasing ──power──▶ Frightened ──expiry──▶ current phase
///   Frightened ──caught──▶ ReturningEyes(ToDoor → Aligning → Descending) ──▶ Home(Rising)
///
/// Free roaming picks a direction only on tile centers: among the legal
/// non-reversing moves, the one whose next tile is closest to `target`
/// (farthest while frightened). Ties go to the first in Up, Left, Down,
/// Right order. Reversing is the last resort.

use super::maze::Maze;
use super::nav::{self, Direction, Position, TilePos, TILE};
use super::rules::{
    BASE_SPEED, GHOST_EYES_SPEED, GHOST_FRIGHT_SPEED, GHOST_SPEED, GHOST_TUNNEL_SPEED, HOUSE_SPEED,
};
use super::timer::{Countdown, Repeat};

/// Pixel column shared by the door center and the pen center.
const DOOR_CENTER_X: f32 = 13.0 * TILE + TILE / 2.0;
/// Row just outside the door, where released ghosts appear.
const ABOVE_DOOR_Y: f32 = 11.0 * TILE;
const PEN_CENTER_Y: f32 = 14.0 * TILE;

/// Where eyes head for: the tile left of the door column, just above the door.
pub const EYES_TARGET: TilePos = TilePos::new(13, 11);

pub const BODY_FRAMES: u32 = 2;
const BODY_FRAME_SECS: f32 = 0.15;
const BLINK_TOGGLE_SECS: f32 = 0.15;

const MAX_HOPS: usize = 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Personality {
    /// Direct pursuit.
    Blinky,
    /// Ambushes four tiles ahead.
    Pinky,
    /// Doubles the vector from Blinky to two tiles ahead.
    Inky,
    /// Pursues from afar, retreats up close.
    Clyde,
}

impl Personality {
    pub const ALL: [Personality; 4] =
        [Personality::Blinky, Personality::Pinky, Personality::Inky, Personality::Clyde];

    pub fn scatter_corner(self) -> TilePos {
        match self {
            Personality::Blinky => TilePos::new(25, 0),
            Personality::Pinky => TilePos::new(2, 0),
            Personality::Inky => TilePos::new(27, 30),
            Personality::Clyde => TilePos::new(0, 30),
        }
    }

    fn start(self) -> (Position, Direction) {
        match self {
            Personality::Blinky => (Position::new(DOOR_CENTER_X, ABOVE_DOOR_Y), Direction::Left),
            Personality::Pinky => (Position::new(DOOR_CENTER_X, PEN_CENTER_Y), Direction::Down),
            Personality::Inky => (Position::new(11.0 * TILE + TILE / 2.0, PEN_CENTER_Y), Direction::Up),
            Personality::Clyde => (Position::new(15.0 * TILE + TILE / 2.0, PEN_CENTER_Y), Direction::Up),
        }
    }

    /// Seconds in the pen before the exit script starts.
    fn exit_delay(self) -> f32 {
        match self {
            Personality::Blinky | Personality::Pinky => 0.0,
            Personality::Inky => 3.0,
            Personality::Clyde => 6.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Personality::Blinky => "Blinky",
            Personality::Pinky => "Pinky",
            Personality::Inky => "Inky",
            Personality::Clyde => "Clyde",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Scatter,
    Chase,
    Frightened,
    Eyes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HomePhase {
    Waiting,
    /// Sliding sideways onto the door column.
    Centering,
    /// Going up through the door.
    Rising,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EyesPhase {
    /// Navigating the maze toward `EYES_TARGET`.
    ToDoor,
    /// Above the door, sliding onto the door column.
    Aligning,
    /// Dropping through the door to the pen center.
    Descending,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostState {
    Home(HomePhase),
    Scattering,
    Chasing,
    Frightened { blinking: bool },
    ReturningEyes(EyesPhase),
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub personality: Personality,
    pub pos: Position,
    pub dir: Direction,
    pub state: GhostState,
    /// Set once per tick by targeting.
    pub target: TilePos,
    /// Level speed curve factor.
    pub speed_scale: f32,
    pub body_frame: u32,
    /// Visible half of the blink cycle while frightened and blinking.
    pub flash: bool,
    /// Came back as eyes; leaves the pen scattering.
    returned: bool,
    release: Countdown,
    body: Repeat,
    blink: Repeat,
}

impl Ghost {
    pub fn new(personality: Personality) -> Self {
        let (pos, dir) = personality.start();
        let state = if personality == Personality::Blinky {
            GhostState::Scattering
        } else {
            GhostState::Home(HomePhase::Waiting)
        };
        Ghost {
            personality,
            pos,
            dir,
            state,
            target: personality.scatter_corner(),
            speed_scale: 1.0,
            body_frame: 0,
            flash: false,
            returned: false,
            release: Countdown::armed(personality.exit_delay()),
            body: Repeat::new(BODY_FRAME_SECS),
            blink: Repeat::new(BLINK_TOGGLE_SECS),
        }
    }

    /// Back to the start position and pen timer. Keeps the level speed.
    pub fn reset(&mut self) {
        let scale = self.speed_scale;
        *self = Ghost::new(self.personality);
        self.speed_scale = scale;
    }

    pub fn tile(&self) -> TilePos {
        self.pos.tile()
    }

    /// Pen ghosts idle in scatter.
    pub fn mode(&self) -> Mode {
        match self.state {
            GhostState::Home(_) | GhostState::Scattering => Mode::Scatter,
            GhostState::Chasing => Mode::Chase,
            GhostState::Frightened { .. } => Mode::Frightened,
            GhostState::ReturningEyes(_) => Mode::Eyes,
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self.state, GhostState::Home(_))
    }

    pub fn is_eyes(&self) -> bool {
        matches!(self.state, GhostState::ReturningEyes(_))
    }

    pub fn is_frightened(&self) -> bool {
        matches!(self.state, GhostState::Frightened { .. })
    }

    /// Out in the maze following the global scatter/chase phase.
    pub fn follows_phase(&self) -> bool {
        matches!(self.state, GhostState::Scattering | GhostState::Chasing)
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.state, GhostState::Frightened { blinking: true })
    }

    /// Switch to `mode`. Holding it already, or sitting in the pen, is a no-op.
    /// Returns whether anything changed.
    ///
    /// Entering Frightened from Scatter/Chase reverses direction.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.is_home() || self.mode() == mode {
            return false;
        }
        match mode {
            Mode::Scatter => self.state = GhostState::Scattering,
            Mode::Chase => self.state = GhostState::Chasing,
            Mode::Frightened => {
                if self.follows_phase() {
                    self.reverse();
                }
                self.state = GhostState::Frightened { blinking: false };
                self.flash = false;
                self.blink.reset();
            }
            Mode::Eyes => self.send_home(),
        }
        true
    }

    pub fn reverse(&mut self) {
        self.dir = self.dir.opposite();
    }

    /// Caught while frightened: head back to the pen as eyes.
    pub fn send_home(&mut self) {
        self.state = GhostState::ReturningEyes(EyesPhase::ToDoor);
        self.flash = false;
    }

    pub fn set_blinking(&mut self, blinking: bool) {
        if let GhostState::Frightened { blinking: b } = &mut self.state {
            if *b != blinking {
                *b = blinking;
                self.flash = false;
                self.blink.reset();
            }
        }
    }

    /// One tick of motion. A ghost leaving the pen takes up `phase_mode`
    /// (returned eyes always scatter) and is never frightened on the way out.
    pub fn update(&mut self, dt: f32, maze: &Maze, phase_mode: Mode) {
        self.body_frame = (self.body_frame + self.body.tick(dt)) % BODY_FRAMES;
        if self.is_blinking() && self.blink.tick(dt) % 2 == 1 {
            self.flash = !self.flash;
        }

        match self.state {
            GhostState::Home(phase) => self.update_home(dt, phase, phase_mode),
            GhostState::ReturningEyes(EyesPhase::Aligning) => self.update_aligning(dt, maze),
            GhostState::ReturningEyes(EyesPhase::Descending) => self.update_descending(dt),
            GhostState::ReturningEyes(EyesPhase::ToDoor) => {
                self.target = EYES_TARGET;
                if self.at_door_approach() {
                    self.state = GhostState::ReturningEyes(EyesPhase::Aligning);
                    self.update_aligning(dt, maze);
                } else {
                    self.roam(dt, maze);
                }
            }
            GhostState::Scattering | GhostState::Chasing | GhostState::Frightened { .. } => {
                self.roam(dt, maze);
            }
        }
    }

    fn house_speed(&self) -> f32 {
        BASE_SPEED * GHOST_SPEED * HOUSE_SPEED * self.speed_scale
    }

    fn roam_speed(&self, maze: &Maze) -> f32 {
        let fraction = match self.state {
            GhostState::ReturningEyes(_) => GHOST_EYES_SPEED,
            _ if maze.is_tunnel(self.tile()) => GHOST_TUNNEL_SPEED,
            GhostState::Frightened { .. } => GHOST_FRIGHT_SPEED,
            _ => GHOST_SPEED,
        };
        BASE_SPEED * fraction * self.speed_scale
    }

    fn update_home(&mut self, dt: f32, phase: HomePhase, phase_mode: Mode) {
        let step = self.house_speed() * dt;
        match phase {
            HomePhase::Waiting => {
                self.release.tick(dt);
                if self.release.is_expired() {
                    self.state = GhostState::Home(HomePhase::Centering);
                }
            }
            HomePhase::Centering => {
                if slide_toward(&mut self.pos.x, DOOR_CENTER_X, step) {
                    self.state = GhostState::Home(HomePhase::Rising);
                }
                self.dir = Direction::Up;
            }
            HomePhase::Rising => {
                self.dir = Direction::Up;
                if slide_toward(&mut self.pos.y, ABOVE_DOOR_Y, step) {
                    self.dir = Direction::Left;
                    self.state = match phase_mode {
                        Mode::Chase if !self.returned => GhostState::Chasing,
                        _ => GhostState::Scattering,
                    };
                    self.returned = false;
                }
            }
        }
    }

    fn update_aligning(&mut self, dt: f32, maze: &Maze) {
        let step = self.roam_speed(maze) * dt;
        self.pos.y = ABOVE_DOOR_Y;
        if slide_toward(&mut self.pos.x, DOOR_CENTER_X, step) {
            self.dir = Direction::Down;
            self.state = GhostState::ReturningEyes(EyesPhase::Descending);
        }
    }

    fn update_descending(&mut self, dt: f32) {
        let step = BASE_SPEED * GHOST_EYES_SPEED * HOUSE_SPEED * self.speed_scale * dt;
        self.dir = Direction::Down;
        if slide_toward(&mut self.pos.y, PEN_CENTER_Y, step) {
            // Already on the door column: straight back up and out.
            self.state = GhostState::Home(HomePhase::Rising);
            self.returned = true;
            self.dir = Direction::Up;
        }
    }

    /// Either door-column tile on the row above the door.
    fn at_door_approach(&self) -> bool {
        let t = self.tile();
        t.y == EYES_TARGET.y && (t.x == EYES_TARGET.x || t.x == EYES_TARGET.x + 1)
    }

    fn roam(&mut self, dt: f32, maze: &Maze) {
        if self.pos.is_tile_centered() {
            self.pos.snap();
            self.dir = self.choose_direction(maze);
        }

        let mut budget = self.roam_speed(maze) * dt;
        for _ in 0..MAX_HOPS {
            if budget <= 0.0 || self.dir == Direction::None {
                break;
            }
            budget = nav::advance(&mut self.pos, self.dir, budget);
            nav::wrap_tunnel(&mut self.pos);
            if self.pos.is_tile_centered() {
                self.pos.snap();
                if self.is_eyes() && self.at_door_approach() {
                    break;
                }
                self.dir = self.choose_direction(maze);
            }
        }
    }

    /// Direction choice at a tile center.
    pub fn choose_direction(&self, maze: &Maze) -> Direction {
        let here = self.tile();
        let door_ok = self.is_eyes();
        let flee = self.is_frightened();
        let back = self.dir.opposite();

        let mut best = Direction::None;
        let mut best_score = i32::MAX;
        for d in Direction::SCAN_ORDER {
            if d == back || !nav::can_move(maze, here, d, door_ok) {
                continue;
            }
            let dist = here.step(d, 1).dist_sq(self.target);
            let score = if flee { -dist } else { dist };
            if score < best_score {
                best_score = score;
                best = d;
            }
        }

        if best != Direction::None {
            best
        } else if nav::can_move(maze, here, back, door_ok) {
            back
        } else {
            Direction::None
        }
    }
}

/// Move `v` toward `goal` by at most `step`. Returns `true` once it arrives.
fn slide_toward(v: &mut f32, goal: f32, step: f32) -> bool {
    let diff = goal - *v;
    if diff.abs() <= step {
        *v = goal;
        true
    } else {
        *v += step.copysign(diff);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn roaming_at(p: Personality, tile: TilePos, dir: Direction, target: TilePos) -> Ghost {
        let mut g = Ghost::new(p);
        g.state = GhostState::Chasing;
        g.pos = Position::of_tile(tile);
        g.dir = dir;
        g.target = target;
        g
    }

    #[test]
    fn blinky_starts_outside_others_in_pen() {
        let ghosts: Vec<Ghost> = Personality::ALL.iter().map(|&p| Ghost::new(p)).collect();
        assert_eq!(ghosts[0].state, GhostState::Scattering);
        assert_eq!(ghosts[0].tile().y, 11);
        for g in &ghosts[1..] {
            assert!(g.is_home());
            assert_eq!(g.tile().y, 14);
        }
    }

    #[test]
    fn never_reverses_when_another_way_exists() {
        let maze = Maze::classic().unwrap();
        // Row 5 corridor at col 3, heading right, target behind.
        let g = roaming_at(Personality::Blinky, TilePos::new(3, 5), Direction::Right, TilePos::new(0, 5));
        assert_eq!(g.choose_direction(&maze), Direction::Right);
    }

    #[test]
    fn ties_prefer_up_then_left() {
        let maze = Maze::classic().unwrap();
        // (6,5) opens up, down, left and right. A target straight below two
        // tiles away is equally far from the left and right neighbours.
        let mut g = roaming_at(Personality::Blinky, TilePos::new(6, 5), Direction::Down, TilePos::new(6, 1));
        g.target = TilePos::new(6, 9);
        // Down is closest.
        assert_eq!(g.choose_direction(&maze), Direction::Down);

        // Left (5,5) and right (7,5) are equidistant from (6,-5); up is closer.
        g.target = TilePos::new(6, -5);
        g.dir = Direction::Left;
        assert_eq!(g.choose_direction(&maze), Direction::Up);

        // Heading down: up is the reversal. Left and right tie → left.
        g.dir = Direction::Down;
        g.target = TilePos::new(6, 4);
        assert_eq!(g.choose_direction(&maze), Direction::Left);
    }

    #[test]
    fn reverses_only_in_a_dead_end() {
        let rows: Vec<String> = crate::domain::maze::CLASSIC_LAYOUT
            .iter()
            .enumerate()
            .map(|(y, r)| if y == 5 { "#...#......................#".to_string() } else { r.to_string() })
            .collect();
        let maze = Maze::from_rows(rows.as_slice()).unwrap();
        // (3,5) heading right into the wall at (4,5); up and down are walls too.
        let g = roaming_at(Personality::Blinky, TilePos::new(3, 5), Direction::Right, TilePos::new(20, 5));
        assert_eq!(g.choose_direction(&maze), Direction::Left);
    }

    #[test]
    fn frightened_flees() {
        let maze = Maze::classic().unwrap();
        let mut g = roaming_at(Personality::Pinky, TilePos::new(6, 5), Direction::Right, TilePos::new(8, 5));
        g.state = GhostState::Frightened { blinking: false };
        // Farthest from (8,5) among up, down and right: up (6,4) and down
        // (6,6) tie; up wins.
        assert_eq!(g.choose_direction(&maze), Direction::Up);
    }

    #[test]
    fn set_mode_is_a_noop_when_held() {
        let mut g = roaming_at(Personality::Blinky, TilePos::new(6, 5), Direction::Left, TilePos::new(0, 0));
        assert!(!g.set_mode(Mode::Chase));
        assert_eq!(g.dir, Direction::Left);

        assert!(g.set_mode(Mode::Frightened));
        assert_eq!(g.dir, Direction::Right, "fright reverses");
        assert!(!g.set_mode(Mode::Frightened));
        assert_eq!(g.dir, Direction::Right);

        assert!(g.set_mode(Mode::Scatter));
        assert_eq!(g.dir, Direction::Right, "calming down does not reverse");
    }

    #[test]
    fn pen_ghost_ignores_mode_changes() {
        let mut g = Ghost::new(Personality::Clyde);
        assert!(!g.set_mode(Mode::Frightened));
        assert!(g.is_home());
    }

    #[test]
    fn pinky_leaves_the_pen_into_current_phase() {
        let maze = Maze::classic().unwrap();
        let mut g = Ghost::new(Personality::Pinky);
        for _ in 0..300 {
            g.update(DT, &maze, Mode::Chase);
            if !g.is_home() {
                break;
            }
        }
        assert_eq!(g.state, GhostState::Chasing);
        assert_eq!(g.pos, Position::new(DOOR_CENTER_X, ABOVE_DOOR_Y));
        assert_eq!(g.dir, Direction::Left);
    }

    #[test]
    fn pen_exit_is_never_frightened() {
        let maze = Maze::classic().unwrap();
        let mut g = Ghost::new(Personality::Pinky);
        for _ in 0..300 {
            g.update(DT, &maze, Mode::Frightened);
            if !g.is_home() {
                break;
            }
        }
        assert_eq!(g.state, GhostState::Scattering);
    }

    #[test]
    fn clyde_waits_six_seconds() {
        let maze = Maze::classic().unwrap();
        let mut g = Ghost::new(Personality::Clyde);
        let start = g.pos;
        for _ in 0..(5.9 / DT) as usize {
            g.update(DT, &maze, Mode::Scatter);
        }
        assert_eq!(g.pos, start);
        for _ in 0..30 {
            g.update(DT, &maze, Mode::Scatter);
        }
        assert_ne!(g.pos, start);
    }

    #[test]
    fn eyes_return_and_come_back_out() {
        let maze = Maze::classic().unwrap();
        let mut g = roaming_at(Personality::Inky, TilePos::new(6, 5), Direction::Right, TilePos::new(0, 0));
        g.send_home();
        let mut entered = false;
        for _ in 0..(20.0 / DT) as usize {
            g.update(DT, &maze, Mode::Chase);
            if g.state == GhostState::ReturningEyes(EyesPhase::Descending) {
                entered = true;
            }
            if entered && !g.is_home() && !g.is_eyes() {
                break;
            }
        }
        assert!(entered, "eyes reached the door");
        assert_eq!(g.state, GhostState::Scattering, "returned eyes scatter even mid-chase");
        assert_eq!(g.pos, Position::new(DOOR_CENTER_X, ABOVE_DOOR_Y));
    }

    #[test]
    fn tunnel_slows_roaming_ghosts() {
        let maze = Maze::classic().unwrap();
        let mut g = roaming_at(Personality::Blinky, TilePos::new(3, 14), Direction::Left, TilePos::new(0, 14));
        let normal = roaming_at(Personality::Blinky, TilePos::new(6, 5), Direction::Left, TilePos::new(0, 5));
        assert!(g.roam_speed(&maze) < normal.roam_speed(&maze));
        g.send_home();
        assert!(g.roam_speed(&maze) > normal.roam_speed(&maze), "eyes ignore the tunnel");
    }

    #[test]
    fn blink_toggles_flash() {
        let maze = Maze::classic().unwrap();
        let mut g = roaming_at(Personality::Blinky, TilePos::new(6, 5), Direction::Left, TilePos::new(0, 5));
        g.set_mode(Mode::Frightened);
        g.set_blinking(true);
        let mut seen = [false; 2];
        for _ in 0..60 {
            g.update(DT, &maze, Mode::Scatter);
            seen[g.flash as usize] = true;
        }
        assert!(seen[0] && seen[1]);
    }
}
