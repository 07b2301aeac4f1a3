/// Movement primitives shared by the player and the ghosts.
///
/// Positions are continuous pixel coordinates (8 px per tile) naming the
/// tile-origin an agent is anchored to. The agent's tile is the nearest
/// one: `floor((p + 4) / 8)` per axis.
///
/// Motion is "center to center": an agent never runs past the next tile
/// center in a single advance, and lands on it exactly. Decisions (turns,
/// pellet bites) are only taken while centered, which is what makes
/// cornering discrete.

use super::maze::{Maze, MAZE_WIDTH};

pub const TILE: f32 = 8.0;

/// How close to a tile center still counts as centered.
pub const CENTER_EPSILON: f32 = 0.05;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed scan order. Ghosts break distance ties by taking the first
    /// candidate in this order.
    pub const SCAN_ORDER: [Direction; 4] =
        [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    /// Unit step in tile space (y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        TilePos { x, y }
    }

    pub fn step(self, dir: Direction, n: i32) -> TilePos {
        let (dx, dy) = dir.delta();
        TilePos::new(self.x + dx * n, self.y + dy * n)
    }

    /// Squared euclidean distance. Exact, so ties compare reliably.
    pub fn dist_sq(self, other: TilePos) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }

    pub fn of_tile(t: TilePos) -> Self {
        Position::new(t.x as f32 * TILE, t.y as f32 * TILE)
    }

    pub fn tile(self) -> TilePos {
        TilePos::new(axis_tile(self.x), axis_tile(self.y))
    }

    pub fn is_tile_centered(self) -> bool {
        axis_offset(self.x) <= CENTER_EPSILON && axis_offset(self.y) <= CENTER_EPSILON
    }

    /// Snap both axes onto the current tile center.
    pub fn snap(&mut self) {
        let t = self.tile();
        *self = Position::of_tile(t);
    }

    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

fn axis_tile(v: f32) -> i32 {
    ((v + TILE / 2.0) / TILE).floor() as i32
}

fn axis_offset(v: f32) -> f32 {
    (v - axis_tile(v) as f32 * TILE).abs()
}

/// Can an agent standing on `from` step one tile in `dir`?
/// `door_ok` lets the step cross the ghost door.
pub fn can_move(maze: &Maze, from: TilePos, dir: Direction, door_ok: bool) -> bool {
    if dir == Direction::None {
        return false;
    }
    let to = from.step(dir, 1);
    maze.is_walkable(to.x, to.y, door_ok)
}

/// Move `pos` along `dir` by at most `budget` pixels, stopping exactly on the
/// next tile center if it is closer. Returns the unused budget.
pub fn advance(pos: &mut Position, dir: Direction, budget: f32) -> f32 {
    match dir {
        Direction::None => 0.0,
        Direction::Left | Direction::Right => {
            let sign = if dir == Direction::Right { 1.0 } else { -1.0 };
            advance_axis(&mut pos.x, sign, budget)
        }
        Direction::Up | Direction::Down => {
            let sign = if dir == Direction::Down { 1.0 } else { -1.0 };
            advance_axis(&mut pos.y, sign, budget)
        }
    }
}

fn advance_axis(v: &mut f32, sign: f32, budget: f32) -> f32 {
    let target = next_center(*v, sign);
    let gap = (target - *v).abs();
    if budget >= gap {
        *v = target;
        budget - gap
    } else {
        *v += sign * budget;
        0.0
    }
}

fn next_center(v: f32, sign: f32) -> f32 {
    let cell = v / TILE;
    let nearest = cell.round();
    if (cell - nearest).abs() * TILE <= CENTER_EPSILON {
        (nearest + sign) * TILE
    } else if sign > 0.0 {
        cell.ceil() * TILE
    } else {
        cell.floor() * TILE
    }
}

/// Horizontal wrap: one tile past either edge teleports to the other side.
/// Vertical never wraps.
pub fn wrap_tunnel(pos: &mut Position) {
    let right_edge = MAZE_WIDTH as f32 * TILE;
    if pos.x < -TILE {
        pos.x = right_edge;
    } else if pos.x > right_edge {
        pos.x = -TILE;
    }
}
