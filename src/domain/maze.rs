/// The maze: a fixed 28×31 tile grid plus pellet bookkeeping.
///
/// ## Two tile layers
///   - `base`: the layout as parsed. Never mutated.
///   - `tiles`: the live grid; pellets are eaten out of it.
///
/// `reset_round()` restores `tiles = base.clone()`.
///
/// Invariant: `remaining` equals the number of live tiles that are still
/// `Pellet` or `PowerPellet`. Only `consume_*` and `reset_round` touch it.

use thiserror::Error;

use super::nav::TilePos;
use super::tile::Tile;

pub const MAZE_WIDTH: usize = 28;
pub const MAZE_HEIGHT: usize = 31;

/// The arcade layout. `#` wall, `.` pellet, `o` power pellet,
/// `-` ghost door, `T` tunnel, space empty.
pub const CLASSIC_LAYOUT: [&str; MAZE_HEIGHT] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###--### ##.#     ",
    "######.## #      # ##.######",
    "TTTTTT.   #      #   .TTTTTT",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o..##................##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
    "############################",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze layout has {rows} rows, expected 31")]
    Dimensions { rows: usize },
    #[error("maze row {row} is {len} columns wide, expected 28")]
    RaggedRow { row: usize, len: usize },
    #[error("unknown maze symbol {symbol:?} at column {x}, row {y}")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
}

#[derive(Clone, Debug)]
pub struct Maze {
    base: Vec<Vec<Tile>>,
    tiles: Vec<Vec<Tile>>,
    total: u32,
    remaining: u32,
}

impl Maze {
    /// Parse a layout. Anything other than exactly 28×31 known symbols is rejected:
    /// a wrong pellet total would break round-clear detection.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MazeError> {
        if rows.len() != MAZE_HEIGHT {
            return Err(MazeError::Dimensions { rows: rows.len() });
        }

        let mut base = Vec::with_capacity(MAZE_HEIGHT);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let len = row.chars().count();
            if len != MAZE_WIDTH {
                return Err(MazeError::RaggedRow { row: y, len });
            }
            let parsed = row
                .chars()
                .enumerate()
                .map(|(x, symbol)| {
                    Tile::from_symbol(symbol).ok_or(MazeError::UnknownSymbol { symbol, x, y })
                })
                .collect::<Result<Vec<_>, _>>()?;
            base.push(parsed);
        }

        let total = count_pellets(&base);
        Ok(Maze { tiles: base.clone(), base, total, remaining: total })
    }

    pub fn classic() -> Result<Self, MazeError> {
        Maze::from_rows(&CLASSIC_LAYOUT[..])
    }

    /// Rows outside the grid read as `Wall`; columns wrap (the tunnel).
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        if y < 0 || y >= MAZE_HEIGHT as i32 {
            return Tile::Wall;
        }
        let col = x.rem_euclid(MAZE_WIDTH as i32) as usize;
        self.tiles[y as usize][col]
    }

    pub fn tile(&self, t: TilePos) -> Tile {
        self.tile_at(t.x, t.y)
    }

    /// Walls block everyone. The door admits ghosts only, and callers pass
    /// `ghost = true` only for ghosts that are allowed through it (eyes).
    pub fn is_walkable(&self, x: i32, y: i32, ghost: bool) -> bool {
        let tile = self.tile_at(x, y);
        if tile.is_wall() {
            false
        } else if tile.is_door() {
            ghost
        } else {
            true
        }
    }

    pub fn is_tunnel(&self, t: TilePos) -> bool {
        self.tile(t).is_tunnel()
    }

    pub fn consume_pellet(&mut self, t: TilePos) -> bool {
        self.consume(t, Tile::Pellet)
    }

    pub fn consume_power_pellet(&mut self, t: TilePos) -> bool {
        self.consume(t, Tile::PowerPellet)
    }

    fn consume(&mut self, t: TilePos, kind: Tile) -> bool {
        if t.y < 0 || t.y >= MAZE_HEIGHT as i32 {
            return false;
        }
        let col = t.x.rem_euclid(MAZE_WIDTH as i32) as usize;
        let cell = &mut self.tiles[t.y as usize][col];
        if *cell != kind {
            return false;
        }
        *cell = Tile::Empty;
        self.remaining = self.remaining.saturating_sub(1);
        true
    }

    /// Reload the layout: every pellet comes back.
    pub fn reset_round(&mut self) {
        self.tiles = self.base.clone();
        self.remaining = self.total;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Pellets eaten since the last reset.
    pub fn eaten(&self) -> u32 {
        self.total - self.remaining
    }
}

fn count_pellets(grid: &[Vec<Tile>]) -> u32 {
    grid.iter().flatten().filter(|t| t.is_pellet()).count() as u32
}
