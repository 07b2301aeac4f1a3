/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame:
///   1. compose the whole screen into `front` (HUD, maze, actors, overlays)
///   2. diff against `back` (what the terminal currently shows)
///   3. queue commands only for changed cells, flush once
///   4. swap front/back
///
/// One maze tile is two terminal columns wide so the board keeps a
/// roughly square aspect.
///
/// ## Screen layout
///
/// ```text
///   row 0        HUD: score, high score, level
///   row 2..33    maze (31 rows), centered horizontally
///   row 34       lives + bonus history
///   row 35       key help
/// ```
///
/// Rendering only reads the world; the simulation owns every state change.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::ghost::{Ghost, Personality};
use crate::domain::maze::{MAZE_HEIGHT, MAZE_WIDTH};
use crate::domain::nav::{Direction, TilePos};
use crate::domain::player::{Player, DEATH_FRAMES};
use crate::domain::rules::BonusKind;
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // occupies 2 terminal columns
    cont: bool, // right half of a wide char (never printed)
}

impl Cell {
    /// Explicit background for every cell. Using the same RGB for
    /// `Clear(ClearType::All)` and each cell keeps VTE terminals from
    /// showing seams between rows.
    const BASE_BG: Color = Color::Rgb { r: 0, g: 0, b: 0 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from every real cell; filling `back` with it forces a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn wide(c: char, bg: Color) -> Self {
        let mut cell = Self::new(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Layout & palette ──

const CELL_W: usize = 2;
const BOARD_W: usize = MAZE_WIDTH * CELL_W;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const LIVES_ROW: usize = MAP_ROW + MAZE_HEIGHT + 1;
const HELP_ROW: usize = LIVES_ROW + 1;

/// Maze rows where the arcade prints its messages.
const MSG_TILE_ROW: usize = 17;
const TITLE_TILE_ROW: usize = 11;

const WALL: Color = Color::Rgb { r: 33, g: 33, b: 222 };
const WALL_FLASH: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const PELLET: Color = Color::Rgb { r: 255, g: 184, b: 151 };
const DOOR: Color = Color::Rgb { r: 255, g: 184, b: 222 };
const YELLOW: Color = Color::Rgb { r: 255, g: 255, b: 0 };
const FRIGHT_BLUE: Color = Color::Rgb { r: 33, g: 33, b: 255 };
const FRIGHT_WHITE: Color = Color::Rgb { r: 222, g: 222, b: 255 };
const EYES: Color = Color::Rgb { r: 240, g: 240, b: 255 };
const POPUP: Color = Color::Rgb { r: 0, g: 255, b: 255 };
const RED: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const DIM: Color = Color::Rgb { r: 110, g: 110, b: 130 };

fn ghost_color(p: Personality) -> Color {
    match p {
        Personality::Blinky => Color::Rgb { r: 255, g: 0, b: 0 },
        Personality::Pinky => Color::Rgb { r: 255, g: 184, b: 255 },
        Personality::Inky => Color::Rgb { r: 0, g: 255, b: 255 },
        Personality::Clyde => Color::Rgb { r: 255, g: 184, b: 82 },
    }
}

fn bonus_glyph(kind: BonusKind) -> char {
    match kind {
        BonusKind::Cherry => '🍒',
        BonusKind::Strawberry => '🍓',
        BonusKind::Peach => '🍑',
        BonusKind::Apple => '🍎',
        BonusKind::Grapes => '🍇',
        BonusKind::Galaxian => '🚀',
        BonusKind::Bell => '🔔',
        BonusKind::Key => '🔑',
    }
}

/// Two-column sprite for the player. A stopped player keeps its mouth shut.
fn player_glyphs(p: &Player, dying: bool) -> (char, char) {
    if dying {
        // Mouth opens up until nothing is left
        return match p.death_frame * 4 / DEATH_FRAMES {
            0 => ('◖', '◗'),
            1 => ('◖', '▾'),
            2 => ('▝', '▘'),
            _ => ('˙', ' '),
        };
    }
    if p.mouth_frame % 2 == 0 {
        return ('◖', '◗');
    }
    match p.dir {
        Direction::Right => ('◖', '<'),
        Direction::Left => ('>', '◗'),
        Direction::Up => ('◖', 'v'),
        Direction::Down => ('◖', '^'),
        Direction::None => ('◖', '◗'),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Left edge of the board, in terminal columns.
    origin_x: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            origin_x: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.fit_terminal();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.fit_terminal();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Full repaint on phase change for a clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        if self.term_w < BOARD_W || self.term_h < HELP_ROW + 1 {
            self.compose_too_small();
        } else {
            self.compose(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn fit_terminal(&mut self) {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.origin_x = self.term_w.saturating_sub(BOARD_W) / 2;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default may not be BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ═══════════════════════════════════════════════════════════
    // Compose
    // ═══════════════════════════════════════════════════════════

    fn compose(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_maze(w);

        // Which actors are on screen depends on the phase
        let (show_player, show_ghosts) = match w.phase {
            Phase::PressStart | Phase::GameOver => (false, false),
            Phase::Startup => (false, false),
            Phase::Death | Phase::LevelClear => (true, false),
            Phase::GhostEaten => (false, true),
            _ => (true, true),
        };

        if let Some(bonus) = &w.bonus {
            self.put_wide_at(bonus.pos.tile(), bonus_glyph(bonus.kind));
        }
        if show_ghosts {
            for (i, g) in w.ghosts.iter().enumerate() {
                if w.eaten_ghost != Some(i) {
                    self.compose_ghost(g);
                }
            }
        }
        if show_player {
            self.compose_player(&w.player, w.phase == Phase::Death);
        }
        for p in &w.popups {
            let t = p.pos.tile();
            if let Some(col) = self.tile_col(t.x) {
                self.front.put_str(col, MAP_ROW + t.y as usize, &p.points.to_string(), POPUP, Color::Reset);
            }
        }

        match w.phase {
            Phase::PressStart => self.compose_attract(w),
            Phase::Startup => {
                self.message(TITLE_TILE_ROW, "PLAYER ONE", POPUP);
                self.message(MSG_TILE_ROW, "READY!", YELLOW);
            }
            Phase::Ready => self.message(MSG_TILE_ROW, "READY!", YELLOW),
            Phase::GameOver => {
                self.message(MSG_TILE_ROW, "GAME  OVER", RED);
                self.message(MSG_TILE_ROW + 2, "ENTER: play again", DIM);
            }
            Phase::Paused => self.compose_pause_overlay(w),
            _ => {}
        }

        self.compose_footer(w);
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let x0 = self.origin_x;
        let score = format!("1UP {:>7}", w.score);
        let high = format!("HIGH SCORE {:>7}", w.high_score);
        let level = format!("LEVEL {:>2}", w.level);
        self.front.put_str(x0, HUD_ROW, &score, Color::White, Color::Reset);
        self.front.put_str(x0 + (BOARD_W - high.len()) / 2, HUD_ROW, &high, Color::White, Color::Reset);
        self.front.put_str(x0 + BOARD_W - level.len(), HUD_ROW, &level, Color::White, Color::Reset);
    }

    fn compose_maze(&mut self, w: &WorldState) {
        let wall_fg = if w.phase == Phase::LevelClear && !w.flash_on { WALL_FLASH } else { WALL };
        // Power pellets pulse at ~2.5 Hz of frames; steady while frozen
        let pulse = w.phase != Phase::Playing || (w.tick / 12) % 2 == 0;

        for y in 0..MAZE_HEIGHT {
            for x in 0..MAZE_WIDTH {
                let col = self.origin_x + x * CELL_W;
                let row = MAP_ROW + y;
                let (c0, c1, fg) = match w.maze.tile_at(x as i32, y as i32) {
                    Tile::Wall => ('█', '█', wall_fg),
                    Tile::Pellet => ('·', ' ', PELLET),
                    Tile::PowerPellet if pulse => ('●', ' ', PELLET),
                    Tile::GhostDoor => ('━', '━', DOOR),
                    Tile::PowerPellet | Tile::Empty | Tile::Tunnel => (' ', ' ', Color::White),
                };
                self.front.set(col, row, Cell::new(c0, fg, Color::Reset));
                self.front.set(col + 1, row, Cell::new(c1, fg, Color::Reset));
            }
        }
    }

    fn compose_player(&mut self, p: &Player, dying: bool) {
        let (c0, c1) = player_glyphs(p, dying);
        self.put_pair(p.tile(), c0, c1, YELLOW);
    }

    fn compose_ghost(&mut self, g: &Ghost) {
        let t = g.tile();
        if g.is_eyes() {
            self.put_pair(t, '°', '°', EYES);
            return;
        }
        let fg = if g.is_frightened() {
            if g.flash { FRIGHT_WHITE } else { FRIGHT_BLUE }
        } else {
            ghost_color(g.personality)
        };
        let (c0, c1) = if g.body_frame % 2 == 0 { ('▛', '▜') } else { ('▙', '▟') };
        self.put_pair(t, c0, c1, fg);
    }

    fn compose_attract(&mut self, w: &WorldState) {
        let x0 = self.origin_x + (BOARD_W - 24) / 2;
        let y0 = MAP_ROW + TITLE_TILE_ROW - 1;
        let box_art = [
            "╔══════════════════════╗",
            "║   P A C - M A N      ║",
            "╚══════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(x0, y0 + i, l, YELLOW, Color::Reset);
        }

        for (i, p) in Personality::ALL.into_iter().enumerate() {
            let row = y0 + 4 + i;
            self.front.put_str(x0 + 4, row, "▛▜", ghost_color(p), Color::Reset);
            self.front.put_str(x0 + 8, row, p.name(), ghost_color(p), Color::Reset);
        }

        if w.flash_on {
            self.message(MSG_TILE_ROW, "PRESS ENTER", Color::White);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 24;
        let box_h = 5;
        let x0 = self.origin_x + (BOARD_W - box_w) / 2;
        let y0 = MAP_ROW + MSG_TILE_ROW - 2;

        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, bg));
            }
        }
        let label = if (w.tick / 20) % 2 == 0 { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(x0 + (box_w - 12) / 2, y0 + 1, label, YELLOW, bg);
        self.front.put_str(x0 + 3, y0 + 3, "P / Esc: resume", DIM, bg);
    }

    fn compose_footer(&mut self, w: &WorldState) {
        let x0 = self.origin_x;
        let reserve = if matches!(w.phase, Phase::PressStart | Phase::GameOver) {
            0
        } else {
            w.lives.saturating_sub(1)
        };
        for i in 0..reserve as usize {
            self.front.put_str(x0 + 2 + i * 3, LIVES_ROW, "◖◗", YELLOW, Color::Reset);
        }
        // Bonus items of the last few levels, newest on the right
        let first = w.level.saturating_sub(6).max(1);
        for (i, lv) in (first..=w.level).enumerate() {
            let col = x0 + BOARD_W - 2 - i * 3;
            self.front.set(col, LIVES_ROW, Cell::wide(bonus_glyph(BonusKind::for_level(lv)), Color::Reset));
            self.front.set(col + 1, LIVES_ROW, Cell::WIDE_CONT);
        }

        let help = "Arrows/WASD: move   P: pause   Q: quit";
        self.front.put_str(x0 + (BOARD_W - help.chars().count()) / 2, HELP_ROW, help, DIM, Color::Reset);
    }

    fn compose_too_small(&mut self) {
        let msg = format!("Terminal too small: need {}x{}", BOARD_W, HELP_ROW + 1);
        self.front.put_str(0, 0, &msg, RED, Color::Reset);
    }

    // ── Helpers ──

    /// Terminal column of maze column `x`, or `None` while in the tunnel off-board.
    fn tile_col(&self, x: i32) -> Option<usize> {
        (0..MAZE_WIDTH as i32).contains(&x).then(|| self.origin_x + x as usize * CELL_W)
    }

    fn put_pair(&mut self, t: TilePos, c0: char, c1: char, fg: Color) {
        if !(0..MAZE_HEIGHT as i32).contains(&t.y) {
            return;
        }
        if let Some(col) = self.tile_col(t.x) {
            let row = MAP_ROW + t.y as usize;
            self.front.set(col, row, Cell::new(c0, fg, Color::Reset));
            self.front.set(col + 1, row, Cell::new(c1, fg, Color::Reset));
        }
    }

    fn put_wide_at(&mut self, t: TilePos, glyph: char) {
        if !(0..MAZE_HEIGHT as i32).contains(&t.y) {
            return;
        }
        if let Some(col) = self.tile_col(t.x) {
            let row = MAP_ROW + t.y as usize;
            self.front.set(col, row, Cell::wide(glyph, Color::Reset));
            self.front.set(col + 1, row, Cell::WIDE_CONT);
        }
    }

    /// Centered text on a maze row.
    fn message(&mut self, tile_row: usize, text: &str, fg: Color) {
        let len = text.chars().count();
        let col = self.origin_x + BOARD_W.saturating_sub(len) / 2;
        self.front.put_str(col, MAP_ROW + tile_row, text, fg, Color::Reset);
    }
}
