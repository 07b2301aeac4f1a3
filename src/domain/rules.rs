/// Scoring and difficulty tables.
///
/// Pure lookups, no state. Everything the arcade board fixes per level
/// lives here so the simulation code reads as policy, not numbers.
///
/// ## Speed (fraction of `BASE_SPEED`)
/// ┌─────────────────────────┬──────────┐
/// │ Agent / situation        │ Fraction │
/// ├─────────────────────────┼──────────┤
/// │ Player                   │ 0.80     │
/// │ Player, eating this tick │ 0.71     │
/// │ Player, ghosts frightened│ 0.90     │
/// │ Ghost                    │ 0.75     │
/// │ Ghost, frightened        │ 0.50     │
/// │ Ghost, in tunnel         │ 0.40     │
/// │ Ghost, eyes              │ 1.50     │
/// └─────────────────────────┴──────────┘
///
/// ## Level curve (multiplies the table above)
/// ┌────────┬────────┬────────┐
/// │ Level  │ Player │ Ghosts │
/// ├────────┼────────┼────────┤
/// │ 1      │ 1.000  │ 1.000  │
/// │ 2–4    │ 1.125  │ 1.133  │
/// │ 5–20   │ 1.250  │ 1.267  │
/// │ 21+    │ 1.125  │ 1.267  │
/// └────────┴────────┴────────┘
///
/// ## Bonus item
/// ┌────────┬────────────┬────────┐
/// │ Level  │ Item       │ Points │
/// ├────────┼────────────┼────────┤
/// │ 1      │ Cherry     │ 100    │
/// │ 2      │ Strawberry │ 300    │
/// │ 3–4    │ Peach      │ 500    │
/// │ 5–6    │ Apple      │ 700    │
/// │ 7–8    │ Grapes     │ 1000   │
/// │ 9–10   │ Galaxian   │ 2000   │
/// │ 11–12  │ Bell       │ 3000   │
/// │ 13+    │ Key        │ 5000   │
/// └────────┴────────────┴────────┘

use super::nav::{Position, TILE};

/// Pixels per second at 100%.
pub const BASE_SPEED: f32 = 75.75;

pub const PLAYER_SPEED: f32 = 0.80;
pub const PLAYER_EATING_SPEED: f32 = 0.71;
pub const PLAYER_FRIGHT_SPEED: f32 = 0.90;
pub const GHOST_SPEED: f32 = 0.75;
pub const GHOST_FRIGHT_SPEED: f32 = 0.50;
pub const GHOST_TUNNEL_SPEED: f32 = 0.40;
pub const GHOST_EYES_SPEED: f32 = 1.50;
/// Scripted pen exits and eyes re-entry, relative to the ghost's current speed.
pub const HOUSE_SPEED: f32 = 0.80;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;

/// Bonus item is offered when this many pellets have been eaten in the round.
pub const BONUS_THRESHOLDS: [u32; 2] = [70, 170];
/// Centered below the ghost house.
pub const BONUS_POSITION: Position = Position::new(13.5 * TILE, 17.0 * TILE);
/// Pickup radius in pixels.
pub const BONUS_REACH: f32 = TILE;
/// Player and ghost centers closer than this have met.
pub const CATCH_RADIUS: f32 = 0.7 * TILE;

/// The siren speeds up once fewer than this many pellets remain.
pub const SIREN_FAST_BELOW: u32 = 40;

/// Points for catching a frightened ghost: 200, 400, 800, 1600.
/// `eaten_before` counts ghosts already caught in this frightened window.
pub fn ghost_points(eaten_before: u32) -> u32 {
    200 << eaten_before.min(3)
}

pub fn player_speed_scale(level: u32) -> f32 {
    match level {
        0..=1 => 1.0,
        2..=4 => 1.125,
        5..=20 => 1.25,
        _ => 1.125,
    }
}

pub fn ghost_speed_scale(level: u32) -> f32 {
    match level {
        0..=1 => 1.0,
        2..=4 => 1.133,
        _ => 1.267,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BonusKind {
    Cherry,
    Strawberry,
    Peach,
    Apple,
    Grapes,
    Galaxian,
    Bell,
    Key,
}

impl BonusKind {
    pub fn for_level(level: u32) -> BonusKind {
        match level {
            0..=1 => BonusKind::Cherry,
            2 => BonusKind::Strawberry,
            3..=4 => BonusKind::Peach,
            5..=6 => BonusKind::Apple,
            7..=8 => BonusKind::Grapes,
            9..=10 => BonusKind::Galaxian,
            11..=12 => BonusKind::Bell,
            _ => BonusKind::Key,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            BonusKind::Cherry => 100,
            BonusKind::Strawberry => 300,
            BonusKind::Peach => 500,
            BonusKind::Apple => 700,
            BonusKind::Grapes => 1000,
            BonusKind::Galaxian => 2000,
            BonusKind::Bell => 3000,
            BonusKind::Key => 5000,
        }
    }
}
