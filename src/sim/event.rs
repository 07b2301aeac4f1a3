/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound.

use crate::domain::ghost::Personality;
use crate::domain::rules::BonusKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SirenState {
    Off,
    Normal,
    /// Few pellets left.
    Fast,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Intro jingle; the Startup phase waits for it to finish.
    StartupCue,
    PelletEaten,
    PowerPelletEaten,
    GhostEaten { ghost: Personality, points: u32 },
    PlayerKilled,
    DeathAnimation,
    BonusSpawned(BonusKind),
    BonusEaten { kind: BonusKind, points: u32 },
    BonusExpired,
    Siren(SirenState),
    FrightenedStarted,
    FrightenedEnded,
    Paused,
    Resumed,
    HighScoreBeaten,
    LevelCleared { level: u32 },
    LifeLost { lives_left: u32 },
    GameOver { score: u32 },
}
