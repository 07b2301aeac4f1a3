/// Seams between the simulation and the outside world.
///
/// The step function only talks to these traits; the terminal, the audio
/// device and the filesystem plug in from `main`, and tests plug in
/// recording doubles.

use crate::domain::nav::Direction;

use super::event::GameEvent;

/// One tick's worth of edge-triggered input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub direction: Option<Direction>,
    pub pause: bool,
    pub start: bool,
}

pub trait Audio {
    /// Fire-and-forget cue.
    fn on_event(&self, event: &GameEvent);

    /// Still playing the intro jingle. The only thing the simulation ever
    /// asks the audio side.
    fn intro_playing(&self) -> bool;
}

pub trait HighScoreStore {
    /// Missing or unreadable storage reads as 0.
    fn load_high_score(&self) -> u32;

    /// Best effort. Failures are logged, never returned.
    fn save_high_score(&mut self, score: u32);
}

/// No audio device, or `--no-default-features`.
pub struct Silent;

impl Audio for Silent {
    fn on_event(&self, _event: &GameEvent) {}

    fn intro_playing(&self) -> bool {
        false
    }
}
