/// The step function: advances the world by one frame.
///
/// Playing processing order:
///   1. Mode schedule (paused while frightened)
///   2. Player movement
///   3. Pellet events (score, frightened trigger, bonus spawn)
///   4. Frightened countdown + blink propagation
///   5. Targeting, then ghost motion
///   6. Collisions (ghosts in array order, then the bonus item)
///   7. Siren
///   8. Round clear
///   9. Bonus timer, popups
///
/// Targets are computed before anyone moves, and collisions are tested
/// after everyone moved. Swapping any of these changes what the player sees.
///
/// Events are handed to the audio port at the end of the frame, in order.

use tracing::{debug, info};

use crate::domain::ai;
use crate::domain::nav::{Position, TilePos, TILE};
use crate::domain::rules::{
    BonusKind, BONUS_POSITION, BONUS_REACH, BONUS_THRESHOLDS, CATCH_RADIUS, PELLET_POINTS,
    POWER_PELLET_POINTS, SIREN_FAST_BELOW,
};
use crate::domain::timer::Countdown;
use super::event::{GameEvent, SirenState};
use super::ports::{Audio, FrameInput, HighScoreStore};
use super::world::{Bonus, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn update(
    world: &mut WorldState,
    input: FrameInput,
    dt: f32,
    audio: &dyn Audio,
    store: &mut dyn HighScoreStore,
) -> Vec<GameEvent> {
    let dt = dt.clamp(0.0, world.timing.max_dt);
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    match world.phase {
        Phase::PressStart => {
            world.tick_phase(dt);
            if input.start {
                world.start_game();
                begin_startup(world, &mut events);
            }
        }
        Phase::Startup => {
            world.tick_phase(dt);
            if !audio.intro_playing() && world.phase_elapsed > world.timing.startup_min_secs {
                world.set_phase(Phase::Ready);
            }
        }
        Phase::Ready => {
            steer(world, input);
            if world.tick_phase(dt) {
                world.set_phase(Phase::Playing);
                update_siren(world, &mut events);
            }
        }
        Phase::Playing => {
            if input.pause {
                pause(world, &mut events);
            } else {
                steer(world, input);
                play(world, dt, &mut events);
            }
        }
        Phase::Paused => {
            if input.pause {
                resume(world, &mut events);
            }
        }
        Phase::GhostEaten => {
            world.age_popups(dt);
            if world.tick_phase(dt) {
                world.eaten_ghost = None;
                world.set_phase(Phase::Playing);
                resolve_round_clear(world, &mut events);
            }
        }
        Phase::PreDeath => {
            if world.tick_phase(dt) {
                world.player.die();
                world.set_phase(Phase::Death);
                events.push(GameEvent::DeathAnimation);
            }
        }
        Phase::Death => {
            world.tick_phase(dt);
            if world.player.update_death(dt) {
                lose_life(world, store, &mut events);
            }
        }
        Phase::LevelClear => {
            if world.tick_phase(dt) {
                world.level += 1;
                world.start_level();
                world.set_phase(Phase::Ready);
            }
        }
        Phase::GameOver => {
            world.tick_phase(dt);
            if input.start {
                store.save_high_score(world.high_score);
                world.start_game();
                begin_startup(world, &mut events);
            }
        }
    }

    for e in &events {
        audio.on_event(e);
    }
    events
}

fn begin_startup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.set_phase(Phase::Startup);
    events.push(GameEvent::StartupCue);
}

fn steer(world: &mut WorldState, input: FrameInput) {
    if let Some(dir) = input.direction {
        world.player.set_desired(dir);
    }
}

// ══════════════════════════════════════════════════════════════
// Playing
// ══════════════════════════════════════════════════════════════

fn play(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    world.scheduler.advance(dt, &mut world.ghosts);

    let before = Footprint::of(world);
    let frightened = world.scheduler.is_frightened();
    world.player.update(dt, &mut world.maze, frightened);

    resolve_pellets(world, events);
    resolve_frightened(world, dt, events);
    resolve_ghosts(world, dt);
    if resolve_collisions(world, &before, events) {
        return;
    }
    update_siren(world, events);
    if resolve_round_clear(world, events) {
        return;
    }
    resolve_bonus_timer(world, dt, events);
    world.age_popups(dt);
}

fn add_score(world: &mut WorldState, points: u32, events: &mut Vec<GameEvent>) {
    world.score += points;
    if world.score > world.high_score {
        world.high_score = world.score;
        if !world.record_beaten && world.record_at_start > 0 {
            world.record_beaten = true;
            events.push(GameEvent::HighScoreBeaten);
            info!(score = world.score, old = world.record_at_start, "high score beaten");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Pellets
// ══════════════════════════════════════════════════════════════

fn resolve_pellets(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.ate_pellet {
        add_score(world, PELLET_POINTS, events);
        events.push(GameEvent::PelletEaten);
    }
    if world.player.ate_power {
        add_score(world, POWER_PELLET_POINTS, events);
        events.push(GameEvent::PowerPelletEaten);
        world.scheduler.activate_frightened(&mut world.ghosts);
        events.push(GameEvent::FrightenedStarted);
        debug!(remaining = world.maze.remaining(), "power pellet");
    }
    if world.player.ate_something() {
        offer_bonus(world, events);
    }
}

/// Each threshold is offered once per round; a new offer replaces a bonus still showing.
fn offer_bonus(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(&threshold) = BONUS_THRESHOLDS.get(world.bonus_offered) else {
        return;
    };
    if world.maze.eaten() < threshold {
        return;
    }
    world.bonus_offered += 1;
    let kind = BonusKind::for_level(world.level);
    world.bonus = Some(Bonus {
        kind,
        pos: BONUS_POSITION,
        timer: Countdown::armed(world.timing.bonus_visible_secs),
    });
    events.push(GameEvent::BonusSpawned(kind));
    debug!(?kind, threshold, "bonus spawned");
}

// ══════════════════════════════════════════════════════════════
// Frightened window
// ══════════════════════════════════════════════════════════════

fn resolve_frightened(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.scheduler.tick_frightened(dt, &mut world.ghosts) {
        events.push(GameEvent::FrightenedEnded);
    }
}

// ══════════════════════════════════════════════════════════════
// Ghosts
// ══════════════════════════════════════════════════════════════

fn resolve_ghosts(world: &mut WorldState, dt: f32) {
    let targets: [TilePos; 4] = std::array::from_fn(|i| {
        let reference = if i == 0 { None } else { Some(&world.ghosts[0]) };
        ai::target(&world.ghosts[i], &world.player, reference)
    });

    let phase = world.scheduler.phase_mode();
    for (g, target) in world.ghosts.iter_mut().zip(targets) {
        g.target = target;
        g.update(dt, &world.maze, phase);
    }
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

/// Where everyone stood before this frame's movement.
struct Footprint {
    player: Position,
    ghosts: [Position; 4],
}

impl Footprint {
    fn of(world: &WorldState) -> Self {
        Footprint {
            player: world.player.pos,
            ghosts: std::array::from_fn(|i| world.ghosts[i].pos),
        }
    }
}

/// A ghost touches the player when they share a tile, are within
/// `CATCH_RADIUS`, or passed through each other this frame.
fn touching(world: &WorldState, before: &Footprint, i: usize) -> bool {
    let g = &world.ghosts[i];
    g.tile() == world.player.tile()
        || world.player.pos.distance(g.pos) < CATCH_RADIUS
        || crossed(before.player, before.ghosts[i], world.player.pos, g.pos)
}

/// Head-on pass along a row or column: the offset between the two flipped
/// sign while the other axis stayed aligned. A tunnel wrap is a jump, not a pass.
fn crossed(p0: Position, g0: Position, p1: Position, g1: Position) -> bool {
    let (dx0, dy0) = (g0.x - p0.x, g0.y - p0.y);
    let (dx1, dy1) = (g1.x - p1.x, g1.y - p1.y);
    let near = |a: f32, b: f32| a.abs() < CATCH_RADIUS && b.abs() < CATCH_RADIUS;
    let flipped = |a: f32, b: f32| a * b < 0.0 && (a - b).abs() < 4.0 * TILE;
    (near(dy0, dy1) && flipped(dx0, dx1)) || (near(dx0, dx1) && flipped(dy0, dy1))
}

/// Ghosts are checked in array order and the first hit ends the check:
/// a frightened ghost is eaten, anything else but eyes kills. The bonus
/// item is only looked at when no ghost was touched.
/// Returns `true` if gameplay froze.
fn resolve_collisions(world: &mut WorldState, before: &Footprint, events: &mut Vec<GameEvent>) -> bool {
    if !world.player.is_alive() {
        return false;
    }
    let here = world.player.tile();

    for i in 0..world.ghosts.len() {
        let g = &world.ghosts[i];
        if g.is_home() || g.is_eyes() || !touching(world, before, i) {
            continue;
        }

        if g.is_frightened() {
            let points = world.scheduler.award_ghost();
            let ghost = g.personality;
            let pos = g.pos;
            world.ghosts[i].send_home();
            add_score(world, points, events);
            world.spawn_popup(points, pos);
            world.eaten_ghost = Some(i);
            world.set_phase(Phase::GhostEaten);
            events.push(GameEvent::GhostEaten { ghost, points });
            debug!(ghost = ghost.name(), points, "ghost eaten");
        } else {
            let ghost = g.personality;
            set_siren(world, SirenState::Off, events);
            world.set_phase(Phase::PreDeath);
            events.push(GameEvent::PlayerKilled);
            info!(ghost = ghost.name(), ?here, "player caught");
        }
        return true;
    }

    resolve_bonus_pickup(world, events);
    false
}

fn resolve_bonus_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(bonus) = &world.bonus else { return };
    if world.player.pos.distance(bonus.pos) >= BONUS_REACH {
        return;
    }
    let kind = bonus.kind;
    let pos = bonus.pos;
    let points = kind.points();
    world.bonus = None;
    add_score(world, points, events);
    world.spawn_popup(points, pos);
    events.push(GameEvent::BonusEaten { kind, points });
    debug!(?kind, points, "bonus eaten");
}

// ══════════════════════════════════════════════════════════════
// Siren
// ══════════════════════════════════════════════════════════════

/// Left alone while frightened: the frightened cue owns the loop then.
fn update_siren(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.scheduler.is_frightened() {
        return;
    }
    let wanted = if world.maze.remaining() < SIREN_FAST_BELOW {
        SirenState::Fast
    } else {
        SirenState::Normal
    };
    set_siren(world, wanted, events);
}

fn set_siren(world: &mut WorldState, siren: SirenState, events: &mut Vec<GameEvent>) {
    if world.siren != siren {
        world.siren = siren;
        events.push(GameEvent::Siren(siren));
    }
}

// ══════════════════════════════════════════════════════════════
// Round end / lives
// ══════════════════════════════════════════════════════════════

fn resolve_round_clear(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.maze.remaining() > 0 {
        return false;
    }
    set_siren(world, SirenState::Off, events);
    world.bonus = None;
    world.set_phase(Phase::LevelClear);
    events.push(GameEvent::LevelCleared { level: world.level });
    info!(level = world.level, score = world.score, "level cleared");
    true
}

fn resolve_bonus_timer(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let expired = match world.bonus.as_mut() {
        Some(b) => b.timer.tick(dt),
        None => false,
    };
    if expired {
        world.bonus = None;
        events.push(GameEvent::BonusExpired);
    }
}

fn lose_life(world: &mut WorldState, store: &mut dyn HighScoreStore, events: &mut Vec<GameEvent>) {
    world.lives = world.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost { lives_left: world.lives });

    if world.lives == 0 {
        store.save_high_score(world.high_score);
        world.set_phase(Phase::GameOver);
        events.push(GameEvent::GameOver { score: world.score });
        info!(score = world.score, high_score = world.high_score, "game over");
    } else {
        world.reset_positions();
        world.set_phase(Phase::Ready);
    }
}

// ══════════════════════════════════════════════════════════════
// Pause
// ══════════════════════════════════════════════════════════════

fn pause(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    debug!(
        step = world.scheduler.step(),
        phase = ?world.scheduler.phase(),
        left = world.scheduler.phase_remaining(),
        "paused"
    );
    world.set_phase(Phase::Paused);
    events.push(GameEvent::Paused);
    set_siren(world, SirenState::Off, events);
}

fn resume(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.set_phase(Phase::Playing);
    events.push(GameEvent::Resumed);
    update_siren(world, events);
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::ghost::{GhostState, Personality};
    use crate::domain::maze::{Maze, CLASSIC_LAYOUT};
    use crate::domain::nav::Direction;
    use crate::sim::save::MemoryHighScore;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct RecordingAudio {
        heard: RefCell<Vec<GameEvent>>,
        intro: Cell<bool>,
    }

    impl Audio for RecordingAudio {
        fn on_event(&self, event: &GameEvent) {
            self.heard.borrow_mut().push(event.clone());
        }

        fn intro_playing(&self) -> bool {
            self.intro.get()
        }
    }

    struct Rig {
        world: WorldState,
        audio: RecordingAudio,
        store: MemoryHighScore,
        events: Vec<GameEvent>,
    }

    impl Rig {
        fn new(maze: Maze) -> Self {
            let store = MemoryHighScore::default();
            let world = WorldState::new(maze, TimingConfig::default(), 3, &store);
            Rig { world, audio: RecordingAudio::default(), store, events: vec![] }
        }

        fn classic() -> Self {
            Rig::new(Maze::classic().unwrap())
        }

        /// Skip the intro: straight into Playing at level 1.
        fn playing(maze: Maze) -> Self {
            let mut rig = Rig::new(maze);
            rig.world.start_game();
            rig.world.set_phase(Phase::Playing);
            rig
        }

        fn frame(&mut self, input: FrameInput) -> Vec<GameEvent> {
            let ev = update(&mut self.world, input, DT, &self.audio, &mut self.store);
            self.events.extend(ev.iter().cloned());
            ev
        }

        fn idle(&mut self) -> Vec<GameEvent> {
            self.frame(FrameInput::default())
        }

        fn run(&mut self, secs: f32) {
            for _ in 0..(secs / DT).round() as usize {
                self.idle();
            }
        }

        fn run_until(&mut self, phase: Phase, max_secs: f32) -> bool {
            for _ in 0..(max_secs / DT) as usize {
                if self.world.phase == phase {
                    return true;
                }
                self.idle();
            }
            self.world.phase == phase
        }

        fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }
    }

    fn start() -> FrameInput {
        FrameInput { start: true, ..FrameInput::default() }
    }

    fn pause_key() -> FrameInput {
        FrameInput { pause: true, ..FrameInput::default() }
    }

    /// Classic walls with every pellet removed except those at `keep`.
    fn maze_with_pellets(keep: &[(usize, usize)]) -> Maze {
        let rows: Vec<String> = CLASSIC_LAYOUT
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.chars()
                    .enumerate()
                    .map(|(x, c)| match c {
                        '.' | 'o' if !keep.contains(&(x, y)) => ' ',
                        other => other,
                    })
                    .collect()
            })
            .collect();
        Maze::from_rows(rows.as_slice()).unwrap()
    }

    /// Put ghost `i` on `tile`, roaming in `state`.
    fn place(world: &mut WorldState, i: usize, tile: TilePos, state: GhostState) {
        let g = &mut world.ghosts[i];
        g.pos = Position::of_tile(tile);
        g.dir = Direction::Left;
        g.state = state;
    }

    // ── Flow ──

    #[test]
    fn start_waits_for_intro_then_ready_then_playing() {
        let mut rig = Rig::classic();
        rig.run(1.0);
        assert_eq!(rig.world.phase, Phase::PressStart);

        rig.audio.intro.set(true);
        let ev = rig.frame(start());
        assert_eq!(ev, vec![GameEvent::StartupCue]);
        assert_eq!(rig.world.phase, Phase::Startup);

        rig.run(3.0);
        assert_eq!(rig.world.phase, Phase::Startup, "intro still playing");
        rig.audio.intro.set(false);
        rig.idle();
        assert_eq!(rig.world.phase, Phase::Ready);

        rig.run(1.9);
        assert_eq!(rig.world.phase, Phase::Ready);
        rig.run(0.2);
        assert_eq!(rig.world.phase, Phase::Playing);
        assert_eq!(rig.world.siren, SirenState::Normal);
    }

    #[test]
    fn startup_has_a_minimum_dwell() {
        let mut rig = Rig::classic();
        rig.frame(start());
        rig.run(0.4);
        assert_eq!(rig.world.phase, Phase::Startup);
        rig.run(0.2);
        assert_eq!(rig.world.phase, Phase::Ready);
    }

    #[test]
    fn events_reach_the_audio_port_in_order() {
        let mut rig = Rig::classic();
        rig.frame(start());
        assert!(rig.run_until(Phase::Playing, 5.0));
        rig.run(0.5);
        assert_eq!(*rig.audio.heard.borrow(), rig.events);
        assert_eq!(rig.events[0], GameEvent::StartupCue);
    }

    #[test]
    fn dt_is_clamped() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let before = rig.world.player.pos.x;
        update(&mut rig.world, FrameInput::default(), 5.0, &rig.audio, &mut rig.store);
        // 0.1 s at most: well under one tile of travel per 0.1 s at 80%.
        assert!(before - rig.world.player.pos.x <= 8.0);
    }

    // ── Round clear ──

    #[test]
    fn round_clears_exactly_once_on_the_last_pellet() {
        let maze = maze_with_pellets(&[(10, 22), (11, 22), (12, 22), (13, 22)]);
        assert_eq!(maze.total(), 4);
        let mut rig = Rig::new(maze);
        rig.frame(start());
        assert!(rig.run_until(Phase::Playing, 5.0));

        let mut eaten = 0;
        for _ in 0..600 {
            for e in rig.idle() {
                match e {
                    GameEvent::PelletEaten => eaten += 1,
                    GameEvent::LevelCleared { level } => {
                        assert_eq!(level, 1);
                        assert_eq!(eaten, 4, "cleared only after the 4th pellet");
                    }
                    _ => {}
                }
            }
            if rig.world.phase == Phase::LevelClear {
                break;
            }
        }
        assert_eq!(rig.world.phase, Phase::LevelClear);

        rig.run(1.5);
        assert_eq!(rig.count(|e| matches!(e, GameEvent::LevelCleared { .. })), 1);
        assert_eq!(rig.world.score, 40);
    }

    #[test]
    fn level_clear_advances_and_refills() {
        let maze = maze_with_pellets(&[(13, 22)]);
        let mut rig = Rig::playing(maze);
        assert!(rig.run_until(Phase::LevelClear, 2.0));
        assert!(rig.run_until(Phase::Ready, 3.0));
        assert_eq!(rig.world.level, 2);
        assert_eq!(rig.world.maze.remaining(), 1);
        assert_eq!(rig.world.player.speed_scale, 1.125);
    }

    // ── Pellets / bonus / siren ──

    #[test]
    fn power_pellet_frightens_roaming_ghosts() {
        let rows: Vec<String> = CLASSIC_LAYOUT
            .iter()
            .enumerate()
            .map(|(y, r)| {
                if y == 22 {
                    "#o..##.......o........##..o#".to_string()
                } else {
                    r.to_string()
                }
            })
            .collect();
        let mut rig = Rig::playing(Maze::from_rows(rows.as_slice()).unwrap());
        rig.world.player.pos = Position::of_tile(TilePos::new(13, 22));

        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::PowerPelletEaten));
        assert!(ev.contains(&GameEvent::FrightenedStarted));
        assert!(rig.world.ghosts[0].is_frightened(), "Blinky is out");
        assert!(rig.world.ghosts[3].is_home(), "Clyde is still in the pen");
        assert_eq!(rig.world.score, 50);
    }

    #[test]
    fn bonus_appears_at_seventy_and_can_be_eaten() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let mut eaten = 0;
        'outer: for y in 1..30 {
            for x in 1..27 {
                if y == 22 {
                    continue;
                }
                if rig.world.maze.consume_pellet(TilePos::new(x, y)) {
                    eaten += 1;
                    if eaten == 69 {
                        break 'outer;
                    }
                }
            }
        }

        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::BonusSpawned(BonusKind::Cherry)));
        assert_eq!(rig.world.bonus_offered, 1);

        // Walk onto it.
        rig.world.player.pos = Position::new(104.0, 136.0);
        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::BonusEaten { kind: BonusKind::Cherry, points: 100 }));
        assert!(rig.world.bonus.is_none());
        assert_eq!(rig.world.popups.len(), 1);
    }

    #[test]
    fn bonus_expires() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        rig.world.bonus = Some(Bonus {
            kind: BonusKind::Cherry,
            pos: BONUS_POSITION,
            timer: Countdown::armed(0.5),
        });
        let mut events = vec![];
        for _ in 0..40 {
            resolve_bonus_timer(&mut rig.world, DT, &mut events);
        }
        assert_eq!(events, vec![GameEvent::BonusExpired]);
        assert!(rig.world.bonus.is_none());
    }

    #[test]
    fn siren_speeds_up_under_forty() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let mut left = rig.world.maze.remaining();
        for y in 1..30 {
            for x in 1..27 {
                if left == 40 || (x, y) == (14, 22) {
                    continue;
                }
                if rig.world.maze.consume_pellet(TilePos::new(x, y))
                    || rig.world.maze.consume_power_pellet(TilePos::new(x, y))
                {
                    left -= 1;
                }
            }
        }
        assert_eq!(rig.world.maze.remaining(), 40);

        // First frame bites (14,22): 39 left.
        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::Siren(SirenState::Fast)));
        assert!(!ev.contains(&GameEvent::Siren(SirenState::Normal)));
    }

    // ── Collisions ──

    #[test]
    fn frightened_ghost_is_eaten_and_freezes() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let here = rig.world.player.tile();
        place(&mut rig.world, 1, here, GhostState::Scattering);
        rig.world.scheduler.activate_frightened(&mut rig.world.ghosts);

        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::GhostEaten { ghost: Personality::Pinky, points: 200 }));
        assert_eq!(rig.world.phase, Phase::GhostEaten);
        assert!(rig.world.ghosts[1].is_eyes());
        assert_eq!(rig.world.eaten_ghost, Some(1));

        // Frozen: nobody moves, the popup still ages.
        let pos = rig.world.player.pos;
        rig.run(0.5);
        assert_eq!(rig.world.player.pos, pos);
        assert_eq!(rig.world.popups.len(), 1);
        rig.run(0.6);
        assert_eq!(rig.world.phase, Phase::Playing);
        assert!(rig.world.popups.is_empty());
    }

    #[test]
    fn edible_before_lethal_in_array_order() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let here = rig.world.player.tile();
        place(&mut rig.world, 0, here, GhostState::Frightened { blinking: false });
        place(&mut rig.world, 1, here, GhostState::Chasing);

        let ev = rig.idle();
        assert!(ev.iter().any(|e| matches!(e, GameEvent::GhostEaten { ghost: Personality::Blinky, .. })));
        assert!(!ev.contains(&GameEvent::PlayerKilled));
        assert_eq!(rig.world.phase, Phase::GhostEaten);
    }

    #[test]
    fn lethal_first_ends_the_check() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let here = rig.world.player.tile();
        place(&mut rig.world, 0, here, GhostState::Chasing);
        place(&mut rig.world, 1, here, GhostState::Frightened { blinking: false });

        let ev = rig.idle();
        assert!(ev.contains(&GameEvent::PlayerKilled));
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::GhostEaten { .. })));
        assert_eq!(rig.world.phase, Phase::PreDeath);
        assert!(rig.world.ghosts[1].is_frightened());
    }

    #[test]
    fn eyes_are_harmless() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let here = rig.world.player.tile();
        place(&mut rig.world, 0, here, GhostState::Scattering);
        rig.world.ghosts[0].send_home();
        rig.idle();
        assert_eq!(rig.world.phase, Phase::Playing);
    }

    #[test]
    fn head_on_never_passes_through() {
        for dt in [DT, 0.1] {
            for col in 8..16 {
                for off in 0..8 {
                    let mut rig = Rig::playing(Maze::classic().unwrap());
                    let w = &mut rig.world;
                    w.player.pos = Position::of_tile(TilePos::new(6, 5));
                    w.player.dir = Direction::Right;
                    w.player.desired = Direction::Right;
                    place(w, 0, TilePos::new(col, 5), GhostState::Chasing);
                    w.ghosts[0].pos.x += off as f32;

                    let mut caught = false;
                    for _ in 0..(2.0 / dt) as usize {
                        for g in &mut rig.world.ghosts[1..] {
                            g.reset();
                        }
                        update(&mut rig.world, FrameInput::default(), dt, &rig.audio, &mut rig.store);
                        if rig.world.phase == Phase::PreDeath {
                            caught = true;
                            break;
                        }
                    }
                    assert!(caught, "passed through: dt={dt} col={col} off={off}");
                }
            }
        }
    }

    #[test]
    fn crossing_needs_alignment() {
        let p = |x: f32, y: f32| Position::new(x, y);
        assert!(crossed(p(40.0, 40.0), p(48.0, 40.0), p(49.0, 40.0), p(39.0, 40.0)));
        assert!(!crossed(p(40.0, 40.0), p(48.0, 48.0), p(49.0, 40.0), p(39.0, 48.0)), "different rows");
        assert!(!crossed(p(4.0, 112.0), p(-6.0, 112.0), p(2.0, 112.0), p(216.0, 112.0)), "tunnel wrap");
    }

    #[test]
    fn eaten_ghost_comes_back_out_unfrightened() {
        let mut rig = Rig::playing(maze_with_pellets(&[(26, 28)]));
        rig.world.scheduler.activate_frightened(&mut rig.world.ghosts);
        let here = rig.world.player.tile();
        place(&mut rig.world, 0, here, GhostState::Frightened { blinking: false });
        rig.idle();
        assert!(rig.world.ghosts[0].is_eyes());

        let mut released_in_fright = false;
        for _ in 0..(10.0 / DT) as usize {
            // Keep the rest penned and the player parked
            for g in &mut rig.world.ghosts[1..] {
                g.reset();
            }
            rig.world.player.dir = Direction::None;
            rig.world.player.desired = Direction::None;
            rig.idle();
            let g = &rig.world.ghosts[0];
            if !g.is_eyes() && !g.is_home() {
                released_in_fright = rig.world.scheduler.is_frightened();
                break;
            }
        }
        assert!(released_in_fright, "back out while the window is still open");
        assert_eq!(rig.world.ghosts[0].state, GhostState::Scattering);
        assert_eq!(
            rig.count(|e| matches!(e, GameEvent::GhostEaten { ghost: Personality::Blinky, .. })),
            1
        );
    }

    #[test]
    fn ghost_ladder_climbs_within_one_window() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        rig.world.scheduler.activate_frightened(&mut rig.world.ghosts);
        let mut points = vec![];
        for i in 0..3 {
            let here = rig.world.player.tile();
            place(&mut rig.world, i, here, GhostState::Frightened { blinking: false });
            for e in rig.idle() {
                if let GameEvent::GhostEaten { points: p, .. } = e {
                    points.push(p);
                }
            }
            assert!(rig.run_until(Phase::Playing, 2.0));
        }
        assert_eq!(points, vec![200, 400, 800]);
    }

    // ── Death / game over ──

    #[test]
    fn death_costs_a_life_and_returns_to_ready() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        let here = rig.world.player.tile();
        place(&mut rig.world, 2, here, GhostState::Chasing);
        rig.idle();
        assert_eq!(rig.world.phase, Phase::PreDeath);
        assert_eq!(rig.world.siren, SirenState::Off);

        rig.run(1.05);
        assert_eq!(rig.world.phase, Phase::Death);
        assert_eq!(rig.count(|e| *e == GameEvent::DeathAnimation), 1);

        assert!(rig.run_until(Phase::Ready, 2.0));
        assert_eq!(rig.world.lives, 2);
        assert!(rig.events.contains(&GameEvent::LifeLost { lives_left: 2 }));
        assert!(rig.world.ghosts[2].is_home(), "positions reset");
        assert_eq!(rig.world.maze.remaining(), 239, "eaten pellets stay eaten");
    }

    #[test]
    fn last_life_ends_the_game_and_saves() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        rig.world.lives = 1;
        rig.world.score = 1230;
        rig.world.high_score = 1230;
        let here = rig.world.player.tile();
        place(&mut rig.world, 0, here, GhostState::Chasing);
        rig.idle(); // bites the start pellet, then gets caught
        assert!(rig.run_until(Phase::GameOver, 4.0));
        assert!(rig.events.contains(&GameEvent::GameOver { score: 1240 }));
        assert_eq!(rig.store.saves, vec![1240]);

        // Restart: saved again, fresh game through the intro.
        let ev = rig.frame(start());
        assert_eq!(ev, vec![GameEvent::StartupCue]);
        assert_eq!(rig.store.saves, vec![1240, 1240]);
        assert_eq!(rig.world.score, 0);
        assert_eq!(rig.world.lives, 3);
        assert_eq!(rig.world.level, 1);
        assert_eq!(rig.world.high_score, 1240);
    }

    #[test]
    fn high_score_beaten_fires_once() {
        let store = MemoryHighScore::with(15);
        let world = WorldState::new(Maze::classic().unwrap(), TimingConfig::default(), 3, &store);
        let mut rig = Rig { world, audio: RecordingAudio::default(), store, events: vec![] };
        rig.world.start_game();
        rig.world.set_phase(Phase::Playing);
        rig.run(1.0);
        assert!(rig.world.score > 15);
        assert_eq!(rig.world.high_score, rig.world.score);
        assert_eq!(rig.count(|e| *e == GameEvent::HighScoreBeaten), 1);
    }

    // ── Pause ──

    #[test]
    fn pause_freezes_everything() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        rig.run(0.5);
        assert_eq!(rig.world.siren, SirenState::Normal);

        let ev = rig.frame(pause_key());
        assert_eq!(ev, vec![GameEvent::Paused, GameEvent::Siren(SirenState::Off)]);
        assert_eq!(rig.world.phase, Phase::Paused);

        let pos = rig.world.player.pos;
        let blinky = rig.world.ghosts[0].pos;
        let schedule = rig.world.scheduler.phase_remaining();
        rig.run(3.0);
        assert_eq!(rig.world.player.pos, pos);
        assert_eq!(rig.world.ghosts[0].pos, blinky);
        assert_eq!(rig.world.scheduler.phase_remaining(), schedule);

        let ev = rig.frame(pause_key());
        assert_eq!(ev, vec![GameEvent::Resumed, GameEvent::Siren(SirenState::Normal)]);
        assert_eq!(rig.world.phase, Phase::Playing);
    }

    #[test]
    fn pause_is_ignored_outside_play() {
        let mut rig = Rig::classic();
        rig.frame(pause_key());
        assert_eq!(rig.world.phase, Phase::PressStart);
    }

    #[test]
    fn direction_input_is_buffered() {
        let mut rig = Rig::playing(Maze::classic().unwrap());
        rig.frame(FrameInput { direction: Some(Direction::Up), ..FrameInput::default() });
        assert_eq!(rig.world.player.desired, Direction::Up);
        assert_eq!(rig.world.player.dir, Direction::Left, "not legal here yet");
    }
}
