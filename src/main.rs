/// Entry point and game loop.
///
/// Per frame: drain keyboard + gamepad, fold them into one `FrameInput`,
/// advance the simulation by the measured wall-clock delta, draw.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use domain::maze::Maze;
use sim::ports::{Audio, FrameInput, HighScoreStore, Silent};
use sim::save::{self, FileHighScore};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_PAUSE, KEYS_START};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() -> anyhow::Result<()> {
    let config = GameConfig::load();
    init_logging(&config.log);

    let maze = Maze::classic().context("built-in maze layout is invalid")?;
    let mut store = FileHighScore::new(save::resolve_path(&config.high_score_file));
    info!(path = %store.path().display(), "high score file");
    let mut world = WorldState::new(maze, config.timing, config.starting_lives, &store);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    // Release events only when the terminal can report them
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false)
        && execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();

    let sound = SoundEngine::new();
    let audio: &dyn Audio = match &sound {
        Some(engine) => engine,
        None => &Silent,
    };

    let result = game_loop(&mut world, &mut renderer, audio, &mut store, &config, enhanced);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        warn!("terminal cleanup failed: {e}");
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing!");
    println!("Score: {}   High score: {}", world.score, world.high_score);
    Ok(())
}

/// File logging. An unopenable log file silently disables logging; the
/// terminal belongs to the game.
fn init_logging(cfg: &LogConfig) {
    let path = save::resolve_path(&cfg.file);
    let Ok(file) = File::create(&path) else {
        return;
    };
    let filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    audio: &dyn Audio,
    store: &mut FileHighScore,
    config: &GameConfig,
    enhanced: bool,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(connected = gp.connected, "gamepad");

    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        kb.drain_events();
        gp.update();

        let at_menu = matches!(world.phase, Phase::PressStart | Phase::GameOver);
        if kb.quit_requested(at_menu) {
            break;
        }
        let pause_key = kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed();

        let input = FrameInput {
            direction: kb.direction().or_else(|| gp.direction()),
            pause: pause_key,
            start: kb.any_pressed(KEYS_START) || gp.start_pressed(),
        };

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        step::update(world, input, dt, audio, store);
        renderer.render(world).context("render failed")?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // A record set in an unfinished game still counts
    if world.high_score > world.record_at_start && world.phase != Phase::GameOver {
        store.save_high_score(world.high_score);
    }
    info!(score = world.score, "quit");
    Ok(())
}
