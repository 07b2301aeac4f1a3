/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub starting_lives: u32,
    pub high_score_file: PathBuf,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
}

/// Durations the simulation runs on. Handed to `WorldState` by value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub max_dt: f32,
    pub ready_secs: f32,
    pub startup_min_secs: f32,
    pub ghost_eaten_freeze_secs: f32,
    pub pre_death_freeze_secs: f32,
    pub level_clear_secs: f32,
    pub frightened_secs: f32,
    pub frightened_blink_secs: f32,
    pub bonus_visible_secs: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub start: Vec<String>,
    pub pause: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_dt")]
    max_dt: f32,
    #[serde(default = "default_ready")]
    ready_secs: f32,
    #[serde(default = "default_startup_min")]
    startup_min_secs: f32,
    #[serde(default = "default_freeze")]
    ghost_eaten_freeze_secs: f32,
    #[serde(default = "default_freeze")]
    pre_death_freeze_secs: f32,
    #[serde(default = "default_level_clear")]
    level_clear_secs: f32,
    #[serde(default = "default_frightened")]
    frightened_secs: f32,
    #[serde(default = "default_blink")]
    frightened_blink_secs: f32,
    #[serde(default = "default_bonus_visible")]
    bonus_visible_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_lives")]
    starting_lives: u32,
    #[serde(default = "default_high_score_file")]
    high_score_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_start")]
    start: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }
fn default_max_dt() -> f32 { 0.1 }      // absorbs terminal stalls
fn default_ready() -> f32 { 2.0 }
fn default_startup_min() -> f32 { 0.5 }
fn default_freeze() -> f32 { 1.0 }
fn default_level_clear() -> f32 { 2.0 }
fn default_frightened() -> f32 { 6.0 }
fn default_blink() -> f32 { 2.0 }       // last 2s of the frightened window
fn default_bonus_visible() -> f32 { 10.0 }

fn default_lives() -> u32 { 3 }
fn default_high_score_file() -> String { "highscore.dat".into() }

fn default_start() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pause() -> Vec<String> { vec!["Select".into()] }

fn default_log_file() -> String { "pacman-term.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            max_dt: default_max_dt(),
            ready_secs: default_ready(),
            startup_min_secs: default_startup_min(),
            ghost_eaten_freeze_secs: default_freeze(),
            pre_death_freeze_secs: default_freeze(),
            level_clear_secs: default_level_clear(),
            frightened_secs: default_frightened(),
            frightened_blink_secs: default_blink(),
            bonus_visible_secs: default_bonus_visible(),
        }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            starting_lives: default_lives(),
            high_score_file: default_high_score_file(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            start: default_start(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        TimingConfig {
            frame_ms: t.frame_ms.max(1),
            max_dt: t.max_dt.max(0.001),
            ready_secs: t.ready_secs,
            startup_min_secs: t.startup_min_secs,
            ghost_eaten_freeze_secs: t.ghost_eaten_freeze_secs,
            pre_death_freeze_secs: t.pre_death_freeze_secs,
            level_clear_secs: t.level_clear_secs,
            frightened_secs: t.frightened_secs,
            frightened_blink_secs: t.frightened_blink_secs.min(t.frightened_secs),
            bonus_visible_secs: t.bonus_visible_secs,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, current working directory, then
    /// `~/.local/share/pacman-term`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::from_toml(load_toml(&candidate_dirs()))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            timing: cfg.timing.into(),
            starting_lives: cfg.game.starting_lives.max(1),
            high_score_file: PathBuf::from(cfg.game.high_score_file),
            gamepad: GamepadConfig {
                start: cfg.gamepad.start,
                pause: cfg.gamepad.pause,
            },
            log: LogConfig {
                file: PathBuf::from(cfg.log.file),
                level: cfg.log.level,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/pacman-term)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pacman-term");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
