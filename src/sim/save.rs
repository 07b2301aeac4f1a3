/// High score persistence.
///
/// ## File format:
///   Exactly 4 bytes, the score as a little-endian `u32`. Anything else
///   (missing file, short file, unreadable) reads as 0.
///
/// The file lives next to the executable when that directory is writable,
/// else under `~/.local/share/pacman-term`, else in the CWD. An absolute
/// path from the config is used as-is.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::ports::HighScoreStore;

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs won't be writable
            let test_path = parent.join(".write_test_pacman_term");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pacman-term");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Where `file` should live: absolute paths as given, relative ones in `save_dir()`.
pub fn resolve_path(file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        save_dir().join(file)
    }
}

// ══════════════════════════════════════════════════════════════
// File store
// ══════════════════════════════════════════════════════════════

pub struct FileHighScore {
    path: PathBuf,
}

impl FileHighScore {
    pub fn new(path: PathBuf) -> Self {
        FileHighScore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileHighScore {
    fn load_high_score(&self) -> u32 {
        match std::fs::read(&self.path) {
            Ok(bytes) => decode(&bytes).unwrap_or_else(|| {
                warn!(path = %self.path.display(), len = bytes.len(), "high score file malformed");
                0
            }),
            Err(e) => {
                debug!(path = %self.path.display(), "no high score: {e}");
                0
            }
        }
    }

    fn save_high_score(&mut self, score: u32) {
        if let Err(e) = std::fs::write(&self.path, score.to_le_bytes()) {
            warn!(path = %self.path.display(), "high score save failed: {e}");
        }
    }
}

fn decode(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

// ══════════════════════════════════════════════════════════════
// In-memory store (tests)
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
#[derive(Default)]
pub struct MemoryHighScore {
    pub value: u32,
    pub saves: Vec<u32>,
}

#[cfg(test)]
impl MemoryHighScore {
    pub fn with(value: u32) -> Self {
        MemoryHighScore { value, saves: vec![] }
    }
}

#[cfg(test)]
impl HighScoreStore for MemoryHighScore {
    fn load_high_score(&self) -> u32 {
        self.value
    }

    fn save_high_score(&mut self, score: u32) {
        self.value = score;
        self.saves.push(score);
    }
}
