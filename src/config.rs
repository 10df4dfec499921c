/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub tick_rate_ms: u64,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub move_speed: f32,
    pub brick_height: f32,
    /// Stacking-policy floor: 0 lets the stack empty, 1 keeps the last
    /// brick. Any other value is clamped with a warning.
    pub minimum_stack_height: usize,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_brick_height")]
    brick_height: f32,
    #[serde(default = "default_minimum_stack")]
    minimum_stack_height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_move_speed() -> f32 { 5.0 }
fn default_brick_height() -> f32 { 0.3 }
fn default_minimum_stack() -> usize { 0 }
fn default_tick_rate() -> u64 { 33 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            move_speed: default_move_speed(),
            brick_height: default_brick_height(),
            minimum_stack_height: default_minimum_stack(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let mut minimum_stack_height = toml_cfg.player.minimum_stack_height;
        if minimum_stack_height > 1 {
            eprintln!(
                "Warning: minimum_stack_height {} out of range, clamping to 1",
                minimum_stack_height
            );
            minimum_stack_height = 1;
        }

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            player: PlayerConfig {
                move_speed: toml_cfg.player.move_speed,
                brick_height: toml_cfg.player.brick_height,
                minimum_stack_height,
            },
            tick_rate_ms: toml_cfg.general.tick_rate_ms,
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged binary still finds data
        // relative to the real location.
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
