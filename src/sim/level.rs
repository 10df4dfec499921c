/// Level loading and the play-session orchestrator.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Line 1 (optional): `# Level Name`
///   Remaining lines: map rows, top row = farthest cell (largest z)
///
/// ## Tile legend:
///   '#' = Brick (grants on first visit)   '.' = Ground
///   'L' = Line (pays one brick)           'W' = Win-pos decoration
///   'D' = Destination                     'O' = Pushable obstacle
///   'S' = Spawn (stands on a brick tile)  ' ' = Void
///
/// Orthogonally adjacent line cells form one group: they hide and reappear
/// together. Without an explicit 'S' the spawn falls back to the nearest
/// brick cell (lowest z, then lowest x).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::config::GameConfig;
use crate::domain::grid::GridPoint;
use crate::domain::services::{EffectHandle, GroupId};
use crate::domain::surface::Surface;
use crate::sim::board::LevelBoard;
use crate::sim::player::PlayerController;

/// Coins granted for each completed level.
pub const COINS_PER_LEVEL: u32 = 50;

/// Effect fired at the destination; the board records plays of it.
const WIN_EFFECT: EffectHandle = EffectHandle(1);

/// Runtime level data (owned strings, loaded from file or embedded).
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

#[derive(Debug)]
pub enum LevelError {
    /// No level source yielded a single level.
    NoLevels,
    /// A level defines neither an 'S' marker nor any brick cell.
    MissingSpawn(String),
    /// A level has no destination cell.
    MissingDestination(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoLevels => write!(f, "no levels available"),
            LevelError::MissingSpawn(name) => {
                write!(f, "level '{name}' has no spawn marker and no brick cell")
            }
            LevelError::MissingDestination(name) => {
                write!(f, "level '{name}' has no destination cell")
            }
        }
    }
}

impl std::error::Error for LevelError {}

/// Session phase, driven by the orchestrator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
}

// ══════════════════════════════════════════════════════════════
// Orchestrator
// ══════════════════════════════════════════════════════════════

/// Owns the level list and session progress: which level is active, the
/// coin balance, and the phase. Loading a level rebuilds the board and
/// resets the player controller atomically.
pub struct Orchestrator {
    levels: Vec<LevelDef>,
    current: usize,
    coins: u32,
    phase: Phase,
}

impl Orchestrator {
    pub fn new(levels: Vec<LevelDef>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        Ok(Orchestrator {
            levels,
            current: 0,
            coins: 0,
            phase: Phase::Title,
        })
    }

    /// Build from config: `levels/` directory when present, embedded
    /// levels otherwise.
    pub fn from_config(config: &GameConfig) -> Result<Self, LevelError> {
        let mut levels = load_from_directory(&config.levels_dir);
        if levels.is_empty() {
            levels = embedded_levels();
        }
        Orchestrator::new(levels)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level_name(&self) -> &str {
        &self.levels[self.current].name
    }

    /// Enter play on the current level.
    pub fn start(&mut self, player: &mut PlayerController) -> Result<LevelBoard, LevelError> {
        self.load(self.current, player)
    }

    /// Restart the current level. Coins are kept.
    pub fn reload(&mut self, player: &mut PlayerController) -> Result<LevelBoard, LevelError> {
        self.load(self.current, player)
    }

    /// Mark the current level complete and bank the reward.
    pub fn complete_level(&mut self) {
        if self.phase == Phase::Playing {
            self.coins += COINS_PER_LEVEL;
            self.phase = Phase::LevelComplete;
        }
    }

    /// Advance to the next level, wrapping to the first after the last.
    pub fn next_level(&mut self, player: &mut PlayerController) -> Result<LevelBoard, LevelError> {
        let next = (self.current + 1) % self.levels.len();
        self.load(next, player)
    }

    /// Abandon play and return to the title screen. Progress is kept.
    pub fn return_to_title(&mut self) {
        self.phase = Phase::Title;
    }

    fn load(
        &mut self,
        index: usize,
        player: &mut PlayerController,
    ) -> Result<LevelBoard, LevelError> {
        let def = &self.levels[index];
        let (mut board, spawn) = build_board(def)?;
        player.initialize(spawn, &mut board);
        player.set_visual_effect(WIN_EFFECT);
        self.current = index;
        self.phase = Phase::Playing;
        Ok(board)
    }
}

// ══════════════════════════════════════════════════════════════
// Board construction
// ══════════════════════════════════════════════════════════════

/// Materialize a parsed level into a board plus the spawn cell.
/// Row 0 of the file is the farthest row, so z = (height - 1) - y.
pub fn build_board(def: &LevelDef) -> Result<(LevelBoard, GridPoint), LevelError> {
    let height = def.rows.len() as i32;
    let mut surfaces: HashMap<GridPoint, Surface> = HashMap::new();
    let mut spawn = None;
    let mut has_destination = false;

    for (y, row) in def.rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let at = GridPoint::new(x as i32, height - 1 - y as i32);
            let surface = match ch {
                '#' => Surface::Brick,
                '.' => Surface::Ground,
                'L' => Surface::Line,
                'W' => Surface::WinPos,
                'D' => {
                    has_destination = true;
                    Surface::Destination
                }
                'O' => Surface::Pushable,
                'S' => {
                    spawn = Some(at);
                    Surface::Brick
                }
                _ => continue,
            };
            surfaces.insert(at, surface);
        }
    }

    if !has_destination {
        return Err(LevelError::MissingDestination(def.name.clone()));
    }

    let spawn = match spawn.or_else(|| nearest_brick(&surfaces)) {
        Some(s) => s,
        None => return Err(LevelError::MissingSpawn(def.name.clone())),
    };

    let groups = assign_line_groups(&surfaces);
    let mut board = LevelBoard::new();
    for (&at, &surface) in &surfaces {
        board.insert_cell(at, surface, groups.get(&at).copied());
    }
    Ok((board, spawn))
}

/// Spawn fallback: the brick cell with the lowest z, then lowest x.
fn nearest_brick(surfaces: &HashMap<GridPoint, Surface>) -> Option<GridPoint> {
    surfaces
        .iter()
        .filter(|(_, s)| **s == Surface::Brick)
        .map(|(p, _)| *p)
        .min_by_key(|p| (p.z, p.x))
}

/// Flood-fill 4-connected line cells into groups. Group ids are assigned
/// in scan order (lowest z, then x) so they are deterministic.
fn assign_line_groups(surfaces: &HashMap<GridPoint, Surface>) -> HashMap<GridPoint, GroupId> {
    let mut line_cells: Vec<GridPoint> = surfaces
        .iter()
        .filter(|(_, s)| **s == Surface::Line)
        .map(|(p, _)| *p)
        .collect();
    line_cells.sort_by_key(|p| (p.z, p.x));

    let mut groups = HashMap::new();
    let mut next_group = 1u32;

    for start in line_cells {
        if groups.contains_key(&start) {
            continue;
        }
        let id = GroupId(next_group);
        next_group += 1;

        let mut stack = vec![start];
        while let Some(p) = stack.pop() {
            if groups.insert(p, id).is_some() {
                continue;
            }
            let neighbors = [
                GridPoint::new(p.x + 1, p.z),
                GridPoint::new(p.x - 1, p.z),
                GridPoint::new(p.x, p.z + 1),
                GridPoint::new(p.x, p.z - 1),
            ];
            for n in neighbors {
                if surfaces.get(&n) == Some(&Surface::Line) && !groups.contains_key(&n) {
                    stack.push(n);
                }
            }
        }
    }
    groups
}

// ══════════════════════════════════════════════════════════════
// Level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if rows.is_empty() && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    while rows.first().map_or(false, |r| r.trim().is_empty()) {
        rows.remove(0);
    }
    if rows.is_empty() {
        return None;
    }

    let max_width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut rows {
        if row.len() < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - row.len()));
        }
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    Some(LevelDef { name, rows })
}

/// Distinguish `# Level Name` from a map row that happens to start with a
/// brick tile. Tile characters are all uppercase or symbols, so any
/// lowercase letter marks a name.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line.chars().any(|c| c.is_lowercase())
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut results: Vec<(String, LevelDef)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    if let Some(def) = parse_level_file(&content) {
                        let filename = path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .to_string();
                        results.push((filename, def));
                    }
                }
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Level 1 - First Steps", &[
            " D ",
            " L ",
            " # ",
            " # ",
            " S ",
        ]),
        make_embedded("Level 2 - Toll Road", &[
            "WDW",
            " . ",
            " L ",
            " . ",
            " L ",
            " # ",
            " # ",
            " S ",
        ]),
        make_embedded("Level 3 - Roadblock", &[
            " D ",
            " . ",
            " L ",
            " #O",
            " #.",
            "  .",
            "  S",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::domain::grid::MoveDir;
    use crate::sim::player::Motion;

    fn def(rows: &[&str]) -> LevelDef {
        make_embedded("test", rows)
    }

    #[test]
    fn legend_maps_to_surfaces() {
        let (board, spawn) = build_board(&def(&[
            "WD",
            ".L",
            "#O",
            "S ",
        ]))
        .unwrap();

        // Row 0 is the farthest row: z decreases downward in the file.
        assert_eq!(spawn, GridPoint::new(0, 0));
        assert_eq!(board.cell(GridPoint::new(0, 3)).unwrap().surface, Surface::WinPos);
        assert_eq!(board.cell(GridPoint::new(1, 3)).unwrap().surface, Surface::Destination);
        assert_eq!(board.cell(GridPoint::new(0, 2)).unwrap().surface, Surface::Ground);
        assert_eq!(board.cell(GridPoint::new(1, 2)).unwrap().surface, Surface::Line);
        assert_eq!(board.cell(GridPoint::new(0, 1)).unwrap().surface, Surface::Brick);
        assert_eq!(board.cell(GridPoint::new(1, 1)).unwrap().surface, Surface::Pushable);
        // Spawn marker stands on a brick tile; void stays empty.
        assert_eq!(board.cell(spawn).unwrap().surface, Surface::Brick);
        assert!(board.cell(GridPoint::new(1, 0)).is_none());
    }

    #[test]
    fn adjacent_lines_share_a_group() {
        let (board, _) = build_board(&def(&[
            "D L",
            "LL.",
            "S..",
        ]))
        .unwrap();

        let a = board.cell(GridPoint::new(0, 1)).unwrap().group;
        let b = board.cell(GridPoint::new(1, 1)).unwrap().group;
        let lone = board.cell(GridPoint::new(2, 2)).unwrap().group;
        assert!(a.is_some());
        assert_eq!(a, b);
        // Diagonal contact does not join groups.
        assert_ne!(a, lone);
        assert!(lone.is_some());
    }

    #[test]
    fn spawn_falls_back_to_nearest_brick() {
        let (_, spawn) = build_board(&def(&[
            "D.",
            ".#",
            "#.",
        ]))
        .unwrap();
        // Lowest z wins.
        assert_eq!(spawn, GridPoint::new(0, 0));
    }

    #[test]
    fn level_without_spawn_or_destination_is_rejected() {
        assert!(matches!(
            build_board(&def(&["D.", ".."])),
            Err(LevelError::MissingSpawn(_))
        ));
        assert!(matches!(
            build_board(&def(&["#.", ".."])),
            Err(LevelError::MissingDestination(_))
        ));
    }

    #[test]
    fn name_line_is_separated_from_map_rows() {
        let parsed = parse_level_file("# My Level\n D \n S \n").unwrap();
        assert_eq!(parsed.name, "My Level");
        assert_eq!(parsed.rows.len(), 2);

        // A brick row is not mistaken for a name.
        let parsed = parse_level_file("#D#\n#S#\n").unwrap();
        assert_eq!(parsed.name, "Unnamed Level");
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn embedded_levels_all_build() {
        for level in embedded_levels() {
            build_board(&level).unwrap_or_else(|e| panic!("{}: {e}", level.name));
        }
    }

    #[test]
    fn orchestrator_wraps_and_banks_coins() {
        let mut player = PlayerController::new(&PlayerConfig {
            move_speed: 5.0,
            brick_height: 0.3,
            minimum_stack_height: 0,
        });
        let mut orch = Orchestrator::new(embedded_levels()).unwrap();
        assert_eq!(orch.phase(), Phase::Title);

        orch.start(&mut player).unwrap();
        assert_eq!(orch.phase(), Phase::Playing);
        assert_eq!(orch.current_level(), 0);

        orch.complete_level();
        assert_eq!(orch.coins(), COINS_PER_LEVEL);
        assert_eq!(orch.phase(), Phase::LevelComplete);
        // Completion is idempotent outside of play.
        orch.complete_level();
        assert_eq!(orch.coins(), COINS_PER_LEVEL);

        orch.next_level(&mut player).unwrap();
        assert_eq!(orch.current_level(), 1);
        orch.complete_level();
        orch.next_level(&mut player).unwrap();
        orch.complete_level();
        orch.next_level(&mut player).unwrap();
        // Past the last level the index wraps to the first.
        assert_eq!(orch.current_level(), 0);
        assert_eq!(orch.coins(), 3 * COINS_PER_LEVEL);
    }

    #[test]
    fn first_embedded_level_plays_through() {
        let mut player = PlayerController::new(&PlayerConfig {
            move_speed: 5.0,
            brick_height: 0.3,
            minimum_stack_height: 0,
        });
        let mut orch = Orchestrator::new(embedded_levels()).unwrap();
        let mut board = orch.start(&mut player).unwrap();

        assert!(player.try_move(MoveDir::Forward, &board));
        let mut events = Vec::new();
        for _ in 0..10_000 {
            if player.motion() != Motion::Moving {
                break;
            }
            player.update(1.0 / 30.0, &mut board, &mut events);
        }
        assert_eq!(player.motion(), Motion::Completed);
    }

    #[test]
    fn second_embedded_level_needs_two_swipes() {
        let mut player = PlayerController::new(&PlayerConfig {
            move_speed: 5.0,
            brick_height: 0.3,
            minimum_stack_height: 0,
        });
        let mut orch = Orchestrator::new(embedded_levels()).unwrap();
        orch.start(&mut player).unwrap();
        orch.complete_level();
        let mut board = orch.next_level(&mut player).unwrap();
        assert_eq!(orch.current_level(), 1);

        let run = |player: &mut PlayerController, board: &mut LevelBoard| {
            let mut events = Vec::new();
            for _ in 0..10_000 {
                if player.motion() != Motion::Moving {
                    break;
                }
                player.update(1.0 / 30.0, board, &mut events);
            }
        };

        // Two bricks buy passage over the first toll line; the second one
        // drains the stack and the run ends there.
        assert!(player.try_move(MoveDir::Forward, &board));
        run(&mut player, &mut board);
        assert_eq!(player.motion(), Motion::Idle);
        assert_eq!(player.brick_count(), 0);

        // A second swipe steps off the line and reaches the destination.
        assert!(player.try_move(MoveDir::Forward, &board));
        run(&mut player, &mut board);
        assert_eq!(player.motion(), Motion::Completed);
    }
}
