/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// World mapping: x runs right across the screen, z runs up it (larger z
/// is farther from the player's start), so the top buffer row shows the
/// camera's highest visible z.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::GridPoint;
use crate::domain::surface::Surface;
use crate::sim::board::LevelBoard;
use crate::sim::level::{Orchestrator, Phase};
use crate::sim::player::PlayerController;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, used for
    /// both `Clear` and cell backgrounds so inter-row gap pixels match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 32 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Camera ──

/// Visible window onto the world, in cell coordinates.
/// `x` is the leftmost visible column; `z_top` the highest visible z.
pub struct Camera {
    pub x: i32,
    pub z_top: i32,
    pub view_w: usize,
    pub view_h: usize,
}

/// Inclusive world extents, recomputed from the board each frame.
#[derive(Clone, Copy)]
struct Bounds {
    min_x: i32,
    max_x: i32,
    min_z: i32,
    max_z: i32,
}

impl Bounds {
    fn of(board: &LevelBoard) -> Bounds {
        let mut b = Bounds { min_x: 0, max_x: 0, min_z: 0, max_z: 0 };
        let mut first = true;
        for (p, _) in board.cells() {
            if first {
                b = Bounds { min_x: p.x, max_x: p.x, min_z: p.z, max_z: p.z };
                first = false;
            } else {
                b.min_x = b.min_x.min(p.x);
                b.max_x = b.max_x.max(p.x);
                b.min_z = b.min_z.min(p.z);
                b.max_z = b.max_z.max(p.z);
            }
        }
        b
    }

    fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> i32 {
        self.max_z - self.min_z + 1
    }
}

impl Camera {
    fn new() -> Self {
        Camera { x: 0, z_top: 0, view_w: 0, view_h: 0 }
    }

    /// Follow a target with a dead zone: only scroll when the target nears
    /// the viewport edge.
    fn follow(&mut self, target: GridPoint, b: Bounds) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }

        if b.width() <= self.view_w as i32 {
            // Map fits: center it.
            self.x = b.min_x - (self.view_w as i32 - b.width()) / 2;
        } else {
            let margin = (self.view_w as i32) / 5;
            let left = self.x + margin;
            let right = self.x + self.view_w as i32 - margin - 1;
            if target.x < left {
                self.x = target.x - margin;
            } else if target.x > right {
                self.x = target.x - self.view_w as i32 + margin + 1;
            }
            self.x = self.x.clamp(b.min_x, b.max_x - self.view_w as i32 + 1);
        }

        if b.height() <= self.view_h as i32 {
            self.z_top = b.max_z + (self.view_h as i32 - b.height()) / 2;
        } else {
            let margin = (self.view_h as i32) / 5;
            let top = self.z_top - margin;
            let bottom = self.z_top - self.view_h as i32 + margin + 1;
            if target.z > top {
                self.z_top = target.z + margin;
            } else if target.z < bottom {
                self.z_top = target.z + self.view_h as i32 - margin - 1;
            }
            self.z_top = self.z_top.clamp(b.min_z + self.view_h as i32 - 1, b.max_z);
        }
    }

    /// Hard recenter, used on non-playing phases.
    fn center_on(&mut self, target: GridPoint, b: Bounds) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        if b.width() <= self.view_w as i32 {
            self.x = b.min_x - (self.view_w as i32 - b.width()) / 2;
        } else {
            self.x = (target.x - self.view_w as i32 / 2)
                .clamp(b.min_x, b.max_x - self.view_w as i32 + 1);
        }
        if b.height() <= self.view_h as i32 {
            self.z_top = b.max_z + (self.view_h as i32 - b.height()) / 2;
        } else {
            self.z_top = (target.z + self.view_h as i32 / 2)
                .clamp(b.min_z + self.view_h as i32 - 1, b.max_z);
        }
    }
}

// ── Renderer ──

/// Each game cell = 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Completion panel reveal pacing (in anim ticks).
const PANEL_DELAY: u32 = 8;
const PANEL_STAGE_TICKS: u32 = 8;

/// One frame handed to the renderer.
pub enum Frame<'a> {
    Title {
        orch: &'a Orchestrator,
    },
    Game {
        board: &'a LevelBoard,
        player: &'a PlayerController,
        orch: &'a Orchestrator,
        anim_tick: u32,
    },
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    camera: Camera,
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
            camera: Camera::new(),
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            crossterm::event::DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, frame: Frame<'_>) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for a clean transition.
        let phase = match &frame {
            Frame::Title { orch } => orch.phase(),
            Frame::Game { orch, .. } => orch.phase(),
        };
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();
        match frame {
            Frame::Title { orch } => self.compose_title(orch),
            Frame::Game { board, player, orch, anim_tick } => {
                let bounds = Bounds::of(board);
                let reserved_rows = MAP_ROW + 4; // HUD + gap + msg + help
                self.camera.view_w =
                    (self.term_w / CELL_W).min(bounds.width().max(1) as usize);
                self.camera.view_h = self
                    .term_h
                    .saturating_sub(reserved_rows)
                    .max(1)
                    .min(bounds.height().max(1) as usize);
                match orch.phase() {
                    Phase::Playing => self.camera.follow(player.cell(), bounds),
                    _ => self.camera.center_on(player.cell(), bounds),
                }

                self.compose_game(board, player, orch);
                if orch.phase() == Phase::LevelComplete {
                    self.compose_complete_panel(orch, anim_tick);
                }
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame. ResetColor would fall back
        // to the terminal's native default and cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
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
                let mut buf = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut buf)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, board: &LevelBoard, player: &PlayerController, orch: &Orchestrator) {
        let buf_w = self.front.width;
        let hud_bg = Color::Rgb { r: 24, g: 26, b: 58 };

        // ── HUD row ──
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, hud_bg));
        }
        let hud = format!(
            " {}  Bricks:{:<3} Coins:{:<6} [{}/{}] ",
            orch.level_name(),
            player.brick_count(),
            orch.coins(),
            orch.current_level() + 1,
            orch.total_levels(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);

        // ── Map (camera viewport) ──
        let player_cell = player.cell();
        for vy in 0..self.camera.view_h {
            let wz = self.camera.z_top - vy as i32;
            let row = MAP_ROW + vy;
            if row >= self.front.height {
                break;
            }
            for vx in 0..self.camera.view_w {
                let wx = self.camera.x + vx as i32;
                let col = vx * CELL_W;
                if col + 1 >= buf_w {
                    break;
                }
                let at = GridPoint::new(wx, wz);
                if at == player_cell {
                    self.compose_player(player, col, row);
                } else {
                    self.compose_tile(board, at, col, row);
                }
            }
        }

        // ── Help bar ──
        let help_row = MAP_ROW + self.camera.view_h + 2;
        if help_row < self.front.height {
            let help = " Drag or arrows:Move  n:Next  r:Restart  q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_player(&mut self, player: &PlayerController, col: usize, row: usize) {
        // Brighter the taller the stack, capped well below white.
        let lift = (player.brick_count() as u16 * 12).min(90) as u8;
        let fg = Color::Rgb { r: 120 + lift, g: 220, b: 120 };
        self.front.set(col, row, Cell::new('◢', fg, Color::Reset));
        self.front.set(col + 1, row, Cell::new('◣', fg, Color::Reset));
    }

    fn compose_tile(&mut self, board: &LevelBoard, at: GridPoint, col: usize, row: usize) {
        let cell = match board.cell(at) {
            Some(c) if c.visible => c,
            // Void and hidden cells render the same.
            _ => {
                self.front.set(col, row, Cell::BLANK);
                self.front.set(col + 1, row, Cell::BLANK);
                return;
            }
        };

        let (c0, c1, fg, bg) = match cell.surface {
            Surface::Brick => ('▓', '▓', Color::Rgb { r: 200, g: 140, b: 60 }, Color::Rgb { r: 90, g: 60, b: 25 }),
            Surface::Ground => ('░', '░', Color::Rgb { r: 110, g: 110, b: 120 }, Color::Rgb { r: 50, g: 50, b: 58 }),
            Surface::Line => ('═', '═', Color::Rgb { r: 90, g: 200, b: 230 }, Color::Rgb { r: 20, g: 55, b: 70 }),
            Surface::WinPos => ('◇', ' ', Color::Rgb { r: 220, g: 160, b: 240 }, Color::Reset),
            Surface::Destination => ('◆', '◆', Color::Rgb { r: 255, g: 215, b: 60 }, Color::Rgb { r: 70, g: 55, b: 0 }),
            Surface::Pushable => ('█', '█', Color::Rgb { r: 190, g: 80, b: 70 }, Color::Rgb { r: 70, g: 25, b: 20 }),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    // ── Completion panel (staged reveal) ──

    fn compose_complete_panel(&mut self, orch: &Orchestrator, anim_tick: u32) {
        if anim_tick < PANEL_DELAY {
            return;
        }
        let stage = (anim_tick - PANEL_DELAY) / PANEL_STAGE_TICKS;

        let lines: [(String, Color); 3] = [
            ("LEVEL COMPLETE".to_string(), Color::Rgb { r: 255, g: 220, b: 80 }),
            (format!("+{} coins  (total {})", crate::sim::level::COINS_PER_LEVEL, orch.coins()),
             Color::Rgb { r: 120, g: 230, b: 120 }),
            ("[Enter] Next level   [r] Replay".to_string(), Color::White),
        ];
        let visible = ((stage + 1) as usize).min(lines.len());

        let panel_w = lines.iter().map(|(s, _)| s.len()).max().unwrap_or(0) + 6;
        let panel_h = visible + 4;
        let px = self.front.width.saturating_sub(panel_w) / 2;
        let py = self.front.height.saturating_sub(panel_h) / 2;
        let panel_bg = Color::Rgb { r: 30, g: 30, b: 48 };

        for y in py..py + panel_h {
            for x in px..px + panel_w {
                self.front.set(x, y, Cell::new(' ', Color::White, panel_bg));
            }
        }
        let border: String = "═".repeat(panel_w.saturating_sub(2));
        self.front.put_str(px + 1, py, &border, Color::DarkYellow, panel_bg);
        self.front.put_str(px + 1, py + panel_h - 1, &border, Color::DarkYellow, panel_bg);

        for (i, (text, fg)) in lines.iter().take(visible).enumerate() {
            let tx = px + (panel_w.saturating_sub(text.len())) / 2;
            self.front.put_str(tx, py + 2 + i, text, *fg, panel_bg);
        }
    }

    // ── Title screen ──

    fn compose_title(&mut self, orch: &Orchestrator) {
        let buf_w = self.front.width;
        let cy = self.front.height / 2;

        let title = "B R I C K W A Y";
        let tx = buf_w.saturating_sub(title.len()) / 2;
        self.front.put_str(
            tx,
            cy.saturating_sub(4),
            title,
            Color::Rgb { r: 255, g: 200, b: 70 },
            Color::Reset,
        );

        let sub = "stack bricks, pay the toll, reach the mark";
        let sx = buf_w.saturating_sub(sub.len()) / 2;
        self.front.put_str(sx, cy.saturating_sub(2), sub, Color::DarkGrey, Color::Reset);

        let count = format!("{} levels loaded", orch.total_levels());
        let cx = buf_w.saturating_sub(count.len()) / 2;
        self.front.put_str(cx, cy + 1, &count, Color::Rgb { r: 110, g: 160, b: 210 }, Color::Reset);

        let prompt = "[Enter] Play    [q] Quit";
        let px = buf_w.saturating_sub(prompt.len()) / 2;
        self.front.put_str(px, cy + 3, prompt, Color::White, Color::Reset);
    }
}
