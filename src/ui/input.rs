/// Input state tracker.
///
/// Two gesture sources feed the same swipe resolver:
///   - Mouse: button-down records the press origin, button-up closes the
///     gesture and the press/release pair is resolved to a direction.
///   - Keys: arrows / WASD synthesize a unit swipe in the same resolver,
///     so both paths share one tie-break rule.
///
/// Key presses are edge-triggered; a swipe is consumed by `take_swipe()`.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind, poll};
use glam::Vec2;

use crate::domain::grid::MoveDir;
use crate::domain::swipe;

/// Terminal cells are roughly twice as tall as wide; column deltas are
/// scaled down so diagonal drags resolve like on a square surface.
const CELL_ASPECT: f32 = 0.5;

pub struct InputState {
    /// Keys freshly pressed during the most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Screen position of the open mouse gesture, if any.
    press_origin: Option<(u16, u16)>,

    /// Direction resolved this frame, not yet consumed.
    pending_swipe: Option<MoveDir>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            press_origin: None,
            pending_swipe: None,
        }
    }

    /// Drain all pending terminal events and update gesture state.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if key.kind != KeyEventKind::Release {
                        self.raw_events.push(key);
                        self.fresh_presses.push(key.code);
                        if let Some(dir) = key_swipe(key.code) {
                            self.pending_swipe = Some(dir);
                        }
                    }
                }
                Ok(Event::Mouse(mouse)) => self.handle_mouse(mouse),
                _ => {}
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.press_origin = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some((c0, r0)) = self.press_origin.take() {
                    let down = screen_to_plane(c0, r0);
                    let up = screen_to_plane(mouse.column, mouse.row);
                    if let Some(dir) = swipe::resolve(down, up) {
                        self.pending_swipe = Some(dir);
                    }
                }
            }
            _ => {}
        }
    }

    /// Consume the swipe resolved this frame, if any.
    pub fn take_swipe(&mut self) -> Option<MoveDir> {
        self.pending_swipe.take()
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Screen cell to swipe plane: y flips because terminal rows grow downward.
fn screen_to_plane(column: u16, row: u16) -> Vec2 {
    Vec2::new(column as f32 * CELL_ASPECT, -(row as f32))
}

/// Arrow / WASD synthesized unit swipe, routed through the shared resolver.
fn key_swipe(code: KeyCode) -> Option<MoveDir> {
    let up = match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Vec2::Y,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Vec2::NEG_Y,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Vec2::NEG_X,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Vec2::X,
        _ => return None,
    };
    swipe::resolve(Vec2::ZERO, up)
}
