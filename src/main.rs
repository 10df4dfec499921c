/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::board::LevelBoard;
use sim::event::GameEvent;
use sim::level::{Orchestrator, Phase};
use sim::player::PlayerController;
use ui::input::InputState;
use ui::renderer::{Frame, Renderer};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    let config = GameConfig::load();

    let mut player = PlayerController::new(&config.player);
    let mut orch = match Orchestrator::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Level load failed: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut orch, &mut player, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Brickway!");
    println!("Coins collected: {}", orch.coins());
}

fn game_loop(
    orch: &mut Orchestrator,
    player: &mut PlayerController,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let mut board: Option<LevelBoard> = None;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let dt = config.tick_rate_ms as f32 / 1000.0;
    let mut anim_tick: u32 = 0;
    let mut events: Vec<GameEvent> = Vec::new();

    loop {
        input.drain_events();

        if input.ctrl_c_pressed() {
            break;
        }
        if handle_meta(orch, player, &mut board, &input)? {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match orch.phase() {
                Phase::Playing => {
                    if let Some(board) = board.as_mut() {
                        if let Some(dir) = input.take_swipe() {
                            player.try_move(dir, board);
                        }
                        events.clear();
                        player.update(dt, board, &mut events);
                        // Cues feed richer frontends; the terminal view
                        // reads the controller state directly.
                        board.drain_cues();

                        if events.iter().any(|e| matches!(e, GameEvent::DestinationReached)) {
                            orch.complete_level();
                            anim_tick = 0;
                        }
                    }
                }
                Phase::LevelComplete => {
                    anim_tick = anim_tick.saturating_add(1);
                }
                Phase::Title => {}
            }
            last_tick = Instant::now();
        }

        match (orch.phase(), board.as_ref()) {
            (Phase::Title, _) | (_, None) => renderer.render(Frame::Title { orch })?,
            (_, Some(board)) => renderer.render(Frame::Game {
                board,
                player,
                orch,
                anim_tick,
            })?,
        }
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Phase transitions driven by meta keys. Returns true to quit.
fn handle_meta(
    orch: &mut Orchestrator,
    player: &mut PlayerController,
    board: &mut Option<LevelBoard>,
    input: &InputState,
) -> Result<bool, Box<dyn std::error::Error>> {
    let confirm = input.any_pressed(KEYS_CONFIRM);
    let esc = input.was_pressed(KeyCode::Esc);

    match orch.phase() {
        Phase::Title => {
            if confirm {
                *board = Some(orch.start(player)?);
            } else if input.any_pressed(KEYS_QUIT) || esc {
                return Ok(true);
            }
        }
        Phase::Playing => {
            if input.any_pressed(KEYS_QUIT) {
                return Ok(true);
            }
            if input.any_pressed(KEYS_RESTART) {
                *board = Some(orch.reload(player)?);
            } else if input.any_pressed(KEYS_NEXT) {
                *board = Some(orch.next_level(player)?);
            } else if esc {
                orch.return_to_title();
                *board = None;
            }
        }
        Phase::LevelComplete => {
            if confirm || input.any_pressed(KEYS_NEXT) {
                *board = Some(orch.next_level(player)?);
            } else if input.any_pressed(KEYS_RESTART) {
                *board = Some(orch.reload(player)?);
            } else if input.any_pressed(KEYS_QUIT) || esc {
                orch.return_to_title();
                *board = None;
            }
        }
    }

    Ok(false)
}
