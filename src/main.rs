//! Chess Console - terminal front end
//!
//! Runs a session between the configured seats and reads moves and commands
//! from stdin.

mod cli;

use anyhow::{Context, Result};
use chess_console::{
    ChessConsole, ConsoleSettings, GameProps, HumanInput, RulesEngine, Seat, StandardChess,
    TurnState, render_board,
};
use clap::Parser;
use cli::{Cli, Command};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Enter a move in SAN (Nf3) or long algebraic (g1f3), or one of:
  moves  list legal moves
  undo   take back your last move
  new    start a new game
  flip   turn the board around
  pgn    print the game
  quit   leave";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr, the board to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            color,
            history,
            opponent,
            seed,
            events_json,
        } => {
            let mut settings = match config {
                Some(path) => ConsoleSettings::from_file(&path)?,
                None => ConsoleSettings::default(),
            };
            if let Some(color) = color {
                settings.set_player_color(color);
            }
            if let Some(kind) = opponent {
                settings.set_opponent_kind(kind);
            }
            if let Some(path) = history {
                settings.set_history_file(path);
            }
            if let Some(seed) = seed {
                settings.set_seed(seed);
            }
            play(settings, events_json).await
        }
        Command::Check { file } => check(&file),
    }
}

#[instrument(skip(settings))]
async fn play(settings: ConsoleSettings, events_json: bool) -> Result<()> {
    let props = settings.initial_props()?;
    let (mut console, inputs) = ChessConsole::from_settings(StandardChess::new(), &settings);
    console.log_events();
    if events_json {
        console.subscribe(|event| match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, kind = event.kind(), "Failed to encode event"),
        });
    }
    console.init_game(props)?;
    info!(white = %console.player_white().name, black = %console.player_black().name, "Game started");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        settle(&mut console, &inputs).await?;
        print_position(&console);

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        match line.trim() {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "moves" => println!("{}", console.state().engine().legal_moves().join(" ")),
            "pgn" => println!("{}", console.pgn()),
            "flip" => console.flip_board(),
            "new" => console.new_game(GameProps::default())?,
            "undo" => {
                if console.can_undo() {
                    console.undo_move()?;
                } else {
                    println!("Nothing to undo");
                }
            }
            mv => match waiting_input(&console, &inputs) {
                Some(input) => {
                    input.submit(mv);
                    console.run_until_idle()?;
                    if let Some(rejected) = input.last_rejected() {
                        println!("Illegal move: {}", rejected);
                    }
                }
                None => println!("Not your turn"),
            },
        }
    }

    Ok(())
}

/// Runs the console until a person has to act or the game is over.
async fn settle(
    console: &mut ChessConsole<StandardChess>,
    inputs: &[(Seat, HumanInput)],
) -> Result<()> {
    loop {
        console.run_until_idle()?;
        match console.turn_state() {
            TurnState::AwaitingMove { .. } if waiting_input(console, inputs).is_none() => {
                console.wait_tick().await?;
            }
            _ => return Ok(()),
        }
    }
}

fn waiting_input<'a>(
    console: &ChessConsole<StandardChess>,
    inputs: &'a [(Seat, HumanInput)],
) -> Option<&'a HumanInput> {
    let TurnState::AwaitingMove { seat, .. } = console.turn_state() else {
        return None;
    };
    inputs
        .iter()
        .find(|(input_seat, input)| *input_seat == seat && input.is_waiting())
        .map(|(_, input)| input)
}

fn print_position(console: &ChessConsole<StandardChess>) {
    let state = console.state();
    let engine = state.engine();
    if let Some(board) = render_board(&state.fen(), state.orientation()) {
        println!("\n{}", board);
    }
    if let Some(last) = engine.history().last() {
        println!("Last move: {}", last.san());
    }
    match console.turn_state() {
        TurnState::GameOver { won_color } => match won_color {
            Some(color) => println!("Game over: {} wins. Type 'new' to play again.", color),
            None => println!("Game over: draw. Type 'new' to play again."),
        },
        TurnState::AwaitingMove { seat, .. } => {
            let white = console.player_white();
            let info = if white.seat == seat {
                white
            } else {
                console.player_black()
            };
            println!("{} ({}) to move", info.name, info.color);
        }
        TurnState::Idle => {}
    }
}

#[instrument(skip(file), fields(file = %file.display()))]
fn check(file: &Path) -> Result<()> {
    let pgn = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut engine = StandardChess::new();
    engine.load_pgn(&pgn, true)?;
    info!(plies = engine.ply_count(), "PGN loaded");

    if let Some(board) = render_board(&engine.fen(), chess_console::Color::White) {
        println!("{}", board);
    }
    println!("Plies: {}", engine.ply_count());
    println!("FEN: {}", engine.fen());
    if engine.is_game_over() {
        println!("Game over");
    } else {
        println!("{} to move", engine.turn());
    }
    Ok(())
}
