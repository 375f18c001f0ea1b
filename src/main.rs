//! Headless autoplay runner (default binary).
//!
//! Plays one game by always taking the first legal move, then prints a JSON
//! summary on stdout. Configuration comes from the `BLOCK_PUZZLE_*`
//! environment variables; an optional first argument caps the move count.

use anyhow::{Context, Result};
use serde_json::json;

use block_puzzle::engine::{
    EngineConfig, EventSink, GameSessionController, JsonlEventLog, NullSink, Ruleset,
};
use block_puzzle::engine::snapshot::{difficulty_name, mode_name, status_name};
use block_puzzle::types::GameStatus;

const DEFAULT_MAX_MOVES: u32 = 500;

fn main() -> Result<()> {
    let config = EngineConfig::from_env().context("loading configuration")?;
    let max_moves = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("move limit must be a number, got {:?}", arg))?,
        None => DEFAULT_MAX_MOVES,
    };

    let sink: Box<dyn EventSink> = match &config.event_log_path {
        Some(path) => match JsonlEventLog::open(path) {
            Ok(log) => Box::new(log),
            Err(e) => {
                eprintln!("[EventLog] cannot open {}: {}", path, e);
                Box::new(NullSink)
            }
        },
        None => Box::new(NullSink),
    };

    let ruleset = Ruleset::new(config.rules.clone())?;
    let mut game =
        GameSessionController::new(ruleset, config.difficulty, config.mode, config.seed)
            .with_sink(sink);
    game.start()?;

    let mut moves = 0u32;
    while moves < max_moves && game.session().status() == GameStatus::Playing {
        let Some(hint) = game.session().first_move(game.ruleset()) else {
            break;
        };
        game.place_block(hint.block_id, hint.row, hint.col)?;
        moves += 1;
    }

    let session = game.session();
    let profile = game.profile();
    let summary = json!({
        "seed": config.seed,
        "difficulty": difficulty_name(session.difficulty()),
        "mode": mode_name(session.mode()),
        "status": status_name(session.status()),
        "moves": moves,
        "score": session.score(),
        "level": session.level(),
        "linesCleared": session.lines_cleared(),
        "maxCombo": session.max_combo(),
        "perfectClears": session.perfect_clears(),
        "fillPercentage": session.grid().fill_percentage(),
        "achievementsUnlocked": profile
            .achievements()
            .iter()
            .filter(|a| a.is_unlocked)
            .map(|a| a.id.as_str())
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
