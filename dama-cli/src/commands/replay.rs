//! Replay a move log offline.

use anyhow::{Context, Result};
use dama_core::{replay, MatchConfig, Move};
use dama_types::WireMove;
use std::path::Path;
use std::time::Instant;

use crate::render;

/// Run the replay command.
pub async fn run(file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let moves = parse_moves(&text)?;
    tracing::debug!("Replaying {} moves from {}", moves.len(), file.display());

    let now = Instant::now();
    let state = replay(MatchConfig::default(), moves.iter().copied(), now)
        .context("Move log does not replay")?;

    println!("{}", state.board());
    println!("Moves played: {}", moves.len());
    println!("{}", render::status(&state, now));
    Ok(())
}

/// Parse a move log: one JSON array of `{von, nach}` objects, or one
/// object per line (blank lines skipped).
pub fn parse_moves(text: &str) -> Result<Vec<Move>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let wire: Vec<WireMove> =
            serde_json::from_str(trimmed).context("Invalid move array")?;
        return Ok(wire.into_iter().map(Move::from).collect());
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<WireMove>(line)
                .map(Move::from)
                .with_context(|| format!("Invalid move on line {}", index + 1))
        })
        .collect()
}
