//! Minimax search with alpha-beta pruning.
//!
//! The tree is walked depth-first over a mutably borrowed [`Position`];
//! every `apply` is paired with an `undo` on all exit paths, so the caller
//! gets its position back unchanged even when the oracle fails mid-search.
//!
//! Sign convention: every score inside one search is expressed from the
//! perspective of the side to move at the root. `maximizing` is true at
//! nodes where that side is to move; the top-level call passes `true`.
//! Oracle evaluations arrive relative to the leaf's own mover and are
//! negated at minimizing nodes to land in the root frame.

use chess::ChessMove;
use kibitz_core::Position;
use thiserror::Error;

use crate::oracle::{Oracle, OracleError};
use crate::score::Score;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("evaluation oracle failed during search: {0}")]
    Oracle(#[from] OracleError),
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// `None` only when the root position has no legal move.
    pub best_move: Option<ChessMove>,
    pub score: Score,
    pub nodes: u64,
}

/// Searches `depth` plies ahead and returns the principal move together
/// with its score. Pruning never changes the score versus exhaustive
/// minimax; among equal moves the first in enumeration order wins.
pub fn search<O: Oracle>(
    position: &mut Position,
    oracle: &mut O,
    depth: u8,
    maximizing: bool,
) -> Result<SearchResult, SearchError> {
    let mut nodes = 0;
    let (score, best_move) = minimax(
        position,
        oracle,
        depth,
        0,
        Score::neg_infinity(),
        Score::infinity(),
        maximizing,
        &mut nodes,
    )?;

    log::debug!(
        "depth {} search: {} nodes, best {}, score {}",
        depth,
        nodes,
        best_move.map_or_else(|| "none".to_string(), |mv| mv.to_string()),
        score
    );

    Ok(SearchResult {
        best_move,
        score,
        nodes,
    })
}

#[allow(clippy::too_many_arguments)]
fn minimax<O: Oracle>(
    position: &mut Position,
    oracle: &mut O,
    depth: u8,
    ply: i32,
    mut alpha: Score,
    mut beta: Score,
    maximizing: bool,
    nodes: &mut u64,
) -> Result<(Score, Option<ChessMove>), SearchError> {
    *nodes += 1;

    if depth == 0 || position.is_terminal() {
        let relative = Score::from(oracle.evaluate(position.board())?);
        let score = if maximizing { relative } else { -relative };
        return Ok((score.discounted(ply), None));
    }

    let moves = position.legal_moves();
    let mut best_move = None;

    if maximizing {
        let mut best = Score::neg_infinity();
        for mv in moves {
            position.apply(mv);
            let outcome = minimax(position, oracle, depth - 1, ply + 1, alpha, beta, false, nodes);
            position.undo();
            let (value, _) = outcome?;

            if value > best {
                best = value;
                best_move = Some(mv);
            }
            if best > alpha {
                alpha = best;
            }
            if beta <= alpha {
                break;
            }
        }
        Ok((best, best_move))
    } else {
        let mut best = Score::infinity();
        for mv in moves {
            position.apply(mv);
            let outcome = minimax(position, oracle, depth - 1, ply + 1, alpha, beta, true, nodes);
            position.undo();
            let (value, _) = outcome?;

            if value < best {
                best = value;
                best_move = Some(mv);
            }
            if best < beta {
                beta = best;
            }
            if beta <= alpha {
                break;
            }
        }
        Ok((best, best_move))
    }
}
