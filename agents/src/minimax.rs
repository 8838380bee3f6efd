use chess::ChessMove;
use kibitz_core::Position;

use crate::oracle::Oracle;
use crate::search::{search, SearchError};
use crate::Agent;

/// The oracle-advised opponent: fixed-depth minimax with alpha-beta
/// pruning, leaf positions scored by the wrapped oracle.
pub struct MinimaxAgent<O: Oracle> {
    name: String,
    oracle: O,
    depth: u8,
}

impl<O: Oracle> MinimaxAgent<O> {
    pub fn new(oracle: O, depth: u8) -> Self {
        MinimaxAgent {
            name: format!("Minimax(depth={})", depth),
            oracle,
            depth,
        }
    }
}

impl<O: Oracle> Agent for MinimaxAgent<O> {
    fn best_move(&mut self, position: &mut Position) -> Result<Option<ChessMove>, SearchError> {
        let result = search(position, &mut self.oracle, self.depth, true)?;
        Ok(result.best_move)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
