use chess::ChessMove;
use kibitz_core::Position;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::search::SearchError;
use crate::Agent;

/// Opponent that plays a uniformly random legal move. Handy for casual
/// play and for exercising the session without an engine binary.
pub struct RandomAgent {
    name: String,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            name: "Random".to_string(),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn best_move(&mut self, position: &mut Position) -> Result<Option<ChessMove>, SearchError> {
        let moves = position.legal_moves();
        let mut rng = thread_rng();
        Ok(moves.choose(&mut rng).copied())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
