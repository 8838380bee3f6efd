pub mod minimax;
pub mod oracle;
pub mod random;
pub mod score;
pub mod search;

use chess::ChessMove;
use kibitz_core::Position;

/// Core trait for computer opponents.
pub trait Agent {
    /// Picks a move for the side to move. The position is borrowed for the
    /// duration of the call and must be returned observationally unchanged.
    /// `None` is only a valid answer when no legal move exists.
    fn best_move(&mut self, position: &mut Position) -> Result<Option<ChessMove>, SearchError>;

    /// Get the agent's name.
    fn name(&self) -> &str;
}

pub use minimax::MinimaxAgent;
pub use oracle::{Oracle, OracleError, UciOracle};
pub use random::RandomAgent;
pub use score::{Evaluation, Score};
pub use search::{search, SearchError, SearchResult};
