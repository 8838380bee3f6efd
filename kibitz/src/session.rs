//! The turn-by-turn interaction state machine.
//!
//! One input event is processed to completion before the next: a square
//! click either selects a piece or attempts a move; a committed human move
//! triggers the computer's reply synchronously; terminal conditions are
//! re-checked after every position change. Promotion waits in its own
//! state instead of a nested input loop, so cancelling it is an ordinary
//! transition.

use chess::{ChessMove, Color, Piece, Rank, Square};
use kibitz_agents::{Agent, SearchError};
use kibitz_core::{GameResult, Position};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionState {
    Idle,
    PieceSelected(Square),
    AwaitingPromotion { from: Square, to: Square },
    GameOver(GameResult),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("computer move search failed: {0}")]
    Search(#[from] SearchError),
    #[error("agent returned no move although legal moves remain")]
    AgentGaveUp,
}

/// A highlighted destination for the selected piece.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Destination {
    pub square: Square,
    pub capture: bool,
}

/// Everything the front end needs to redraw: board contents come from
/// [`Session::position`], the rest is derived highlighting state.
#[derive(Clone, Debug)]
pub struct BoardView {
    pub selected: Option<Square>,
    pub destinations: Vec<Destination>,
    /// King square of the side to move, when that king is in check.
    pub check: Option<Square>,
    pub promotion: Option<(Square, Square)>,
    pub result: GameResult,
}

/// A human-vs-computer match: the position, the ephemeral selection
/// state, and the computer's agent. The position is owned here and only
/// lent to the agent for the duration of a search.
pub struct Session<A: Agent> {
    position: Position,
    state: SelectionState,
    human: Color,
    agent: A,
}

impl<A: Agent> Session<A> {
    pub fn new(position: Position, human: Color, agent: A) -> Self {
        let state = initial_state(&position);
        Self {
            position,
            state,
            human,
            agent,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Abandons any pending selection or promotion choice.
    pub fn cancel(&mut self) {
        if !matches!(self.state, SelectionState::GameOver(_)) {
            self.state = SelectionState::Idle;
        }
    }

    /// Starts over from the given position.
    pub fn reset(&mut self, position: Position) {
        self.state = initial_state(&position);
        self.position = position;
    }

    /// True when the game is running and it is the computer's turn; the
    /// front end then asks for [`Session::play_computer_move`]. This only
    /// happens at the start of a match where the human plays black or
    /// after a reset to such a position; mid-game replies are played as
    /// part of the human's move.
    pub fn computer_to_move(&self) -> bool {
        !matches!(self.state, SelectionState::GameOver(_))
            && self.position.side_to_move() != self.human
    }

    /// Asks the agent for the computer's move and commits it. A failed
    /// search changes nothing; a `None` move with the game still running
    /// is an invariant violation, never played.
    pub fn play_computer_move(&mut self) -> Result<(), SessionError> {
        if matches!(self.state, SelectionState::GameOver(_)) {
            return Ok(());
        }

        let chosen = self.agent.best_move(&mut self.position)?;
        let Some(mv) = chosen else {
            return Err(SessionError::AgentGaveUp);
        };

        log::info!("{} plays {}", self.agent.name(), mv);
        self.position.apply(mv);
        self.refresh_result();
        Ok(())
    }

    /// The square-clicked event.
    pub fn handle_click(&mut self, square: Square) -> Result<(), SessionError> {
        match self.state {
            SelectionState::GameOver(_) => Ok(()),
            // A click while the promotion choice is pending abandons the
            // pending move.
            SelectionState::AwaitingPromotion { .. } => {
                self.state = SelectionState::Idle;
                Ok(())
            }
            SelectionState::Idle | SelectionState::PieceSelected(_) => self.select_or_move(square),
        }
    }

    /// The promotion-piece-chosen event.
    pub fn choose_promotion(&mut self, piece: Piece) -> Result<(), SessionError> {
        let SelectionState::AwaitingPromotion { from, to } = self.state else {
            return Ok(());
        };
        self.try_human_move(ChessMove::new(from, to, Some(piece)))
    }

    fn select_or_move(&mut self, square: Square) -> Result<(), SessionError> {
        if self.position.side_to_move() != self.human {
            return Ok(());
        }

        // Any click on an own piece is a fresh selection, the currently
        // selected square included.
        if self.piece_color(square) == Some(self.human) {
            self.state = SelectionState::PieceSelected(square);
            return Ok(());
        }

        let SelectionState::PieceSelected(from) = self.state else {
            return Ok(());
        };

        if self.is_promotion_attempt(from, square) {
            self.state = SelectionState::AwaitingPromotion { from, to: square };
            return Ok(());
        }

        self.try_human_move(ChessMove::new(from, square, None))
    }

    fn try_human_move(&mut self, mv: ChessMove) -> Result<(), SessionError> {
        self.state = SelectionState::Idle;
        if !self.position.is_legal(mv) {
            // Illegal attempts are discarded, not errors.
            return Ok(());
        }

        log::info!("human plays {}", mv);
        self.position.apply(mv);
        self.refresh_result();
        if matches!(self.state, SelectionState::GameOver(_)) {
            return Ok(());
        }

        self.play_computer_move()
    }

    /// Whether clicking `to` with `from` selected should pose the
    /// promotion question: an own pawn stepping from the second-to-last
    /// rank onto the last one, shaped like an advance onto an empty square
    /// or a capture of an enemy piece. Full legality is only checked once
    /// the piece has been chosen.
    fn is_promotion_attempt(&self, from: Square, to: Square) -> bool {
        match self.position.piece_at(from) {
            Some((Piece::Pawn, color)) if color == self.human => {
                if from.get_rank() != pre_promotion_rank(color)
                    || to.get_rank() != promotion_rank(color)
                {
                    return false;
                }
                let file_step =
                    (to.get_file().to_index() as i8 - from.get_file().to_index() as i8).abs();
                match file_step {
                    0 => self.position.piece_at(to).is_none(),
                    1 => self.piece_color(to) == Some(!color),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn refresh_result(&mut self) {
        let result = self.position.result();
        if result != GameResult::Ongoing {
            log::info!("game over: {}", result);
            self.state = SelectionState::GameOver(result);
        }
    }

    fn piece_color(&self, square: Square) -> Option<Color> {
        self.position.piece_at(square).map(|(_, color)| color)
    }

    /// The redraw instruction for the front end.
    pub fn view(&self) -> BoardView {
        let (selected, promotion) = match self.state {
            SelectionState::PieceSelected(square) => (Some(square), None),
            SelectionState::AwaitingPromotion { from, to } => (Some(from), Some((from, to))),
            _ => (None, None),
        };

        let destinations = match self.state {
            SelectionState::PieceSelected(from) => self.destinations_from(from),
            _ => Vec::new(),
        };

        let check = if self.position.is_check() {
            Some(self.position.king_square(self.position.side_to_move()))
        } else {
            None
        };

        BoardView {
            selected,
            destinations,
            check,
            promotion,
            result: self.position.result(),
        }
    }

    fn destinations_from(&self, from: Square) -> Vec<Destination> {
        let mut destinations: Vec<Destination> = self
            .position
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.get_source() == from)
            .map(|mv| Destination {
                square: mv.get_dest(),
                capture: self.position.is_capture(mv),
            })
            .collect();
        // The four promotion choices share one destination square.
        destinations.dedup();
        destinations
    }
}

fn initial_state(position: &Position) -> SelectionState {
    match position.result() {
        GameResult::Ongoing => SelectionState::Idle,
        result => SelectionState::GameOver(result),
    }
}

fn promotion_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

fn pre_promotion_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Seventh,
        Color::Black => Rank::Second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kibitz_agents::OracleError;

    /// Deterministic stand-in for the oracle-backed agent.
    struct FirstMoveAgent;

    impl Agent for FirstMoveAgent {
        fn best_move(&mut self, position: &mut Position) -> Result<Option<ChessMove>, SearchError> {
            Ok(position.legal_moves().into_iter().next())
        }

        fn name(&self) -> &str {
            "first-move"
        }
    }

    struct DeadAgent;

    impl Agent for DeadAgent {
        fn best_move(&mut self, _: &mut Position) -> Result<Option<ChessMove>, SearchError> {
            Err(SearchError::Oracle(OracleError::Disconnected))
        }

        fn name(&self) -> &str {
            "dead"
        }
    }

    struct GiveUpAgent;

    impl Agent for GiveUpAgent {
        fn best_move(&mut self, _: &mut Position) -> Result<Option<ChessMove>, SearchError> {
            Ok(None)
        }

        fn name(&self) -> &str {
            "give-up"
        }
    }

    fn session() -> Session<FirstMoveAgent> {
        Session::new(Position::new(), Color::White, FirstMoveAgent)
    }

    fn session_from(fen: &str) -> Session<FirstMoveAgent> {
        Session::new(Position::from_fen(fen).unwrap(), Color::White, FirstMoveAgent)
    }

    #[test]
    fn test_click_on_empty_square_stays_idle() {
        let mut session = session();
        session.handle_click(Square::E4).unwrap();
        assert_eq!(session.state(), SelectionState::Idle);
        assert!(session.view().destinations.is_empty());
    }

    #[test]
    fn test_click_on_enemy_piece_never_selects() {
        let mut session = session();
        session.handle_click(Square::E7).unwrap();
        assert_eq!(session.state(), SelectionState::Idle);
    }

    #[test]
    fn test_click_on_own_piece_selects_it() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        assert_eq!(session.state(), SelectionState::PieceSelected(Square::E2));

        let view = session.view();
        assert_eq!(view.selected, Some(Square::E2));
        let squares: Vec<Square> = view.destinations.iter().map(|d| d.square).collect();
        assert!(squares.contains(&Square::E3));
        assert!(squares.contains(&Square::E4));
        assert!(view.destinations.iter().all(|d| !d.capture));
    }

    #[test]
    fn test_any_own_piece_click_reselects() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        session.handle_click(Square::D2).unwrap();
        assert_eq!(session.state(), SelectionState::PieceSelected(Square::D2));

        // Re-clicking the selected piece is also a fresh selection.
        session.handle_click(Square::D2).unwrap();
        assert_eq!(session.state(), SelectionState::PieceSelected(Square::D2));
    }

    #[test]
    fn test_illegal_attempt_is_discarded_silently() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        session.handle_click(Square::E5).unwrap();
        assert_eq!(session.state(), SelectionState::Idle);
        assert_eq!(session.position().ply(), 0);
    }

    #[test]
    fn test_legal_move_commits_and_computer_replies() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        session.handle_click(Square::E4).unwrap();

        assert_eq!(session.state(), SelectionState::Idle);
        // Human move plus the computer's reply.
        assert_eq!(session.position().ply(), 2);
        assert_eq!(session.position().side_to_move(), Color::White);
    }

    #[test]
    fn test_capture_destinations_are_tagged() {
        let mut session =
            session_from("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        session.handle_click(Square::E4).unwrap();

        let view = session.view();
        let take = view
            .destinations
            .iter()
            .find(|d| d.square == Square::D5)
            .expect("exd5 is available");
        assert!(take.capture);

        let push = view
            .destinations
            .iter()
            .find(|d| d.square == Square::E5)
            .expect("e5 is available");
        assert!(!push.capture);
    }

    #[test]
    fn test_pawn_reaching_last_rank_waits_for_promotion_choice() {
        let mut session = session_from("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        session.handle_click(Square::A7).unwrap();
        session.handle_click(Square::A8).unwrap();

        assert_eq!(
            session.state(),
            SelectionState::AwaitingPromotion {
                from: Square::A7,
                to: Square::A8
            }
        );
        // Nothing is committed until the piece is chosen.
        assert_eq!(session.position().ply(), 0);
    }

    #[test]
    fn test_non_pawn_to_last_rank_never_asks_for_promotion() {
        let mut session = session_from("7k/R7/8/8/8/8/8/K7 w - - 0 1");
        session.handle_click(Square::A7).unwrap();
        session.handle_click(Square::A8).unwrap();

        // The rook move is committed outright (and the computer replies).
        assert!(!matches!(
            session.state(),
            SelectionState::AwaitingPromotion { .. }
        ));
        assert_eq!(session.position().ply(), 2);
    }

    #[test]
    fn test_promotion_choice_completes_the_move() {
        let mut session = session_from("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        session.handle_click(Square::A7).unwrap();
        session.handle_click(Square::A8).unwrap();
        session.choose_promotion(Piece::Queen).unwrap();

        // Promotion applied, computer replied.
        assert_eq!(session.position().piece_at(Square::A8), Some((Piece::Queen, Color::White)));
        assert_eq!(session.position().ply(), 2);
        assert_eq!(session.state(), SelectionState::Idle);
    }

    #[test]
    fn test_click_while_awaiting_promotion_cancels() {
        let mut session = session_from("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        session.handle_click(Square::A7).unwrap();
        session.handle_click(Square::A8).unwrap();
        session.handle_click(Square::E4).unwrap();

        assert_eq!(session.state(), SelectionState::Idle);
        assert_eq!(session.position().ply(), 0);
    }

    #[test]
    fn test_illegal_promotion_choice_is_discarded() {
        // Capturing bxa8 would expose the king to the rook on b8, so the
        // attempt passes the shape check but fails legality.
        let mut session = session_from("br6/1P5k/8/8/8/8/1K6/8 w - - 0 1");
        session.handle_click(Square::B7).unwrap();
        session.handle_click(Square::A8).unwrap();
        assert!(matches!(
            session.state(),
            SelectionState::AwaitingPromotion { .. }
        ));

        session.choose_promotion(Piece::Queen).unwrap();
        assert_eq!(session.state(), SelectionState::Idle);
        assert_eq!(session.position().ply(), 0);
    }

    #[test]
    fn test_checkmating_move_ends_the_game() {
        let mut session = session_from("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        session.handle_click(Square::A1).unwrap();
        session.handle_click(Square::A8).unwrap();

        assert_eq!(
            session.state(),
            SelectionState::GameOver(GameResult::Win(Color::White))
        );
        assert_eq!(session.view().result, GameResult::Win(Color::White));

        // Terminal state accepts no further move-initiating input.
        session.handle_click(Square::G1).unwrap();
        assert_eq!(
            session.state(),
            SelectionState::GameOver(GameResult::Win(Color::White))
        );
    }

    #[test]
    fn test_check_is_annotated_for_highlighting() {
        // Black to move, black king in check from the queen on h5.
        let session = Session::new(
            Position::from_fen("rnbqkbnr/ppppp1pp/8/5p1Q/8/4P3/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap(),
            Color::Black,
            FirstMoveAgent,
        );
        assert_eq!(session.view().check, Some(Square::E8));
    }

    #[test]
    fn test_computer_opens_when_human_plays_black() {
        let mut session = Session::new(Position::new(), Color::Black, FirstMoveAgent);
        assert!(session.computer_to_move());

        session.play_computer_move().unwrap();
        assert_eq!(session.position().ply(), 1);
        assert!(!session.computer_to_move());
    }

    #[test]
    fn test_failed_search_keeps_human_move_and_surfaces_error() {
        let mut session = Session::new(Position::new(), Color::White, DeadAgent);
        session.handle_click(Square::E2).unwrap();
        let outcome = session.handle_click(Square::E4);

        assert!(matches!(outcome, Err(SessionError::Search(_))));
        // The human's move stays committed; no computer move was applied.
        assert_eq!(session.position().ply(), 1);
        assert_eq!(session.state(), SelectionState::Idle);
    }

    #[test]
    fn test_agent_without_a_move_is_an_invariant_violation() {
        let mut session = Session::new(Position::new(), Color::White, GiveUpAgent);
        session.handle_click(Square::E2).unwrap();
        let outcome = session.handle_click(Square::E4);
        assert!(matches!(outcome, Err(SessionError::AgentGaveUp)));
    }

    #[test]
    fn test_cancel_clears_selection() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        session.cancel();
        assert_eq!(session.state(), SelectionState::Idle);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut session = session();
        session.handle_click(Square::E2).unwrap();
        session.handle_click(Square::E4).unwrap();

        session.reset(Position::new());
        assert_eq!(session.position().ply(), 0);
        assert_eq!(session.state(), SelectionState::Idle);
    }
}
