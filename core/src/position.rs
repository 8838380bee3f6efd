use std::fmt;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};

/// Outcome of a game, checked after every committed move.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameResult {
    Ongoing,
    /// Checkmate delivered by the given side.
    Win(Color),
    Stalemate,
    /// Draw by threefold repetition.
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Ongoing => write!(f, "ongoing"),
            GameResult::Win(Color::White) => write!(f, "white wins by checkmate"),
            GameResult::Win(Color::Black) => write!(f, "black wins by checkmate"),
            GameResult::Stalemate => write!(f, "draw by stalemate"),
            GameResult::Draw => write!(f, "draw by repetition"),
        }
    }
}

/// A game position with its history, wrapping the rules crate's `Board`.
///
/// `apply` and `undo` are exact inverses: `undo` restores the board that was
/// current before the most recent `apply`. Search relies on this pair being
/// balanced on every path, so the position it borrows is unchanged when the
/// call returns.
#[derive(Clone, Debug)]
pub struct Position {
    current: Board,
    past: Vec<Board>,
}

impl Position {
    /// Starts from the standard initial position.
    pub fn new() -> Self {
        Self {
            current: Board::default(),
            past: Vec::new(),
        }
    }

    /// Starts from an arbitrary position given as a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, chess::Error> {
        let board = Board::from_str(fen)?;
        Ok(Self {
            current: board,
            past: Vec::new(),
        })
    }

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.current
    }

    pub fn side_to_move(&self) -> Color {
        self.current.side_to_move()
    }

    /// Number of half-moves applied since this position was created.
    pub fn ply(&self) -> usize {
        self.past.len()
    }

    /// All legal moves for the side to move. The order is the move
    /// generator's and is stable for a given board.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.current).collect()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.current.legal(mv)
    }

    /// Plays a legal move on top of the current board.
    pub fn apply(&mut self, mv: ChessMove) {
        debug_assert!(self.current.legal(mv), "apply called with illegal move");
        let next = self.current.make_move_new(mv);
        self.past.push(self.current);
        self.current = next;
    }

    /// Reverts the most recent `apply`. Undoing past the starting position
    /// is a caller bug; it is ignored outside debug builds.
    pub fn undo(&mut self) {
        debug_assert!(!self.past.is_empty(), "undo without a matching apply");
        if let Some(board) = self.past.pop() {
            self.current = board;
        }
    }

    pub fn is_check(&self) -> bool {
        self.current.checkers().popcnt() > 0
    }

    pub fn is_checkmate(&self) -> bool {
        self.current.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.current.status() == BoardStatus::Stalemate
    }

    /// True when the current board has occurred three times over the whole
    /// history, the current occurrence included.
    pub fn is_repetition_draw(&self) -> bool {
        let earlier = self
            .past
            .iter()
            .filter(|board| **board == self.current)
            .count();
        earlier >= 2
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.result(), GameResult::Ongoing)
    }

    pub fn result(&self) -> GameResult {
        match self.current.status() {
            BoardStatus::Checkmate => GameResult::Win(!self.current.side_to_move()),
            BoardStatus::Stalemate => GameResult::Stalemate,
            BoardStatus::Ongoing if self.is_repetition_draw() => GameResult::Draw,
            BoardStatus::Ongoing => GameResult::Ongoing,
        }
    }

    /// The piece standing on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        let piece = self.current.piece_on(square)?;
        let color = self.current.color_on(square)?;
        Some((piece, color))
    }

    /// Whether `mv` takes a piece: either the destination is occupied
    /// before the move, or a pawn leaves its file onto an empty square
    /// (en passant). Display text is never consulted.
    pub fn is_capture(&self, mv: ChessMove) -> bool {
        if self.current.piece_on(mv.get_dest()).is_some() {
            return true;
        }
        self.current.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file()
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.current.king_square(color)
    }

    /// FEN rendering of the current board, as consumed by the oracle.
    pub fn fen(&self) -> String {
        self.current.to_string()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
