//! Crossterm front end.
//!
//! Translates key presses into the session's two input events (a square
//! click and a promotion choice) and redraws the board from the session's
//! view. No game logic lives here.

use std::error::Error;
use std::io::{self, Write};

use chess::{Color, File, Piece, Rank, Square};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent},
    style::{Color as TermColor, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
    ExecutableCommand,
};
use kibitz_agents::Agent;
use kibitz_core::{GameResult, Position};

use crate::session::{BoardView, SelectionState, Session};

pub struct InteractiveMatch<A: Agent> {
    session: Session<A>,
    initial: Position,
    cursor: (u8, u8), // (file, rank) in 0-7 range
    message: String,
}

impl<A: Agent> InteractiveMatch<A> {
    pub fn new(position: Position, human: Color, agent: A) -> Self {
        Self {
            session: Session::new(position.clone(), human, agent),
            initial: position,
            cursor: (4, 1), // e2
            message: String::from("hjkl/arrows move, Enter selects, n new game, q quits"),
        }
    }

    pub fn run(mut self) -> Result<(), Box<dyn Error>> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(Hide)?;
        stdout.execute(Clear(ClearType::All))?;

        let result = self.game_loop();

        stdout.execute(Show)?;
        terminal::disable_raw_mode()?;
        stdout.execute(Clear(ClearType::All))?;
        stdout.execute(MoveTo(0, 0))?;

        result
    }

    fn game_loop(&mut self) -> Result<(), Box<dyn Error>> {
        // The computer opens when the human plays black.
        self.ensure_computer_moved()?;

        loop {
            self.draw()?;

            let Event::Key(KeyEvent { code, .. }) = event::read()? else {
                continue;
            };

            if let SelectionState::AwaitingPromotion { .. } = self.session.state() {
                self.handle_promotion_key(code)?;
                continue;
            }

            match code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1, 0),
                KeyCode::Char('j') | KeyCode::Down => self.move_cursor(0, -1),
                KeyCode::Char('k') | KeyCode::Up => self.move_cursor(0, 1),
                KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1, 0),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.session.handle_click(self.cursor_square())?;
                    self.update_message();
                }
                KeyCode::Char('n') => {
                    self.session.reset(self.initial.clone());
                    self.message = String::from("New game started");
                    self.ensure_computer_moved()?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn handle_promotion_key(&mut self, code: KeyCode) -> Result<(), Box<dyn Error>> {
        let piece = match code {
            KeyCode::Char('q') => Some(Piece::Queen),
            KeyCode::Char('r') => Some(Piece::Rook),
            KeyCode::Char('b') => Some(Piece::Bishop),
            KeyCode::Char('n') => Some(Piece::Knight),
            KeyCode::Esc => None,
            _ => return Ok(()),
        };

        match piece {
            Some(piece) => {
                self.session.choose_promotion(piece)?;
                self.update_message();
            }
            None => {
                self.session.cancel();
                self.message = String::from("Promotion cancelled");
            }
        }
        Ok(())
    }

    fn ensure_computer_moved(&mut self) -> Result<(), Box<dyn Error>> {
        if self.session.computer_to_move() {
            self.message = String::from("Thinking...");
            self.draw()?;
            self.session.play_computer_move()?;
            self.update_message();
        }
        Ok(())
    }

    fn update_message(&mut self) {
        self.message = match self.session.state() {
            SelectionState::GameOver(result) => format!("Game over: {}", result),
            SelectionState::AwaitingPromotion { .. } => {
                String::from("Promote to: [q]ueen [r]ook [b]ishop k[n]ight, Esc cancels")
            }
            SelectionState::PieceSelected(square) => format!("Selected {}", square),
            SelectionState::Idle => {
                if self.session.view().check.is_some() {
                    String::from("Check!")
                } else {
                    format!("{} to move", side_name(self.session.position().side_to_move()))
                }
            }
        };
    }

    fn move_cursor(&mut self, dx: i8, dy: i8) {
        let new_file = self.cursor.0 as i8 + dx;
        let new_rank = self.cursor.1 as i8 + dy;

        if (0..8).contains(&new_file) && (0..8).contains(&new_rank) {
            self.cursor = (new_file as u8, new_rank as u8);
        }
    }

    fn cursor_square(&self) -> Square {
        Square::make_square(
            Rank::from_index(self.cursor.1 as usize),
            File::from_index(self.cursor.0 as usize),
        )
    }

    fn draw(&self) -> io::Result<()> {
        let view = self.session.view();
        let mut stdout = io::stdout();
        stdout.execute(MoveTo(0, 0))?;

        println!("kibitz (vim keys: hjkl)\r");
        println!("\r");
        println!("  a b c d e f g h  \r");
        println!(" ┌─────────────────┐\r");

        for rank_idx in (0..8usize).rev() {
            print!("{}│ ", rank_idx + 1);

            for file_idx in 0..8usize {
                let square = Square::make_square(
                    Rank::from_index(rank_idx),
                    File::from_index(file_idx),
                );
                self.paint_square(&mut stdout, &view, square, file_idx, rank_idx)?;
            }

            println!("│{}\r", rank_idx + 1);
        }

        println!(" └─────────────────┘\r");
        println!("  a b c d e f g h  \r");
        println!("\r");
        println!("{}\r", pad_line(&self.message));

        if let Some((from, to)) = view.promotion {
            println!(
                "{}\r",
                pad_line(&format!(
                    "Promoting {} to {}: [q]ueen [r]ook [b]ishop k[n]ight",
                    from, to
                ))
            );
        } else if view.result != GameResult::Ongoing {
            println!(
                "{}\r",
                pad_line(&format!("** {} ** press n for a new game", view.result))
            );
        } else {
            println!("{}\r", pad_line(""));
        }

        stdout.flush()
    }

    fn paint_square(
        &self,
        stdout: &mut io::Stdout,
        view: &BoardView,
        square: Square,
        file_idx: usize,
        rank_idx: usize,
    ) -> io::Result<()> {
        let destination = view.destinations.iter().find(|d| d.square == square);
        let is_cursor = self.cursor == (file_idx as u8, rank_idx as u8);

        if is_cursor {
            stdout.execute(SetBackgroundColor(TermColor::Yellow))?;
        } else if view.selected == Some(square) {
            stdout.execute(SetBackgroundColor(TermColor::Green))?;
        } else if view.check == Some(square) {
            stdout.execute(SetBackgroundColor(TermColor::Red))?;
        } else if let Some(destination) = destination {
            if destination.capture {
                stdout.execute(SetBackgroundColor(TermColor::DarkRed))?;
            } else {
                stdout.execute(SetBackgroundColor(TermColor::Blue))?;
            }
        } else if (file_idx + rank_idx) % 2 == 0 {
            stdout.execute(SetBackgroundColor(TermColor::DarkGrey))?;
        } else {
            stdout.execute(SetBackgroundColor(TermColor::Black))?;
        }

        if let Some((piece, color)) = self.session.position().piece_at(square) {
            let symbol = piece_symbol(piece, color);
            if color == Color::White {
                stdout.execute(SetForegroundColor(TermColor::White))?;
            } else {
                stdout.execute(SetForegroundColor(TermColor::Magenta))?;
            }
            print!("{} ", symbol);
        } else {
            print!("  ");
        }

        stdout.execute(ResetColor)?;
        Ok(())
    }
}

fn piece_symbol(piece: Piece, color: Color) -> char {
    match (piece, color) {
        (Piece::King, Color::White) => '♔',
        (Piece::Queen, Color::White) => '♕',
        (Piece::Rook, Color::White) => '♖',
        (Piece::Bishop, Color::White) => '♗',
        (Piece::Knight, Color::White) => '♘',
        (Piece::Pawn, Color::White) => '♙',
        (Piece::King, Color::Black) => '♚',
        (Piece::Queen, Color::Black) => '♛',
        (Piece::Rook, Color::Black) => '♜',
        (Piece::Bishop, Color::Black) => '♝',
        (Piece::Knight, Color::Black) => '♞',
        (Piece::Pawn, Color::Black) => '♟',
    }
}

fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Pads the status line so a shorter message fully overwrites the previous
/// one without clearing the whole screen.
fn pad_line(message: &str) -> String {
    format!("{:<70}", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_square_mapping() {
        let session = InteractiveMatch::new(
            Position::new(),
            Color::White,
            kibitz_agents::RandomAgent::new(),
        );
        assert_eq!(session.cursor_square(), Square::E2);
    }

    #[test]
    fn test_cursor_stays_on_the_board() {
        let mut game = InteractiveMatch::new(
            Position::new(),
            Color::White,
            kibitz_agents::RandomAgent::new(),
        );
        for _ in 0..20 {
            game.move_cursor(-1, -1);
        }
        assert_eq!(game.cursor, (0, 0));
        assert_eq!(game.cursor_square(), Square::A1);
    }
}
