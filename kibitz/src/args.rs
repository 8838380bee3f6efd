use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "kibitz")]
#[command(about = "Play chess against an engine-advised computer opponent")]
pub struct Args {
    /// UCI engine executable used as the evaluation oracle.
    #[arg(long, default_value = "stockfish")]
    pub engine: PathBuf,

    /// Search depth for the computer's move selection.
    #[arg(long, default_value_t = 2)]
    pub depth: u8,

    /// Depth hint passed to the oracle for each leaf evaluation.
    #[arg(long, default_value_t = 10)]
    pub eval_depth: u8,

    /// Side played by the human.
    #[arg(long, value_enum, default_value_t = HumanColor::White)]
    pub color: HumanColor,

    /// Computer opponent flavor.
    #[arg(long, value_enum, default_value_t = Opponent::Oracle)]
    pub opponent: Opponent,

    /// Starting position as a FEN string (standard start if omitted).
    #[arg(long)]
    pub fen: Option<String>,

    /// Log file (stdout belongs to the board display).
    #[arg(long, default_value = "kibitz.log")]
    pub log_file: PathBuf,

    /// Log search details as well.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum HumanColor {
    White,
    Black,
}

impl From<HumanColor> for chess::Color {
    fn from(color: HumanColor) -> Self {
        match color {
            HumanColor::White => chess::Color::White,
            HumanColor::Black => chess::Color::Black,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Opponent {
    /// Minimax over the evaluation oracle.
    Oracle,
    /// Uniformly random legal moves; no engine required.
    Random,
}
