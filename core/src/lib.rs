pub mod position;

pub use position::{GameResult, Position};
