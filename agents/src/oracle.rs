//! Client for the external evaluation oracle.
//!
//! The oracle is a UCI engine process queried synchronously for one leaf
//! evaluation at a time. Only the handful of commands the search needs are
//! spoken; this is not a full UCI implementation.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use chess::Board;
use thiserror::Error;

use crate::score::Evaluation;

/// Failures talking to the oracle process. Each is fatal for the query
/// that hit it; a search never turns one into a sentinel score.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to launch evaluation engine: {0}")]
    Launch(#[source] io::Error),
    #[error("evaluation engine i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("evaluation engine closed its output stream")]
    Disconnected,
}

/// A synchronous position evaluator. Scores are relative to the side to
/// move on the given board.
pub trait Oracle {
    fn evaluate(&mut self, board: &Board) -> Result<Evaluation, OracleError>;
}

/// Oracle backed by a UCI engine child process.
pub struct UciOracle {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    depth: u8,
}

impl UciOracle {
    /// Spawns the engine at `path` and completes the UCI handshake.
    /// `depth` is the fixed depth hint used for every leaf evaluation.
    pub fn launch(path: impl AsRef<Path>, depth: u8) -> Result<Self, OracleError> {
        let mut child = Command::new(path.as_ref())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(OracleError::Launch)?;

        let stdin = child.stdin.take().ok_or(OracleError::Disconnected)?;
        let stdout = child.stdout.take().ok_or(OracleError::Disconnected)?;

        let mut oracle = Self {
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            depth,
        };
        oracle.handshake()?;

        log::info!("evaluation engine {} ready", path.as_ref().display());
        Ok(oracle)
    }

    fn handshake(&mut self) -> Result<(), OracleError> {
        self.send("uci")?;
        loop {
            if self.read_line()? == "uciok" {
                break;
            }
        }

        self.send("ucinewgame")?;
        self.send("isready")?;
        loop {
            if self.read_line()? == "readyok" {
                break;
            }
        }
        Ok(())
    }

    fn send(&mut self, command: &str) -> Result<(), OracleError> {
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    // TODO: bound this read with a timeout so a hung engine cannot freeze
    // the whole session.
    fn read_line(&mut self) -> Result<String, OracleError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(OracleError::Disconnected);
        }
        Ok(line.trim().to_string())
    }
}

impl Oracle for UciOracle {
    fn evaluate(&mut self, board: &Board) -> Result<Evaluation, OracleError> {
        self.send(&format!("position fen {}", board))?;
        self.send(&format!("go depth {}", self.depth))?;

        // Keep the score from the deepest info line; `bestmove` ends the
        // reply. No score line at all is a legal (if unhelpful) answer.
        let mut latest = Evaluation::Unknown;
        loop {
            let line = self.read_line()?;
            if let Some(evaluation) = parse_info_score(&line) {
                latest = evaluation;
            }
            if line.starts_with("bestmove") {
                return Ok(latest);
            }
        }
    }
}

impl Drop for UciOracle {
    fn drop(&mut self) {
        // Ask the engine to quit; kill it if it will not.
        if self.send("quit").is_err() {
            let _ = self.child.kill();
            return;
        }

        std::thread::sleep(Duration::from_millis(100));
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

/// Extracts `score cp N` or `score mate N` from a UCI `info` line.
fn parse_info_score(line: &str) -> Option<Evaluation> {
    if !line.starts_with("info") {
        return None;
    }

    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "score" {
            continue;
        }
        return match (tokens.next()?, tokens.next()?) {
            ("cp", value) => value.parse().ok().map(Evaluation::Centipawns),
            ("mate", value) => value.parse().ok().map(Evaluation::Mate),
            _ => None,
        };
    }
    None
}
