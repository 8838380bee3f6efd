mod args;
mod interactive;
mod session;

use std::error::Error;
use std::fs::File;

use clap::Parser;
use log::LevelFilter;
use simplelog::{Config, WriteLogger};

use args::{Args, Opponent};
use interactive::InteractiveMatch;
use kibitz_agents::{MinimaxAgent, RandomAgent, UciOracle};
use kibitz_core::Position;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let position = match &args.fen {
        Some(fen) => Position::from_fen(fen).map_err(|e| e.to_string())?,
        None => Position::new(),
    };
    let human = args.color.into();

    log::info!(
        "new match: human plays {:?}, opponent {:?}, search depth {}",
        args.color,
        args.opponent,
        args.depth
    );

    match args.opponent {
        Opponent::Oracle => {
            let oracle = UciOracle::launch(&args.engine, args.eval_depth)?;
            let agent = MinimaxAgent::new(oracle, args.depth);
            InteractiveMatch::new(position, human, agent).run()
        }
        Opponent::Random => InteractiveMatch::new(position, human, RandomAgent::new()).run(),
    }
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(level, Config::default(), File::create(&args.log_file)?)?;
    Ok(())
}
