//! Tengen: a Go engine with alpha-beta search.
//!
//! ## Usage
//!
//! - `tengen -a` - let the engine play itself to the end of the game
//! - `tengen -f game.sgf` - replay a recorded game
//! - `tengen -a -s game.sgf` - self-play and record the result
//!
//! `--size` and `--depth` control the board and the search.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use tengen::board::Board;
use tengen::game::{Game, GameWithHistory, GameWithInfo, RecordedGame};
use tengen::search::AlphaBeta;
use tengen::sgf;

/// Tengen: a Go engine with alpha-beta search
#[derive(Parser)]
#[command(name = "tengen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Let the engine play both sides until the game ends
    #[arg(short = 'a', long)]
    auto: bool,

    /// Replay a game from an SGF file
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Record the game to an SGF file on exit
    #[arg(short = 's', long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Board size (the board is square)
    #[arg(long, default_value_t = 9)]
    size: u8,

    /// Search depth in plies
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str(&cli.log)?
        .log_to_stderr()
        .start()?;

    if !(1..=tengen::board::MAX_BOARD).contains(&cli.size) {
        bail!("board size must be between 1 and {}", tengen::board::MAX_BOARD);
    }

    let replay = match &cli.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Some(sgf::parse(&text, cli.size, cli.size)?)
        }
        None => None,
    };

    let mut info = GameWithInfo::new(Box::new(GameWithHistory::from_board(Board::new(
        cli.size, cli.size,
    ))));
    if cli.auto {
        info.set_black_name("tengen");
        info.set_white_name("tengen");
    }
    if let Some(record) = &replay {
        if let Some(name) = &record.black_player {
            info.set_black_name(name);
        }
        if let Some(name) = &record.white_player {
            info.set_white_name(name);
        }
    }
    let (black_name, white_name) = {
        let (b, w) = info.names();
        (b.to_string(), w.to_string())
    };
    let mut game = RecordedGame::new(Box::new(info));

    if let Some(record) = replay {
        for mv in record.moves {
            game.play(mv).with_context(|| format!("replaying {}", mv))?;
        }
        println!("{}", game.board());
    }

    if cli.auto {
        let mut search = AlphaBeta::new(Some(cli.depth));
        // generous cutoff against pathological never-ending games
        let max_moves = cli.size as u16 * cli.size as u16 * 3;
        while !game.game_over() && game.turn() < max_moves {
            let Some(mv) = search.next_move(&game) else {
                break;
            };
            log::info!("{} after {} explored positions", mv, search.explored);
            game.play(mv).context("engine move rejected")?;
            println!("{}", game.board());
        }
        println!("Final score: {:+} (positive favors black)", game.score());
    }

    if let Some(path) = &cli.save {
        game.save_sgf(path, &black_name, &white_name)
            .with_context(|| format!("saving {}", path.display()))?;
        log::info!("saved game record to {}", path.display());
    }

    if !cli.auto && cli.file.is_none() {
        println!("{}", game.board());
        println!("Run with -a for engine self-play, or -f <file> to replay an SGF game.");
    }

    Ok(())
}
