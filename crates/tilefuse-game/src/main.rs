mod config;
mod scheduler;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;

use config::Config;
use scheduler::{MoveScheduler, SchedulerHandle, SchedulerOptions, Snapshot};
use tilefuse_rules::engine::{Direction, Game};

#[derive(Parser, Debug)]
#[command(about = "Play a sliding-tile merge puzzle in the terminal")]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    config: Option<PathBuf>,

    /// Spawn seed override for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Play this move sequence (characters u, d, l, r) and exit
    #[arg(long, value_name = "MOVES")]
    moves: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_toml(path)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    cfg.validate()?;

    let opts = SchedulerOptions {
        capacity: cfg.queue.capacity,
        settle: cfg.settle(),
        seed: cfg.seed,
        spawn: cfg.spawn_policy(),
    };
    let game = Game::new(cfg.dimension, cfg.threshold);
    let cancel = CancellationToken::new();
    let (scheduler, handle, mut events) = MoveScheduler::new(game, opts, cancel.clone());
    let task = scheduler.spawn();
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("{event:?}");
        }
    });

    start_round(&handle, cfg.spawn.initial_tiles).await;
    show(&handle).await;

    match args.moves {
        Some(script) => play_script(&handle, &script).await?,
        None => play_stdin(&handle, cfg.spawn.initial_tiles).await?,
    }

    cancel.cancel();
    task.await.context("scheduler task failed")?;
    event_log.await.context("event logger failed")?;
    Ok(())
}

async fn start_round(handle: &SchedulerHandle, initial_tiles: usize) {
    for _ in 0..initial_tiles {
        let _ = handle.insert_random().await;
    }
}

async fn show(handle: &SchedulerHandle) {
    if let Some(snapshot) = handle.snapshot().await {
        print_snapshot(&snapshot);
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("{}", snapshot.board);
    println!("score: {}", snapshot.score);
}

/// Submit one move, spawn a tile if it changed the board, and report the
/// new state. Returns false once the game is over.
async fn advance(handle: &SchedulerHandle, direction: Direction, celebrated: &mut bool) -> bool {
    let changed = handle.submit_move(direction).await.unwrap_or(false);
    if changed {
        let _ = handle.insert_random().await;
    } else {
        println!("nothing moved");
    }
    let Some(snapshot) = handle.snapshot().await else {
        return false;
    };
    print_snapshot(&snapshot);
    if let Some((row, col)) = snapshot.won {
        if !*celebrated {
            println!("winning tile reached at ({row}, {col})");
            *celebrated = true;
        }
    }
    if snapshot.lost {
        println!("no moves left, game over");
        return false;
    }
    true
}

async fn play_script(handle: &SchedulerHandle, script: &str) -> Result<()> {
    let mut celebrated = false;
    for ch in script.chars() {
        if ch.is_whitespace() {
            continue;
        }
        let direction = parse_direction(ch)
            .with_context(|| format!("unknown move '{ch}', expected one of u, d, l, r"))?;
        if !advance(handle, direction, &mut celebrated).await {
            break;
        }
    }
    Ok(())
}

async fn play_stdin(handle: &SchedulerHandle, initial_tiles: usize) -> Result<()> {
    println!("moves: u/d/l/r, n for a new game, q to quit");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut celebrated = false;
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "q" => break,
            "n" => {
                handle.reset().await;
                start_round(handle, initial_tiles).await;
                celebrated = false;
                show(handle).await;
            }
            input => {
                for ch in input.chars() {
                    match parse_direction(ch) {
                        Some(direction) => {
                            if !advance(handle, direction, &mut celebrated).await {
                                return Ok(());
                            }
                        }
                        None => println!("unknown move '{ch}'"),
                    }
                }
            }
        }
    }
    Ok(())
}

fn parse_direction(ch: char) -> Option<Direction> {
    match ch.to_ascii_lowercase() {
        'u' => Some(Direction::Up),
        'd' => Some(Direction::Down),
        'l' => Some(Direction::Left),
        'r' => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_characters_parse_case_insensitively() {
        assert_eq!(parse_direction('u'), Some(Direction::Up));
        assert_eq!(parse_direction('D'), Some(Direction::Down));
        assert_eq!(parse_direction('l'), Some(Direction::Left));
        assert_eq!(parse_direction('R'), Some(Direction::Right));
        assert_eq!(parse_direction('x'), None);
    }
}
