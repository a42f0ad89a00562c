//! Undercroft CLI - generate levels and run headless simulations.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use undercroft_core::intent::Intent;
use undercroft_dungeon::{DungeonConfig, LevelGenerator, LevelPlan, Replay, ReplaySummary};

/// Undercroft - procedural dungeon platformer core
#[derive(Parser, Debug)]
#[command(name = "undercroft")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a level and print it as ASCII
    Generate {
        /// Grid width in tiles (default: from config)
        #[arg(long)]
        width: Option<usize>,

        /// Grid height in tiles (default: from config)
        #[arg(long)]
        height: Option<usize>,

        /// Generator seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Level index, selects archetypes and enemy count
        #[arg(short, long, default_value = "0")]
        level: u32,
    },

    /// Drive a scripted walker through a generated level
    Simulate {
        /// Seed for both the level and in-session randomness (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Level index
        #[arg(short, long, default_value = "0")]
        level: u32,

        /// Maximum ticks to simulate
        #[arg(short, long, default_value = "1800")]
        ticks: u32,

        /// Save the run as a replay file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play back a recorded run
    Replay {
        /// Replay file written by `simulate --record`
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = DungeonConfig::load();

    match args.command {
        Commands::Generate {
            width,
            height,
            seed,
            level,
        } => generate(&config, width, height, seed, level),
        Commands::Simulate {
            seed,
            level,
            ticks,
            record,
        } => simulate(config, seed, level, ticks, record.as_deref()),
        Commands::Replay { file } => replay(&file),
    }
}

fn generate(
    config: &DungeonConfig,
    width: Option<usize>,
    height: Option<usize>,
    seed: Option<u64>,
    level: u32,
) -> anyhow::Result<()> {
    let width = width.unwrap_or(config.generator.width);
    let height = height.unwrap_or(config.generator.height);
    let seed = seed.unwrap_or_else(rand::random);
    let generated = LevelGenerator::new(config.generator.clone())
        .generate_detailed(width, height, &LevelPlan::for_level(level), Some(seed))
        .with_context(|| format!("generating {width}x{height} level {level}"))?;

    println!("{}", generated.grid);
    println!();
    println!(
        "seed {seed}, level {level}, {} carve attempt(s), {} enemies",
        generated.carve_attempts,
        generated.grid.enemy_spawns().count()
    );
    Ok(())
}

/// Walk right, turning around every four seconds, with a double jump and
/// an attack on a fixed rhythm.
fn walker_intent(tick: u32) -> Intent {
    Intent {
        move_dir: if (tick / 240) % 2 == 0 { 1 } else { -1 },
        jump: tick % 50 == 0 || tick % 50 == 10,
        attack: tick % 20 < 4,
    }
}

fn simulate(
    config: DungeonConfig,
    seed: Option<u64>,
    level: u32,
    ticks: u32,
    record: Option<&Path>,
) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    let mut replay = Replay::new(level, seed, seed, config);
    for tick in 0..ticks {
        replay.record(walker_intent(tick));
    }

    let summary = replay.play().context("running simulation")?;
    replay.intents.truncate(summary.ticks);
    print_summary(&summary);

    if let Some(path) = record {
        let bytes = replay.encode()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("writing replay to {}", path.display()))?;
        println!("replay saved to {}", path.display());
    }
    Ok(())
}

fn replay(file: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("reading replay {}", file.display()))?;
    let replay = Replay::decode(&bytes)?;
    tracing::info!(
        level = replay.level,
        seed = replay.generator_seed,
        ticks = replay.intents.len(),
        "replaying"
    );
    let summary = replay.play()?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    let snapshot = &summary.snapshot;
    println!("outcome: {:?} after {} ticks", summary.outcome, summary.ticks);
    println!(
        "player at ({:.0}, {:.0}) with {} hp, {} enemies left",
        snapshot.player.x,
        snapshot.player.y,
        snapshot.player_hit_points,
        snapshot.enemies.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn walker_turns_around() {
        assert_eq!(walker_intent(0).move_dir, 1);
        assert_eq!(walker_intent(240).move_dir, -1);
        assert!(walker_intent(0).jump);
        assert!(walker_intent(0).attack);
        assert!(!walker_intent(5).attack);
    }
}
