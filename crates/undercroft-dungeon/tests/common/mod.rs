use undercroft_dungeon::config::{DungeonConfig, GRID_SIZE};
use undercroft_dungeon::{Archetype, Grid, LevelGenerator, LevelPlan, LevelSession};

/// 17x17 level with no enemies, so movement scenarios are undisturbed.
pub fn empty_level(seed: u64) -> Grid {
    LevelGenerator::default()
        .generate(
            GRID_SIZE,
            GRID_SIZE,
            &LevelPlan::only(Archetype::Kamikaze, 0),
            Some(seed),
        )
        .expect("generation succeeds for a 17x17 grid")
}

/// Session over an ASCII fixture with default tuning.
pub fn fixture_session(ascii: &str, seed: u64) -> LevelSession {
    let grid: Grid = ascii.parse().expect("valid fixture");
    LevelSession::with_seed(grid, &DungeonConfig::default(), seed).expect("fixture has a spawn")
}
