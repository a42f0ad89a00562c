use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::archetype::LevelPlan;
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::grid::{Cell, Grid, MIN_DIMENSION, Marker, TilePos};

/// A generated level and how many carve attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub grid: Grid,
    pub carve_attempts: u32,
}

/// Carve, validate, place spawns; retry until a layout passes or the
/// attempt budget runs out.
#[derive(Debug, Clone, Default)]
pub struct LevelGenerator {
    config: GeneratorConfig,
}

impl LevelGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a `width` x `height` level. `None` seeds from OS entropy.
    pub fn generate(
        &self,
        width: usize,
        height: usize,
        plan: &LevelPlan,
        seed: Option<u64>,
    ) -> Result<Grid, GenerationError> {
        self.generate_detailed(width, height, plan, seed)
            .map(|generated| generated.grid)
    }

    pub fn generate_detailed(
        &self,
        width: usize,
        height: usize,
        plan: &LevelPlan,
        seed: Option<u64>,
    ) -> Result<Generated, GenerationError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.generate_with_rng(width, height, plan, &mut rng)
    }

    pub fn generate_with_rng(
        &self,
        width: usize,
        height: usize,
        plan: &LevelPlan,
        rng: &mut StdRng,
    ) -> Result<Generated, GenerationError> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(GenerationError::InvalidDimensions { width, height });
        }
        if !plan.is_valid() {
            return Err(GenerationError::InvalidPlan);
        }
        let archetype_dist = WeightedIndex::new(plan.archetypes.weights())
            .map_err(|_| GenerationError::InvalidPlan)?;

        let attempts = self.config.max_carve_attempts.max(1);
        for attempt in 1..=attempts {
            let mut grid = carve(width, height, rng);
            if !grid.is_connected() {
                tracing::debug!(attempt, "carved layout is disconnected, retrying");
                continue;
            }
            if !self.place_markers(&mut grid, plan, &archetype_dist, rng) {
                tracing::debug!(attempt, "spawn placement failed, re-carving");
                continue;
            }
            tracing::debug!(width, height, attempts = attempt, "level generated");
            return Ok(Generated {
                grid,
                carve_attempts: attempt,
            });
        }

        tracing::warn!(width, height, attempts, "level generation exhausted");
        Err(GenerationError::Exhausted { attempts })
    }

    fn place_markers(
        &self,
        grid: &mut Grid,
        plan: &LevelPlan,
        archetype_dist: &WeightedIndex<u32>,
        rng: &mut StdRng,
    ) -> bool {
        let Some(player) = player_spawn_tile(grid) else {
            return false;
        };
        grid.set(player, Cell::Marker(Marker::PlayerSpawn));

        if self.config.place_exit {
            let Some(exit) = exit_tile(grid, player, rng) else {
                return false;
            };
            grid.set(exit, Cell::Marker(Marker::Exit));
        }

        let count = rng.random_range(plan.enemy_count_min..=plan.enemy_count_max);
        for _ in 0..count {
            let Some(pos) = self.sample_enemy_tile(grid, player, rng) else {
                return false;
            };
            let archetype = plan.archetypes.archetype_at(archetype_dist.sample(rng));
            grid.set(pos, Cell::Marker(Marker::EnemySpawn(archetype)));
        }
        true
    }

    fn sample_enemy_tile(&self, grid: &Grid, player: TilePos, rng: &mut StdRng) -> Option<TilePos> {
        let (w, h) = (grid.width() as i32, grid.height() as i32);
        (0..self.config.max_placement_attempts).find_map(|_| {
            let pos = TilePos::new(rng.random_range(1..w - 1), rng.random_range(1..h - 1));
            enemy_spawn_allowed(grid, pos, player).then_some(pos)
        })
    }
}

/// An enemy may spawn on an unused Open cell that rests against a floor or
/// ceiling and does not touch the player spawn.
pub fn enemy_spawn_allowed(grid: &Grid, pos: TilePos, player: TilePos) -> bool {
    if grid.cell(pos) != Some(Cell::Open) {
        return false;
    }
    let above = TilePos::new(pos.col, pos.row - 1);
    let below = TilePos::new(pos.col, pos.row + 1);
    if !grid.is_wall(above) && !grid.is_wall(below) {
        return false;
    }
    pos.col.abs_diff(player.col) > 1 || pos.row.abs_diff(player.row) > 1
}

/// Lowest row, scanning bottom-up, with two horizontally adjacent Open
/// cells. The spawn is the left cell of the first such pair.
fn player_spawn_tile(grid: &Grid) -> Option<TilePos> {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    (1..h - 1).rev().find_map(|row| {
        (1..w - 2).find_map(|col| {
            let left = TilePos::new(col, row);
            let right = TilePos::new(col + 1, row);
            (grid.cell(left) == Some(Cell::Open) && grid.cell(right) == Some(Cell::Open))
                .then_some(left)
        })
    })
}

/// Random Open cell in the topmost row that has one, skipping cells that
/// touch the player spawn.
fn exit_tile(grid: &Grid, player: TilePos, rng: &mut StdRng) -> Option<TilePos> {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    (1..h - 1).find_map(|row| {
        let candidates: Vec<TilePos> = (1..w - 1)
            .map(|col| TilePos::new(col, row))
            .filter(|&pos| grid.cell(pos) == Some(Cell::Open))
            .filter(|pos| pos.col.abs_diff(player.col) > 1 || pos.row.abs_diff(player.row) > 1)
            .collect();
        candidates.choose(rng).copied()
    })
}

/// Wall runs injected into one odd row. Run cells only become Wall where
/// the row above is Wall.
#[derive(Debug, Clone, Copy)]
struct RowPlan {
    /// Columns `1..left_end` form the left run.
    left_end: usize,
    /// Columns `right_start..width` form the right run.
    right_start: usize,
    /// Middle obstruction `[lo, hi)`, only when the band is wide enough.
    middle: Option<(usize, usize)>,
}

impl RowPlan {
    fn draw(width: usize, rng: &mut StdRng) -> Self {
        let fifth = (width / 5).max(1);
        let left_end = rng.random_range(1..=fifth);
        let right_start = rng.random_range(4 * fifth..width);
        let middle = (fifth >= 3).then(|| {
            let lo = rng.random_range(2 * fifth..3 * fifth - 1);
            let hi = rng.random_range(lo + 1..3 * fifth);
            (lo, hi)
        });
        Self {
            left_end,
            right_start,
            middle,
        }
    }

    fn in_run(&self, col: usize) -> bool {
        col < self.left_end
            || col >= self.right_start
            || self.middle.is_some_and(|(lo, hi)| (lo..hi).contains(&col))
    }
}

/// Union-find over row-major cell indices, used to score climb gaps.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

fn is_interior(col: usize, width: usize) -> bool {
    col > 0 && col < width - 1
}

fn carve_odd_row(grid: &mut Grid, row: usize, plan: &RowPlan) {
    let width = grid.width();
    for col in 0..width {
        let above = TilePos::new(col as i32, row as i32 - 1);
        let open = is_interior(col, width) && !(plan.in_run(col) && grid.is_wall(above));
        let cell = if open { Cell::Open } else { Cell::Wall };
        grid.set(TilePos::new(col as i32, row as i32), cell);
    }
}

fn is_open(grid: &Grid, col: usize, row: usize) -> bool {
    grid.cell(TilePos::new(col as i32, row as i32)) == Some(Cell::Open)
}

/// Union-find over the Open cells of rows `1..upto`.
fn committed_regions(grid: &Grid, upto: usize) -> DisjointSet {
    let width = grid.width();
    let mut regions = DisjointSet::new(width * grid.height());
    for row in 1..upto {
        for col in 0..width {
            if !is_open(grid, col, row) {
                continue;
            }
            if col + 1 < width && is_open(grid, col + 1, row) {
                regions.union(grid.index_of(col, row), grid.index_of(col + 1, row));
            }
            if row + 1 < upto && is_open(grid, col, row + 1) {
                regions.union(grid.index_of(col, row), grid.index_of(col, row + 1));
            }
        }
    }
    regions
}

/// Pick climb-gap columns for even row `row`, given the planned odd row
/// below (if any).
fn choose_gaps(grid: &Grid, row: usize, below: Option<&RowPlan>, rng: &mut StdRng) -> Vec<usize> {
    let width = grid.width();
    let fifth = (width / 5).max(1);
    let target = rng.random_range(1..=fifth);
    let opens: Vec<usize> = (1..width - 1).filter(|&c| is_open(grid, c, row - 1)).collect();
    let mut chosen: Vec<usize> = Vec::with_capacity(fifth);

    if let Some(plan) = below {
        let next = row + 1;
        let mut regions = committed_regions(grid, row);
        // Open cells of the row below if this row stayed solid.
        let mut low: Vec<bool> = (0..width)
            .map(|c| is_interior(c, width) && !plan.in_run(c))
            .collect();
        for c in 0..width - 1 {
            if low[c] && low[c + 1] {
                regions.union(grid.index_of(c, next), grid.index_of(c + 1, next));
            }
        }

        while chosen.len() < fifth {
            let mut best = 0;
            let mut best_cols = Vec::new();
            for &c in &opens {
                if chosen.contains(&c) {
                    continue;
                }
                let mut roots = vec![
                    regions.find(grid.index_of(c, row - 1)),
                    regions.find(grid.index_of(c, next)),
                ];
                for cc in [c - 1, c + 1] {
                    if low[cc] {
                        roots.push(regions.find(grid.index_of(cc, next)));
                    }
                }
                roots.sort_unstable();
                roots.dedup();
                let score = roots.len() - 1;
                if score > best {
                    best = score;
                    best_cols.clear();
                    best_cols.push(c);
                } else if score == best && score > 0 {
                    best_cols.push(c);
                }
            }
            let Some(&c) = best_cols.choose(rng) else {
                break;
            };
            chosen.push(c);
            low[c] = true;
            regions.union(grid.index_of(c, row - 1), grid.index_of(c, next));
            for cc in [c - 1, c + 1] {
                if low[cc] {
                    regions.union(grid.index_of(c, next), grid.index_of(cc, next));
                }
            }
        }
    }

    let mut rest: Vec<usize> = opens.into_iter().filter(|c| !chosen.contains(c)).collect();
    rest.shuffle(rng);
    while chosen.len() < target {
        let Some(c) = rest.pop() else {
            break;
        };
        chosen.push(c);
    }
    chosen
}

/// Carve one candidate layout. Border rows and columns stay Wall; odd
/// rows are open corridors with inherited wall runs, even rows are solid
/// floors pierced by climb gaps below Open cells.
fn carve(width: usize, height: usize, rng: &mut StdRng) -> Grid {
    let mut grid = Grid::filled(width, height, Cell::Wall);
    let first = RowPlan::draw(width, rng);
    carve_odd_row(&mut grid, 1, &first);

    for row in (2..height - 1).step_by(2) {
        let next = row + 1;
        let below = (next < height - 1).then(|| RowPlan::draw(width, rng));
        for col in choose_gaps(&grid, row, below.as_ref(), rng) {
            grid.set(TilePos::new(col as i32, row as i32), Cell::Open);
        }
        if let Some(plan) = below {
            carve_odd_row(&mut grid, next, &plan);
        }
    }
    grid
}

/// Structural checks every generated level passes: solid border and a
/// single connected passable region.
pub fn validate(grid: &Grid) -> bool {
    grid.border_is_wall() && grid.is_connected()
}
