use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use undercroft_core::geometry::Vec2;

use crate::grid::{Grid, TilePos};

/// A* over passable tiles, 4-connected, unit step cost, Manhattan heuristic.
///
/// Returns the tiles to walk through, excluding `start` and ending at
/// `goal`; an empty route when they coincide. Ties on `f` are broken by
/// insertion order so equal-cost searches are reproducible.
pub fn find_path(grid: &Grid, start: TilePos, goal: TilePos) -> Option<Vec<TilePos>> {
    if !grid.is_passable(start) || !grid.is_passable(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut open = BinaryHeap::<Reverse<(u32, u64, TilePos)>>::new();
    let mut best_cost = HashMap::<TilePos, u32>::new();
    let mut came_from = HashMap::<TilePos, TilePos>::new();
    let mut closed = HashSet::<TilePos>::new();
    let mut seq = 0u64;

    best_cost.insert(start, 0);
    open.push(Reverse((start.manhattan(goal), seq, start)));

    while let Some(Reverse((_, _, pos))) = open.pop() {
        if pos == goal {
            return Some(rebuild(&came_from, start, goal));
        }
        if !closed.insert(pos) {
            continue;
        }
        let cost = best_cost.get(&pos).copied().unwrap_or(u32::MAX);
        for next in pos.neighbors() {
            if !grid.is_passable(next) || closed.contains(&next) {
                continue;
            }
            let next_cost = cost.saturating_add(1);
            if best_cost.get(&next).is_some_and(|&seen| seen <= next_cost) {
                continue;
            }
            best_cost.insert(next, next_cost);
            came_from.insert(next, pos);
            seq += 1;
            open.push(Reverse((
                next_cost.saturating_add(next.manhattan(goal)),
                seq,
                next,
            )));
        }
    }

    None
}

fn rebuild(came_from: &HashMap<TilePos, TilePos>, start: TilePos, goal: TilePos) -> Vec<TilePos> {
    let mut route = vec![goal];
    let mut cur = goal;
    while let Some(&prev) = came_from.get(&cur) {
        if prev == start {
            break;
        }
        route.push(prev);
        cur = prev;
    }
    route.reverse();
    route
}

/// True when the segment between two world points crosses no wall tile.
/// Sampled at quarter-tile steps.
pub fn line_of_sight(grid: &Grid, from: Vec2, to: Vec2, tile_size: f32) -> bool {
    let delta = to - from;
    let step = tile_size / 4.0;
    let samples = (delta.length() / step).ceil().max(1.0) as u32;
    (0..=samples).all(|i| {
        let t = i as f32 / samples as f32;
        let point = from + delta * t;
        !grid.is_wall(TilePos::containing(point, tile_size))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: f32 = 256.0;

    fn maze() -> Grid {
        "
#######
#.....#
#####.#
#.....#
#.#####
#.....#
#######"
            .parse()
            .unwrap()
    }

    #[test]
    fn path_follows_the_corridor() {
        let grid = maze();
        let route = find_path(&grid, TilePos::new(1, 1), TilePos::new(5, 5)).unwrap();
        // 4 right, 2 down, 4 left, 2 down, 4 right.
        assert_eq!(route.len(), 16);
        assert_eq!(route.last(), Some(&TilePos::new(5, 5)));
        assert_eq!(route[0], TilePos::new(2, 1));
        let mut prev = TilePos::new(1, 1);
        for &step in &route {
            assert_eq!(prev.manhattan(step), 1);
            assert!(grid.is_passable(step));
            prev = step;
        }
    }

    #[test]
    fn same_tile_is_empty_route() {
        let grid = maze();
        let route = find_path(&grid, TilePos::new(3, 3), TilePos::new(3, 3));
        assert_eq!(route, Some(Vec::new()));
    }

    #[test]
    fn walls_and_islands_have_no_route() {
        let grid: Grid = "
#####
#.#.#
#####"
            .parse()
            .unwrap();
        assert_eq!(find_path(&grid, TilePos::new(1, 1), TilePos::new(3, 1)), None);
        assert_eq!(find_path(&grid, TilePos::new(1, 1), TilePos::new(2, 1)), None);
        assert_eq!(find_path(&grid, TilePos::new(-1, 1), TilePos::new(1, 1)), None);
    }

    #[test]
    fn equal_cost_searches_are_reproducible() {
        let grid: Grid = "
######
#....#
#....#
#....#
######"
            .parse()
            .unwrap();
        let a = find_path(&grid, TilePos::new(1, 1), TilePos::new(4, 3));
        let b = find_path(&grid, TilePos::new(1, 1), TilePos::new(4, 3));
        assert_eq!(a, b);
        assert_eq!(a.map(|r| r.len()), Some(5));
    }

    #[test]
    fn sight_is_blocked_by_walls() {
        let grid = maze();
        let a = TilePos::new(1, 1).center(TS);
        let b = TilePos::new(5, 1).center(TS);
        let c = TilePos::new(1, 3).center(TS);
        assert!(line_of_sight(&grid, a, b, TS));
        assert!(!line_of_sight(&grid, a, c, TS));
        assert!(line_of_sight(&grid, a, a, TS));
    }
}
