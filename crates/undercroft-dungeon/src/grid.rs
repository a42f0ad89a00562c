use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use undercroft_core::geometry::{Rect, Vec2};

use crate::archetype::Archetype;
use crate::error::GridParseError;

/// Smallest grid side the generator accepts.
pub const MIN_DIMENSION: usize = 5;

/// Spawn metadata carried by a marker cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    PlayerSpawn,
    EnemySpawn(Archetype),
    Exit,
}

/// Tile kinds for the level grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Open,
    Marker(Marker),
}

impl Cell {
    pub fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }

    /// Open and marker cells can be walked through; only walls collide.
    pub fn is_passable(self) -> bool {
        !self.is_wall()
    }

    fn to_char(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Open => '.',
            Cell::Marker(Marker::PlayerSpawn) => 'P',
            Cell::Marker(Marker::Exit) => 'X',
            Cell::Marker(Marker::EnemySpawn(a)) => a.marker_char(),
        }
    }

    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Cell::Wall),
            '.' | ' ' => Some(Cell::Open),
            'P' => Some(Cell::Marker(Marker::PlayerSpawn)),
            'X' => Some(Cell::Marker(Marker::Exit)),
            _ => Archetype::from_marker_char(ch).map(|a| Cell::Marker(Marker::EnemySpawn(a))),
        }
    }
}

/// Integer tile coordinate. Signed so positions left of or above the grid
/// can be represented (they are simply out of bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub col: i32,
    pub row: i32,
}

impl TilePos {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// 4-connected neighbours in up, down, left, right order.
    pub fn neighbors(self) -> [TilePos; 4] {
        [
            TilePos::new(self.col, self.row - 1),
            TilePos::new(self.col, self.row + 1),
            TilePos::new(self.col - 1, self.row),
            TilePos::new(self.col + 1, self.row),
        ]
    }

    pub fn manhattan(self, other: TilePos) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    /// Tile containing a world-space point: `floor(p / tile_size)`.
    pub fn containing(point: Vec2, tile_size: f32) -> Self {
        Self::new(
            (point.x / tile_size).floor() as i32,
            (point.y / tile_size).floor() as i32,
        )
    }

    /// World-space box covered by this tile.
    pub fn rect(self, tile_size: f32) -> Rect {
        Rect::new(
            self.col as f32 * tile_size,
            self.row as f32 * tile_size,
            tile_size,
            tile_size,
        )
    }

    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.col as f32 + 0.5) * tile_size,
            (self.row as f32 + 0.5) * tile_size,
        )
    }

    /// Point at the middle of the tile's floor; entities spawn standing here.
    pub fn floor_center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.col as f32 + 0.5) * tile_size,
            (self.row as f32 + 1.0) * tile_size,
        )
    }
}

/// The tile map, stored row-major (`row * width + col`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid with every cell set to `cell`.
    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.col >= 0
            && pos.row >= 0
            && (pos.col as usize) < self.width
            && (pos.row as usize) < self.height
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.row as usize * self.width + pos.col as usize)
    }

    /// Row-major index of an in-bounds position.
    pub(crate) fn index_of(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    pub fn cell(&self, pos: TilePos) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Out-of-bounds tiles have no collision geometry.
    pub fn is_wall(&self, pos: TilePos) -> bool {
        self.cell(pos).is_some_and(Cell::is_wall)
    }

    /// Out-of-bounds tiles are never passable for pathing purposes.
    pub fn is_passable(&self, pos: TilePos) -> bool {
        self.cell(pos).is_some_and(Cell::is_passable)
    }

    pub(crate) fn set(&mut self, pos: TilePos, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }

    /// All positions in row-major (creation) order.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).map(move |col| TilePos::new(col as i32, row as i32))
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = (TilePos, Marker)> + '_ {
        self.positions().filter_map(|pos| match self.cell(pos) {
            Some(Cell::Marker(m)) => Some((pos, m)),
            _ => None,
        })
    }

    pub fn player_spawn(&self) -> Option<TilePos> {
        self.markers()
            .find(|&(_, m)| m == Marker::PlayerSpawn)
            .map(|(pos, _)| pos)
    }

    pub fn exit(&self) -> Option<TilePos> {
        self.markers()
            .find(|&(_, m)| m == Marker::Exit)
            .map(|(pos, _)| pos)
    }

    pub fn enemy_spawns(&self) -> impl Iterator<Item = (TilePos, Archetype)> + '_ {
        self.markers().filter_map(|(pos, m)| match m {
            Marker::EnemySpawn(a) => Some((pos, a)),
            _ => None,
        })
    }

    /// Every cell on the outer ring is a wall.
    pub fn border_is_wall(&self) -> bool {
        self.positions()
            .filter(|p| {
                p.row == 0
                    || p.col == 0
                    || p.row as usize == self.height - 1
                    || p.col as usize == self.width - 1
            })
            .all(|p| self.is_wall(p))
    }

    /// Flood fill (stack-based, 4-connected) over passable cells from `start`.
    /// Returns a row-major visited mask.
    pub fn reachable_from(&self, start: TilePos) -> Vec<bool> {
        let mut visited = vec![false; self.cells.len()];
        if !self.is_passable(start) {
            return visited;
        }
        let mut stack = vec![start];
        while let Some(pos) = stack.pop() {
            let Some(i) = self.index(pos) else {
                continue;
            };
            if visited[i] || !self.cells[i].is_passable() {
                continue;
            }
            visited[i] = true;
            stack.extend(pos.neighbors());
        }
        visited
    }

    /// True iff there is at least one passable cell and every passable cell
    /// is reachable from every other through passable cells.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.positions().find(|&p| self.is_passable(p)) else {
            return false;
        };
        let visited = self.reachable_from(start);
        self.cells
            .iter()
            .zip(&visited)
            .all(|(cell, &seen)| !cell.is_passable() || seen)
    }

    pub fn to_ascii(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.to_char())?;
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .trim_matches(|c| c == '\n' || c == '\r')
            .lines()
            .collect();
        let Some(first) = lines.first() else {
            return Err(GridParseError::Empty);
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(GridParseError::Empty);
        }

        let mut cells = Vec::with_capacity(width * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridParseError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell =
                    Cell::from_char(ch).ok_or(GridParseError::UnknownTile { row, col, ch })?;
                cells.push(cell);
            }
        }

        Ok(Grid {
            width,
            height: lines.len(),
            cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "
#######
#..X..#
##.####
#P..1.#
#######";

    #[test]
    fn parse_and_render_roundtrip() {
        let grid: Grid = ROOM.parse().unwrap();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.to_ascii(), ROOM.trim_start_matches('\n'));
    }

    #[test]
    fn markers_are_found() {
        let grid: Grid = ROOM.parse().unwrap();
        assert_eq!(grid.player_spawn(), Some(TilePos::new(1, 3)));
        assert_eq!(grid.exit(), Some(TilePos::new(3, 1)));
        let enemies: Vec<_> = grid.enemy_spawns().collect();
        assert_eq!(enemies, vec![(TilePos::new(4, 3), Archetype::Kamikaze)]);
    }

    #[test]
    fn out_of_bounds_is_neither_wall_nor_passable() {
        let grid: Grid = ROOM.parse().unwrap();
        let outside = TilePos::new(-1, 2);
        assert!(!grid.is_wall(outside));
        assert!(!grid.is_passable(outside));
        assert_eq!(grid.cell(TilePos::new(7, 0)), None);
    }

    #[test]
    fn connectivity_check() {
        let grid: Grid = ROOM.parse().unwrap();
        assert!(grid.is_connected());
        assert!(grid.border_is_wall());

        let split: Grid = "
#####
#.#.#
#####"
            .parse()
            .unwrap();
        assert!(!split.is_connected());

        let solid = Grid::filled(5, 5, Cell::Wall);
        assert!(!solid.is_connected(), "no open cell means not valid");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = "###\n##\n###".parse::<Grid>().unwrap_err();
        assert_eq!(
            err,
            GridParseError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn unknown_tiles_are_rejected() {
        let err = "###\n#?#\n###".parse::<Grid>().unwrap_err();
        assert_eq!(
            err,
            GridParseError::UnknownTile {
                row: 1,
                col: 1,
                ch: '?'
            }
        );
        assert_eq!("".parse::<Grid>().unwrap_err(), GridParseError::Empty);
    }

    #[test]
    fn tile_mapping_floors_coordinates() {
        assert_eq!(
            TilePos::containing(Vec2::new(255.9, 256.0), 256.0),
            TilePos::new(0, 1)
        );
        assert_eq!(
            TilePos::containing(Vec2::new(-0.1, 0.0), 256.0),
            TilePos::new(-1, 0)
        );
        let r = TilePos::new(2, 3).rect(256.0);
        assert_eq!((r.left(), r.top(), r.right(), r.bottom()), (512.0, 768.0, 768.0, 1024.0));
    }
}
