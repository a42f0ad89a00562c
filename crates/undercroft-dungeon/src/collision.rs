use undercroft_core::geometry::{Axis, Rect, Vec2};

use crate::grid::{Grid, TilePos};

/// What happened while resolving one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisContact {
    /// The box overlapped at least one wall tile on this pass.
    pub collided: bool,
    /// The box was snapped onto the top face of a tile (Y pass only).
    pub landed: bool,
}

/// Wall tiles whose cells can overlap `rect`, plus a one-tile margin so a
/// snap that nudges the box toward a neighbour is still covered.
fn candidate_tiles(rect: &Rect, grid: &Grid, tile_size: f32) -> Vec<TilePos> {
    let min_col = (rect.left() / tile_size).floor() as i32 - 1;
    let max_col = (rect.right() / tile_size).floor() as i32 + 1;
    let min_row = (rect.top() / tile_size).floor() as i32 - 1;
    let max_row = (rect.bottom() / tile_size).floor() as i32 + 1;

    let last_col = grid.width() as i32 - 1;
    let last_row = grid.height() as i32 - 1;
    let cols = min_col.max(0)..=max_col.min(last_col);
    let rows = min_row.max(0)..=max_row.min(last_row);

    rows.flat_map(|row| cols.clone().map(move |col| TilePos::new(col, row)))
        .filter(|&pos| grid.is_wall(pos))
        .collect()
}

/// Push `rect` out of every wall tile it overlaps along `axis`.
///
/// The side is picked by the smaller penetration; the snap only happens when
/// that penetration is under half a tile, which keeps a box that is deeply
/// embedded from being flung across a tile. Snapping zeroes `vel` on the axis.
pub fn resolve_axis(
    rect: &mut Rect,
    vel: &mut Vec2,
    axis: Axis,
    grid: &Grid,
    tile_size: f32,
) -> AxisContact {
    let half = tile_size / 2.0;
    let mut contact = AxisContact::default();

    for pos in candidate_tiles(rect, grid, tile_size) {
        let tile = pos.rect(tile_size);
        if !rect.intersects(&tile) {
            continue;
        }
        contact.collided = true;

        match axis {
            Axis::X => {
                let from_left = rect.right() - tile.left();
                let from_right = tile.right() - rect.left();
                if from_left <= from_right {
                    if from_left < half {
                        rect.x = tile.left() - rect.w;
                        vel.x = 0.0;
                    }
                } else if from_right < half {
                    rect.x = tile.right();
                    vel.x = 0.0;
                }
            },
            Axis::Y => {
                let from_above = rect.bottom() - tile.top();
                let from_below = tile.bottom() - rect.top();
                if from_above <= from_below {
                    if from_above < half {
                        rect.y = tile.top() - rect.h;
                        vel.y = 0.0;
                        contact.landed = true;
                    }
                } else if from_below < half {
                    rect.y = tile.bottom();
                    vel.y = 0.0;
                }
            },
        }
    }

    contact
}

/// Integrate one axis, resolve it, and on a Y pass without any collision
/// add `gravity` to the vertical velocity.
///
/// Gravity is a flat per-tick increment, not scaled by `dt`, so fall
/// acceleration depends on the tick rate.
pub fn step_axis(
    rect: &mut Rect,
    vel: &mut Vec2,
    axis: Axis,
    dt: f32,
    gravity: f32,
    grid: &Grid,
    tile_size: f32,
) -> AxisContact {
    rect.shift(axis, vel.get(axis) * dt);
    let contact = resolve_axis(rect, vel, axis, grid, tile_size);
    if axis == Axis::Y && !contact.collided {
        vel.y += gravity;
    }
    contact
}

/// Whether `rect` overlaps any wall tile.
pub fn overlaps_wall(rect: &Rect, grid: &Grid, tile_size: f32) -> bool {
    candidate_tiles(rect, grid, tile_size)
        .into_iter()
        .any(|pos| rect.intersects(&pos.rect(tile_size)))
}
