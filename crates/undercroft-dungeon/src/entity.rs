use serde::{Deserialize, Serialize};

use undercroft_core::geometry::{Axis, Facing, Rect, Vec2};

use crate::collision::{self, AxisContact};
use crate::config::{ArchetypeStats, PlayerConfig};
use crate::grid::{Grid, TilePos};

/// Unique identifier for a simulated body within a session.
pub type EntityId = u32;

/// Movement tuning carried by every body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    /// Horizontal speed, also the jump impulse.
    pub speed: f32,
    /// Added to `vel.y` on each tick without a vertical collision.
    pub gravity: f32,
    /// Jumps allowed before touching ground again.
    pub max_jumps: u8,
}

impl From<&PlayerConfig> for BodyParams {
    fn from(cfg: &PlayerConfig) -> Self {
        Self {
            speed: cfg.speed,
            gravity: cfg.gravity,
            max_jumps: cfg.max_jumps,
        }
    }
}

impl From<&ArchetypeStats> for BodyParams {
    fn from(stats: &ArchetypeStats) -> Self {
        Self {
            speed: stats.speed,
            gravity: stats.gravity,
            max_jumps: 0,
        }
    }
}

/// A physical body: the player or an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub rect: Rect,
    pub vel: Vec2,
    pub facing: Facing,
    pub hit_points: i32,
    pub jump_count: u8,
    pub params: BodyParams,
}

impl Entity {
    pub fn new(id: EntityId, rect: Rect, hit_points: i32, params: BodyParams) -> Self {
        Self {
            id,
            rect,
            vel: Vec2::ZERO,
            facing: Facing::default(),
            hit_points,
            jump_count: 0,
            params,
        }
    }

    /// Body standing on the floor of `tile`, horizontally centered in it.
    pub fn spawn_at(
        id: EntityId,
        tile: TilePos,
        size: Vec2,
        hit_points: i32,
        params: BodyParams,
        tile_size: f32,
    ) -> Self {
        let foot = tile.floor_center(tile_size);
        let rect = Rect::from_bottom_center(foot.x, foot.y, size.x, size.y);
        Self::new(id, rect, hit_points, params)
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Set horizontal velocity from a direction in [-1, 1]. A non-zero
    /// direction also turns the body to face it.
    pub fn move_horizontal(&mut self, direction: f32) {
        let direction = if direction.is_finite() {
            direction.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.vel.x = direction * self.params.speed;
        if let Some(facing) = Facing::from_direction(direction) {
            self.facing = facing;
        }
    }

    /// Start a jump if the jump budget allows. Returns whether it happened.
    pub fn jump(&mut self) -> bool {
        if self.jump_count >= self.params.max_jumps {
            return false;
        }
        self.vel.y = -self.params.speed;
        self.jump_count += 1;
        true
    }

    /// Integrate one tick against the grid, X axis then Y axis.
    /// Landing on a tile top restores the jump budget.
    pub fn update(&mut self, dt: f32, grid: &Grid, tile_size: f32) -> AxisContact {
        let gravity = self.params.gravity;
        collision::step_axis(
            &mut self.rect,
            &mut self.vel,
            Axis::X,
            dt,
            gravity,
            grid,
            tile_size,
        );
        let vertical = collision::step_axis(
            &mut self.rect,
            &mut self.vel,
            Axis::Y,
            dt,
            gravity,
            grid,
            tile_size,
        );
        if vertical.landed {
            self.jump_count = 0;
        }
        vertical
    }

    /// Subtract `amount` hit points. Never heals.
    pub fn take_damage(&mut self, amount: i32) {
        self.hit_points -= amount.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: f32 = 256.0;
    const DT: f32 = 1.0 / 60.0;

    fn corridor() -> Grid {
        "
########
#......#
#......#
#......#
########"
            .parse()
            .unwrap()
    }

    fn player_at(tile: TilePos) -> Entity {
        let cfg = PlayerConfig::default();
        Entity::spawn_at(
            0,
            tile,
            Vec2::new(cfg.width, cfg.height),
            cfg.hit_points,
            BodyParams::from(&cfg),
            TS,
        )
    }

    #[test]
    fn spawn_stands_on_tile_floor() {
        let player = player_at(TilePos::new(2, 3));
        assert_eq!(player.rect.bottom(), 4.0 * TS);
        assert_eq!(player.center().x, 2.5 * TS);
        assert_eq!(player.rect.w, 64.0);
    }

    #[test]
    fn move_horizontal_clamps_and_faces() {
        let mut player = player_at(TilePos::new(2, 3));
        player.move_horizontal(-7.0);
        assert_eq!(player.vel.x, -1024.0);
        assert_eq!(player.facing, Facing::Left);
        player.move_horizontal(0.0);
        assert_eq!(player.vel.x, 0.0);
        assert_eq!(player.facing, Facing::Left, "standing still keeps facing");
        player.move_horizontal(f32::NAN);
        assert_eq!(player.vel.x, 0.0);
    }

    #[test]
    fn jump_budget_is_respected() {
        let grid = corridor();
        let mut player = player_at(TilePos::new(2, 3));
        assert!(player.jump());
        assert!(player.jump());
        assert!(!player.jump(), "third jump in the air is refused");
        assert_eq!(player.jump_count, 2);
        assert_eq!(player.vel.y, -1024.0);

        // Fall back down until landing restores the budget.
        let mut landed = false;
        for _ in 0..600 {
            if player.update(DT, &grid, TS).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(player.jump_count, 0);
        assert_eq!(player.rect.bottom(), 4.0 * TS);
    }

    #[test]
    fn airborne_velocity_grows_by_gravity_each_tick() {
        let grid = corridor();
        let mut player = player_at(TilePos::new(3, 1));
        // Hang just under the ceiling so the first ticks are free fall.
        player.rect.y = TS + 10.0;
        let mut last = player.vel.y;
        for _ in 0..10 {
            let contact = player.update(DT, &grid, TS);
            if contact.collided {
                break;
            }
            assert_eq!(player.vel.y, last + 16.0);
            last = player.vel.y;
        }
        assert!(last > 0.0);
    }

    #[test]
    fn walking_into_wall_stops_flush() {
        let grid = corridor();
        let mut player = player_at(TilePos::new(6, 3));
        for _ in 0..30 {
            player.move_horizontal(1.0);
            player.update(DT, &grid, TS);
        }
        assert_eq!(player.rect.right(), 7.0 * TS);
        assert_eq!(player.vel.x, 0.0);
    }

    #[test]
    fn damage_never_heals() {
        let mut player = player_at(TilePos::new(2, 3));
        player.take_damage(-50);
        assert_eq!(player.hit_points, 100);
        player.take_damage(100);
        assert!(!player.is_alive());
    }
}
