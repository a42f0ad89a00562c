use std::collections::VecDeque;

use rand::Rng;

use undercroft_core::geometry::{Facing, Rect, Vec2};

use crate::archetype::{Archetype, BehaviorKind};
use crate::config::ArchetypeStats;
use crate::entity::{BodyParams, Entity, EntityId};
use crate::grid::{Grid, TilePos};
use crate::pathfind;

/// Per-archetype decision state. Only the pathfinding variant carries data.
#[derive(Debug, Clone, PartialEq)]
pub enum EnemyBehavior {
    DirectPursuit,
    SnapPursuit,
    GridPathfinding {
        /// Remaining tiles to walk through, front first.
        route: VecDeque<TilePos>,
        /// Player tile the route was computed for.
        target: Option<TilePos>,
    },
    StationaryMelee,
}

impl EnemyBehavior {
    pub fn for_archetype(archetype: Archetype) -> Self {
        match archetype.behavior() {
            BehaviorKind::DirectPursuit => EnemyBehavior::DirectPursuit,
            BehaviorKind::SnapPursuit => EnemyBehavior::SnapPursuit,
            BehaviorKind::GridPathfinding => EnemyBehavior::GridPathfinding {
                route: VecDeque::new(),
                target: None,
            },
            BehaviorKind::StationaryMelee => EnemyBehavior::StationaryMelee,
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        match self {
            EnemyBehavior::DirectPursuit => BehaviorKind::DirectPursuit,
            EnemyBehavior::SnapPursuit => BehaviorKind::SnapPursuit,
            EnemyBehavior::GridPathfinding { .. } => BehaviorKind::GridPathfinding,
            EnemyBehavior::StationaryMelee => BehaviorKind::StationaryMelee,
        }
    }
}

/// Read-only world data an enemy needs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct EnemyTick<'a> {
    pub grid: &'a Grid,
    pub tile_size: f32,
    pub dt: f32,
}

/// An enemy body plus its archetype tuning and behavior state.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub entity: Entity,
    pub archetype: Archetype,
    pub stats: ArchetypeStats,
    /// Irreversible once set.
    pub activated: bool,
    /// Seconds until the next contact strike is allowed.
    pub cooldown: f32,
    pub behavior: EnemyBehavior,
}

impl Enemy {
    pub fn spawn(
        id: EntityId,
        archetype: Archetype,
        tile: TilePos,
        stats: ArchetypeStats,
        tile_size: f32,
    ) -> Self {
        let entity = Entity::spawn_at(
            id,
            tile,
            Vec2::new(stats.width, stats.height),
            stats.hit_points,
            BodyParams::from(&stats),
            tile_size,
        );
        Self {
            entity,
            archetype,
            stats,
            activated: false,
            cooldown: 0.0,
            behavior: EnemyBehavior::for_archetype(archetype),
        }
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn is_alive(&self) -> bool {
        self.entity.is_alive()
    }

    /// Latch activation if the player's center is inside the activation
    /// window around this enemy's center. Returns true only on the tick the
    /// latch flips.
    pub fn check_activation(&mut self, player: &Entity, tile_size: f32) -> bool {
        if self.activated {
            return false;
        }
        let delta = player.center() - self.entity.center();
        let inside = delta.x.abs() <= self.stats.activation_half_width * tile_size
            && delta.y.abs() <= self.stats.activation_half_height * tile_size;
        if inside {
            self.activated = true;
            tracing::debug!(
                id = self.entity.id,
                archetype = ?self.archetype,
                "enemy activated"
            );
        }
        inside
    }

    /// Run one tick of behavior and physics. Inert enemies do nothing.
    pub fn update<R: Rng>(&mut self, player: &mut Entity, ctx: &EnemyTick<'_>, rng: &mut R) {
        self.cooldown = (self.cooldown - ctx.dt).max(0.0);
        self.check_activation(player, ctx.tile_size);
        if !self.activated || !self.is_alive() {
            return;
        }

        match self.behavior {
            EnemyBehavior::DirectPursuit => self.direct_pursuit(player, ctx),
            EnemyBehavior::SnapPursuit => self.snap_pursuit(player, ctx, rng),
            EnemyBehavior::GridPathfinding { .. } => self.grid_pathfinding(player, ctx),
            EnemyBehavior::StationaryMelee => self.stationary_melee(player, ctx),
        }
    }

    fn in_pursuit_range(&self, player: &Entity, tile_size: f32) -> bool {
        let distance = (player.center() - self.entity.center()).length();
        distance <= self.stats.pursuit_range_tiles * tile_size
    }

    fn chase(&mut self, target: Vec2) {
        let dir = (target - self.entity.center()).normalized();
        self.entity.vel = dir * self.entity.params.speed;
        if let Some(facing) = Facing::from_direction(dir.x) {
            self.entity.facing = facing;
        }
    }

    fn strike(&mut self, player: &mut Entity, reach: f32) -> bool {
        if self.cooldown > 0.0 || !player.rect.intersects(&self.entity.rect.widened(reach)) {
            return false;
        }
        player.take_damage(self.stats.contact_damage);
        self.cooldown = self.stats.strike_cooldown;
        true
    }

    fn direct_pursuit(&mut self, player: &mut Entity, ctx: &EnemyTick<'_>) {
        if self.in_pursuit_range(player, ctx.tile_size) {
            self.chase(player.center());
        } else {
            self.entity.vel = Vec2::ZERO;
        }
        self.entity.update(ctx.dt, ctx.grid, ctx.tile_size);

        if self.entity.rect.intersects(&player.rect) {
            player.take_damage(self.entity.hit_points);
            self.entity.hit_points = 0;
            tracing::debug!(id = self.entity.id, "kamikaze detonated");
        }
    }

    fn snap_pursuit<R: Rng>(&mut self, player: &mut Entity, ctx: &EnemyTick<'_>, rng: &mut R) {
        self.entity.vel.x = 0.0;
        self.entity.update(ctx.dt, ctx.grid, ctx.tile_size);

        // Both rolls happen every tick so the random stream does not depend
        // on the outcome of the first.
        let snap = rng.random::<f64>() < self.stats.snap_chance;
        let strike = rng.random::<f64>() < self.stats.strike_chance;
        if snap {
            self.entity.rect.set_center(player.center());
            self.entity.vel = Vec2::ZERO;
            tracing::trace!(id = self.entity.id, "slasher snapped to player");
        }
        if strike && self.entity.rect.intersects(&player.rect) {
            player.take_damage(self.stats.contact_damage);
        }
    }

    /// Chase directly when the player is close and visible; otherwise walk
    /// the A* route, one tile per tick, standing on each tile's floor.
    fn grid_pathfinding(&mut self, player: &mut Entity, ctx: &EnemyTick<'_>) {
        let ts = ctx.tile_size;
        let player_center = player.center();
        let center = self.entity.center();
        let direct = self.in_pursuit_range(player, ts)
            && pathfind::line_of_sight(ctx.grid, center, player_center, ts);

        let mut next_tile = None;
        if let EnemyBehavior::GridPathfinding { route, target } = &mut self.behavior {
            if direct {
                route.clear();
                *target = None;
            } else {
                let goal = TilePos::containing(player_center, ts);
                if *target != Some(goal) {
                    let here = TilePos::containing(center, ts);
                    *route = pathfind::find_path(ctx.grid, here, goal)
                        .unwrap_or_default()
                        .into();
                    *target = Some(goal);
                }
                if ctx.dt > 0.0 {
                    next_tile = route.pop_front();
                }
            }
        }

        if direct {
            self.chase(player_center);
        } else {
            self.entity.vel = Vec2::ZERO;
            if let Some(next) = next_tile {
                let foot = next.floor_center(ts);
                if let Some(facing) = Facing::from_direction(foot.x - center.x) {
                    self.entity.facing = facing;
                }
                let Rect { w, h, .. } = self.entity.rect;
                self.entity.rect = Rect::from_bottom_center(foot.x, foot.y, w, h);
            }
        }

        self.entity.update(ctx.dt, ctx.grid, ts);
        self.strike(player, 0.0);
    }

    fn stationary_melee(&mut self, player: &mut Entity, ctx: &EnemyTick<'_>) {
        self.entity.vel.x = 0.0;
        self.entity.update(ctx.dt, ctx.grid, ctx.tile_size);
        if self.strike(player, self.stats.reach) {
            tracing::trace!(id = self.entity.id, "melee strike");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::PlayerConfig;

    const TS: f32 = 256.0;
    const DT: f32 = 1.0 / 60.0;

    fn hall() -> Grid {
        "
##########
#........#
#........#
##########"
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

    fn kamikaze_at(tile: TilePos) -> Enemy {
        Enemy::spawn(1, Archetype::Kamikaze, tile, ArchetypeStats::kamikaze(), TS)
    }

    fn tick(grid: &Grid) -> EnemyTick<'_> {
        EnemyTick {
            grid,
            tile_size: TS,
            dt: DT,
        }
    }

    #[test]
    fn activation_latches() {
        let mut player = player_at(TilePos::new(2, 2));
        let mut enemy = kamikaze_at(TilePos::new(4, 2));
        assert!(enemy.check_activation(&player, TS));
        assert!(enemy.activated);

        // Moving away never deactivates.
        player.rect.x += 20.0 * TS;
        assert!(!enemy.check_activation(&player, TS));
        assert!(enemy.activated);
    }

    #[test]
    fn outside_window_stays_inert() {
        let grid = hall();
        let mut player = player_at(TilePos::new(1, 2));
        let mut enemy = kamikaze_at(TilePos::new(8, 2));
        let start = enemy.entity.rect;
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..30 {
            enemy.update(&mut player, &tick(&grid), &mut rng);
        }
        assert!(!enemy.activated);
        assert_eq!(enemy.entity.rect, start);
    }

    #[test]
    fn kamikaze_trades_its_hit_points_on_contact() {
        let grid = hall();
        let mut player = player_at(TilePos::new(2, 2));
        let mut enemy = kamikaze_at(TilePos::new(4, 2));
        let mut rng = StdRng::seed_from_u64(1);

        enemy.update(&mut player, &tick(&grid), &mut rng);
        assert!(enemy.activated);

        let own = enemy.entity.hit_points;
        let mut ticks = 1;
        while enemy.is_alive() && ticks < 240 {
            assert!(!enemy.entity.rect.intersects(&player.rect));
            assert_eq!(player.hit_points, 100);
            enemy.update(&mut player, &tick(&grid), &mut rng);
            ticks += 1;
        }
        assert_eq!(enemy.entity.hit_points, 0);
        assert_eq!(player.hit_points, 100 - own);
    }

    #[test]
    fn slasher_snaps_and_strikes() {
        let grid = hall();
        let mut player = player_at(TilePos::new(2, 2));
        let stats = ArchetypeStats {
            snap_chance: 1.0,
            strike_chance: 1.0,
            ..ArchetypeStats::slasher()
        };
        let mut enemy = Enemy::spawn(1, Archetype::Slasher, TilePos::new(4, 2), stats, TS);
        let mut rng = StdRng::seed_from_u64(9);
        enemy.update(&mut player, &tick(&grid), &mut rng);
        assert_eq!(enemy.entity.center(), player.center());
        assert_eq!(player.hit_points, 100 - stats.contact_damage);
    }

    #[test]
    fn slasher_with_zero_chance_never_teleports() {
        let grid = hall();
        let mut player = player_at(TilePos::new(2, 2));
        let stats = ArchetypeStats {
            snap_chance: 0.0,
            strike_chance: 0.0,
            ..ArchetypeStats::slasher()
        };
        let mut enemy = Enemy::spawn(1, Archetype::Slasher, TilePos::new(4, 2), stats, TS);
        let start_x = enemy.entity.rect.x;
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..120 {
            enemy.update(&mut player, &tick(&grid), &mut rng);
        }
        assert!(enemy.activated);
        assert_eq!(enemy.entity.rect.x, start_x);
        assert_eq!(player.hit_points, 100);
    }

    #[test]
    fn runner_paths_around_walls() {
        let grid: Grid = "
#######
#.....#
#####.#
#.....#
#######"
            .parse()
            .unwrap();
        let mut player = player_at(TilePos::new(1, 3));
        let stats = ArchetypeStats {
            activation_half_height: 3.0,
            ..ArchetypeStats::runner()
        };
        let mut enemy = Enemy::spawn(1, Archetype::Runner, TilePos::new(1, 1), stats, TS);
        let mut rng = StdRng::seed_from_u64(3);

        enemy.update(&mut player, &tick(&grid), &mut rng);
        assert!(enemy.activated);
        match &enemy.behavior {
            EnemyBehavior::GridPathfinding { target, route } => {
                assert_eq!(*target, Some(TilePos::new(1, 3)));
                assert!(!route.is_empty());
            },
            other => panic!("unexpected behavior {other:?}"),
        }

        for _ in 0..900 {
            enemy.update(&mut player, &tick(&grid), &mut rng);
            if player.hit_points < 100 {
                break;
            }
        }
        assert_eq!(player.hit_points, 100 - stats.contact_damage);
    }

    #[test]
    fn runner_steps_one_tile_per_tick() {
        let grid: Grid = "
#######
#.....#
#####.#
#.....#
#######"
            .parse()
            .unwrap();
        let mut player = player_at(TilePos::new(1, 3));
        let stats = ArchetypeStats {
            activation_half_height: 3.0,
            ..ArchetypeStats::runner()
        };
        let mut enemy = Enemy::spawn(1, Archetype::Runner, TilePos::new(1, 1), stats, TS);
        let mut rng = StdRng::seed_from_u64(3);

        let expected = [
            TilePos::new(2, 1),
            TilePos::new(3, 1),
            TilePos::new(4, 1),
            TilePos::new(5, 1),
            TilePos::new(5, 2),
            TilePos::new(5, 3),
        ];
        for tile in expected {
            enemy.update(&mut player, &tick(&grid), &mut rng);
            assert_eq!(TilePos::containing(enemy.entity.center(), TS), tile);
            assert_eq!(enemy.entity.rect.bottom(), tile.floor_center(TS).y);
        }
        assert_eq!(enemy.entity.facing, Facing::Right);
    }

    #[test]
    fn runner_holds_still_when_time_is_frozen() {
        let grid = hall();
        let mut player = player_at(TilePos::new(1, 2));
        let stats = ArchetypeStats {
            pursuit_range_tiles: 0.0,
            ..ArchetypeStats::runner()
        };
        let mut enemy = Enemy::spawn(1, Archetype::Runner, TilePos::new(3, 2), stats, TS);
        let start = enemy.entity.rect;
        let frozen = EnemyTick {
            grid: &grid,
            tile_size: TS,
            dt: 0.0,
        };
        enemy.update(&mut player, &frozen, &mut StdRng::seed_from_u64(3));
        assert!(enemy.activated);
        assert_eq!(enemy.entity.rect, start);
    }

    #[test]
    fn behavior_follows_archetype() {
        for archetype in Archetype::ALL {
            assert_eq!(
                EnemyBehavior::for_archetype(archetype).kind(),
                archetype.behavior()
            );
        }
    }

    #[test]
    fn lancer_respects_cooldown() {
        let grid = hall();
        let mut player = player_at(TilePos::new(2, 2));
        let stats = ArchetypeStats::lancer();
        let mut enemy = Enemy::spawn(1, Archetype::Lancer, TilePos::new(2, 2), stats, TS);
        let mut rng = StdRng::seed_from_u64(5);

        enemy.update(&mut player, &tick(&grid), &mut rng);
        assert_eq!(player.hit_points, 100 - stats.contact_damage);
        enemy.update(&mut player, &tick(&grid), &mut rng);
        assert_eq!(player.hit_points, 100 - stats.contact_damage);

        for _ in 0..100 {
            enemy.update(&mut player, &tick(&grid), &mut rng);
        }
        assert_eq!(player.hit_points, 100 - 2 * stats.contact_damage);
        assert_eq!(enemy.entity.vel.x, 0.0);
    }
}
