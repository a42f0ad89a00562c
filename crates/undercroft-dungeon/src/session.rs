use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use undercroft_core::geometry::{Facing, Rect, Vec2};
use undercroft_core::intent::{Intent, sanitize_dt};
use undercroft_core::simulation::{TickOutcome, TickSimulation};

use crate::archetype::Archetype;
use crate::behavior::{Enemy, EnemyTick};
use crate::config::DungeonConfig;
use crate::entity::{BodyParams, Entity, EntityId};
use crate::error::SessionError;
use crate::grid::{Cell, Grid, TilePos};

/// Render-facing view of one live enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub rect: Rect,
    pub archetype: Archetype,
    pub hit_points: i32,
    pub activated: bool,
}

impl From<&Enemy> for EnemyView {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id(),
            rect: enemy.entity.rect,
            archetype: enemy.archetype,
            hit_points: enemy.entity.hit_points,
            activated: enemy.activated,
        }
    }
}

/// Serializable snapshot of everything a renderer needs after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub player: Rect,
    pub player_velocity: Vec2,
    pub player_hit_points: i32,
    pub enemies: Vec<EnemyView>,
    pub outcome: Option<TickOutcome>,
}

/// One level in play: the grid, the player, and the live enemies.
pub struct LevelSession {
    grid: Grid,
    config: DungeonConfig,
    player: Entity,
    enemies: Vec<Enemy>,
    exit: Option<TilePos>,
    rng: StdRng,
    /// Attack button state on the previous tick; attacks fire on the
    /// rising edge only.
    attack_held: bool,
    paused: bool,
    outcome: Option<TickOutcome>,
    tick: u64,
}

impl LevelSession {
    /// Build a session from a grid's markers. In-session randomness is
    /// seeded from `config.session_seed`, or OS entropy when unset.
    pub fn new(grid: Grid, config: &DungeonConfig) -> Result<Self, SessionError> {
        let rng = match config.session_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(grid, config, rng)
    }

    pub fn with_seed(grid: Grid, config: &DungeonConfig, seed: u64) -> Result<Self, SessionError> {
        Self::with_rng(grid, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(grid: Grid, config: &DungeonConfig, rng: StdRng) -> Result<Self, SessionError> {
        let config = config.clone().sanitized();
        let ts = config.tile_size;
        let spawn = grid.player_spawn().ok_or(SessionError::MissingPlayerSpawn)?;

        let pc = &config.player;
        let player = Entity::spawn_at(
            0,
            spawn,
            Vec2::new(pc.width, pc.height),
            pc.hit_points,
            BodyParams::from(pc),
            ts,
        );

        let enemies: Vec<Enemy> = grid
            .enemy_spawns()
            .zip(1..)
            .map(|((tile, archetype), id)| {
                Enemy::spawn(id, archetype, tile, *config.archetypes.get(archetype), ts)
            })
            .collect();
        let exit = grid.exit();

        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            enemies = enemies.len(),
            has_exit = exit.is_some(),
            "level session started"
        );

        Ok(Self {
            grid,
            config,
            player,
            enemies,
            exit,
            rng,
            attack_held: false,
            paused: false,
            outcome: None,
            tick: 0,
        })
    }

    /// Advance one tick: player input and physics, the player's attack,
    /// every enemy, dead-enemy removal, then the terminal checks.
    pub fn advance(&mut self, dt: f32, intent: &Intent) -> TickOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        if self.paused {
            return TickOutcome::Continue;
        }

        let dt = sanitize_dt(dt);
        let intent = intent.sanitized();
        let ts = self.config.tile_size;
        self.tick += 1;

        self.player.move_horizontal(f32::from(intent.move_dir));
        if intent.jump {
            self.player.jump();
        }
        self.player.update(dt, &self.grid, ts);

        if intent.attack && !self.attack_held {
            self.player_attack();
        }
        self.attack_held = intent.attack;

        let ctx = EnemyTick {
            grid: &self.grid,
            tile_size: ts,
            dt,
        };
        for enemy in &mut self.enemies {
            enemy.update(&mut self.player, &ctx, &mut self.rng);
        }
        self.enemies.retain(|enemy| {
            if !enemy.is_alive() {
                tracing::debug!(id = enemy.id(), archetype = ?enemy.archetype, "enemy defeated");
            }
            enemy.is_alive()
        });

        let outcome = if !self.player.is_alive() {
            TickOutcome::PlayerDied
        } else if self
            .exit_rect()
            .is_some_and(|exit| exit.intersects(&self.player.rect))
        {
            TickOutcome::ExitReached
        } else {
            TickOutcome::Continue
        };

        if outcome.is_terminal() {
            tracing::debug!(tick = self.tick, ?outcome, "level finished");
            self.outcome = Some(outcome);
        } else {
            tracing::trace!(
                tick = self.tick,
                x = self.player.rect.x,
                y = self.player.rect.y,
                "tick"
            );
        }
        outcome
    }

    /// Hit box in front of the player, `attack_reach` wide.
    pub fn attack_box(&self) -> Rect {
        let body = self.player.rect;
        let reach = self.config.player.attack_reach;
        let x = match self.player.facing {
            Facing::Right => body.right(),
            Facing::Left => body.left() - reach,
        };
        Rect::new(x, body.top(), reach, body.h)
    }

    fn player_attack(&mut self) {
        let hit_box = self.attack_box();
        let damage = self.config.player.attack_damage;
        for enemy in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            if enemy.entity.rect.intersects(&hit_box) {
                enemy.entity.take_damage(damage);
                tracing::trace!(id = enemy.id(), hp = enemy.entity.hit_points, "enemy hit");
            }
        }
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn player_rect(&self) -> Rect {
        self.player.rect
    }

    pub fn enemies(&self) -> impl Iterator<Item = EnemyView> + '_ {
        self.enemies.iter().map(EnemyView::from)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, pos: TilePos) -> Option<Cell> {
        self.grid.cell(pos)
    }

    pub fn exit_rect(&self) -> Option<Rect> {
        self.exit.map(|tile| tile.rect(self.config.tile_size))
    }

    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    /// Ticks simulated so far (paused and post-terminal calls excluded).
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tick: self.tick,
            player: self.player.rect,
            player_velocity: self.player.vel,
            player_hit_points: self.player.hit_points,
            enemies: self.enemies().collect(),
            outcome: self.outcome,
        }
    }
}

impl TickSimulation for LevelSession {
    fn advance(&mut self, dt: f32, intent: &Intent) -> TickOutcome {
        LevelSession::advance(self, dt, intent)
    }

    fn tick_rate(&self) -> f32 {
        self.config.tick_rate_hz
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn finished(&self) -> Option<TickOutcome> {
        self.outcome
    }
}
