use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;

/// Tile edge length in world units (pixels).
pub const TILE_SIZE: f32 = 256.0;
/// Default square grid side.
pub const GRID_SIZE: usize = 17;
/// Host tick rate the tuning below assumes.
pub const TICK_RATE_HZ: f32 = 60.0;

/// Level generator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    /// Whole carve-validate-place cycles before giving up.
    pub max_carve_attempts: u32,
    /// Random samples per enemy before the layout is discarded.
    pub max_placement_attempts: u32,
    pub place_exit: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: GRID_SIZE,
            height: GRID_SIZE,
            max_carve_attempts: 64,
            max_placement_attempts: 256,
            place_exit: true,
        }
    }
}

/// Player body and combat tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    /// Horizontal speed; also the jump impulse magnitude.
    pub speed: f32,
    /// Added to vertical velocity on every airborne tick.
    pub gravity: f32,
    pub max_jumps: u8,
    pub hit_points: i32,
    pub attack_damage: i32,
    pub attack_reach: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 128.0,
            speed: 1024.0,
            gravity: 16.0,
            max_jumps: 2,
            hit_points: 100,
            attack_damage: 10,
            attack_reach: 128.0,
        }
    }
}

/// Per-archetype body and behavior tuning. Fields a behavior does not use
/// are ignored for that archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeStats {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub gravity: f32,
    pub hit_points: i32,
    pub contact_damage: i32,
    /// Activation window half-width, in tiles, around the enemy center.
    pub activation_half_width: f32,
    /// Activation window half-height, in tiles.
    pub activation_half_height: f32,
    /// Direct pursuit only happens within this many tiles of the player.
    pub pursuit_range_tiles: f32,
    /// Per-tick chance of teleporting onto the player (snap pursuit).
    pub snap_chance: f64,
    /// Per-tick chance of landing a contact hit while overlapping (snap pursuit).
    pub strike_chance: f64,
    /// Horizontal reach added to both sides of the body for melee strikes.
    pub reach: f32,
    /// Seconds between contact strikes.
    pub strike_cooldown: f32,
}

impl Default for ArchetypeStats {
    fn default() -> Self {
        Self {
            width: 48.0,
            height: 96.0,
            speed: 512.0,
            gravity: 16.0,
            hit_points: 20,
            contact_damage: 10,
            activation_half_width: 3.0,
            activation_half_height: 1.0,
            pursuit_range_tiles: 6.0,
            snap_chance: 0.025,
            strike_chance: 0.025,
            reach: 0.0,
            strike_cooldown: 1.0,
        }
    }
}

impl ArchetypeStats {
    pub fn kamikaze() -> Self {
        Self {
            width: 32.0,
            height: 32.0,
            speed: 960.0,
            gravity: 0.0,
            hit_points: 20,
            ..Default::default()
        }
    }

    pub fn runner() -> Self {
        Self {
            width: 96.0,
            height: 232.0,
            speed: 640.0,
            gravity: 0.0,
            hit_points: 40,
            contact_damage: 15,
            pursuit_range_tiles: 4.0,
            ..Default::default()
        }
    }

    pub fn slasher() -> Self {
        Self {
            hit_points: 30,
            ..Default::default()
        }
    }

    pub fn lancer() -> Self {
        Self {
            hit_points: 30,
            contact_damage: 20,
            reach: 96.0,
            strike_cooldown: 1.5,
            ..Default::default()
        }
    }

    pub fn scarecrow() -> Self {
        Self {
            width: 32.0,
            height: 32.0,
            hit_points: 10,
            contact_damage: 5,
            reach: 32.0,
            strike_cooldown: 0.75,
            ..Default::default()
        }
    }

    fn sanitized(mut self) -> Self {
        self.width = self.width.max(1.0);
        self.height = self.height.max(1.0);
        self.speed = self.speed.max(0.0);
        self.snap_chance = self.snap_chance.clamp(0.0, 1.0);
        self.strike_chance = self.strike_chance.clamp(0.0, 1.0);
        self.reach = self.reach.max(0.0);
        self.strike_cooldown = self.strike_cooldown.max(0.0);
        self
    }
}

/// Stats table keyed by archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTable {
    pub kamikaze: ArchetypeStats,
    pub runner: ArchetypeStats,
    pub slasher: ArchetypeStats,
    pub lancer: ArchetypeStats,
    pub scarecrow: ArchetypeStats,
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            kamikaze: ArchetypeStats::kamikaze(),
            runner: ArchetypeStats::runner(),
            slasher: ArchetypeStats::slasher(),
            lancer: ArchetypeStats::lancer(),
            scarecrow: ArchetypeStats::scarecrow(),
        }
    }
}

impl ArchetypeTable {
    pub fn get(&self, archetype: Archetype) -> &ArchetypeStats {
        match archetype {
            Archetype::Kamikaze => &self.kamikaze,
            Archetype::Runner => &self.runner,
            Archetype::Slasher => &self.slasher,
            Archetype::Lancer => &self.lancer,
            Archetype::Scarecrow => &self.scarecrow,
        }
    }

    pub fn get_mut(&mut self, archetype: Archetype) -> &mut ArchetypeStats {
        match archetype {
            Archetype::Kamikaze => &mut self.kamikaze,
            Archetype::Runner => &mut self.runner,
            Archetype::Slasher => &mut self.slasher,
            Archetype::Lancer => &mut self.lancer,
            Archetype::Scarecrow => &mut self.scarecrow,
        }
    }
}

/// Top-level dungeon configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    pub tile_size: f32,
    pub tick_rate_hz: f32,
    /// Seed for in-session randomness. `None` draws from OS entropy.
    pub session_seed: Option<u64>,
    pub generator: GeneratorConfig,
    pub player: PlayerConfig,
    pub archetypes: ArchetypeTable,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            tick_rate_hz: TICK_RATE_HZ,
            session_seed: None,
            generator: GeneratorConfig::default(),
            player: PlayerConfig::default(),
            archetypes: ArchetypeTable::default(),
        }
    }
}

impl DungeonConfig {
    /// Load config from the file named by `UNDERCROFT_CONFIG`, then
    /// `config/undercroft.toml`. Falls back to defaults if neither exists or
    /// parses.
    pub fn load() -> Self {
        let path = std::env::var("UNDERCROFT_CONFIG")
            .unwrap_or_else(|_| "config/undercroft.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                DungeonConfig::default()
            }),
            Err(_) => DungeonConfig::default(),
        }
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<DungeonConfig>(content).map(DungeonConfig::sanitized)
    }

    /// Copy with out-of-range values pulled back into range.
    pub fn sanitized(mut self) -> Self {
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            self.tile_size = TILE_SIZE;
        }
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            self.tick_rate_hz = TICK_RATE_HZ;
        }
        self.generator.max_carve_attempts = self.generator.max_carve_attempts.max(1);
        self.generator.max_placement_attempts = self.generator.max_placement_attempts.max(1);
        self.player.width = self.player.width.max(1.0);
        self.player.height = self.player.height.max(1.0);
        self.player.speed = self.player.speed.max(0.0);
        self.player.attack_reach = self.player.attack_reach.max(0.0);
        for archetype in Archetype::ALL {
            let stats = self.archetypes.get_mut(archetype);
            *stats = stats.sanitized();
        }
        self
    }
}
