pub mod archetype;
pub mod behavior;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod grid;
pub mod level_gen;
pub mod pathfind;
pub mod replay;
pub mod session;

pub use archetype::{Archetype, ArchetypeSet, LevelPlan};
pub use config::DungeonConfig;
pub use error::{GenerationError, GridParseError, ReplayError, SessionError};
pub use grid::{Cell, Grid, Marker, TilePos};
pub use level_gen::{Generated, LevelGenerator};
pub use replay::{Replay, ReplaySummary};
pub use session::{EnemyView, LevelSession, SessionSnapshot};
