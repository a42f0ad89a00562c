use serde::{Deserialize, Serialize};

use undercroft_core::intent::Intent;
use undercroft_core::simulation::TickOutcome;

use crate::archetype::LevelPlan;
use crate::config::DungeonConfig;
use crate::error::ReplayError;
use crate::level_gen::LevelGenerator;
use crate::session::{LevelSession, SessionSnapshot};

/// Everything needed to reproduce a play-through: the level inputs, both
/// seeds, and one intent per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub level: u32,
    pub generator_seed: u64,
    pub session_seed: u64,
    pub dt: f32,
    pub config: DungeonConfig,
    pub intents: Vec<Intent>,
}

/// How a replay ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub outcome: TickOutcome,
    /// Intents consumed, including the one that ended the level.
    pub ticks: usize,
    pub snapshot: SessionSnapshot,
}

impl Replay {
    /// Empty recording at the config's tick rate.
    pub fn new(level: u32, generator_seed: u64, session_seed: u64, config: DungeonConfig) -> Self {
        let dt = 1.0 / config.tick_rate_hz;
        Self {
            level,
            generator_seed,
            session_seed,
            dt,
            config,
            intents: Vec::new(),
        }
    }

    pub fn record(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Regenerate the level and start a fresh session for it.
    pub fn build_session(&self) -> Result<LevelSession, ReplayError> {
        let generator = LevelGenerator::new(self.config.generator.clone());
        let grid = generator.generate(
            self.config.generator.width,
            self.config.generator.height,
            &LevelPlan::for_level(self.level),
            Some(self.generator_seed),
        )?;
        Ok(LevelSession::with_seed(grid, &self.config, self.session_seed)?)
    }

    /// Feed the recorded intents, stopping at the first terminal outcome.
    pub fn play(&self) -> Result<ReplaySummary, ReplayError> {
        let mut session = self.build_session()?;
        let mut outcome = TickOutcome::Continue;
        let mut ticks = 0;
        for intent in &self.intents {
            outcome = session.advance(self.dt, intent);
            ticks += 1;
            if outcome.is_terminal() {
                break;
            }
        }
        tracing::debug!(ticks, ?outcome, "replay finished");
        Ok(ReplaySummary {
            outcome,
            ticks,
            snapshot: session.snapshot(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ReplayError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> Replay {
        let mut replay = Replay::new(1, 99, 5, DungeonConfig::default());
        for i in 0..180 {
            replay.record(Intent {
                move_dir: if i < 90 { 1 } else { -1 },
                jump: i % 45 == 0,
                attack: i % 10 < 5,
            });
        }
        replay
    }

    #[test]
    fn encoded_replay_decodes_identically() {
        let replay = recording();
        let bytes = replay.encode().unwrap();
        assert_eq!(Replay::decode(&bytes).unwrap(), replay);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(
            Replay::decode(&[0xc1, 0x00, 0xff]),
            Err(ReplayError::Decode(_))
        ));
    }

    #[test]
    fn bad_dimensions_surface_as_generation_errors() {
        let mut replay = recording();
        replay.config.generator.width = 3;
        assert!(matches!(replay.play(), Err(ReplayError::Generation(_))));
    }

    #[test]
    fn dt_follows_tick_rate() {
        let mut cfg = DungeonConfig::default();
        cfg.tick_rate_hz = 30.0;
        let replay = Replay::new(0, 0, 0, cfg);
        assert_eq!(replay.dt, 1.0 / 30.0);
    }
}
