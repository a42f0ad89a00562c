use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// Result of advancing a level by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Continue,
    PlayerDied,
    ExitReached,
}

impl TickOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TickOutcome::Continue)
    }
}

/// Core trait a host game loop drives once per frame.
///
/// The host owns the display surface and input polling; the simulation
/// only consumes an [`Intent`] and reports whether the level ended.
pub trait TickSimulation {
    /// Advance by `dt` seconds with the given player intent.
    fn advance(&mut self, dt: f32, intent: &Intent) -> TickOutcome;

    /// Simulation tick rate in Hz the host should aim for.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    /// Freeze the simulation (menu overlay, focus loss).
    fn pause(&mut self);

    /// Resume after a pause.
    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Terminal outcome once reached, `None` while the level is still running.
    fn finished(&self) -> Option<TickOutcome>;
}
