pub mod geometry;
pub mod intent;
pub mod simulation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::intent::Intent;
    use crate::simulation::{TickOutcome, TickSimulation};

    /// Fixed frame delta used by tests (60 Hz).
    pub const TEST_DT: f32 = 1.0 / 60.0;

    /// Run up to `n` ticks with the same intent, stopping at the first
    /// terminal outcome. Returns the last outcome and the ticks executed.
    pub fn run_ticks(
        sim: &mut dyn TickSimulation,
        n: usize,
        dt: f32,
        intent: &Intent,
    ) -> (TickOutcome, usize) {
        let mut outcome = TickOutcome::Continue;
        for i in 0..n {
            outcome = sim.advance(dt, intent);
            if outcome.is_terminal() {
                return (outcome, i + 1);
            }
        }
        (outcome, n)
    }

    /// Run one tick per intent in order, returning every outcome.
    pub fn run_script(
        sim: &mut dyn TickSimulation,
        dt: f32,
        intents: &[Intent],
    ) -> Vec<TickOutcome> {
        intents.iter().map(|i| sim.advance(dt, i)).collect()
    }

    // ================================================================
    // Simulation Trait Contract Tests
    // ================================================================
    // Every TickSimulation implementation should pass these. Crates call
    // them from their own test modules with a freshly built simulation.

    /// pause() must make advance() a no-op returning Continue; resume()
    /// must restore normal ticking.
    pub fn contract_pause_freezes(sim: &mut dyn TickSimulation) {
        sim.pause();
        assert!(sim.is_paused(), "is_paused() must report pause()");
        let outcome = sim.advance(TEST_DT, &Intent::walk(1));
        assert_eq!(outcome, TickOutcome::Continue);
        sim.resume();
        assert!(!sim.is_paused(), "resume() must clear the pause flag");
    }

    /// Once a terminal outcome is reported, later ticks must repeat it.
    pub fn contract_terminal_outcome_latches(sim: &mut dyn TickSimulation, max_ticks: usize) {
        let (outcome, _) = run_ticks(sim, max_ticks, TEST_DT, &Intent::default());
        if outcome.is_terminal() {
            assert_eq!(sim.finished(), Some(outcome));
            assert_eq!(sim.advance(TEST_DT, &Intent::walk(1)), outcome);
        } else {
            assert_eq!(sim.finished(), None);
        }
    }
}
