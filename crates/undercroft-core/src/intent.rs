use serde::{Deserialize, Serialize};

/// Input-derived intent for the player for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// -1 (left), 0, +1 (right). Out-of-range values are clamped.
    pub move_dir: i8,
    /// Jump request for this tick.
    pub jump: bool,
    /// Attack button state; the session acts on the rising edge.
    pub attack: bool,
}

impl Intent {
    pub fn walk(move_dir: i8) -> Self {
        Self {
            move_dir,
            ..Default::default()
        }
    }

    /// Copy with `move_dir` clamped into {-1, 0, 1}. Never rejects input.
    pub fn sanitized(&self) -> Self {
        Self {
            move_dir: self.move_dir.clamp(-1, 1),
            ..*self
        }
    }
}

/// Clamp a frame delta to a finite, non-negative value.
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
