use serde::{Deserialize, Serialize};

/// Steering command produced by a decision policy each tick.
///
/// `turn` is in `[-1, 1]` (fraction of the maximum turn rate, positive turns
/// counter-clockwise in screen space); `speed` is in `[0, 1]` (fraction of the
/// fish's genetic top speed).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub turn: f64,
    pub speed: f64,
}

impl Decision {
    #[must_use]
    pub fn new(turn: f64, speed: f64) -> Self {
        Self { turn, speed }.clamped()
    }

    /// Clamps both components into their valid ranges, NaN mapped to neutral.
    #[must_use]
    pub fn clamped(self) -> Self {
        let turn = if self.turn.is_nan() {
            0.0
        } else {
            self.turn.clamp(-1.0, 1.0)
        };
        let speed = if self.speed.is_nan() {
            0.0
        } else {
            self.speed.clamp(0.0, 1.0)
        };
        Self { turn, speed }
    }
}

/// A food pellet floating in the tank.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub x: f64,
    pub y: f64,
}

impl FoodItem {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Read-only per-fish view exported to renderers and charts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FishSnapshot {
    pub id: u64,
    pub color: f64,
    pub speed: f64,
    pub size: f64,
    pub mass_grams: f64,
    pub energy: f64,
    pub metabolism: f64,
    pub fitness: f64,
    pub neural: bool,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    /// Segment centres and radii from head to tail.
    pub segments: Vec<(f64, f64, f64)>,
}
