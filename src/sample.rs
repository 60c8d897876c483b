use serde::{Deserialize, Serialize};

/// One commanded point on the trajectory.
///
/// Units are whatever the caller uses for the setpoint and limits; nothing is
/// converted internally.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub distance: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

impl Sample {
    /// Creates a new Sample.
    pub fn new(time: f64, distance: f64, velocity: f64, acceleration: f64) -> Self {
        Self {
            time,
            distance,
            velocity,
            acceleration,
        }
    }

    /// The state assumed before the first call of a run: at rest at the origin, time 0.
    pub const fn zero() -> Self {
        Self {
            time: 0.0,
            distance: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
        }
    }
}
