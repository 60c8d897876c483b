use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// One entry of a gear table: an alternate (max velocity, acceleration) pair,
/// engaged once the commanded velocity rises above `threshold_velocity`.
///
/// Tables are ordered by increasing capability, index 0 being the lowest range.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GearLevel {
    pub max_velocity: f64,
    pub acceleration: f64,
    pub threshold_velocity: f64,
}

impl GearLevel {
    /// Creates a new GearLevel.
    pub fn new(max_velocity: f64, acceleration: f64, threshold_velocity: f64) -> Self {
        Self {
            max_velocity,
            acceleration,
            threshold_velocity,
        }
    }

    /// Checks that this level can be engaged. `index` is only used for the error.
    pub fn validate(&self, index: usize) -> Result<(), ProfileError> {
        let reason = if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            "max velocity must be finite and positive"
        } else if !(self.acceleration.is_finite() && self.acceleration > 0.0) {
            "acceleration must be finite and positive"
        } else if !self.threshold_velocity.is_finite() {
            "threshold velocity must be finite"
        } else {
            return Ok(());
        };
        Err(ProfileError::InvalidShiftLevel { index, reason })
    }
}

/// Validates a whole table before it is installed.
///
/// Threshold ordering is not enforced: a single threshold per boundary has no
/// hysteresis, so callers choosing overlapping ranges get shift oscillation.
pub fn validate_shift_table(levels: &[GearLevel]) -> Result<(), ProfileError> {
    if levels.is_empty() {
        return Err(ProfileError::EmptyShiftTable);
    }
    levels
        .iter()
        .enumerate()
        .try_for_each(|(index, level)| level.validate(index))
}
