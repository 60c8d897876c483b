use std::fmt;

use serde::{Deserialize, Serialize};

/// Which segment of the trapezoid produced a sample.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Cruising at the active max velocity.
    #[default]
    Level,
    /// Setpoint reached, axis held at rest.
    Done,
    /// Braking toward the setpoint.
    Decel,
    /// Ramping up toward the active max velocity.
    Accel,
}

impl Status {
    /// True once the run has finished; a driver stops calling after this.
    pub fn is_done(self) -> bool {
        self == Status::Done
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Level => "level",
            Status::Done => "done",
            Status::Decel => "decel",
            Status::Accel => "accel",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_level() {
        assert_eq!(Status::default(), Status::Level);
        assert!(!Status::default().is_done());
        assert!(Status::Done.is_done());
    }

    #[test]
    fn display_names() {
        assert_eq!(Status::Accel.to_string(), "accel");
        assert_eq!(Status::Decel.to_string(), "decel");
        assert_eq!(Status::Level.to_string(), "level");
        assert_eq!(Status::Done.to_string(), "done");
    }
}
