use thiserror::Error;

/// Errors raised by profile configuration and by calls that break the
/// per-step calling contract.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProfileError {
    /// Max velocity must be finite and positive.
    #[error("invalid max velocity {0}: must be finite and positive")]
    InvalidVelocity(f64),
    /// Acceleration must be finite and positive; zero would divide by zero in the braking lookahead.
    #[error("invalid acceleration {0}: must be finite and positive")]
    InvalidAcceleration(f64),
    /// Setpoint must be finite and within the representable travel range.
    #[error("invalid setpoint {0}")]
    InvalidSetpoint(f64),
    /// A gear table needs at least one level.
    #[error("gear table is empty")]
    EmptyShiftTable,
    /// One entry of a gear table failed validation.
    #[error("gear level {index} is invalid: {reason}")]
    InvalidShiftLevel { index: usize, reason: &'static str },
    /// A gear operation was requested before `configure_shift`.
    #[error("gear shifting is not configured")]
    ShiftNotConfigured,
    /// Requested gear index is outside the installed table.
    #[error("gear level {level} out of range for a table of {count}")]
    ShiftLevelOutOfRange { level: usize, count: usize },
    /// Requested time is earlier than the previous sample.
    #[error("time went backwards: previous sample at {previous}, requested {requested}")]
    NonMonotonicTime { previous: f64, requested: f64 },
    /// The generator has no valid velocity/acceleration pair yet.
    #[error("profile is not configured")]
    Unconfigured,
}
