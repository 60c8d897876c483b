//! # trapezoidal_motion
//!
//! A small library for generating trapezoidal velocity motion profiles in Rust,
//! one sample at a time.
//!
//! This library provides the following modules:
//! - `sample` for the (time, distance, velocity, acceleration) point emitted each step.
//! - `status` for the phase tag returned with every sample.
//! - `gear` for velocity-scheduled (max velocity, acceleration) levels.
//! - `profile` for the trait a per-step driver loop programs against.
//! - `trapezoidal` for the generator itself.
//! - `error` for configuration and call-contract errors.
//!
//! The generator does not own a timeline. A driver calls
//! [`TrapezoidalProfile::compute`] (or [`TrapezoidalProfile::advance`] for a
//! single rolling sample) once per control tick with non-decreasing time until
//! it reports [`Status::Done`].

pub mod error;
pub mod gear;
pub mod profile;
pub mod sample;
pub mod status;
pub mod trapezoidal;

// Re-export main structs for convenience:
pub use error::*;
pub use gear::*;
pub use profile::*;
pub use sample::*;
pub use status::*;
pub use trapezoidal::*;
