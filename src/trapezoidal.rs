use tracing::{debug, trace, warn};

use crate::error::ProfileError;
use crate::gear::{validate_shift_table, GearLevel};
use crate::profile::Profile;
use crate::sample::Sample;
use crate::status::Status;

/// Trapezoidal velocity profile generator.
///
/// Holds the active (max velocity, acceleration) pair, the setpoint of the
/// current run and, optionally, a borrowed gear table with a cursor into it.
/// Every call to [`compute`](Self::compute) advances the state by one sample;
/// nothing is allocated after configuration.
///
/// One instance drives one axis. The gear table is read-only and may be shared
/// by several instances.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct TrapezoidalProfile<'a> {
    /// Active velocity limit. Overwritten by gear shifts.
    max_velocity: f64,

    /// Active acceleration magnitude, used for both ramp up and braking.
    /// Overwritten by gear shifts.
    acceleration: f64,

    /// Target displacement, fixed for the life of one run.
    setpoint: f64,

    /// Externally owned gear table, `None` until `configure_shift`.
    shift_levels: Option<&'a [GearLevel]>,

    /// Index of the engaged gear. Always < table length when a table is set.
    shift_current: usize,
}

impl<'a> TrapezoidalProfile<'a> {
    // Largest setpoint magnitude accepted, keeps distance sums finite
    const P_MAX: f64 = 1e30;

    // Relative position tolerance on the setpoint, covers rounding drift of
    // the braking lookahead while decelerating
    const S_EPS: f64 = 1e-9;

    /// Phase conditions in priority order, highest first. The first one that
    /// holds selects the phase; if none hold the axis cruises (`Level`).
    ///
    /// `Done` dominates so a finished run stays finished, and `Decel` dominates
    /// `Accel` so braking is never interrupted by a ramp-up below max velocity.
    const PHASE_PRIORITY: [Status; 3] = [Status::Done, Status::Decel, Status::Accel];

    /// Creates a profile for one run, with no gear table.
    pub fn new(setpoint: f64, max_velocity: f64, acceleration: f64) -> Result<Self, ProfileError> {
        let mut profile = TrapezoidalProfile::default();
        profile.set_setpoint(setpoint)?;
        profile.configure(max_velocity, acceleration)?;
        Ok(profile)
    }

    // -----------------------------------------------------------------
    //  Configuration
    // -----------------------------------------------------------------

    /// Sets the base limits used when no gear table is installed.
    ///
    /// With a table installed this overrides the engaged gear's pair until the
    /// next shift. On error the previous pair is kept.
    pub fn configure(&mut self, max_velocity: f64, acceleration: f64) -> Result<(), ProfileError> {
        if !(max_velocity.is_finite() && max_velocity > 0.0) {
            warn!(max_velocity, "rejected max velocity");
            return Err(ProfileError::InvalidVelocity(max_velocity));
        }
        if !(acceleration.is_finite() && acceleration > 0.0) {
            warn!(acceleration, "rejected acceleration");
            return Err(ProfileError::InvalidAcceleration(acceleration));
        }
        self.max_velocity = max_velocity;
        self.acceleration = acceleration;
        debug!(max_velocity, acceleration, "profile limits configured");
        Ok(())
    }

    /// Sets the target displacement for the run.
    pub fn set_setpoint(&mut self, setpoint: f64) -> Result<(), ProfileError> {
        if !(setpoint.is_finite() && setpoint.abs() < Self::P_MAX) {
            warn!(setpoint, "rejected setpoint");
            return Err(ProfileError::InvalidSetpoint(setpoint));
        }
        self.setpoint = setpoint;
        debug!(setpoint, "profile setpoint configured");
        Ok(())
    }

    /// Installs a gear table and engages level 0.
    ///
    /// The table must outlive the profile; it is never modified. Empty tables
    /// and levels with non-positive limits are rejected and leave the profile
    /// untouched.
    pub fn configure_shift(&mut self, levels: &'a [GearLevel]) -> Result<(), ProfileError> {
        validate_shift_table(levels).inspect_err(|err| warn!(%err, "rejected gear table"))?;
        self.shift_levels = Some(levels);
        self.select_shift(levels, 0);
        debug!(count = levels.len(), "gear table configured");
        Ok(())
    }

    /// Engages gear `level`, copying its pair into the active limits.
    pub fn set_shift(&mut self, level: usize) -> Result<(), ProfileError> {
        let levels = self.shift_levels.ok_or(ProfileError::ShiftNotConfigured)?;
        if level >= levels.len() {
            return Err(ProfileError::ShiftLevelOutOfRange {
                level,
                count: levels.len(),
            });
        }
        self.select_shift(levels, level);
        Ok(())
    }

    // -----------------------------------------------------------------
    //  Getters
    // -----------------------------------------------------------------

    /// Engaged gear index, 0 when no table is installed.
    pub fn current_shift_level(&self) -> usize {
        self.shift_current
    }

    pub fn shift_levels(&self) -> Option<&'a [GearLevel]> {
        self.shift_levels
    }

    pub fn is_shift_configured(&self) -> bool {
        self.shift_levels.is_some()
    }

    /// Active velocity limit.
    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    /// Active acceleration magnitude.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Distance needed to brake from `velocity` to rest at the active acceleration.
    pub fn decel_distance(&self, velocity: f64) -> f64 {
        // t = v/a
        let decel_time = velocity / self.acceleration;
        // s = vt - 0.5at^2
        velocity * decel_time - 0.5 * self.acceleration * decel_time * decel_time
    }

    // -----------------------------------------------------------------
    //  Sample computation
    // -----------------------------------------------------------------

    /// Computes the sample at `time` from `previous` and writes it to `output`.
    ///
    /// `None` for `previous` means the start of a run ([`Sample::zero`]). `time`
    /// must not be earlier than `previous.time`; such calls are rejected and
    /// leave both `output` and the profile untouched.
    ///
    /// A gear shift triggered by the new sample only changes the limits used
    /// by the next call.
    pub fn compute(
        &mut self,
        output: &mut Sample,
        previous: Option<&Sample>,
        time: f64,
    ) -> Result<Status, ProfileError> {
        let last = previous.copied().unwrap_or_else(Sample::zero);
        self.step(output, last, time)
    }

    /// Same as [`compute`](Self::compute) with `sample` acting as both the
    /// previous sample and the output, for drivers rolling a single sample.
    pub fn advance(&mut self, sample: &mut Sample, time: f64) -> Result<Status, ProfileError> {
        let last = *sample;
        self.step(sample, last, time)
    }

    fn step(&mut self, output: &mut Sample, last: Sample, time: f64) -> Result<Status, ProfileError> {
        if !(self.acceleration > 0.0 && self.max_velocity > 0.0) {
            return Err(ProfileError::Unconfigured);
        }
        if !(time >= last.time) {
            warn!(previous = last.time, requested = time, "rejected non-monotonic time");
            return Err(ProfileError::NonMonotonicTime {
                previous: last.time,
                requested: time,
            });
        }

        let (next, status) = self.kinematics(last, time);
        *output = next;

        if status != Status::Level {
            self.shift_for(next.velocity);
        }

        trace!(
            %status,
            time = next.time,
            distance = next.distance,
            velocity = next.velocity,
            "profile sample"
        );
        Ok(status)
    }

    /// Picks the phase for the step starting at `last` and integrates it.
    fn kinematics(&self, last: Sample, time: f64) -> (Sample, Status) {
        let Sample {
            time: l_time,
            distance: l_dist,
            velocity: l_vel,
            ..
        } = last;

        let dt = time - l_time;
        let decel_dist = self.decel_distance(l_vel);
        let accel = self.acceleration;
        let target = self.setpoint - Self::S_EPS * self.setpoint.abs().max(1.0);

        let status = Self::PHASE_PRIORITY
            .into_iter()
            .find(|phase| match phase {
                // Already there: hold.
                Status::Done => l_dist >= target,
                // Braking now reaches or passes the setpoint.
                Status::Decel => l_dist + decel_dist >= target,
                Status::Accel => l_vel < self.max_velocity,
                Status::Level => false,
            })
            .unwrap_or(Status::Level);

        let (distance, velocity, acceleration) = match status {
            Status::Done => (l_dist, 0.0, 0.0),
            Status::Decel => {
                let decel_time = l_vel / accel;
                if l_vel > 0.0 && dt >= decel_time {
                    // Comes to rest within this step: stop at the braking point
                    // instead of reversing.
                    (l_dist + decel_dist, 0.0, -accel)
                } else {
                    // v = u - at
                    // s = s0 + ut - 0.5at^2
                    (
                        l_dist + l_vel * dt - 0.5 * accel * dt * dt,
                        l_vel - accel * dt,
                        -accel,
                    )
                }
            }
            Status::Accel => (
                // s = s0 + ut + 0.5at^2
                l_dist + l_vel * dt + 0.5 * accel * dt * dt,
                // v = u + at
                (l_vel + accel * dt).min(self.max_velocity),
                accel,
            ),
            Status::Level => (l_dist + l_vel * dt, l_vel, 0.0),
        };

        (Sample::new(time, distance, velocity, acceleration), status)
    }

    // -----------------------------------------------------------------
    //  Gear shifting
    // -----------------------------------------------------------------

    /// Moves at most one gear up or down based on the velocity just commanded.
    fn shift_for(&mut self, velocity: f64) {
        let Some(levels) = self.shift_levels else {
            return;
        };
        let current = self.shift_current;

        let upshift = levels
            .get(current + 1)
            .is_some_and(|up| velocity > up.threshold_velocity);
        let downshift = current > 0
            && levels
                .get(current)
                .is_some_and(|level| velocity < level.threshold_velocity);

        let target = if upshift {
            current + 1
        } else if downshift {
            current - 1
        } else {
            return;
        };
        debug!(from = current, to = target, velocity, "gear shift");
        self.select_shift(levels, target);
    }

    fn select_shift(&mut self, levels: &'a [GearLevel], level: usize) {
        if let Some(gear) = levels.get(level) {
            self.shift_current = level;
            self.max_velocity = gear.max_velocity;
            self.acceleration = gear.acceleration;
        }
    }
}

impl Profile for TrapezoidalProfile<'_> {
    fn setpoint(&self) -> f64 {
        self.setpoint
    }

    fn set_setpoint(&mut self, setpoint: f64) -> Result<(), ProfileError> {
        TrapezoidalProfile::set_setpoint(self, setpoint)
    }

    fn calculate(
        &mut self,
        output: &mut Sample,
        previous: Option<&Sample>,
        time: f64,
    ) -> Result<Status, ProfileError> {
        self.compute(output, previous, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn profile<'a>(setpoint: f64) -> TrapezoidalProfile<'a> {
        TrapezoidalProfile::new(setpoint, 10.0, 2.0).unwrap()
    }

    #[test]
    fn default_profile_refuses_to_compute() {
        let mut p = TrapezoidalProfile::default();
        let mut out = Sample::zero();
        assert_eq!(p.current_shift_level(), 0);
        assert_eq!(p.compute(&mut out, None, 0.1), Err(ProfileError::Unconfigured));
    }

    #[test]
    fn configure_rejects_bad_limits_and_keeps_previous() {
        let mut p = profile(100.0);
        assert_eq!(p.configure(10.0, 0.0), Err(ProfileError::InvalidAcceleration(0.0)));
        assert_eq!(p.configure(-1.0, 2.0), Err(ProfileError::InvalidVelocity(-1.0)));
        assert!(p.configure(f64::INFINITY, 2.0).is_err());
        assert_eq!(p.max_velocity(), 10.0);
        assert_eq!(p.acceleration(), 2.0);
        assert!(p.set_setpoint(f64::NAN).is_err());
        assert_eq!(p.setpoint(), 100.0);
    }

    #[test]
    fn decel_distance_is_v_squared_over_two_a() {
        let p = profile(100.0);
        for v in [0.0, 1.0, 3.5, 10.0] {
            assert!((p.decel_distance(v) - v * v / 4.0).abs() < EPS);
        }
    }

    #[test]
    fn first_sample_at_time_zero_is_accel_at_rest() {
        let mut p = profile(100.0);
        let mut out = Sample::new(9.0, 9.0, 9.0, 9.0);
        let status = p.compute(&mut out, None, 0.0).unwrap();
        assert_eq!(status, Status::Accel);
        assert_eq!(out, Sample::new(0.0, 0.0, 0.0, 2.0));
    }

    #[test]
    fn accel_velocity_is_clamped_to_max() {
        let mut p = profile(100.0);
        let prev = Sample::new(1.0, 5.0, 9.9, 2.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 1.1).unwrap(), Status::Accel);
        assert_eq!(out.velocity, 10.0);
        assert!((out.distance - (5.0 + 0.99 + 0.01)).abs() < EPS);
    }

    #[test]
    fn cruises_when_at_max_and_far_from_setpoint() {
        let mut p = profile(100.0);
        let prev = Sample::new(6.0, 30.0, 10.0, 0.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 6.5).unwrap(), Status::Level);
        assert_eq!(out, Sample::new(6.5, 35.0, 10.0, 0.0));
    }

    #[test]
    fn done_dominates_decel_and_accel() {
        // Past the setpoint, below max velocity: every condition holds.
        let mut p = profile(100.0);
        let prev = Sample::new(10.0, 100.5, 0.0, -2.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 10.1).unwrap(), Status::Done);
        assert_eq!(out, Sample::new(10.1, 100.5, 0.0, 0.0));
    }

    #[test]
    fn decel_dominates_accel_below_max_velocity() {
        // 90 + 6^2 / 4 = 99 < 100 is not enough; 92 + 9 = 101 is.
        let mut p = profile(100.0);
        let mut out = Sample::zero();
        let prev = Sample::new(0.0, 90.0, 6.0, 2.0);
        assert_eq!(p.compute(&mut out, Some(&prev), 0.1).unwrap(), Status::Accel);
        let prev = Sample::new(0.0, 92.0, 6.0, 2.0);
        assert_eq!(p.compute(&mut out, Some(&prev), 0.1).unwrap(), Status::Decel);
        assert!((out.velocity - 5.8).abs() < EPS);
        assert!((out.distance - (92.0 + 0.6 - 0.01)).abs() < EPS);
        assert_eq!(out.acceleration, -2.0);
    }

    #[test]
    fn decel_stops_at_braking_point_instead_of_reversing() {
        let mut p = profile(100.0);
        // Braking from 1.0 takes 0.5s and 0.25 of travel; the step is a full second.
        let prev = Sample::new(0.0, 99.8, 1.0, -2.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 1.0).unwrap(), Status::Decel);
        assert_eq!(out.velocity, 0.0);
        assert!((out.distance - 100.05).abs() < EPS);
    }

    #[test]
    fn rejects_time_going_backwards() {
        let mut p = profile(100.0);
        let prev = Sample::new(2.0, 3.0, 2.0, 2.0);
        let mut out = Sample::new(7.0, 7.0, 7.0, 7.0);
        let err = p.compute(&mut out, Some(&prev), 1.5).unwrap_err();
        assert_eq!(
            err,
            ProfileError::NonMonotonicTime {
                previous: 2.0,
                requested: 1.5
            }
        );
        assert_eq!(out, Sample::new(7.0, 7.0, 7.0, 7.0));
        assert!(p.compute(&mut out, Some(&prev), f64::NAN).is_err());
    }

    #[test]
    fn zero_dt_repeats_position() {
        let mut p = profile(100.0);
        let prev = Sample::new(3.0, 9.0, 6.0, 2.0);
        let mut out = Sample::zero();
        p.compute(&mut out, Some(&prev), 3.0).unwrap();
        assert_eq!(out.distance, 9.0);
        assert_eq!(out.velocity, 6.0);
    }

    #[test]
    fn advance_matches_compute_with_separate_storage() {
        let mut rolling = TrapezoidalProfile::new(20.0, 4.0, 1.5).unwrap();
        let mut split = rolling;
        let mut sample = Sample::zero();
        let mut prev = Sample::zero();
        for i in 0..200 {
            let t = i as f64 * 0.05;
            let mut out = Sample::zero();
            let a = rolling.advance(&mut sample, t).unwrap();
            let b = split.compute(&mut out, Some(&prev), t).unwrap();
            assert_eq!(a, b);
            assert_eq!(sample, out);
            prev = out;
        }
    }

    #[test]
    fn configure_shift_engages_level_zero() {
        let table = [GearLevel::new(5.0, 1.0, 0.0), GearLevel::new(10.0, 2.0, 5.0)];
        let mut p = profile(100.0);
        assert!(!p.is_shift_configured());
        p.configure_shift(&table).unwrap();
        assert!(p.is_shift_configured());
        assert_eq!(p.current_shift_level(), 0);
        assert_eq!(p.max_velocity(), 5.0);
        assert_eq!(p.acceleration(), 1.0);
        assert_eq!(p.shift_levels().map(<[GearLevel]>::len), Some(2));
    }

    #[test]
    fn configure_shift_rejects_empty_table() {
        let mut p = profile(100.0);
        assert_eq!(p.configure_shift(&[]), Err(ProfileError::EmptyShiftTable));
        assert!(!p.is_shift_configured());
        assert_eq!(p.max_velocity(), 10.0);
    }

    #[test]
    fn set_shift_is_bounds_checked() {
        let table = [GearLevel::new(5.0, 1.0, 0.0), GearLevel::new(10.0, 2.0, 5.0)];
        let mut p = profile(100.0);
        assert_eq!(p.set_shift(0), Err(ProfileError::ShiftNotConfigured));
        p.configure_shift(&table).unwrap();
        assert_eq!(
            p.set_shift(2),
            Err(ProfileError::ShiftLevelOutOfRange { level: 2, count: 2 })
        );
        assert_eq!(p.current_shift_level(), 0);
        p.set_shift(1).unwrap();
        assert_eq!(p.current_shift_level(), 1);
        assert_eq!(p.max_velocity(), 10.0);
        assert_eq!(p.acceleration(), 2.0);
    }

    #[test]
    fn no_shift_while_cruising() {
        let table = [GearLevel::new(5.0, 1.0, 0.0), GearLevel::new(10.0, 2.0, 4.0)];
        let mut p = profile(1000.0);
        p.configure_shift(&table).unwrap();
        // Cruising at 5 is above the upshift threshold, but Level never shifts.
        let prev = Sample::new(10.0, 20.0, 5.0, 0.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 10.1).unwrap(), Status::Level);
        assert_eq!(p.current_shift_level(), 0);
    }

    #[test]
    fn shift_applies_to_next_call_only() {
        let table = [GearLevel::new(5.0, 1.0, 0.0), GearLevel::new(10.0, 2.0, 4.0)];
        let mut p = profile(1000.0);
        p.configure_shift(&table).unwrap();
        let prev = Sample::new(0.0, 0.0, 3.95, 1.0);
        let mut out = Sample::zero();
        assert_eq!(p.compute(&mut out, Some(&prev), 0.1).unwrap(), Status::Accel);
        // Sample used level 0's acceleration, the shift lands afterwards.
        assert_eq!(out.acceleration, 1.0);
        assert!((out.velocity - 4.05).abs() < EPS);
        assert_eq!(p.current_shift_level(), 1);
        assert_eq!(p.acceleration(), 2.0);
    }

    #[test]
    fn works_through_profile_trait() {
        fn drive(profile: &mut impl Profile, dt: f64) -> Sample {
            let mut sample = Sample::zero();
            let mut time = 0.0;
            loop {
                let prev = sample;
                if profile.calculate(&mut sample, Some(&prev), time).unwrap().is_done() {
                    return sample;
                }
                time += dt;
            }
        }
        let mut p = profile(10.0);
        let end = drive(&mut p, 0.01);
        assert!(end.distance >= 10.0);
        assert_eq!(Profile::setpoint(&p), 10.0);
    }
}
