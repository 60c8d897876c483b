use crate::error::ProfileError;
use crate::sample::Sample;
use crate::status::Status;

/// A motion profile computed incrementally, one sample per call.
///
/// The driver owns the timeline: it picks the sample times, keeps the previous
/// sample, and stops calling once [`Status::Done`] comes back. Passing `None`
/// as `previous` starts a run from [`Sample::zero`].
pub trait Profile {
    /// Target displacement of the current run.
    fn setpoint(&self) -> f64;

    fn set_setpoint(&mut self, setpoint: f64) -> Result<(), ProfileError>;

    /// Computes the sample at `time` into `output`.
    fn calculate(
        &mut self,
        output: &mut Sample,
        previous: Option<&Sample>,
        time: f64,
    ) -> Result<Status, ProfileError>;
}
