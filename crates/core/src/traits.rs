use crate::models::ControlParams;
use std::sync::Arc;

/// Supplier of control-parameter snapshots (automation, UI, host parameter tree)
///
/// Implementations are read from the audio thread once per block, so
/// `snapshot` must be wait-free: no locks, no allocation.
pub trait ParameterSource: Send + Sync {
    /// Read the current value of every parameter
    fn snapshot(&self) -> ControlParams;
}

/// Fixed parameters, useful for offline rendering and tests
impl ParameterSource for ControlParams {
    fn snapshot(&self) -> ControlParams {
        *self
    }
}

impl<T: ParameterSource + ?Sized> ParameterSource for Arc<T> {
    fn snapshot(&self) -> ControlParams {
        (**self).snapshot()
    }
}
