/// Fence trait - GPU to CPU completion signal for one submission

use std::time::Duration;
use crate::error::Result;

/// Completion signal returned by `GraphicsDevice::submit`
///
/// Signals once every command of the submission has finished executing.
/// Fences of different submissions carry no ordering guarantee relative to
/// each other: wait on the fence of the work you depend on.
pub trait Fence: Send + Sync {
    /// Non-blocking completion query
    fn is_signaled(&self) -> Result<bool>;

    /// Block until the fence signals or `timeout` elapses
    ///
    /// Returns `Ok(true)` when signaled, `Ok(false)` on timeout.
    fn wait(&self, timeout: Duration) -> Result<bool>;
}
