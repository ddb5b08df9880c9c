/// RenderCompletion - handle on the GPU work of one render call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::error::{Error, Result};
use crate::graphics_device::Fence;
use super::OffscreenTarget;

/// Place of one submission in the submission order of its target
///
/// Issued right before the work is submitted, so a newer ticket exists as
/// soon as newer work can touch the target's memory.
#[derive(Clone)]
pub(crate) struct SubmissionTicket {
    counter: Arc<AtomicU64>,
    sequence: u64,
}

impl SubmissionTicket {
    pub(crate) fn issue(counter: &Arc<AtomicU64>) -> Self {
        let sequence = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Self { counter: counter.clone(), sequence }
    }

    fn is_latest(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.sequence
    }
}

/// Signals when the frame it was returned for has finished rendering
///
/// Each render returns its own completion. Completions of different frames
/// carry no ordering guarantee: wait on the one of the frame you read.
/// Every frame rendered into a target writes the same memory, so a frame's
/// pixels can be read only while it is the latest one submitted to its
/// target (`is_latest`).
#[derive(Clone)]
pub struct RenderCompletion {
    fence: Arc<dyn Fence>,
    frame_index: u64,
    ticket: SubmissionTicket,
}

impl RenderCompletion {
    pub(crate) fn new(fence: Arc<dyn Fence>, frame_index: u64, ticket: SubmissionTicket) -> Self {
        Self { fence, frame_index, ticket }
    }

    /// Monotonically increasing index of the render call, starting at 0
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Non-blocking query
    pub fn is_complete(&self) -> Result<bool> {
        self.fence.is_signaled()
    }

    /// Block until the frame is complete or `timeout` elapses
    ///
    /// Returns `Ok(false)` on timeout.
    pub fn wait(&self, timeout: Duration) -> Result<bool> {
        self.fence.wait(timeout)
    }

    /// Block until the frame is complete, treating a timeout as an error
    ///
    /// # Errors
    ///
    /// `Error::Timeout` if the frame is still running after `timeout`,
    /// backend errors from the fence.
    pub fn wait_for(&self, timeout: Duration) -> Result<()> {
        if self.fence.wait(timeout)? {
            Ok(())
        } else {
            Err(Error::Timeout(format!(
                "frame {} not complete after {:?}",
                self.frame_index, timeout
            )))
        }
    }

    /// True while no later render into the same target has been submitted
    pub fn is_latest(&self) -> bool {
        self.ticket.is_latest()
    }

    /// True if this frame was rendered into `target` (or a clone of it)
    pub fn is_for(&self, target: &OffscreenTarget) -> bool {
        Arc::ptr_eq(&self.ticket.counter, target.submissions())
    }
}

impl std::fmt::Debug for RenderCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCompletion")
            .field("frame_index", &self.frame_index)
            .field("submission", &self.ticket.sequence)
            .finish()
    }
}
