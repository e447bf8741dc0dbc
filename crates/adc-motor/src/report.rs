//! Result types returned by motor operations.

use std::time::Duration;

use serde::Serialize;

/// Outcome of a completed `move_motor` Profile Position sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    /// Position actual value read before the target was written.
    pub initial_position: u32,
    /// Position actual value read after the target-reached bit was set.
    pub final_position: u32,
    /// `final_position - initial_position`, widened to avoid wrap-around
    /// surprises when reporting to callers.
    pub position_change: i64,
    /// Wall-clock time spent inside `move_motor`, from first OD write to
    /// the final position readback.
    pub execution_time: Duration,
}

/// Outcome of `stop_motor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopStatus {
    /// Whether the halt was acknowledged by the statusword.
    pub acknowledged: bool,
}

/// Result of a `stop_motor` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopReport {
    /// Whether the halt was acknowledged.
    pub status: StopStatus,
    /// The raw statusword, present only when the halt was not acknowledged.
    pub error_code: Option<u32>,
}

impl StopReport {
    /// `true` iff the halt was acknowledged (`status: "success"` on the
    /// public action surface).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.acknowledged
    }
}
