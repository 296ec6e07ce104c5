use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerPhase;

/// Every state change in the timer produces an Event.
/// The hosting surface (CLI, overlay) renders them; no-ops produce none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Run started or reset; all accumulated state cleared.
    RunReset {
        at: DateTime<Utc>,
    },
    SegmentStarted {
        /// Player time at the segment boundary, in seconds.
        start_time: f64,
        at: DateTime<Utc>,
    },
    SplitRecorded {
        index: usize,
        name: String,
        start_time: f64,
        end_time: f64,
        duration: f64,
        total_run_time: f64,
        at: DateTime<Utc>,
    },
    RunFinished {
        split_count: usize,
        total_run_time: f64,
        at: DateTime<Utc>,
    },
    SplitUndone {
        name: String,
        duration: f64,
        total_run_time: f64,
        at: DateTime<Utc>,
    },
    SplitRenamed {
        index: usize,
        name: String,
        at: DateTime<Utc>,
    },
    VisibilityToggled {
        visible: bool,
        at: DateTime<Utc>,
    },
    /// The sampler reported a different video than the adopted one;
    /// the run was implicitly reset and the new identity adopted.
    VideoChanged {
        identity: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        split_count: usize,
        total_run_time: f64,
        video_identity: Option<String>,
        visible: bool,
        at: DateTime<Utc>,
    },
}
