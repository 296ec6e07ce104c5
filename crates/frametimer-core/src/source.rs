//! Time source adapter boundary.
//!
//! The timer never reads the player's clock directly. A request tagged
//! with the triggering kind crosses into the privileged context that can
//! see the player, and the resolution comes back asynchronously carrying
//! the same tag. Latency and failure are outside timer control, so the
//! receiving side re-validates the timer phase before applying anything
//! (see [`crate::timer::SplitTimer::apply_sample`]).

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Which user action a timestamp request was issued for. The resolution
/// is correlated back to exactly this kind -- a segment-end sample is
/// never applied to a pending segment-start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    StartSegment,
    EndSegment,
    EndRun,
}

/// A resolved timestamp sample.
///
/// `time: None` means the source was not ready (player missing or not
/// yet queryable) -- reported, non-fatal, and the triggering event is
/// dropped. The identity is opaque; the timer only compares it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    pub time: Option<f64>,
    pub video_identity: Option<String>,
}

/// Asynchronous access to the player's clock.
///
/// At most one in-flight request per kind is meaningful; duplicate or
/// out-of-order resolutions are tolerated by the phase-revalidation
/// guard on the applying side, not here.
pub trait TimeSource {
    fn request_time(
        &mut self,
        kind: RequestKind,
    ) -> impl std::future::Future<Output = Result<TimeSample, SourceError>> + Send;
}

/// A source that always returns a fixed sample. Used by per-invocation
/// hosts where the user supplies the timestamp directly.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    pub time: Option<f64>,
    pub video_identity: Option<String>,
}

impl ManualTimeSource {
    pub fn new(time: Option<f64>, video_identity: Option<String>) -> Self {
        Self {
            time,
            video_identity,
        }
    }
}

impl TimeSource for ManualTimeSource {
    async fn request_time(&mut self, _kind: RequestKind) -> Result<TimeSample, SourceError> {
        Ok(TimeSample {
            time: self.time,
            video_identity: self.video_identity.clone(),
        })
    }
}


#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use super::*;

    /// Replays a scripted sequence of resolutions, recording the kinds
    /// that were requested.
    pub struct ScriptedSource {
        pub responses: VecDeque<Result<TimeSample, SourceError>>,
        pub requested: Vec<RequestKind>,
    }

    impl ScriptedSource {
        pub fn new(responses: Vec<Result<TimeSample, SourceError>>) -> Self {
            Self {
                responses: responses.into(),
                requested: Vec::new(),
            }
        }
    }

    impl TimeSource for ScriptedSource {
        async fn request_time(&mut self, kind: RequestKind) -> Result<TimeSample, SourceError> {
            self.requested.push(kind);
            self.responses
                .pop_front()
                .unwrap_or(Err(SourceError::ChannelClosed))
        }
    }
}
