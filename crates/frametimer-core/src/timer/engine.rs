//! Split timer state machine.
//!
//! The timer is a pure state machine over player-clock samples. It has no
//! internal threads and never reads a clock itself -- every transition that
//! needs a timestamp receives one that was sampled in the player's
//! execution context and delivered asynchronously.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> TimingSegment -> Finished
//!           ^------------------------------'   (StartReset from anywhere)
//! ```
//!
//! Asynchronous resolutions are applied through [`SplitTimer::apply_sample`],
//! which re-validates the current phase before acting, so a stale resolution
//! (e.g. an end-segment sample arriving after an intervening reset) is
//! silently discarded.

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::source::{RequestKind, TimeSample};

/// Base label for splits named past the end of the preset list.
const FALLBACK_NAME: &str = "Another one?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
    TimingSegment,
    Finished,
}

/// The recorded result of a completed segment.
///
/// `duration` is `end_time - start_time` and can go negative if the user
/// seeks backward during a segment. That is a data anomaly the timer
/// passes through rather than rejecting -- it must never crash on a seek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
}

/// Core split timer state.
///
/// Owned exclusively by one session; all mutation happens on discrete
/// event callbacks. Serde round-trippable so a host can persist it
/// between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitTimer {
    phase: TimerPhase,
    /// Player time at the open segment boundary; `Some` iff timing.
    segment_start: Option<f64>,
    total_run_time: f64,
    splits: Vec<Split>,
    /// Count of auto-named splits beyond the preset list, used to keep
    /// their names visibly distinct.
    fallback_counter: u32,
    /// Adopted on the first resolved sample; a later mismatch means the
    /// user navigated to a different video.
    video_identity: Option<String>,
    #[serde(default = "default_visible")]
    visible: bool,
    /// Snapshot of the resolved preset name list for this session.
    #[serde(default)]
    preset_names: Vec<String>,
}

fn default_visible() -> bool {
    true
}

impl Default for SplitTimer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SplitTimer {
    pub fn new(preset_names: Vec<String>) -> Self {
        Self {
            phase: TimerPhase::Idle,
            segment_start: None,
            total_run_time: 0.0,
            splits: Vec::new(),
            fallback_counter: 0,
            video_identity: None,
            visible: true,
            preset_names,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn segment_start(&self) -> Option<f64> {
        self.segment_start
    }

    pub fn total_run_time(&self) -> f64 {
        self.total_run_time
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn last_split(&self) -> Option<&Split> {
        self.splits.last()
    }

    pub fn fallback_counter(&self) -> u32 {
        self.fallback_counter
    }

    pub fn video_identity(&self) -> Option<&str> {
        self.video_identity.as_deref()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn preset_names(&self) -> &[String] {
        &self.preset_names
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TimerPhase::Finished
    }

    /// Live duration of the open segment given the current clock reading,
    /// clamped to zero. `None` when no segment is being timed.
    pub fn live_duration(&self, now: f64) -> Option<f64> {
        match self.phase {
            TimerPhase::TimingSegment => self.segment_start.map(|s| (now - s).max(0.0)),
            _ => None,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            split_count: self.splits.len(),
            total_run_time: self.total_run_time,
            video_identity: self.video_identity.clone(),
            visible: self.visible,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the preset name list (the segment plan changed).
    pub fn set_preset_names(&mut self, names: Vec<String>) {
        self.preset_names = names;
    }

    /// Start a fresh run. Valid from any phase and idempotent.
    pub fn start_reset(&mut self) -> Event {
        self.phase = TimerPhase::Running;
        self.segment_start = None;
        self.total_run_time = 0.0;
        self.splits.clear();
        self.fallback_counter = 0;
        debug!("run started/reset");
        Event::RunReset { at: Utc::now() }
    }

    /// Open a segment at the sampled player time. No-op while a segment
    /// is already being timed.
    pub fn start_segment(&mut self, time: f64) -> Option<Event> {
        if self.phase == TimerPhase::TimingSegment {
            return None;
        }
        self.phase = TimerPhase::TimingSegment;
        self.segment_start = Some(time);
        debug!("segment started at {time:.3}");
        Some(Event::SegmentStarted {
            start_time: time,
            at: Utc::now(),
        })
    }

    /// Close the open segment and record a split. No-op unless timing.
    pub fn end_segment(&mut self, time: f64) -> Option<Event> {
        if self.phase != TimerPhase::TimingSegment {
            return None;
        }
        let start = self.segment_start.take()?;
        let duration = time - start;
        self.total_run_time += duration;

        let name = self.next_split_name();
        let index = self.splits.len();
        self.splits.push(Split {
            name: name.clone(),
            start_time: start,
            end_time: time,
            duration,
        });
        self.phase = TimerPhase::Running;
        debug!("split {index} \"{name}\" recorded ({duration:.3}s)");
        Some(Event::SplitRecorded {
            index,
            name,
            start_time: start,
            end_time: time,
            duration,
            total_run_time: self.total_run_time,
            at: Utc::now(),
        })
    }

    /// Finish the run. Closes any open segment first; no-op from
    /// `Idle` or `Finished`.
    pub fn end_run(&mut self, time: f64) -> Option<Event> {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Finished => return None,
            TimerPhase::TimingSegment => {
                self.end_segment(time);
            }
            TimerPhase::Running => {}
        }
        self.phase = TimerPhase::Finished;
        debug!("run finished, total {:.3}s", self.total_run_time);
        Some(Event::RunFinished {
            split_count: self.splits.len(),
            total_run_time: self.total_run_time,
            at: Utc::now(),
        })
    }

    /// Pop the last split. Reported no-op while a segment is being timed
    /// (end it first) or when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Event> {
        if self.phase == TimerPhase::TimingSegment {
            warn!("cannot undo while a segment is timing; end it first");
            return None;
        }
        let Some(undone) = self.splits.pop() else {
            warn!("nothing to undo");
            return None;
        };
        self.total_run_time -= undone.duration;

        // The removed split was fallback-named iff its index was past the
        // preset list at removal time.
        if self.splits.len() >= self.preset_names.len() {
            self.fallback_counter = self.fallback_counter.saturating_sub(1);
        }
        self.phase = TimerPhase::Running;
        Some(Event::SplitUndone {
            name: undone.name,
            duration: undone.duration,
            total_run_time: self.total_run_time,
            at: Utc::now(),
        })
    }

    /// Rename an existing split in place. A blank or unchanged name is a
    /// silent revert, not an error; only a bad index is.
    pub fn rename_split(
        &mut self,
        index: usize,
        new_name: &str,
    ) -> Result<Option<Event>, ValidationError> {
        let len = self.splits.len();
        let split = self
            .splits
            .get_mut(index)
            .ok_or(ValidationError::OutOfBounds {
                collection: "splits".into(),
                index,
                len,
            })?;
        let trimmed = new_name.trim();
        if trimmed.is_empty() || trimmed == split.name {
            return Ok(None);
        }
        split.name = trimmed.to_string();
        Ok(Some(Event::SplitRenamed {
            index,
            name: trimmed.to_string(),
            at: Utc::now(),
        }))
    }

    /// Presentation toggle only; never touches the phase.
    pub fn toggle_visibility(&mut self) -> Event {
        self.visible = !self.visible;
        Event::VisibilityToggled {
            visible: self.visible,
            at: Utc::now(),
        }
    }

    /// Apply a resolved timestamp sample for the request kind it was
    /// correlated with.
    ///
    /// Identity handling comes first: the first observed identity is
    /// adopted silently; a differing one triggers an implicit reset,
    /// adopts the new identity and drops the triggering event. A missing
    /// time means the source was not ready -- the event is dropped with
    /// no transition. Everything else dispatches by kind, and each
    /// transition's own phase guard doubles as the stale-resolution
    /// discard rule.
    pub fn apply_sample(&mut self, kind: RequestKind, sample: TimeSample) -> Option<Event> {
        if let Some(identity) = sample.video_identity {
            match &self.video_identity {
                None => self.video_identity = Some(identity),
                Some(current) if *current != identity => {
                    self.start_reset();
                    self.video_identity = Some(identity.clone());
                    return Some(Event::VideoChanged {
                        identity,
                        at: Utc::now(),
                    });
                }
                Some(_) => {}
            }
        }

        let Some(time) = sample.time else {
            warn!("player not ready for {kind:?}; event dropped");
            return None;
        };

        match kind {
            RequestKind::StartSegment => self.start_segment(time),
            RequestKind::EndSegment => self.end_segment(time),
            RequestKind::EndRun => self.end_run(time),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Preset name at the next position if one is left, else a fallback
    /// that grows one marker character per occurrence.
    fn next_split_name(&mut self) -> String {
        if let Some(name) = self.preset_names.get(self.splits.len()) {
            return name.clone();
        }
        let name = format!(
            "{FALLBACK_NAME}{}",
            "?".repeat(self.fallback_counter as usize)
        );
        self.fallback_counter += 1;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timer_with_presets(names: &[&str]) -> SplitTimer {
        SplitTimer::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn sample(time: f64, id: &str) -> TimeSample {
        TimeSample {
            time: Some(time),
            video_identity: Some(id.to_string()),
        }
    }

    #[test]
    fn segment_duration_accumulates_into_total() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(5.0);
        assert_eq!(t.phase(), TimerPhase::TimingSegment);
        t.end_segment(12.5);
        assert_eq!(t.phase(), TimerPhase::Running);
        assert_eq!(t.splits().len(), 1);
        assert!((t.splits()[0].duration - 7.5).abs() < 1e-9);
        assert!((t.total_run_time() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn start_segment_is_noop_while_timing() {
        let mut t = SplitTimer::default();
        t.start_reset();
        assert!(t.start_segment(5.0).is_some());
        assert!(t.start_segment(9.0).is_none());
        assert_eq!(t.segment_start(), Some(5.0));
    }

    #[test]
    fn end_segment_outside_timing_is_discarded() {
        let mut t = SplitTimer::default();
        t.start_reset();
        // Stale resolution: no segment open.
        assert!(t.end_segment(10.0).is_none());
        assert!(t.splits().is_empty());
    }

    #[test]
    fn reset_is_total_and_idempotent() {
        let mut t = timer_with_presets(&["A"]);
        t.start_reset();
        t.start_segment(1.0);
        t.end_segment(2.0);
        t.start_segment(3.0);
        t.start_reset();
        assert_eq!(t.phase(), TimerPhase::Running);
        assert_eq!(t.total_run_time(), 0.0);
        assert!(t.splits().is_empty());
        assert_eq!(t.segment_start(), None);
        assert_eq!(t.fallback_counter(), 0);
        // From a fresh state it behaves identically.
        t.start_reset();
        assert_eq!(t.total_run_time(), 0.0);
        assert!(t.splits().is_empty());
    }

    #[test]
    fn preset_names_then_distinct_fallbacks() {
        let mut t = timer_with_presets(&["One", "Two"]);
        t.start_reset();
        for i in 0..4 {
            t.start_segment(i as f64);
            t.end_segment(i as f64 + 0.5);
        }
        let names: Vec<&str> = t.splits().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names[0], "One");
        assert_eq!(names[1], "Two");
        assert_eq!(names[2], "Another one?");
        assert_eq!(names[3], "Another one??");
        assert_ne!(names[2], names[3]);
    }

    #[test]
    fn undo_reverses_fallback_counter_only_for_fallback_splits() {
        let mut t = timer_with_presets(&["One"]);
        t.start_reset();
        t.start_segment(0.0);
        t.end_segment(1.0); // preset
        t.start_segment(1.0);
        t.end_segment(2.0); // fallback
        assert_eq!(t.fallback_counter(), 1);

        t.undo(); // removes fallback split
        assert_eq!(t.fallback_counter(), 0);
        t.undo(); // removes preset split
        assert_eq!(t.fallback_counter(), 0);

        // Names repeat exactly after undo.
        t.start_segment(0.0);
        t.end_segment(1.0);
        t.start_segment(1.0);
        t.end_segment(2.0);
        assert_eq!(t.splits()[0].name, "One");
        assert_eq!(t.splits()[1].name, "Another one?");
    }

    #[test]
    fn undo_refused_while_timing_and_on_empty() {
        let mut t = SplitTimer::default();
        t.start_reset();
        assert!(t.undo().is_none());
        t.start_segment(1.0);
        assert!(t.undo().is_none());
        assert_eq!(t.phase(), TimerPhase::TimingSegment);
    }

    #[test]
    fn end_run_closes_open_segment_first() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(2.0);
        let before = t.splits().len();
        assert!(t.end_run(5.0).is_some());
        assert_eq!(t.splits().len(), before + 1);
        assert_eq!(t.phase(), TimerPhase::Finished);
        // No-op once finished, and from idle.
        assert!(t.end_run(6.0).is_none());
        let mut idle = SplitTimer::default();
        assert!(idle.end_run(1.0).is_none());
    }

    #[test]
    fn finished_still_accepts_start_reset() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(0.0);
        t.end_run(3.0);
        assert_eq!(t.phase(), TimerPhase::Finished);
        t.start_reset();
        assert_eq!(t.phase(), TimerPhase::Running);
        assert!(t.splits().is_empty());
    }

    #[test]
    fn rename_rejects_blank_and_unchanged_silently() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(0.0);
        t.end_segment(1.0);
        let original = t.splits()[0].name.clone();

        assert!(t.rename_split(0, "   ").unwrap().is_none());
        assert_eq!(t.splits()[0].name, original);
        assert!(t.rename_split(0, &original).unwrap().is_none());

        assert!(t.rename_split(0, "  First Boss ").unwrap().is_some());
        assert_eq!(t.splits()[0].name, "First Boss");

        assert!(t.rename_split(5, "x").is_err());
    }

    #[test]
    fn toggle_visibility_never_touches_phase() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(1.0);
        assert!(t.visible());
        t.toggle_visibility();
        assert!(!t.visible());
        assert_eq!(t.phase(), TimerPhase::TimingSegment);
    }

    #[test]
    fn first_sample_adopts_identity_silently() {
        let mut t = SplitTimer::default();
        t.start_reset();
        let ev = t.apply_sample(RequestKind::StartSegment, sample(5.0, "A"));
        assert!(matches!(ev, Some(Event::SegmentStarted { .. })));
        assert_eq!(t.video_identity(), Some("A"));
    }

    #[test]
    fn identity_change_implicitly_resets_and_drops_the_event() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.apply_sample(RequestKind::StartSegment, sample(5.0, "A"));
        t.apply_sample(RequestKind::EndSegment, sample(8.0, "A"));
        assert_eq!(t.splits().len(), 1);

        let ev = t.apply_sample(RequestKind::StartSegment, sample(1.0, "B"));
        assert!(matches!(ev, Some(Event::VideoChanged { .. })));
        assert!(t.splits().is_empty());
        assert_eq!(t.total_run_time(), 0.0);
        assert_eq!(t.video_identity(), Some("B"));
        // The triggering event was dropped, not applied after the reset.
        assert_eq!(t.phase(), TimerPhase::Running);
        assert_eq!(t.segment_start(), None);
    }

    #[test]
    fn missing_time_drops_event_without_transition() {
        let mut t = SplitTimer::default();
        t.start_reset();
        let ev = t.apply_sample(
            RequestKind::StartSegment,
            TimeSample {
                time: None,
                video_identity: Some("A".into()),
            },
        );
        assert!(ev.is_none());
        assert_eq!(t.phase(), TimerPhase::Running);
        // Identity is still adopted from the sample.
        assert_eq!(t.video_identity(), Some("A"));
    }

    #[test]
    fn backward_seek_produces_negative_duration_not_a_panic() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.start_segment(100.0);
        t.end_segment(40.0);
        assert!((t.splits()[0].duration - -60.0).abs() < 1e-9);
        assert!((t.total_run_time() - -60.0).abs() < 1e-9);
    }

    #[test]
    fn live_duration_clamps_to_zero() {
        let mut t = SplitTimer::default();
        t.start_reset();
        assert_eq!(t.live_duration(10.0), None);
        t.start_segment(10.0);
        assert_eq!(t.live_duration(12.5), Some(2.5));
        assert_eq!(t.live_duration(9.0), Some(0.0));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut t = SplitTimer::default();
        t.start_reset();
        t.apply_sample(RequestKind::StartSegment, sample(1.0, "vid"));
        t.apply_sample(RequestKind::EndSegment, sample(4.0, "vid"));
        match t.snapshot() {
            Event::StateSnapshot {
                phase,
                split_count,
                total_run_time,
                video_identity,
                ..
            } => {
                assert_eq!(phase, TimerPhase::Running);
                assert_eq!(split_count, 1);
                assert!((total_run_time - 3.0).abs() < 1e-9);
                assert_eq!(video_identity.as_deref(), Some("vid"));
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn serde_roundtrip_preserves_state() {
        let mut t = timer_with_presets(&["One"]);
        t.start_reset();
        t.apply_sample(RequestKind::StartSegment, sample(1.0, "vid"));
        t.apply_sample(RequestKind::EndSegment, sample(2.0, "vid"));
        let json = serde_json::to_string(&t).unwrap();
        let back: SplitTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase(), t.phase());
        assert_eq!(back.splits(), t.splits());
        assert_eq!(back.video_identity(), t.video_identity());
    }

    proptest! {
        /// For any t2 >= t1 the split duration is exactly t2 - t1 and the
        /// total grows by exactly that amount.
        #[test]
        fn duration_law(t1 in 0.0f64..86400.0, delta in 0.0f64..3600.0) {
            let mut t = SplitTimer::default();
            t.start_reset();
            t.start_segment(t1);
            let before = t.total_run_time();
            t.end_segment(t1 + delta);
            let split = t.last_split().unwrap();
            prop_assert!((split.duration - delta).abs() < 1e-9);
            prop_assert!((t.total_run_time() - before - delta).abs() < 1e-9);
        }

        /// Undo after a split restores totals and the split list exactly,
        /// for any prior sequence of splits.
        #[test]
        fn undo_round_trip(
            bounds in proptest::collection::vec((0.0f64..86400.0, 0.0f64..600.0), 1..8),
            presets in proptest::collection::vec("[A-Za-z]{1,8}", 0..4),
        ) {
            let mut t = SplitTimer::new(presets);
            t.start_reset();
            let (head, last) = bounds.split_at(bounds.len() - 1);
            for (start, delta) in head {
                t.start_segment(*start);
                t.end_segment(start + delta);
            }
            let splits_before = t.splits().to_vec();
            let total_before = t.total_run_time();
            let counter_before = t.fallback_counter();

            let (start, delta) = last[0];
            t.start_segment(start);
            t.end_segment(start + delta);
            t.undo();

            prop_assert_eq!(t.splits(), splits_before.as_slice());
            prop_assert!((t.total_run_time() - total_before).abs() < 1e-6);
            prop_assert_eq!(t.fallback_counter(), counter_before);
        }
    }
}
