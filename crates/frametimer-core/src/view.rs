//! View projection: pure state -> renderable rows.

use serde::Serialize;

use crate::timer::{SplitTimer, TimerPhase};
use crate::transcript::format_time;

/// What the current/last slots show when there is nothing to show.
pub const DISPLAY_PLACEHOLDER: &str = "--:--.---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitRow {
    pub name: String,
    pub start: String,
    pub end: String,
    pub duration: String,
}

/// Renderable projection of the timer state. Building one never mutates
/// anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub phase: TimerPhase,
    pub total: String,
    /// Live duration of the open segment, or the placeholder.
    pub current: String,
    /// Duration of the most recent split, or the placeholder.
    pub last: String,
    pub rows: Vec<SplitRow>,
    pub finished: bool,
    pub visible: bool,
}

impl TimerView {
    /// Project without a live clock reading; the current slot shows the
    /// placeholder even mid-segment.
    pub fn project(timer: &SplitTimer) -> Self {
        Self::project_at(timer, None)
    }

    /// Project with an optional current clock reading for the live slot.
    pub fn project_at(timer: &SplitTimer, now: Option<f64>) -> Self {
        let current = now
            .and_then(|now| timer.live_duration(now))
            .map(format_time)
            .unwrap_or_else(|| DISPLAY_PLACEHOLDER.to_string());
        let last = timer
            .last_split()
            .map(|s| format_time(s.duration))
            .unwrap_or_else(|| DISPLAY_PLACEHOLDER.to_string());
        let rows = timer
            .splits()
            .iter()
            .map(|s| SplitRow {
                name: s.name.clone(),
                start: format_time(s.start_time),
                end: format_time(s.end_time),
                duration: format_time(s.duration),
            })
            .collect();
        Self {
            phase: timer.phase(),
            total: format_time(timer.total_run_time()),
            current,
            last,
            rows,
            finished: timer.is_finished(),
            visible: timer.visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_when_idle() {
        let timer = SplitTimer::default();
        let view = TimerView::project(&timer);
        assert_eq!(view.total, "00:00.000");
        assert_eq!(view.current, DISPLAY_PLACEHOLDER);
        assert_eq!(view.last, DISPLAY_PLACEHOLDER);
        assert!(view.rows.is_empty());
        assert!(!view.finished);
        assert!(view.visible);
    }

    #[test]
    fn rows_follow_split_order() {
        let mut timer = SplitTimer::new(vec!["Intro".into(), "Boss".into()]);
        timer.start_reset();
        timer.start_segment(5.0);
        timer.end_segment(65.4321);
        timer.start_segment(70.0);
        timer.end_segment(80.0);

        let view = TimerView::project(&timer);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].name, "Intro");
        assert_eq!(view.rows[0].duration, "01:00.432");
        assert_eq!(view.rows[1].name, "Boss");
        assert_eq!(view.last, "00:10.000");
    }

    #[test]
    fn current_slot_uses_live_clock_only_while_timing() {
        let mut timer = SplitTimer::default();
        timer.start_reset();
        assert_eq!(TimerView::project_at(&timer, Some(9.0)).current, DISPLAY_PLACEHOLDER);
        timer.start_segment(7.5);
        assert_eq!(TimerView::project_at(&timer, Some(9.0)).current, "00:01.500");
        // Backward seek clamps the live display to zero.
        assert_eq!(TimerView::project_at(&timer, Some(2.0)).current, "00:00.000");
    }
}
