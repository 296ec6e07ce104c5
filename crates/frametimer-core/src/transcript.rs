//! Transcript rendering and time formatting.
//!
//! Pure functions only -- placing the result on a clipboard is a separate,
//! explicitly invoked side effect owned by the session host.

use crate::timer::Split;

/// What a missing or non-finite time formats as.
pub const TIME_PLACEHOLDER: &str = "00:00.000";

/// Format seconds as `MM:SS.mmm`, with an `H:` prefix only from one hour up.
///
/// Negative inputs (backward-seek anomalies) keep their sign rather than
/// being clamped.
pub fn format_time(total_seconds: f64) -> String {
    if !total_seconds.is_finite() {
        return TIME_PLACEHOLDER.to_string();
    }
    if total_seconds < 0.0 {
        return format!("-{}", format_time(-total_seconds));
    }

    let hours = (total_seconds / 3600.0).floor() as u64;
    let minutes = ((total_seconds % 3600.0) / 60.0).floor() as u64;
    let seconds = total_seconds % 60.0;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:06.3}")
    } else {
        format!("{minutes:02}:{seconds:06.3}")
    }
}

/// Render the export transcript.
///
/// One line per split in split order, the in-game total, and -- when any
/// splits exist -- a real-time line spanning the earliest start to the
/// latest end.
pub fn render(header: &str, splits: &[Split], total_run_time: f64) -> String {
    let mut out = if header.is_empty() {
        String::new()
    } else {
        format!("{header}\n\n")
    };

    for split in splits {
        out.push_str(&format!(
            "{}: {} - {} | {}\n",
            split.name,
            format_time(split.start_time),
            format_time(split.end_time),
            format_time(split.duration),
        ));
    }

    out.push_str(&format!("\nTotal: **{}**", format_time(total_run_time)));

    let rta_start = splits.iter().map(|s| s.start_time).fold(f64::INFINITY, f64::min);
    let rta_end = splits.iter().map(|s| s.end_time).fold(f64::NEG_INFINITY, f64::max);
    if rta_start.is_finite() && rta_end.is_finite() {
        out.push_str(&format!(
            "\n\nRTA: {} - {} | **{}**",
            format_time(rta_start),
            format_time(rta_end),
            format_time(rta_end - rta_start),
        ));
    }

    out.trim().to_string()
}
