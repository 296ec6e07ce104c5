use clap::Subcommand;
use frametimer_core::storage::Database;
use frametimer_core::{
    transcript, ClipboardSink, RequestKind, Settings, SplitTimer, TimeSample, TimerView,
};

use crate::clipboard::SystemClipboard;

const SESSION_KEY: &str = "split_timer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or reset the run
    Reset,
    /// Open a segment at the given player time
    StartSegment {
        /// Player time in seconds
        #[arg(long)]
        time: Option<f64>,
        /// Opaque video identity reported by the player
        #[arg(long)]
        video: Option<String>,
    },
    /// Close the open segment and record a split
    EndSegment {
        #[arg(long)]
        time: Option<f64>,
        #[arg(long)]
        video: Option<String>,
    },
    /// Finish the run (closes any open segment first)
    EndRun {
        #[arg(long)]
        time: Option<f64>,
        #[arg(long)]
        video: Option<String>,
        /// Also copy the transcript to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Undo the last split
    Undo,
    /// Rename a split by index
    Rename { index: usize, name: String },
    /// Toggle overlay visibility
    ToggleVisibility,
    /// Print the current view model as JSON
    Status,
    /// Print the export transcript
    Transcript {
        /// Also copy to the clipboard
        #[arg(long)]
        copy: bool,
    },
}

pub(crate) fn load_timer(db: &Database) -> SplitTimer {
    if let Ok(Some(json)) = db.kv_get(SESSION_KEY) {
        if let Ok(timer) = serde_json::from_str::<SplitTimer>(&json) {
            return timer;
        }
    }
    let settings = Settings::load_or_default();
    SplitTimer::new(settings.presets.active_names())
}

pub(crate) fn save_timer(
    db: &Database,
    timer: &SplitTimer,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(timer)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

fn sample(time: Option<f64>, video: Option<String>) -> TimeSample {
    TimeSample {
        time,
        video_identity: video,
    }
}

fn copy_transcript(text: &str) {
    if let Err(e) = SystemClipboard.copy(text) {
        eprintln!("clipboard copy failed (transcript printed above): {e}");
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut timer = load_timer(&db);

    match action {
        TimerAction::Reset => {
            let event = timer.start_reset();
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::StartSegment { time, video } => {
            match timer.apply_sample(RequestKind::StartSegment, sample(time, video)) {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => eprintln!("no transition (player not ready or already timing)"),
            }
        }
        TimerAction::EndSegment { time, video } => {
            match timer.apply_sample(RequestKind::EndSegment, sample(time, video)) {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => eprintln!("no transition (no open segment)"),
            }
        }
        TimerAction::EndRun { time, video, copy } => {
            match timer.apply_sample(RequestKind::EndRun, sample(time, video)) {
                Some(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    if timer.is_finished() {
                        db.record_run(
                            timer.video_identity(),
                            timer.splits().len(),
                            timer.total_run_time(),
                            chrono::Utc::now(),
                        )?;
                    }
                    if copy && !timer.splits().is_empty() {
                        let settings = Settings::load_or_default();
                        let text = transcript::render(
                            &settings.copy_header_text,
                            timer.splits(),
                            timer.total_run_time(),
                        );
                        println!("{text}");
                        copy_transcript(&text);
                    }
                }
                None => eprintln!("no transition (nothing running)"),
            }
        }
        TimerAction::Undo => match timer.undo() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => eprintln!("nothing to undo (end the open segment first)"),
        },
        TimerAction::Rename { index, name } => match timer.rename_split(index, &name)? {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("name unchanged"),
        },
        TimerAction::ToggleVisibility => {
            let event = timer.toggle_visibility();
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Status => {
            let view = TimerView::project(&timer);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        TimerAction::Transcript { copy } => {
            let settings = Settings::load_or_default();
            let text = transcript::render(
                &settings.copy_header_text,
                timer.splits(),
                timer.total_run_time(),
            );
            println!("{text}");
            if copy && !timer.splits().is_empty() {
                copy_transcript(&text);
            }
        }
    }

    save_timer(&db, &timer)?;
    Ok(())
}
