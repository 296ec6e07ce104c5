//! Session host: binds the owned timer state to one active page session.
//!
//! The session resolves raw key events to actions, issues time requests
//! across the adapter boundary, applies resolutions through the timer's
//! phase-revalidation guard, and owns the live-display ticker. All
//! mutation happens on discrete event callbacks; the single-threaded
//! event queue of the host serializes them.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::error::Result;
use crate::events::Event;
use crate::keys::{Action, KeyEvent, Keybindings};
use crate::presets::{PresetCatalog, PresetSink};
use crate::source::{RequestKind, TimeSource};
use crate::storage::Settings;
use crate::timer::{ticker, SplitTimer, TickerHandle, DISPLAY_TICK};
use crate::transcript;

/// Destination for a finished transcript. Failure is reported, never
/// fatal -- the transcript stays available for manual copy.
pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// Clipboard that just keeps the last text. Default sink for headless
/// hosts and tests.
#[derive(Debug, Default)]
pub struct BufferClipboard {
    pub last: Option<String>,
}

impl ClipboardSink for BufferClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        self.last = Some(text.to_string());
        Ok(())
    }
}

/// How the live segment duration gets to the screen: a clock sampled
/// once per tick and a render callback for the clamped duration.
struct LiveDisplay {
    period: Duration,
    clock: Arc<dyn Fn() -> f64 + Send + Sync>,
    render: Arc<dyn Fn(f64) + Send + Sync>,
}

/// One active timing session.
pub struct Session<S, C, P> {
    timer: SplitTimer,
    catalog: PresetCatalog,
    copy_header: String,
    bindings: Keybindings,
    source: S,
    clipboard: C,
    preset_sink: P,
    live: Option<LiveDisplay>,
    ticker: Option<TickerHandle>,
}

impl<S, C, P> Session<S, C, P>
where
    S: TimeSource,
    C: ClipboardSink,
    P: PresetSink,
{
    /// Bind a settings snapshot to the collaborators. The catalog is
    /// repaired on the way in; the resolved preset names become the
    /// session's segment plan.
    pub fn new(mut settings: Settings, source: S, clipboard: C, preset_sink: P) -> Self {
        settings.presets.repair();
        let timer = SplitTimer::new(settings.presets.active_names());
        Self {
            timer,
            catalog: settings.presets,
            copy_header: settings.copy_header_text,
            bindings: settings.keybindings,
            source,
            clipboard,
            preset_sink,
            live: None,
            ticker: None,
        }
    }

    pub fn timer(&self) -> &SplitTimer {
        &self.timer
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    /// Configure the live-duration display at the default refresh
    /// cadence: `clock` is sampled once per tick while a segment is
    /// open, and `render` receives the clamped duration.
    pub fn set_live_display<Clk, R>(&mut self, clock: Clk, render: R)
    where
        Clk: Fn() -> f64 + Send + Sync + 'static,
        R: Fn(f64) + Send + Sync + 'static,
    {
        self.set_live_display_every(DISPLAY_TICK, clock, render);
    }

    /// Same as [`Session::set_live_display`] with an explicit tick period.
    pub fn set_live_display_every<Clk, R>(&mut self, period: Duration, clock: Clk, render: R)
    where
        Clk: Fn() -> f64 + Send + Sync + 'static,
        R: Fn(f64) + Send + Sync + 'static,
    {
        self.live = Some(LiveDisplay {
            period,
            clock: Arc::new(clock),
            render: Arc::new(render),
        });
    }

    /// Resolve a raw key press and dispatch it. `video_title` is the
    /// current display title, used only by auto-detect.
    pub async fn handle_key(&mut self, ev: &KeyEvent, video_title: &str) -> Option<Event> {
        let action = self.bindings.resolve(ev)?;
        self.dispatch(action, video_title).await
    }

    pub async fn dispatch(&mut self, action: Action, video_title: &str) -> Option<Event> {
        match action {
            Action::StartReset => {
                self.cancel_live();
                Some(self.timer.start_reset())
            }
            Action::UndoSplit => self.timer.undo(),
            Action::ToggleVisibility => Some(self.timer.toggle_visibility()),
            Action::AutoDetect => self.auto_detect(video_title),
            Action::StartSegment => self.request_and_apply(RequestKind::StartSegment).await,
            Action::EndSegment => self.request_and_apply(RequestKind::EndSegment).await,
            Action::EndRun => self.request_and_apply(RequestKind::EndRun).await,
        }
    }

    /// Render the transcript for the current state.
    pub fn transcript(&self) -> String {
        transcript::render(&self.copy_header, self.timer.splits(), self.timer.total_run_time())
    }

    /// Push the transcript to the clipboard sink. No-op without splits.
    pub fn copy_transcript(&mut self) -> Result<()> {
        if self.timer.splits().is_empty() {
            return Ok(());
        }
        let text = self.transcript();
        self.clipboard.copy(&text)
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn request_and_apply(&mut self, kind: RequestKind) -> Option<Event> {
        let sample = match self.source.request_time(kind).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("time request for {kind:?} failed: {e}");
                return None;
            }
        };
        let event = self.timer.apply_sample(kind, sample);
        match &event {
            Some(Event::SegmentStarted { start_time, .. }) => self.start_live(*start_time),
            Some(Event::SplitRecorded { .. })
            | Some(Event::RunReset { .. })
            | Some(Event::VideoChanged { .. }) => self.cancel_live(),
            Some(Event::RunFinished { .. }) => {
                self.cancel_live();
                if let Err(e) = self.copy_transcript() {
                    warn!("clipboard copy failed: {e}");
                }
            }
            _ => {}
        }
        event
    }

    /// Auto-detect a preset from the display title. On a match the new
    /// selection is written back to the settings store and the run is
    /// reset, since the segment plan changed.
    fn auto_detect(&mut self, title: &str) -> Option<Event> {
        let Some((group, sub)) = self.catalog.detect(title) else {
            warn!("no preset keywords match \"{title}\"");
            return None;
        };
        info!("auto-detected preset {group}>{sub}");
        self.catalog.active = crate::presets::ActivePreset {
            group,
            sub,
        };
        if let Err(e) = self.preset_sink.persist_active(&self.catalog.active) {
            warn!("could not persist active preset: {e}");
        }
        self.timer.set_preset_names(self.catalog.active_names());
        self.cancel_live();
        Some(self.timer.start_reset())
    }

    fn start_live(&mut self, segment_start: f64) {
        self.cancel_live();
        let Some(live) = &self.live else { return };
        let clock = Arc::clone(&live.clock);
        let render = Arc::clone(&live.render);
        self.ticker = Some(ticker::spawn(live.period, move || {
            let duration = ((clock)() - segment_start).max(0.0);
            (render)(duration);
            ControlFlow::Continue(())
        }));
    }

    /// Cancels synchronously as part of the triggering transition, so a
    /// recurring callback can never outlive the segment it was timing.
    fn cancel_live(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.cancel();
        }
    }
}
