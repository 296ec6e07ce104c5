//! Cancellable periodic tick for the live-duration display.
//!
//! Replaces a display-refresh recursion: the callback runs once per
//! period until it returns `ControlFlow::Break` or the handle is
//! cancelled. Cancellation takes effect synchronously -- a tick observed
//! after `cancel()` returns is impossible because the flag is checked
//! before every callback invocation and the task is aborted.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Roughly one tick per display refresh.
pub const DISPLAY_TICK: Duration = Duration::from_millis(16);

/// Handle to a running ticker. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TickerHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a periodic callback on the current tokio runtime.
///
/// The callback self-terminates by returning `ControlFlow::Break(())`;
/// a lagging tick is skipped rather than burst-replayed.
pub fn spawn<F>(period: Duration, mut on_tick: F) -> TickerHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if on_tick().is_break() {
                flag.store(true, Ordering::SeqCst);
                break;
            }
        }
    });
    TickerHandle { cancelled, task }
}
