use frametimer_core::error::{CoreError, Result};
use frametimer_core::ClipboardSink;

/// System clipboard sink backed by arboard. Failure is reported to the
/// caller and never aborts the command -- the transcript was already
/// printed.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut cb| cb.set_text(text.to_string()))
            .map_err(|e| CoreError::Clipboard(e.to_string()))
    }
}
