//! Keybinding matching and action resolution.
//!
//! A binding is an exact-match predicate against an observed key event,
//! not a normalized shortcut string: the layout-dependent `key` and the
//! layout-independent `code` must both match, because the sampling side
//! sends both to tolerate input-method quirks.

use serde::{Deserialize, Serialize};

/// Timer actions a key press can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StartReset,
    StartSegment,
    EndSegment,
    EndRun,
    UndoSplit,
    ToggleVisibility,
    AutoDetect,
}

/// A raw key press as observed at the input boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// True when the event originated in an editable text field.
    /// Such events are never resolved to actions.
    pub from_editable: bool,
}

/// One configured shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybinding {
    pub key: String,
    pub code: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Keybinding {
    pub fn new(key: &str, code: &str) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Exact five-field match against an observed event.
    pub fn matches(&self, ev: &KeyEvent) -> bool {
        self.key == ev.key
            && self.code == ev.code
            && self.ctrl == ev.ctrl
            && self.alt == ev.alt
            && self.shift == ev.shift
    }
}

/// The full set of shortcuts, loaded once at session start.
///
/// Missing fields in a stored snapshot fall back to the built-in
/// defaults field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybindings {
    #[serde(default = "default_start_reset")]
    pub start_reset: Keybinding,
    #[serde(default = "default_start_segment")]
    pub start_segment: Keybinding,
    #[serde(default = "default_end_segment")]
    pub end_segment: Keybinding,
    #[serde(default = "default_end_run")]
    pub end_run: Keybinding,
    #[serde(default = "default_undo_split")]
    pub undo_split: Keybinding,
    #[serde(default = "default_toggle_visibility")]
    pub toggle_visibility: Keybinding,
    #[serde(default = "default_auto_detect")]
    pub auto_detect: Keybinding,
}

fn default_start_reset() -> Keybinding {
    Keybinding::new("ü", "BracketLeft")
}
fn default_start_segment() -> Keybinding {
    Keybinding::new("ö", "Semicolon")
}
fn default_end_segment() -> Keybinding {
    Keybinding::new("ä", "Quote")
}
fn default_end_run() -> Keybinding {
    Keybinding::new("c", "KeyC").with_ctrl()
}
fn default_undo_split() -> Keybinding {
    Keybinding::new("Backspace", "Backspace")
}
fn default_toggle_visibility() -> Keybinding {
    Keybinding::new("h", "KeyH")
}
fn default_auto_detect() -> Keybinding {
    Keybinding::new("p", "KeyP")
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            start_reset: default_start_reset(),
            start_segment: default_start_segment(),
            end_segment: default_end_segment(),
            end_run: default_end_run(),
            undo_split: default_undo_split(),
            toggle_visibility: default_toggle_visibility(),
            auto_detect: default_auto_detect(),
        }
    }
}

impl Keybindings {
    fn entries(&self) -> [(&Keybinding, Action); 7] {
        [
            (&self.start_reset, Action::StartReset),
            (&self.start_segment, Action::StartSegment),
            (&self.end_segment, Action::EndSegment),
            (&self.end_run, Action::EndRun),
            (&self.undo_split, Action::UndoSplit),
            (&self.toggle_visibility, Action::ToggleVisibility),
            (&self.auto_detect, Action::AutoDetect),
        ]
    }

    /// Resolve an observed key press to an action, if any binding matches.
    /// Events from editable fields never resolve.
    pub fn resolve(&self, ev: &KeyEvent) -> Option<Action> {
        if ev.from_editable {
            return None;
        }
        self.entries()
            .into_iter()
            .find(|(kb, _)| kb.matches(ev))
            .map(|(_, action)| action)
    }
}
