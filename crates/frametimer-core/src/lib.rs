//! # Frametimer Core Library
//!
//! Core logic for Frametimer, a manual split timer for video playback:
//! the user marks segment boundaries via keybindings while a video
//! plays, and the tool accumulates per-segment durations, a running
//! total and a formatted transcript for export.
//!
//! ## Architecture
//!
//! - **Timer**: a pure state machine over player-clock samples; hosts
//!   feed it resolved timestamps and it re-validates its phase before
//!   every transition, which makes stale asynchronous resolutions safe
//!   to discard
//! - **Time source**: the adapter boundary to the privileged context
//!   that can read the player's clock
//! - **Presets**: (group, sub)-keyed segment name lists with keyword
//!   auto-detection and a self-healing catalog
//! - **Storage**: TOML settings snapshot and SQLite run/kv storage
//!
//! ## Key Components
//!
//! - [`SplitTimer`]: the split timer state machine
//! - [`Session`]: host adapter binding one timer to its collaborators
//! - [`PresetCatalog`]: preset storage and resolution
//! - [`Settings`]: settings snapshot management

pub mod error;
pub mod events;
pub mod keys;
pub mod presets;
pub mod session;
pub mod source;
pub mod storage;
pub mod timer;
pub mod transcript;
pub mod view;

pub use error::{ConfigError, CoreError, DatabaseError, SourceError, ValidationError};
pub use events::Event;
pub use keys::{Action, KeyEvent, Keybinding, Keybindings};
pub use presets::{ActivePreset, NullPresetSink, PresetCatalog, PresetEntry, PresetSink};
pub use session::{BufferClipboard, ClipboardSink, Session};
pub use source::{ManualTimeSource, RequestKind, TimeSample, TimeSource};
pub use storage::{Database, RunRecord, RunStats, Settings, SettingsPresetSink};
pub use timer::{Split, SplitTimer, TimerPhase};
pub use view::{SplitRow, TimerView};
