mod engine;
pub mod ticker;

pub use engine::{Split, SplitTimer, TimerPhase};
pub use ticker::{TickerHandle, DISPLAY_TICK};
