pub mod config;
pub mod presets;
pub mod stats;
pub mod timer;
