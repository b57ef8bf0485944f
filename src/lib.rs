//! Pocket Arcade - simulation core for a handful of small arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze generation, lane runners, brawler, chase)
//! - `audio`: Procedural tone effects behind a swappable sink
//! - `session`: Host mounting, frame loop, deferred transitions, teardown
//! - `platform`: Browser bindings
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use audio::{AudioSink, NullSink, SoundEffect, ToneSynth};
pub use session::{Callbacks, Host, HostCall, HostQueue, Session};
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame gap fed into the accumulator (tab switches, debugger pauses)
    pub const FRAME_DT_CLAMP_MS: f32 = 100.0;
    /// Reference display frame. Per-frame constants (gravity, walk speed) use this unit.
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
}
