//! Office Dash - a side-scrolling commute runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (timers, spawning, collisions, run state)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `audio`: Tone tables and Web Audio playback

pub mod audio;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use sim::{Game, GameEvent, GamePhase, RunState, SoundEvent, Stage};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Collision/movement sweep interval (ms)
    pub const SWEEP_INTERVAL_MS: u64 = 10;
    /// Game clock period (ms)
    pub const CLOCK_TICK_MS: u64 = 1000;

    /// Visible container width
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    /// Entities are dropped once their right edge passes this x
    pub const OFFSCREEN_X: f32 = -100.0;

    /// Player box - fixed column near the left edge
    pub const PLAYER_X: f32 = 100.0;
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 50.0;
    /// Bottom edge while running on the ground
    pub const GROUND_Y: f32 = 140.0;
    /// Bottom edge during a jump
    pub const JUMP_Y: f32 = 280.0;

    pub const OBSTACLE_SIZE: f32 = 40.0;
    pub const COLLECTIBLE_SIZE: f32 = 40.0;
    /// Collectibles float somewhere in [min, min + range)
    pub const COLLECTIBLE_MIN_Y: f32 = 180.0;
    pub const COLLECTIBLE_Y_RANGE: f32 = 100.0;
    /// Number of cosmetic obstacle variants (cone, stop sign, hazard, siren)
    pub const OBSTACLE_VARIANTS: u8 = 4;

    /// Pixel forgiveness on obstacle hits
    pub const HIT_MARGIN: f32 = 10.0;
}
