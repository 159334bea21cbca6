//! Space Drop Pinball - a Space-Cadet-style table for the browser
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, feature state)
//! - `render`: Canvas-2D presentation (wasm only, read-only view of the sim)
//! - `settings`: Player preferences persisted to LocalStorage
//! - `highscores`: Local top-10 score cache

pub mod highscores;
#[cfg(target_arch = "wasm32")]
pub mod render;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{Settings, Theme};

/// Game tuning constants
///
/// All physics values are in table pixels per tick (one tick per display
/// frame, nominally 60 Hz). Countdowns are frame counts, not wall-clock.
pub mod consts {
    /// Playfield dimensions
    pub const TABLE_W: f32 = 420.0;
    pub const TABLE_H: f32 = 640.0;

    /// Ball
    pub const BALL_RADIUS: f32 = 7.0;
    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.22;
    /// Per-tick exponential velocity decay factor
    pub const FRICTION: f32 = 0.9985;
    /// Hard speed cap; collisions and launches rescale above this
    pub const MAX_SPEED: f32 = 18.0;
    /// Energy retained on reflection
    pub const RESTITUTION: f32 = 0.92;
    /// Integration substeps per tick. The tuning constants assume two
    /// collision passes per visual frame.
    pub const SUBSTEPS: u32 = 2;

    /// Flippers
    pub const FLIPPER_LEN: f32 = 85.0;
    pub const FLIPPER_THICK: f32 = 9.0;
    /// Swing from rest to fully deployed (radians)
    pub const FLIPPER_SWEEP: f32 = std::f32::consts::PI * (58.0 / 180.0);
    /// Rest droop below horizontal (radians)
    pub const FLIPPER_REST: f32 = std::f32::consts::PI * (22.0 / 180.0);
    /// Activation progress change per tick
    pub const FLIPPER_RATE: f32 = 0.18;
    /// Baseline height of the flipper pivots
    pub const FLIPPER_Y: f32 = TABLE_H - 56.0;

    /// Plunger/launch
    pub const CHUTE_X: f32 = TABLE_W - 28.0;
    pub const CHUTE_Y: f32 = TABLE_H - 40.0;
    /// Power gained per tick while the launch control is held
    pub const PLUNGER_CHARGE_RATE: f32 = 0.02;
    /// Power lost per tick while released (faster than charging)
    pub const PLUNGER_RELEASE_RATE: f32 = 0.03;
    /// How far up the chute the ball is drawn at full power
    pub const PLUNGER_TRAVEL: f32 = 110.0;

    /// Feature timers (ticks)
    pub const BALL_SAVE_TICKS: u32 = 60 * 8;
    pub const SKILL_WINDOW_TICKS: u32 = 60 * 3;
    pub const DMD_TICKS: u32 = 90;
    pub const TILT_LOCK_TICKS: u32 = 180;

    /// Tilt
    pub const TILT_THRESHOLD: f32 = 1.2;
    pub const TILT_DECAY: f32 = 0.01;
    pub const NUDGE_TILT_CHARGE: f32 = 0.35;

    /// Scoring
    pub const MULTIPLIER_CAP: u32 = 6;
    pub const SKILL_SHOT_BONUS: u64 = 5000;
    pub const ROLLOVER_SCORE: u64 = 50;
    pub const FLIPPER_SCORE: u64 = 10;
}
