//! Game state and core simulation types
//!
//! Everything that must survive a save/continue round-trip lives here.
//! The state is mutated only inside `tick`; the renderer and HUD read it.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::table::Table;
use crate::consts::*;

/// Current phase of gameplay
///
/// Exactly one of {ball held in chute, ball in free flight, round over}
/// holds at any time: Serve means held, Playing means free, GameOver means
/// the round ended. Paused freezes whichever of the first two was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball held in the launch chute, plunger armed
    Serve,
    /// Ball in free flight
    Playing,
    /// Physics frozen, render-only loop
    Paused,
    /// Round ended; terminal until reset
    GameOver,
}

/// Ball state - held in the chute or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// Pinned to the chute, position driven by plunger power
    Held,
    /// In free flight under gravity
    Free,
}

/// The one ball on the table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub state: BallState,
}

impl Ball {
    /// A fresh ball resting in the chute.
    pub fn held() -> Self {
        Self {
            pos: Vec2::new(CHUTE_X, CHUTE_Y),
            vel: Vec2::ZERO,
            state: BallState::Held,
        }
    }

    /// Rescale velocity to the speed cap, preserving direction.
    pub fn clamp_speed(&mut self) {
        let speed = self.vel.length();
        if speed > MAX_SPEED {
            self.vel *= MAX_SPEED / speed;
        }
    }
}

/// One flipper's control state. Geometry is derived from `progress` by the
/// table every substep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Flipper {
    /// Activation progress: 0 = rest, 1 = fully deployed
    pub progress: f32,
    /// Input after the tilt-lockout filter; drives the kick strength
    pub active: bool,
}

impl Flipper {
    /// Rate-limited move toward the pressed/released target.
    pub fn actuate(&mut self, active: bool) {
        self.active = active;
        let delta = if active { FLIPPER_RATE } else { -FLIPPER_RATE };
        self.progress = (self.progress + delta).clamp(0.0, 1.0);
    }
}

/// Transient dot-matrix style message shown mid-table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmdMessage {
    pub text: String,
    pub ticks: u32,
}

impl DmdMessage {
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.ticks = DMD_TICKS;
    }
}

/// Scripted feature state driven by collision and launch events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureState {
    /// Score multiplier, 1..=MULTIPLIER_CAP; never decreases within a
    /// ball's life except on full reset
    pub multiplier: u32,
    /// Rollover lamps, left to right; all-lit resets the set and bumps the
    /// multiplier
    pub rollovers: [bool; 5],
    /// Left-outlane rescue charges
    pub kickback: u32,
    /// Drain-forgiveness window; counts down only while the ball is free
    pub ball_save_ticks: u32,
    /// Accumulated nudge abuse; decays every tick
    pub tilt_charge: f32,
    /// While > 0, flipper input is ignored
    pub tilt_lock_ticks: u32,
    /// Active skill-shot target (rollover index), if the window is open
    pub skill_target: Option<usize>,
    pub skill_ticks: u32,
    pub dmd: DmdMessage,
}

impl Default for FeatureState {
    fn default() -> Self {
        Self {
            multiplier: 1,
            rollovers: [false; 5],
            kickback: 1,
            ball_save_ticks: 0,
            tilt_charge: 0.0,
            tilt_lock_ticks: 0,
            skill_target: None,
            skill_ticks: 0,
            dmd: DmdMessage::default(),
        }
    }
}

impl FeatureState {
    pub fn tilted(&self) -> bool {
        self.tilt_lock_ticks > 0
    }
}

/// Per-round feature tallies, reported alongside the final score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoundStats {
    pub bumper_hits: u32,
    pub sling_hits: u32,
    pub rollover_sets: u32,
    pub skill_shots: u32,
    pub balls_saved: u32,
    pub kickbacks_used: u32,
    pub tilts: u32,
}

/// Final result of a round, handed to the host app for score reporting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u64,
    pub multiplier: u32,
    pub stats: RoundStats,
}

/// Discrete events emitted by one tick, consumed by presentation/audio.
/// Cleared at the start of every tick; never serialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    BallLaunched { power: f32 },
    BumperHit { score: u64 },
    SlingHit,
    RailHit,
    PostHit,
    FlipperHit,
    RolloverLit { index: usize },
    SkillShotHit { bonus: u64 },
    MultiplierUp { multiplier: u32 },
    KickbackUsed,
    BallSaved,
    Tilted,
    Drained { final_score: u64 },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed; skill-shot targets derive from it
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Only ever increases
    pub score: u64,
    pub ball: Ball,
    pub left_flipper: Flipper,
    pub right_flipper: Flipper,
    pub features: FeatureState,
    pub stats: RoundStats,
    /// Playfield geometry plus live collider cooldowns/pulses
    pub table: Table,
    /// Plunger charge in [0,1]
    pub launch_power: f32,
    /// Previous tick's launch-pressed state (release edge detection)
    pub launch_was_pressed: bool,
    /// Pending nudge shove, consumed and halved each tick
    pub nudge: Vec2,
    /// Events from the most recent tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New round: ball held in the chute, features at their defaults.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            time_ticks: 0,
            phase: GamePhase::Serve,
            score: 0,
            ball: Ball::held(),
            left_flipper: Flipper::default(),
            right_flipper: Flipper::default(),
            features: FeatureState::default(),
            stats: RoundStats::default(),
            table: Table::space_cadet(),
            launch_power: 0.0,
            launch_was_pressed: false,
            nudge: Vec2::ZERO,
            events: Vec::new(),
        }
    }

    /// Full reset with a fresh seed (the Restart button).
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Put the ball back in the chute after a ball-save or between balls.
    /// Feature state persists; only the ball and plunger reset.
    pub fn re_serve(&mut self) {
        self.ball = Ball::held();
        self.launch_power = 0.0;
        self.phase = GamePhase::Serve;
    }

    /// Add to the score, modulated by the current multiplier.
    pub fn add_score(&mut self, base: u64) {
        self.score += base * self.features.multiplier as u64;
    }

    /// Deterministic RNG for this tick (skill-shot target draws).
    pub fn rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.time_ticks.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Final score and feature tallies for the host app.
    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            score: self.score,
            multiplier: self.features.multiplier,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_holds_ball() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.ball.state, BallState::Held);
        assert_eq!(state.features.multiplier, 1);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_re_serve_preserves_features() {
        let mut state = GameState::new(7);
        state.features.multiplier = 3;
        state.features.rollovers[2] = true;
        state.score = 1234;
        state.ball.state = BallState::Free;
        state.phase = GamePhase::Playing;

        state.re_serve();
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.ball.state, BallState::Held);
        assert_eq!(state.ball.vel, Vec2::ZERO);
        assert_eq!(state.features.multiplier, 3);
        assert!(state.features.rollovers[2]);
        assert_eq!(state.score, 1234);
    }

    #[test]
    fn test_add_score_applies_multiplier() {
        let mut state = GameState::new(7);
        state.add_score(50);
        state.features.multiplier = 4;
        state.add_score(50);
        assert_eq!(state.score, 50 + 200);
    }

    #[test]
    fn test_flipper_actuate_rate_limited() {
        let mut f = Flipper::default();
        f.actuate(true);
        assert!((f.progress - FLIPPER_RATE).abs() < 1e-6);
        for _ in 0..20 {
            f.actuate(true);
        }
        assert!((f.progress - 1.0).abs() < 1e-6);
        f.actuate(false);
        assert!((f.progress - (1.0 - FLIPPER_RATE)).abs() < 1e-6);
    }

    #[test]
    fn test_state_roundtrips_through_json() {
        let state = GameState::new(42);
        let json = serde_json::to_string(&state).expect("serialize");
        let back: GameState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.seed, state.seed);
        assert_eq!(back.phase, state.phase);
        assert_eq!(back.table.colliders.len(), state.table.colliders.len());
    }
}
