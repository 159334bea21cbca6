//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed tick per display frame, two substeps per tick
//! - Seeded RNG only (skill-shot target selection)
//! - Colliders resolved in a fixed order for reproducible replays
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod table;
pub mod tick;

pub use collision::{Contact, circle_contact, reflect, segment_contact};
pub use state::{
    Ball, BallState, DmdMessage, FeatureState, Flipper, GameEvent, GamePhase, GameState,
    RoundStats, RoundSummary,
};
pub use table::{Collider, ColliderKind, ColliderShape, FlipperSide, Table};
pub use tick::{Nudge, TickInput, tick};
