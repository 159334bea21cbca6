//! Static table geometry
//!
//! The playfield is a fixed compiled-in catalog: circular bumpers and posts,
//! thick line segments for slingshots and rails, five rollover points, and
//! the two flipper pivots. Colliders carry their own scoring value, kick
//! impulse and debounce window; the resolver walks them in the order they
//! are listed, which is part of the game's deterministic contract.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// What a collider physically is (drives events and rendering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderKind {
    Bumper,
    Sling,
    Rail,
    Post,
}

/// Collision geometry of a collider
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ColliderShape {
    Circle { center: Vec2, radius: f32 },
    Segment { a: Vec2, b: Vec2, thickness: f32 },
}

/// A static playfield obstacle with per-collider scoring state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    pub kind: ColliderKind,
    pub shape: ColliderShape,
    /// Extra impulse along the contact normal (0 for passive geometry)
    pub kick: f32,
    /// Base score per hit, before the multiplier
    pub score: u64,
    /// Ticks between scoring events on this collider
    pub cooldown_window: u32,
    /// Remaining debounce ticks (runtime)
    pub cooldown: u32,
    /// Visual flash 1 -> 0, presentation only (runtime)
    pub pulse: f32,
    pub pulse_decay: f32,
}

impl Collider {
    fn circle(
        kind: ColliderKind,
        center: Vec2,
        radius: f32,
        kick: f32,
        score: u64,
        cooldown_window: u32,
        pulse_decay: f32,
    ) -> Self {
        Self {
            kind,
            shape: ColliderShape::Circle { center, radius },
            kick,
            score,
            cooldown_window,
            cooldown: 0,
            pulse: 0.0,
            pulse_decay,
        }
    }

    fn segment(
        kind: ColliderKind,
        a: Vec2,
        b: Vec2,
        thickness: f32,
        kick: f32,
        score: u64,
        cooldown_window: u32,
        pulse_decay: f32,
    ) -> Self {
        Self {
            kind,
            shape: ColliderShape::Segment { a, b, thickness },
            kick,
            score,
            cooldown_window,
            cooldown: 0,
            pulse: 0.0,
            pulse_decay,
        }
    }

    /// Step the debounce counter and decay the visual pulse.
    pub fn tick_down(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.pulse = (self.pulse - self.pulse_decay).max(0.0);
    }

    /// Arm the debounce window and flash after a scoring contact.
    pub fn arm(&mut self) {
        self.cooldown = self.cooldown_window;
        self.pulse = 1.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

/// The complete playfield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub width: f32,
    pub height: f32,
    /// Obstacles resolved before the flippers, in resolution order:
    /// center bumper, side bumpers, slingshots, funnel rails,
    /// inlane/outlane rails, side posts.
    pub colliders: Vec<Collider>,
    /// Resolved after the flippers (sits in the center drain gap)
    pub center_post: Collider,
    /// Rollover lamp positions, left to right (S P A C E)
    pub rollovers: [Vec2; 5],
    pub left_pivot: Vec2,
    pub right_pivot: Vec2,
}

impl Table {
    /// The one shipped table layout.
    pub fn space_cadet() -> Self {
        use ColliderKind::*;
        let w = TABLE_W;
        let fl_y = FLIPPER_Y;

        let colliders = vec![
            // Center bumper: big kick, big score
            Collider::circle(Bumper, Vec2::new(w / 2.0, TABLE_H / 2.0), 20.0, 1.2, 50, 8, 0.04),
            // Side bumpers
            Collider::circle(Bumper, Vec2::new(w * 0.25, TABLE_H * 0.45), 10.0, 0.0, 15, 6, 0.05),
            Collider::circle(Bumper, Vec2::new(w * 0.75, TABLE_H * 0.45), 10.0, 0.0, 15, 6, 0.05),
            // Slingshots
            Collider::segment(
                Sling,
                Vec2::new(w * 0.16, TABLE_H * 0.7),
                Vec2::new(w * 0.36, TABLE_H * 0.58),
                3.0,
                4.0,
                20,
                6,
                0.06,
            ),
            Collider::segment(
                Sling,
                Vec2::new(w * 0.84, TABLE_H * 0.7),
                Vec2::new(w * 0.64, TABLE_H * 0.58),
                3.0,
                4.0,
                20,
                6,
                0.06,
            ),
            // Funnel rails (V shape steering the ball toward the flippers)
            Collider::segment(
                Rail,
                Vec2::new(w * 0.5, fl_y - 26.0),
                Vec2::new(w * 0.3 + 8.0, fl_y - 8.0),
                2.0,
                3.2,
                20,
                6,
                0.06,
            ),
            Collider::segment(
                Rail,
                Vec2::new(w * 0.5, fl_y - 26.0),
                Vec2::new(w * 0.7 - 8.0, fl_y - 8.0),
                2.0,
                3.2,
                20,
                6,
                0.06,
            ),
            // Left inlane/outlane rail pair
            Collider::segment(
                Rail,
                Vec2::new(w * 0.06, fl_y - 4.0),
                Vec2::new(w * 0.18, fl_y - 30.0),
                2.0,
                2.4,
                20,
                6,
                0.06,
            ),
            Collider::segment(
                Rail,
                Vec2::new(w * 0.22, fl_y - 4.0),
                Vec2::new(w * 0.18, fl_y - 30.0),
                2.0,
                2.4,
                20,
                6,
                0.06,
            ),
            // Right inlane/outlane rail pair
            Collider::segment(
                Rail,
                Vec2::new(w * 0.94, fl_y - 4.0),
                Vec2::new(w * 0.82, fl_y - 30.0),
                2.0,
                2.4,
                20,
                6,
                0.06,
            ),
            Collider::segment(
                Rail,
                Vec2::new(w * 0.78, fl_y - 4.0),
                Vec2::new(w * 0.82, fl_y - 30.0),
                2.0,
                2.4,
                20,
                6,
                0.06,
            ),
            // Side posts guarding the outlanes
            Collider::circle(Post, Vec2::new(w * 0.18, fl_y - 12.0), 6.0, 0.0, 10, 6, 0.05),
            Collider::circle(Post, Vec2::new(w * 0.82, fl_y - 12.0), 6.0, 0.0, 10, 6, 0.05),
        ];

        Self {
            width: TABLE_W,
            height: TABLE_H,
            colliders,
            // Scores nothing; it only saves center drains
            center_post: Collider::circle(Post, Vec2::new(w * 0.5, fl_y - 8.0), 6.0, 0.0, 0, 8, 0.06),
            rollovers: [
                Vec2::new(w * 0.2, 80.0),
                Vec2::new(w * 0.36, 68.0),
                Vec2::new(w * 0.5, 62.0),
                Vec2::new(w * 0.64, 68.0),
                Vec2::new(w * 0.8, 80.0),
            ],
            left_pivot: Vec2::new(w * 0.26, fl_y),
            right_pivot: Vec2::new(w * 0.74, fl_y),
        }
    }

    /// Flipper angle for a given activation progress in [0,1].
    ///
    /// Left sweeps up from its rest droop as progress rises; right mirrors.
    /// Angles follow maths convention (positive = counterclockwise), with
    /// screen y pointing down.
    pub fn flipper_angle(&self, side: FlipperSide, progress: f32) -> f32 {
        match side {
            FlipperSide::Left => -FLIPPER_REST + progress * FLIPPER_SWEEP,
            FlipperSide::Right => std::f32::consts::PI + FLIPPER_REST - progress * FLIPPER_SWEEP,
        }
    }

    /// Flipper segment (pivot, tip) for the current activation progress.
    /// Recomputed every substep; never cached.
    pub fn flipper_segment(&self, side: FlipperSide, progress: f32) -> (Vec2, Vec2) {
        let pivot = match side {
            FlipperSide::Left => self.left_pivot,
            FlipperSide::Right => self.right_pivot,
        };
        let ang = self.flipper_angle(side, progress);
        let tip = pivot + Vec2::new(ang.cos(), -ang.sin()) * FLIPPER_LEN;
        (pivot, tip)
    }

    /// Whether an x position at the bottom edge is in the left outlane
    /// (kickback territory).
    pub fn in_left_outlane(&self, x: f32) -> bool {
        x < self.width * 0.18
    }

    /// Where the kickback re-fires the ball from.
    pub fn kickback_exit(&self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.width * 0.24, FLIPPER_Y - 20.0),
            Vec2::new(4.0, -9.0),
        )
    }

    /// Step all collider debounce counters and pulses once per tick.
    pub fn tick_cooldowns(&mut self) {
        for c in &mut self.colliders {
            c.tick_down();
        }
        self.center_post.tick_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        // The fixed order is part of the deterministic contract: bumpers
        // before slings before rails before posts.
        let table = Table::space_cadet();
        let kinds: Vec<_> = table.colliders.iter().map(|c| c.kind).collect();
        let first_sling = kinds.iter().position(|k| *k == ColliderKind::Sling).unwrap();
        let first_rail = kinds.iter().position(|k| *k == ColliderKind::Rail).unwrap();
        let first_post = kinds.iter().position(|k| *k == ColliderKind::Post).unwrap();
        assert_eq!(kinds[0], ColliderKind::Bumper);
        assert!(first_sling < first_rail);
        assert!(first_rail < first_post);
    }

    #[test]
    fn test_flipper_segment_sweeps_up() {
        let table = Table::space_cadet();
        let (_, tip_rest) = table.flipper_segment(FlipperSide::Left, 0.0);
        let (_, tip_up) = table.flipper_segment(FlipperSide::Left, 1.0);
        // Screen y grows downward: deployed tip must be higher (smaller y)
        assert!(tip_up.y < tip_rest.y);
        assert!(tip_rest.y > table.left_pivot.y);
    }

    #[test]
    fn test_flipper_sides_mirror() {
        let table = Table::space_cadet();
        let (lp, lt) = table.flipper_segment(FlipperSide::Left, 0.5);
        let (rp, rt) = table.flipper_segment(FlipperSide::Right, 0.5);
        // Tips extend toward the center gap from mirrored pivots
        assert!(lt.x > lp.x);
        assert!(rt.x < rp.x);
        assert!((lt.y - rt.y).abs() < 1e-4);
    }

    #[test]
    fn test_collider_arm_and_tick_down() {
        let mut c = Table::space_cadet().colliders[0].clone();
        c.arm();
        assert_eq!(c.cooldown, 8);
        assert!((c.pulse - 1.0).abs() < 1e-6);
        for _ in 0..8 {
            c.tick_down();
        }
        assert_eq!(c.cooldown, 0);
        assert!(c.pulse < 1.0);
    }
}
