//! Contact tests for the two collider shapes on the table
//!
//! Everything the ball can touch is either a circle or a thick line segment.
//! Both reduce to the same resolution: push the ball out along the contact
//! normal, then reflect its velocity with some energy loss.

use glam::Vec2;

/// A detected overlap between the ball and a collider surface
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Unit normal pointing from the surface toward the ball center
    pub normal: Vec2,
    /// Overlap depth along the normal (for position correction)
    pub depth: f32,
}

/// Test the ball against a solid circle.
pub fn circle_contact(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    radius: f32,
) -> Option<Contact> {
    let delta = ball_pos - center;
    let dist = delta.length();
    let reach = ball_radius + radius;
    if dist >= reach {
        return None;
    }
    // Degenerate overlap (ball exactly on center): pick a stable normal
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::new(0.0001, -1.0).normalize()
    };
    Some(Contact {
        normal,
        depth: reach - dist,
    })
}

/// Test the ball against a thick line segment.
///
/// Projects the ball center onto the segment, clamps the projection
/// parameter to [0,1], then treats the clamped point as a circle of the
/// segment's thickness.
pub fn segment_contact(
    ball_pos: Vec2,
    ball_radius: f32,
    a: Vec2,
    b: Vec2,
    thickness: f32,
) -> Option<Contact> {
    let ab = b - a;
    let len_sq = ab.length_squared().max(f32::EPSILON);
    let t = ((ball_pos - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    circle_contact(ball_pos, ball_radius, closest, thickness)
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n.
///
/// Restitution is applied by the caller so active colliders can stack their
/// kick impulse on top of the dampened reflection.
#[inline]
pub fn reflect(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}
