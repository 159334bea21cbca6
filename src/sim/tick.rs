//! Fixed-timestep simulation tick
//!
//! One tick per display frame: actuate flippers, run the plunger, integrate
//! the ball through two substeps with collision resolution in a fixed
//! deterministic order, then handle drains. All feature scripting (rollovers,
//! multiplier, ball save, tilt, skill shot, kickback) hangs off the same tick.

use glam::Vec2;
use rand::Rng;

use super::collision::{Contact, circle_contact, reflect, segment_contact};
use super::state::{Ball, BallState, GameEvent, GamePhase, GameState};
use super::table::{ColliderKind, ColliderShape, FlipperSide};
use crate::consts::*;

/// A single nudge shove direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Left,
    Right,
    Up,
}

impl Nudge {
    fn impulse(self) -> Vec2 {
        match self {
            Nudge::Left => Vec2::new(-1.8, 0.0),
            Nudge::Right => Vec2::new(1.8, 0.0),
            Nudge::Up => Vec2::new(0.0, -2.0),
        }
    }
}

/// Input state for a single tick (deterministic)
///
/// Flipper and launch signals are level-triggered; the launch release edge
/// is derived inside the tick from the previous tick's state. Nudge and
/// pause are one-shot edges, cleared by the host after each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub launch: bool,
    pub nudge: Option<Nudge>,
    pub pause: bool,
}

/// Advance the game state by one tick.
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.events.clear();

    // Pause toggle; resuming restores whichever phase the ball implies
    if input.pause {
        match state.phase {
            GamePhase::Serve | GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => {
                state.phase = if state.ball.state == BallState::Held {
                    GamePhase::Serve
                } else {
                    GamePhase::Playing
                };
            }
            GamePhase::GameOver => {}
        }
    }

    // Paused and round-over freeze physics; the host keeps rendering
    if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
        return;
    }

    state.time_ticks += 1;

    // Flippers relax toward rest under tilt lockout regardless of input
    let tilted = state.features.tilted();
    state.left_flipper.actuate(!tilted && input.left);
    state.right_flipper.actuate(!tilted && input.right);

    // Countdown bookkeeping
    state.table.tick_cooldowns();
    if state.features.ball_save_ticks > 0 && state.ball.state == BallState::Free {
        state.features.ball_save_ticks -= 1;
    }
    state.features.tilt_lock_ticks = state.features.tilt_lock_ticks.saturating_sub(1);
    state.features.tilt_charge = (state.features.tilt_charge - TILT_DECAY).max(0.0);
    if state.features.skill_ticks > 0 {
        state.features.skill_ticks -= 1;
        if state.features.skill_ticks == 0 {
            state.features.skill_target = None;
        }
    }
    state.features.dmd.ticks = state.features.dmd.ticks.saturating_sub(1);

    // Nudge: immediate shove plus tilt charge; too much triggers lockout
    if let Some(nudge) = input.nudge {
        state.nudge += nudge.impulse();
        state.features.tilt_charge += NUDGE_TILT_CHARGE;
        if state.features.tilt_charge > TILT_THRESHOLD && !state.features.tilted() {
            state.features.tilt_lock_ticks = TILT_LOCK_TICKS;
            state.stats.tilts += 1;
            state.features.dmd.show("TILT");
            state.events.push(GameEvent::Tilted);
            log::info!("Tilt lockout triggered at tick {}", state.time_ticks);
        }
    }
    if state.nudge.length_squared() > 1e-6 {
        state.ball.pos += state.nudge;
        state.ball.vel += state.nudge * 0.5;
        state.nudge *= 0.5;
    } else {
        state.nudge = Vec2::ZERO;
    }

    // Plunger: charge while held, pin the ball down-chute, launch on the
    // release edge. Releasing with zero power is a no-op.
    if state.phase == GamePhase::Serve {
        let delta = if input.launch {
            PLUNGER_CHARGE_RATE
        } else {
            -PLUNGER_RELEASE_RATE
        };
        state.launch_power = (state.launch_power + delta).clamp(0.0, 1.0);
        state.ball.pos = Vec2::new(CHUTE_X, CHUTE_Y - state.launch_power * PLUNGER_TRAVEL);
        state.ball.vel = Vec2::ZERO;

        let released = state.launch_was_pressed && !input.launch;
        state.launch_was_pressed = input.launch;

        if released && state.launch_power > 0.0 {
            launch(state);
        } else {
            return;
        }
    } else {
        state.launch_was_pressed = input.launch;
    }

    // Substep integration + collision resolution
    let substeps = SUBSTEPS as f32;
    let friction = FRICTION.powf(1.0 / substeps);
    for _ in 0..SUBSTEPS {
        state.ball.vel.y += GRAVITY / substeps;
        state.ball.vel *= friction;
        state.ball.pos += state.ball.vel / substeps;

        resolve_substep(state);
    }

    // Drain: forgiven while the save window is open, else the round ends
    if state.ball.pos.y > state.table.height - BALL_RADIUS {
        if state.features.ball_save_ticks > 0 {
            state.stats.balls_saved += 1;
            state.events.push(GameEvent::BallSaved);
            log::info!("Ball saved ({} ticks left)", state.features.ball_save_ticks);
            state.re_serve();
        } else {
            state.phase = GamePhase::GameOver;
            state.events.push(GameEvent::Drained {
                final_score: state.score,
            });
            log::info!("Round over, final score {}", state.score);
        }
    }
}

fn launch(state: &mut GameState) {
    let power = state.launch_power;
    state.ball.vel = Vec2::new(-1.2 - 1.2 * power, -(7.0 + 12.0 * power));
    state.ball.state = BallState::Free;
    state.phase = GamePhase::Playing;
    state.features.ball_save_ticks = BALL_SAVE_TICKS;

    // Skill shot: one rollover is the hot target for a short window
    let mut rng = state.rng();
    state.features.skill_target = Some(rng.random_range(0..state.table.rollovers.len()));
    state.features.skill_ticks = SKILL_WINDOW_TICKS;
    state.features.dmd.show("SKILL SHOT");
    state.events.push(GameEvent::BallLaunched { power });
    log::info!("Launched at power {:.2}", power);
}

/// One substep of collision resolution, in the fixed order:
/// walls, bumpers, slingshots, rails, posts, rollovers, flippers,
/// center post, outlane kickback. Each collider observes the position
/// left behind by the ones before it.
fn resolve_substep(state: &mut GameState) {
    resolve_walls(&mut state.ball, state.table.width);

    // Static colliders (bumpers, slings, rails, side posts)
    for collider in state.table.colliders.iter_mut() {
        if collider.cooldown > 0 {
            continue;
        }
        let Some(contact) = collider_contact(&state.ball, &collider.shape) else {
            continue;
        };
        resolve_contact(&mut state.ball, contact, collider.kick);
        collider.arm();
        let gained = collider.score * state.features.multiplier as u64;
        state.score += gained;
        match collider.kind {
            ColliderKind::Bumper => {
                state.stats.bumper_hits += 1;
                state.events.push(GameEvent::BumperHit { score: gained });
            }
            ColliderKind::Sling => {
                state.stats.sling_hits += 1;
                state.events.push(GameEvent::SlingHit);
            }
            ColliderKind::Rail => state.events.push(GameEvent::RailHit),
            ColliderKind::Post => state.events.push(GameEvent::PostHit),
        }
    }

    resolve_rollovers(state);
    resolve_flipper(state, FlipperSide::Left);
    resolve_flipper(state, FlipperSide::Right);

    // Center post: pure geometry, no score
    if state.table.center_post.cooldown == 0
        && let Some(contact) = collider_contact(&state.ball, &state.table.center_post.shape)
    {
        resolve_contact(&mut state.ball, contact, state.table.center_post.kick);
        state.table.center_post.arm();
        state.events.push(GameEvent::PostHit);
    }

    // Left outlane kickback: spend a charge to fire the ball back into play
    if state.ball.pos.y > state.table.height - BALL_RADIUS - 2.0
        && state.table.in_left_outlane(state.ball.pos.x)
        && state.features.kickback > 0
    {
        state.features.kickback -= 1;
        let (pos, vel) = state.table.kickback_exit();
        state.ball.pos = pos;
        state.ball.vel = vel;
        state.stats.kickbacks_used += 1;
        state.events.push(GameEvent::KickbackUsed);
        log::info!("Kickback fired");
    }
}

/// Side and top walls clamp every substep; the bottom stays open (drain).
fn resolve_walls(ball: &mut Ball, width: f32) {
    if ball.pos.x < BALL_RADIUS {
        ball.pos.x = BALL_RADIUS;
        ball.vel.x = ball.vel.x.abs();
    }
    if ball.pos.x > width - BALL_RADIUS {
        ball.pos.x = width - BALL_RADIUS;
        ball.vel.x = -ball.vel.x.abs();
    }
    if ball.pos.y < BALL_RADIUS {
        ball.pos.y = BALL_RADIUS;
        ball.vel.y = ball.vel.y.abs();
    }
}

fn collider_contact(ball: &Ball, shape: &ColliderShape) -> Option<Contact> {
    match *shape {
        ColliderShape::Circle { center, radius } => {
            circle_contact(ball.pos, BALL_RADIUS, center, radius)
        }
        ColliderShape::Segment { a, b, thickness } => {
            segment_contact(ball.pos, BALL_RADIUS, a, b, thickness)
        }
    }
}

/// Push out along the normal, reflect with energy loss, add the collider's
/// kick, and re-clamp speed.
fn resolve_contact(ball: &mut Ball, contact: Contact, kick: f32) {
    ball.pos += contact.normal * contact.depth;
    ball.vel = reflect(ball.vel, contact.normal) * RESTITUTION;
    if kick != 0.0 {
        ball.vel += contact.normal * kick;
    }
    ball.clamp_speed();
}

/// Rollovers are latched proximity targets: no bounce, one trigger per lamp
/// until the full set resets.
fn resolve_rollovers(state: &mut GameState) {
    for index in 0..state.table.rollovers.len() {
        if state.features.rollovers[index] {
            continue;
        }
        let target = state.table.rollovers[index];
        if (state.ball.pos - target).length() >= BALL_RADIUS + 8.0 {
            continue;
        }
        state.features.rollovers[index] = true;
        state.events.push(GameEvent::RolloverLit { index });

        let is_skill_hit =
            state.features.skill_ticks > 0 && state.features.skill_target == Some(index);
        if is_skill_hit {
            let bonus = SKILL_SHOT_BONUS * state.features.multiplier as u64;
            state.score += bonus;
            bump_multiplier(state);
            state.features.skill_ticks = 0;
            state.features.skill_target = None;
            state.features.dmd.show(format!("+ SKILL {SKILL_SHOT_BONUS}"));
            state.stats.skill_shots += 1;
            state.events.push(GameEvent::SkillShotHit { bonus });
        } else {
            state.score += ROLLOVER_SCORE * state.features.multiplier as u64;
        }
    }

    // Full set: everything resets, the multiplier steps up, and the
    // kickback recharges
    if state.features.rollovers.iter().all(|lit| *lit) {
        state.features.rollovers = [false; 5];
        bump_multiplier(state);
        state.features.kickback = 1;
        state.stats.rollover_sets += 1;
        state
            .features
            .dmd
            .show(format!("MULT x{}", state.features.multiplier));
    }
}

fn bump_multiplier(state: &mut GameState) {
    let next = (state.features.multiplier + 1).min(MULTIPLIER_CAP);
    if next != state.features.multiplier {
        state.features.multiplier = next;
        state.events.push(GameEvent::MultiplierUp { multiplier: next });
    }
}

/// Flipper contact: same capsule resolution as a rail, but the added
/// impulse runs along the flipper toward its tip, and hits harder while
/// the flipper is actively pressed. No debounce; contact scores each
/// substep it persists.
fn resolve_flipper(state: &mut GameState, side: FlipperSide) {
    let flipper = match side {
        FlipperSide::Left => state.left_flipper,
        FlipperSide::Right => state.right_flipper,
    };
    let (pivot, tip) = state.table.flipper_segment(side, flipper.progress);
    let Some(contact) = segment_contact(state.ball.pos, BALL_RADIUS, pivot, tip, FLIPPER_THICK * 0.5)
    else {
        return;
    };

    state.ball.pos += contact.normal * contact.depth;
    state.ball.vel = reflect(state.ball.vel, contact.normal) * RESTITUTION;

    let along = (tip - pivot) / FLIPPER_LEN;
    let kick = if flipper.active { 6.0 } else { 3.0 };
    state.ball.vel += along * kick * 0.8;
    state.ball.clamp_speed();

    state.score += FLIPPER_SCORE * state.features.multiplier as u64;
    state.events.push(GameEvent::FlipperHit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Charge the plunger for `hold` ticks, then release once.
    fn charge_and_release(state: &mut GameState, hold: u32) {
        let held = TickInput {
            launch: true,
            ..Default::default()
        };
        for _ in 0..hold {
            tick(state, &held);
        }
        tick(state, &TickInput::default());
    }

    #[test]
    fn test_launch_transitions_to_playing() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.ball.state, BallState::Free);
        assert!(state.ball.vel.y < 0.0, "launch fires up the chute");
        assert!(state.features.ball_save_ticks > 0);
        assert!(state.features.skill_target.is_some());
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BallLaunched { .. }))
        );
    }

    #[test]
    fn test_release_with_zero_power_is_noop() {
        let mut state = GameState::new(1);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.ball.state, BallState::Held);
    }

    #[test]
    fn test_launch_speed_grows_with_power() {
        let mut weak = GameState::new(1);
        charge_and_release(&mut weak, 15); // power 0.3
        let mut strong = GameState::new(1);
        charge_and_release(&mut strong, 50); // power 1.0
        assert!(strong.ball.vel.length() > weak.ball.vel.length());
    }

    #[test]
    fn test_pause_freezes_and_resumes() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Paused);

        let frozen = state.ball.pos;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.ball.pos, frozen, "paused ticks must not move the ball");

        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_pause_from_serve_resumes_to_serve() {
        let mut state = GameState::new(1);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Paused);
        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Serve);
    }

    #[test]
    fn test_bumper_cooldown_debounces_scoring() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        let bumper_center = glam::Vec2::new(TABLE_W / 2.0, TABLE_H / 2.0);

        // Hold the ball on the bumper for its whole debounce window
        let mut hits = 0;
        for _ in 0..8 {
            state.ball.pos = bumper_center + glam::Vec2::new(24.0, 0.0);
            state.ball.vel = glam::Vec2::new(-2.0, 0.0);
            let before = state.score;
            tick(&mut state, &TickInput::default());
            if state.score > before {
                hits += 1;
            }
        }
        assert_eq!(hits, 1, "one scoring event per cooldown window");
    }

    #[test]
    fn test_rollover_set_resets_and_repeats() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        // Avoid the skill-shot path; this test is about the set reset
        state.features.skill_ticks = 0;
        state.features.skill_target = None;

        for round in 0..2 {
            for i in 0..5 {
                // Fast pass-through so the lamp is not re-lit after a set
                // reset while the ball still sits on it
                state.ball.pos = state.table.rollovers[i];
                state.ball.vel = glam::Vec2::new(20.0, 0.0);
                tick(&mut state, &TickInput::default());
            }
            assert_eq!(
                state.features.rollovers,
                [false; 5],
                "full set must reset (round {round})"
            );
            assert_eq!(state.features.multiplier, 2 + round);
            assert_eq!(state.features.kickback, 1);
        }
        assert_eq!(state.stats.rollover_sets, 2);
    }

    #[test]
    fn test_multiplier_caps() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        state.features.skill_ticks = 0;
        state.features.skill_target = None;

        for _ in 0..10 {
            for i in 0..5 {
                state.ball.pos = state.table.rollovers[i];
                state.ball.vel = glam::Vec2::new(20.0, 0.0);
                tick(&mut state, &TickInput::default());
            }
        }
        assert_eq!(state.features.multiplier, MULTIPLIER_CAP);
    }

    #[test]
    fn test_skill_shot_bonus_and_window_cancel() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        let target = 2;
        state.features.skill_target = Some(target);
        state.features.skill_ticks = 100;

        let before = state.score;
        state.ball.pos = state.table.rollovers[target];
        state.ball.vel = glam::Vec2::ZERO;
        tick(&mut state, &TickInput::default());

        assert!(state.score >= before + SKILL_SHOT_BONUS);
        assert_eq!(state.features.multiplier, 2);
        assert_eq!(state.features.skill_target, None);
        assert_eq!(state.stats.skill_shots, 1);
    }

    #[test]
    fn test_ball_save_re_serves() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        assert!(state.features.ball_save_ticks > 0);

        // Drop the ball below the drain line, away from the outlanes
        state.ball.pos = glam::Vec2::new(TABLE_W * 0.5, TABLE_H + 10.0);
        state.ball.vel = glam::Vec2::new(0.0, 5.0);
        tick(&mut state, &TickInput::default());

        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.ball.state, BallState::Held);
        assert_eq!(state.ball.vel, glam::Vec2::ZERO);
        assert_eq!(state.stats.balls_saved, 1);
    }

    #[test]
    fn test_drain_without_save_ends_round_once() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        state.features.ball_save_ticks = 0;
        state.features.kickback = 0;

        state.ball.pos = glam::Vec2::new(TABLE_W * 0.5, TABLE_H + 10.0);
        state.ball.vel = glam::Vec2::new(0.0, 5.0);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        let final_score = state.score;
        let final_ticks = state.time_ticks;

        // Repeated ticks after game over are no-ops
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, final_score);
        assert_eq!(state.time_ticks, final_ticks);
    }

    #[test]
    fn test_kickback_rescues_left_outlane() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);
        state.features.ball_save_ticks = 0;
        assert_eq!(state.features.kickback, 1);

        state.ball.pos = glam::Vec2::new(TABLE_W * 0.1, TABLE_H - BALL_RADIUS - 1.0);
        state.ball.vel = glam::Vec2::new(0.0, 3.0);
        tick(&mut state, &TickInput::default());

        assert_eq!(state.phase, GamePhase::Playing, "kickback keeps the ball alive");
        assert_eq!(state.features.kickback, 0);
        assert!(state.ball.vel.y < 0.0, "rescue fires upward");
        assert_eq!(state.stats.kickbacks_used, 1);
    }

    #[test]
    fn test_tilt_locks_flippers() {
        let mut state = GameState::new(1);
        charge_and_release(&mut state, 20);

        // Four rapid nudges push the charge over the threshold
        for _ in 0..4 {
            let input = TickInput {
                nudge: Some(Nudge::Left),
                ..Default::default()
            };
            tick(&mut state, &input);
        }
        assert!(state.features.tilted());

        // Pressing under lockout must not deploy the flippers
        for _ in 0..10 {
            let input = TickInput {
                left: true,
                right: true,
                ..Default::default()
            };
            tick(&mut state, &input);
        }
        assert_eq!(state.left_flipper.progress, 0.0);
        assert_eq!(state.right_flipper.progress, 0.0);

        // After the lockout expires, input works again
        state.features.tilt_lock_ticks = 1;
        state.features.tilt_charge = 0.0;
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        tick(&mut state, &input);
        assert!(state.left_flipper.progress > 0.0);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut state = GameState::new(99);
        charge_and_release(&mut state, 40);
        let mut last = state.score;
        for i in 0..600 {
            let input = TickInput {
                left: i % 30 < 10,
                right: i % 40 < 12,
                ..Default::default()
            };
            tick(&mut state, &input);
            assert!(state.score >= last);
            last = state.score;
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(777);
        let mut b = GameState::new(777);
        for i in 0..400u32 {
            let input = TickInput {
                left: i % 17 < 6,
                right: i % 23 < 9,
                launch: i < 30,
                nudge: (i == 90).then_some(Nudge::Right),
                pause: false,
            };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.ball.pos, b.ball.pos);
        assert_eq!(a.ball.vel, b.ball.vel);
        assert_eq!(a.score, b.score);
        assert_eq!(a.features.skill_target, b.features.skill_target);
    }

    proptest! {
        /// Top and side walls are never penetrated, whatever the inputs.
        #[test]
        fn prop_ball_stays_in_bounds(
            hold in 1u32..60,
            seed in 0u64..1000,
            flips in proptest::collection::vec(any::<bool>(), 64),
        ) {
            let mut state = GameState::new(seed);
            charge_and_release(&mut state, hold);
            for (i, flip) in flips.iter().cycle().take(900).enumerate() {
                let input = TickInput {
                    left: *flip,
                    right: flips[(i / 7) % flips.len()],
                    ..Default::default()
                };
                tick(&mut state, &input);
                if state.phase != GamePhase::Playing {
                    break;
                }
                prop_assert!(state.ball.pos.x >= BALL_RADIUS - 1e-3);
                prop_assert!(state.ball.pos.x <= TABLE_W - BALL_RADIUS + 1e-3);
                prop_assert!(state.ball.pos.y >= BALL_RADIUS - 1e-3);
            }
        }

        /// Launch speed is monotone in plunger charge time.
        #[test]
        fn prop_launch_speed_monotone(short in 1u32..25, extra in 1u32..25) {
            let mut weak = GameState::new(5);
            charge_and_release(&mut weak, short);
            let mut strong = GameState::new(5);
            charge_and_release(&mut strong, short + extra);
            prop_assert!(strong.ball.vel.length() >= weak.ball.vel.length() - 1e-4);
        }
    }
}
