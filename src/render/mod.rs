//! Canvas 2D table renderer (WASM only)
//!
//! Draws the whole table in simulation coordinates; a per-frame transform
//! maps the 420x640 table onto whatever backing size the canvas has.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{BallState, ColliderShape, FlipperSide, GamePhase, GameState};

const LAMP_LETTERS: [&str; 5] = ["S", "P", "A", "C", "E"];

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, wasm_bindgen::JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Draw one frame of the current state.
    pub fn render(&self, state: &GameState, settings: &Settings) {
        let ctx = &self.ctx;
        let sx = self.canvas.width() as f64 / TABLE_W as f64;
        let sy = self.canvas.height() as f64 / TABLE_H as f64;
        let _ = ctx.set_transform(sx, 0.0, 0.0, sy, 0.0, 0.0);

        let theme = settings.theme;
        ctx.set_fill_style_str(theme.background());
        ctx.fill_rect(0.0, 0.0, TABLE_W as f64, TABLE_H as f64);

        self.draw_plunger_lane(state, theme.accent());
        self.draw_colliders(state, settings);
        self.draw_rollovers(state, theme.accent());
        self.draw_flippers(state);
        self.draw_ball(state);
        self.draw_dmd(state, settings, theme.accent());
    }

    fn draw_plunger_lane(&self, state: &GameState, accent: &str) {
        let ctx = &self.ctx;
        let lane_x = (CHUTE_X - BALL_RADIUS - 6.0) as f64;

        // Lane divider
        ctx.set_stroke_style_str("#3a3f4a");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(lane_x, (CHUTE_Y + BALL_RADIUS) as f64);
        ctx.line_to(lane_x, 140.0);
        ctx.stroke();

        // Charge gauge, only interesting while serving
        if state.phase == GamePhase::Serve {
            let gauge_h = (state.launch_power * PLUNGER_TRAVEL) as f64;
            ctx.set_fill_style_str(accent);
            ctx.fill_rect(
                (CHUTE_X - 3.0) as f64,
                CHUTE_Y as f64 - gauge_h,
                6.0,
                gauge_h,
            );
        }
    }

    fn draw_colliders(&self, state: &GameState, settings: &Settings) {
        let ctx = &self.ctx;
        for collider in state
            .table
            .colliders
            .iter()
            .chain(std::iter::once(&state.table.center_post))
        {
            // Recent hits glow briefly
            let glow = if settings.effective_pulse() {
                collider.pulse as f64
            } else {
                0.0
            };
            match collider.shape {
                ColliderShape::Circle { center, radius } => {
                    ctx.begin_path();
                    let _ = ctx.arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
                    ctx.set_fill_style_str("#2b3140");
                    ctx.fill();
                    if glow > 0.01 {
                        ctx.set_global_alpha(glow);
                        ctx.set_fill_style_str("#ffd166");
                        ctx.fill();
                        ctx.set_global_alpha(1.0);
                    }
                    ctx.set_stroke_style_str("#4b5468");
                    ctx.set_line_width(2.0);
                    ctx.stroke();
                }
                ColliderShape::Segment { a, b, thickness } => {
                    ctx.begin_path();
                    ctx.move_to(a.x as f64, a.y as f64);
                    ctx.line_to(b.x as f64, b.y as f64);
                    ctx.set_line_cap("round");
                    ctx.set_line_width((thickness * 2.0) as f64);
                    ctx.set_stroke_style_str(if glow > 0.01 { "#ffd166" } else { "#4b5468" });
                    ctx.stroke();
                }
            }
        }
    }

    fn draw_rollovers(&self, state: &GameState, accent: &str) {
        let ctx = &self.ctx;
        ctx.set_font("10px monospace");
        ctx.set_text_align("center");
        for (i, pos) in state.table.rollovers.iter().enumerate() {
            let lit = state.features.rollovers[i];
            // Skill target blinks while the window is open
            let is_target = state.features.skill_ticks > 0
                && state.features.skill_target == Some(i)
                && (state.time_ticks / 15) % 2 == 0;

            ctx.begin_path();
            let _ = ctx.arc(pos.x as f64, pos.y as f64, 9.0, 0.0, TAU);
            ctx.set_fill_style_str(if lit {
                accent
            } else if is_target {
                "#ffd166"
            } else {
                "#232733"
            });
            ctx.fill();
            ctx.set_stroke_style_str("#4b5468");
            ctx.set_line_width(1.5);
            ctx.stroke();

            ctx.set_fill_style_str(if lit { "#101218" } else { "#7a8194" });
            let _ = ctx.fill_text(LAMP_LETTERS[i], pos.x as f64, (pos.y + 3.5) as f64);
        }
    }

    fn draw_flippers(&self, state: &GameState) {
        let ctx = &self.ctx;
        for (side, flipper) in [
            (FlipperSide::Left, &state.left_flipper),
            (FlipperSide::Right, &state.right_flipper),
        ] {
            let (pivot, tip) = state.table.flipper_segment(side, flipper.progress);
            ctx.begin_path();
            ctx.move_to(pivot.x as f64, pivot.y as f64);
            ctx.line_to(tip.x as f64, tip.y as f64);
            ctx.set_line_cap("round");
            ctx.set_line_width(FLIPPER_THICK as f64);
            ctx.set_stroke_style_str(if flipper.active { "#e0e6f0" } else { "#9aa3b5" });
            ctx.stroke();
        }
    }

    fn draw_ball(&self, state: &GameState) {
        if state.phase == GamePhase::GameOver && state.ball.state == BallState::Free {
            return;
        }
        let ctx = &self.ctx;
        ctx.begin_path();
        let _ = ctx.arc(
            state.ball.pos.x as f64,
            state.ball.pos.y as f64,
            BALL_RADIUS as f64,
            0.0,
            TAU,
        );
        ctx.set_fill_style_str("#d8dde8");
        ctx.fill();
        ctx.set_stroke_style_str("#ffffff");
        ctx.set_line_width(1.0);
        ctx.stroke();
    }

    fn draw_dmd(&self, state: &GameState, settings: &Settings, accent: &str) {
        let dmd = &state.features.dmd;
        if dmd.ticks == 0 || dmd.text.is_empty() {
            return;
        }
        // Blink in the final third of the message window
        if settings.effective_pulse() && dmd.ticks < DMD_TICKS / 3 && (dmd.ticks / 6) % 2 == 0 {
            return;
        }
        let ctx = &self.ctx;
        ctx.set_font("bold 18px monospace");
        ctx.set_text_align("center");
        ctx.set_fill_style_str(accent);
        let _ = ctx.fill_text(&dmd.text, (TABLE_W / 2.0) as f64, (TABLE_H * 0.3) as f64);
    }
}
