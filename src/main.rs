//! Space Drop Pinball entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, TouchEvent};

    use space_drop_pinball::highscores::HighScores;
    use space_drop_pinball::render::Renderer;
    use space_drop_pinball::settings::Settings;
    use space_drop_pinball::sim::{GamePhase, GameState, Nudge, TickInput, tick};

    const SAVE_KEY: &str = "mgp:pinball:save";

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: Option<Renderer>,
        input: TickInput,
        settings: Settings,
        highscores: HighScores,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        // Track phase for auto-save and score submission
        last_phase: GamePhase,
        final_rank: Option<usize>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: GameState::new(seed),
                renderer: None,
                input: TickInput::default(),
                settings: Settings::load(),
                highscores: HighScores::load(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                last_phase: GamePhase::Serve,
                final_rank: None,
            }
        }

        /// Run one simulation tick (one per display frame)
        fn update(&mut self, time: f64) {
            let input = self.input;
            tick(&mut self.state, &input);

            // Clear one-shot inputs after processing
            self.input.pause = false;
            self.input.nudge = None;

            if self.settings.haptics {
                self.buzz_for_events();
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            // Phase transitions drive persistence
            let current_phase = self.state.phase;
            if current_phase != self.last_phase {
                match current_phase {
                    GamePhase::Paused => self.save_game(),
                    GamePhase::GameOver => self.submit_score(),
                    _ => {}
                }
                self.last_phase = current_phase;
            }
        }

        /// Haptic feedback for the big moments (touch devices)
        fn buzz_for_events(&self) {
            use space_drop_pinball::sim::GameEvent;
            let ms = self
                .state
                .events
                .iter()
                .map(|event| match event {
                    GameEvent::BumperHit { .. } | GameEvent::SlingHit => 10,
                    GameEvent::Drained { .. } => 80,
                    GameEvent::Tilted => 200,
                    _ => 0,
                })
                .max()
                .unwrap_or(0);
            if ms > 0 {
                if let Some(window) = web_sys::window() {
                    let _ = window.navigator().vibrate_with_duration(ms);
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref renderer) = self.renderer {
                renderer.render(&self.state, &self.settings);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.state.score.to_string()));
            }

            if let Some(el) = document.query_selector("#hud-mult .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("x{}", self.state.features.multiplier)));
            }

            if self.settings.show_fps {
                if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }

            // Feature lamps
            set_lamp(&document, "lamp-save", self.state.features.ball_save_ticks > 0);
            set_lamp(&document, "lamp-kickback", self.state.features.kickback > 0);
            set_lamp(&document, "lamp-tilt", self.state.features.tilted());

            // Show/hide serve prompt
            if let Some(el) = document.get_element_by_id("serve-prompt") {
                if self.state.phase == GamePhase::Serve {
                    let _ = el.set_attribute("class", "");
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }

            // Show/hide pause menu
            if let Some(el) = document.get_element_by_id("pause-menu") {
                if self.state.phase == GamePhase::Paused {
                    let _ = el.set_attribute("class", "");
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }

            // Show/hide game over panel
            if let Some(el) = document.get_element_by_id("game-over") {
                if self.state.phase == GamePhase::GameOver {
                    let _ = el.set_attribute("class", "");
                    if let Some(score_el) = document.get_element_by_id("final-score") {
                        score_el.set_text_content(Some(&self.state.score.to_string()));
                    }
                    if let Some(best_el) = document.get_element_by_id("final-best") {
                        let best = self.highscores.top_score().unwrap_or(0);
                        best_el.set_text_content(Some(&best.to_string()));
                    }
                    if let Some(rank_el) = document.get_element_by_id("final-rank") {
                        let text = match self.final_rank {
                            Some(rank) => format!("#{rank}"),
                            None => "-".to_string(),
                        };
                        rank_el.set_text_content(Some(&text));
                    }
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }

        /// Save game state to LocalStorage
        fn save_game(&self) {
            if let Ok(json) = serde_json::to_string(&self.state) {
                if let Some(storage) = web_sys::window()
                    .and_then(|w| w.local_storage().ok())
                    .flatten()
                {
                    let _ = storage.set_item(SAVE_KEY, &json);
                    log::info!("Game saved (score {})", self.state.score);
                }
            }
        }

        /// Submit the finished round to the leaderboard
        fn submit_score(&mut self) {
            let summary = self.state.summary();
            self.final_rank =
                self.highscores
                    .add_score(summary.score, summary.multiplier, js_sys::Date::now());
            if self.final_rank.is_some() {
                self.highscores.save();
            }
            clear_saved_game();
            log::info!(
                "Round over: score {} at x{} (rank {:?})",
                summary.score,
                summary.multiplier,
                self.final_rank
            );
        }

        /// Reset game state for restart
        fn restart(&mut self, seed: u64) {
            self.state.reset(seed);
            self.input = TickInput::default();
            self.last_phase = GamePhase::Serve;
            self.final_rank = None;
        }

        /// Load game state from saved data
        fn load_state(&mut self, state: GameState) {
            self.last_phase = state.phase;
            self.state = state;
            self.input = TickInput::default();
        }
    }

    fn set_lamp(document: &web_sys::Document, id: &str, on: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if on { "lamp on" } else { "lamp" });
        }
    }

    /// Load saved game from LocalStorage
    fn load_saved_game() -> Option<GameState> {
        let storage = web_sys::window()?.local_storage().ok()??;
        let json = storage.get_item(SAVE_KEY).ok()??;
        serde_json::from_str(&json).ok()
    }

    /// Clear saved game from LocalStorage
    fn clear_saved_game() {
        if let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        {
            let _ = storage.remove_item(SAVE_KEY);
            log::info!("Saved game cleared");
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Space Drop Pinball starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set backing size; the renderer scales the table to fit
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));

        log::info!("Game initialized with seed: {}", seed);

        match Renderer::new(canvas.clone()) {
            Ok(renderer) => game.borrow_mut().renderer = Some(renderer),
            Err(e) => log::error!("Failed to create renderer: {:?}", e),
        }

        // Check for saved game
        let saved_game = load_saved_game();
        let has_save = saved_game.is_some();

        if let Some(ref save) = saved_game {
            // Show continue prompt
            if let Some(el) = document.get_element_by_id("continue-prompt") {
                let _ = el.set_attribute("class", "");
            }
            if let Some(el) = document.get_element_by_id("continue-score") {
                el.set_text_content(Some(&save.score.to_string()));
            }
            log::info!("Found saved game at score {}", save.score);
        }

        setup_input_handlers(&canvas, game.clone());
        setup_restart_button(game.clone());
        setup_pause_menu(game.clone());
        setup_continue_prompt(game.clone(), saved_game);
        setup_auto_pause(game.clone());

        // Show HUD (unless we're showing the continue prompt)
        if let Some(hud) = document.get_element_by_id("hud") {
            if !has_save {
                let _ = hud.set_attribute("class", "");
            }
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Space Drop Pinball running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Keyboard: flippers and plunger are level inputs, nudges and pause
        // are one-shots
        {
            let game = game.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.input.left = true,
                    "ArrowRight" | "d" | "D" => g.input.right = true,
                    " " | "ArrowDown" => {
                        event.prevent_default();
                        g.input.launch = true;
                    }
                    "z" | "Z" => g.input.nudge = Some(Nudge::Left),
                    "x" | "X" => g.input.nudge = Some(Nudge::Up),
                    "c" | "C" => g.input.nudge = Some(Nudge::Right),
                    "Escape" => g.input.pause = true,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.input.left = false,
                    "ArrowRight" | "d" | "D" => g.input.right = false,
                    " " | "ArrowDown" => g.input.launch = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: while serving any touch charges the plunger; in play the
        // left/right canvas halves drive the flippers
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Serve {
                    g.input.launch = true;
                    return;
                }
                apply_touches(&mut g, &canvas_clone, &event);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Serve {
                    // Release launches; touches() excludes lifted fingers
                    g.input.launch = event.touches().length() > 0;
                    return;
                }
                apply_touches(&mut g, &canvas_clone, &event);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Map remaining touches to flipper inputs by canvas half.
    fn apply_touches(g: &mut Game, canvas: &HtmlCanvasElement, event: &TouchEvent) {
        let rect = canvas.get_bounding_client_rect();
        let mid = rect.left() + rect.width() / 2.0;
        let mut left = false;
        let mut right = false;
        let touches = event.touches();
        for i in 0..touches.length() {
            if let Some(touch) = touches.get(i) {
                if (touch.client_x() as f64) < mid {
                    left = true;
                } else {
                    right = true;
                }
            }
        }
        g.input.left = left;
        g.input.right = right;
        g.input.launch = false;
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                clear_saved_game();
                log::info!("Game restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pause_menu(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Resume button
        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().input.pause = true; // Toggle back to play
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Theme cycle button
        if let Some(btn) = document.get_element_by_id("theme-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.settings.theme = g.settings.theme.cycle();
                g.settings.save();
                log::info!("Theme: {}", g.settings.theme.as_str());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Save & Quit button
        if let Some(btn) = document.get_element_by_id("save-quit-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow().save_game();
                // Reload page to show continue prompt
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_continue_prompt(game: Rc<RefCell<Game>>, saved_game: Option<GameState>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Continue button
        if let Some(btn) = document.get_element_by_id("continue-btn") {
            let game = game.clone();
            let saved = saved_game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Some(ref state) = saved {
                    game.borrow_mut().load_state(state.clone());
                    log::info!("Loaded saved game at score {}", state.score);
                }
                // Hide continue prompt, show HUD
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(el) = document.get_element_by_id("continue-prompt") {
                    let _ = el.set_attribute("class", "hidden");
                }
                if let Some(el) = document.get_element_by_id("hud") {
                    let _ = el.set_attribute("class", "");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // New Game button
        if let Some(btn) = document.get_element_by_id("new-game-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                clear_saved_game();

                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);

                // Hide continue prompt, show HUD
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(el) = document.get_element_by_id("continue-prompt") {
                    let _ = el.set_attribute("class", "hidden");
                }
                if let Some(el) = document.get_element_by_id("hud") {
                    let _ = el.set_attribute("class", "");
                }

                log::info!("Started new game with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Playing || g.state.phase == GamePhase::Serve {
                        g.input.pause = true;
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Playing || g.state.phase == GamePhase::Serve {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use space_drop_pinball::sim::{GamePhase, GameState, TickInput, tick};

    env_logger::init();
    log::info!("Space Drop Pinball (native) starting...");
    log::info!("Native mode runs a scripted headless round - use `trunk serve` for the web version");

    let seed = 0xC0FFEE;
    let mut state = GameState::new(seed);

    // Charge the plunger to full, then release
    let held = TickInput {
        launch: true,
        ..Default::default()
    };
    for _ in 0..60 {
        tick(&mut state, &held);
    }
    tick(&mut state, &TickInput::default());

    // Flail the flippers until the ball drains (or give up)
    let mut ticks = 0u32;
    while state.phase != GamePhase::GameOver && ticks < 36_000 {
        let input = TickInput {
            left: ticks % 45 < 12,
            right: ticks % 60 < 15,
            ..Default::default()
        };
        tick(&mut state, &input);
        ticks += 1;
    }

    let summary = state.summary();
    println!("Round finished after {} ticks", state.time_ticks);
    println!("  score:      {} (x{})", summary.score, summary.multiplier);
    println!("  bumpers:    {}", summary.stats.bumper_hits);
    println!("  slings:     {}", summary.stats.sling_hits);
    println!("  rollovers:  {} full sets", summary.stats.rollover_sets);
    println!("  saves:      {}", summary.stats.balls_saved);
    println!("  kickbacks:  {}", summary.stats.kickbacks_used);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
