//! Slice Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop. The
//! wasm build wires pointer/touch producers into the trail buffer, drives
//! the fixed-timestep accumulator from requestAnimationFrame, updates the
//! DOM HUD and maps drained sim events onto audio. Rendering of entities is
//! left to the canvas layer, which reads the state snapshots each frame.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use glam::Vec2;
    use slice_rush::audio::{AudioManager, SoundEffect};
    use slice_rush::consts::*;
    use slice_rush::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use slice_rush::{HighScore, Settings};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        audio: AudioManager,
        best: HighScore,
        accumulator: f32,
        last_time: f64,
        /// Added to host-clock seconds to express pointer timestamps on the
        /// sim clock, refreshed every frame after ticking
        sim_clock_offset: f64,
        input: TickInput,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, bounds: Vec2) -> Self {
            let best = HighScore::load();
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.set_volume(settings.effective_volume());
            Self {
                state: GameState::new(seed, bounds, best.score),
                settings,
                audio,
                best,
                accumulator: 0.0,
                last_time: 0.0,
                sim_clock_offset: 0.0,
                input: TickInput::default(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks for one frame
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);

            if self.settings.fixed_timestep {
                self.accumulator += dt;
                let mut substeps = 0;
                while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                    let input = self.input;
                    tick(&mut self.state, &input, SIM_DT);
                    self.accumulator -= SIM_DT;
                    substeps += 1;
                    // Clear one-shot inputs after processing
                    self.input = TickInput::default();
                }
                // On a device too slow for the substep cap, shed the debt
                // instead of letting it grow without bound
                let max_debt = MAX_SUBSTEPS as f32 * SIM_DT;
                if self.accumulator > max_debt {
                    self.accumulator = max_debt;
                }
            } else {
                // Raw frame delta (frame-rate dependent, preserved as an option)
                let input = self.input;
                tick(&mut self.state, &input, dt);
                self.input = TickInput::default();
            }

            self.sim_clock_offset = self.state.time - time / 1000.0;

            self.drain_events();

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 {
                let elapsed = time - oldest;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Map sim events onto audio and persistence
        fn drain_events(&mut self) {
            let events: Vec<GameEvent> = self.state.events.drain(..).collect();
            for event in events {
                match event {
                    GameEvent::Sliced { combo, .. } => {
                        if combo >= 2 {
                            self.audio.play(SoundEffect::Combo);
                        } else {
                            self.audio.play(SoundEffect::Slice);
                        }
                    }
                    GameEvent::SpecialActivated { .. } => self.audio.play(SoundEffect::Special),
                    GameEvent::BombHit { .. } => self.audio.play(SoundEffect::Bomb),
                    GameEvent::Missed { .. } => self.audio.play(SoundEffect::Miss),
                    GameEvent::WaveStarted { .. } => self.audio.play(SoundEffect::WaveUp),
                    GameEvent::CriticalThrow => self.audio.play(SoundEffect::Critical),
                    GameEvent::GameOver { score } => {
                        self.audio.play(SoundEffect::GameOver);
                        // Belt and braces: persist even if no NewHighScore fired
                        self.best.submit(score);
                    }
                    GameEvent::NewHighScore { score } => {
                        // Write-through persistence in the same frame
                        if self.best.submit(score) {
                            self.audio.play(SoundEffect::HighScore);
                        }
                    }
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            let set_text = |id: &str, value: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(value));
                }
            };

            set_text("hud-score", &self.state.stats.score.to_string());
            set_text("hud-lives", &self.state.stats.lives.to_string());
            set_text("hud-wave", &self.state.wave.to_string());
            set_text("hud-best", &self.state.stats.high_score.to_string());
            if self.settings.show_fps {
                set_text("hud-fps", &self.fps.to_string());
            }

            // Combo readout only shows for an actual streak
            if let Some(el) = document.get_element_by_id("hud-combo") {
                if self.state.stats.combo >= 2 {
                    let mult = self.state.stats.combo.min(MAX_MULTIPLIER);
                    el.set_text_content(Some(&format!("x{}", mult)));
                    let _ = el.set_attribute("class", "hud-item");
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            show("menu-screen", self.state.phase == GamePhase::Menu);
            show("game-over-screen", self.state.phase == GamePhase::GameOver);
            show("wave-banner", self.state.wave_banner > 0.0);

            let flashes = self.settings.effective_flashes();
            show("critical-flash", flashes && self.state.critical_flash > 0.0);
            show("bomb-flash", flashes && self.state.bomb_flash > 0.0);

            if self.state.phase == GamePhase::GameOver {
                set_text("final-score", &self.state.stats.score.to_string());
                set_text("final-combo", &self.state.stats.max_combo.to_string());
            }
        }
    }

    fn now_seconds() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("failed to init logger");

        log::info!("Slice Rush starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas backing size; the sim runs in CSS pixel space
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        canvas.set_width((client_w as f64 * dpr) as u32);
        canvas.set_height((client_h as f64 * dpr) as u32);

        let seed = js_sys::Date::now() as u64;
        let bounds = Vec2::new(client_w as f32, client_h as f32);
        let game = Rc::new(RefCell::new(Game::new(seed, bounds)));

        log::info!("game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_blur_mute(game.clone());

        request_animation_frame(game);

        log::info!("Slice Rush running!");
    }

    /// Pointer/touch producers append to the trail buffer; the sim tick is
    /// the sole consumer. Loss of tracking simply stops the appends, which
    /// reads as "not swiping".
    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                let t = now_seconds() + g.sim_clock_offset;
                g.state.trail.push(pos, t);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let pos = Vec2::new(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    );
                    let mut g = game.borrow_mut();
                    let t = now_seconds() + g.sim_clock_offset;
                    g.state.trail.push(pos, t);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click/tap starts or restarts outside of play
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                let seed = js_sys::Date::now() as u64;
                match g.state.phase {
                    GamePhase::Menu => {
                        g.input.start = true;
                        g.input.seed = seed;
                    }
                    GamePhase::GameOver => {
                        g.input.restart = true;
                        g.input.seed = seed;
                    }
                    GamePhase::Playing => {}
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => {
                        let seed = js_sys::Date::now() as u64;
                        match g.state.phase {
                            GamePhase::Menu => {
                                g.input.start = true;
                                g.input.seed = seed;
                            }
                            GamePhase::GameOver => {
                                g.input.restart = true;
                                g.input.seed = seed;
                            }
                            GamePhase::Playing => {}
                        }
                    }
                    "Escape" => g.input.to_menu = true,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.start = true;
                g.input.seed = js_sys::Date::now() as u64;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.input.restart = true;
                g.input.seed = js_sys::Date::now() as u64;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.to_menu = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_blur_mute(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            if g.settings.mute_on_blur {
                g.audio.set_muted(true);
            }
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();

        // Unmute handled lazily on the next user gesture via audio.resume()
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use slice_rush::consts::*;
    use slice_rush::sim::{GamePhase, GameState, TickInput, tick};

    env_logger::init();
    log::info!("Slice Rush (native) starting...");
    log::info!("native mode runs a headless demo - build for wasm32 for the playable version");

    // Headless demo: a scripted horizontal sweep every half second
    let mut state = GameState::new(42, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), 0);
    let start = TickInput {
        start: true,
        seed: 42,
        ..Default::default()
    };
    tick(&mut state, &start, SIM_DT);

    let ticks = (20.0 / SIM_DT) as u32;
    for i in 0..ticks {
        if state.phase != GamePhase::Playing {
            break;
        }
        // Sweep the blade across mid-screen periodically
        if i % 60 < 4 {
            let x = (i % 60) as f32 * 200.0;
            state.trail.push(Vec2::new(x, VIEW_HEIGHT * 0.4), state.time);
        }
        tick(&mut state, &TickInput::default(), SIM_DT);
        state.events.clear();
    }

    println!(
        "demo over: score {} | sliced {} | max combo {} | wave {} | lives {}",
        state.stats.score,
        state.stats.fruits_sliced,
        state.stats.max_combo,
        state.wave,
        state.stats.lives
    );
}
