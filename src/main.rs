//! Office Dash entry point
//!
//! Web: wires the DOM to the simulation and runs the frame loop.
//! Native: plays one headless run on autopilot and prints the results.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement};

    use office_dash::audio::AudioManager;
    use office_dash::sim::{BannerTiming, Entity, EntityKind, RunStats};
    use office_dash::{Game, GameEvent, GamePhase, RunState, Settings};

    /// Longest frame we simulate in one go (tab switches, breakpoints)
    const MAX_FRAME_MS: f64 = 100.0;
    const OBSTACLE_GLYPHS: [&str; 4] = ["🚧", "🛑", "⚠️", "🚨"];

    fn after(delay_ms: u32, f: impl FnOnce() + 'static) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(f);
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms as i32,
        );
        closure.forget();
    }

    fn glyph(entity: &Entity) -> &'static str {
        match entity.kind {
            EntityKind::Obstacle => OBSTACLE_GLYPHS[entity.variant as usize % OBSTACLE_GLYPHS.len()],
            EntityKind::Moon => "🌙",
            EntityKind::Coffee => "☕",
            EntityKind::Laptop => "💻",
            EntityKind::Jasmine => "👰",
        }
    }

    /// Game instance holding all state
    struct WebGame {
        game: Game,
        audio: AudioManager,
        settings: Settings,
        document: Document,
        last_time: f64,
        /// Sub-millisecond remainder carried between frames
        carry_ms: f64,
        /// Autopilot is playing behind the start screen
        demo: bool,
    }

    impl WebGame {
        fn new(seed: u64, document: Document) -> Self {
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);
            Self {
                game: Game::new(seed),
                audio,
                settings,
                document,
                last_time: 0.0,
                carry_ms: 0.0,
                demo: false,
            }
        }

        fn element(&self, id: &str) -> Option<Element> {
            self.document.get_element_by_id(id)
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.element(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_class(&self, id: &str, class: &str, on: bool) {
            if let Some(el) = self.element(id) {
                let list = el.class_list();
                let _ = if on { list.add_1(class) } else { list.remove_1(class) };
            }
        }

        fn set_style(&self, id: &str, prop: &str, value: &str) {
            if let Some(el) = self.element(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
                let _ = el.style().set_property(prop, value);
            }
        }

        /// Flip mute and remember it for next time
        fn toggle_mute(&mut self) {
            let muted = self.settings.toggle_mute();
            self.settings.save();
            self.audio.apply_settings(&self.settings);
            log::info!("Sound {}", if muted { "off" } else { "on" });
        }

        fn jump(&mut self) {
            self.audio.resume();
            self.game.jump_command();
        }

        fn start(&mut self) {
            self.audio.resume();
            self.audio.set_muted(false);
            self.demo = false;
            self.set_class("startScreen", "hidden", true);
            self.set_class("gameOverScreen", "hidden", true);
            self.set_class("officeBuilding", "show", false);
            self.game.restart();
        }

        /// Advance the simulation by one animation frame
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).min(MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            let total = dt + self.carry_ms;
            let whole = total.floor();
            self.carry_ms = total - whole;

            if self.settings.demo_on_idle {
                self.drive_demo();
            }
            self.game.advance(whole as u64);
            if self.demo && self.game.autopilot_wants_jump(whole as u64) {
                self.game.jump_command();
            }

            for event in self.game.drain_events() {
                self.apply(event);
            }
            self.place_entities();
        }

        /// Attract mode: silent autopilot runs until the player presses start
        fn drive_demo(&mut self) {
            match self.game.phase() {
                GamePhase::Idle => {
                    self.demo = true;
                    self.audio.set_muted(true);
                    self.game.start();
                }
                GamePhase::Ended | GamePhase::OfficeReached if self.demo => {
                    self.game.restart();
                }
                _ => {}
            }
        }

        fn apply(&mut self, event: GameEvent) {
            if let Some((text, timing)) = event.banner() {
                let class = match event {
                    GameEvent::OvertimeStarted { .. } => "overtime-banner",
                    _ => "stage-indicator",
                };
                self.show_banner(class, text, timing);
            }

            match event {
                GameEvent::DisplayUpdate { state } => self.update_hud(&state),
                GameEvent::StageChanged { stage, .. } => {
                    let underground = stage.is_underground();
                    self.set_class("gameContainer", "subway", underground);
                    self.set_class("ground", "subway", underground);
                }
                GameEvent::EntitySpawned { entity } => self.add_entity(&entity),
                GameEvent::EntityRemoved { id, .. } => {
                    if let Some(el) = self.element(&format!("entity-{id}")) {
                        el.remove();
                    }
                }
                GameEvent::Sound { sound } => self.audio.play(sound),
                GameEvent::PlayerJumped => self.set_style("player", "bottom", "280px"),
                GameEvent::PlayerLanded => self.set_style("player", "bottom", "140px"),
                GameEvent::InvulnerabilityChanged { active } => {
                    self.set_style("player", "opacity", if active { "0.5" } else { "1" });
                }
                GameEvent::PlayerBuffChanged { active } => {
                    let on = active && self.settings.show_effects();
                    self.set_class("player", "glowing", on);
                }
                GameEvent::OfficeReached { .. } => {
                    self.set_class("officeBuilding", "show", true);
                }
                GameEvent::OvertimeStarted { .. } => {
                    self.set_class("officeBuilding", "show", false);
                }
                GameEvent::RunEnded { .. } if self.demo => {}
                GameEvent::RunEnded {
                    stats,
                    was_overtime,
                } => self.show_results(&stats, was_overtime),
            }
        }

        fn update_hud(&self, state: &RunState) {
            self.set_text("moons", &state.moons.to_string());
            self.set_text("coffee", &state.coffee_count.to_string());
            self.set_text("laptops", &state.laptop_count.to_string());
            self.set_text("lives", &state.lives.to_string());
            self.set_text("timer", &state.elapsed_seconds.to_string());
        }

        fn show_banner(&self, class: &str, text: &str, timing: BannerTiming) {
            if !self.settings.show_effects() {
                return;
            }
            let Some(container) = self.element("gameContainer") else {
                return;
            };
            let Ok(banner) = self.document.create_element("div") else {
                return;
            };
            banner.set_class_name(class);
            banner.set_text_content(Some(text));

            // Let CSS fade it, then drop it
            let lifetime_ms = timing.lifetime_ms;
            let show = move || {
                if container.append_child(&banner).is_ok() {
                    after(lifetime_ms, move || banner.remove());
                }
            };
            if timing.delay_ms > 0 {
                after(timing.delay_ms, show);
            } else {
                show();
            }
        }

        fn add_entity(&self, entity: &Entity) {
            let Some(container) = self.element("gameContainer") else {
                return;
            };
            let Ok(el) = self.document.create_element("div") else {
                return;
            };
            let class = if entity.kind.is_collectible() {
                "collectible"
            } else {
                "obstacle"
            };
            el.set_id(&format!("entity-{}", entity.id));
            el.set_class_name(class);
            el.set_text_content(Some(glyph(entity)));
            let _ = container.append_child(&el);
        }

        fn place_entities(&self) {
            for entity in self.game.entities() {
                let id = format!("entity-{}", entity.id);
                self.set_style(&id, "left", &format!("{}px", entity.pos.x));
                self.set_style(&id, "bottom", &format!("{}px", entity.pos.y));
            }
        }

        fn show_results(&self, stats: &RunStats, was_overtime: bool) {
            let (title, message) = RunStats::headline(was_overtime);
            self.set_text("finalMoons", &stats.moons.to_string());
            self.set_text("finalCoffee", &stats.coffee.to_string());
            self.set_text("finalLaptops", &stats.laptops.to_string());
            self.set_text("finalTime", &stats.elapsed_seconds.to_string());
            self.set_text("endTitle", title);
            self.set_text("endMessage", message);
            self.set_class("gameOverScreen", "hidden", false);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Office Dash starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - not running in a browser?");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(WebGame::new(seed, document.clone())));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_auto_mute(game.clone());

        request_animation_frame(game);
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<WebGame>>) {
        // Space bar jumps, M toggles sound
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                match event.code().as_str() {
                    "Space" => {
                        event.prevent_default();
                        game.borrow_mut().jump();
                    }
                    "KeyM" => game.borrow_mut().toggle_mute(),
                    _ => {}
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click/tap on the play field
        if let Some(container) = document.get_element_by_id("gameContainer") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if matches!(
                    g.game.phase(),
                    GamePhase::Running | GamePhase::OfficeReached | GamePhase::Overtime
                ) {
                    g.jump();
                }
            });
            let _ = container
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<WebGame>>) {
        for id in ["startButton", "restartButton"] {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing #{}", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_mute(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let demo = g.demo;
            g.audio.set_muted(demo);
        });
        let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<WebGame>>, time: f64) {
        game.borrow_mut().update(time);
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
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => office_dash::Tuning::default(),
    };

    log::info!("Office Dash (native) - headless autopilot run, seed {}", seed);
    let end = headless_run(seed, tuning);

    let (title, message) = office_dash::sim::RunStats::headline(end.was_overtime);
    println!("{title}");
    println!("{message}");
    println!(
        "time {}s | moons {} | coffee {} | laptops {} | lives {}",
        end.stats.elapsed_seconds, end.stats.moons, end.stats.coffee, end.stats.laptops, end.stats.lives
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Result<office_dash::Tuning, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(office_dash::Tuning::from_json(&json)?)
}

/// Autopilot through the commute, take overtime, and stop after a few minutes
#[cfg(not(target_arch = "wasm32"))]
fn headless_run(seed: u64, tuning: office_dash::Tuning) -> office_dash::sim::RunEnd {
    use office_dash::consts::SWEEP_INTERVAL_MS;
    use office_dash::{Game, GamePhase};

    const OVERTIME_CAP_MS: u64 = 180_000;

    let mut game = Game::with_tuning(seed, tuning);
    game.start();

    let mut overtime_ms = 0;
    loop {
        game.advance(SWEEP_INTERVAL_MS);
        game.drain_events();

        match game.phase() {
            GamePhase::OfficeReached => {
                game.jump_command();
                game.jump_command();
            }
            GamePhase::Overtime => {
                overtime_ms += SWEEP_INTERVAL_MS;
                if overtime_ms >= OVERTIME_CAP_MS {
                    log::info!("Clocking out after {}s of overtime", OVERTIME_CAP_MS / 1000);
                    game.end(true);
                }
            }
            _ => {}
        }

        if let Some(end) = game.last_end() {
            return end;
        }
        if game.autopilot_wants_jump(SWEEP_INTERVAL_MS) {
            game.jump_command();
        }
    }
}
