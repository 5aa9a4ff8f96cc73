//! Token Slash entry point
//!
//! Handles platform-specific initialization and drives the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement, KeyboardEvent, MouseEvent, TouchEvent,
    };

    use token_slash::platform::effects::DomEffects;
    use token_slash::platform::{ClientRect, KeyAction, PointerEvent, client_to_canvas, dispatch_pointer};
    use token_slash::renderer::{CanvasSurface, render_session};
    use token_slash::sim::{FrameScheduler, Playfield, RunState, SimEvent, SimulationSession};
    use token_slash::{Scoreboard, Settings, SettingsChange, SimConfig};

    /// Game instance holding all state
    struct Game {
        scheduler: FrameScheduler,
        surface: CanvasSurface,
        effects: DomEffects,
        scoreboard: Scoreboard,
        settings: Settings,
        /// Events collected since the last drain
        events: Vec<SimEvent>,
    }

    impl Game {
        fn canvas_rect(&self) -> ClientRect {
            let rect = self.surface.canvas().get_bounding_client_rect();
            ClientRect {
                left: rect.left() as f32,
                top: rect.top() as f32,
                width: rect.width() as f32,
                height: rect.height() as f32,
            }
        }

        /// Client coordinates to canvas pixels
        fn to_canvas(&self, x: i32, y: i32) -> Vec2 {
            let canvas = self.surface.canvas();
            let size = Vec2::new(canvas.width() as f32, canvas.height() as f32);
            client_to_canvas(Vec2::new(x as f32, y as f32), self.canvas_rect(), size)
        }

        fn pointer(&mut self, event: PointerEvent) {
            let now = now_ms();
            dispatch_pointer(self.scheduler.session_mut(), event, now, &mut self.events);
            self.drain_events(now);
        }

        /// Fold pending events into the scoreboard and effects
        fn drain_events(&mut self, now: f64) {
            if self.events.is_empty() {
                return;
            }
            let rect = self.canvas_rect();
            let mut best_moved = false;
            for event in std::mem::take(&mut self.events) {
                best_moved |= self.scoreboard.apply(&event);
                self.effects.present(&event, rect, now);
            }
            if best_moved {
                self.scoreboard.save();
            }
            if self.scoreboard.is_game_over() && self.scheduler.state() != RunState::Idle {
                self.end_session();
            }
        }

        fn start_session(&mut self) {
            self.effects.clear();
            self.scoreboard.reset();
            self.scheduler.start_session();
        }

        fn end_session(&mut self) {
            self.scheduler.end_session();
            self.effects.clear();
            self.scoreboard.save();
        }

        /// Apply a settings panel edit, persist it and push it down
        fn change_settings(&mut self, change: SettingsChange) {
            self.settings.apply_change(change);
            self.settings.save();
            self.scheduler.session_mut().apply_settings(&self.settings);
            self.effects.apply_settings(&self.settings);
            log::info!("Settings changed: {:?}", change);
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.surface.resize(width, height);
            self.scheduler
                .session_mut()
                .resize(width as f32, height as f32);
        }

        fn frame(&mut self, time: f64) {
            let report = self.scheduler.pump(time, &mut self.events);
            if report.missed > 0 {
                log::debug!("{} token(s) missed", report.missed);
            }
            self.drain_events(time);
            self.effects.update(time);
            render_session(&mut self.surface, self.scheduler.session());
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let board = &self.scoreboard;
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&board.score.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-lives .hud-value").ok().flatten() {
                el.set_text_content(Some(&board.lives.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-best .hud-value").ok().flatten() {
                el.set_text_content(Some(&board.best_score.to_string()));
            }

            let state = self.scheduler.state();
            toggle_hidden(document, "pause-menu", !matches!(state, RunState::Paused | RunState::Suspended));
            toggle_hidden(document, "game-over", !board.is_game_over());
            if board.is_game_over() {
                if let Some(el) = document.get_element_by_id("final-score") {
                    el.set_text_content(Some(&board.score.to_string()));
                }
                if let Some(el) = document.get_element_by_id("final-slashes") {
                    el.set_text_content(Some(&board.total_slashes().to_string()));
                }
            }
        }
    }

    fn toggle_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn now_ms() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    /// Backing store size for the canvas's CSS box
    fn canvas_pixels(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        (width, height)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Token Slash starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let (width, height) = canvas_pixels(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let mut session = SimulationSession::new(
            SimConfig::default(),
            Playfield::new(width as f32, height as f32),
            seed,
        );
        session.apply_settings(&settings);

        let mut effects = DomEffects::new(document.clone());
        effects.apply_settings(&settings);

        let game = Rc::new(RefCell::new(Game {
            scheduler: FrameScheduler::new(session),
            surface: CanvasSurface::new(canvas.clone())?,
            effects,
            scoreboard: Scoreboard::load(),
            settings,
            events: Vec::new(),
        }));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone())?;
        setup_buttons(&document, game.clone())?;
        setup_settings(&document, game.clone())?;
        setup_visibility(&document, game.clone())?;
        setup_resize(&window, &canvas, game.clone())?;

        {
            let mut g = game.borrow_mut();
            let visible = document.visibility_state() != web_sys::VisibilityState::Hidden;
            g.scheduler.set_visibility(visible);
            g.start_session();
            log::info!("Quality: {}", g.settings.quality.as_str());
        }

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game);

        log::info!("Token Slash running!");
        Ok(())
    }

    fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        // Mouse
        {
            let game = game.clone();
            listen(canvas, "mousedown", move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = g.to_canvas(event.client_x(), event.client_y());
                g.pointer(PointerEvent::Down(pos));
            })?;
        }
        {
            let game = game.clone();
            listen(canvas, "mousemove", move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.scheduler.session().stroke_active() {
                    let pos = g.to_canvas(event.client_x(), event.client_y());
                    g.pointer(PointerEvent::Move(pos));
                }
            })?;
        }
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            listen(canvas, name, move |_event: MouseEvent| {
                game.borrow_mut().pointer(PointerEvent::Up);
            })?;
        }

        // Touch
        {
            let game = game.clone();
            listen(canvas, "touchstart", move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut g = game.borrow_mut();
                    let pos = g.to_canvas(touch.client_x(), touch.client_y());
                    g.pointer(PointerEvent::Down(pos));
                }
            })?;
        }
        {
            let game = game.clone();
            listen(canvas, "touchmove", move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut g = game.borrow_mut();
                    let pos = g.to_canvas(touch.client_x(), touch.client_y());
                    g.pointer(PointerEvent::Move(pos));
                }
            })?;
        }
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            listen(canvas, name, move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().pointer(PointerEvent::Up);
            })?;
        }

        // Keyboard
        let window = web_sys::window().ok_or("no window")?;
        listen(&window, "keydown", move |event: KeyboardEvent| {
            if let Some(KeyAction::TogglePause) = KeyAction::from_key(&event.key()) {
                event.prevent_default();
                game.borrow_mut().scheduler.toggle_pause();
            }
        })?;
        Ok(())
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        for id in ["restart-btn", "play-again-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                listen(&btn, "click", move |_event: MouseEvent| {
                    game.borrow_mut().start_session();
                    log::info!("Game restarted");
                })?;
            }
        }
        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let game = game.clone();
            listen(&btn, "click", move |_event: MouseEvent| {
                game.borrow_mut().scheduler.resume();
            })?;
        }
        if let Some(btn) = document.get_element_by_id("quit-btn") {
            listen(&btn, "click", move |_event: MouseEvent| {
                game.borrow_mut().end_session();
            })?;
        }
        Ok(())
    }

    /// Read a settings control as `(value, checked)`
    fn control_value(el: &web_sys::Element) -> Option<(String, bool)> {
        if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            return Some((select.value(), false));
        }
        el.dyn_ref::<HtmlInputElement>()
            .map(|input| (input.value(), input.checked()))
    }

    /// Show the current settings in the panel
    fn sync_settings_controls(document: &Document, settings: &Settings) {
        for id in SettingsChange::CONTROLS {
            let (Some(el), Some((value, checked))) = (document.get_element_by_id(id), settings.control_state(id)) else {
                continue;
            };
            if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
                select.set_value(&value.to_lowercase());
            } else if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
                input.set_checked(checked);
            }
        }
    }

    fn setup_settings(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        sync_settings_controls(document, &game.borrow().settings);
        for id in SettingsChange::CONTROLS {
            let Some(el) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let document = document.clone();
            let control = el.clone();
            listen(&el, "change", move |_event: web_sys::Event| {
                let Some((value, checked)) = control_value(&control) else {
                    return;
                };
                match SettingsChange::from_control(id, &value, checked) {
                    Some(change) => {
                        let mut g = game.borrow_mut();
                        g.change_settings(change);
                        // A preset can flip other toggles
                        sync_settings_controls(&document, &g.settings);
                    }
                    None => log::warn!("Ignoring {} value {:?}", id, value),
                }
            })?;
        }
        Ok(())
    }

    fn setup_visibility(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document_clone = document.clone();
        listen(document, "visibilitychange", move |_event: web_sys::Event| {
            let visible = document_clone.visibility_state() != web_sys::VisibilityState::Hidden;
            game.borrow_mut().scheduler.set_visibility(visible);
        })
    }

    fn setup_resize(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        let window_clone = window.clone();
        let canvas = canvas.clone();
        listen(window, "resize", move |_event: web_sys::Event| {
            let (width, height) = canvas_pixels(&window_clone, &canvas);
            game.borrow_mut().resize(width, height);
        })
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Token Slash (native) starting...");
    log::info!("Native mode runs headless - build for wasm32 to play in the browser");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    let board = headless_run(config, 42, 60_000.0);
    println!(
        "Headless run: score {}, lives {}, slashes {}, missed {}",
        board.score,
        board.lives,
        board.total_slashes(),
        board.tokens_missed
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Config from the JSON file named by `TOKEN_SLASH_CONFIG`, else defaults
#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> Result<token_slash::SimConfig, token_slash::ConfigError> {
    use token_slash::SimConfig;

    match std::env::var("TOKEN_SLASH_CONFIG") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(json) => SimConfig::from_json(&json),
            Err(e) => {
                log::warn!("Cannot read {}: {}, using defaults", path, e);
                Ok(SimConfig::default())
            }
        },
        Err(_) => Ok(SimConfig::default()),
    }
}

/// Play a session with a scripted blade: one horizontal sweep across the
/// middle of the playfield every half second.
#[cfg(not(target_arch = "wasm32"))]
fn headless_run(config: token_slash::SimConfig, seed: u64, duration_ms: f64) -> token_slash::Scoreboard {
    use glam::Vec2;
    use token_slash::Scoreboard;
    use token_slash::sim::{FrameScheduler, Playfield, SimulationSession};

    let field = Playfield::new(800.0, 600.0);
    let mut scheduler = FrameScheduler::new(SimulationSession::new(config, field, seed));
    let mut board = Scoreboard::new();
    scheduler.start_session();

    let step = scheduler.session().config().tick_period_ms;
    let mut now = 0.0;
    while now <= duration_ms {
        scheduler.pump(now, &mut board);

        // 500ms cycle: sweep during the first 160ms
        let phase = now % 500.0;
        let session = scheduler.session_mut();
        if phase < step {
            session.start_stroke(Vec2::new(0.0, field.height * 0.5), now);
        } else if phase < 160.0 {
            let x = (phase / 160.0) as f32 * field.width;
            session.add_point(Vec2::new(x, field.height * 0.5), now, &mut board);
        } else if phase < 160.0 + step {
            session.end_stroke(now);
        }

        if board.is_game_over() {
            log::info!("Game over at {:.1}s", now / 1000.0);
            break;
        }
        now += step;
    }
    scheduler.end_session();
    board
}
