//! DVD Corner entry point
//!
//! On the web this wires the DOM to a `Session` and runs the frame loop.
//! Natively it is a headless runner: one shot on a virtual clock, summary
//! printed as JSON.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        AddEventListenerOptions, CanvasRenderingContext2d, Document, Element, HtmlCanvasElement,
        HtmlElement, HtmlInputElement, HtmlSelectElement, MouseEvent, TouchEvent,
    };

    use dvd_corner::consts::COLOR_TICK_MS;
    use dvd_corner::effects::PARTICLE_SIZE;
    use dvd_corner::settings::resolve_timer_secs;
    use dvd_corner::sim::{Background, Deferred, Mode, Session, SimEvent};
    use dvd_corner::{EffectPool, FloodEndMode, InfinityStyle, Scheduler, SpeedSetting, hsl};

    /// Timer work requested by the session during one call
    #[derive(Debug)]
    enum HostOp {
        StartCountdown(u32),
        CancelCountdown,
        Defer(u32, Deferred),
    }

    /// Collects scheduler requests; `flush` installs them as browser timers
    #[derive(Default)]
    struct WebScheduler {
        frame_requested: bool,
        ops: Vec<HostOp>,
    }

    impl Scheduler for WebScheduler {
        fn request_frame(&mut self) {
            self.frame_requested = true;
        }

        fn start_countdown(&mut self, period_ms: u32) {
            self.ops.push(HostOp::StartCountdown(period_ms));
        }

        fn cancel_countdown(&mut self) {
            self.ops.push(HostOp::CancelCountdown);
        }

        fn defer(&mut self, delay_ms: u32, task: Deferred) {
            self.ops.push(HostOp::Defer(delay_ms, task));
        }
    }

    /// DOM handles used every frame
    struct Elements {
        page: HtmlElement,
        dvd: HtmlElement,
        bounce_count: Option<Element>,
        coverage: Option<Element>,
        aim_canvas: HtmlCanvasElement,
        aim_ctx: CanvasRenderingContext2d,
        flood_canvas: HtmlCanvasElement,
        flood_ctx: CanvasRenderingContext2d,
        effects_canvas: HtmlCanvasElement,
        effects_ctx: CanvasRenderingContext2d,
        flash: Option<HtmlElement>,
        warning: Option<HtmlElement>,
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        effects: EffectPool,
        sched: WebScheduler,
        frame_pending: bool,
        countdown_id: Option<i32>,
        el: Elements,
    }

    fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
        document.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
        canvas.get_context("2d").ok()??.dyn_into().ok()
    }

    fn viewport() -> DVec2 {
        let window = web_sys::window().unwrap();
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
        DVec2::new(w, h)
    }

    fn set_px(el: &HtmlElement, prop: &str, value: f64) {
        let _ = el.style().set_property(prop, &format!("{}px", value));
    }

    impl Game {
        fn body_size(&self) -> DVec2 {
            DVec2::new(
                self.el.dvd.client_width() as f64,
                self.el.dvd.client_height() as f64,
            )
        }

        fn resize_canvases(&self, size: DVec2) {
            for canvas in [
                &self.el.aim_canvas,
                &self.el.flood_canvas,
                &self.el.effects_canvas,
            ] {
                canvas.set_width(size.x as u32);
                canvas.set_height(size.y as u32);
            }
        }

        fn clear_aim(&self) {
            let c = &self.el.aim_canvas;
            self.el
                .aim_ctx
                .clear_rect(0.0, 0.0, c.width() as f64, c.height() as f64);
        }

        fn draw_aim(&self, from: DVec2, to: DVec2) {
            self.clear_aim();
            let ctx = &self.el.aim_ctx;
            let dash = js_sys::Array::of2(&JsValue::from(4.0), &JsValue::from(6.0));
            let _ = ctx.set_line_dash(&dash);
            ctx.set_stroke_style_str("white");
            ctx.set_line_width(2.0);
            ctx.begin_path();
            ctx.move_to(from.x, from.y);
            ctx.line_to(to.x, to.y);
            ctx.stroke();
        }

        fn clear_flood(&self) {
            let c = &self.el.flood_canvas;
            self.el
                .flood_ctx
                .clear_rect(0.0, 0.0, c.width() as f64, c.height() as f64);
        }

        /// DOM side of one simulation event
        fn show_event(&self, event: &SimEvent) {
            match event {
                SimEvent::BounceCount(n) => {
                    if let Some(el) = &self.el.bounce_count {
                        el.set_text_content(Some(&n.to_string()));
                    }
                }
                SimEvent::AimLine { from, to } => self.draw_aim(*from, *to),
                SimEvent::AimCleared => self.clear_aim(),
                SimEvent::Paint {
                    top_left,
                    size,
                    hue,
                } => {
                    self.el.flood_ctx.set_fill_style_str(&hsl(*hue, 100, 40));
                    self.el
                        .flood_ctx
                        .fill_rect(top_left.x, top_left.y, size.x, size.y);
                }
                SimEvent::CoverageCleared => self.clear_flood(),
                SimEvent::Coverage(pct) => {
                    if let Some(el) = &self.el.coverage {
                        el.set_text_content(Some(&format!("{:.1}%", pct)));
                    }
                }
                SimEvent::FloodEnded { reason, coverage } => {
                    log::info!("{} {:.1}%", reason.message(), coverage);
                }
                _ => {}
            }
        }

        /// Position the logo, background and effects
        fn render(&self) {
            let session = &self.session;
            let body = session.body();
            set_px(&self.el.dvd, "left", body.pos.x);
            set_px(&self.el.dvd, "top", body.pos.y);
            let _ = self
                .el
                .dvd
                .style()
                .set_property("background", &hsl(session.hue(), 100, 50));

            let background = match session.background() {
                Background::Black => "#000".to_string(),
                Background::Hue(hue) => hsl(hue, 100, 10),
            };
            let _ = self.el.page.style().set_property("background", &background);

            let ctx = &self.el.effects_ctx;
            let c = &self.el.effects_canvas;
            ctx.clear_rect(0.0, 0.0, c.width() as f64, c.height() as f64);
            for trail in &self.effects.trails {
                ctx.set_global_alpha(trail.opacity() as f64);
                ctx.set_fill_style_str(&hsl(trail.hue, 100, 50));
                ctx.fill_rect(trail.top_left.x, trail.top_left.y, trail.size.x, trail.size.y);
            }
            ctx.set_global_alpha(1.0);
            for p in &self.effects.particles {
                ctx.set_fill_style_str(&hsl(p.hue, 100, 50));
                ctx.begin_path();
                let _ = ctx.arc(p.pos.x, p.pos.y, PARTICLE_SIZE / 2.0, 0.0, std::f64::consts::TAU);
                ctx.fill();
            }

            if let Some(flash) = &self.el.flash {
                let _ = flash
                    .style()
                    .set_property("opacity", &self.effects.flash.to_string());
            }
            if let Some(warning) = &self.el.warning {
                match &self.effects.banner {
                    Some(banner) => {
                        warning.set_text_content(Some(&banner.text));
                        let _ = warning.style().set_property("opacity", "1");
                    }
                    None => {
                        let _ = warning.style().set_property("opacity", "0");
                    }
                }
            }
        }
    }

    /// Run `f` against the session, then apply its events and timer requests
    fn with_session<F>(game: &Rc<RefCell<Game>>, f: F)
    where
        F: FnOnce(&mut Session, &mut WebScheduler),
    {
        {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            f(&mut g.session, &mut g.sched);
        }
        flush(game);
    }

    fn flush(game: &Rc<RefCell<Game>>) {
        let ops = {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            if std::mem::take(&mut g.sched.frame_requested) {
                g.frame_pending = true;
            }
            for event in g.session.drain_events() {
                g.effects.apply(&event);
                g.show_event(&event);
            }
            std::mem::take(&mut g.sched.ops)
        };

        for op in ops {
            match op {
                HostOp::StartCountdown(period_ms) => start_countdown(game, period_ms),
                HostOp::CancelCountdown => cancel_countdown(game),
                HostOp::Defer(delay_ms, task) => defer(game, delay_ms, task),
            }
        }
    }

    fn cancel_countdown(game: &Rc<RefCell<Game>>) {
        if let Some(id) = game.borrow_mut().countdown_id.take() {
            web_sys::window().unwrap().clear_interval_with_handle(id);
        }
    }

    fn start_countdown(game: &Rc<RefCell<Game>>, period_ms: u32) {
        cancel_countdown(game);
        let target = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            with_session(&target, |session, sched| session.countdown_tick(sched));
        });
        let id = web_sys::window()
            .unwrap()
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms as i32,
            );
        closure.forget();
        match id {
            Ok(id) => game.borrow_mut().countdown_id = Some(id),
            Err(e) => log::error!("setInterval failed: {:?}", e),
        }
    }

    fn defer(game: &Rc<RefCell<Game>>, delay_ms: u32, task: Deferred) {
        let target = game.clone();
        let callback = Closure::once_into_js(move || {
            with_session(&target, |session, _| session.run_deferred(task));
        });
        let _ = web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms as i32,
            );
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("DVD Corner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas = |id: &str| -> HtmlCanvasElement {
            by_id(&document, id).unwrap_or_else(|| panic!("missing canvas #{}", id))
        };
        let aim_canvas = canvas("aimLine");
        let flood_canvas = canvas("floodCanvas");
        let effects_canvas = canvas("effectsCanvas");

        let el = Elements {
            page: document.body().expect("no body"),
            dvd: by_id(&document, "dvd").expect("missing #dvd"),
            bounce_count: document.get_element_by_id("bounceCount"),
            coverage: document.get_element_by_id("coveragePercent"),
            aim_ctx: context_2d(&aim_canvas).expect("no 2d context"),
            aim_canvas,
            flood_ctx: context_2d(&flood_canvas).expect("no 2d context"),
            flood_canvas,
            effects_ctx: context_2d(&effects_canvas).expect("no 2d context"),
            effects_canvas,
            flash: by_id(&document, "flash"),
            warning: by_id(&document, "warning"),
        };

        let size = viewport();
        let body_size = DVec2::new(el.dvd.client_width() as f64, el.dvd.client_height() as f64);
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game {
            session: Session::new(size, body_size),
            effects: EffectPool::new(seed),
            sched: WebScheduler::default(),
            frame_pending: false,
            countdown_id: None,
            el,
        }));
        game.borrow().resize_canvases(size);

        setup_pointer_handlers(&document, game.clone());
        setup_option_handlers(&document, game.clone());
        setup_mode_buttons(&document, game.clone());
        setup_resize(game.clone());
        setup_color_cycle(game.clone());
        show_menu(&document, true);

        request_animation_frame(game);

        log::info!("DVD Corner running!");
    }

    fn listen<E, F>(target: &web_sys::EventTarget, kind: &str, passive: bool, mut handler: F)
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            closure.as_ref().unchecked_ref(),
            &options,
        );
        closure.forget();
    }

    fn touch_pos(event: &TouchEvent) -> Option<DVec2> {
        let touch = event.touches().get(0)?;
        Some(DVec2::new(touch.client_x() as f64, touch.client_y() as f64))
    }

    fn setup_pointer_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        let dvd: web_sys::EventTarget = game.borrow().el.dvd.clone().into();
        let doc: &web_sys::EventTarget = document.as_ref();

        {
            let game = game.clone();
            listen(&dvd, "mousedown", false, move |event: MouseEvent| {
                event.prevent_default();
                let pos = DVec2::new(event.client_x() as f64, event.client_y() as f64);
                with_session(&game, |session, sched| {
                    session.pointer_down(pos, sched);
                });
            });
        }
        {
            let game = game.clone();
            listen(&dvd, "touchstart", false, move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_pos(&event) {
                    with_session(&game, |session, sched| {
                        session.pointer_down(pos, sched);
                    });
                }
            });
        }
        {
            let game = game.clone();
            listen(doc, "mousemove", false, move |event: MouseEvent| {
                let pos = DVec2::new(event.client_x() as f64, event.client_y() as f64);
                with_session(&game, |session, _| session.pointer_move(pos));
            });
        }
        {
            let game = game.clone();
            listen(doc, "touchmove", false, move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_pos(&event) {
                    with_session(&game, |session, _| session.pointer_move(pos));
                }
            });
        }
        for kind in ["mouseup", "touchend"] {
            let game = game.clone();
            listen(doc, kind, false, move |_event: web_sys::Event| {
                with_session(&game, |session, sched| session.pointer_up(sched));
            });
        }
    }

    fn input_value(document: &Document, id: &str) -> String {
        by_id::<HtmlInputElement>(document, id)
            .map(|el| el.value())
            .unwrap_or_default()
    }

    fn select_value(document: &Document, id: &str) -> String {
        by_id::<HtmlSelectElement>(document, id)
            .map(|el| el.value())
            .unwrap_or_default()
    }

    fn setup_option_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        // Speed: custom input overrides the preset
        for (id, kind) in [("speedSelect", "change"), ("speedInput", "input")] {
            let Some(target) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let document = document.clone();
            listen(&target, kind, true, move |_event: web_sys::Event| {
                let speed = SpeedSetting::resolve(
                    &input_value(&document, "speedInput"),
                    &select_value(&document, "speedSelect"),
                );
                with_session(&game, |session, sched| session.set_speed(speed, sched));
            });
        }

        if let Some(target) = document.get_element_by_id("floodModeSelect") {
            let game = game.clone();
            let document = document.clone();
            listen(&target, "change", true, move |_event: web_sys::Event| {
                let mode = FloodEndMode::from_str(&select_value(&document, "floodModeSelect"))
                    .unwrap_or_default();
                if let Some(options) = by_id::<HtmlElement>(&document, "timerOptions") {
                    let display = if mode == FloodEndMode::Timer {
                        "inline-block"
                    } else {
                        "none"
                    };
                    let _ = options.style().set_property("display", display);
                }
                game.borrow_mut().session.settings_mut().flood_end = mode;
            });
        }

        for (id, kind) in [("timerPreset", "change"), ("timerCustom", "input")] {
            let Some(target) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let document = document.clone();
            listen(&target, kind, true, move |_event: web_sys::Event| {
                let secs = resolve_timer_secs(
                    &input_value(&document, "timerCustom"),
                    &select_value(&document, "timerPreset"),
                );
                game.borrow_mut().session.settings_mut().timer_secs = secs;
            });
        }

        if let Some(target) = document.get_element_by_id("infinityStyle") {
            let document = document.clone();
            listen(&target, "change", true, move |_event: web_sys::Event| {
                let style = InfinityStyle::from_str(&select_value(&document, "infinityStyle"))
                    .unwrap_or_default();
                game.borrow_mut().session.settings_mut().infinity_style = style;
            });
        }
    }

    fn set_display(document: &Document, id: &str, display: &str) {
        if let Some(el) = by_id::<HtmlElement>(document, id) {
            let _ = el.style().set_property("display", display);
        }
    }

    fn show_menu(document: &Document, visible: bool) {
        set_display(document, "modeSelectScreen", if visible { "flex" } else { "none" });
        let panel = if visible { "none" } else { "block" };
        set_display(document, "uiPanel", panel);
        set_display(document, "exitBtn", panel);
        for id in ["classicUI", "floodUI", "infinityUI"] {
            set_display(document, id, "none");
        }
    }

    fn setup_mode_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for (id, mode, panel) in [
            ("classicBtn", Mode::Classic, "classicUI"),
            ("floodBtn", Mode::Flood, "floodUI"),
            ("infinityBtn", Mode::Infinity, "infinityUI"),
        ] {
            let Some(target) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let document = document.clone();
            listen(&target, "click", true, move |_event: MouseEvent| {
                show_menu(&document, false);
                set_display(&document, panel, "block");
                game.borrow_mut().effects.clear();
                with_session(&game, |session, sched| session.enter_mode(mode, sched));
            });
        }

        if let Some(target) = document.get_element_by_id("exitBtn") {
            let document = document.clone();
            listen(&target, "click", true, move |_event: MouseEvent| {
                show_menu(&document, true);
                game.borrow_mut().effects.clear();
                with_session(&game, |session, sched| session.return_to_menu(sched));
            });
        }
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window: web_sys::EventTarget = web_sys::window().unwrap().into();
        listen(&window, "resize", true, move |_event: web_sys::Event| {
            let size = viewport();
            let body_size = {
                let g = game.borrow();
                g.resize_canvases(size);
                g.body_size()
            };
            with_session(&game, |session, _| session.resize(size, body_size));
        });
    }

    fn setup_color_cycle(game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut()>::new(move || {
            game.borrow_mut().session.color_tick();
        });
        let _ = web_sys::window()
            .unwrap()
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                COLOR_TICK_MS as i32,
            );
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            if std::mem::take(&mut g.frame_pending) {
                g.session.frame(&mut g.sched);
            }
            g.effects.tick();
        }
        flush(&game);
        game.borrow().render();

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
mod headless {
    use std::error::Error;

    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    use dvd_corner::sim::{Mode, Phase, Session, Shot, SimEvent, predicts_corner_hit};
    use dvd_corner::{ManualScheduler, Settings};

    /// One headless shot
    #[derive(Debug, Deserialize)]
    #[serde(default)]
    pub struct RunConfig {
        pub viewport: DVec2,
        pub body_size: DVec2,
        pub mode: Mode,
        pub settings: Settings,
        /// Logo top-left at release
        pub release_at: DVec2,
        pub frame_ms: u64,
        pub max_ms: u64,
    }

    impl Default for RunConfig {
        fn default() -> Self {
            Self {
                viewport: DVec2::new(1280.0, 720.0),
                body_size: DVec2::new(120.0, 60.0),
                mode: Mode::Classic,
                settings: Settings::default(),
                release_at: DVec2::new(900.0, 500.0),
                frame_ms: 16,
                max_ms: 120_000,
            }
        }
    }

    /// What happened
    #[derive(Debug, Serialize)]
    pub struct RunSummary {
        pub mode: Mode,
        pub shot: Option<Shot>,
        pub predicted_corner: bool,
        pub final_phase: Phase,
        pub bounces: u32,
        pub coverage: f64,
        pub frames: u64,
        pub elapsed_ms: u64,
        /// Everything except per-frame trail/paint events
        pub events: Vec<SimEvent>,
    }

    pub fn run(config: RunConfig) -> RunSummary {
        let mut sched = ManualScheduler::new();
        let mut session = Session::new(config.viewport, config.body_size);
        *session.settings_mut() = config.settings.clone();
        session.enter_mode(config.mode, &mut sched);

        let grab = session.body_center();
        session.pointer_down(grab, &mut sched);
        session.pointer_move(grab + (config.release_at - session.body().pos));
        session.pointer_up(&mut sched);

        let shot = session.shot().copied();
        let predicted_corner = shot
            .map(|s| predicts_corner_hit(&s, session.arena()))
            .unwrap_or(false);

        let mut events = Vec::new();
        let deadline = sched.now_ms() + config.max_ms;
        // Stop once the shot has played out, before the deferred recenter wipes the result
        while session.is_animating() && sched.now_ms() < deadline {
            sched.advance(&mut session, config.frame_ms.max(1));
            events.extend(
                session
                    .drain_events()
                    .into_iter()
                    .filter(|e| !matches!(e, SimEvent::Trail { .. } | SimEvent::Paint { .. })),
            );
        }
        events.extend(session.drain_events());

        RunSummary {
            mode: config.mode,
            shot,
            predicted_corner,
            final_phase: session.phase(),
            bounces: session.bounces(),
            coverage: session.coverage().percentage(),
            frames: sched.frames_run(),
            elapsed_ms: sched.now_ms(),
            events,
        }
    }

    pub fn load_config(path: Option<&str>) -> Result<RunConfig, Box<dyn Error>> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(RunConfig::default()),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("DVD Corner (native) starting...");
    log::info!("Native mode is a headless runner - run with `trunk serve` for the web version");

    let path = std::env::args().nth(1);
    let config = headless::load_config(path.as_deref())?;
    let summary = headless::run(config);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
