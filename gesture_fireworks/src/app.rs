//! Top-level application controller.
//!
//! `AppState` owns the firework `Engine`, the `InteractionMapper`, the
//! scripted `Sequencer` and the pending finale launches. The host drives it
//! with one `tick()` per rendered frame and feeds it the latest `HandState`
//! whenever the landmark source reports one.

use std::sync::mpsc;
use std::time::Instant;

use firework_engine::{
    Engine, EngineConfig, EngineError, RegistryEvent, ShapeKind, SpawnRequest, SystemId,
};
use hand_gesture::{Classifier, ClassifierConfig, HandLandmarks, HandState};
use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use thiserror::Error;

use crate::gesture::{latest_frame, spawn_hand_source, SimInput};
use crate::mapper::{Action, InteractionMapper, MapperConfig};
use crate::show::{Sequencer, ShowConfig};
use crate::visualizer::{UiCommand, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot open window: {0}")]
    Window(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine:       EngineConfig,
    pub classifier:   ClassifierConfig,
    pub mapper:       MapperConfig,
    pub show:         ShowConfig,
    /// Fixed simulation step per rendered frame (seconds).
    pub dt:           f32,
    /// Start the phrase show as soon as the window opens.
    pub autoplay:     bool,
    pub heart_scale:  f32,
    pub heart_y:      f32,
    pub finale_scale: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine:       EngineConfig::default(),
            classifier:   ClassifierConfig::default(),
            mapper:       MapperConfig::default(),
            show:         ShowConfig::default(),
            dt:           1.0 / 60.0,
            autoplay:     true,
            heart_scale:  1.5,
            heart_y:      10.0,
            finale_scale: 1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

/// A finale launch waiting for its stagger delay to elapse.
#[derive(Clone, Debug, PartialEq)]
struct PendingLaunch {
    delay:   f32,
    request: SpawnRequest,
}

pub struct AppState {
    // ── simulation ───────────────────────────────────────────────────────
    engine:  Engine,
    mapper:  InteractionMapper,
    show:    Sequencer,
    pending: Vec<PendingLaunch>,
    rng:     StdRng,

    // ── flags ────────────────────────────────────────────────────────────
    paused:  bool,
    dt:      f32,

    // ── spawn parameters ─────────────────────────────────────────────────
    phrases:      Vec<String>,
    phrase_scale: f32,
    phrase_y:     f32,
    heart_scale:  f32,
    heart_y:      f32,
    finale_scale: f32,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Result<Self, AppError> {
        let rng = match cfg.engine.seed {
            // Distinct stream from the engine's own.
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(0x9E37_79B9)),
            None       => StdRng::from_entropy(),
        };
        Ok(AppState {
            engine:       Engine::new(&cfg.engine)?,
            mapper:       InteractionMapper::new(cfg.mapper),
            show:         Sequencer::new(&cfg.show),
            pending:      Vec::new(),
            rng,
            paused:       false,
            dt:           cfg.dt,
            phrases:      cfg.show.phrases.clone(),
            phrase_scale: cfg.show.scale,
            phrase_y:     cfg.show.target_y,
            heart_scale:  cfg.heart_scale,
            heart_y:      cfg.heart_y,
            finale_scale: cfg.finale_scale,
        })
    }

    // ── control surface ──────────────────────────────────────────────────

    /// Begin the scripted phrase show. No-op if it is already running.
    pub fn start_show(&mut self) {
        if self.show.start() {
            info!("show started");
        }
    }

    /// Feed the latest classified hand, observed at `now_ms`.
    pub fn update_hand(&mut self, hand: HandState, now_ms: f64) {
        match self.mapper.update_hand(hand, now_ms) {
            Some(Action::SpawnSpecial(kind)) => { self.spawn_special_shape(kind); }
            Some(Action::Finale)             => self.queue_finale(),
            None => {}
        }
    }

    /// Launch a parametric shape centred on screen.
    pub fn spawn_special_shape(&mut self, kind: ShapeKind) -> Option<SystemId> {
        self.engine.spawn(&SpawnRequest::shape(kind, self.heart_scale, 0.0, self.heart_y))
    }

    /// Launch a random phrase toward a world position.
    pub fn launch_at(&mut self, x: f32, y: f32) -> Option<SystemId> {
        let phrase = self.phrases.choose(&mut self.rng)?.clone();
        self.engine.spawn(&SpawnRequest::text(phrase, self.phrase_scale, x, y))
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!("{}", if self.paused { "paused" } else { "resumed" });
    }

    pub fn cycle_theme(&mut self) {
        self.engine.cycle_palette();
    }

    fn queue_finale(&mut self) {
        let cfg   = *self.mapper.config();
        let kinds = ShapeKind::all();
        for k in 0..cfg.finale_count {
            let kind = kinds[self.rng.gen_range(0..kinds.len())];
            let x    = self.rng.gen_range(-60.0..=60.0);
            let y    = self.rng.gen_range(0.0..=30.0);
            self.pending.push(PendingLaunch {
                delay:   k as f32 * cfg.finale_step,
                request: SpawnRequest::shape(kind, self.finale_scale, x, y),
            });
        }
        debug!("finale queued: {} launches", cfg.finale_count);
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    /// Advance one frame. Zoom follows the hand even while paused; the show,
    /// the finale timers and every particle system do not.
    pub fn tick(&mut self) {
        self.mapper.tick_continuous();
        if self.paused { return; }

        self.engine.tick(self.dt);

        if let Some(phrase) = self.show.tick(self.dt) {
            self.engine.spawn(&SpawnRequest::text(phrase, self.phrase_scale, 0.0, self.phrase_y));
        }

        let dt = self.dt;
        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            p.delay -= dt;
            if p.delay <= 0.0 { due.push(p.request.clone()); false } else { true }
        });
        for req in due {
            self.engine.spawn(&req);
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    /// Current action for the HUD.
    pub fn action_label(&self) -> &'static str {
        if self.paused { "PAUSED" } else { self.mapper.status().label() }
    }

    pub fn theme_label(&self) -> &'static str { self.engine.palette().name }
    pub fn hand(&self)        -> &HandState   { self.mapper.hand() }
    pub fn zoom(&self)        -> f32          { self.mapper.zoom() }
    pub fn engine(&self)      -> &Engine      { &self.engine }
    pub fn is_paused(&self)   -> bool         { self.paused }
    pub fn is_show_running(&self) -> bool     { self.show.is_running() }
    pub fn pending_launches(&self) -> usize   { self.pending.len() }

    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        self.engine.drain_events()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the visualizer, the landmark source (simulation by default,
/// hardware with `--features leap`) and drives the render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    // ── Landmark source ──────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let classifier = Classifier::new(cfg.classifier);

    #[cfg(feature = "leap")]
    let frames = {
        drop(sim_rx);
        spawn_hand_source(crate::gesture::LeapHandSource, classifier)
    };
    #[cfg(not(feature = "leap"))]
    let frames = spawn_hand_source(crate::gesture::SimHandSource::new(sim_rx), classifier);

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    let mut app = AppState::new(&cfg)?;
    if cfg.autoplay { app.start_show(); }

    let clock = Instant::now();
    let mut skeleton: Option<HandLandmarks> = None;

    while vis.is_open() {
        // 1. Host commands from the window
        for cmd in vis.poll_input(app.zoom()) {
            match cmd {
                UiCommand::Quit           => return Ok(()),
                UiCommand::TogglePause    => app.toggle_pause(),
                UiCommand::StartShow      => app.start_show(),
                UiCommand::CycleTheme     => app.cycle_theme(),
                UiCommand::Spawn(kind)    => { app.spawn_special_shape(kind); }
                UiCommand::LaunchAt { x, y } => { app.launch_at(x, y); }
            }
        }

        // 2. Newest hand frame only
        match latest_frame(&frames) {
            Ok(Some(frame)) => {
                skeleton = frame.landmarks;
                app.update_hand(frame.state, clock.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(None) => {}
            Err(()) => {
                warn!("landmark source stopped");
                return Ok(());
            }
        }

        // 3. Simulation step
        app.tick();

        // 4. Render resources follow the registry
        for event in app.drain_events() {
            vis.handle_event(event);
        }

        // 5. Render
        vis.render(&app, skeleton.as_ref());
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use firework_engine::Stage;
    use hand_gesture::GestureKind;

    fn make_app() -> AppState {
        let cfg = AppConfig {
            engine: EngineConfig { seed: Some(7), ..Default::default() },
            ..Default::default()
        };
        AppState::new(&cfg).unwrap()
    }

    fn hand(gesture: GestureKind) -> HandState {
        HandState { gesture, x: 0.5, y: 0.5, z: 0.0, present: true }
    }

    #[test]
    fn v_sign_spawns_one_heart_per_cooldown() {
        let mut app = make_app();
        app.update_hand(hand(GestureKind::VSign), 0.0);
        app.update_hand(hand(GestureKind::VSign), 1000.0);
        assert_eq!(app.engine().systems().len(), 1);
        app.update_hand(hand(GestureKind::VSign), 1600.0);
        assert_eq!(app.engine().systems().len(), 2);
        assert_eq!(app.action_label(), "V SIGN: HEART");
    }

    #[test]
    fn finale_launches_six_staggered() {
        let mut app = make_app();
        app.update_hand(hand(GestureKind::OkSign), 0.0);
        assert_eq!(app.pending_launches(), 6);
        assert!(app.engine().systems().is_empty());

        app.tick();
        assert_eq!(app.engine().systems().len(), 1);

        // 200 ms apart: after one second all six are up.
        for _ in 0..60 { app.tick(); }
        assert_eq!(app.engine().systems().len(), 6);
        assert_eq!(app.pending_launches(), 0);
        for s in app.engine().systems() {
            assert!((-60.0..=60.0).contains(&s.target_x()));
            assert!((0.0..=30.0).contains(&s.target_y()));
        }
    }

    #[test]
    fn pause_freezes_weave() {
        let mut app = make_app();
        let id = app.spawn_special_shape(ShapeKind::Star).unwrap();
        while app.engine().system(id).unwrap().stage() != Stage::Weaving {
            app.tick();
        }
        app.tick();

        app.toggle_pause();
        let s = app.engine().system(id).unwrap();
        let (timer, positions) = (s.timer(), s.positions().to_vec());
        for _ in 0..600 { app.tick(); }
        let s = app.engine().system(id).unwrap();
        assert_eq!(s.stage(), Stage::Weaving);
        assert_eq!(s.timer(), timer);
        assert_eq!(s.positions(), &positions[..]);

        app.toggle_pause();
        app.tick();
        assert!(app.engine().system(id).unwrap().timer() > timer);
    }

    #[test]
    fn pause_keeps_zooming() {
        let mut app = make_app();
        app.toggle_pause();
        assert_eq!(app.action_label(), "PAUSED");
        app.update_hand(hand(GestureKind::Pinch), 0.0);
        let before = app.zoom();
        app.tick();
        assert!(app.zoom() < before);
    }

    #[test]
    fn pause_freezes_show_and_finale() {
        let mut app = make_app();
        app.start_show();
        app.update_hand(hand(GestureKind::OkSign), 0.0);
        app.toggle_pause();
        for _ in 0..300 { app.tick(); }
        assert!(app.engine().systems().is_empty());
        assert_eq!(app.pending_launches(), 6);
    }

    #[test]
    fn show_spawns_phrases_in_order() {
        let mut app = make_app();
        assert!(!app.is_show_running());
        app.start_show();
        assert!(app.is_show_running());
        app.tick();
        assert_eq!(app.engine().systems().len(), 1);
        for _ in 0..240 { app.tick(); }
        assert_eq!(app.engine().systems().len(), 2);
        // "2026" then "HAPPY": two distinct cached targets.
        assert_eq!(app.engine().shapes().cached(), 2);
    }

    #[test]
    fn click_launches_phrase_at_point() {
        let mut app = make_app();
        let id = app.launch_at(-20.0, 5.0).unwrap();
        let s = app.engine().system(id).unwrap();
        assert_eq!((s.target_x(), s.target_y()), (-20.0, 5.0));
    }

    #[test]
    fn theme_cycles() {
        let mut app = make_app();
        let before = app.theme_label();
        app.cycle_theme();
        assert_ne!(app.theme_label(), before);
    }

    #[test]
    fn events_track_every_system() {
        let mut app = make_app();
        app.spawn_special_shape(ShapeKind::Ring);
        app.launch_at(0.0, 0.0);
        let mut live = 0i32;
        for _ in 0..2000 {
            app.tick();
            for ev in app.drain_events() {
                match ev {
                    RegistryEvent::Spawned { .. } => live += 1,
                    RegistryEvent::Removed { .. } => live -= 1,
                }
            }
        }
        assert!(app.engine().systems().is_empty());
        assert_eq!(live, 0);
    }
}
