//! Gesture → action mapping.
//!
//! Discrete gestures (`V_SIGN`, `OK_SIGN`) fire one-shot [`Action`]s guarded
//! by a single cooldown window shared between them. Continuous gestures
//! (`PINCH`, `OPEN_PALM`) nudge the camera distance once per render tick for
//! as long as the latest hand snapshot holds them.

use hand_gesture::{GestureKind, HandState};
use firework_engine::ShapeKind;
use log::info;

// ════════════════════════════════════════════════════════════════════════════
// MapperConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapperConfig {
    /// Cooldown after a `V_SIGN` heart (milliseconds).
    pub heart_cooldown_ms:  f64,
    /// Cooldown after an `OK_SIGN` finale (milliseconds).
    pub finale_cooldown_ms: f64,
    /// Fireworks launched per finale.
    pub finale_count:       usize,
    /// Delay between consecutive finale launches (seconds).
    pub finale_step:        f32,
    pub zoom_min:           f32,
    pub zoom_max:           f32,
    /// Camera distance change per tick while a zoom gesture is held.
    pub zoom_step:          f32,
    pub initial_zoom:       f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig {
            heart_cooldown_ms:  1500.0,
            finale_cooldown_ms: 3000.0,
            finale_count:       6,
            finale_step:        0.2,
            zoom_min:           10.0,
            zoom_max:           120.0,
            zoom_step:          1.0,
            initial_zoom:       100.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Action / Status
// ════════════════════════════════════════════════════════════════════════════

/// One-shot action produced by a discrete gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SpawnSpecial(ShapeKind),
    Finale,
}

/// What the mapper is currently doing, for the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    NoSignal,
    #[default]
    Ready,
    Heart,
    Finale,
    ZoomIn,
    ZoomOut,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::NoSignal => "NO SIGNAL",
            Status::Ready    => "READY",
            Status::Heart    => "V SIGN: HEART",
            Status::Finale   => "OK SIGN: FINALE",
            Status::ZoomIn   => "PINCH: ZOOM IN",
            Status::ZoomOut  => "OPEN PALM: ZOOM OUT",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// InteractionMapper
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct InteractionMapper {
    config:          MapperConfig,
    /// Shared by every discrete trigger: any one of them restarts the window.
    last_trigger_ms: Option<f64>,
    zoom:            f32,
    hand:            HandState,
    status:          Status,
}

impl InteractionMapper {
    pub fn new(config: MapperConfig) -> Self {
        let zoom = config.initial_zoom.clamp(config.zoom_min, config.zoom_max);
        InteractionMapper {
            config,
            last_trigger_ms: None,
            zoom,
            hand:   HandState::absent(),
            status: Status::NoSignal,
        }
    }

    /// Record a fresh hand snapshot taken at `now_ms` and return the discrete
    /// action it triggers, if any.
    pub fn update_hand(&mut self, hand: HandState, now_ms: f64) -> Option<Action> {
        self.hand = hand;
        if !hand.present {
            self.status = Status::NoSignal;
            return None;
        }

        match hand.gesture {
            GestureKind::VSign => {
                self.status = Status::Heart;
                self.trigger(now_ms, self.config.heart_cooldown_ms, Action::SpawnSpecial(ShapeKind::Heart))
            }
            GestureKind::OkSign => {
                self.status = Status::Finale;
                self.trigger(now_ms, self.config.finale_cooldown_ms, Action::Finale)
            }
            GestureKind::Pinch    => { self.status = Status::ZoomIn;  None }
            GestureKind::OpenPalm => { self.status = Status::ZoomOut; None }
            GestureKind::Idle | GestureKind::Fist => { self.status = Status::Ready; None }
        }
    }

    fn trigger(&mut self, now_ms: f64, cooldown_ms: f64, action: Action) -> Option<Action> {
        let cooled = match self.last_trigger_ms {
            None       => true,
            Some(last) => now_ms - last > cooldown_ms,
        };
        if !cooled { return None; }
        self.last_trigger_ms = Some(now_ms);
        info!("{:?} at {:.0} ms", action, now_ms);
        Some(action)
    }

    /// Apply one tick of continuous zoom from the latest snapshot.
    /// Returns the new camera distance.
    pub fn tick_continuous(&mut self) -> f32 {
        if self.hand.present {
            let c = &self.config;
            match self.hand.gesture {
                GestureKind::Pinch    => self.zoom = (self.zoom - c.zoom_step).max(c.zoom_min),
                GestureKind::OpenPalm => self.zoom = (self.zoom + c.zoom_step).min(c.zoom_max),
                _ => {}
            }
        }
        self.zoom
    }

    pub fn zoom(&self)   -> f32           { self.zoom }
    pub fn hand(&self)   -> &HandState    { &self.hand }
    pub fn status(&self) -> Status        { self.status }
    pub fn config(&self) -> &MapperConfig { &self.config }
}

impl Default for InteractionMapper {
    fn default() -> Self { InteractionMapper::new(MapperConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
