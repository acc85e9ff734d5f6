//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ACTION  THEME  ZOOM  GESTURE                             │
//! │                                                          │
//! │            particles (additive, perspective)             │
//! │                 hand skeleton overlay + cursor           │
//! │                                                          │
//! │ key legend                                               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every live particle system owns one [`SpriteBatch`], created when the
//! registry reports it spawned and dropped when it reports it removed.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use firework_engine::{block_glyph, rgb_to_argb, ParticleSystem, RegistryEvent, ShapeKind, SystemId};
use hand_gesture::{GestureKind, HandLandmarks, HandPose, HAND_SKELETON};
use log::{trace, warn};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::app::{AppError, AppState};
use crate::gesture::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 960;
pub const WIN_H:    usize = 540;
/// Focal length in pixels for a camera on the +z axis looking at the origin.
pub const FOCAL:    f32   = 640.0;
const BG_COLOR:     u32   = 0xFF05060F;
const HUD_BG:       u32   = 0xFF10142A;
const HUD_H:        usize = 34;
const SKELETON:     u32   = 0xFF3A6E8C;
const JOINT:        u32   = 0xFF7FD4FF;
const LEGEND:       u32   = 0xFF707894;

// ════════════════════════════════════════════════════════════════════════════
// UiCommand
// ════════════════════════════════════════════════════════════════════════════

/// Host-level command read from the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UiCommand {
    Quit,
    TogglePause,
    StartShow,
    CycleTheme,
    Spawn(ShapeKind),
    /// Launch toward this world position (on the z = 0 plane).
    LaunchAt { x: f32, y: f32 },
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// World → screen for a camera at `(0, 0, zoom)`. `None` behind the camera.
pub fn project(x: f32, y: f32, z: f32, zoom: f32) -> Option<(f32, f32, f32)> {
    let depth = zoom - z;
    if depth <= 1.0 { return None; }
    let k = FOCAL / depth;
    Some((WIN_W as f32 / 2.0 + x * k, WIN_H as f32 / 2.0 - y * k, k))
}

/// Screen → world on the z = 0 plane.
pub fn unproject(sx: f32, sy: f32, zoom: f32) -> (f32, f32) {
    let k = zoom / FOCAL;
    ((sx - WIN_W as f32 / 2.0) * k, (WIN_H as f32 / 2.0 - sy) * k)
}

// ════════════════════════════════════════════════════════════════════════════
// SpriteBatch — per-system render resource
// ════════════════════════════════════════════════════════════════════════════

/// Projected splats for one particle system: `(buffer index, argb)`.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    splats: Vec<(usize, u32)>,
}

impl SpriteBatch {
    pub fn with_capacity(particles: usize) -> Self {
        SpriteBatch { splats: Vec::with_capacity(particles) }
    }

    /// Re-project the system's current buffers.
    pub fn update(&mut self, system: &ParticleSystem, zoom: f32) {
        self.splats.clear();
        let opacity = system.opacity();
        if opacity <= 0.0 { return; }

        let pos = system.positions().chunks_exact(3);
        let col = system.colors().chunks_exact(3);
        for (p, c) in pos.zip(col) {
            let Some((sx, sy, k)) = project(p[0], p[1], p[2], zoom) else { continue };
            // Splat side in pixels; the rocket's larger points read as a brighter head.
            let side  = ((system.point_size() * k / 6.4).round() as isize).clamp(1, 3);
            let argb  = rgb_to_argb([c[0], c[1], c[2]], opacity);
            let (x0, y0) = (sx as isize, sy as isize);
            for dy in 0..side {
                for dx in 0..side {
                    let (x, y) = (x0 + dx, y0 + dy);
                    if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
                        self.splats.push((y as usize * WIN_W + x as usize, argb));
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize { self.splats.len() }

    pub fn is_empty(&self) -> bool { self.splats.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    sim_tx:     Sender<SimInput>,
    batches:    HashMap<SystemId, SpriteBatch>,
    last_mouse: Option<(f32, f32)>,
    mouse_down: bool,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Fireworks",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            batches:    HashMap::new(),
            last_mouse: None,
            mouse_down: false,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse. Hand-simulation input goes straight to the
    /// landmark source; host commands are returned.
    pub fn poll_input(&mut self, zoom: f32) -> Vec<UiCommand> {
        let mut cmds = Vec::new();
        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            cmds.push(UiCommand::Quit);
            return cmds;
        }
        if pressed(Key::P)     { cmds.push(UiCommand::TogglePause); }
        if pressed(Key::Space) { cmds.push(UiCommand::StartShow); }
        if pressed(Key::T)     { cmds.push(UiCommand::CycleTheme); }
        if pressed(Key::H)     { cmds.push(UiCommand::Spawn(ShapeKind::Heart)); }
        if pressed(Key::S)     { cmds.push(UiCommand::Spawn(ShapeKind::Star)); }
        if pressed(Key::R)     { cmds.push(UiCommand::Spawn(ShapeKind::Ring)); }

        // ── simulated hand ───────────────────────────────────────────────
        // A send only fails when hardware input replaced the simulator.
        const POSE_KEYS: [Key; 6] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6];
        for (key, pose) in POSE_KEYS.iter().zip(HandPose::all()) {
            if pressed(*key) {
                let _ = self.sim_tx.send(SimInput::Pose(pose));
            }
        }
        if pressed(Key::N) {
            let _ = self.sim_tx.send(SimInput::ToggleHand);
        }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            if self.last_mouse != Some((mx, my)) {
                self.last_mouse = Some((mx, my));
                let _ = self.sim_tx.send(SimInput::Pointer {
                    x: mx / WIN_W as f32,
                    y: my / WIN_H as f32,
                });
            }
            let down = self.window.get_mouse_down(MouseButton::Left);
            if down && !self.mouse_down && my as usize > HUD_H {
                let (x, y) = unproject(mx, my, zoom);
                cmds.push(UiCommand::LaunchAt { x, y });
            }
            self.mouse_down = down;
        }

        cmds
    }

    /// Allocate or release the render resource for one registry event.
    pub fn handle_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Spawned { id, particles } => {
                trace!("sprite batch for {:?} ({} particles)", id, particles);
                if self.batches.insert(id, SpriteBatch::with_capacity(particles)).is_some() {
                    warn!("{:?} spawned twice", id);
                }
            }
            RegistryEvent::Removed { id } => {
                if self.batches.remove(&id).is_none() {
                    warn!("{:?} released without a sprite batch", id);
                }
            }
        }
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState, skeleton: Option<&HandLandmarks>) {
        self.buf.fill(BG_COLOR);
        let zoom = app.zoom();

        // ── particles ────────────────────────────────────────────────────
        for system in app.engine().systems() {
            let Some(batch) = self.batches.get_mut(&system.id()) else { continue };
            batch.update(system, zoom);
            for &(i, argb) in &batch.splats {
                self.buf[i] = add_argb(self.buf[i], argb);
            }
        }

        // ── hand overlay ─────────────────────────────────────────────────
        if let Some(hand) = skeleton {
            self.draw_skeleton(hand);
        }
        let state = app.hand();
        if state.present {
            let cx = (state.x * WIN_W as f32) as isize;
            let cy = (state.y * WIN_H as f32) as isize;
            self.draw_cursor(cx, cy, gesture_color(state.gesture));
        }

        // ── HUD ──────────────────────────────────────────────────────────
        self.fill_rect(0, 0, WIN_W, HUD_H, HUD_BG);
        self.draw_label(app.action_label(), 10, 6, 2, 0xFFFFD27F);
        self.draw_label(&format!("THEME: {}", app.theme_label()), 10, 22, 1, 0xFFB0C4FF);
        self.draw_label(&format!("ZOOM {:.0}", zoom), 260, 22, 1, 0xFFB0C4FF);
        let hand_label = if state.present { state.gesture.label() } else { "NO HAND" };
        self.draw_label(hand_label, WIN_W - 150, 6, 2, gesture_color(state.gesture));
        let registry = app.engine().registry();
        self.draw_label(
            &format!("FIREWORKS {}  PARTICLES {}", registry.len(), registry.particle_count()),
            360, 22, 1, 0xFFB0C4FF,
        );

        if !app.is_show_running() {
            self.draw_label("SPACE: START SHOW", WIN_W / 2 - 68, HUD_H + 10, 1, LEGEND);
        }

        // ── Key legend ───────────────────────────────────────────────────
        self.draw_label(
            "1-6=pose  N=hand  mouse=point/click  space=show  P=pause  T=theme  H/S/R=shape  Q=quit",
            10, WIN_H - 12, 1, LEGEND,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Overlay ───────────────────────────────────────────────────────────

    fn draw_skeleton(&mut self, hand: &HandLandmarks) {
        // Mirrored to match the pointer.
        let to_screen = |i: usize| {
            let p = hand.points()[i];
            (((1.0 - p.x) * WIN_W as f32) as isize, (p.y * WIN_H as f32) as isize)
        };
        for &(a, b) in HAND_SKELETON.iter() {
            let (x0, y0) = to_screen(a);
            let (x1, y1) = to_screen(b);
            self.draw_line(x0, y0, x1, y1, SKELETON);
        }
        for i in 0..hand.points().len() {
            let (x, y) = to_screen(i);
            self.draw_cursor(x, y, JOINT);
        }
    }

    fn draw_cursor(&mut self, cx: isize, cy: isize, color: u32) {
        for d in -3..=3isize {
            self.set_pixel_i(cx + d, cy, color);
            self.set_pixel_i(cx, cy + d, color);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    /// Bresenham.
    fn draw_line(&mut self, mut x0: isize, mut y0: isize, x1: isize, y1: isize, color: u32) {
        let dx =  (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel_i(x0, y0, color);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    /// 3×5 block font, `scale` screen pixels per font cell.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in block_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Colour helpers
// ────────────────────────────────────────────────────────────────────────────

/// Additive blend of two opaque ARGB colours, saturating per channel.
fn add_argb(a: u32, b: u32) -> u32 {
    let ch = |shift: u32| (((a >> shift) & 0xFF) + ((b >> shift) & 0xFF)).min(0xFF) << shift;
    0xFF000000 | ch(16) | ch(8) | ch(0)
}

fn gesture_color(g: GestureKind) -> u32 {
    match g {
        GestureKind::Idle     => 0xFFCCCCCC,
        GestureKind::Pinch    => 0xFF7FFFD4,
        GestureKind::OpenPalm => 0xFFFFE066,
        GestureKind::VSign    => 0xFFFF6FA8,
        GestureKind::OkSign   => 0xFFFFA040,
        GestureKind::Fist     => 0xFF9090FF,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
