//! One firework: a fixed set of particles driven through a four-stage
//! life cycle.
//!
//! ```text
//! Rocket ──(head reaches target height)──▶ Exploding ──(0.6 s)──▶ Weaving
//!                                                                  │
//!                               removed ◀──(opacity ≤ 0)── Fading ◀┘ (2.4 s)
//! ```
//!
//! Stages only ever move forward. The particle count is fixed at launch.

use std::sync::Arc;

use glam::Vec3;
use log::trace;
use rand::Rng;

use crate::palette::Palette;
use crate::shape::TargetShape;

// ════════════════════════════════════════════════════════════════════════════
// Tuning
// ════════════════════════════════════════════════════════════════════════════

/// Default launch height, below the bottom of the view.
pub const LAUNCH_Y: f32 = -60.0;

const ROCKET_SPEED_MIN:  f32 = 0.8;    // units/tick
const ROCKET_SPEED_MAX:  f32 = 1.2;
const TRAIL_LENGTH:      f32 = 28.0;
const HEAD_SPREAD:       f32 = 0.4;
const TAIL_SPREAD:       f32 = 7.0;
const WHITE_HEAD_CURVE:  f32 = 0.02;

const BURST_SECONDS:     f32 = 0.6;
const BURST_DAMPING:     f32 = 0.9;
const BURST_SPEED_MIN:   f32 = 0.4;
const BURST_SPEED_MAX:   f32 = 2.2;

const WEAVE_SECONDS:     f32 = 2.4;
const WEAVE_PULL:        f32 = 0.1;
const WEAVE_JITTER_BASE: f32 = 0.02;
const WEAVE_JITTER_GROW: f32 = 0.1;
const WEAVE_DIM_FROM:    f32 = 0.6;
const WEAVE_END_OPACITY: f32 = 0.5;

const FADE_STEP:         f32 = 0.02;
const FADE_DRIFT:        f32 = 0.06;
const FADE_JITTER:       f32 = 0.3;

const ROCKET_POINT_SIZE: f32 = 2.0;
const BURST_POINT_SIZE:  f32 = 1.0;

// ════════════════════════════════════════════════════════════════════════════
// Stage
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Rising trail toward the target height.
    Rocket,
    /// Radial burst with damped velocities.
    Exploding,
    /// Converging onto the target shape.
    Weaving,
    /// Dimming and drifting down; removed when fully transparent.
    Fading,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Rocket    => "rocket",
            Stage::Exploding => "exploding",
            Stage::Weaving   => "weaving",
            Stage::Fading    => "fading",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SystemId
// ════════════════════════════════════════════════════════════════════════════

/// Registry-assigned identity, never reused within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub u64);

// ════════════════════════════════════════════════════════════════════════════
// ParticleSystem
// ════════════════════════════════════════════════════════════════════════════

/// Buffers are flat `3 × N` arrays: x,y,z (or r,g,b) per particle.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    id:            SystemId,
    stage:         Stage,
    /// Seconds spent in the current stage.
    timer:         f32,

    positions:     Vec<f32>,
    velocities:    Vec<f32>,
    colors:        Vec<f32>,
    base_colors:   Vec<f32>,
    /// Per-particle position along the rocket trail, `[0, 1)`.
    lags:          Vec<f32>,
    target:        Arc<TargetShape>,

    target_x:      f32,
    target_y:      f32,
    rocket_pos:    Vec3,
    rocket_vel:    Vec3,

    opacity:       f32,
    point_size:    f32,
}

impl ParticleSystem {
    /// Build a system sitting on the launch pad below `(target_x, target_y)`.
    ///
    /// Returns `None` for an empty target shape.
    pub fn launch<R: Rng + ?Sized>(
        id:       SystemId,
        target:   Arc<TargetShape>,
        target_x: f32,
        target_y: f32,
        launch_y: f32,
        palette:  &Palette,
        rng:      &mut R,
    ) -> Option<Self> {
        let n = target.len();
        if n == 0 || palette.is_empty() {
            return None;
        }

        let mut positions   = Vec::with_capacity(3 * n);
        let mut velocities  = Vec::with_capacity(3 * n);
        let mut base_colors = Vec::with_capacity(3 * n);
        let mut lags        = Vec::with_capacity(n);

        for _ in 0..n {
            positions.extend_from_slice(&[target_x, launch_y, 0.0]);
            velocities.extend_from_slice(&random_burst_velocity(rng).to_array());
            base_colors.extend_from_slice(&palette.pick(rng));
            lags.push(rng.gen::<f32>());
        }

        Some(ParticleSystem {
            id,
            stage:       Stage::Rocket,
            timer:       0.0,
            colors:      base_colors.clone(),
            positions,
            velocities,
            base_colors,
            lags,
            target,
            target_x,
            target_y,
            rocket_pos:  Vec3::new(target_x, launch_y, 0.0),
            rocket_vel:  Vec3::new(0.0, rng.gen_range(ROCKET_SPEED_MIN..=ROCKET_SPEED_MAX), 0.0),
            opacity:     1.0,
            point_size:  ROCKET_POINT_SIZE,
        })
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn id(&self)            -> SystemId { self.id }
    pub fn stage(&self)         -> Stage    { self.stage }
    pub fn timer(&self)         -> f32      { self.timer }
    pub fn particle_count(&self) -> usize   { self.lags.len() }
    pub fn positions(&self)     -> &[f32]   { &self.positions }
    pub fn colors(&self)        -> &[f32]   { &self.colors }
    pub fn base_colors(&self)   -> &[f32]   { &self.base_colors }
    pub fn opacity(&self)       -> f32      { self.opacity }
    pub fn point_size(&self)    -> f32      { self.point_size }
    pub fn target_x(&self)      -> f32      { self.target_x }
    pub fn target_y(&self)      -> f32      { self.target_y }
    pub fn rocket_position(&self) -> Vec3   { self.rocket_pos }
    pub fn target(&self)        -> &Arc<TargetShape> { &self.target }

    /// True once fading has driven opacity to zero.
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Fading && self.opacity <= 0.0
    }

    // ── per-tick advance ─────────────────────────────────────────────────

    /// Advance one tick of length `dt` seconds. Returns true when the system
    /// has finished and should be removed.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> bool {
        if self.is_finished() {
            return true;
        }
        self.timer += dt;
        match self.stage {
            Stage::Rocket    => self.tick_rocket(rng),
            Stage::Exploding => self.tick_exploding(),
            Stage::Weaving   => self.tick_weaving(rng),
            Stage::Fading    => self.tick_fading(rng),
        }
        self.is_finished()
    }

    fn enter(&mut self, stage: Stage) {
        trace!("{:?} {} → {} after {:.2}s", self.id, self.stage.label(), stage.label(), self.timer);
        self.stage = stage;
        self.timer = 0.0;
    }

    fn tick_rocket<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.rocket_pos += self.rocket_vel;
        let head = self.rocket_pos;

        // Positions are laid out fresh every tick, never integrated.
        for (i, &lag) in self.lags.iter().enumerate() {
            let curve  = lag.powi(6);
            let spread = HEAD_SPREAD + curve * TAIL_SPREAD;
            let j = 3 * i;
            self.positions[j]     = head.x + rng.gen_range(-0.5..0.5) * spread;
            self.positions[j + 1] = head.y - curve * TRAIL_LENGTH + rng.gen_range(-0.5..0.5) * spread;
            self.positions[j + 2] = head.z + rng.gen_range(-0.5..0.5) * spread;

            if curve < WHITE_HEAD_CURVE {
                self.colors[j..j + 3].copy_from_slice(&[1.0, 1.0, 1.0]);
            } else {
                for c in 0..3 {
                    self.colors[j + c] = 1.0 + (self.base_colors[j + c] - 1.0) * lag;
                }
            }
        }

        if self.rocket_pos.y >= self.target_y {
            // Burst: every particle starts from the head in its true color.
            for p in self.positions.chunks_exact_mut(3) {
                p.copy_from_slice(&head.to_array());
            }
            self.colors.copy_from_slice(&self.base_colors);
            self.point_size = BURST_POINT_SIZE;
            self.enter(Stage::Exploding);
        }
    }

    fn tick_exploding(&mut self) {
        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *p += *v;
            *v *= BURST_DAMPING;
        }
        if self.timer > BURST_SECONDS {
            self.enter(Stage::Weaving);
        }
    }

    fn tick_weaving<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let progress = (self.timer / WEAVE_SECONDS).min(1.0);
        let pull     = WEAVE_PULL * (1.0 - progress * progress);
        let jitter   = WEAVE_JITTER_BASE + WEAVE_JITTER_GROW * progress;
        let offset   = [self.target_x, self.target_y, 0.0];
        let target   = self.target.points();

        for (j, p) in self.positions.iter_mut().enumerate() {
            let goal = target[j] + offset[j % 3];
            *p += (goal - *p) * pull + rng.gen_range(-0.5..0.5) * jitter;
        }

        self.opacity = if progress > WEAVE_DIM_FROM {
            let t = (progress - WEAVE_DIM_FROM) / (1.0 - WEAVE_DIM_FROM);
            1.0 - t * (1.0 - WEAVE_END_OPACITY)
        } else {
            1.0
        };

        if self.timer > WEAVE_SECONDS {
            self.enter(Stage::Fading);
        }
    }

    fn tick_fading<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.opacity -= FADE_STEP;
        for p in self.positions.chunks_exact_mut(3) {
            p[0] += rng.gen_range(-0.5..0.5) * FADE_JITTER;
            p[1] -= FADE_DRIFT;
            p[2] += rng.gen_range(-0.5..0.5) * FADE_JITTER;
        }
    }
}

/// Uniform direction on the unit sphere, random speed.
fn random_burst_velocity<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z: f32     = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let r          = (1.0 - z * z).max(0.0).sqrt();
    let speed      = rng.gen_range(BURST_SPEED_MIN..BURST_SPEED_MAX);
    Vec3::new(r * theta.cos(), r * theta.sin(), z) * speed
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTES;
    use rand::{rngs::StdRng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn square(n: usize) -> Arc<TargetShape> {
        let mut pts = Vec::new();
        for i in 0..n {
            pts.extend_from_slice(&[(i % 10) as f32, (i / 10) as f32, 0.0]);
        }
        Arc::new(TargetShape::from_points(pts))
    }

    fn launch(n: usize, tx: f32, ty: f32, rng: &mut StdRng) -> ParticleSystem {
        ParticleSystem::launch(SystemId(1), square(n), tx, ty, LAUNCH_Y, &PALETTES[0], rng)
            .expect("non-empty target")
    }

    #[test]
    fn launch_starts_on_the_pad() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = launch(40, 12.0, 20.0, &mut rng);
        assert_eq!(s.stage(), Stage::Rocket);
        assert_eq!(s.particle_count(), 40);
        for p in s.positions().chunks_exact(3) {
            assert_eq!(p, [12.0, LAUNCH_Y, 0.0]);
        }
        assert_eq!(s.target_x(), 12.0);
        assert_eq!(s.target_y(), 20.0);
    }

    #[test]
    fn empty_target_does_not_launch() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = Arc::new(TargetShape::from_points(vec![]));
        assert!(ParticleSystem::launch(SystemId(1), empty, 0.0, 0.0, LAUNCH_Y, &PALETTES[0], &mut rng).is_none());
    }

    #[test]
    fn rocket_rises_at_launch_speed() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = launch(10, 0.0, 50.0, &mut rng);
        let v = s.rocket_vel.y;
        assert!((ROCKET_SPEED_MIN..=ROCKET_SPEED_MAX).contains(&v));
        s.tick(DT, &mut rng);
        s.tick(DT, &mut rng);
        assert!((s.rocket_position().y - (LAUNCH_Y + 2.0 * v)).abs() < 1e-4);
    }

    #[test]
    fn rocket_head_is_white_and_tail_tinted() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = launch(400, 0.0, 50.0, &mut rng);
        s.tick(DT, &mut rng);
        for (i, &lag) in s.lags.iter().enumerate() {
            let c = &s.colors()[3 * i..3 * i + 3];
            if lag.powi(6) < WHITE_HEAD_CURVE {
                assert_eq!(c, [1.0, 1.0, 1.0]);
            }
        }
    }

    #[test]
    fn explodes_when_head_reaches_target() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = launch(25, -5.0, 10.0, &mut rng);
        let mut ticks = 0;
        while s.stage() == Stage::Rocket {
            let before = s.rocket_position().y;
            assert!(before < 10.0);
            s.tick(DT, &mut rng);
            ticks += 1;
            assert!(ticks < 200);
        }
        assert_eq!(s.stage(), Stage::Exploding);
        assert!(s.rocket_position().y >= 10.0);
        assert_eq!(s.timer(), 0.0);
        assert_eq!(s.point_size(), BURST_POINT_SIZE);
        assert_eq!(s.colors(), s.base_colors());
    }

    #[test]
    fn burst_velocity_decays() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = launch(5, 0.0, LAUNCH_Y, &mut rng);
        s.tick(DT, &mut rng);
        assert_eq!(s.stage(), Stage::Exploding);
        let v0 = s.velocities.clone();
        s.tick(DT, &mut rng);
        for (a, b) in v0.iter().zip(s.velocities.iter()) {
            assert!((b - a * BURST_DAMPING).abs() < 1e-6);
        }
    }

    #[test]
    fn stages_run_in_order_then_finish() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut s = launch(30, 0.0, 0.0, &mut rng);
        let mut seen = vec![s.stage()];
        let mut done = false;
        for _ in 0..10_000 {
            let n = s.particle_count();
            done = s.tick(DT, &mut rng);
            assert_eq!(s.particle_count(), n);
            assert_eq!(s.positions().len(), 3 * n);
            if *seen.last().unwrap() != s.stage() {
                seen.push(s.stage());
            }
            if done { break; }
        }
        assert!(done);
        assert_eq!(seen, [Stage::Rocket, Stage::Exploding, Stage::Weaving, Stage::Fading]);
        assert!(s.opacity() <= 0.0);
    }

    #[test]
    fn weave_converges_on_target_and_dims() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = launch(20, 30.0, 5.0, &mut rng);
        while s.stage() != Stage::Weaving {
            s.tick(DT, &mut rng);
        }
        let mut max_err = 0.0f32;
        while s.stage() == Stage::Weaving {
            let progress = s.timer() / WEAVE_SECONDS;
            if progress < WEAVE_DIM_FROM {
                assert_eq!(s.opacity(), 1.0);
            }
            s.tick(DT, &mut rng);
        }
        assert!((s.opacity() - WEAVE_END_OPACITY).abs() < 0.02);
        for i in 0..s.particle_count() {
            let t = s.target().point(i);
            let p = &s.positions()[3 * i..3 * i + 3];
            max_err = max_err.max((p[0] - (t[0] + 30.0)).abs()).max((p[1] - (t[1] + 5.0)).abs());
        }
        // the burst scatters particles ~20 units; the weave brings them home
        assert!(max_err < 4.0, "max error {}", max_err);
    }

    #[test]
    fn fading_drifts_down_and_dims() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut s = launch(20, 0.0, 0.0, &mut rng);
        while s.stage() != Stage::Fading {
            s.tick(DT, &mut rng);
        }
        let op = s.opacity();
        let mean_y = |s: &ParticleSystem| {
            s.positions().chunks_exact(3).map(|p| p[1]).sum::<f32>() / s.particle_count() as f32
        };
        let y0 = mean_y(&s);
        s.tick(DT, &mut rng);
        assert!((s.opacity() - (op - FADE_STEP)).abs() < 1e-6);
        assert!(mean_y(&s) < y0);
    }

    #[test]
    fn finished_system_stays_finished() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = launch(5, 0.0, 0.0, &mut rng);
        while !s.tick(DT, &mut rng) {}
        let snapshot = s.positions().to_vec();
        assert!(s.tick(DT, &mut rng));
        assert_eq!(s.positions(), &snapshot[..]);
    }
}
