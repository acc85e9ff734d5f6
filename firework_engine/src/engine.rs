//! `Engine` — the explicit context that owns every piece of mutable firework
//! state: the live registry, the shape cache, the RNG and the current
//! palette.
//!
//! Independent engines never share anything, and a seeded engine replays
//! the same show bit for bit.

use std::path::PathBuf;

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::error::EngineResult;
use crate::glyph::{BlockFont, GlyphSource, TrueTypeFont};
use crate::palette::{Palette, PALETTES};
use crate::registry::{Registry, RegistryEvent};
use crate::shape::{ShapeKey, ShapeKind, ShapeRasterizer, ShapeSource};
use crate::system::{ParticleSystem, SystemId, LAUNCH_Y};

// ════════════════════════════════════════════════════════════════════════════
// EngineConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Pixel height text is rendered at before scaling into world units.
    pub font_px:         f32,
    /// Bitmap pixels must exceed this alpha (0–255) to become particles.
    pub alpha_threshold: u8,
    /// Height every rocket launches from.
    pub launch_y:        f32,
    /// Fixed seed for a reproducible show; `None` seeds from entropy.
    pub seed:            Option<u64>,
    /// TrueType/OpenType font for text; `None` uses the built-in block font.
    pub font_path:       Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            font_px:         80.0,
            alpha_threshold: 128,
            launch_y:        LAUNCH_Y,
            seed:            None,
            font_path:       None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SpawnRequest
// ════════════════════════════════════════════════════════════════════════════

/// Everything needed to launch one firework.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub source:   ShapeSource,
    pub scale:    f32,
    pub target_x: f32,
    pub target_y: f32,
}

impl SpawnRequest {
    pub fn text(text: impl Into<String>, scale: f32, target_x: f32, target_y: f32) -> Self {
        SpawnRequest { source: ShapeSource::text(text), scale, target_x, target_y }
    }

    pub fn shape(kind: ShapeKind, scale: f32, target_x: f32, target_y: f32) -> Self {
        SpawnRequest { source: ShapeSource::Shape(kind), scale, target_x, target_y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    shapes:   ShapeRasterizer,
    registry: Registry,
    rng:      StdRng,
    palette:  usize,
    launch_y: f32,
}

impl Engine {
    /// Build an engine; fails only if a configured font cannot be loaded.
    pub fn new(cfg: &EngineConfig) -> EngineResult<Self> {
        let glyphs: Box<dyn GlyphSource> = match &cfg.font_path {
            Some(path) => {
                info!("loading font {}", path.display());
                Box::new(TrueTypeFont::load(path)?)
            }
            None => Box::new(BlockFont),
        };
        Ok(Self::with_glyphs(cfg, glyphs))
    }

    /// Build an engine around an explicit glyph source.
    pub fn with_glyphs(cfg: &EngineConfig, glyphs: Box<dyn GlyphSource>) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Engine {
            shapes:   ShapeRasterizer::new(glyphs, cfg.font_px, cfg.alpha_threshold),
            registry: Registry::new(),
            rng,
            palette:  0,
            launch_y: cfg.launch_y,
        }
    }

    /// Launch a firework. Returns `None` (and does nothing) when the target
    /// shape has no points.
    pub fn spawn(&mut self, req: &SpawnRequest) -> Option<SystemId> {
        let key    = ShapeKey::new(req.source.clone(), req.scale);
        let target = self.shapes.resolve(&key, &mut self.rng);
        if target.is_empty() {
            debug!("dropping spawn of '{}': empty target shape", req.source.label());
            return None;
        }

        let id = self.registry.next_id();
        let system = ParticleSystem::launch(
            id, target, req.target_x, req.target_y, self.launch_y,
            &PALETTES[self.palette], &mut self.rng,
        )?;
        debug!(
            "spawned {:?} '{}' with {} particles toward ({:.1}, {:.1})",
            id, req.source.label(), system.particle_count(), req.target_x, req.target_y
        );
        Some(self.registry.insert(system))
    }

    /// Advance every live system by one tick.
    pub fn tick(&mut self, dt: f32) {
        self.registry.tick(dt, &mut self.rng);
    }

    /// Lifecycle events since the last drain. They queue until taken, so
    /// the host drains once per tick.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        self.registry.drain_events()
    }

    pub fn systems(&self) -> &[ParticleSystem] { self.registry.systems() }

    pub fn system(&self, id: SystemId) -> Option<&ParticleSystem> { self.registry.get(id) }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn shapes(&self) -> &ShapeRasterizer { &self.shapes }

    // ── palette ──────────────────────────────────────────────────────────

    pub fn palette(&self) -> &Palette { &PALETTES[self.palette] }

    /// Switch to the next palette (wrapping). Only affects future spawns.
    pub fn cycle_palette(&mut self) -> &Palette {
        self.palette = (self.palette + 1) % PALETTES.len();
        info!("palette → {}", PALETTES[self.palette].name);
        &PALETTES[self.palette]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::Stage;
    use std::sync::Arc;

    fn engine(seed: u64) -> Engine {
        Engine::new(&EngineConfig { seed: Some(seed), ..Default::default() }).unwrap()
    }

    #[test]
    fn spawn_2026_end_to_end() {
        let mut e = engine(2026);
        let id = e.spawn(&SpawnRequest::text("2026", 0.35, 8.0, 12.0)).expect("spawned");
        let s = e.system(id).unwrap();
        let n = s.particle_count();
        assert!(n > 0);
        assert_eq!(s.stage(), Stage::Rocket);
        for p in s.positions().chunks_exact(3) {
            assert_eq!(p, [8.0, LAUNCH_Y, 0.0]);
        }

        let mut stages = vec![Stage::Rocket];
        let mut exploded_at = None;
        for _ in 0..10_000 {
            e.tick(1.0 / 60.0);
            let Some(s) = e.system(id) else { break };
            assert_eq!(s.particle_count(), n);
            if s.stage() != *stages.last().unwrap() {
                if s.stage() == Stage::Exploding {
                    exploded_at = Some(s.rocket_position().y);
                }
                stages.push(s.stage());
            }
        }
        assert!(e.system(id).is_none());
        assert_eq!(stages, [Stage::Rocket, Stage::Exploding, Stage::Weaving, Stage::Fading]);
        assert!(exploded_at.unwrap() >= 12.0);
        let events = e.drain_events();
        assert_eq!(events.first(), Some(&RegistryEvent::Spawned { id, particles: n }));
        assert_eq!(events.last(),  Some(&RegistryEvent::Removed { id }));
    }

    #[test]
    fn same_text_and_scale_share_target() {
        let mut e = engine(1);
        let a = e.spawn(&SpawnRequest::text("HI", 0.35, 0.0, 0.0)).unwrap();
        let b = e.spawn(&SpawnRequest::text("HI", 0.35, 40.0, 10.0)).unwrap();
        let ta = e.system(a).unwrap().target();
        let tb = e.system(b).unwrap().target();
        assert!(Arc::ptr_eq(ta, tb));
        assert_eq!(e.shapes().cached(), 1);
    }

    #[test]
    fn unrenderable_text_is_dropped_silently() {
        let mut e = engine(1);
        assert!(e.spawn(&SpawnRequest::text("   ", 0.35, 0.0, 0.0)).is_none());
        assert!(e.systems().is_empty());
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn heart_has_parametric_count() {
        let mut e = engine(1);
        let id = e.spawn(&SpawnRequest::shape(ShapeKind::Heart, 1.5, 0.0, 10.0)).unwrap();
        assert_eq!(e.system(id).unwrap().particle_count(), crate::shape::PARAMETRIC_POINTS);
    }

    #[test]
    fn seeded_engines_replay_identically() {
        let mut a = engine(99);
        let mut b = engine(99);
        for e in [&mut a, &mut b] {
            e.spawn(&SpawnRequest::text("GO", 0.5, -10.0, 5.0));
            for _ in 0..120 { e.tick(1.0 / 60.0); }
        }
        assert_eq!(a.systems()[0].positions(), b.systems()[0].positions());
    }

    #[test]
    fn palette_cycles_and_wraps() {
        let mut e = engine(1);
        let first = e.palette().name;
        for _ in 0..PALETTES.len() - 1 {
            assert_ne!(e.cycle_palette().name, first);
        }
        assert_eq!(e.cycle_palette().name, first);
    }

    #[test]
    fn new_spawns_use_current_palette() {
        let mut e = engine(5);
        e.cycle_palette();
        let pal = *e.palette();
        let id = e.spawn(&SpawnRequest::shape(ShapeKind::Ring, 1.0, 0.0, 0.0)).unwrap();
        let colors: Vec<[f32; 3]> = (0..pal.len()).map(|i| pal.color(i)).collect();
        for c in e.system(id).unwrap().base_colors().chunks_exact(3) {
            assert!(colors.contains(&[c[0], c[1], c[2]]));
        }
    }

    #[test]
    fn undrained_events_wait_for_the_host() {
        let mut e = engine(4);
        let a = e.spawn(&SpawnRequest::shape(ShapeKind::Ring, 1.0, -5.0, 10.0)).unwrap();
        let b = e.spawn(&SpawnRequest::shape(ShapeKind::Star, 1.0,  5.0, 10.0)).unwrap();
        while !e.systems().is_empty() {
            e.tick(1.0 / 60.0);
        }

        let events = e.drain_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RegistryEvent::Spawned { id, .. } if id == a));
        assert!(matches!(events[1], RegistryEvent::Spawned { id, .. } if id == b));
        assert!(events[2..].contains(&RegistryEvent::Removed { id: a }));
        assert!(events[2..].contains(&RegistryEvent::Removed { id: b }));
        assert!(e.drain_events().is_empty());
    }
}
