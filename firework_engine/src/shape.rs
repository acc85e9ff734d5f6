//! Target shapes — the point clouds fireworks weave themselves into.
//!
//! Text is rendered to an alpha bitmap and every sufficiently opaque pixel
//! becomes a point. Named shapes are sampled directly from a closed-form
//! curve. Either way the result is cached by key and shared read-only by
//! every system spawned with that key.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::glyph::{BlockFont, GlyphSource};

/// Points sampled for every parametric shape.
pub const PARAMETRIC_POINTS: usize = 3000;

// ════════════════════════════════════════════════════════════════════════════
// ShapeKind — named parametric shapes
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Heart,
    Star,
    Ring,
}

impl ShapeKind {
    pub fn all() -> [ShapeKind; 3] {
        [ShapeKind::Heart, ShapeKind::Star, ShapeKind::Ring]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Heart => "heart",
            ShapeKind::Star  => "star",
            ShapeKind::Ring  => "ring",
        }
    }

    /// Point on the outline at parameter `t ∈ [0, 2π)`, before scaling.
    fn outline(&self, t: f32) -> (f32, f32) {
        match self {
            ShapeKind::Heart => {
                let s = t.sin();
                let x = 16.0 * s * s * s;
                let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos()
                      - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
                (x, y)
            }
            ShapeKind::Star => {
                // Five points: radius swings linearly between tip and notch.
                const OUTER: f32 = 16.0;
                const INNER: f32 = 6.5;
                let seg  = TAU / 10.0;
                let k    = (t / seg).floor();
                let frac = t / seg - k;
                let (r0, r1) = if k as i32 % 2 == 0 { (OUTER, INNER) } else { (INNER, OUTER) };
                let r = r0 + (r1 - r0) * frac;
                let a = t + TAU / 4.0;
                (r * a.cos(), r * a.sin())
            }
            ShapeKind::Ring => (14.0 * t.cos(), 14.0 * t.sin()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeSource / ShapeKey
// ════════════════════════════════════════════════════════════════════════════

/// What a firework should spell out.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeSource {
    Text(String),
    Shape(ShapeKind),
}

impl ShapeSource {
    pub fn text(s: impl Into<String>) -> Self { ShapeSource::Text(s.into()) }

    pub fn label(&self) -> &str {
        match self {
            ShapeSource::Text(s)  => s,
            ShapeSource::Shape(k) => k.name(),
        }
    }
}

/// Cache key: source plus the exact scale.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    pub source: ShapeSource,
    scale_bits: u32,
}

impl ShapeKey {
    pub fn new(source: ShapeSource, scale: f32) -> Self {
        ShapeKey { source, scale_bits: scale.to_bits() }
    }

    pub fn scale(&self) -> f32 { f32::from_bits(self.scale_bits) }
}

// ════════════════════════════════════════════════════════════════════════════
// TargetShape
// ════════════════════════════════════════════════════════════════════════════

/// Immutable point cloud, `[x0, y0, z0, x1, y1, z1, …]`, centred on the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetShape {
    points: Vec<f32>,
}

impl TargetShape {
    pub fn from_points(points: Vec<f32>) -> Self {
        debug_assert!(points.len() % 3 == 0);
        TargetShape { points }
    }

    pub fn len(&self) -> usize { self.points.len() / 3 }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn points(&self) -> &[f32] { &self.points }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.points[3 * i], self.points[3 * i + 1], self.points[3 * i + 2]]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeRasterizer
// ════════════════════════════════════════════════════════════════════════════

/// Builds target shapes and caches them by key.
pub struct ShapeRasterizer {
    glyphs:          Box<dyn GlyphSource>,
    font_px:         f32,
    alpha_threshold: u8,
    cache:           HashMap<ShapeKey, Arc<TargetShape>>,
}

impl ShapeRasterizer {
    pub fn new(glyphs: Box<dyn GlyphSource>, font_px: f32, alpha_threshold: u8) -> Self {
        ShapeRasterizer {
            glyphs,
            font_px,
            alpha_threshold,
            cache: HashMap::new(),
        }
    }

    /// Return the cached shape for `key`, building it on first request.
    pub fn resolve<R: Rng + ?Sized>(&mut self, key: &ShapeKey, rng: &mut R) -> Arc<TargetShape> {
        if let Some(shape) = self.cache.get(key) {
            return Arc::clone(shape);
        }
        let shape = Arc::new(match &key.source {
            ShapeSource::Text(text)  => self.text_points(text, key.scale(), rng),
            ShapeSource::Shape(kind) => parametric_points(*kind, key.scale(), rng),
        });
        debug!("built target '{}' x{}: {} points", key.source.label(), key.scale(), shape.len());
        self.cache.insert(key.clone(), Arc::clone(&shape));
        shape
    }

    pub fn cached(&self) -> usize { self.cache.len() }

    fn text_points<R: Rng + ?Sized>(&self, text: &str, scale: f32, rng: &mut R) -> TargetShape {
        let bmp = self.glyphs.rasterize(text, self.font_px);
        let half_w = bmp.width  as f32 / 2.0;
        let half_h = bmp.height as f32 / 2.0;

        let mut points = Vec::new();
        for py in 0..bmp.height {
            for px in 0..bmp.width {
                if bmp.get(px, py) > self.alpha_threshold {
                    points.push((px as f32 - half_w) * scale);
                    points.push(-(py as f32 - half_h) * scale);
                    points.push(rng.gen_range(-0.5..0.5));
                }
            }
        }
        TargetShape::from_points(points)
    }
}

impl Default for ShapeRasterizer {
    fn default() -> Self {
        ShapeRasterizer::new(Box::new(BlockFont), 80.0, 128)
    }
}

/// Closed-form sampling of a named shape.
fn parametric_points<R: Rng + ?Sized>(kind: ShapeKind, scale: f32, rng: &mut R) -> TargetShape {
    let mut points = Vec::with_capacity(PARAMETRIC_POINTS * 3);
    for i in 0..PARAMETRIC_POINTS {
        let t = i as f32 / PARAMETRIC_POINTS as f32 * TAU;
        let (x, y) = kind.outline(t);
        points.push(x * scale);
        points.push(y * scale);
        points.push(rng.gen_range(-0.5..0.5));
    }
    TargetShape::from_points(points)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::AlphaBitmap;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng { StdRng::seed_from_u64(42) }

    #[test]
    fn text_yields_points() {
        let mut r = ShapeRasterizer::default();
        let s = r.resolve(&ShapeKey::new(ShapeSource::text("2026"), 0.35), &mut rng());
        assert!(s.len() > 0);
        assert_eq!(s.points().len(), s.len() * 3);
    }

    #[test]
    fn same_key_reuses_cached_cloud() {
        let mut r = ShapeRasterizer::default();
        let mut g = rng();
        let key = ShapeKey::new(ShapeSource::text("HELLO"), 0.35);
        let a = r.resolve(&key, &mut g);
        let b = r.resolve(&ShapeKey::new(ShapeSource::text("HELLO"), 0.35), &mut g);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.points(), b.points());
        assert_eq!(r.cached(), 1);
    }

    #[test]
    fn scale_is_part_of_the_key() {
        let mut r = ShapeRasterizer::default();
        let mut g = rng();
        let a = r.resolve(&ShapeKey::new(ShapeSource::text("7"), 0.35), &mut g);
        let b = r.resolve(&ShapeKey::new(ShapeSource::text("7"), 0.70), &mut g);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), b.len());
        assert_eq!(r.cached(), 2);
    }

    #[test]
    fn text_cloud_is_centred_and_jittered() {
        let mut r = ShapeRasterizer::default();
        let s = r.resolve(&ShapeKey::new(ShapeSource::text("8"), 1.0), &mut rng());
        let (mut sx, mut sy) = (0.0f32, 0.0f32);
        for i in 0..s.len() {
            let [x, y, z] = s.point(i);
            sx += x;
            sy += y;
            assert!((-0.5..0.5).contains(&z));
        }
        // "8" is symmetric left-right and top-bottom
        assert!((sx / s.len() as f32).abs() < 1.0);
        assert!((sy / s.len() as f32).abs() < 1.0);
    }

    #[test]
    fn blank_text_is_empty() {
        let mut r = ShapeRasterizer::default();
        assert!(r.resolve(&ShapeKey::new(ShapeSource::text(" "), 0.35), &mut rng()).is_empty());
        assert!(r.resolve(&ShapeKey::new(ShapeSource::text(""), 0.35), &mut rng()).is_empty());
    }

    #[test]
    fn parametric_shapes_have_fixed_count() {
        let mut r = ShapeRasterizer::default();
        for kind in ShapeKind::all() {
            let s = r.resolve(&ShapeKey::new(ShapeSource::Shape(kind), 1.5), &mut rng());
            assert_eq!(s.len(), PARAMETRIC_POINTS, "{}", kind.name());
        }
    }

    #[test]
    fn heart_tip_is_lowest_point() {
        // Tip at t = π.
        let (_, tip_y) = ShapeKind::Heart.outline(std::f32::consts::PI);
        for i in 0..100 {
            let (_, y) = ShapeKind::Heart.outline(i as f32 / 100.0 * TAU);
            assert!(y >= tip_y - 1e-3);
        }
    }

    #[test]
    fn alpha_threshold_is_strict() {
        struct Half;
        impl GlyphSource for Half {
            fn rasterize(&self, _: &str, _: f32) -> AlphaBitmap {
                AlphaBitmap { width: 2, height: 1, alpha: vec![128, 129] }
            }
        }
        let mut r = ShapeRasterizer::new(Box::new(Half), 10.0, 128);
        let s = r.resolve(&ShapeKey::new(ShapeSource::text("x"), 1.0), &mut rng());
        assert_eq!(s.len(), 1);
    }
}
