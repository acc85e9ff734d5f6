//! Firework palettes.
//!
//! A palette is a named, fixed set of colors. Each particle draws one color
//! from the current palette when its system is spawned and keeps it as its
//! base color for life.

use rand::Rng;

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

/// A named set of HSV colors (hue in degrees, saturation, value).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    hsv:      &'static [(f32, f32, f32)],
}

/// Every palette, in cycling order.
pub const PALETTES: [Palette; 5] = [
    Palette { name: "Golden Hour", hsv: &[(42.0, 0.85, 1.0), (30.0, 0.90, 1.0), (52.0, 0.55, 1.0), (15.0, 0.80, 0.95)] },
    Palette { name: "Neon",        hsv: &[(300.0, 0.90, 1.0), (185.0, 0.95, 1.0), (95.0, 0.90, 1.0), (330.0, 0.75, 1.0)] },
    Palette { name: "Aurora",      hsv: &[(150.0, 0.80, 0.95), (175.0, 0.70, 1.0), (265.0, 0.60, 1.0), (120.0, 0.55, 0.9)] },
    Palette { name: "Sakura",      hsv: &[(340.0, 0.45, 1.0), (355.0, 0.30, 1.0), (320.0, 0.55, 0.95), (0.0, 0.05, 1.0)] },
    Palette { name: "Ember",       hsv: &[(8.0, 0.95, 1.0), (22.0, 1.0, 1.0), (0.0, 0.85, 0.8), (45.0, 0.95, 1.0)] },
];

impl Palette {
    /// Number of colors in the palette.
    pub fn len(&self) -> usize { self.hsv.len() }

    pub fn is_empty(&self) -> bool { self.hsv.is_empty() }

    /// Color `i` as linear RGB in `[0, 1]`.
    pub fn color(&self, i: usize) -> [f32; 3] {
        let (h, s, v) = self.hsv[i % self.hsv.len().max(1)];
        hsv_to_rgb(h, s, v)
    }

    /// One uniformly random color.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 3] {
        self.color(rng.gen_range(0..self.len()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Color helpers
// ════════════════════════════════════════════════════════════════════════════

/// Convert HSV → RGB, all channels in `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r, g, b]
}

/// Pack RGB (scaled by `intensity`) into opaque ARGB `0xFFRRGGBB`.
pub fn rgb_to_argb(rgb: [f32; 3], intensity: f32) -> u32 {
    let c = |x: f32| ((x * intensity).clamp(0.0, 1.0) * 255.0) as u32;
    0xFF000000 | (c(rgb[0]) << 16) | (c(rgb[1]) << 8) | c(rgb[2])
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn palette_names_unique() {
        for (i, a) in PALETTES.iter().enumerate() {
            for b in &PALETTES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn colors_in_unit_range() {
        for p in PALETTES {
            assert!(!p.is_empty());
            for i in 0..p.len() {
                for ch in p.color(i) {
                    assert!((0.0..=1.0).contains(&ch), "{} color {}", p.name, i);
                }
            }
        }
    }

    #[test]
    fn pick_comes_from_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = PALETTES[1];
        let all: Vec<_> = (0..p.len()).map(|i| p.color(i)).collect();
        for _ in 0..50 {
            assert!(all.contains(&p.pick(&mut rng)));
        }
    }

    #[test]
    fn argb_opaque_and_scaled() {
        assert_eq!(rgb_to_argb([1.0, 1.0, 1.0], 1.0), 0xFFFFFFFF);
        assert_eq!(rgb_to_argb([1.0, 0.0, 0.0], 0.0), 0xFF000000);
    }
}
