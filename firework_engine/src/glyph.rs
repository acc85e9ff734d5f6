//! Text → off-screen alpha bitmap.
//!
//! Two sources are available:
//!
//! * [`BlockFont`] — a built-in 3×5 bitmap font, always available, scaled up
//!   to the requested pixel size.
//! * [`TrueTypeFont`] — any TTF/OTF file, rasterized with anti-aliased
//!   coverage through `ab_glyph`.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};

use crate::error::{EngineError, EngineResult};

// ════════════════════════════════════════════════════════════════════════════
// AlphaBitmap
// ════════════════════════════════════════════════════════════════════════════

/// Row-major 8-bit coverage bitmap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlphaBitmap {
    pub width:  usize,
    pub height: usize,
    pub alpha:  Vec<u8>,
}

impl AlphaBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        AlphaBitmap { width, height, alpha: vec![0; width * height] }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.alpha[y * self.width + x]
    }

    /// Keep the stronger of the existing and new coverage.
    fn blend_max(&mut self, x: usize, y: usize, a: u8) {
        if x < self.width && y < self.height {
            let px = &mut self.alpha[y * self.width + x];
            *px = (*px).max(a);
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.alpha[row * self.width + col] = 255;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GlyphSource
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can paint a line of text into an alpha bitmap.
pub trait GlyphSource: Send {
    fn rasterize(&self, text: &str, font_px: f32) -> AlphaBitmap;
}

// ════════════════════════════════════════════════════════════════════════════
// BlockFont — built-in 3×5 bitmap font
// ════════════════════════════════════════════════════════════════════════════

/// Built-in block font. Each glyph cell becomes a square of
/// `font_px / 5` pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockFont;

impl GlyphSource for BlockFont {
    fn rasterize(&self, text: &str, font_px: f32) -> AlphaBitmap {
        let n = text.chars().count();
        if n == 0 {
            return AlphaBitmap::default();
        }
        let cell = ((font_px / 5.0).round() as usize).max(1);
        // 3 columns per glyph, 1 column gap between glyphs
        let width  = (n * 4 - 1) * cell;
        let height = 5 * cell;
        let mut bmp = AlphaBitmap::new(width, height);

        for (i, ch) in text.chars().enumerate() {
            let gx = i * 4 * cell;
            for (row, &bits) in block_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        bmp.fill_rect(gx + col * cell, row * cell, cell, cell);
                    }
                }
            }
        }
        bmp
    }
}

/// Minimal 3×5 glyph table: 5 rows of 3 bits, MSB on the left.
pub fn block_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '*' => [0b101, 0b010, 0b111, 0b010, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrueTypeFont — ab_glyph backed
// ════════════════════════════════════════════════════════════════════════════

/// A TrueType/OpenType font loaded from disk.
pub struct TrueTypeFont {
    font: FontVec,
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| EngineError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes).ok_or_else(|| EngineError::InvalidFont(path.to_path_buf()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        FontVec::try_from_vec(bytes).ok().map(|font| TrueTypeFont { font })
    }
}

impl GlyphSource for TrueTypeFont {
    fn rasterize(&self, text: &str, font_px: f32) -> AlphaBitmap {
        let scale  = PxScale::from(font_px);
        let scaled = self.font.as_scaled(scale);
        let ascent = scaled.ascent();

        // Lay the glyphs out along one baseline.
        let mut caret  = 0.0f32;
        let mut glyphs = Vec::new();
        for c in text.chars() {
            let mut g = scaled.scaled_glyph(c);
            g.position = point(caret, ascent);
            caret += scaled.h_advance(g.id);
            glyphs.push(g);
        }

        let width  = caret.ceil().max(0.0) as usize;
        let height = (ascent - scaled.descent()).ceil().max(0.0) as usize;
        let mut bmp = AlphaBitmap::new(width, height);

        for g in glyphs {
            if let Some(outlined) = scaled.outline_glyph(g) {
                let bounds = outlined.px_bounds();
                outlined.draw(|x, y, coverage| {
                    let px = bounds.min.x as i64 + x as i64;
                    let py = bounds.min.y as i64 + y as i64;
                    if px >= 0 && py >= 0 {
                        let a = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                        bmp.blend_max(px as usize, py as usize, a);
                    }
                });
            }
        }
        bmp
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
