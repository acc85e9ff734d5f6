//! # firework_engine
//!
//! Particle fireworks that rise as a rocket trail, burst, weave themselves
//! into a glyph or parametric shape, then fade away.
//!
//! ## Life cycle
//!
//! | Stage | Motion | Leaves when |
//! |---|---|---|
//! | `Rocket` | trail laid out behind a rising head | head reaches target height |
//! | `Exploding` | radial burst, velocity × 0.9 per tick | 0.6 s elapsed |
//! | `Weaving` | pulled toward target shape, growing jitter | 2.4 s elapsed |
//! | `Fading` | opacity − 0.02 per tick, drifting down | opacity ≤ 0 → removed |
//!
//! ## Quick start
//!
//! ```rust
//! use firework_engine::{Engine, EngineConfig, SpawnRequest};
//!
//! let mut engine = Engine::new(&EngineConfig { seed: Some(1), ..Default::default() }).unwrap();
//! let id = engine.spawn(&SpawnRequest::text("2026", 0.35, 0.0, 15.0)).unwrap();
//! engine.tick(1.0 / 60.0);
//! assert!(engine.system(id).is_some());
//! ```

pub mod error;
pub mod palette;
pub mod glyph;
pub mod shape;
pub mod system;
pub mod registry;
pub mod engine;

pub use error::{EngineError, EngineResult};
pub use palette::{Palette, PALETTES, hsv_to_rgb, rgb_to_argb};
pub use glyph::{AlphaBitmap, BlockFont, GlyphSource, TrueTypeFont, block_glyph};
pub use shape::{ShapeKey, ShapeKind, ShapeRasterizer, ShapeSource, TargetShape, PARAMETRIC_POINTS};
pub use system::{ParticleSystem, Stage, SystemId, LAUNCH_Y};
pub use registry::{Registry, RegistryEvent};
pub use engine::{Engine, EngineConfig, SpawnRequest};
