//! # gesture_fireworks
//!
//! Hand-gesture controlled firework show. Landmarks from a hand tracker (or
//! the keyboard/mouse simulator) are classified into gestures, mapped to
//! actions, and turned into particle fireworks rendered in a `minifb` window.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Kind | Action |
//! |---|---|---|
//! | V sign | discrete, 1.5 s cooldown | Heart firework at screen centre |
//! | OK sign | discrete, 3 s cooldown | Finale: six random shapes, 200 ms apart |
//! | Pinch | continuous | Zoom in (camera toward 10) |
//! | Open palm | continuous | Zoom out (camera toward 120) |
//! | Fist / idle | – | Ready |
//!
//! Both discrete gestures share one cooldown window.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keys pick a hand pose, the mouse moves
//!   the index fingertip.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1`–`6` | Pose: open palm, fist, pinch, V sign, OK sign, point |
//! | `N` | Hide / show the simulated hand |
//! | Mouse | Move fingertip; click to launch a phrase there |
//! | `Space` | Start the phrase show |
//! | `P` | Pause / resume |
//! | `T` | Next colour theme |
//! | `H` / `S` / `R` | Heart / star / ring |
//! | `Q`, `Escape` | Quit |

pub mod gesture;
pub mod mapper;
pub mod show;
pub mod visualizer;
pub mod app;
