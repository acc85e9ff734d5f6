//! # hand_gesture
//!
//! Turn one frame of hand-tracking output (21 landmark points) into a
//! discrete gesture plus a continuous pointer.
//!
//! ## Landmark layout
//!
//! | Index | Point |
//! |---|---|
//! | 0 | wrist |
//! | 1–4 | thumb CMC, MCP, IP, tip |
//! | 5–8 | index MCP, PIP, DIP, tip |
//! | 9–12 | middle MCP, PIP, DIP, tip |
//! | 13–16 | ring MCP, PIP, DIP, tip |
//! | 17–20 | pinky MCP, PIP, DIP, tip |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_gesture::{Classifier, GestureKind, HandPose};
//!
//! let hand = HandPose::VSign.synthesize(0.4, 0.5);
//! let state = Classifier::default().classify(Some(&hand));
//! assert_eq!(state.gesture, GestureKind::VSign);
//! assert!((state.x - 0.6).abs() < 1e-6);
//! ```

pub mod landmark;
pub mod classify;
pub mod pose;

pub use landmark::{HandLandmarks, Landmark, LANDMARK_COUNT, HAND_SKELETON};
pub use classify::{Classifier, ClassifierConfig, GestureKind, HandState};
pub use pose::HandPose;
