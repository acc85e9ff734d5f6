//! Hand landmark storage.
//!
//! Coordinates are normalized image space: `x`, `y` in `[0, 1]` with `y`
//! growing downward, `z` a relative depth of arbitrary scale.

use glam::Vec3;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_TIP:  usize = 20;

/// Fingertips of the four non-thumb fingers, index first.
pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Bones drawn by the skeleton overlay (parent, child).
pub const HAND_SKELETON: [(usize, usize); 21] = [
    (0, 1),  (1, 2),   (2, 3),   (3, 4),
    (0, 5),  (5, 6),   (6, 7),   (7, 8),
    (0, 9),  (9, 10),  (10, 11), (11, 12),
    (0, 13), (13, 14), (14, 15), (15, 16),
    (0, 17), (17, 18), (18, 19), (19, 20),
    (5, 9),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point on the hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn distance(self, other: Landmark) -> f32 {
        self.to_vec3().distance(other.to_vec3())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vec3> for Landmark {
    fn from(v: Vec3) -> Self {
        Landmark::new(v.x, v.y, v.z)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks — one detected hand
// ════════════════════════════════════════════════════════════════════════════

/// Exactly 21 landmarks for one detected hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// Build from a detector's output slice. Returns `None` unless the
    /// slice holds exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(HandLandmarks { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }

    pub fn get(&self, index: usize) -> Landmark { self.points[index] }

    pub fn wrist(&self)     -> Landmark { self.points[WRIST] }
    pub fn thumb_tip(&self) -> Landmark { self.points[THUMB_TIP] }
    pub fn index_tip(&self) -> Landmark { self.points[INDEX_TIP] }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Translate every point by the same offset.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut points = self.points;
        for p in &mut points {
            p.x += dx;
            p.y += dy;
        }
        HandLandmarks { points }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
