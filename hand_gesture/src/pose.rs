//! Synthetic hand poses.
//!
//! Builds plausible 21-point landmark sets for a handful of canonical poses.
//! The keyboard simulator uses them in place of a camera, and the tests use
//! them as fixtures.

use glam::Vec3;

use crate::landmark::{
    HandLandmarks, Landmark, LANDMARK_COUNT, INDEX_MCP, MIDDLE_MCP, PINKY_MCP, RING_MCP,
    THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};

/// Canonical poses the simulator can hold up to the "camera".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandPose {
    Open,
    Fist,
    Pinch,
    VSign,
    OkSign,
    /// Index finger only.
    Point,
}

impl HandPose {
    pub fn all() -> [HandPose; 6] {
        [HandPose::Open, HandPose::Fist, HandPose::Pinch,
         HandPose::VSign, HandPose::OkSign, HandPose::Point]
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandPose::Open   => "open",
            HandPose::Fist   => "fist",
            HandPose::Pinch  => "pinch",
            HandPose::VSign  => "v-sign",
            HandPose::OkSign => "ok-sign",
            HandPose::Point  => "point",
        }
    }

    /// Extended flags for index, middle, ring, pinky.
    fn extended(&self) -> [bool; 4] {
        match self {
            HandPose::Open   => [true,  true,  true,  true ],
            HandPose::Fist   => [false, false, false, false],
            HandPose::Pinch  => [true,  false, false, false],
            HandPose::VSign  => [true,  true,  false, false],
            HandPose::OkSign => [true,  true,  true,  true ],
            HandPose::Point  => [true,  false, false, false],
        }
    }

    /// Build the landmark set with the index fingertip at image position
    /// `(tip_x, tip_y)`.
    pub fn synthesize(&self, tip_x: f32, tip_y: f32) -> HandLandmarks {
        // Hand space: wrist at the origin, fingers pointing up the image (-y).
        const KNUCKLES: [(usize, Vec3); 4] = [
            (INDEX_MCP,  Vec3::new(-0.030, -0.090, 0.0)),
            (MIDDLE_MCP, Vec3::new( 0.000, -0.100, 0.0)),
            (RING_MCP,   Vec3::new( 0.030, -0.095, 0.0)),
            (PINKY_MCP,  Vec3::new( 0.055, -0.085, 0.0)),
        ];

        let mut pts = [Vec3::ZERO; LANDMARK_COUNT];
        pts[WRIST] = Vec3::ZERO;

        for (finger, &(mcp, knuckle)) in KNUCKLES.iter().enumerate() {
            let dir = knuckle.normalize();
            pts[mcp] = knuckle;
            if self.extended()[finger] {
                pts[mcp + 1] = knuckle + dir * 0.040;
                pts[mcp + 2] = knuckle + dir * 0.070;
                pts[mcp + 3] = knuckle + dir * 0.095;
            } else {
                // Folded back toward the palm.
                pts[mcp + 1] = knuckle + dir * 0.030;
                pts[mcp + 2] = knuckle + dir * 0.010 + Vec3::new(0.0, 0.0, -0.02);
                pts[mcp + 3] = knuckle - dir * 0.010;
            }
        }

        pts[THUMB_CMC] = Vec3::new(-0.030, -0.020, 0.0);
        pts[THUMB_MCP] = Vec3::new(-0.060, -0.040, 0.0);
        pts[THUMB_IP]  = Vec3::new(-0.080, -0.060, 0.0);
        pts[THUMB_TIP] = match self {
            HandPose::Pinch | HandPose::OkSign => pts[INDEX_MCP + 3] + Vec3::new(0.010, 0.005, 0.0),
            HandPose::Fist                     => Vec3::new(-0.010, -0.060, 0.0),
            _                                  => Vec3::new(-0.100, -0.080, 0.0),
        };

        let tip = pts[INDEX_MCP + 3];
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        for (o, p) in out.iter_mut().zip(pts.iter()) {
            *o = Landmark::from(*p);
        }
        HandLandmarks::new(out).translated(tip_x - tip.x, tip_y - tip.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::INDEX_TIP;

    #[test]
    fn index_tip_lands_where_asked() {
        for pose in HandPose::all() {
            let h = pose.synthesize(0.25, 0.75);
            let tip = h.get(INDEX_TIP);
            assert!((tip.x - 0.25).abs() < 1e-6 && (tip.y - 0.75).abs() < 1e-6, "{}", pose.name());
        }
    }

    #[test]
    fn poses_are_finite() {
        for pose in HandPose::all() {
            assert!(pose.synthesize(0.5, 0.5).is_finite());
        }
    }
}
